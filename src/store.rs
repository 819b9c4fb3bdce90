// src/store.rs
//
// Caller-owned result storage keyed by an identifier the caller chooses.
// The analysis core never touches a store; the batch host does.

use crate::pipeline::AnalysisReport;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

pub trait AnalysisStore: Send + Sync {
    fn put(&self, key: &str, report: &AnalysisReport) -> Result<()>;
    fn get(&self, key: &str) -> Result<Option<AnalysisReport>>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAnalysisStore {
    reports: RwLock<HashMap<String, AnalysisReport>>,
}

impl InMemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnalysisStore for InMemoryAnalysisStore {
    fn put(&self, key: &str, report: &AnalysisReport) -> Result<()> {
        let mut reports = self
            .reports
            .write()
            .map_err(|_| anyhow::anyhow!("analysis store lock poisoned"))?;
        reports.insert(key.to_string(), report.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<AnalysisReport>> {
        let reports = self
            .reports
            .read()
            .map_err(|_| anyhow::anyhow!("analysis store lock poisoned"))?;
        Ok(reports.get(key).cloned())
    }
}

/// One pretty-printed JSON file per key.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            bail!("invalid store key {:?}", key);
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl AnalysisStore for JsonDirStore {
    fn put(&self, key: &str, report: &AnalysisReport) -> Result<()> {
        let path = self.path_for(key)?;
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Stored report {} at {}", key, path.display());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<AnalysisReport>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let content =
            fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let report = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn report(score: u8) -> AnalysisReport {
        AnalysisReport {
            analysis_id: Uuid::new_v4(),
            swing_type: "iron".to_string(),
            generated_at: Utc::now(),
            processing_time_sec: 0.25,
            similarity_score: score,
            phases: BTreeMap::new(),
            tempo: BTreeMap::new(),
            user_angles: BTreeMap::new(),
            reference_angles: BTreeMap::new(),
            deltas: BTreeMap::new(),
            top_differences: Vec::new(),
            top_similarities: Vec::new(),
            warnings: vec!["impact not found in the fo video".to_string()],
        }
    }

    #[test]
    fn test_memory_put_get_overwrite() {
        let store = InMemoryAnalysisStore::new();
        assert!(store.get("abc_dtl").unwrap().is_none());
        assert!(!store.contains("abc_dtl").unwrap());

        store.put("abc_dtl", &report(85)).unwrap();
        store.put("abc_dtl", &report(90)).unwrap();
        store.put("other", &report(10)).unwrap();

        assert_eq!(store.get("abc_dtl").unwrap().unwrap().similarity_score, 90);
        assert_eq!(store.get("other").unwrap().unwrap().similarity_score, 10);
    }

    #[test]
    fn test_json_dir_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonDirStore::open(dir.path().join("reports")).unwrap();
        let original = report(72);

        store.put("swing-01", &original).unwrap();
        assert!(dir.path().join("reports/swing-01.json").is_file());

        let loaded = store.get("swing-01").unwrap().unwrap();
        assert_eq!(loaded.analysis_id, original.analysis_id);
        assert_eq!(loaded.similarity_score, 72);
        assert_eq!(loaded.warnings, original.warnings);
        assert!(store.get("swing-02").unwrap().is_none());
    }

    #[test]
    fn test_json_dir_rejects_path_keys() {
        let dir = TempDir::new().unwrap();
        let store = JsonDirStore::open(dir.path()).unwrap();
        assert!(store.put("../escape", &report(1)).is_err());
        assert!(store.put("", &report(1)).is_err());
        assert!(store.get("a/b").is_err());
    }
}
