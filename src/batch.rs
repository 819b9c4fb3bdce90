// src/batch.rs
//
// Landmark file discovery for the batch host. Extraction writes one JSON file
// per camera view, `<swing>_dtl_landmarks.json` and `<swing>_fo_landmarks.json`;
// files sharing a directory and swing name belong to the same swing.

use crate::pipeline::SwingInput;
use crate::types::{LandmarkSeries, View};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const LANDMARK_SUFFIX: &str = "_landmarks.json";

#[derive(Debug, Clone, PartialEq)]
pub struct SwingFiles {
    /// Swing name shared by the view files; also the result store key
    pub name: String,
    pub views: BTreeMap<View, PathBuf>,
}

impl SwingFiles {
    pub fn load(&self, swing_type: &str) -> Result<SwingInput> {
        let mut input = SwingInput::new(swing_type);
        for (&view, path) in &self.views {
            input = input.with_view(view, load_series(path)?);
        }
        Ok(input)
    }
}

/// `"abc_dtl_landmarks.json"` → `("abc", DownTheLine)`.
pub fn parse_landmark_file_name(file_name: &str) -> Option<(String, View)> {
    let base = file_name.strip_suffix(LANDMARK_SUFFIX)?;
    let (name, view) = base.rsplit_once('_')?;
    if name.is_empty() {
        return None;
    }
    match view.parse::<View>() {
        Ok(view) => Some((name.to_string(), view)),
        Err(e) => {
            debug!("Skipping {}: {}", file_name, e);
            None
        }
    }
}

pub fn find_swings(input_dir: &Path) -> Result<Vec<SwingFiles>> {
    if !input_dir.is_dir() {
        anyhow::bail!("input dir {} does not exist", input_dir.display());
    }

    let mut grouped: BTreeMap<(PathBuf, String), BTreeMap<View, PathBuf>> = BTreeMap::new();

    for entry in WalkDir::new(input_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((name, view)) = parse_landmark_file_name(file_name) else {
            continue;
        };
        let parent = path.parent().unwrap_or(input_dir).to_path_buf();
        debug!("Found {} landmarks for {}: {}", view, name, path.display());
        grouped
            .entry((parent, name))
            .or_default()
            .insert(view, path.to_path_buf());
    }

    let swings: Vec<SwingFiles> = grouped
        .into_iter()
        .map(|((_, name), views)| SwingFiles { name, views })
        .collect();

    info!("Found {} swing(s) in {}", swings.len(), input_dir.display());
    Ok(swings)
}

pub fn load_series(path: &Path) -> Result<LandmarkSeries> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading landmarks {}", path.display()))?;
    let series: LandmarkSeries = serde_json::from_str(&content)
        .with_context(|| format!("parsing landmarks {}", path.display()))?;
    Ok(series)
}
