// src/reference.rs
//
// Reference swing angles, one JSON file per (swing type, view).
// Raw files use older angle names; they are remapped to the names the angle
// calculator emits so user and reference tables line up key for key.

use crate::error::AnalysisError;
use crate::types::{AnglePhaseResult, AngleName, Phase, SwingAngles, View, ViewAngles};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub trait ReferenceRepository: Send + Sync {
    fn load(&self, swing_type: &str, view: View) -> Result<ViewAngles, AnalysisError>;

    /// Reference tables for every requested view.
    fn load_views(&self, swing_type: &str, views: &[View]) -> Result<SwingAngles, AnalysisError> {
        views
            .iter()
            .map(|&view| Ok((view, self.load(swing_type, view)?)))
            .collect()
    }
}

// ============================================================================
// RAW FILE FORMAT
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawReferenceFile {
    phases: Vec<RawReferencePhase>,
}

#[derive(Debug, Deserialize)]
struct RawReferencePhase {
    phase: Phase,
    frame: usize,
    #[serde(default)]
    timestamp_sec: f64,
    #[serde(default)]
    angles: BTreeMap<String, f64>,
}

/// Raw reference name → calculator name. Names outside the view's table are dropped.
pub fn remap_angle_name(view: View, raw: &str) -> Option<AngleName> {
    use AngleName::*;
    match view {
        View::DownTheLine => match raw {
            "spine_angle" => Some(SpineAngleDtl),
            "lead_arm_torso" => Some(LeadArmTorso),
            "trail_arm_torso" => Some(TrailArmTorso),
            "right_elbow" => Some(RightElbow),
            "left_elbow" => Some(LeftElbow),
            "right_knee_flex" => Some(RightKneeFlex),
            "right_wrist_cock" => Some(RightWristCock),
            _ => None,
        },
        View::FaceOn => match raw {
            "shoulder_line_angle" => Some(ShoulderLineAngle),
            "hip_line_angle" => Some(HipLineAngle),
            "x_factor" => Some(XFactor),
            "spine_tilt" => Some(SpineTiltFo),
            "lead_arm_torso" => Some(LeadArmTorso),
            "right_knee_flex" => Some(RightKneeFlex),
            "left_knee_flex" => Some(LeftKneeFlex),
            "right_elbow" => Some(RightElbow),
            "left_elbow" => Some(LeftElbow),
            _ => None,
        },
    }
}

fn convert(view: View, raw: RawReferenceFile) -> ViewAngles {
    raw.phases
        .into_iter()
        .map(|p| {
            let angles = p
                .angles
                .iter()
                .filter_map(|(name, &value)| match remap_angle_name(view, name) {
                    Some(angle) => Some((angle, value)),
                    None => {
                        debug!("Dropping reference angle {} ({})", name, view);
                        None
                    }
                })
                .collect();

            let result = AnglePhaseResult {
                frame: p.frame,
                timestamp_sec: p.timestamp_sec,
                description: p.phase.description().to_string(),
                angles,
            };
            (p.phase, result)
        })
        .collect()
}

// ============================================================================
// FILE REPOSITORY
// ============================================================================

#[derive(Debug, Clone)]
pub struct FileReferenceRepository {
    root: PathBuf,
}

impl FileReferenceRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, swing_type: &str, view: View) -> PathBuf {
        let suffix = match view {
            View::DownTheLine => "dtl",
            View::FaceOn => "face_on",
        };
        self.root
            .join(swing_type)
            .join(format!("{}_{}_reference.json", swing_type, suffix))
    }
}

impl ReferenceRepository for FileReferenceRepository {
    fn load(&self, swing_type: &str, view: View) -> Result<ViewAngles, AnalysisError> {
        let path = self.path_for(swing_type, view);
        let missing = || AnalysisError::ReferenceDataMissing {
            swing_type: swing_type.to_string(),
            view,
        };

        if !path.is_file() {
            warn!("Reference file not found: {}", path.display());
            return Err(missing());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            warn!("Failed to read {}: {}", path.display(), e);
            missing()
        })?;

        let raw: RawReferenceFile = serde_json::from_str(&content)
            .map_err(|source| AnalysisError::ReferenceDataInvalid {
                path: path.clone(),
                source,
            })?;

        let angles = convert(view, raw);
        info!(
            "📚 Loaded reference {}/{} ({} phases) from {}",
            swing_type,
            view,
            angles.len(),
            path.display()
        );
        Ok(angles)
    }
}

// ============================================================================
// PRELOADED LIBRARY
// ============================================================================

/// Immutable set of reference tables, loaded once at startup and shared
/// between workers behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLibrary {
    entries: HashMap<(String, View), ViewAngles>,
}

impl ReferenceLibrary {
    /// Load both views of every swing type. Any missing or malformed file fails the preload.
    pub fn preload(
        repository: &dyn ReferenceRepository,
        swing_types: &[String],
    ) -> Result<Self, AnalysisError> {
        let mut entries = HashMap::new();
        for swing_type in swing_types {
            for view in View::ALL {
                let angles = repository.load(swing_type, view)?;
                entries.insert((swing_type.clone(), view), angles);
            }
        }
        info!("Reference library ready: {} tables", entries.len());
        Ok(Self { entries })
    }

    pub fn get(&self, swing_type: &str, view: View) -> Option<&ViewAngles> {
        self.entries.get(&(swing_type.to_string(), view))
    }

    pub fn swing_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.entries.keys().map(|(t, _)| t.as_str()).collect();
        types.sort_unstable();
        types.dedup();
        types
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReferenceRepository for ReferenceLibrary {
    fn load(&self, swing_type: &str, view: View) -> Result<ViewAngles, AnalysisError> {
        self.get(swing_type, view)
            .cloned()
            .ok_or_else(|| AnalysisError::ReferenceDataMissing {
                swing_type: swing_type.to_string(),
                view,
            })
    }
}
