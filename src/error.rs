// src/error.rs

use crate::types::{Joint, Phase, View};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{joint} never reaches the visibility threshold in the {view} video; no phase detection possible")]
    SignalDegenerate { view: View, joint: Joint },

    #[error("could not detect a complete swing in the {view} video (no top of backswing)")]
    TopNotFound { view: View },

    /// Non-fatal. Reported as a warning; angle data for the phase is unavailable.
    #[error("{phase} not found in the {view} video")]
    PhaseIncomplete { view: View, phase: Phase },

    #[error("no phase in the {view} video produced angle data")]
    AngleComputationEmpty { view: View },

    #[error("no reference data for {swing_type}/{view}")]
    ReferenceDataMissing { swing_type: String, view: View },

    #[error("reference file {path} is malformed: {source}")]
    ReferenceDataInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown view {0:?}")]
    UnknownView(String),

    #[error("no landmark series supplied for {swing_type} swing")]
    NoViews { swing_type: String },
}

impl AnalysisError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::SignalDegenerate { .. } => "SIGNAL_DEGENERATE",
            Self::TopNotFound { .. } => "TOP_NOT_FOUND",
            Self::PhaseIncomplete { .. } => "PHASE_INCOMPLETE",
            Self::AngleComputationEmpty { .. } => "ANGLE_COMPUTATION_EMPTY",
            Self::ReferenceDataMissing { .. } => "REFERENCE_DATA_NOT_FOUND",
            Self::ReferenceDataInvalid { .. } => "REFERENCE_DATA_INVALID",
            Self::UnknownView(_) => "UNKNOWN_VIEW",
            Self::NoViews { .. } => "NO_VIEWS",
        }
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::PhaseIncomplete { .. })
    }
}
