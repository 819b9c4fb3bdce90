// src/lib.rs
//
// Golf swing analysis over pose-landmark time series: phase detection,
// joint angles at each phase, comparison against a reference swing and
// rule-based coaching feedback.

pub mod angles;
pub mod batch;
pub mod comparison;
pub mod config;
pub mod error;
pub mod feedback;
pub mod phases;
pub mod pipeline;
pub mod reference;
pub mod signal;
pub mod store;
pub mod types;

pub use angles::calculate_angles;
pub use comparison::{compute_deltas, compute_similarity_score, rank_differences, rank_similarities};
pub use error::AnalysisError;
pub use feedback::{generate_feedback, similarity_titles};
pub use phases::detect_phases;
pub use pipeline::{AnalysisReport, SwingAnalyzer, SwingInput};
pub use types::Config;
