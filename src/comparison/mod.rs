// src/comparison/mod.rs

pub mod deltas;
pub mod ranking;
pub mod weights;

pub use deltas::{angle_delta, angular_difference, compute_deltas};
pub use ranking::{compute_similarity_score, rank_differences, rank_similarities, RankedDifference};
pub use weights::{is_excluded, reliability_weight, EXCLUDED_FROM_RANKING};
