// src/feedback/mod.rs

pub mod engine;
pub mod rules;

pub use engine::{
    generate_feedback, generate_feedback_with, similarity_titles, FeedbackItem, SimilarityItem,
};
pub use rules::{FaultRule, Severity, FAULT_RULES};
