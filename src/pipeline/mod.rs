// src/pipeline/mod.rs

pub mod metrics;
pub mod orchestrator;

pub use metrics::{AnalysisMetrics, MetricsSummary};
pub use orchestrator::{AnalysisReport, SwingAnalyzer, SwingInput, ViewAnalysis};
