// src/pipeline/metrics.rs
//
// Batch counters. Cloning shares the same counters, so every worker
// records into one set and the host logs the summary at the end.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct AnalysisMetrics {
    pub analyses_started: Arc<AtomicU64>,
    pub analyses_completed: Arc<AtomicU64>,
    pub analyses_failed: Arc<AtomicU64>,
    pub incomplete_phases: Arc<AtomicU64>,
    pub similarity_total: Arc<AtomicU64>,
    pub processing_time_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for AnalysisMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisMetrics {
    pub fn new() -> Self {
        Self {
            analyses_started: Arc::new(AtomicU64::new(0)),
            analyses_completed: Arc::new(AtomicU64::new(0)),
            analyses_failed: Arc::new(AtomicU64::new(0)),
            incomplete_phases: Arc::new(AtomicU64::new(0)),
            similarity_total: Arc::new(AtomicU64::new(0)),
            processing_time_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, similarity_score: u8, missing_phases: usize, duration_us: u64) {
        self.inc(&self.analyses_completed);
        self.similarity_total
            .fetch_add(similarity_score as u64, Ordering::Relaxed);
        self.incomplete_phases
            .fetch_add(missing_phases as u64, Ordering::Relaxed);
        self.processing_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.inc(&self.analyses_failed);
    }

    pub fn average_similarity(&self) -> f64 {
        let completed = self.analyses_completed.load(Ordering::Relaxed);
        if completed == 0 {
            return 0.0;
        }
        self.similarity_total.load(Ordering::Relaxed) as f64 / completed as f64
    }

    pub fn summary(&self) -> MetricsSummary {
        let completed = self.analyses_completed.load(Ordering::Relaxed);
        let total_us = self.processing_time_us.load(Ordering::Relaxed);
        MetricsSummary {
            analyses_started: self.analyses_started.load(Ordering::Relaxed),
            analyses_completed: completed,
            analyses_failed: self.analyses_failed.load(Ordering::Relaxed),
            incomplete_phases: self.incomplete_phases.load(Ordering::Relaxed),
            avg_similarity: self.average_similarity(),
            avg_processing_us: if completed > 0 { total_us / completed } else { 0 },
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub analyses_started: u64,
    pub analyses_completed: u64,
    pub analyses_failed: u64,
    pub incomplete_phases: u64,
    pub avg_similarity: f64,
    pub avg_processing_us: u64,
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let metrics = AnalysisMetrics::new();
        let worker = metrics.clone();

        worker.inc(&worker.analyses_started);
        worker.record_success(80, 1, 1_000);
        metrics.inc(&metrics.analyses_started);
        metrics.record_success(60, 0, 3_000);
        metrics.record_failure();

        let summary = metrics.summary();
        assert_eq!(summary.analyses_started, 2);
        assert_eq!(summary.analyses_completed, 2);
        assert_eq!(summary.analyses_failed, 1);
        assert_eq!(summary.incomplete_phases, 1);
        assert!((summary.avg_similarity - 70.0).abs() < 1e-9);
        assert_eq!(summary.avg_processing_us, 2_000);
    }

    #[test]
    fn test_average_without_completions() {
        assert_eq!(AnalysisMetrics::new().average_similarity(), 0.0);
    }
}
