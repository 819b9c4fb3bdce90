// src/pipeline/orchestrator.rs
//
// End-to-end analysis of one swing: phases and angles per view, then deltas
// against the reference, ranking, feedback and the similarity score.
//
// The analyzer holds no per-swing state. One instance is shared by every
// worker of a batch; each call to analyze() is self-contained.

use super::metrics::AnalysisMetrics;
use crate::angles::calculate_angles;
use crate::comparison::{
    compute_deltas, compute_similarity_score, rank_differences, rank_similarities,
};
use crate::error::AnalysisError;
use crate::feedback::{generate_feedback, similarity_titles, FeedbackItem, SimilarityItem};
use crate::phases::{snap_to_detected, PhaseDetector};
use crate::reference::ReferenceRepository;
use crate::types::{
    Config, DeltaTable, LandmarkSeries, PhaseSet, SwingAngles, SwingTempo, View, ViewAngles,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============================================================================
// INPUT / OUTPUT
// ============================================================================

#[derive(Debug, Clone)]
pub struct SwingInput {
    pub swing_type: String,
    pub views: BTreeMap<View, LandmarkSeries>,
}

impl SwingInput {
    pub fn new(swing_type: impl Into<String>) -> Self {
        Self {
            swing_type: swing_type.into(),
            views: BTreeMap::new(),
        }
    }

    pub fn with_view(mut self, view: View, series: LandmarkSeries) -> Self {
        self.views.insert(view, series);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis_id: Uuid,
    pub swing_type: String,
    pub generated_at: DateTime<Utc>,
    pub processing_time_sec: f64,
    pub similarity_score: u8,
    pub phases: BTreeMap<View, PhaseSet>,
    pub tempo: BTreeMap<View, SwingTempo>,
    pub user_angles: SwingAngles,
    pub reference_angles: SwingAngles,
    pub deltas: DeltaTable,
    pub top_differences: Vec<FeedbackItem>,
    pub top_similarities: Vec<SimilarityItem>,
    /// Non-fatal problems, e.g. a phase that could not be located
    pub warnings: Vec<String>,
}

/// Phases, angles and warnings for one camera view.
#[derive(Debug, Clone)]
pub struct ViewAnalysis {
    pub phases: PhaseSet,
    pub angles: ViewAngles,
    pub tempo: Option<SwingTempo>,
    pub warnings: Vec<String>,
}

// ============================================================================
// ANALYZER
// ============================================================================

pub struct SwingAnalyzer {
    config: Config,
    references: Arc<dyn ReferenceRepository>,
    metrics: AnalysisMetrics,
}

impl SwingAnalyzer {
    pub fn new(config: Config, references: Arc<dyn ReferenceRepository>) -> Self {
        Self {
            config,
            references,
            metrics: AnalysisMetrics::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: AnalysisMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &AnalysisMetrics {
        &self.metrics
    }

    /// Phase detection and angle extraction for one view.
    pub fn analyze_view(
        &self,
        series: &LandmarkSeries,
        view: View,
    ) -> Result<ViewAnalysis, AnalysisError> {
        let series = series.rounded(self.config.signal.round_decimals);
        debug!(
            "{}: {} frames, {} detected, {:.1} samples/s",
            view,
            series.len(),
            series.detected_count(),
            series.sample_rate()
        );

        let mut phases = PhaseDetector::new(&self.config).detect(&series, view)?;
        snap_to_detected(&mut phases, &series);

        let warnings = phases
            .missing_phases()
            .into_iter()
            .map(|phase| AnalysisError::PhaseIncomplete { view, phase }.to_string())
            .collect();

        let angles = calculate_angles(&series, &phases, view)?;
        let tempo = phases.tempo(series.sample_rate());

        Ok(ViewAnalysis {
            phases,
            angles,
            tempo,
            warnings,
        })
    }

    pub fn analyze(&self, input: &SwingInput) -> Result<AnalysisReport, AnalysisError> {
        self.metrics.inc(&self.metrics.analyses_started);
        let started = Instant::now();

        match self.run(input, started) {
            Ok(report) => {
                let missing: usize = report
                    .phases
                    .values()
                    .map(|p| p.missing_phases().len())
                    .sum();
                self.metrics.record_success(
                    report.similarity_score,
                    missing,
                    started.elapsed().as_micros() as u64,
                );
                Ok(report)
            }
            Err(e) => {
                warn!("❌ {} analysis failed [{}]: {}", input.swing_type, e.code(), e);
                self.metrics.record_failure();
                Err(e)
            }
        }
    }

    fn run(&self, input: &SwingInput, started: Instant) -> Result<AnalysisReport, AnalysisError> {
        if input.views.is_empty() {
            return Err(AnalysisError::NoViews {
                swing_type: input.swing_type.clone(),
            });
        }

        // Reference problems are configuration errors; fail before any detection work
        let views: Vec<View> = input.views.keys().copied().collect();
        let reference = self.references.load_views(&input.swing_type, &views)?;

        let mut phases = BTreeMap::new();
        let mut tempo = BTreeMap::new();
        let mut user = SwingAngles::new();
        let mut warnings = Vec::new();

        for (&view, series) in &input.views {
            let analysis = self.analyze_view(series, view)?;
            if let Some(t) = analysis.tempo {
                tempo.insert(view, t);
            }
            phases.insert(view, analysis.phases);
            user.insert(view, analysis.angles);
            warnings.extend(analysis.warnings);
        }

        let comparison = &self.config.comparison;
        let deltas = compute_deltas(&user, &reference);
        let differences = rank_differences(&deltas, &user, &reference, comparison);
        let similarities = rank_similarities(&deltas, &user, &reference, comparison);
        let similarity_score = compute_similarity_score(&deltas, comparison);

        let report = AnalysisReport {
            analysis_id: Uuid::new_v4(),
            swing_type: input.swing_type.clone(),
            generated_at: Utc::now(),
            processing_time_sec: started.elapsed().as_secs_f64(),
            similarity_score,
            phases,
            tempo,
            user_angles: user,
            reference_angles: reference,
            deltas,
            top_differences: generate_feedback(&differences),
            top_similarities: similarity_titles(&similarities),
            warnings,
        };

        info!(
            "✅ {} swing analyzed: similarity {} | {} differences | {} warnings | {:.3}s",
            report.swing_type,
            report.similarity_score,
            report.top_differences.len(),
            report.warnings.len(),
            report.processing_time_sec
        );
        debug!(
            "Completed analyses so far: {}",
            self.metrics.analyses_completed.load(Ordering::Relaxed)
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::testing::{clean_swing, series_from_y};
    use crate::types::{AngleName, Joint, Landmark, Phase};

    struct FixedReferences(SwingAngles);

    impl ReferenceRepository for FixedReferences {
        fn load(&self, swing_type: &str, view: View) -> Result<ViewAngles, AnalysisError> {
            self.0
                .get(&view)
                .cloned()
                .ok_or_else(|| AnalysisError::ReferenceDataMissing {
                    swing_type: swing_type.to_string(),
                    view,
                })
        }
    }

    /// Clean swing with a full standing body around the moving right wrist.
    fn posed_swing(len: Option<usize>) -> LandmarkSeries {
        let (mut y, _) = clean_swing();
        if let Some(n) = len {
            y.truncate(n);
        }
        let mut series = series_from_y(&y);
        let body = [
            (Joint::LeftShoulder, 0.55, 0.30),
            (Joint::RightShoulder, 0.45, 0.31),
            (Joint::LeftElbow, 0.57, 0.42),
            (Joint::RightElbow, 0.44, 0.43),
            (Joint::LeftWrist, 0.52, 0.55),
            (Joint::RightIndex, 0.49, 0.58),
            (Joint::LeftIndex, 0.51, 0.58),
            (Joint::LeftHip, 0.54, 0.55),
            (Joint::RightHip, 0.46, 0.56),
            (Joint::LeftKnee, 0.55, 0.72),
            (Joint::RightKnee, 0.45, 0.73),
            (Joint::LeftAnkle, 0.55, 0.90),
            (Joint::RightAnkle, 0.45, 0.90),
        ];
        for frame in &mut series.frames {
            for (joint, x, y) in body {
                frame.landmarks.insert(
                    joint.as_str().to_string(),
                    Landmark {
                        x,
                        y,
                        z: 0.0,
                        visibility: 0.9,
                    },
                );
            }
        }
        series
    }

    fn analyzer_with(reference: SwingAngles) -> SwingAnalyzer {
        SwingAnalyzer::new(Config::default(), Arc::new(FixedReferences(reference)))
    }

    fn own_reference(series: &LandmarkSeries) -> SwingAngles {
        let analyzer = analyzer_with(SwingAngles::new());
        let view = analyzer.analyze_view(series, View::DownTheLine).unwrap();
        SwingAngles::from([(View::DownTheLine, view.angles)])
    }

    #[test]
    fn test_identical_swing_scores_100() {
        let series = posed_swing(None);
        let analyzer = analyzer_with(own_reference(&series));
        let input = SwingInput::new("iron").with_view(View::DownTheLine, series);

        let report = analyzer.analyze(&input).unwrap();
        assert_eq!(report.similarity_score, 100);
        assert!(report.top_differences.is_empty());
        assert_eq!(report.top_similarities.len(), 3);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.phases[&View::DownTheLine].top.frame_index, 53);
        assert!(report.tempo.contains_key(&View::DownTheLine));
    }

    #[test]
    fn test_early_extension_surfaces_as_top_difference() {
        let series = posed_swing(None);
        let mut reference = own_reference(&series);
        let impact = reference
            .get_mut(&View::DownTheLine)
            .and_then(|v| v.get_mut(&Phase::Impact))
            .unwrap();
        let user_spine = impact.angles[&AngleName::SpineAngleDtl];
        impact
            .angles
            .insert(AngleName::SpineAngleDtl, user_spine - 11.3);

        let analyzer = analyzer_with(reference);
        let input = SwingInput::new("iron").with_view(View::DownTheLine, series);
        let report = analyzer.analyze(&input).unwrap();

        assert_eq!(report.top_differences.len(), 1);
        let top = &report.top_differences[0];
        assert_eq!(top.title, "Early Extension (Loss of Posture)");
        assert!((top.difference.delta - 11.3).abs() < 0.05);
        assert!(report.similarity_score < 100);
    }

    #[test]
    fn test_truncated_recording_warns() {
        let series = posed_swing(Some(70));
        let analyzer = analyzer_with(own_reference(&posed_swing(None)));
        let input = SwingInput::new("iron").with_view(View::DownTheLine, series);

        let report = analyzer.analyze(&input).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("follow_through"));
        assert!(!report.user_angles[&View::DownTheLine].contains_key(&Phase::FollowThrough));
        assert_eq!(analyzer.metrics().summary().incomplete_phases, 1);
    }

    #[test]
    fn test_missing_reference_fails_and_counts() {
        let analyzer = analyzer_with(SwingAngles::new());
        let input = SwingInput::new("driver").with_view(View::FaceOn, posed_swing(None));

        let err = analyzer.analyze(&input).unwrap_err();
        assert_eq!(err.code(), "REFERENCE_DATA_NOT_FOUND");
        let summary = analyzer.metrics().summary();
        assert_eq!(summary.analyses_started, 1);
        assert_eq!(summary.analyses_failed, 1);
    }

    #[test]
    fn test_no_views() {
        let analyzer = analyzer_with(SwingAngles::new());
        let err = analyzer.analyze(&SwingInput::new("iron")).unwrap_err();
        assert_eq!(err.code(), "NO_VIEWS");
    }

    #[test]
    fn test_flat_signal_is_fatal() {
        let series = series_from_y(&[0.6; 90]);
        let reference = SwingAngles::from([(View::DownTheLine, ViewAngles::new())]);
        let analyzer = analyzer_with(reference);
        let input = SwingInput::new("iron").with_view(View::DownTheLine, series);

        let err = analyzer.analyze(&input).unwrap_err();
        assert_eq!(err.code(), "TOP_NOT_FOUND");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let series = posed_swing(None);
        let analyzer = analyzer_with(own_reference(&series));
        let input = SwingInput::new("iron").with_view(View::DownTheLine, series);
        let report = analyzer.analyze(&input).unwrap();

        let json = serde_json::to_string(&report).unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.analysis_id, report.analysis_id);
        assert_eq!(back.similarity_score, 100);
        assert_eq!(back.phases, report.phases);
    }
}
