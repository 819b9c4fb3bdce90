// src/phases/mod.rs
//
// Swing phase detection over the tracked-hand signal.
//
// Every phase is located by an ordered list of strategies. The first strategy
// that returns a frame wins and its tag is kept as the phase's DetectionMethod.
// Top is the anchor: address is searched before it, impact and follow-through
// after it.

pub mod address;
pub mod follow_through;
pub mod impact;
pub mod snap;
pub mod still;
pub mod top;

use crate::error::AnalysisError;
use crate::signal::HandSignal;
use crate::types::{Config, DetectionMethod, LandmarkSeries, Phase, PhaseFrame, PhaseSet, View};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

pub use snap::snap_to_detected;

/// A signal position found by one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    pub index: usize,
    pub method: DetectionMethod,
}

impl Located {
    pub fn new(index: usize, method: DetectionMethod) -> Self {
        Self { index, method }
    }
}

pub type Strategy<C> = fn(&C) -> Option<Located>;

/// Run strategies in order until one succeeds.
pub fn first_success<C>(ctx: &C, strategies: &[Strategy<C>]) -> Option<Located> {
    strategies.iter().find_map(|strategy| strategy(ctx))
}

/// Index of the smallest value; first one wins on ties.
pub(crate) fn argmin(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v >= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Index of the largest value; first one wins on ties.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

pub(crate) fn cmp_f64(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

// ============================================================================
// DETECTOR
// ============================================================================

pub struct PhaseDetector<'a> {
    config: &'a Config,
}

impl<'a> PhaseDetector<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Locate address, top, impact and follow-through in one video.
    ///
    /// Missing impact or follow-through come back as sentinel frames; only a
    /// degenerate signal or a missing top is an error.
    pub fn detect(&self, series: &LandmarkSeries, view: View) -> Result<PhaseSet, AnalysisError> {
        let signal = HandSignal::build(series, &self.config.signal, view)?;
        let phases = &self.config.phases;
        let address_level = signal.address_level();

        let top = top::find_top(&signal, phases, address_level)
            .ok_or(AnalysisError::TopNotFound { view })?;
        debug!("{}: top at position {} via {:?}", view, top.index, top.method);

        let address = address::find_address(&signal, phases, top.index);
        let address_y = signal.smoothed[address.index];

        let impact = impact::find_impact(&signal, phases, top.index, address_y);
        let follow_through = impact.and_then(|imp| {
            follow_through::find_follow_through(&signal, phases, imp.index)
        });

        let to_frame = |phase: Phase, located: Option<Located>| match located {
            Some(l) => PhaseFrame::found(phase, series.frames[l.index].frame_index, l.method),
            None => PhaseFrame::missing(phase),
        };

        let set = PhaseSet {
            address: to_frame(Phase::Address, Some(address)),
            top: to_frame(Phase::Top, Some(top)),
            impact: to_frame(Phase::Impact, impact),
            follow_through: to_frame(Phase::FollowThrough, follow_through),
            tracked_joint: signal.joint.joint,
            address_level,
            top_level: signal.smoothed[top.index],
        };

        for phase in set.missing_phases() {
            warn!("⚠️  {}: {} not found", view, phase.display_name());
        }
        info!(
            "🏌️ {} phases: address={} top={} impact={} follow_through={}",
            view,
            set.address.frame_index,
            set.top.frame_index,
            set.impact.frame_index,
            set.follow_through.frame_index
        );

        Ok(set)
    }
}

pub fn detect_phases(
    series: &LandmarkSeries,
    view: View,
    config: &Config,
) -> Result<PhaseSet, AnalysisError> {
    PhaseDetector::new(config).detect(series, view)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_argmin_argmax_first_on_ties() {
        assert_eq!(argmin(&[3.0, 1.0, 1.0, 2.0]), Some(1));
        assert_eq!(argmax(&[3.0, 1.0, 3.0]), Some(0));
        assert_eq!(argmin(&[f64::NAN, 2.0]), Some(1));
        assert_eq!(argmin(&[]), None);
    }

    #[test]
    fn test_first_success_keeps_order() {
        let strategies: [Strategy<()>; 3] = [
            |_| None,
            |_| Some(Located::new(7, DetectionMethod::ProminentMinimum)),
            |_| Some(Located::new(1, DetectionMethod::GlobalMinimum)),
        ];
        let got = first_success(&(), &strategies).unwrap();
        assert_eq!(got.index, 7);
        assert_eq!(got.method, DetectionMethod::ProminentMinimum);
    }

    #[test]
    fn test_clean_swing_phases_in_order() {
        let (y, top) = clean_swing();
        let series = series_from_y(&y);
        let phases = detect_phases(&series, View::DownTheLine, &Config::default()).unwrap();

        assert_eq!(phases.top.frame_index, top);
        assert!(phases.address.frame_index < 30, "address {}", phases.address.frame_index);
        assert!(phases.impact.is_found());
        assert!(phases.impact.frame_index > top);
        assert!(phases.impact.frame_index <= top + 30);
        assert!(phases.follow_through.is_found());
        assert!(phases.follow_through.frame_index >= phases.impact.frame_index);
        assert!(phases.missing_phases().is_empty());
    }

    #[test]
    fn test_top_not_found_on_flat_signal() {
        let series = series_from_y(&[0.6; 90]);
        let err = detect_phases(&series, View::FaceOn, &Config::default()).unwrap_err();
        assert_eq!(err.code(), "TOP_NOT_FOUND");
    }

    #[test]
    fn test_detection_is_deterministic() {
        let (y, _) = clean_swing();
        let series = series_from_y(&y);
        let config = Config::default();
        let a = detect_phases(&series, View::DownTheLine, &config).unwrap();
        let b = detect_phases(&series, View::DownTheLine, &config).unwrap();
        assert_eq!(a, b);
    }
}
