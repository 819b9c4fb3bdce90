// src/phases/snap.rs

use crate::types::{LandmarkSeries, Phase, PhaseSet};
use tracing::info;

/// Nearest detected frame index to `target`; the lower index wins ties.
pub fn nearest_detected(detected: &[usize], target: usize) -> Option<usize> {
    detected
        .iter()
        .copied()
        .min_by_key(|&f| (f.abs_diff(target), f))
}

/// Move every found phase onto a frame that has a pose detection.
/// Missing phases keep their sentinel.
pub fn snap_to_detected(phases: &mut PhaseSet, series: &LandmarkSeries) {
    let detected: Vec<usize> = series
        .frames
        .iter()
        .filter(|f| f.detected)
        .map(|f| f.frame_index)
        .collect();

    for phase in Phase::ALL {
        let frame = phases.get_mut(phase);
        if !frame.is_found() || detected.contains(&frame.frame_index) {
            continue;
        }
        if let Some(snapped) = nearest_detected(&detected, frame.frame_index) {
            info!("{} snapped {} → {}", phase, frame.frame_index, snapped);
            frame.frame_index = snapped;
        }
    }
}
