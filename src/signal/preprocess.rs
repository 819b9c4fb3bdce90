// src/signal/preprocess.rs
//
// Turns a per-frame landmark series into the 1-D signals phase detection
// runs on:
//
//   LandmarkFrame[] → tracked-hand y (NaN gaps) → interpolated → smoothed
//                                                              ├→ rolling speed |Δy|
//                                                              └→ directional velocity Δy·w
//
// Image y grows downward, so a larger value means the hands are LOWER.

use crate::error::AnalysisError;
use crate::types::{Joint, LandmarkFrame, LandmarkSeries, SignalConfig, View};
use tracing::{debug, warn};

/// Tracked joint chosen for a series, with the visibility that decided it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointChoice {
    pub joint: Joint,
    pub mean_visibility: f64,
    pub fell_back: bool,
}

/// Mean visibility of `joint` over detected frames that contain it. 0.0 if none do.
pub fn mean_visibility(frames: &[LandmarkFrame], joint: Joint) -> f64 {
    let (sum, count) = frames
        .iter()
        .filter(|f| f.detected)
        .filter_map(|f| f.landmark(joint))
        .fold((0.0, 0usize), |(s, c), lm| (s + lm.visibility, c + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Pick the hand to track. Never fails: with both hands below threshold the
/// better of the two is used.
pub fn select_tracked_joint(
    frames: &[LandmarkFrame],
    primary: Joint,
    fallback: Joint,
    min_visibility: f64,
) -> JointChoice {
    let primary_vis = mean_visibility(frames, primary);
    if primary_vis >= min_visibility {
        return JointChoice {
            joint: primary,
            mean_visibility: primary_vis,
            fell_back: false,
        };
    }

    let fallback_vis = mean_visibility(frames, fallback);
    if fallback_vis >= min_visibility {
        debug!(
            "{} visibility too low ({:.2}), using {} ({:.2})",
            primary, primary_vis, fallback, fallback_vis
        );
        return JointChoice {
            joint: fallback,
            mean_visibility: fallback_vis,
            fell_back: true,
        };
    }

    warn!(
        "Both hands below visibility threshold ({}: {:.2}, {}: {:.2}), using best available",
        primary, primary_vis, fallback, fallback_vis
    );
    if primary_vis >= fallback_vis {
        JointChoice {
            joint: primary,
            mean_visibility: primary_vis,
            fell_back: false,
        }
    } else {
        JointChoice {
            joint: fallback,
            mean_visibility: fallback_vis,
            fell_back: true,
        }
    }
}

/// Per-frame y of `joint` and its visibility. Frames that are undetected or
/// below `min_visibility` get NaN.
pub fn extract_vertical(
    frames: &[LandmarkFrame],
    joint: Joint,
    min_visibility: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut ys = vec![f64::NAN; frames.len()];
    let mut vis = vec![0.0; frames.len()];

    for (i, frame) in frames.iter().enumerate() {
        if !frame.detected {
            continue;
        }
        if let Some(lm) = frame.landmark(joint) {
            vis[i] = lm.visibility;
            if lm.visibility >= min_visibility {
                ys[i] = lm.y;
            }
        }
    }

    (ys, vis)
}

/// Linear interpolation across NaN runs; leading and trailing gaps repeat the
/// nearest valid value. `None` when nothing is valid.
pub fn interpolate_gaps(signal: &[f64]) -> Option<Vec<f64>> {
    let valid: Vec<usize> = (0..signal.len()).filter(|&i| !signal[i].is_nan()).collect();
    let (&first, &last) = (valid.first()?, valid.last()?);

    let mut out = signal.to_vec();
    for v in out.iter_mut().take(first) {
        *v = signal[first];
    }
    for v in out.iter_mut().skip(last + 1) {
        *v = signal[last];
    }
    for pair in valid.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b - a < 2 {
            continue;
        }
        let span = (b - a) as f64;
        for i in a + 1..b {
            let t = (i - a) as f64 / span;
            out[i] = signal[a] + t * (signal[b] - signal[a]);
        }
    }
    Some(out)
}

/// Centered moving average; samples beyond the edges replicate the edge value,
/// so the output length equals the input length.
pub fn moving_average(signal: &[f64], window: usize) -> Vec<f64> {
    let n = signal.len();
    if n == 0 || window <= 1 {
        return signal.to_vec();
    }
    let half = (window / 2) as isize;
    let last = (n - 1) as isize;

    (0..n as isize)
        .map(|i| {
            let start = i - half;
            let sum: f64 = (start..start + window as isize)
                .map(|j| signal[j.clamp(0, last) as usize])
                .sum();
            sum / window as f64
        })
        .collect()
}

/// Centered mean over the samples that exist: the window is clipped at the
/// edges, never shifted inward.
fn truncated_mean(signal: &[f64], window: usize) -> Vec<f64> {
    let n = signal.len();
    let window = window.max(1);
    let half = window / 2;
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + window - half).min(n);
            let slice = &signal[start..end];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Rolling mean of |Δy|. Same length as the input, first sample 0.
pub fn rolling_speed(smoothed: &[f64], window: usize) -> Vec<f64> {
    if smoothed.len() < 2 {
        return vec![0.0; smoothed.len()];
    }
    let diffs: Vec<f64> = smoothed.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let mut out = Vec::with_capacity(smoothed.len());
    out.push(0.0);
    out.extend(truncated_mean(&diffs, window));
    out
}

/// Signed Δy (positive = hands moving down) scaled by per-frame reliability,
/// then smoothed. Same length as the input, first sample 0.
pub fn directional_velocity(smoothed: &[f64], weights: &[f64], window: usize) -> Vec<f64> {
    let n = smoothed.len();
    let mut raw = vec![0.0; n];
    for i in 1..n {
        let w = weights.get(i).copied().unwrap_or(1.0);
        raw[i] = (smoothed[i] - smoothed[i - 1]) * w;
    }
    moving_average(&raw, window)
}

/// The preprocessed hand trajectory of one video.
#[derive(Debug, Clone)]
pub struct HandSignal {
    pub joint: JointChoice,
    /// Tracked y with NaN for unreliable frames
    pub raw: Vec<f64>,
    pub smoothed: Vec<f64>,
    pub speed: Vec<f64>,
    pub direction: Vec<f64>,
    pub sample_rate: f64,
}

impl HandSignal {
    pub fn build(
        series: &LandmarkSeries,
        config: &SignalConfig,
        view: View,
    ) -> Result<Self, AnalysisError> {
        let joint = select_tracked_joint(
            &series.frames,
            config.primary_hand,
            config.fallback_hand,
            config.min_visibility,
        );

        let (raw, visibility) = extract_vertical(&series.frames, joint.joint, config.min_visibility);
        let filled = interpolate_gaps(&raw).ok_or(AnalysisError::SignalDegenerate {
            view,
            joint: joint.joint,
        })?;

        let smoothed = moving_average(&filled, config.smoothing_window);
        let speed = rolling_speed(&smoothed, config.velocity_window);

        // Interpolated frames are trusted as if they sat exactly at threshold.
        let weights: Vec<f64> = raw
            .iter()
            .zip(&visibility)
            .map(|(y, v)| {
                if y.is_nan() {
                    config.min_visibility
                } else {
                    v.clamp(0.0, 1.0)
                }
            })
            .collect();
        let direction = directional_velocity(&smoothed, &weights, config.smoothing_window);

        let valid = raw.iter().filter(|y| !y.is_nan()).count();
        debug!(
            "{}: tracking {} ({}/{} valid frames, mean visibility {:.2})",
            view,
            joint.joint,
            valid,
            raw.len(),
            joint.mean_visibility
        );

        Ok(Self {
            joint,
            raw,
            smoothed,
            speed,
            direction,
            sample_rate: series.sample_rate(),
        })
    }

    pub fn len(&self) -> usize {
        self.smoothed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.smoothed.is_empty()
    }

    pub fn is_valid(&self, i: usize) -> bool {
        self.raw.get(i).map_or(false, |y| !y.is_nan())
    }

    /// Lowest hand position over valid frames (max smoothed y): hands resting near the ball.
    pub fn address_level(&self) -> f64 {
        self.valid_smoothed().fold(f64::NEG_INFINITY, f64::max)
    }

    /// (highest hands, lowest hands) over valid frames, as (min y, max y).
    pub fn observed_range(&self) -> (f64, f64) {
        self.valid_smoothed()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(y), hi.max(y))
            })
    }

    /// Seconds → whole samples at this signal's rate.
    pub fn frames_for(&self, seconds: f64) -> usize {
        (seconds * self.sample_rate).round().max(0.0) as usize
    }

    fn valid_smoothed(&self) -> impl Iterator<Item = f64> + '_ {
        self.smoothed
            .iter()
            .enumerate()
            .filter(|(i, _)| self.is_valid(*i))
            .map(|(_, y)| *y)
    }
}
