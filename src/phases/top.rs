// src/phases/top.rs
//
// Top of backswing: the highest hand position (minimum y) that starts the
// downswing. A walk-off after the finish can produce a downward spike as
// large as the real downswing, so candidates are tried in time order and
// must look like a swing on both sides: a set-up before, a V after.

use super::still::find_runs_where;
use super::{argmax, argmin, first_success, Located, Strategy};
use crate::signal::HandSignal;
use crate::types::{DetectionMethod, PhaseConfig};
use tracing::debug;

pub struct TopSearch<'a> {
    pub signal: &'a HandSignal,
    pub config: &'a PhaseConfig,
    /// Max y over valid frames
    pub address_level: f64,
    /// (min y, max y) over valid frames
    pub range: (f64, f64),
}

impl TopSearch<'_> {
    fn y(&self) -> &[f64] {
        &self.signal.smoothed
    }

    /// Hands rose far enough above the address level.
    pub fn is_prominent(&self, i: usize) -> bool {
        self.address_level - self.y()[i] > self.config.top_prominence
    }

    /// Hands come back down to a fixed fraction of the address level soon after.
    pub fn has_v_return(&self, i: usize) -> bool {
        let y = self.y();
        let end = (i + self.signal.frames_for(self.config.v_return_window_sec)).min(y.len() - 1);
        let target = self.config.v_return_fraction * self.address_level;
        (i + 1..=end).any(|k| y[k] >= target)
    }

    /// A still, low-hands stretch exists shortly before.
    pub fn has_preceding_address(&self, i: usize) -> bool {
        let y = self.y();
        let start = i.saturating_sub(self.signal.frames_for(self.config.address_lookback_sec));
        let threshold = self.config.still_threshold * self.config.address_still_factor;
        let lower_half = (self.range.0 + self.range.1) / 2.0;

        !find_runs_where(
            &self.signal.speed,
            start..i,
            threshold,
            self.config.address_min_still_frames,
            |k| y[k] >= lower_half,
        )
        .is_empty()
    }

    fn passes_all(&self, i: usize) -> bool {
        self.is_prominent(i) && self.has_v_return(i) && self.has_preceding_address(i)
    }

    /// Local minima with a ±2 frame neighborhood, in time order.
    fn local_minima(&self) -> Vec<usize> {
        let y = self.y();
        let n = y.len();
        if n < 5 {
            return Vec::new();
        }
        (2..n - 2)
            .filter(|&i| (i - 2..=i + 2).all(|k| y[i] <= y[k]))
            .collect()
    }
}

fn velocity_peak(ctx: &TopSearch) -> Option<Located> {
    let dir = &ctx.signal.direction;
    let n = dir.len();
    let peak = dir[argmax(dir)?];
    if peak <= ctx.config.downswing_noise_floor {
        return None;
    }

    let cutoff = ctx.config.candidate_peak_ratio * peak;
    let back = ctx.signal.frames_for(ctx.config.top_search_back_sec);
    let candidates = (0..n).filter(|&i| {
        dir[i] >= cutoff && (i == 0 || dir[i] >= dir[i - 1]) && (i + 1 == n || dir[i] > dir[i + 1])
    });

    let mut tried = Vec::new();
    for p in candidates {
        let start = p.saturating_sub(back);
        let top = start + argmin(&ctx.y()[start..=p])?;
        if tried.contains(&top) {
            continue;
        }
        tried.push(top);
        if ctx.passes_all(top) {
            return Some(Located::new(top, DetectionMethod::VelocityPeak));
        }
        debug!("top candidate {} (downswing peak at {}) rejected", top, p);
    }
    None
}

fn prominent_minimum(ctx: &TopSearch) -> Option<Located> {
    ctx.local_minima()
        .into_iter()
        .find(|&i| ctx.passes_all(i))
        .map(|i| Located::new(i, DetectionMethod::ProminentMinimum))
}

fn earliest_prominent_minimum(ctx: &TopSearch) -> Option<Located> {
    ctx.local_minima()
        .into_iter()
        .find(|&i| ctx.is_prominent(i))
        .map(|i| Located::new(i, DetectionMethod::EarliestProminentMinimum))
}

fn global_minimum(ctx: &TopSearch) -> Option<Located> {
    if ctx.range.1 - ctx.range.0 <= ctx.config.flat_signal_tolerance {
        return None;
    }
    argmin(ctx.y()).map(|i| Located::new(i, DetectionMethod::GlobalMinimum))
}

/// Smoothing pulls the minimum of an asymmetric V toward the slower side;
/// move it back onto the lowest raw sample nearby. Ties stay nearest `i`.
fn refine_on_raw(signal: &HandSignal, i: usize, radius: usize) -> usize {
    let start = i.saturating_sub(radius);
    let end = (i + radius).min(signal.len() - 1);
    let mut best = i;
    for k in start..=end {
        let (yk, yb) = (signal.raw[k], signal.raw[best]);
        if yk.is_nan() {
            continue;
        }
        if yb.is_nan() || yk < yb || (yk == yb && k.abs_diff(i) < best.abs_diff(i)) {
            best = k;
        }
    }
    best
}

pub fn find_top(signal: &HandSignal, config: &PhaseConfig, address_level: f64) -> Option<Located> {
    if signal.is_empty() {
        return None;
    }
    let ctx = TopSearch {
        signal,
        config,
        address_level,
        range: signal.observed_range(),
    };
    let strategies: [Strategy<TopSearch>; 4] = [
        velocity_peak as Strategy<_>,
        prominent_minimum as Strategy<_>,
        earliest_prominent_minimum as Strategy<_>,
        global_minimum as Strategy<_>,
    ];
    let found = first_success(&ctx, &strategies)?;
    let index = refine_on_raw(signal, found.index, config.top_refine_frames);
    if index != found.index {
        debug!("top moved {} -> {} onto raw minimum", found.index, index);
    }
    Some(Located::new(index, found.method))
}
