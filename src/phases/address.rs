// src/phases/address.rs

use super::still::{find_still_runs, StillRun};
use super::{cmp_f64, first_success, Located, Strategy};
use crate::signal::HandSignal;
use crate::types::{DetectionMethod, PhaseConfig};

struct AddressSearch<'a> {
    y: &'a [f64],
    /// Still runs before the top, in time order
    runs: Vec<StillRun>,
    /// Midpoint between the top and the lowest hands before it
    low_cutoff: f64,
}

/// Lowest-hands frame of a run; later frame on ties.
fn settled_frame(y: &[f64], run: &StillRun) -> usize {
    (run.start..=run.end)
        .max_by(|&a, &b| cmp_f64(&y[a], &y[b]))
        .unwrap_or(run.start)
}

fn last_low_still_run(ctx: &AddressSearch) -> Option<Located> {
    ctx.runs
        .iter()
        .rev()
        .find(|run| run.mean(ctx.y) > ctx.low_cutoff)
        .map(|run| Located::new(settled_frame(ctx.y, run), DetectionMethod::LastLowStillRun))
}

fn lowest_still_run(ctx: &AddressSearch) -> Option<Located> {
    ctx.runs
        .iter()
        .max_by(|a, b| cmp_f64(&a.mean(ctx.y), &b.mean(ctx.y)))
        .map(|run| Located::new(settled_frame(ctx.y, run), DetectionMethod::LowestStillRun))
}

fn first_frame(_: &AddressSearch) -> Option<Located> {
    Some(Located::new(0, DetectionMethod::FirstFrame))
}

/// Address is only searched before `top`. Always returns a frame.
pub fn find_address(signal: &HandSignal, config: &PhaseConfig, top: usize) -> Located {
    let y = &signal.smoothed[..];
    if y.is_empty() {
        return Located::new(0, DetectionMethod::FirstFrame);
    }
    let top = top.min(y.len() - 1);
    let runs = find_still_runs(&signal.speed, 0..top, config.still_threshold, config.min_still_duration);

    let max_before = y[..top].iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let ctx = AddressSearch {
        y,
        runs,
        low_cutoff: (y[top] + max_before) / 2.0,
    };

    let strategies: [Strategy<AddressSearch>; 3] = [
        last_low_still_run as Strategy<_>,
        lowest_still_run as Strategy<_>,
        first_frame as Strategy<_>,
    ];
    first_success(&ctx, &strategies).unwrap_or(Located::new(0, DetectionMethod::FirstFrame))
}
