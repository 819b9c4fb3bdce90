// src/phases/follow_through.rs

use super::still::find_still_runs;
use super::{argmin, first_success, Located, Strategy};
use crate::signal::HandSignal;
use crate::types::{DetectionMethod, PhaseConfig};

struct FinishSearch<'a> {
    signal: &'a HandSignal,
    config: &'a PhaseConfig,
    start: usize,
    end: usize,
}

/// Golfer holding the finish.
fn finish_hold(ctx: &FinishSearch) -> Option<Located> {
    find_still_runs(
        &ctx.signal.speed,
        ctx.start..ctx.end + 1,
        ctx.config.still_threshold,
        ctx.config.follow_through_min_still_frames,
    )
    .first()
    .map(|run| Located::new(run.midpoint(), DetectionMethod::FinishHold))
}

fn first_local_minimum(ctx: &FinishSearch) -> Option<Located> {
    let y = &ctx.signal.smoothed;
    (ctx.start.max(1)..ctx.end)
        .find(|&i| y[i] <= y[i - 1] && y[i] <= y[i + 1])
        .map(|i| Located::new(i, DetectionMethod::FirstLocalMinimum))
}

fn window_minimum(ctx: &FinishSearch) -> Option<Located> {
    argmin(&ctx.signal.smoothed[ctx.start..=ctx.end])
        .map(|i| Located::new(ctx.start + i, DetectionMethod::WindowMinimum))
}

/// `None` when the video ends before the search window opens.
pub fn find_follow_through(
    signal: &HandSignal,
    config: &PhaseConfig,
    impact: usize,
) -> Option<Located> {
    let n = signal.len();
    let start = impact + signal.frames_for(config.follow_through_delay_sec);
    if n == 0 || start > n - 1 {
        return None;
    }
    let end = (start + signal.frames_for(config.follow_through_window_sec)).min(n - 1);

    let ctx = FinishSearch {
        signal,
        config,
        start,
        end,
    };
    let strategies: [Strategy<FinishSearch>; 3] = [
        finish_hold as Strategy<_>,
        first_local_minimum as Strategy<_>,
        window_minimum as Strategy<_>,
    ];
    first_success(&ctx, &strategies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::testing::{clean_swing, series_from_y};
    use crate::types::{SignalConfig, View};

    fn signal_for(y: &[f64]) -> HandSignal {
        HandSignal::build(&series_from_y(y), &SignalConfig::default(), View::DownTheLine).unwrap()
    }

    #[test]
    fn test_finish_hold_midpoint() {
        let (y, _) = clean_swing();
        let signal = signal_for(&y);
        // Finish hold starts at frame 78
        let found = find_follow_through(&signal, &PhaseConfig::default(), 64).unwrap();
        assert_eq!(found.method, DetectionMethod::FinishHold);
        assert!(found.index > 78 && found.index < y.len(), "follow-through {}", found.index);
    }

    #[test]
    fn test_no_hold_uses_first_local_minimum() {
        // Hands keep moving: rise to a peak, then drop away
        let mut y = vec![0.70; 5];
        y.extend((1..=20).map(|i| 0.70 - 0.02 * i as f64));
        y.extend((1..=20).map(|i| 0.30 + 0.02 * i as f64));
        let signal = signal_for(&y);
        let found = find_follow_through(&signal, &PhaseConfig::default(), 0).unwrap();
        assert_eq!(found.method, DetectionMethod::FirstLocalMinimum);
        assert!(found.index.abs_diff(24) <= 1, "follow-through {}", found.index);
    }

    #[test]
    fn test_monotonic_window_uses_window_minimum() {
        let y: Vec<f64> = (0..40).map(|i| 0.70 - 0.01 * i as f64).collect();
        let signal = signal_for(&y);
        let found = find_follow_through(&signal, &PhaseConfig::default(), 0).unwrap();
        assert_eq!(found.method, DetectionMethod::WindowMinimum);
        assert_eq!(found.index, 39);
    }

    #[test]
    fn test_window_past_end_is_missing() {
        let signal = signal_for(&[0.5; 12]);
        assert!(find_follow_through(&signal, &PhaseConfig::default(), 8).is_none());
    }
}
