// src/phases/impact.rs
//
// Impact: hands back at address height at the end of the downswing,
// searched in a short window after the top.

use super::{argmax, argmin, first_success, Located, Strategy};
use crate::signal::HandSignal;
use crate::types::{DetectionMethod, PhaseConfig};

struct ImpactSearch<'a> {
    signal: &'a HandSignal,
    config: &'a PhaseConfig,
    /// Inclusive window bounds, both after the top
    start: usize,
    end: usize,
    address_y: f64,
}

impl ImpactSearch<'_> {
    fn closest_to_address(&self, from: usize, to: usize) -> Option<usize> {
        let gaps: Vec<f64> = self.signal.smoothed[from..=to]
            .iter()
            .map(|y| (y - self.address_y).abs())
            .collect();
        argmin(&gaps).map(|i| from + i)
    }
}

/// Downward speed settles after its peak, or failing that, brakes hardest.
fn downswing_velocity(ctx: &ImpactSearch) -> Option<Located> {
    let dir = &ctx.signal.direction[ctx.start..=ctx.end];
    let peak_at = argmax(dir)?;
    let peak = dir[peak_at];
    if peak <= ctx.config.downswing_noise_floor {
        return None;
    }

    let settle = peak * ctx.config.impact_settle_ratio;
    if let Some(k) = (peak_at + 1..dir.len()).find(|&k| dir[k] <= settle) {
        return Some(Located::new(ctx.start + k, DetectionMethod::VelocitySettle));
    }

    if peak_at + 1 >= dir.len() {
        return None;
    }
    let decel: Vec<f64> = (peak_at + 1..dir.len()).map(|k| dir[k] - dir[k - 1]).collect();
    argmin(&decel).map(|k| Located::new(ctx.start + peak_at + 1 + k, DetectionMethod::PeakDeceleration))
}

fn address_crossing(ctx: &ImpactSearch) -> Option<Located> {
    let y = &ctx.signal.smoothed;
    let threshold = ctx.config.impact_crossing_ratio * ctx.address_y;
    let first = (ctx.start..=ctx.end).find(|&k| y[k] >= threshold)?;
    let refine_end = (first + ctx.config.impact_refine_frames.max(1) - 1).min(ctx.end);
    ctx.closest_to_address(first, refine_end)
        .map(|k| Located::new(k, DetectionMethod::AddressCrossing))
}

fn closest_approach(ctx: &ImpactSearch) -> Option<Located> {
    ctx.closest_to_address(ctx.start, ctx.end)
        .map(|k| Located::new(k, DetectionMethod::ClosestApproach))
}

/// `None` when no frame exists after the top.
pub fn find_impact(
    signal: &HandSignal,
    config: &PhaseConfig,
    top: usize,
    address_y: f64,
) -> Option<Located> {
    let n = signal.len();
    let start = top + 1;
    let end = (top + signal.frames_for(config.impact_search_window_sec)).min(n.saturating_sub(1));
    if start > end {
        return None;
    }

    let ctx = ImpactSearch {
        signal,
        config,
        start,
        end,
        address_y,
    };
    let strategies: [Strategy<ImpactSearch>; 3] = [
        downswing_velocity as Strategy<_>,
        address_crossing as Strategy<_>,
        closest_approach as Strategy<_>,
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
    fn test_impact_settles_after_downswing() {
        let (y, top) = clean_swing();
        let signal = signal_for(&y);
        let found = find_impact(&signal, &PhaseConfig::default(), top, 0.70).unwrap();
        assert_eq!(found.method, DetectionMethod::VelocitySettle);
        assert!(found.index > top + 4, "impact {}", found.index);
        assert!(found.index <= top + 16, "impact {}", found.index);
    }

    #[test]
    fn test_slow_return_uses_address_crossing() {
        // Downswing too slow to clear the noise floor
        let mut y = vec![0.40; 10];
        let top = 9;
        y.extend((1..=40).map(|i| 0.40 + 0.0025 * i as f64));
        let signal = signal_for(&y);
        let found = find_impact(&signal, &PhaseConfig::default(), top, 0.50).unwrap();
        assert_eq!(found.method, DetectionMethod::AddressCrossing);
        assert!(signal.smoothed[found.index] >= 0.85 * 0.50);
    }

    #[test]
    fn test_never_returning_uses_closest_approach() {
        let mut y = vec![0.30; 10];
        y.extend((1..=20).map(|i| 0.30 + 0.002 * i as f64));
        let signal = signal_for(&y);
        let found = find_impact(&signal, &PhaseConfig::default(), 9, 0.70).unwrap();
        assert_eq!(found.method, DetectionMethod::ClosestApproach);
        assert_eq!(found.index, y.len() - 1);
    }

    #[test]
    fn test_top_on_last_frame_has_no_impact() {
        let signal = signal_for(&[0.5, 0.4, 0.3]);
        assert!(find_impact(&signal, &PhaseConfig::default(), 2, 0.5).is_none());
    }
}
