// src/phases/still.rs

use std::ops::Range;

/// Inclusive run of consecutive still frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StillRun {
    pub start: usize,
    pub end: usize,
}

impl StillRun {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn midpoint(&self) -> usize {
        (self.start + self.end) / 2
    }

    pub fn mean(&self, y: &[f64]) -> f64 {
        y[self.start..=self.end].iter().sum::<f64>() / self.len() as f64
    }
}

/// Maximal runs inside `range` where `speed < threshold` and `accept(i)` holds,
/// at least `min_len` frames long.
pub fn find_runs_where<F>(
    speed: &[f64],
    range: Range<usize>,
    threshold: f64,
    min_len: usize,
    accept: F,
) -> Vec<StillRun>
where
    F: Fn(usize) -> bool,
{
    let end = range.end.min(speed.len());
    let mut runs = Vec::new();
    let mut run_start: Option<usize> = None;

    for i in range.start..end {
        let still = speed[i] < threshold && accept(i);
        match (still, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(s)) => {
                if i - s >= min_len.max(1) {
                    runs.push(StillRun { start: s, end: i - 1 });
                }
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = run_start {
        if end - s >= min_len.max(1) {
            runs.push(StillRun { start: s, end: end - 1 });
        }
    }
    runs
}

pub fn find_still_runs(
    speed: &[f64],
    range: Range<usize>,
    threshold: f64,
    min_len: usize,
) -> Vec<StillRun> {
    find_runs_where(speed, range, threshold, min_len, |_| true)
}
