// src/comparison/ranking.rs
//
// Top-3 differences and similarities, and the aggregate similarity score.
// Candidates are collected in (view, phase, angle) order and sorted stably,
// so equal keys keep that order and output is reproducible.

use super::weights::{is_excluded, reliability_weight};
use crate::types::{AngleName, ComparisonConfig, DeltaTable, Phase, SwingAngles, View};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDifference {
    pub angle_name: AngleName,
    pub phase: Phase,
    pub view: View,
    pub user_value: f64,
    pub reference_value: f64,
    pub delta: f64,
    pub rank: usize,
}

struct Candidate {
    diff: RankedDifference,
    sort_key: f64,
}

fn value_at(angles: &SwingAngles, view: View, phase: Phase, angle: AngleName) -> Option<f64> {
    angles.get(&view)?.get(&phase)?.angles.get(&angle).copied()
}

fn gather_candidates(
    deltas: &DeltaTable,
    user: &SwingAngles,
    reference: &SwingAngles,
    keep: impl Fn(AngleName, Phase, f64) -> Option<f64>,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (&view, phases) in deltas {
        for (&phase, angles) in phases {
            for (&angle, &delta) in angles {
                if is_excluded(angle) || !delta.is_finite() {
                    continue;
                }
                let Some(sort_key) = keep(angle, phase, delta) else {
                    continue;
                };
                let (Some(user_value), Some(reference_value)) = (
                    value_at(user, view, phase, angle),
                    value_at(reference, view, phase, angle),
                ) else {
                    continue;
                };
                out.push(Candidate {
                    diff: RankedDifference {
                        angle_name: angle,
                        phase,
                        view,
                        user_value,
                        reference_value,
                        delta,
                        rank: 0,
                    },
                    sort_key,
                });
            }
        }
    }
    out
}

/// Take up to `top_n` in order, capping each view when several views exist.
fn select_balanced(
    candidates: Vec<Candidate>,
    view_count: usize,
    config: &ComparisonConfig,
) -> Vec<RankedDifference> {
    let max_per_view = if view_count > 1 {
        config.max_per_view_multi
    } else {
        config.top_n
    };
    let mut per_view: BTreeMap<View, usize> = BTreeMap::new();
    let mut selected = Vec::new();

    for candidate in candidates {
        if selected.len() >= config.top_n {
            break;
        }
        let count = per_view.entry(candidate.diff.view).or_insert(0);
        if *count >= max_per_view {
            continue;
        }
        *count += 1;
        let mut diff = candidate.diff;
        diff.rank = selected.len() + 1;
        selected.push(diff);
    }
    selected
}

fn summarize(items: &[RankedDifference]) -> String {
    items
        .iter()
        .map(|d| format!("{}@{} ({:+.1}°)", d.angle_name, d.phase, d.delta))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Most significant differences first, by reliability-weighted |delta|.
pub fn rank_differences(
    deltas: &DeltaTable,
    user: &SwingAngles,
    reference: &SwingAngles,
    config: &ComparisonConfig,
) -> Vec<RankedDifference> {
    let mut candidates = gather_candidates(deltas, user, reference, |angle, phase, delta| {
        (delta.abs() >= config.min_delta_degrees)
            .then(|| delta.abs() * reliability_weight(angle, phase))
    });
    candidates.sort_by(|a, b| b.sort_key.partial_cmp(&a.sort_key).unwrap_or(Ordering::Equal));

    let selected = select_balanced(candidates, deltas.len(), config);
    info!("Top {} differences: {}", selected.len(), summarize(&selected));
    selected
}

/// Closest matches first, by raw |delta|. No significance floor.
pub fn rank_similarities(
    deltas: &DeltaTable,
    user: &SwingAngles,
    reference: &SwingAngles,
    config: &ComparisonConfig,
) -> Vec<RankedDifference> {
    let mut candidates = gather_candidates(deltas, user, reference, |_, _, delta| Some(delta.abs()));
    candidates.sort_by(|a, b| a.sort_key.partial_cmp(&b.sort_key).unwrap_or(Ordering::Equal));

    let selected = select_balanced(candidates, deltas.len(), config);
    info!("Top {} similarities: {}", selected.len(), summarize(&selected));
    selected
}

/// Per-angle tolerance: downweighted angles get proportionally more room.
pub fn score_tolerance(angle: AngleName, phase: Phase, config: &ComparisonConfig) -> f64 {
    let weight = reliability_weight(angle, phase);
    if weight < 1.0 {
        config.max_score_delta / weight
    } else {
        config.max_score_delta
    }
}

/// Mean of `max(0, 1 − |delta| / tolerance)` over every finite delta, as 0–100.
pub fn compute_similarity_score(deltas: &DeltaTable, config: &ComparisonConfig) -> u8 {
    let scores: Vec<f64> = deltas
        .values()
        .flat_map(|phases| phases.iter())
        .flat_map(|(&phase, angles)| {
            angles
                .iter()
                .filter(|(_, d)| d.is_finite())
                .map(move |(&angle, &d)| {
                    (1.0 - d.abs() / score_tolerance(angle, phase, config)).max(0.0)
                })
        })
        .collect();

    if scores.is_empty() {
        return 0;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    (mean * 100.0).round_ties_even().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnglePhaseResult, ViewAngles};
    use proptest::prelude::*;

    /// Builds (deltas, user, reference) from (view, phase, angle, user, reference) rows.
    fn fixture(
        rows: &[(View, Phase, AngleName, f64, f64)],
    ) -> (DeltaTable, SwingAngles, SwingAngles) {
        let mut deltas = DeltaTable::new();
        let mut user = SwingAngles::new();
        let mut reference = SwingAngles::new();

        fn put(angles: &mut SwingAngles, view: View, phase: Phase, angle: AngleName, v: f64) {
            angles
                .entry(view)
                .or_insert_with(ViewAngles::new)
                .entry(phase)
                .or_insert_with(|| AnglePhaseResult {
                    frame: 0,
                    timestamp_sec: 0.0,
                    description: String::new(),
                    angles: BTreeMap::new(),
                })
                .angles
                .insert(angle, v);
        }

        for &(view, phase, angle, u, r) in rows {
            let d = ((u - r) * 10.0).round() / 10.0;
            deltas
                .entry(view)
                .or_default()
                .entry(phase)
                .or_default()
                .insert(angle, d);
            put(&mut user, view, phase, angle, u);
            put(&mut reference, view, phase, angle, r);
        }
        (deltas, user, reference)
    }

    fn only_deltas(rows: &[(Phase, AngleName, f64)]) -> DeltaTable {
        let mut deltas = DeltaTable::new();
        for &(phase, angle, d) in rows {
            deltas
                .entry(View::DownTheLine)
                .or_default()
                .entry(phase)
                .or_default()
                .insert(angle, d);
        }
        deltas
    }

    use AngleName::*;
    use Phase::*;
    use View::*;

    #[test]
    fn test_top_three_by_weighted_delta() {
        let (d, u, r) = fixture(&[
            (DownTheLine, Address, SpineAngleDtl, 30.0, 18.9),
            (DownTheLine, Top, RightElbow, 80.0, 65.1),
            (DownTheLine, Impact, LeftElbow, 158.0, 175.5),
            (DownTheLine, Top, RightKneeFlex, 178.0, 171.1),
            (DownTheLine, Impact, RightKneeFlex, 150.0, 154.3),
        ]);
        let ranked = rank_differences(&d, &u, &r, &ComparisonConfig::default());
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].angle_name, LeftElbow);
        assert_eq!(ranked[1].angle_name, RightElbow);
        assert_eq!(ranked[2].angle_name, SpineAngleDtl);
        assert_eq!(
            ranked.iter().map(|d| d.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(ranked[0].delta, -17.5);
        assert_eq!(ranked[0].user_value, 158.0);
    }

    #[test]
    fn test_floor_filters_small_deltas() {
        let (d, u, r) = fixture(&[
            (DownTheLine, Address, SpineAngleDtl, 20.0, 18.9),
            (DownTheLine, Top, RightElbow, 67.0, 65.1),
            (DownTheLine, Impact, LeftElbow, 172.0, 175.5),
        ]);
        assert!(rank_differences(&d, &u, &r, &ComparisonConfig::default()).is_empty());
    }

    #[test]
    fn test_excluded_angles_never_ranked() {
        let (d, u, r) = fixture(&[
            (FaceOn, Address, ShoulderLineAngle, 177.0, 145.0),
            (FaceOn, Address, HipLineAngle, 170.0, 140.0),
            (FaceOn, Top, XFactor, 50.0, 23.0),
            (FaceOn, Impact, SpineTiltFo, 25.0, 18.0),
        ]);
        let ranked = rank_differences(&d, &u, &r, &ComparisonConfig::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].angle_name, SpineTiltFo);

        let similar = rank_similarities(&d, &u, &r, &ComparisonConfig::default());
        assert!(similar.iter().all(|s| !is_excluded(s.angle_name)));
    }

    #[test]
    fn test_weight_outranks_larger_raw_delta() {
        // 11.3 × 1.5 = 16.95 beats 14.3 × 1.0
        let (d, u, r) = fixture(&[
            (DownTheLine, Impact, SpineAngleDtl, 30.0, 18.7),
            (DownTheLine, Address, RightWristCock, 140.0, 154.3),
        ]);
        let ranked = rank_differences(&d, &u, &r, &ComparisonConfig::default());
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].angle_name, SpineAngleDtl);
        assert_eq!(ranked[0].delta, 11.3);
        assert_eq!(ranked[1].angle_name, RightWristCock);
        assert_eq!(ranked[1].delta, -14.3);
    }

    #[test]
    fn test_view_balance_with_two_views() {
        let (d, u, r) = fixture(&[
            (DownTheLine, Impact, SpineAngleDtl, 30.0, 18.7),
            (DownTheLine, Impact, LeftElbow, 158.0, 175.5),
            (DownTheLine, Top, RightElbow, 80.0, 65.1),
            (FaceOn, Impact, SpineTiltFo, 25.0, 18.0),
        ]);
        let ranked = rank_differences(&d, &u, &r, &ComparisonConfig::default());
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked.iter().filter(|d| d.view == DownTheLine).count(), 2);
        assert_eq!(ranked[2].view, FaceOn);
    }

    #[test]
    fn test_single_view_allows_three() {
        let (d, u, r) = fixture(&[
            (DownTheLine, Impact, SpineAngleDtl, 30.0, 18.7),
            (DownTheLine, Top, RightElbow, 80.0, 65.1),
            (DownTheLine, Impact, LeftElbow, 158.0, 175.5),
        ]);
        let ranked = rank_differences(&d, &u, &r, &ComparisonConfig::default());
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|d| d.view == DownTheLine));
    }

    #[test]
    fn test_similarities_smallest_first() {
        let (d, u, r) = fixture(&[
            (DownTheLine, Address, SpineAngleDtl, 19.0, 18.9),
            (DownTheLine, Top, RightElbow, 80.0, 65.1),
            (DownTheLine, Impact, LeftElbow, 173.5, 175.5),
            (DownTheLine, Top, RightKneeFlex, 178.0, 171.1),
        ]);
        let similar = rank_similarities(&d, &u, &r, &ComparisonConfig::default());
        let names: Vec<_> = similar.iter().map(|s| s.angle_name).collect();
        assert_eq!(names, vec![SpineAngleDtl, LeftElbow, RightKneeFlex]);
    }

    #[test]
    fn test_score_anchors() {
        let config = ComparisonConfig::default();
        let perfect = only_deltas(&[(Address, SpineAngleDtl, 0.0), (Address, RightElbow, 0.0)]);
        assert_eq!(compute_similarity_score(&perfect, &config), 100);

        let bad = only_deltas(&[(Address, SpineAngleDtl, 45.0), (Address, RightElbow, 50.0)]);
        assert_eq!(compute_similarity_score(&bad, &config), 0);

        let mixed = only_deltas(&[
            (Address, SpineAngleDtl, 0.0),
            (Address, RightElbow, 22.5),
            (Address, LeftElbow, 45.0),
        ]);
        assert_eq!(compute_similarity_score(&mixed, &config), 50);
    }

    #[test]
    fn test_score_widens_tolerance_for_knees() {
        let config = ComparisonConfig::default();
        // 45 / 0.7 ≈ 64.3° tolerance, so 45° still scores
        let knee = only_deltas(&[(Top, RightKneeFlex, 45.0)]);
        assert_eq!(compute_similarity_score(&knee, &config), 30);
    }

    #[test]
    fn test_score_empty_is_zero() {
        let config = ComparisonConfig::default();
        assert_eq!(compute_similarity_score(&DeltaTable::new(), &config), 0);
        let mut hollow = DeltaTable::new();
        hollow.entry(DownTheLine).or_default().entry(Address).or_default();
        assert_eq!(compute_similarity_score(&hollow, &config), 0);
    }

    fn rankable_angle() -> impl Strategy<Value = AngleName> {
        prop_oneof![
            Just(SpineAngleDtl),
            Just(RightElbow),
            Just(LeftElbow),
            Just(RightKneeFlex),
            Just(LeftKneeFlex),
            Just(RightWristCock),
            Just(SpineTiltFo),
            Just(XFactor),
            Just(LeadArmTorso),
            Just(ShoulderLineAngle),
        ]
    }

    fn any_phase() -> impl Strategy<Value = Phase> {
        prop_oneof![Just(Address), Just(Top), Just(Impact), Just(FollowThrough)]
    }

    fn any_view() -> impl Strategy<Value = View> {
        prop_oneof![Just(DownTheLine), Just(FaceOn)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_ranking_respects_caps(
            rows in prop::collection::vec(
                (any_view(), any_phase(), rankable_angle(), 0.0f64..180.0, 0.0f64..180.0),
                0..30,
            )
        ) {
            let (d, u, r) = fixture(&rows);
            let config = ComparisonConfig::default();
            let ranked = rank_differences(&d, &u, &r, &config);

            prop_assert!(ranked.len() <= 3);
            for item in &ranked {
                prop_assert!(!is_excluded(item.angle_name));
                prop_assert!(item.delta.abs() >= config.min_delta_degrees);
            }
            if d.len() > 1 {
                for view in View::ALL {
                    prop_assert!(ranked.iter().filter(|x| x.view == view).count() <= 2);
                }
            }
            for pair in ranked.windows(2) {
                let w = |x: &RankedDifference| x.delta.abs() * reliability_weight(x.angle_name, x.phase);
                prop_assert!(w(&pair[0]) >= w(&pair[1]));
            }
        }

        #[test]
        fn prop_weighted_entry_ranks_first(a in 5.0f64..50.0, ratio in 1.01f64..1.49) {
            let b = a * ratio;
            let (d, u, r) = fixture(&[
                (DownTheLine, Impact, SpineAngleDtl, a, 0.0),
                (DownTheLine, Address, SpineAngleDtl, b, 0.0),
            ]);
            let da = d[&DownTheLine][&Impact][&SpineAngleDtl];
            let db = d[&DownTheLine][&Address][&SpineAngleDtl];
            // 1.5a > b > a after rounding
            prop_assume!(1.5 * da > db && db > da);

            let ranked = rank_differences(&d, &u, &r, &ComparisonConfig::default());
            prop_assert_eq!(ranked.len(), 2);
            prop_assert_eq!(ranked[0].phase, Impact);
            prop_assert_eq!(ranked[1].phase, Address);
        }

        #[test]
        fn prop_score_bounded_and_monotonic(
            base in prop::collection::vec(0.0f64..90.0, 1..10),
            bump in 0.0f64..30.0,
        ) {
            let config = ComparisonConfig::default();
            let angles = [SpineAngleDtl, RightElbow, LeftElbow, RightWristCock, SpineTiltFo];
            let phases = [Address, Top, Impact, FollowThrough];
            let rows: Vec<(Phase, AngleName, f64)> = base
                .iter()
                .enumerate()
                .map(|(i, &d)| (phases[i % 4], angles[i / 4 % 5], d))
                .collect();

            let before = compute_similarity_score(&only_deltas(&rows), &config);
            let mut worse = rows.clone();
            worse[0].2 += bump;
            let after = compute_similarity_score(&only_deltas(&worse), &config);

            prop_assert!(before <= 100);
            prop_assert!(after <= before);
        }
    }
}
