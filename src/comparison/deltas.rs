// src/comparison/deltas.rs

use crate::angles::geometry::round1;
use crate::types::{AngleName, DeltaTable, SwingAngles};
use std::collections::BTreeMap;

/// Shortest signed path from `reference` to `user`, in (-180, 180].
pub fn angular_difference(user: f64, reference: f64) -> f64 {
    let d = (user - reference + 180.0).rem_euclid(360.0) - 180.0;
    if d <= -180.0 {
        d + 360.0
    } else {
        d
    }
}

pub fn angle_delta(angle: AngleName, user: f64, reference: f64) -> f64 {
    if angle.wraps_around() {
        // rounding can land back on -180
        let d = round1(angular_difference(user, reference));
        if d <= -180.0 {
            d + 360.0
        } else {
            d
        }
    } else {
        round1(user - reference)
    }
}

/// `user − reference` for every (view, phase, angle) both sides measured.
///
/// A view or phase present on both sides always gets an entry, even if no
/// angle in it is shared. Non-finite values are skipped.
pub fn compute_deltas(user: &SwingAngles, reference: &SwingAngles) -> DeltaTable {
    let mut deltas = DeltaTable::new();

    for (view, user_phases) in user {
        let Some(ref_phases) = reference.get(view) else {
            continue;
        };
        let view_deltas = deltas.entry(*view).or_default();

        for (phase, user_result) in user_phases {
            let Some(ref_result) = ref_phases.get(phase) else {
                continue;
            };
            let phase_deltas: BTreeMap<AngleName, f64> = user_result
                .angles
                .iter()
                .filter_map(|(angle, &u)| {
                    let r = *ref_result.angles.get(angle)?;
                    (u.is_finite() && r.is_finite()).then(|| (*angle, angle_delta(*angle, u, r)))
                })
                .collect();
            view_deltas.insert(*phase, phase_deltas);
        }
    }
    deltas
}
