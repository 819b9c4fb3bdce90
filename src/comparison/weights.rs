// src/comparison/weights.rs
//
// Reliability of each (angle, phase) measurement under 2-D projection.
// Above 1.0: decisive and well measured. Below 1.0: limbs moving along the
// camera axis distort the angle.

use crate::types::{AngleName, Phase};

/// Never ranked. Line tilts are not true rotation, x_factor is built from
/// them, and arm-torso angles carry large projection error in DTL.
pub const EXCLUDED_FROM_RANKING: [AngleName; 5] = [
    AngleName::ShoulderLineAngle,
    AngleName::HipLineAngle,
    AngleName::XFactor,
    AngleName::LeadArmTorso,
    AngleName::TrailArmTorso,
];

pub fn is_excluded(angle: AngleName) -> bool {
    EXCLUDED_FROM_RANKING.contains(&angle)
}

pub fn reliability_weight(angle: AngleName, phase: Phase) -> f64 {
    use AngleName::*;
    match (angle, phase) {
        (SpineAngleDtl, Phase::Impact) => 1.5,
        (SpineAngleDtl, Phase::Top) => 1.3,
        (SpineTiltFo, Phase::Impact) => 1.3,
        (RightElbow, Phase::Top) => 1.2,
        (LeftElbow, Phase::Impact) => 1.3,
        (RightKneeFlex, _) | (LeftKneeFlex, _) => 0.7,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights() {
        assert_eq!(reliability_weight(AngleName::SpineAngleDtl, Phase::Impact), 1.5);
        assert_eq!(reliability_weight(AngleName::SpineAngleDtl, Phase::Address), 1.0);
        assert_eq!(reliability_weight(AngleName::LeftKneeFlex, Phase::FollowThrough), 0.7);
        assert_eq!(reliability_weight(AngleName::RightWristCock, Phase::Top), 1.0);
    }

    #[test]
    fn test_exclusions() {
        assert!(is_excluded(AngleName::XFactor));
        assert!(is_excluded(AngleName::TrailArmTorso));
        assert!(!is_excluded(AngleName::SpineTiltFo));
    }
}
