// src/feedback/rules.rs
//
// Directional fault catalog. Matching is first-match-wins in declaration
// order, so reordering entries changes which title a delta receives.
//
// Templates accept {user_value}, {ref_value}, {abs_delta} and {delta},
// each rendered to one decimal place.

use crate::types::{AngleName, Phase, View};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Major => "major",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaultRule {
    pub angle: AngleName,
    pub phase: Phase,
    pub view: View,
    /// Fires when delta <= min_delta
    pub min_delta: Option<f64>,
    /// Fires when delta >= max_delta
    pub max_delta: Option<f64>,
    pub severity: Severity,
    pub title: &'static str,
    pub description: &'static str,
    pub coaching_tip: &'static str,
}

impl FaultRule {
    /// A rule with neither bound never fires.
    pub fn matches(&self, delta: f64) -> bool {
        self.min_delta.map_or(false, |min| delta <= min)
            || self.max_delta.map_or(false, |max| delta >= max)
    }

    pub fn applies_to(&self, angle: AngleName, phase: Phase, view: View) -> bool {
        self.angle == angle && self.phase == phase && self.view == view
    }
}

#[allow(clippy::too_many_arguments)]
const fn too_little(
    angle: AngleName,
    phase: Phase,
    view: View,
    min_delta: f64,
    severity: Severity,
    title: &'static str,
    description: &'static str,
    coaching_tip: &'static str,
) -> FaultRule {
    FaultRule {
        angle,
        phase,
        view,
        min_delta: Some(min_delta),
        max_delta: None,
        severity,
        title,
        description,
        coaching_tip,
    }
}

#[allow(clippy::too_many_arguments)]
const fn too_much(
    angle: AngleName,
    phase: Phase,
    view: View,
    max_delta: f64,
    severity: Severity,
    title: &'static str,
    description: &'static str,
    coaching_tip: &'static str,
) -> FaultRule {
    FaultRule {
        angle,
        phase,
        view,
        min_delta: None,
        max_delta: Some(max_delta),
        severity,
        title,
        description,
        coaching_tip,
    }
}

use AngleName::*;
use Severity::*;
use View::{DownTheLine as Dtl, FaceOn as Fo};

pub static FAULT_RULES: &[FaultRule] = &[
    // ========================================================================
    // DOWN THE LINE
    // ========================================================================
    too_much(
        SpineAngleDtl, Phase::Address, Dtl, 8.0, Moderate,
        "Too Upright at Setup",
        "Your spine angle at address is {user_value}° against the reference's {ref_value}°, \
         a {abs_delta}° difference. An upright setup flattens the swing plane.",
        "Hinge from the hips until your arms hang straight down under your shoulders. \
         Keep your back flat, not rounded.",
    ),
    too_little(
        SpineAngleDtl, Phase::Address, Dtl, -8.0, Moderate,
        "Too Bent Over at Setup",
        "Your spine angle at address is {user_value}° against the reference's {ref_value}°, \
         a {abs_delta}° difference. Excess bend crowds the arms and steepens the swing.",
        "Stand a little taller at address and let your arms hang naturally. \
         Your weight should sit over the balls of your feet.",
    ),
    too_much(
        SpineAngleDtl, Phase::Top, Dtl, 8.0, Major,
        "Standing Up in the Backswing",
        "Your spine angle at the top is {user_value}° against the reference's {ref_value}°, \
         a {abs_delta}° loss of posture during the backswing.",
        "Feel your chest stay over the ball as you turn back. \
         Rehearse backswings with your rear end touching a wall.",
    ),
    too_little(
        SpineAngleDtl, Phase::Top, Dtl, -8.0, Moderate,
        "Dipping in the Backswing",
        "Your spine angle at the top is {user_value}° against the reference's {ref_value}°, \
         a {abs_delta}° change that drops the chest toward the ball.",
        "Turn around your spine instead of bending toward the ball. \
         Keep your head height level through the backswing.",
    ),
    too_much(
        SpineAngleDtl, Phase::Impact, Dtl, 8.0, Major,
        "Early Extension (Loss of Posture)",
        "Your spine angle at impact is {user_value}° compared to the reference's {ref_value}°, \
         a {abs_delta}° difference. Standing up through impact pushes the hips toward the ball \
         and makes contact inconsistent.",
        "Practice with your rear end against a wall or chair and keep it there through impact. \
         Feel your spine angle stay constant from address to strike.",
    ),
    too_little(
        SpineAngleDtl, Phase::Impact, Dtl, -8.0, Moderate,
        "Diving Into Impact",
        "Your spine angle at impact is {user_value}° compared to the reference's {ref_value}°, \
         a {abs_delta}° difference that moves the head down toward the ball.",
        "Let your chest rotate through the ball instead of moving down toward it. \
         Keep your head level through impact.",
    ),
    too_much(
        RightElbow, Phase::Top, Dtl, 20.0, Major,
        "Flying Right Elbow",
        "Your right elbow angle at the top is {user_value}° against the reference's {ref_value}°. \
         A wider trail elbow gets the club off plane and makes a square return harder.",
        "Keep a towel under your right arm during practice swings. \
         Your right elbow should point down at the top, not out.",
    ),
    too_little(
        RightElbow, Phase::Top, Dtl, -20.0, Moderate,
        "Over-Folded Trail Arm",
        "Your right elbow angle at the top is {user_value}° against the reference's {ref_value}°, \
         {abs_delta}° more folded. Collapsing the trail arm shortens the swing arc.",
        "Keep width in the backswing by pushing the hands away from your chest. \
         Your trail arm should form roughly a right angle at the top.",
    ),
    too_little(
        LeftElbow, Phase::Impact, Dtl, -15.0, Major,
        "Chicken Wing at Impact",
        "Your left elbow is {user_value}° at impact compared to the reference's {ref_value}°. \
         A bent lead arm at impact causes thin contact and costs power.",
        "Extend your lead arm through the ball. \
         Hit half shots with only your left arm to build extension.",
    ),
    too_little(
        RightKneeFlex, Phase::Address, Dtl, -15.0, Moderate,
        "Excessive Knee Flex at Setup",
        "Your right knee flex at address is {user_value}° against the reference's {ref_value}°. \
         Too much knee bend restricts hip turn and hurts balance.",
        "Set up in an athletic posture with only a slight knee flex. \
         Feel ready to move, not seated.",
    ),
    too_much(
        RightKneeFlex, Phase::Address, Dtl, 15.0, Moderate,
        "Legs Too Straight at Setup",
        "Your right knee flex at address is {user_value}° against the reference's {ref_value}°. \
         Locked legs limit athletic movement.",
        "Add a little flex to both knees at address. \
         You should feel balanced and able to move in any direction.",
    ),
    too_much(
        RightKneeFlex, Phase::Top, Dtl, 15.0, Moderate,
        "Trail Leg Straightening",
        "Your right knee straightens to {user_value}° at the top against the reference's {ref_value}°. \
         Losing trail knee flex lets the hips over-turn and the posture rise.",
        "Keep the flex in your right knee as you turn back. \
         Feel pressure on the inside of your right foot at the top.",
    ),
    too_much(
        RightWristCock, Phase::Top, Dtl, 20.0, Moderate,
        "Limited Wrist Hinge at the Top",
        "Your wrist angle at the top is {user_value}° against the reference's {ref_value}°, \
         {abs_delta}° less hinge. An unhinged top position costs clubhead speed.",
        "Set the wrists early in the takeaway so the shaft points up by the time \
         your lead arm is parallel to the ground.",
    ),
    too_little(
        RightWristCock, Phase::Top, Dtl, -20.0, Minor,
        "Over-Hinged Wrists",
        "Your wrist angle at the top is {user_value}° against the reference's {ref_value}°, \
         {abs_delta}° more hinge than needed.",
        "Keep the lead wrist flat at the top and let the hinge come from the thumbs, \
         not a cupped wrist.",
    ),
    too_little(
        LeadArmTorso, Phase::Top, Dtl, -15.0, Major,
        "Limited Backswing Arm Lift",
        "Your lead arm reaches {user_value}° from your torso at the top against the reference's \
         {ref_value}°. This {abs_delta}° gap limits swing arc and power.",
        "Make a fuller shoulder turn while keeping the lead arm extended. \
         Feel your hands reach the 1 o'clock position at the top.",
    ),
    too_much(
        LeadArmTorso, Phase::Top, Dtl, 15.0, Moderate,
        "Overswinging Past Parallel",
        "Your lead arm separation at the top is {user_value}° against the reference's {ref_value}°. \
         Overswinging reduces control and consistency.",
        "Stop the backswing when your shoulder turn is complete. \
         Check your top position in a mirror.",
    ),
    // ========================================================================
    // FACE ON
    // ========================================================================
    too_little(
        SpineTiltFo, Phase::Top, Fo, -8.0, Major,
        "Reverse Spine Angle at the Top",
        "Your spine tilt at the top is {user_value}° against the reference's {ref_value}°, \
         leaning {abs_delta}° toward the target. A reverse spine angle loads the lower back.",
        "Let your upper body tilt slightly away from the target as you turn back. \
         Your head should stay behind the ball.",
    ),
    too_much(
        SpineTiltFo, Phase::Impact, Fo, 8.0, Moderate,
        "Hanging Back Through Impact",
        "Your spine tilt at impact is {user_value}° against the reference's {ref_value}°, \
         {abs_delta}° further away from the target.",
        "Shift pressure to your lead foot before the hands reach the ball. \
         Finish with your belt buckle facing the target.",
    ),
    too_little(
        SpineTiltFo, Phase::Impact, Fo, -8.0, Moderate,
        "Upper Body Ahead of the Ball",
        "Your spine tilt at impact is {user_value}° against the reference's {ref_value}°, \
         {abs_delta}° further toward the target. Sliding ahead of the ball delofts and opens the face.",
        "Keep your head behind the ball through impact. \
         Feel the lower body lead while the chest stays back.",
    ),
    too_little(
        XFactor, Phase::Top, Fo, -10.0, Major,
        "Limited Shoulder-Hip Separation",
        "Your shoulder-hip tilt gap at the top is {user_value}° against the reference's {ref_value}°. \
         Less separation means less coil to release in the downswing.",
        "Turn your shoulders fully while keeping the hips quieter. \
         Feel a stretch across your core at the top.",
    ),
    too_much(
        XFactor, Phase::Top, Fo, 10.0, Moderate,
        "Over-Rotated Shoulders",
        "Your shoulder-hip tilt gap at the top is {user_value}° against the reference's {ref_value}°, \
         {abs_delta}° beyond it.",
        "Let the hips turn with the shoulders instead of restricting them. \
         A controlled coil is easier to time than a maximal one.",
    ),
    too_much(
        RightKneeFlex, Phase::Top, Fo, 15.0, Major,
        "Lower Body Sway",
        "Your right knee flex at the top is {user_value}° against the reference's {ref_value}°. \
         A straightening trail leg points to a lateral sway rather than a rotational load.",
        "Keep flex in your right knee throughout the backswing. \
         Practice with a ball under the outside of your right foot.",
    ),
    too_little(
        LeftKneeFlex, Phase::Impact, Fo, -12.0, Moderate,
        "Lead Knee Collapsing at Impact",
        "Your left knee is {user_value}° at impact against the reference's {ref_value}°, \
         {abs_delta}° more bent. A soft lead leg leaks energy before the strike.",
        "Post up on your lead leg as the hands reach the ball. \
         Feel the left knee straighten into impact.",
    ),
    too_much(
        LeftKneeFlex, Phase::Impact, Fo, 12.0, Minor,
        "Lead Leg Locked Early",
        "Your left knee is {user_value}° at impact against the reference's {ref_value}°, \
         {abs_delta}° straighter.",
        "Let the lead leg firm up through impact rather than before it. \
         Step-through drills help with the timing.",
    ),
    too_little(
        LeftElbow, Phase::Impact, Fo, -15.0, Major,
        "Chicken Wing at Impact",
        "Your left elbow is {user_value}° at impact compared to the reference's {ref_value}°. \
         A bent lead arm at impact causes thin contact and costs power.",
        "Extend your lead arm through the ball. \
         Hit half shots with only your left arm to build extension.",
    ),
    too_little(
        LeadArmTorso, Phase::Impact, Fo, -15.0, Moderate,
        "Arm-Body Connection Lost at Impact",
        "Your arm-body angle at impact is {user_value}° against the reference's {ref_value}°. \
         Keeping the arms connected to the turning body gives more consistent strikes.",
        "Practice with a glove under your lead armpit. \
         If it drops before impact, the arms have disconnected.",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_rule_is_directional() {
        for rule in FAULT_RULES {
            assert!(
                rule.min_delta.is_some() || rule.max_delta.is_some(),
                "{} has no bound",
                rule.title
            );
        }
    }

    #[test]
    fn test_bounds_inclusive() {
        let upright = &FAULT_RULES[0];
        assert!(upright.matches(8.0));
        assert!(upright.matches(9.0));
        assert!(!upright.matches(7.9));
        assert!(!upright.matches(-100.0));

        let bent = &FAULT_RULES[1];
        assert!(bent.matches(-8.0));
        assert!(!bent.matches(-7.0));
    }

    #[test]
    fn test_unbounded_rule_never_matches() {
        let rule = FaultRule {
            min_delta: None,
            max_delta: None,
            ..FAULT_RULES[0].clone()
        };
        assert!(!rule.matches(100.0));
        assert!(!rule.matches(-100.0));
        assert!(!rule.matches(0.0));
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Major).unwrap(), "\"major\"");
    }
}
