// src/angles/calculator.rs

use super::geometry::{
    angle_at_joint, forward_bend, line_angle, midpoint, signed_spine_tilt, x_factor, Point,
};
use crate::error::AnalysisError;
use crate::types::{
    AngleName, AnglePhaseResult, Joint, LandmarkFrame, LandmarkSeries, PhaseSet, View, ViewAngles,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Wrist cock is only trusted above this right-wrist visibility.
pub const WRIST_COCK_MIN_VISIBILITY: f64 = 0.4;

struct Pose<'a> {
    frame: &'a LandmarkFrame,
}

impl Pose<'_> {
    fn point(&self, joint: Joint) -> Option<Point> {
        self.frame.landmark(joint).map(|lm| lm.xy())
    }

    fn at_joint(&self, a: Joint, b: Joint, c: Joint) -> Option<f64> {
        Some(angle_at_joint(self.point(a)?, self.point(b)?, self.point(c)?))
    }

    fn mids(&self) -> Option<(Point, Point)> {
        let shoulders = midpoint(
            self.point(Joint::LeftShoulder)?,
            self.point(Joint::RightShoulder)?,
        );
        let hips = midpoint(self.point(Joint::LeftHip)?, self.point(Joint::RightHip)?);
        Some((shoulders, hips))
    }

    fn line(&self, from: Joint, to: Joint) -> Option<f64> {
        Some(line_angle(self.point(from)?, self.point(to)?))
    }

    fn lead_arm_torso(&self) -> Option<f64> {
        self.at_joint(Joint::LeftElbow, Joint::LeftShoulder, Joint::LeftHip)
    }

    fn elbow(&self, shoulder: Joint, elbow: Joint, wrist: Joint) -> Option<f64> {
        self.at_joint(shoulder, elbow, wrist)
    }

    fn knee(&self, hip: Joint, knee: Joint, ankle: Joint) -> Option<f64> {
        self.at_joint(hip, knee, ankle)
    }
}

fn down_the_line(pose: &Pose) -> Vec<(AngleName, Option<f64>)> {
    let mut angles = vec![
        (
            AngleName::SpineAngleDtl,
            pose.mids().map(|(s, h)| forward_bend(s, h)),
        ),
        (AngleName::LeadArmTorso, pose.lead_arm_torso()),
        (
            AngleName::TrailArmTorso,
            pose.at_joint(Joint::RightElbow, Joint::RightShoulder, Joint::RightHip),
        ),
        (
            AngleName::RightElbow,
            pose.elbow(Joint::RightShoulder, Joint::RightElbow, Joint::RightWrist),
        ),
        (
            AngleName::LeftElbow,
            pose.elbow(Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist),
        ),
        (
            AngleName::RightKneeFlex,
            pose.knee(Joint::RightHip, Joint::RightKnee, Joint::RightAnkle),
        ),
    ];

    let wrist_visible = pose
        .frame
        .landmark(Joint::RightWrist)
        .map_or(false, |lm| lm.visibility > WRIST_COCK_MIN_VISIBILITY);
    if wrist_visible {
        angles.push((
            AngleName::RightWristCock,
            pose.at_joint(Joint::RightElbow, Joint::RightWrist, Joint::RightIndex),
        ));
    }
    angles
}

fn face_on(pose: &Pose) -> Vec<(AngleName, Option<f64>)> {
    let shoulder_line = pose.line(Joint::LeftShoulder, Joint::RightShoulder);
    let hip_line = pose.line(Joint::LeftHip, Joint::RightHip);

    vec![
        (AngleName::ShoulderLineAngle, shoulder_line),
        (AngleName::HipLineAngle, hip_line),
        (
            AngleName::XFactor,
            shoulder_line.zip(hip_line).map(|(s, h)| x_factor(s, h)),
        ),
        (
            AngleName::SpineTiltFo,
            pose.mids().map(|(s, h)| signed_spine_tilt(s, h)),
        ),
        (AngleName::LeadArmTorso, pose.lead_arm_torso()),
        (
            AngleName::RightKneeFlex,
            pose.knee(Joint::RightHip, Joint::RightKnee, Joint::RightAnkle),
        ),
        (
            AngleName::LeftKneeFlex,
            pose.knee(Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle),
        ),
        (
            AngleName::RightElbow,
            pose.elbow(Joint::RightShoulder, Joint::RightElbow, Joint::RightWrist),
        ),
        (
            AngleName::LeftElbow,
            pose.elbow(Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist),
        ),
    ]
}

/// The view's angle set for one detected frame. Angles whose joints are
/// absent from the frame are left out.
pub fn angles_for_frame(frame: &LandmarkFrame, view: View) -> BTreeMap<AngleName, f64> {
    let pose = Pose { frame };
    let computed = match view {
        View::DownTheLine => down_the_line(&pose),
        View::FaceOn => face_on(&pose),
    };
    computed
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
}

/// Angles at every found phase whose frame has a detection.
///
/// Phases without a usable frame are absent from the result, never zero.
pub fn calculate_angles(
    series: &LandmarkSeries,
    phases: &PhaseSet,
    view: View,
) -> Result<ViewAngles, AnalysisError> {
    let mut results = ViewAngles::new();

    for (phase, phase_frame) in phases.iter() {
        if !phase_frame.is_found() {
            continue;
        }
        let frame = match series.frame(phase_frame.frame_index) {
            Some(f) if f.detected => f,
            _ => {
                warn!(
                    "{}: frame {} for {} missing or undetected, no angles",
                    view,
                    phase_frame.frame_index,
                    phase.display_name()
                );
                continue;
            }
        };

        let angles = angles_for_frame(frame, view);
        if angles.is_empty() {
            continue;
        }
        debug!("{} {}: {} angles", view, phase, angles.len());

        results.insert(
            phase,
            AnglePhaseResult {
                frame: frame.frame_index,
                timestamp_sec: frame.timestamp_sec,
                description: phase_frame.description.clone(),
                angles,
            },
        );
    }

    if results.is_empty() {
        return Err(AnalysisError::AngleComputationEmpty { view });
    }
    Ok(results)
}
