// src/types.rs

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub signal: SignalConfig,
    pub phases: PhaseConfig,
    pub comparison: ComparisonConfig,
    pub reference: ReferenceConfig,
    pub io: IoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Joint whose vertical position drives phase detection
    pub primary_hand: Joint,
    /// Used when the primary joint's mean visibility is below `min_visibility`
    pub fallback_hand: Joint,
    pub min_visibility: f64,
    /// Centered moving-average window applied to the position signal (frames)
    pub smoothing_window: usize,
    /// Centered moving-average window applied to frame-to-frame speed (frames)
    pub velocity_window: usize,
    /// Decimal places kept for landmark coordinates before analysis
    pub round_decimals: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Max rolling speed (normalized units/frame) for a frame to count as still
    pub still_threshold: f64,
    /// Minimum consecutive still frames for an address run
    pub min_still_duration: usize,
    /// Minimum rise of the hands above the address level for a top candidate
    pub top_prominence: f64,
    pub top_search_back_sec: f64,
    /// Radius, in frames, for moving the top onto the raw-signal minimum
    pub top_refine_frames: usize,
    /// Local downswing peaks below this fraction of the global peak are ignored
    pub candidate_peak_ratio: f64,
    /// Global downswing peak must exceed this to run the velocity-ordered search
    pub downswing_noise_floor: f64,
    pub v_return_window_sec: f64,
    /// Fraction of the rise that must be recovered after a top candidate
    pub v_return_fraction: f64,
    pub address_lookback_sec: f64,
    /// Multiplier on `still_threshold` for the preceding-address stillness check
    pub address_still_factor: f64,
    pub address_min_still_frames: usize,
    pub impact_search_window_sec: f64,
    /// Impact is where downward speed decays to this fraction of its peak
    pub impact_settle_ratio: f64,
    /// Fraction of the address level used by the crossing fallback
    pub impact_crossing_ratio: f64,
    pub impact_refine_frames: usize,
    pub follow_through_delay_sec: f64,
    pub follow_through_window_sec: f64,
    pub follow_through_min_still_frames: usize,
    /// Signals whose total range is below this have no detectable top
    pub flat_signal_tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    pub min_delta_degrees: f64,
    /// Delta at which a normally weighted angle scores zero similarity
    pub max_score_delta: f64,
    pub top_n: usize,
    /// Per-view cap when more than one view contributes
    pub max_per_view_multi: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub dir: String,
    pub swing_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    pub input_dir: String,
    pub output_dir: String,
    pub default_swing_type: String,
    pub max_parallel: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

// ============================================================================
// LANDMARKS
// ============================================================================

/// Body joints used by phase detection and angle calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftIndex,
    RightIndex,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftIndex => "left_index",
            Self::RightIndex => "right_index",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub visibility: f64,
}

impl Landmark {
    pub fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkFrame {
    #[serde(alias = "frame")]
    pub frame_index: usize,
    #[serde(default)]
    pub timestamp_sec: f64,
    pub detected: bool,
    /// Keyed by joint name; extraction may supply joints this crate never reads
    #[serde(default)]
    pub landmarks: BTreeMap<String, Landmark>,
}

impl LandmarkFrame {
    pub fn landmark(&self, joint: Joint) -> Option<&Landmark> {
        self.landmarks.get(joint.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesSummary {
    pub fps: f64,
    pub total_frames: usize,
    pub resolution: Option<String>,
    pub detection_rate_pct: f64,
}

/// Output of the landmark-extraction collaborator for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkSeries {
    #[serde(default)]
    pub summary: SeriesSummary,
    pub frames: Vec<LandmarkFrame>,
}

impl LandmarkSeries {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Samples per second of the series.
    ///
    /// Extraction often keeps every Nth video frame, so the video fps is only
    /// trusted when the timestamps cannot tell us better.
    pub fn sample_rate(&self) -> f64 {
        let n = self.frames.len();
        if n >= 2 {
            let span = self.frames[n - 1].timestamp_sec - self.frames[0].timestamp_sec;
            if span > 0.0 {
                return (n - 1) as f64 / span;
            }
        }
        if self.summary.fps > 0.0 {
            self.summary.fps
        } else {
            30.0
        }
    }

    pub fn detected_count(&self) -> usize {
        self.frames.iter().filter(|f| f.detected).count()
    }

    pub fn frame(&self, frame_index: usize) -> Option<&LandmarkFrame> {
        self.frames.iter().find(|f| f.frame_index == frame_index)
    }

    /// Copy of the series with coordinates rounded to `decimals` places.
    pub fn rounded(&self, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        let round = |v: f64| (v * scale).round() / scale;

        let frames = self
            .frames
            .iter()
            .map(|frame| {
                let mut frame = frame.clone();
                if frame.detected {
                    for lm in frame.landmarks.values_mut() {
                        lm.x = round(lm.x);
                        lm.y = round(lm.y);
                        lm.z = round(lm.z);
                    }
                }
                frame
            })
            .collect();

        Self {
            summary: self.summary.clone(),
            frames,
        }
    }
}

// ============================================================================
// VIEWS, PHASES, ANGLES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum View {
    #[serde(rename = "dtl")]
    DownTheLine,
    #[serde(rename = "fo")]
    FaceOn,
}

impl View {
    pub const ALL: [View; 2] = [View::DownTheLine, View::FaceOn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DownTheLine => "dtl",
            Self::FaceOn => "fo",
        }
    }
}

impl FromStr for View {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dtl" => Ok(Self::DownTheLine),
            "fo" | "face_on" => Ok(Self::FaceOn),
            other => Err(AnalysisError::UnknownView(other.to_string())),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Swing phases in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Address,
    Top,
    Impact,
    FollowThrough,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Address, Phase::Top, Phase::Impact, Phase::FollowThrough];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Top => "top",
            Self::Impact => "impact",
            Self::FollowThrough => "follow_through",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Address => "Address",
            Self::Top => "Top of Backswing",
            Self::Impact => "Impact",
            Self::FollowThrough => "Follow-Through",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Address => "Setup position, club grounded behind ball",
            Self::Top => "Top of backswing, hands at highest point",
            Self::Impact => "Club at ball, hands returning to address height",
            Self::FollowThrough => "Full extension post-impact, holding the finish",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named angle produced by the angle calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleName {
    SpineAngleDtl,
    LeadArmTorso,
    TrailArmTorso,
    RightElbow,
    LeftElbow,
    RightKneeFlex,
    LeftKneeFlex,
    RightWristCock,
    ShoulderLineAngle,
    HipLineAngle,
    XFactor,
    SpineTiltFo,
}

impl AngleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpineAngleDtl => "spine_angle_dtl",
            Self::LeadArmTorso => "lead_arm_torso",
            Self::TrailArmTorso => "trail_arm_torso",
            Self::RightElbow => "right_elbow",
            Self::LeftElbow => "left_elbow",
            Self::RightKneeFlex => "right_knee_flex",
            Self::LeftKneeFlex => "left_knee_flex",
            Self::RightWristCock => "right_wrist_cock",
            Self::ShoulderLineAngle => "shoulder_line_angle",
            Self::HipLineAngle => "hip_line_angle",
            Self::XFactor => "x_factor",
            Self::SpineTiltFo => "spine_tilt_fo",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SpineAngleDtl => "Spine Angle",
            Self::LeadArmTorso => "Lead Arm-Torso Angle",
            Self::TrailArmTorso => "Trail Arm-Torso Angle",
            Self::RightElbow => "Right Elbow Angle",
            Self::LeftElbow => "Left Elbow Angle",
            Self::RightKneeFlex => "Right Knee Flex",
            Self::LeftKneeFlex => "Left Knee Flex",
            Self::RightWristCock => "Wrist Cock",
            Self::ShoulderLineAngle => "Shoulder Line Tilt",
            Self::HipLineAngle => "Hip Line Tilt",
            Self::XFactor => "Shoulder-Hip Tilt Gap",
            Self::SpineTiltFo => "Spine Tilt",
        }
    }

    /// Angles derived from `atan2` that wrap at ±180°.
    pub fn wraps_around(&self) -> bool {
        matches!(self, Self::ShoulderLineAngle | Self::HipLineAngle)
    }
}

impl fmt::Display for AngleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PHASE DETECTION OUTPUT
// ============================================================================

/// Which strategy located a phase frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    // top
    VelocityPeak,
    ProminentMinimum,
    EarliestProminentMinimum,
    GlobalMinimum,
    // address
    LastLowStillRun,
    LowestStillRun,
    FirstFrame,
    // impact
    VelocitySettle,
    PeakDeceleration,
    AddressCrossing,
    ClosestApproach,
    // follow-through
    FinishHold,
    FirstLocalMinimum,
    WindowMinimum,
    // applied by the caller after detection
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseFrame {
    #[serde(rename = "frame")]
    pub frame_index: usize,
    pub description: String,
    /// `None` marks a phase that could not be found; its frame is the sentinel 0
    pub method: Option<DetectionMethod>,
}

impl PhaseFrame {
    pub fn found(phase: Phase, frame_index: usize, method: DetectionMethod) -> Self {
        Self {
            frame_index,
            description: phase.description().to_string(),
            method: Some(method),
        }
    }

    pub fn missing(phase: Phase) -> Self {
        Self {
            frame_index: 0,
            description: phase.description().to_string(),
            method: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.method.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSet {
    pub address: PhaseFrame,
    pub top: PhaseFrame,
    pub impact: PhaseFrame,
    pub follow_through: PhaseFrame,
    pub tracked_joint: Joint,
    pub address_level: f64,
    pub top_level: f64,
}

impl PhaseSet {
    pub fn get(&self, phase: Phase) -> &PhaseFrame {
        match phase {
            Phase::Address => &self.address,
            Phase::Top => &self.top,
            Phase::Impact => &self.impact,
            Phase::FollowThrough => &self.follow_through,
        }
    }

    pub fn get_mut(&mut self, phase: Phase) -> &mut PhaseFrame {
        match phase {
            Phase::Address => &mut self.address,
            Phase::Top => &mut self.top,
            Phase::Impact => &mut self.impact,
            Phase::FollowThrough => &mut self.follow_through,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Phase, &PhaseFrame)> {
        Phase::ALL.into_iter().map(move |p| (p, self.get(p)))
    }

    pub fn missing_phases(&self) -> Vec<Phase> {
        self.iter()
            .filter(|(_, frame)| !frame.is_found())
            .map(|(phase, _)| phase)
            .collect()
    }

    pub fn frame_indices(&self) -> BTreeMap<Phase, usize> {
        self.iter().map(|(p, f)| (p, f.frame_index)).collect()
    }

    /// Backswing and downswing durations. `None` until impact is known.
    pub fn tempo(&self, sample_rate: f64) -> Option<SwingTempo> {
        if !self.impact.is_found() || sample_rate <= 0.0 {
            return None;
        }
        let backswing = self.top.frame_index.saturating_sub(self.address.frame_index);
        let downswing = self.impact.frame_index.saturating_sub(self.top.frame_index);

        Some(SwingTempo {
            backswing_sec: backswing as f64 / sample_rate,
            downswing_sec: downswing as f64 / sample_rate,
            ratio: backswing as f64 / downswing.max(1) as f64,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingTempo {
    pub backswing_sec: f64,
    pub downswing_sec: f64,
    /// Backswing : downswing
    pub ratio: f64,
}

// ============================================================================
// ANGLES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnglePhaseResult {
    pub frame: usize,
    pub timestamp_sec: f64,
    #[serde(default)]
    pub description: String,
    pub angles: BTreeMap<AngleName, f64>,
}

pub type ViewAngles = BTreeMap<Phase, AnglePhaseResult>;
pub type SwingAngles = BTreeMap<View, ViewAngles>;

/// view → phase → angle → signed delta in degrees
pub type DeltaTable = BTreeMap<View, BTreeMap<Phase, BTreeMap<AngleName, f64>>>;
