use crate::types::{
    ComparisonConfig, Config, IoConfig, Joint, LoggingConfig, PhaseConfig, ReferenceConfig,
    SignalConfig,
};
use anyhow::{Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path))?;
        Ok(config)
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            primary_hand: Joint::RightWrist,
            fallback_hand: Joint::LeftWrist,
            min_visibility: 0.4,
            smoothing_window: 5,
            velocity_window: 10,
            round_decimals: 4,
        }
    }
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            still_threshold: 0.001,
            min_still_duration: 5,
            top_prominence: 0.05,
            top_search_back_sec: 3.0,
            top_refine_frames: 2,
            candidate_peak_ratio: 0.4,
            downswing_noise_floor: 0.003,
            v_return_window_sec: 1.5,
            v_return_fraction: 0.6,
            address_lookback_sec: 5.0,
            address_still_factor: 3.0,
            address_min_still_frames: 3,
            impact_search_window_sec: 1.0,
            impact_settle_ratio: 0.15,
            impact_crossing_ratio: 0.85,
            impact_refine_frames: 5,
            follow_through_delay_sec: 0.3,
            follow_through_window_sec: 3.0,
            follow_through_min_still_frames: 3,
            flat_signal_tolerance: 1e-4,
        }
    }
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            min_delta_degrees: 5.0,
            max_score_delta: 45.0,
            top_n: 3,
            max_per_view_multi: 2,
        }
    }
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            dir: "reference_data".to_string(),
            swing_types: vec!["iron".to_string()],
        }
    }
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            input_dir: "landmarks".to_string(),
            output_dir: "reports".to_string(),
            default_swing_type: "iron".to_string(),
            max_parallel: 4,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "swing_coach=info".to_string(),
        }
    }
}
