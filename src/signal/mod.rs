// src/signal/mod.rs

pub mod preprocess;

pub use preprocess::{
    directional_velocity, interpolate_gaps, moving_average, rolling_speed, select_tracked_joint,
    HandSignal, JointChoice,
};
