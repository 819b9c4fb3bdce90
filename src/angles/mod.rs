// src/angles/mod.rs

pub mod calculator;
pub mod geometry;

pub use calculator::{angles_for_frame, calculate_angles};
