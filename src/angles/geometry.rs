// src/angles/geometry.rs
//
// 2-D angle primitives on normalized image coordinates (y grows downward).

pub type Point = (f64, f64);

const NORM_EPSILON: f64 = 1e-8;

/// Up on screen.
const VERTICAL: Point = (0.0, -1.0);

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn sub(a: Point, b: Point) -> Point {
    (a.0 - b.0, a.1 - b.1)
}

pub fn midpoint(a: Point, b: Point) -> Point {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

/// Unsigned angle between two vectors in degrees.
///
/// A zero-length vector gives a cosine of 0 (90°) rather than a NaN.
pub fn angle_between(v1: Point, v2: Point) -> f64 {
    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let norms = v1.0.hypot(v1.1) * v2.0.hypot(v2.1);
    let cos = (dot / (norms + NORM_EPSILON)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Angle at vertex `b` between rays to `a` and `c`, rounded to 0.1°.
pub fn angle_at_joint(a: Point, b: Point, c: Point) -> f64 {
    round1(angle_between(sub(a, b), sub(c, b)))
}

/// Spine (hip midpoint → shoulder midpoint) from vertical. Negative when the
/// shoulders sit left of the hips on screen.
pub fn signed_spine_tilt(shoulder_mid: Point, hip_mid: Point) -> f64 {
    let spine = sub(shoulder_mid, hip_mid);
    let angle = angle_between(spine, VERTICAL);
    let sign = if spine.0 < 0.0 { -1.0 } else { 1.0 };
    round1(sign * angle)
}

/// Unsigned forward bend of the spine from vertical.
pub fn forward_bend(shoulder_mid: Point, hip_mid: Point) -> f64 {
    round1(angle_between(sub(shoulder_mid, hip_mid), VERTICAL))
}

/// Direction of `q - p` in degrees, in (-180, 180].
pub fn line_angle(p: Point, q: Point) -> f64 {
    let v = sub(q, p);
    round1(v.1.atan2(v.0).to_degrees())
}

/// Shoulder line minus hip line, uncorrected for wraparound.
pub fn x_factor(shoulder_line: f64, hip_line: f64) -> f64 {
    round1(shoulder_line - hip_line)
}
