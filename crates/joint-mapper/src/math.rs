//! Rescaling and three-point angle helpers

use pose_capture::Landmark;
use std::f64::consts::PI;

/// Clamp `value` into `[in_min, in_max]` and rescale linearly onto
/// `[out_min, out_max]` (the output range may be descending).
pub fn map_range(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    let clamped = in_min.max(value.min(in_max));
    (clamped - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Unsigned planar angle at `b` formed by `a-b-c`, in `[0, π]`
pub fn three_point_angle(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
    let rad = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let angle = rad.abs();
    if angle > PI {
        2.0 * PI - angle
    } else {
        angle
    }
}

/// Like [`three_point_angle`], but 0 when any point is missing
pub fn optional_angle(a: Option<&Landmark>, b: Option<&Landmark>, c: Option<&Landmark>) -> f64 {
    match (a, b, c) {
        (Some(a), Some(b), Some(c)) => three_point_angle(a, b, c),
        _ => 0.0,
    }
}
