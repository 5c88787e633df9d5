//! DDA edge walker
//!
//! Samples the segment between two attribute vectors at every integer
//! coordinate of one axis. The high endpoint is never emitted; it is the
//! first sample of whichever edge continues from it.

use super::math::Sample;
use super::types::Axis;

/// Walk from `a` to `b` along `axis`, one sample per integer step.
///
/// Samples land on `ceil(lo)`, `ceil(lo) + 1`, ... strictly below `hi`, with
/// every other lane linearly interpolated. Endpoints with equal `axis`
/// coordinates yield nothing.
pub fn walk(a: Sample, b: Sample, axis: Axis) -> Vec<Sample> {
    walk_within(a, b, axis, f64::NEG_INFINITY, f64::INFINITY)
}

/// Like [`walk`], but only emits samples with `min <= axis < max`.
///
/// `min` must be an integer. Samples inside the window are the same ones
/// `walk` produces there. A non-finite endpoint yields nothing.
pub fn walk_within(a: Sample, b: Sample, axis: Axis, min: f64, max: f64) -> Vec<Sample> {
    let (a, b) = match a.axis(axis).partial_cmp(&b.axis(axis)) {
        Some(std::cmp::Ordering::Less) => (a, b),
        Some(std::cmp::Ordering::Greater) => (b, a),
        // Flat along this axis (or NaN)
        _ => return Vec::new(),
    };

    let lo = a.axis(axis);
    let hi = b.axis(axis);
    if !lo.is_finite() || !hi.is_finite() {
        return Vec::new();
    }
    let step = (b - a) / (hi - lo);
    let start = lo.ceil().max(min);
    let end = hi.min(max);

    let mut points = Vec::new();
    let mut p = a + step * (start - lo);
    p.set_axis(axis, start);
    while p.axis(axis) < end {
        points.push(p);
        p += step;
    }
    points
}
