use mycoforge_schemas::curve::ResponseCurve;

/// Piecewise-linear lookup of `x` on `curve`, clamped to the end points.
///
/// Returns `None` for an empty curve. A NaN reading brackets no segment and
/// yields NaN.
pub fn interpolate(curve: &ResponseCurve, x: f64) -> Option<f64> {
    let points = curve.points();
    let first = points.first()?;
    let last = points.last()?;

    if x <= first.x {
        return Some(first.y);
    }
    if x >= last.x {
        return Some(last.y);
    }

    for segment in points.windows(2) {
        let (p0, p1) = (segment[0], segment[1]);
        if p0.x <= x && x < p1.x {
            if p1.x == p0.x {
                return Some(p0.y);
            }
            return Some(p0.y + (x - p0.x) / (p1.x - p0.x) * (p1.y - p0.y));
        }
    }

    Some(f64::NAN)
}
