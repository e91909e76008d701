use maptopo::AttrValue;

/// Lower end of the normalized value range.
pub(crate) const MIN_WEIGHT: f64 = 1.0;

/// Upper end of the normalized value range.
pub(crate) const MAX_WEIGHT: f64 = 200.0;

/// Rescale raw values linearly from their observed `[min, max]` into
/// `[MIN_WEIGHT, MAX_WEIGHT]`, so every region keeps a positive target area.
///
/// Every finite value, zero included, contributes to the observed range.
/// Zero, NA and non-finite values then take `MIN_WEIGHT`.  A degenerate range
/// maps every other value to the midpoint.
pub(crate) fn normalize(values: &[AttrValue]) -> Vec<f64> {
    let finite = |v: &AttrValue| v.as_number().filter(|x| x.is_finite());

    let range = values.iter().filter_map(finite).fold(None, |acc: Option<(f64, f64)>, x| match acc {
        None => Some((x, x)),
        Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
    });

    values.iter()
        .map(|v| match (finite(v).filter(|&x| x != 0.0), range) {
            (Some(x), Some((lo, hi))) if hi > lo => {
                MIN_WEIGHT + (x - lo) / (hi - lo) * (MAX_WEIGHT - MIN_WEIGHT)
            }
            (Some(_), Some(_)) => (MIN_WEIGHT + MAX_WEIGHT) / 2.0,
            _ => MIN_WEIGHT,
        })
        .collect()
}
