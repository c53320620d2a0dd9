//! Range clamping for coordinates written to any target format.

/// Clamps `value` into `[min, max]`, optionally rounding the result to the
/// nearest integer.
///
/// A bound of `None` means "unbounded on that side". A bound of
/// `Some(0.0)` is a real bound and is always honored.
///
/// Rounding uses `f64::round` (half away from zero). The result is never
/// `-0.0`, so it always prints without a sign.
///
/// # Example
/// ```
/// use annoconv::ir::clamp;
///
/// assert_eq!(clamp(-5.0, Some(0.0), Some(100.0), true), 0.0);
/// assert_eq!(clamp(150.0, Some(0.0), Some(100.0), true), 100.0);
/// assert_eq!(clamp(42.6, Some(0.0), Some(100.0), true), 43.0);
/// ```
pub fn clamp(value: f64, min: Option<f64>, max: Option<f64>, round: bool) -> f64 {
    let clamped = match (min, max) {
        (Some(min), _) if value < min => min,
        (_, Some(max)) if value > max => max,
        _ => value,
    };

    let result = if round { clamped.round() } else { clamped };
    // -0.0 compares equal to a 0.0 bound; adding 0.0 turns it positive.
    result + 0.0
}

/// Clamps into `[0, max]`; the common case for image-relative values.
#[inline]
pub fn clamp_unit_range(value: f64, max: f64, round: bool) -> f64 {
    clamp(value, Some(0.0), Some(max), round)
}
