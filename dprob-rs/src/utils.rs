use crate::consts::INV_SQRT_TWO_PI;

/// Gaussian density with mean 0, given the reciprocal standard deviation
#[inline]
pub fn gpdf(x: f64, inv_sd: f64) -> f64 {
    let scaled = x * inv_sd;
    INV_SQRT_TWO_PI * inv_sd * libm::exp(-0.5 * scaled * scaled)
}

/// Truncated drift density: `c * gpdf(x)` inside the pass zone, 0 outside
#[inline]
pub fn drift_pdf(x: f64, half_width: f64, inv_sd: f64, c: f64) -> f64 {
    if x.abs() < half_width {
        c * gpdf(x, inv_sd)
    } else {
        0.0
    }
}

/// Nearest integer, ties toward +inf
#[inline]
pub fn round_drift(d: f64) -> i32 {
    (d + 0.5).floor() as i32
}
