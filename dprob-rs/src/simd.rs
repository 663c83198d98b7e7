//! Slice kernels with runtime CPU feature dispatch
//!
//! `multiversion` compiles each loop for the `simd` target preset and
//! picks the best version at runtime; the bodies are plain loops left to
//! the auto-vectorizer.

use crate::utils::drift_pdf;
use multiversion::multiversion;

/// out[i] = drift_pdf(xs[i])
#[multiversion(targets = "simd")]
pub fn drift_pdf_slice(xs: &[f64], half_width: f64, inv_sd: f64, c: f64, out: &mut [f64]) {
    debug_assert_eq!(xs.len(), out.len());
    for (x, o) in xs.iter().zip(out.iter_mut()) {
        *o = drift_pdf(*x, half_width, inv_sd, c);
    }
}

/// Sum all elements
#[multiversion(targets = "simd")]
pub fn sum_slice(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Scale all elements in place: values[i] *= scale
#[multiversion(targets = "simd")]
pub fn scale_slice(values: &mut [f64], scale: f64) {
    for v in values.iter_mut() {
        *v *= scale;
    }
}
