use crate::{
    error::{DriftError, Result},
    simd::drift_pdf_slice,
    types::DriftParams,
    utils::drift_pdf,
};
use quadpack_rs::{Estimate, Integrand, Integrator};
use tracing::info;

/// Gaussian drift density truncated to the pass zone `|x| < 1 - pass_ratio`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftDensity {
    pass_ratio: f64,
    drift_stddev: f64,
    half_width: f64,
    inv_sd: f64,
    c: f64,
}

impl DriftDensity {
    pub fn new(pass_ratio: f64, drift_stddev: f64) -> Self {
        Self {
            pass_ratio,
            drift_stddev,
            half_width: 1.0 - pass_ratio,
            inv_sd: 1.0 / drift_stddev,
            c: 1.0,
        }
    }

    pub fn from_params(params: &DriftParams) -> Self {
        Self::new(params.pass_ratio(), params.drift_stddev())
    }

    pub fn with_constant(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    #[inline]
    pub fn constant(&self) -> f64 {
        self.c
    }

    /// Half-width of the pass zone
    #[inline]
    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        drift_pdf(x, self.half_width, self.inv_sd, self.c)
    }

    pub fn eval_slice(&self, xs: &[f64], out: &mut [f64]) {
        drift_pdf_slice(xs, self.half_width, self.inv_sd, self.c, out);
    }

    /// Integral of this density over `[a, b]`; either bound may be infinite.
    pub fn integrate(&self, integrator: &Integrator, a: f64, b: f64, what: &str) -> Result<Estimate> {
        integrator
            .integrate(self, a, b)
            .map_err(|source| DriftError::Quadrature {
                what: what.to_string(),
                pass_ratio: self.pass_ratio,
                drift_stddev: self.drift_stddev,
                source,
            })
    }

    /// Integral over the whole real line
    pub fn total_mass(&self, integrator: &Integrator) -> Result<Estimate> {
        self.integrate(
            integrator,
            f64::NEG_INFINITY,
            f64::INFINITY,
            "normalization integral",
        )
    }

    /// Copy of this density scaled to integrate to 1 over the real line
    pub fn normalized(&self, integrator: &Integrator) -> Result<Self> {
        let raw = self.with_constant(1.0);
        let est = raw.total_mass(integrator)?;

        if !(est.value.is_finite() && est.value > 0.0) {
            return Err(DriftError::Normalization {
                pass_ratio: self.pass_ratio,
                drift_stddev: self.drift_stddev,
                integral: est.value,
            });
        }

        let c = 1.0 / est.value;
        if !c.is_finite() {
            return Err(DriftError::Normalization {
                pass_ratio: self.pass_ratio,
                drift_stddev: self.drift_stddev,
                integral: est.value,
            });
        }

        info!(
            integral = est.value,
            abs_err = est.abs_err,
            intervals = est.intervals,
            c,
            "normalized drift density"
        );
        Ok(raw.with_constant(c))
    }
}

impl Integrand for DriftDensity {
    #[inline]
    fn eval(&self, x: f64) -> f64 {
        DriftDensity::eval(self, x)
    }

    fn eval_batch(&self, xs: &[f64], out: &mut [f64]) {
        self.eval_slice(xs, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // c * (Phi(b) - Phi(a)) with both bounds clipped to the pass zone
    fn exact_mass(d: &DriftDensity, sd: f64, a: f64, b: f64) -> f64 {
        let hw = d.half_width();
        let (a, b) = (a.max(-hw), b.min(hw));
        if a >= b {
            return 0.0;
        }
        let phi = |x: f64| 0.5 * (1.0 + libm::erf(x / (sd * std::f64::consts::SQRT_2)));
        d.constant() * (phi(b) - phi(a))
    }

    #[test]
    fn test_truncation_is_exact_zero() {
        let d = DriftDensity::new(0.3, 1.0);
        for x in [0.7, -0.7, 0.71, -5.0, 100.0, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(d.eval(x), 0.0, "pdf({x}) should be 0");
        }
        assert!(d.eval(0.69) > 0.0);
    }

    #[test]
    fn test_symmetric() {
        let d = DriftDensity::new(0.2, 0.6).with_constant(1.7);
        for i in 0..100 {
            let x = i as f64 * 0.01;
            assert_eq!(d.eval(x), d.eval(-x));
        }
    }

    #[test]
    fn test_degenerate_pass_ratio_is_zero() {
        for r in [1.0, 1.5] {
            let d = DriftDensity::new(r, 1.0);
            assert_eq!(d.eval(0.0), 0.0);
            assert_eq!(d.eval(-1e-12), 0.0);
        }
    }

    #[test]
    fn test_normalized_integrates_to_one() {
        let integrator = Integrator::default();
        for (r, sd) in [(0.0, 1.0), (0.5, 1.0), (0.1, 2.0), (0.9, 0.05), (-0.5, 0.8)] {
            let d = DriftDensity::new(r, sd).normalized(&integrator).unwrap();
            let total = d.total_mass(&integrator).unwrap();
            assert!(
                (total.value - 1.0).abs() < 1e-7,
                "r={r} sd={sd}: total {}",
                total.value
            );
        }
    }

    #[test]
    fn test_constant_matches_closed_form() {
        let integrator = Integrator::default();
        let d = DriftDensity::new(0.0, 1.0).normalized(&integrator).unwrap();
        // 1 / (2 Phi(1) - 1)
        let expected = 1.0 / libm::erf(1.0 / std::f64::consts::SQRT_2);
        assert!((d.constant() - expected).abs() < 1e-7);
    }

    #[test]
    fn test_bin_mass_matches_erf() {
        let integrator = Integrator::default();
        let sd = 1.3;
        let d = DriftDensity::new(0.25, sd).normalized(&integrator).unwrap();
        for (a, b) in [(-0.1, 0.1), (0.5, 0.9), (-1.0, -0.6), (0.7, 1.2), (2.0, 3.0)] {
            let q = d.integrate(&integrator, a, b, "bin").unwrap().value;
            let e = exact_mass(&d, sd, a, b);
            assert!((q - e).abs() < 5e-8, "[{a}, {b}]: {q} vs {e}");
        }
    }

    #[test]
    fn test_pass_ratio_one_fails_normalization() {
        let err = DriftDensity::new(1.0, 1.0)
            .normalized(&Integrator::default())
            .unwrap_err();
        assert!(matches!(err, DriftError::Normalization { integral, .. } if integral == 0.0));
    }

    #[test]
    fn test_zero_stddev_fails() {
        let err = DriftDensity::new(0.5, 0.0)
            .normalized(&Integrator::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DriftError::Normalization { .. } | DriftError::Quadrature { .. }
        ));
    }

    #[test]
    fn test_negative_stddev_fails() {
        let err = DriftDensity::new(0.5, -1.0)
            .normalized(&Integrator::default())
            .unwrap_err();
        assert!(matches!(err, DriftError::Normalization { .. }));
    }
}
