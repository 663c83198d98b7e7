use crate::{
    density::DriftDensity,
    error::{DriftError, Result},
    simd::{scale_slice, sum_slice},
    types::DriftParams,
};
use quadpack_rs::{Integrator, QuadConfig};
use tracing::{debug, info};

/// Raw bin masses indexed by segment offset `db - da`.
///
/// The drift kernel only depends on the offset between source and
/// destination, so the `4 * max_d + 1` distinct bins are integrated once.
#[derive(Debug, Clone)]
pub struct DriftKernel {
    max_offset: i32,
    masses: Vec<f64>,
}

impl DriftKernel {
    pub fn integrate(
        params: &DriftParams,
        density: &DriftDensity,
        integrator: &Integrator,
    ) -> Result<Self> {
        let max_offset = 2 * params.max_d();
        let masses = (-max_offset..=max_offset)
            .map(|offset| bin_mass(params, density, integrator, offset))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { max_offset, masses })
    }

    #[inline]
    pub fn max_offset(&self) -> i32 {
        self.max_offset
    }

    /// Raw mass of the bin `offset` segments away. Panics if
    /// `|offset| > max_offset`.
    #[inline]
    pub fn mass(&self, offset: i32) -> f64 {
        assert!(
            offset.unsigned_abs() <= self.max_offset.unsigned_abs(),
            "offset {} out of range (max {})",
            offset,
            self.max_offset
        );
        self.masses[(offset + self.max_offset) as usize]
    }
}

/// Mass of `density` over the bin centred `offset` segments away
pub fn bin_mass(
    params: &DriftParams,
    density: &DriftDensity,
    integrator: &Integrator,
    offset: i32,
) -> Result<f64> {
    let (left, right) = params.bin_bounds(offset);
    let what = || format!("bin offset {offset} [{left}, {right}]");
    let est = density.integrate(integrator, left, right, &what())?;

    if !est.value.is_finite() {
        return Err(DriftError::Quadrature {
            what: what(),
            pass_ratio: params.pass_ratio(),
            drift_stddev: params.drift_stddev(),
            source: quadpack_rs::QuadError::NonFinite { a: left, b: right },
        });
    }
    Ok(est.value)
}

/// Un-normalized transition mass from segment `da` to segment `db`
pub fn raw_mass(
    params: &DriftParams,
    density: &DriftDensity,
    integrator: &Integrator,
    da: i32,
    db: i32,
) -> Result<f64> {
    bin_mass(params, density, integrator, db - da)
}

/// Row-stochastic drift transition matrix.
///
/// Row `da + max_d` holds the distribution of the next segment offset
/// given the current offset `da`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    max_d: i32,
    size: usize,
    data: Vec<f64>,
}

impl TransitionMatrix {
    /// Normalize the density, integrate every bin and fill the matrix
    pub fn build(params: &DriftParams, config: &QuadConfig) -> Result<Self> {
        let integrator = Integrator::new(*config);
        let density = DriftDensity::from_params(params).normalized(&integrator)?;
        Self::from_density(params, &density, &integrator)
    }

    pub fn from_density(
        params: &DriftParams,
        density: &DriftDensity,
        integrator: &Integrator,
    ) -> Result<Self> {
        let kernel = DriftKernel::integrate(params, density, integrator)?;
        Self::from_kernel(params, &kernel)
    }

    pub fn from_kernel(params: &DriftParams, kernel: &DriftKernel) -> Result<Self> {
        let max_d = params.max_d();
        let size = params.size();
        info!(size, max_d, "filling transition matrix");

        let mut data = vec![0.0; size * size];
        for (row, da) in data.chunks_exact_mut(size).zip(-max_d..=max_d) {
            for (p, db) in row.iter_mut().zip(-max_d..=max_d) {
                *p = kernel.mass(db - da);
            }
            normalize_row(params, da, row)?;
        }

        Ok(Self { max_d, size, data })
    }

    #[inline]
    pub fn max_d(&self) -> i32 {
        self.max_d
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Probability of moving from offset `da` to offset `db`
    pub fn get(&self, da: i32, db: i32) -> Option<f64> {
        let max_d = self.max_d.unsigned_abs();
        if da.unsigned_abs() > max_d || db.unsigned_abs() > max_d {
            return None;
        }
        let i = (da + self.max_d) as usize;
        let j = (db + self.max_d) as usize;
        Some(self.data[i * self.size + j])
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.size..(i + 1) * self.size]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.size)
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

fn normalize_row(params: &DriftParams, da: i32, row: &mut [f64]) -> Result<()> {
    let sum = sum_slice(row);
    if !(sum.is_finite() && sum > 0.0) {
        return Err(DriftError::RowSum {
            da,
            sum,
            pass_ratio: params.pass_ratio(),
            drift_stddev: params.drift_stddev(),
        });
    }
    scale_slice(row, 1.0 / sum);
    debug!(da, sum, "normalized row");

    #[cfg(feature = "debug")]
    {
        use crate::consts::ROW_SUM_TOLERANCE;
        let check = sum_slice(row);
        assert!(
            (check - 1.0).abs() < ROW_SUM_TOLERANCE,
            "row {} sums to {}",
            da,
            check
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::ROW_SUM_TOLERANCE;

    fn build(r: f64, v: f64, d: u32, s: u32) -> TransitionMatrix {
        let params = DriftParams::new(r, v, d, s).unwrap();
        TransitionMatrix::build(&params, &QuadConfig::default()).unwrap()
    }

    #[test]
    fn test_shape() {
        let m = build(0.1, 2.0, 3, 4);
        assert_eq!(m.size(), 25);
        assert_eq!(m.rows().count(), 25);
        assert!(m.rows().all(|r| r.len() == 25));
    }

    #[test]
    fn test_rows_sum_to_one() {
        let m = build(0.2, 0.7, 2, 3);
        for (i, row) in m.rows().enumerate() {
            let s: f64 = row.iter().sum();
            assert!((s - 1.0).abs() < ROW_SUM_TOLERANCE, "row {i} sums to {s}");
        }
    }

    #[test]
    fn test_small_scenario_peaks_at_centre() {
        let m = build(0.5, 1.0, 1, 1);
        assert_eq!(m.size(), 3);
        let centre = m.row(1);
        assert!(centre[1] > centre[0] && centre[1] > centre[2]);
        // the pass zone (-0.5, 0.5) lies entirely inside the centre bin
        assert!((centre[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_reference_table() {
        // r=0, v=1, d=2, s=2 as consumed by the likelihood calculator
        let m = build(0.0, 1.0, 2, 2);
        let expected = [
            0.0,
            0.0,
            9.9565174546e-02,
            2.5585031548e-01,
            2.8916901994e-01,
            2.5585031548e-01,
            9.9565174546e-02,
            0.0,
            0.0,
        ];
        for (db, e) in (-4..=4).zip(expected) {
            let p = m.get(0, db).unwrap();
            assert!((p - e).abs() < 1e-8, "P(0 -> {db}) = {p}, expected {e}");
        }

        // edge rows are renormalized after losing mass past the border
        let p = m.get(-4, -4).unwrap();
        let raw_total = 9.9565174546e-02 + 2.5585031548e-01 + 2.8916901994e-01;
        assert!((p - 2.8916901994e-01 / raw_total).abs() < 1e-8);
        assert_eq!(m.get(-4, 0), Some(0.0));
    }

    #[test]
    fn test_kernel_symmetry() {
        let params = DriftParams::new(0.15, 0.9, 2, 3).unwrap();
        let integrator = Integrator::default();
        let density = DriftDensity::from_params(&params)
            .normalized(&integrator)
            .unwrap();
        for (da, db) in [(0, 1), (-2, 3), (4, -5), (6, 6), (-6, 6)] {
            let fwd = raw_mass(&params, &density, &integrator, da, db).unwrap();
            let rev = raw_mass(&params, &density, &integrator, -da, -db).unwrap();
            assert!((fwd - rev).abs() < 1e-10, "({da},{db}): {fwd} vs {rev}");
        }
    }

    #[test]
    fn test_kernel_matches_direct_mass() {
        let params = DriftParams::new(0.3, 0.5, 1, 2).unwrap();
        let integrator = Integrator::default();
        let density = DriftDensity::from_params(&params)
            .normalized(&integrator)
            .unwrap();
        let kernel = DriftKernel::integrate(&params, &density, &integrator).unwrap();
        assert_eq!(kernel.max_offset(), 4);
        for da in -2..=2 {
            for db in -2..=2 {
                let direct = raw_mass(&params, &density, &integrator, da, db).unwrap();
                assert_eq!(kernel.mass(db - da), direct);
            }
        }
    }

    #[test]
    fn test_get_out_of_range() {
        let m = build(0.5, 1.0, 1, 1);
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.get(0, -2), None);
    }

    #[test]
    fn test_degenerate_pass_ratio() {
        let params = DriftParams::new(1.0, 1.0, 1, 2).unwrap();
        let err = TransitionMatrix::build(&params, &QuadConfig::default()).unwrap_err();
        assert!(matches!(err, DriftError::Normalization { .. }));
    }

    #[test]
    fn test_zero_row_rejected() {
        let params = DriftParams::new(0.5, 1.0, 1, 1).unwrap();
        let kernel = DriftKernel {
            max_offset: 2,
            masses: vec![0.0; 5],
        };
        let err = TransitionMatrix::from_kernel(&params, &kernel).unwrap_err();
        assert!(matches!(err, DriftError::RowSum { da: -1, .. }));
    }

    #[test]
    fn test_single_state() {
        let m = build(0.3, 1.0, 0, 5);
        assert_eq!(m.size(), 1);
        assert!((m.get(0, 0).unwrap() - 1.0).abs() < 1e-12);
    }
}
