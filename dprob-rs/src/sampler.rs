use crate::{
    error::{DriftError, Result},
    types::DriftParams,
    utils::round_drift,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Draws drift trajectories from the truncated, bounded drift model the
/// transition table discretizes.
pub struct DriftSampler {
    params: DriftParams,
    rng: StdRng,
    spare: Option<f64>,
}

impl DriftSampler {
    pub fn new(params: DriftParams) -> Result<Self> {
        if !params.pass_ratio().is_finite() {
            return Err(DriftError::InvalidParameter {
                name: "pass_ratio",
                reason: format!("{} is not finite", params.pass_ratio()),
            });
        }
        let sd = params.drift_stddev();
        if !(sd.is_finite() && sd >= 0.0) {
            return Err(DriftError::InvalidParameter {
                name: "drift_stddev",
                reason: format!("{sd} is not a finite non-negative deviation"),
            });
        }

        Ok(Self {
            params,
            rng: StdRng::from_os_rng(),
            spare: None,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.spare = None;
        self
    }

    /// Uniform variate in [0, 1)
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Polar Box-Muller; the second variate of each pair is kept for the next call
    pub fn gaussian(&mut self, sd: f64) -> f64 {
        if let Some(y) = self.spare.take() {
            return y * sd;
        }
        loop {
            let x1 = 2.0 * self.uniform() - 1.0;
            let x2 = 2.0 * self.uniform() - 1.0;
            let w = x1 * x1 + x2 * x2;
            if w > 0.0 && w < 1.0 {
                let f = ((-2.0 * w.ln()) / w).sqrt();
                self.spare = Some(x2 * f);
                return x1 * f * sd;
            }
        }
    }

    /// Next drift value after `d`, which must lie within `[-max_drift, max_drift]`.
    pub fn next_drift(&mut self, d: f64) -> Result<f64> {
        let max_drift = self.params.max_drift();
        if !(d.abs() <= max_drift as f64) {
            return Err(DriftError::DriftOutOfRange { drift: d, max_drift });
        }
        Ok(self.step(d))
    }

    /// Trajectory of `len` drift values starting at 0
    pub fn drift_sequence(&mut self, len: usize) -> Vec<f64> {
        let mut d = Vec::with_capacity(len);
        if len == 0 {
            return d;
        }
        d.push(0.0);
        for i in 1..len {
            let next = self.step(d[i - 1]);
            d.push(next);
        }
        d
    }

    /// Segment offset nearest to the continuous drift `d`
    #[inline]
    pub fn segment_of(&self, d: f64) -> i32 {
        round_drift(d * self.params.segments() as f64)
    }

    fn step(&mut self, d: f64) -> f64 {
        let pass_ratio = self.params.pass_ratio();
        // no room to move: max_drift = 0 pins d at 0
        if pass_ratio >= 1.0 || self.params.max_drift() == 0 {
            return d;
        }
        let half_width = 1.0 - pass_ratio;
        let max_drift = self.params.max_drift() as f64;
        let sd = self.params.drift_stddev();

        loop {
            let r = self.gaussian(sd);
            let nd = d + r;
            if r.abs() < half_width && nd.abs() <= max_drift {
                return nd;
            }
        }
    }
}
