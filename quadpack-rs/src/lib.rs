//! # quadpack-rs: adaptive Gauss-Kronrod quadrature
//!
//! Globally adaptive integration in the style of the QUADPACK routines:
//! the interval with the largest error estimate is bisected until the
//! summed error meets `max(epsabs, epsrel * |result|)`.
//!
//! Finite intervals use the 21-point Kronrod rule. Infinite and
//! semi-infinite intervals are mapped onto `(0, 1]` with `x = (1 - t) / t`
//! and integrated with the 15-point rule; a doubly infinite range is
//! folded as `f(x) + f(-x)`.
//!
//! ```
//! use quadpack_rs::{Func, Integrator};
//!
//! let est = Integrator::default()
//!     .integrate(&Func(|x: f64| (-x * x).exp()), f64::NEG_INFINITY, f64::INFINITY)
//!     .unwrap();
//! assert!((est.value - std::f64::consts::PI.sqrt()).abs() < 1e-7);
//! ```

pub mod constants;
mod kronrod;

use constants::*;
use kronrod::{GK15, GK21, Rule, RuleOutput};
use std::{cmp::Ordering, collections::BinaryHeap};
use thiserror::Error;

pub type QuadResult<T> = Result<T, QuadError>;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum QuadError {
    #[error("integration bounds [{a}, {b}] are not numbers")]
    InvalidInterval { a: f64, b: f64 },

    #[error("tolerances epsabs={epsabs:e} epsrel={epsrel:e} cannot be met")]
    InvalidTolerance { epsabs: f64, epsrel: f64 },

    #[error("integrand is not finite on [{a}, {b}]")]
    NonFinite { a: f64, b: f64 },

    #[error("subdivision limit {limit} reached (estimate {value:e}, error {abs_err:e})")]
    SubdivisionLimit { limit: usize, value: f64, abs_err: f64 },

    #[error("roundoff prevents subdividing near [{a}, {b}] (estimate {value:e})")]
    Roundoff { a: f64, b: f64, value: f64 },
}

/// A function the integrator can sample.
///
/// `eval_batch` receives every node of one rule application at once;
/// override it when the function has a vectorized form.
pub trait Integrand {
    fn eval(&self, x: f64) -> f64;

    fn eval_batch(&self, xs: &[f64], out: &mut [f64]) {
        debug_assert_eq!(xs.len(), out.len());
        for (x, o) in xs.iter().zip(out.iter_mut()) {
            *o = self.eval(*x);
        }
    }
}

impl<T: Integrand + ?Sized> Integrand for &T {
    #[inline]
    fn eval(&self, x: f64) -> f64 {
        (**self).eval(x)
    }

    #[inline]
    fn eval_batch(&self, xs: &[f64], out: &mut [f64]) {
        (**self).eval_batch(xs, out)
    }
}

/// Adapter for plain closures
pub struct Func<F>(pub F);

impl<F: Fn(f64) -> f64> Integrand for Func<F> {
    #[inline]
    fn eval(&self, x: f64) -> f64 {
        (self.0)(x)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadConfig {
    pub epsabs: f64,
    pub epsrel: f64,
    /// Maximum number of subintervals
    pub limit: usize,
}

impl Default for QuadConfig {
    fn default() -> Self {
        Self {
            epsabs: DEFAULT_EPSABS,
            epsrel: DEFAULT_EPSREL,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub value: f64,
    pub abs_err: f64,
    /// Number of subintervals in the final partition
    pub intervals: usize,
    /// Number of rule nodes evaluated
    pub evaluations: usize,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.error.total_cmp(&other.error) == Ordering::Equal
    }
}

impl Eq for Segment {}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.error.total_cmp(&other.error)
    }
}

/// Which end of the real line a mapped integrand covers
#[derive(Debug, Clone, Copy)]
enum Tail {
    /// [bound, +inf)
    Upper(f64),
    /// (-inf, bound]
    Lower(f64),
    /// (-inf, +inf)
    Both,
}

/// `f` seen through the substitution `x = (1 - t) / t` on (0, 1]
struct Mapped<'a, I: ?Sized> {
    f: &'a I,
    tail: Tail,
}

impl<I: Integrand + ?Sized> Integrand for Mapped<'_, I> {
    fn eval(&self, t: f64) -> f64 {
        let mut out = [0.0];
        self.eval_batch(&[t], &mut out);
        out[0]
    }

    fn eval_batch(&self, ts: &[f64], out: &mut [f64]) {
        debug_assert_eq!(ts.len(), out.len());
        let mut xs = [0.0f64; MAX_NODES];
        let mut fx = [0.0f64; MAX_NODES];

        for (tc, oc) in ts.chunks(MAX_NODES).zip(out.chunks_mut(MAX_NODES)) {
            let n = tc.len();
            for (x, &t) in xs[..n].iter_mut().zip(tc) {
                let u = (1.0 - t) / t;
                *x = match self.tail {
                    Tail::Upper(bound) => bound + u,
                    Tail::Lower(bound) => bound - u,
                    Tail::Both => u,
                };
            }
            self.f.eval_batch(&xs[..n], &mut fx[..n]);
            oc.copy_from_slice(&fx[..n]);

            if let Tail::Both = self.tail {
                for x in xs[..n].iter_mut() {
                    *x = -*x;
                }
                self.f.eval_batch(&xs[..n], &mut fx[..n]);
                for (o, v) in oc.iter_mut().zip(&fx[..n]) {
                    *o += v;
                }
            }

            for (o, &t) in oc.iter_mut().zip(tc) {
                *o /= t * t;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Integrator {
    config: QuadConfig,
}

impl Integrator {
    pub fn new(config: QuadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QuadConfig {
        &self.config
    }

    /// Integrate `f` over [a, b]. Either bound may be infinite.
    pub fn integrate<I: Integrand + ?Sized>(&self, f: &I, a: f64, b: f64) -> QuadResult<Estimate> {
        if a.is_nan() || b.is_nan() {
            return Err(QuadError::InvalidInterval { a, b });
        }
        let QuadConfig { epsabs, epsrel, .. } = self.config;
        if epsabs <= 0.0 && epsrel < MIN_EPSREL {
            return Err(QuadError::InvalidTolerance { epsabs, epsrel });
        }

        if a == b {
            return Ok(Estimate {
                value: 0.0,
                abs_err: 0.0,
                intervals: 0,
                evaluations: 0,
            });
        }
        if a > b {
            let est = self.integrate(f, b, a)?;
            return Ok(Estimate {
                value: -est.value,
                ..est
            });
        }

        match (a.is_finite(), b.is_finite()) {
            (true, true) => self.adaptive(&GK21, f, a, b),
            (true, false) => self.mapped(f, Tail::Upper(a)),
            (false, true) => self.mapped(f, Tail::Lower(b)),
            (false, false) => self.mapped(f, Tail::Both),
        }
    }

    fn mapped<I: Integrand + ?Sized>(&self, f: &I, tail: Tail) -> QuadResult<Estimate> {
        self.adaptive(&GK15, &Mapped { f, tail }, 0.0, 1.0)
    }

    fn apply<I: Integrand + ?Sized>(
        &self,
        rule: &Rule,
        f: &I,
        a: f64,
        b: f64,
    ) -> QuadResult<RuleOutput> {
        let out = rule.apply(f, a, b);
        if !out.value.is_finite() || !out.abs_err.is_finite() {
            return Err(QuadError::NonFinite { a, b });
        }
        Ok(out)
    }

    fn adaptive<I: Integrand + ?Sized>(
        &self,
        rule: &Rule,
        f: &I,
        a: f64,
        b: f64,
    ) -> QuadResult<Estimate> {
        let QuadConfig {
            epsabs,
            epsrel,
            limit,
        } = self.config;
        let nodes = rule.nodes();

        let first = self.apply(rule, f, a, b)?;
        let mut evaluations = nodes;
        let errbnd = epsabs.max(epsrel * first.value.abs());

        if first.abs_err == 0.0 || (first.abs_err <= errbnd && first.abs_err != first.resabs) {
            return Ok(Estimate {
                value: first.value,
                abs_err: first.abs_err,
                intervals: 1,
                evaluations,
            });
        }
        if first.abs_err <= 100.0 * EPMACH * first.resabs && first.abs_err > errbnd {
            return Err(QuadError::Roundoff {
                a,
                b,
                value: first.value,
            });
        }

        let mut heap = BinaryHeap::with_capacity(limit.max(1));
        heap.push(Segment {
            a,
            b,
            value: first.value,
            error: first.abs_err,
        });
        let mut area = first.value;
        let mut errsum = first.abs_err;

        while heap.len() < limit {
            let Some(worst) = heap.pop() else { break };
            let a1 = worst.a;
            let b2 = worst.b;
            let mid = 0.5 * (a1 + b2);

            if a1.abs().max(b2.abs()) <= (1.0 + 100.0 * EPMACH) * (mid.abs() + 1000.0 * UFLOW) {
                return Err(QuadError::Roundoff {
                    a: a1,
                    b: b2,
                    value: area,
                });
            }

            let left = self.apply(rule, f, a1, mid)?;
            let right = self.apply(rule, f, mid, b2)?;
            evaluations += 2 * nodes;

            area += left.value + right.value - worst.value;
            errsum += left.abs_err + right.abs_err - worst.error;

            heap.push(Segment {
                a: a1,
                b: mid,
                value: left.value,
                error: left.abs_err,
            });
            heap.push(Segment {
                a: mid,
                b: b2,
                value: right.value,
                error: right.abs_err,
            });

            if errsum <= epsabs.max(epsrel * area.abs()) {
                // Re-sum to shed the drift of the running total
                let value = heap.iter().map(|s| s.value).sum();
                let abs_err = heap.iter().map(|s| s.error).sum();
                return Ok(Estimate {
                    value,
                    abs_err,
                    intervals: heap.len(),
                    evaluations,
                });
            }
        }

        Err(QuadError::SubdivisionLimit {
            limit,
            value: heap.iter().map(|s| s.value).sum(),
            abs_err: heap.iter().map(|s| s.error).sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn quad(f: impl Fn(f64) -> f64, a: f64, b: f64) -> Estimate {
        Integrator::default().integrate(&Func(f), a, b).unwrap()
    }

    #[test]
    fn test_smooth_finite() {
        let est = quad(|x| x.sin(), 0.0, PI);
        assert!((est.value - 2.0).abs() < 1e-12);
        assert_eq!(est.intervals, 1);
    }

    #[test]
    fn test_reversed_bounds() {
        let fwd = quad(|x| x * x, 0.0, 3.0);
        let rev = quad(|x| x * x, 3.0, 0.0);
        assert!((fwd.value - 9.0).abs() < 1e-12);
        assert!((rev.value + 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_interval() {
        let est = quad(|x| x, 1.5, 1.5);
        assert_eq!(est.value, 0.0);
        assert_eq!(est.evaluations, 0);
    }

    #[test]
    fn test_step_discontinuity() {
        let est = quad(|x| if x.abs() < 0.3 { 1.0 } else { 0.0 }, -1.0, 1.0);
        assert!((est.value - 0.6).abs() < 1e-7, "got {}", est.value);
        assert!(est.intervals > 1);
    }

    #[test]
    fn test_gaussian_full_line() {
        let est = quad(|x| (-0.5 * x * x).exp(), f64::NEG_INFINITY, f64::INFINITY);
        assert!((est.value - (2.0 * PI).sqrt()).abs() < 1e-7, "got {}", est.value);
    }

    #[test]
    fn test_semi_infinite() {
        let upper = quad(|x| (-x).exp(), 1.0, f64::INFINITY);
        assert!((upper.value - (-1f64).exp()).abs() < 1e-8);

        let lower = quad(|x| x.exp(), f64::NEG_INFINITY, 0.0);
        assert!((lower.value - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_compact_support_on_full_line() {
        let est = quad(
            |x| if x.abs() < 0.5 { 1.0 } else { 0.0 },
            f64::NEG_INFINITY,
            f64::INFINITY,
        );
        assert!((est.value - 1.0).abs() < 1e-7, "got {}", est.value);
    }

    #[test]
    fn test_zero_integrand() {
        let est = quad(|_| 0.0, f64::NEG_INFINITY, f64::INFINITY);
        assert_eq!(est.value, 0.0);
    }

    #[test]
    fn test_nan_integrand() {
        let err = Integrator::default()
            .integrate(&Func(|_: f64| f64::NAN), 0.0, 1.0)
            .unwrap_err();
        assert!(matches!(err, QuadError::NonFinite { .. }));
    }

    #[test]
    fn test_nan_bounds() {
        let err = Integrator::default()
            .integrate(&Func(|x: f64| x), f64::NAN, 1.0)
            .unwrap_err();
        assert!(matches!(err, QuadError::InvalidInterval { .. }));
    }

    #[test]
    fn test_invalid_tolerance() {
        let integrator = Integrator::new(QuadConfig {
            epsabs: 0.0,
            epsrel: 0.0,
            limit: 50,
        });
        let err = integrator.integrate(&Func(|x: f64| x), 0.0, 1.0).unwrap_err();
        assert!(matches!(err, QuadError::InvalidTolerance { .. }));
    }

    #[test]
    fn test_subdivision_limit() {
        let integrator = Integrator::new(QuadConfig {
            limit: 2,
            ..QuadConfig::default()
        });
        let err = integrator
            .integrate(&Func(|x: f64| if x < 0.123 { 1.0 } else { 0.0 }), 0.0, 1.0)
            .unwrap_err();
        assert!(matches!(err, QuadError::SubdivisionLimit { limit: 2, .. }));
    }

    #[test]
    fn test_batch_override_is_used() {
        use std::cell::Cell;

        struct Counting {
            batches: Cell<usize>,
        }

        impl Integrand for Counting {
            fn eval(&self, x: f64) -> f64 {
                x
            }

            fn eval_batch(&self, xs: &[f64], out: &mut [f64]) {
                self.batches.set(self.batches.get() + 1);
                out.copy_from_slice(xs);
            }
        }

        let f = Counting {
            batches: Cell::new(0),
        };
        let est = Integrator::default().integrate(&f, 0.0, 2.0).unwrap();
        assert!((est.value - 2.0).abs() < 1e-14);
        assert_eq!(f.batches.get(), 1);
    }
}
