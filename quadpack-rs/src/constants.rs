//! Constants for the adaptive integrator

pub const EPMACH: f64 = f64::EPSILON;
pub const UFLOW: f64 = f64::MIN_POSITIVE;

// Defaults shared with the common general-purpose integrators
pub const DEFAULT_EPSABS: f64 = 1.49e-8;
pub const DEFAULT_EPSREL: f64 = 1.49e-8;
pub const DEFAULT_LIMIT: usize = 200;

/// Largest node count of any rule (21-point Kronrod)
pub const MAX_NODES: usize = 21;

/// Smallest relative tolerance accepted when no absolute tolerance is given
pub const MIN_EPSREL: f64 = 50.0 * EPMACH;
