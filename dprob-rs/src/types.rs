use crate::error::{DriftError, Result};
use std::fmt;
use tracing::warn;

/// Parameters of the drift model, fixed for one table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftParams {
    pass_ratio: f64,
    drift_stddev: f64,
    max_drift: u32,
    segments: u32,
    max_d: i32,
}

impl DriftParams {
    /// `segments` must be at least 1, and `max_drift * segments` must leave
    /// room for offsets of twice that size in an `i32`.
    pub fn new(pass_ratio: f64, drift_stddev: f64, max_drift: u32, segments: u32) -> Result<Self> {
        if segments == 0 {
            return Err(DriftError::InvalidParameter {
                name: "segments",
                reason: "must be at least 1".to_string(),
            });
        }

        let max_d = max_drift
            .checked_mul(segments)
            .and_then(|m| i32::try_from(m).ok())
            .filter(|m| m.checked_mul(2).is_some())
            .ok_or_else(|| DriftError::InvalidParameter {
                name: "max_drift",
                reason: format!("max_drift * segments = {max_drift} * {segments} is too large"),
            })?;

        if !(0.0..=1.0).contains(&pass_ratio) {
            warn!(pass_ratio, "pass ratio outside [0, 1]");
        }

        Ok(Self {
            pass_ratio,
            drift_stddev,
            max_drift,
            segments,
            max_d,
        })
    }

    #[inline]
    pub fn pass_ratio(&self) -> f64 {
        self.pass_ratio
    }

    #[inline]
    pub fn drift_stddev(&self) -> f64 {
        self.drift_stddev
    }

    #[inline]
    pub fn max_drift(&self) -> u32 {
        self.max_drift
    }

    #[inline]
    pub fn segments(&self) -> u32 {
        self.segments
    }

    /// Largest segment offset, `max_drift * segments`
    #[inline]
    pub fn max_d(&self) -> i32 {
        self.max_d
    }

    /// Side length of the transition matrix
    #[inline]
    pub fn size(&self) -> usize {
        2 * self.max_d as usize + 1
    }

    /// Half-width of one bin in coarse drift units
    #[inline]
    pub fn bin_half_width(&self) -> f64 {
        1.0 / (2.0 * self.segments as f64)
    }

    /// Bounds of the bin centred on segment offset `offset`
    #[inline]
    pub fn bin_bounds(&self, offset: i32) -> (f64, f64) {
        let centre = offset as f64 / self.segments as f64;
        let w = self.bin_half_width();
        (centre - w, centre + w)
    }
}

impl fmt::Display for DriftParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pass_ratio={} drift_stddev={} max_drift={} segments={}",
            self.pass_ratio, self.drift_stddev, self.max_drift, self.segments
        )
    }
}
