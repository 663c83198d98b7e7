use crate::{consts::NAME_PRECISION, io::format_sci};
use quadpack_rs::QuadError;
use thiserror::Error;

fn sci(x: &f64) -> String {
    format_sci(*x, NAME_PRECISION)
}

pub type Result<T> = std::result::Result<T, DriftError>;

#[derive(Error, Debug)]
pub enum DriftError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The raw density has no usable mass, so it cannot be scaled to 1
    #[error(
        "drift density with pass_ratio={pass_ratio}, drift_stddev={drift_stddev} \
         integrates to {} and cannot be normalized",
        sci(.integral)
    )]
    Normalization {
        pass_ratio: f64,
        drift_stddev: f64,
        integral: f64,
    },

    #[error("quadrature of {what} failed for pass_ratio={pass_ratio}, drift_stddev={drift_stddev}")]
    Quadrature {
        what: String,
        pass_ratio: f64,
        drift_stddev: f64,
        #[source]
        source: QuadError,
    },

    #[error(
        "row da={da} sums to {} for pass_ratio={pass_ratio}, drift_stddev={drift_stddev}; \
         cannot normalize",
        sci(.sum)
    )]
    RowSum {
        da: i32,
        sum: f64,
        pass_ratio: f64,
        drift_stddev: f64,
    },

    #[error("drift {drift} lies outside [-{max_drift}, {max_drift}]")]
    DriftOutOfRange { drift: f64, max_drift: u32 },

    #[error("line {line}: cannot parse {token:?} as a probability")]
    Parse { line: usize, token: String },

    #[error("table holds {found} values, expected {expected}")]
    Shape { expected: usize, found: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
