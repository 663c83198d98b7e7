//! Drift transition tables for segmented synchronization channels.
//!
//! A drift value moves by a Gaussian step truncated to the pass zone
//! `|x| < 1 - pass_ratio`. [`TransitionMatrix::build`] discretizes that
//! step into `segments` bins per unit of drift and stores, for every
//! current offset, the distribution of the next one. [`generate`] writes
//! the matrix next to the decoders that read it back through
//! [`DriftTable`].

pub mod consts;
pub mod density;
pub mod error;
pub mod io;
pub mod matrix;
pub mod sampler;
mod simd;
pub mod table;
pub mod types;
pub mod utils;

pub use density::DriftDensity;
pub use error::{DriftError, Result};
pub use matrix::{DriftKernel, TransitionMatrix};
pub use quadpack_rs::QuadConfig;
pub use sampler::DriftSampler;
pub use table::DriftTable;
pub use types::DriftParams;

use std::path::{Path, PathBuf};
use tracing::info;

/// Build the table for `params` and save it to `output`, or to the
/// default file name in the current directory. Returns the written path.
///
/// Nothing is created on disk unless the whole matrix was computed.
pub fn generate(params: &DriftParams, config: &QuadConfig, output: Option<&Path>) -> Result<PathBuf> {
    info!(%params, "building drift transition table");
    let matrix = TransitionMatrix::build(params, config)?;

    let path = match output {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(io::table_filename(params)),
    };
    io::save(&matrix, &path)?;
    Ok(path)
}
