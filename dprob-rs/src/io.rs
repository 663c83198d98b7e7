use crate::{
    consts::{NAME_PRECISION, TABLE_EXT, TABLE_PREFIX, VALUE_PRECISION},
    error::Result,
    matrix::TransitionMatrix,
    types::DriftParams,
};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use tracing::info;

/// Format like C's `%.<precision>e`: `1.2340e-01`, `0.0000000000e+00`.
pub fn format_sci(x: f64, precision: usize) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let s = format!("{:.*e}", precision, x);
    // Rust always emits an exponent for finite values
    let Some((mantissa, exp)) = s.split_once('e') else {
        return s;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exp.abs())
}

/// `prob_table_r<pass_ratio>_v<drift_stddev>_d<max_drift>_s<segments>.dat`
pub fn table_filename(params: &DriftParams) -> String {
    format!(
        "{}_r{}_v{}_d{}_s{}.{}",
        TABLE_PREFIX,
        format_sci(params.pass_ratio(), NAME_PRECISION),
        format_sci(params.drift_stddev(), NAME_PRECISION),
        params.max_drift(),
        params.segments(),
        TABLE_EXT
    )
}

/// One row per line, entries separated by a single space
pub fn write_matrix<W: Write>(mut writer: W, matrix: &TransitionMatrix) -> std::io::Result<()> {
    let mut line = String::with_capacity(matrix.size() * (VALUE_PRECISION + 8));
    for row in matrix.rows() {
        line.clear();
        for (j, p) in row.iter().enumerate() {
            if j > 0 {
                line.push(' ');
            }
            line.push_str(&format_sci(*p, VALUE_PRECISION));
        }
        line.push('\n');
        writer.write_all(line.as_bytes())?;
    }
    Ok(())
}

/// Create or overwrite `path` with `matrix`
pub fn save<P: AsRef<Path>>(matrix: &TransitionMatrix, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_matrix(&mut writer, matrix)?;
    writer.flush()?;
    info!(path = %path.display(), size = matrix.size(), "wrote transition table");
    Ok(())
}
