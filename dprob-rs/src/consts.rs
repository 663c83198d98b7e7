pub const INV_SQRT_TWO_PI: f64 = 0.398_942_280_401_432_7;

/// Digits after the decimal point of every table entry
pub const VALUE_PRECISION: usize = 10;
/// Digits after the decimal point of float parameters in file names
pub const NAME_PRECISION: usize = 4;

pub const TABLE_PREFIX: &str = "prob_table";
pub const TABLE_EXT: &str = "dat";
pub const DEFAULT_TABLE_DIR: &str = "prob_table";

pub const ROW_SUM_TOLERANCE: f64 = 1e-9;
