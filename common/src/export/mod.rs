//! Export core modules shared by the CLI and other front ends.

pub mod csv_core;

#[cfg(feature = "excel")]
pub mod excel_core;
