//! Flat-file output for downstream reporting and visualization.

pub mod export;
