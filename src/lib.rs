//! Core library for the campus-rollup command line application.
//!
//! The library consolidates per-campus enrollment counts reported by the
//! elementary, middle, and high school tracking sheets into a single report
//! sheet. Responsibilities are kept narrow: the comparison-key logic lives in
//! [`campus::rollup::normalize`], configuration in [`campus::rollup::config`],
//! the collaborator contracts in [`campus::rollup::ports`], workbook and
//! in-memory adapters under [`campus::rollup::io`], and the accumulation
//! procedure in [`campus::rollup::aggregate`].

pub mod campus;

pub use campus::rollup::{
    Result, RollupError, aggregate, config, error, identity, io, layout, model, normalize, ports,
    sync,
};
