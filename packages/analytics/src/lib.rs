#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-class temperature statistics.
//!
//! Groups attributed samples by LCZ class and computes descriptive
//! statistics, literature metadata, and the observed difference from the
//! baseline class. Every call recomputes the table from scratch, so
//! aggregating the same samples twice yields identical tables.

pub mod statistics;

pub use statistics::{StatisticsTable, aggregate, aggregate_with_baseline};
