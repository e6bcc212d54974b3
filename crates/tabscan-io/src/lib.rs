#![forbid(unsafe_code)]
//! tabscan-io: format readers and writers.
//!
//! - `readers`: CSV/JSONL batch readers producing [`tabscan_core::types::Table`]s,
//!   with type inference over a bounded row sample.
//! - `writers`: CSV writer for realized tables.
//! - `infer`: the text/JSON type lattice shared by the readers.
//!
//! Parquet support is feature-gated behind `--features parquet`.

pub mod error;
pub mod infer;
pub mod readers;
pub mod writers;

#[cfg(feature = "parquet")]
pub mod arrow_convert;

pub use error::{Error, Result};
