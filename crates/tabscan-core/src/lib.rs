#![forbid(unsafe_code)]
//! tabscan-core: shared kernel for tabscan.
//!
//! This crate contains only *pure* types, small helpers, and the interfaces
//! (traits) that engines implement. There is **no file I/O** here.
//!
//! Crates that use this:
//! - tabscan-io: decodes CSV/JSONL/Parquet into [`types::Table`].
//! - tabscan-planner: builds `DeferredFrame`s from [`source::SourceRef`] + [`options::ScanOptions`].
//! - tabscan-exec: implements [`engine::ScanEngine`] over disk files and in-memory tables.

pub mod config;
pub mod engine;
pub mod error;
pub mod expr;
pub mod hash;
pub mod options;
pub mod parse;
pub mod plan;
pub mod prelude;
pub mod schema;
pub mod source;
pub mod template;
pub mod types;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
