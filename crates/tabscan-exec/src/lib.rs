#![forbid(unsafe_code)]
//! tabscan-exec: concrete [`ScanEngine`](tabscan_core::engine::ScanEngine)s.
//!
//! - [`FileEngine`]: CSV / JSONL / Parquet files on the local file system.
//! - [`MemoryEngine`]: tables registered under a path, for tests and embedding.

pub mod memory;
pub mod runtime;

pub use memory::MemoryEngine;
pub use runtime::FileEngine;
