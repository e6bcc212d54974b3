pub mod csv;
pub mod jsonl;

#[cfg(feature = "parquet")]
pub mod parquet;

/// Upper bound on the rows preallocated per batch column; larger batches grow
/// on demand.
pub(crate) const MAX_PREALLOC_ROWS: usize = 4096;
