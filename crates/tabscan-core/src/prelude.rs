//! Convenience re-exports.

pub use crate::config::EngineConfig;
pub use crate::engine::ScanEngine;
pub use crate::error::{Error, Result};
pub use crate::expr::{BinOp, Expr, Function, UnaryOp};
pub use crate::options::{FileFormat, ScanOptions};
pub use crate::plan::ScanPlan;
pub use crate::schema::{DataType, Field, Schema};
pub use crate::source::SourceRef;
pub use crate::template::{apply_template_expression, compile_template};
pub use crate::types::{Column, Scalar, Table};
