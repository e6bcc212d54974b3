#![forbid(unsafe_code)]
//! tabscan-planner: the deferred-scan surface.
//!
//! - `frame`: [`DeferredFrame`] handles and [`build_scan`].
//! - `select`: [`ColumnSelector`] resolution and [`select_columns`].
//! - `materialize`: [`materialize`] and the [`read_eager`] shortcut.
//! - `dsl`: linear YAML pipelines over the above.

pub mod dsl;
pub mod frame;
pub mod materialize;
pub mod select;

pub use frame::{build_scan, DeferredFrame};
pub use materialize::{materialize, read_eager};
pub use select::{select_columns, ColumnSelector};
