//! Record-to-task transformation for ganttline timelines.
//!
//! This crate turns tabular records into validated, render-ready Gantt
//! tasks. It provides:
//!
//! - A loosely typed record model ([`RecordSet`], [`CellValue`])
//! - Date parsing with a fallback chain ([`date`])
//! - Category to palette class mapping ([`color`])
//! - Single-criterion and grouped sorting ([`sort`])
//! - The [`TaskTransformer`] pipeline, which also repairs dependencies via
//!   `ganttline-task-graph`
//!
//! # Example
//!
//! ```ignore
//! use ganttline_core::{RecordSet, TaskTransformer, TaskTransformerConfig};
//!
//! let records: RecordSet = load_records()?;
//! let config = TaskTransformerConfig::new("id", "start", "end")
//!     .with_dependencies_column("depends_on");
//! let output = TaskTransformer::new(config).transform(&records)?;
//! for task in &output.tasks {
//!     println!("{} {} -> {}", task.name, task.start, task.end);
//! }
//! ```

pub mod color;
pub mod config;
pub mod date;
pub mod error;
pub mod metadata;
pub mod record;
pub mod sort;
pub mod task;
pub mod transform;

pub use color::{ColorMapping, Palette, PaletteName, get_color_class};
pub use config::{DuplicateIdHandling, TaskTransformerConfig};
pub use date::{DateErrorCode, DateParseError, parse_date, parse_date_to_iso, validate_date_range};
pub use error::{Error, ErrorCode, Result};
pub use metadata::{DuplicateId, SkipReason, ValidationMetadata};
pub use record::{CellValue, RawRecord, RecordSet};
pub use sort::{SortCriterion, group_and_sort, sort_tasks};
pub use task::Task;
pub use transform::{TaskTransformer, TransformOutput};
