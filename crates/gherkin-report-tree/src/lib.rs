//! Report tree model for gherkin-report.
//!
//! This crate defines the seam between the correlation engine and whatever
//! renders the final report. The engine drives a [`ReportModel`]; the
//! [`MemoryReport`] backend keeps the tree in memory and can persist it as
//! JSON or `JUnit` XML when flushed.
//!
//! # Example
//!
//! ```
//! use gherkin_report_tree::{LogEntry, MemoryReport, NodeKind, Outcome, ReportModel};
//!
//! let report = MemoryReport::new();
//! let feature = report.create_node(NodeKind::Feature, "Checkout", None);
//! let step = report.create_child_node(feature, NodeKind::Given, "Given a cart", None);
//! report.log(step, LogEntry::text(Outcome::Fail, "empty cart"));
//! assert_eq!(report.last_log_status(step), Some(Outcome::Fail));
//! ```

mod error;
pub mod escape;
pub mod json;
pub mod junit;
mod memory;
mod model;

pub use error::TreeError;
pub use memory::{MemoryReport, NodeSnapshot, ReportOutput};
pub use model::{LogBody, LogEntry, MediaRef, NodeId, NodeKind, Outcome, ReportModel};
