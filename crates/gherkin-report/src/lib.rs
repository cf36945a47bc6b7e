//! Builds hierarchical test reports from Gherkin sources and execution
//! events.
//!
//! A test-execution engine emits [`Event`]s: feature sources as they are
//! read, then case, step, attachment and text events as scenarios run. The
//! [`Reporter`] maps each event back to the Gherkin construct it came from
//! and grows a report tree of features, scenario outlines, scenarios and
//! steps through a [`ReportModel`](gherkin_report_tree::ReportModel).
//!
//! Workers run concurrently. Each owns an [`ExecutionContext`] holding its
//! position in the tree, while features and outlines discovered by several
//! workers collapse onto one shared node keyed by name.
//!
//! # Example
//!
//! ```
//! use gherkin_report::{Event, ReporterConfig, Reporter, StepResult, StepStatus, TestCase, TestStep};
//!
//! let (reporter, report) = Reporter::in_memory(ReporterConfig::default());
//! let mut ctx = reporter.context();
//! let source = "Feature: Checkout\n  Scenario: Pay\n    Given a cart\n";
//! let events = [
//!     Event::SourceRead { uri: "checkout.feature".into(), source: source.into() },
//!     Event::CaseStarted(TestCase::new("checkout.feature", 2, "Pay")),
//!     Event::StepStarted(TestStep::at_line(3, "a cart")),
//!     Event::StepFinished(StepResult::new(StepStatus::Passed)),
//! ];
//! for event in events {
//!     reporter.dispatch(&mut ctx, event).expect("dispatch");
//! }
//! assert_eq!(report.snapshot().len(), 1);
//! ```

mod attachment;
mod cache;
pub mod config;
mod context;
mod error;
mod event;
pub mod logging;
pub mod markup;
mod result;
mod router;
pub mod source;
pub mod table;
mod tracker;

pub use attachment::extension_for;
pub use config::{LogLevel, ReporterConfig};
pub use context::ExecutionContext;
pub use error::{ReportError, SourceError, TableError};
pub use event::{Event, StepArgument, StepResult, StepStatus, TestCase, TestStep};
pub use logging::init_logging;
pub use router::Reporter;
pub use source::{ExamplesId, FeatureInfo, SourceIndex, SourceMatch};
pub use table::{RenderedTable, render as render_table};

pub use gherkin_report_tree;
