//! The report model seam driven by the correlation engine.
//!
//! A report is a tree of named nodes (features, outlines, scenarios and
//! steps). Each node accumulates log entries and tags; its status is derived
//! from the statuses of its logs. Backends implement [`ReportModel`] and hand
//! back opaque [`NodeId`] handles that the engine stores and passes back on
//! later calls.

use std::fmt;

use serde::Serialize;

use crate::TreeError;

/// Opaque handle to a node created through a [`ReportModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a raw identifier allocated by a backend.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Kind of report node, mirroring the Gherkin construct it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A feature file.
    Feature,
    /// A scenario outline grouping its generated scenarios.
    ScenarioOutline,
    /// A scenario, either authored directly or generated from an outline row.
    Scenario,
    /// A `Given` step.
    Given,
    /// A `When` step.
    When,
    /// A `Then` step.
    Then,
    /// An `And` step.
    And,
    /// A `But` step.
    But,
    /// A `*` step, hook, or synthetic node without a Gherkin keyword.
    Asterisk,
}

impl NodeKind {
    /// Map a Gherkin step keyword to a node kind.
    ///
    /// Leading and trailing whitespace is ignored. Keywords that are not one
    /// of the English step keywords map to [`NodeKind::Asterisk`].
    ///
    /// # Examples
    ///
    /// ```
    /// use gherkin_report_tree::NodeKind;
    ///
    /// assert_eq!(NodeKind::from_keyword("Given "), NodeKind::Given);
    /// assert_eq!(NodeKind::from_keyword("*"), NodeKind::Asterisk);
    /// ```
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim() {
            "Given" => Self::Given,
            "When" => Self::When,
            "Then" => Self::Then,
            "And" => Self::And,
            "But" => Self::But,
            _ => Self::Asterisk,
        }
    }
}

/// Status attached to a log entry.
///
/// The ordering of the variants is significant: a node's status is the
/// greatest status among its logs, with [`Outcome::Info`] never raising it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Informational entry; does not affect the node status.
    Info,
    /// The step or node passed.
    Pass,
    /// The step or node was skipped.
    Skip,
    /// The step or node failed.
    Fail,
}

/// Reference to a media file linked from the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRef {
    /// Path used when linking the file into generated markup.
    pub path: String,
    /// Optional caption.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl MediaRef {
    /// Reference a media file by path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: None,
        }
    }

    /// Attach a caption.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Body of a log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum LogBody {
    /// Plain text.
    Text(String),
    /// Pre-rendered markup (for example an HTML table).
    Markup(String),
    /// A screen capture.
    ScreenCapture(MediaRef),
}

/// A single entry in a node's log history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Status recorded with the entry.
    pub status: Outcome,
    /// Entry content.
    pub body: LogBody,
}

impl LogEntry {
    /// Build an entry from its parts.
    #[must_use]
    pub fn new(status: Outcome, body: LogBody) -> Self {
        Self { status, body }
    }

    /// A text entry with the given status.
    #[must_use]
    pub fn text(status: Outcome, text: impl Into<String>) -> Self {
        Self::new(status, LogBody::Text(text.into()))
    }

    /// A markup entry with the given status.
    #[must_use]
    pub fn markup(status: Outcome, markup: impl Into<String>) -> Self {
        Self::new(status, LogBody::Markup(markup.into()))
    }

    /// The generic pass entry recorded when a step passes without evidence.
    #[must_use]
    pub fn pass() -> Self {
        Self::text(Outcome::Pass, String::new())
    }

    /// An informational screen-capture entry.
    #[must_use]
    pub fn screen_capture(media: MediaRef) -> Self {
        Self::new(Outcome::Info, LogBody::ScreenCapture(media))
    }

    /// Whether the entry carries a screen capture.
    #[must_use]
    pub fn is_screen_capture(&self) -> bool {
        matches!(self.body, LogBody::ScreenCapture(_))
    }

    /// The textual content of the entry, if it has any.
    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        match &self.body {
            LogBody::Text(text) | LogBody::Markup(text) => Some(text),
            LogBody::ScreenCapture(_) => None,
        }
    }
}

/// Operations the correlation engine performs against a report backend.
///
/// Handles are only meaningful to the backend that issued them. Calls that
/// reference a removed or unknown handle are ignored by implementations.
pub trait ReportModel: Send + Sync {
    /// Create a top-level node.
    fn create_node(&self, kind: NodeKind, name: &str, description: Option<&str>) -> NodeId;

    /// Create a node under `parent`.
    fn create_child_node(
        &self,
        parent: NodeId,
        kind: NodeKind,
        name: &str,
        description: Option<&str>,
    ) -> NodeId;

    /// Current description of a node.
    fn description(&self, node: NodeId) -> Option<String>;

    /// Replace the description of a node.
    fn set_description(&self, node: NodeId, text: &str);

    /// Attach a tag (category) to a node.
    fn assign_tag(&self, node: NodeId, tag: &str);

    /// Append a log entry to a node.
    fn log(&self, node: NodeId, entry: LogEntry);

    /// Attach a screen capture to the node itself rather than to a log entry.
    fn add_screen_capture(&self, node: NodeId, media: MediaRef);

    /// Whether any log entry has been attached to the node.
    fn has_log(&self, node: NodeId) -> bool;

    /// Status of the most recently attached log entry.
    fn last_log_status(&self, node: NodeId) -> Option<Outcome>;

    /// Whether the node carries a screen capture, either directly or in a log.
    fn has_screen_capture(&self, node: NodeId) -> bool;

    /// Remove a node and its subtree from the report.
    fn remove_node(&self, node: NodeId);

    /// Finalise the report.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails to persist the report.
    fn flush(&self) -> Result<(), TreeError>;
}
