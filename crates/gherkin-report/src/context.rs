//! Per-worker report position.

use gherkin_report_tree::NodeId;

use crate::source::ExamplesId;

/// Outline currently open in a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenOutline {
    pub(crate) name: String,
    pub(crate) node: NodeId,
}

/// Position of one execution context in the report tree.
///
/// Each worker owns one context and passes it to every
/// [`Reporter::dispatch`](crate::Reporter::dispatch) call. Contexts are
/// never shared, so none of these pointers need synchronisation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    pub(crate) feature_file: Option<String>,
    pub(crate) feature: Option<NodeId>,
    pub(crate) outline: Option<OpenOutline>,
    pub(crate) examples: Option<ExamplesId>,
    pub(crate) scenario: Option<NodeId>,
    pub(crate) step: Option<NodeId>,
    pub(crate) in_hook: bool,
}

impl ExecutionContext {
    /// Create a context with nothing open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// URI of the feature file last entered.
    #[must_use]
    pub fn feature_file(&self) -> Option<&str> {
        self.feature_file.as_deref()
    }

    /// Open feature node.
    #[must_use]
    pub fn feature(&self) -> Option<NodeId> {
        self.feature
    }

    /// Open outline node.
    #[must_use]
    pub fn outline(&self) -> Option<NodeId> {
        self.outline.as_ref().map(|outline| outline.node)
    }

    /// Name of the open outline.
    #[must_use]
    pub fn outline_name(&self) -> Option<&str> {
        self.outline.as_ref().map(|outline| outline.name.as_str())
    }

    /// Examples block of the running outline instance.
    #[must_use]
    pub fn examples(&self) -> Option<&ExamplesId> {
        self.examples.as_ref()
    }

    /// Open scenario node.
    #[must_use]
    pub fn scenario(&self) -> Option<NodeId> {
        self.scenario
    }

    /// Open step node.
    #[must_use]
    pub fn step(&self) -> Option<NodeId> {
        self.step
    }

    /// Whether the open step node stands for a hook.
    #[must_use]
    pub fn in_hook(&self) -> bool {
        self.in_hook
    }

    pub(crate) fn clear_outline(&mut self) {
        self.outline = None;
        self.examples = None;
    }

    pub(crate) fn clear_step(&mut self) {
        self.step = None;
        self.in_hook = false;
    }
}
