//! Arena nodes produced by indexing a feature source.

use crate::event::StepArgument;

/// Kind of construct a [`SourceNode`] was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// The file's `Feature:` block.
    Feature,
    /// A Gherkin 6 `Rule:` block.
    Rule,
    /// A `Background:` block.
    Background,
    /// A scenario; `outline` is set for outlines and templates.
    Scenario {
        /// Whether the scenario is parameterised by Examples.
        outline: bool,
    },
    /// An `Examples:` block of an outline.
    Examples,
    /// A data row of an Examples table.
    ExampleRow,
    /// A step of a background or scenario.
    Step,
}

/// A parsed construct, addressed by its index in the file's arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNode {
    pub(super) kind: SourceKind,
    pub(super) keyword: String,
    pub(super) name: String,
    pub(super) description: Option<String>,
    pub(super) tags: Vec<String>,
    pub(super) start_line: usize,
    pub(super) end_line: usize,
    pub(super) depth: usize,
    pub(super) parent: Option<usize>,
    pub(super) argument: Option<StepArgument>,
    pub(super) rows: Vec<Vec<String>>,
}

impl SourceNode {
    pub(super) fn new(kind: SourceKind, keyword: &str, name: &str, start_line: usize) -> Self {
        Self {
            kind,
            keyword: keyword.to_owned(),
            name: name.to_owned(),
            description: None,
            tags: Vec::new(),
            start_line,
            end_line: start_line,
            depth: 0,
            parent: None,
            argument: None,
            rows: Vec::new(),
        }
    }

    /// Construct kind.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Keyword as written in the source, e.g. `Given ` or `Scenario Outline`.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Name, or step text for steps.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form description below the keyword line.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Tags, each carrying its `@` prefix.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// 1-based line of the keyword.
    #[must_use]
    pub fn start_line(&self) -> usize {
        self.start_line
    }

    /// Last line (inclusive) belonging to the construct.
    #[must_use]
    pub fn end_line(&self) -> usize {
        self.end_line
    }

    /// Nesting depth; the feature is at depth zero.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Argument attached to a step at definition time.
    #[must_use]
    pub fn argument(&self) -> Option<&StepArgument> {
        self.argument.as_ref()
    }

    /// Table rows of an Examples block (header first) or the cells of an
    /// example row.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Whether this is an outline scenario.
    #[must_use]
    pub fn is_outline(&self) -> bool {
        matches!(self.kind, SourceKind::Scenario { outline: true })
    }

    pub(super) fn contains_line(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}
