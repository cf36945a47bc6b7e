//! Lifecycle events emitted by the test-execution engine.

use std::convert::Infallible;
use std::str::FromStr;

/// A test case about to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// URI of the feature file declaring the case.
    pub uri: String,
    /// Line of the scenario, or of the example row for outline instances.
    pub line: usize,
    /// Runtime name of the case.
    pub name: String,
    /// Runtime tags, `@`-prefixed.
    pub tags: Vec<String>,
}

impl TestCase {
    /// Construct a test case without tags.
    pub fn new(uri: impl Into<String>, line: usize, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            line,
            name: name.into(),
            tags: Vec::new(),
        }
    }

    /// Attach runtime tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Argument passed to a step: a doc string or a data table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArgument {
    /// Multi-line string argument.
    DocString(String),
    /// Table argument, header row first.
    DataTable(Vec<Vec<String>>),
}

/// A step about to run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestStep {
    /// Step text with parameters substituted.
    pub text: Option<String>,
    /// Source line of the step; absent for hooks.
    pub line: Option<usize>,
    /// Whether the engine invoked this step as a hook.
    pub is_hook: bool,
    /// Code location of the step or hook implementation.
    pub code_location: Option<String>,
    /// Runtime argument.
    pub argument: Option<StepArgument>,
}

impl TestStep {
    /// A user-authored step declared at `line`.
    pub fn at_line(line: usize, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            line: Some(line),
            ..Self::default()
        }
    }

    /// A hook implemented at `code_location`.
    pub fn hook(code_location: impl Into<String>) -> Self {
        Self {
            is_hook: true,
            code_location: Some(code_location.into()),
            ..Self::default()
        }
    }

    /// Attach a runtime argument.
    #[must_use]
    pub fn with_argument(mut self, argument: StepArgument) -> Self {
        self.argument = Some(argument);
        self
    }
}

/// Outcome reported for a finished step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Step completed successfully.
    Passed,
    /// Step raised an error.
    Failed,
    /// Step did not run.
    Skipped,
    /// Step is declared but not yet implemented.
    Pending,
    /// More than one implementation matched.
    Ambiguous,
    /// No implementation matched.
    Undefined,
    /// A status this reporter does not recognise.
    Unknown,
}

impl FromStr for StepStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "passed" => Self::Passed,
            "failed" => Self::Failed,
            "skipped" => Self::Skipped,
            "pending" => Self::Pending,
            "ambiguous" => Self::Ambiguous,
            "undefined" => Self::Undefined,
            _ => Self::Unknown,
        })
    }
}

/// Result of a finished step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    /// Reported status.
    pub status: StepStatus,
    /// Rendered error, typically a stack trace.
    pub error: Option<String>,
    /// Short error message.
    pub error_message: Option<String>,
}

impl StepResult {
    /// A result with no error detail.
    #[must_use]
    pub fn new(status: StepStatus) -> Self {
        Self {
            status,
            error: None,
            error_message: None,
        }
    }

    /// Attach an error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attach an error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Events consumed by [`Reporter::dispatch`](crate::Reporter::dispatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A feature file was read.
    SourceRead {
        /// URI of the file.
        uri: String,
        /// Raw Gherkin text.
        source: String,
    },
    /// A test case started.
    CaseStarted(TestCase),
    /// A step or hook started.
    StepStarted(TestStep),
    /// The current step or hook finished.
    StepFinished(StepResult),
    /// The engine embedded binary data.
    Embed {
        /// MIME type of `data`.
        mime_type: String,
        /// Raw bytes.
        data: Vec<u8>,
    },
    /// The engine wrote free text.
    Write {
        /// Text to log.
        text: String,
    },
    /// The run finished.
    RunFinished,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("passed", StepStatus::Passed)]
    #[case("FAILED", StepStatus::Failed)]
    #[case(" skipped ", StepStatus::Skipped)]
    #[case("pending", StepStatus::Pending)]
    #[case("ambiguous", StepStatus::Ambiguous)]
    #[case("undefined", StepStatus::Undefined)]
    #[case("flaky", StepStatus::Unknown)]
    fn status_parses_engine_names(#[case] raw: &str, #[case] expected: StepStatus) {
        assert_eq!(raw.parse::<StepStatus>(), Ok(expected));
    }

    #[test]
    fn hook_steps_have_no_line() {
        let hook = TestStep::hook("hooks::before");
        assert!(hook.is_hook);
        assert!(hook.line.is_none());
        assert!(hook.text.is_none());
    }

    #[test]
    fn test_case_collects_tags() {
        let case = TestCase::new("file:a.feature", 3, "pay").with_tags(["@smoke"]);
        assert_eq!(case.tags, vec!["@smoke".to_string()]);
    }
}
