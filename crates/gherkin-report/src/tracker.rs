//! Maps test cases and steps onto report nodes.
//!
//! The tracker moves an [`ExecutionContext`] through the report tree as a
//! worker's events arrive: feature, then outline and examples, then
//! scenario, then step. Features and outlines are shared between contexts
//! through the name-keyed caches; everything below them is created per test
//! case.

use gherkin_report_tree::{LogEntry, NodeId, NodeKind, Outcome, ReportModel};
use tracing::debug;

use crate::cache::{FeatureCache, OutlineCache};
use crate::context::{ExecutionContext, OpenOutline};
use crate::error::{ReportError, TableError};
use crate::event::{StepArgument, TestCase, TestStep};
use crate::markup::{code_block, escape_angle_brackets, examples_block};
use crate::source::{SourceIndex, SourceMatch, SourceNode};
use crate::table;

const HOOK_FALLBACK_NAME: &str = "Hook";
const UNRESOLVED_STEP_NAME: &str = "Step";

/// Create `name` under `parent`, or as a root when there is no parent.
pub(crate) fn create_under(
    report: &dyn ReportModel,
    parent: Option<NodeId>,
    kind: NodeKind,
    name: &str,
    description: Option<&str>,
) -> NodeId {
    match parent {
        Some(parent) => report.create_child_node(parent, kind, name, description),
        None => report.create_node(kind, name, description),
    }
}

/// Render a step argument as report markup.
pub(crate) fn argument_markup(argument: &StepArgument) -> Result<String, TableError> {
    match argument {
        StepArgument::DocString(content) => Ok(code_block(content)),
        StepArgument::DataTable(rows) => {
            table::render(rows.as_slice()).map(table::RenderedTable::into_markup)
        }
    }
}

fn with_at_prefix(tag: &str) -> String {
    if tag.starts_with('@') {
        tag.to_owned()
    } else {
        format!("@{tag}")
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|text| !text.is_empty())
}

/// Borrowed view over the shared state the tracker mutates.
pub(crate) struct HierarchyTracker<'a> {
    pub(crate) report: &'a dyn ReportModel,
    pub(crate) sources: &'a SourceIndex,
    pub(crate) features: &'a FeatureCache,
    pub(crate) outlines: &'a OutlineCache,
}

impl HierarchyTracker<'_> {
    /// Bind the context to the feature declared in `case.uri`.
    ///
    /// Nothing happens while the context stays in the same file. A file that
    /// was never indexed leaves the context without a feature node.
    pub(crate) fn enter_feature(&self, ctx: &mut ExecutionContext, case: &TestCase) {
        if ctx.feature_file.as_deref() == Some(case.uri.as_str()) {
            return;
        }
        ctx.feature_file = Some(case.uri.clone());

        let Some(info) = self.sources.feature(&case.uri) else {
            debug!(uri = %case.uri, "no indexed feature for test case");
            ctx.feature = None;
            return;
        };

        let (node, created) = self.features.get_or_create(&info.name, || {
            let node = self
                .report
                .create_node(NodeKind::Feature, &info.name, info.description.as_deref());
            for tag in &info.tags {
                self.report.assign_tag(node, tag);
            }
            node
        });
        debug!(feature = %info.name, %node, created, "entered feature");
        ctx.feature = Some(node);
    }

    /// Open the outline and Examples block of an outline instance, or clear
    /// the outline pointers when `case` is a plain scenario.
    pub(crate) fn enter_outline_if_applicable(
        &self,
        ctx: &mut ExecutionContext,
        case: &TestCase,
    ) -> Result<(), ReportError> {
        let found = self
            .sources
            .lookup(&case.uri, case.line)
            .filter(SourceMatch::is_outline_scenario);
        let Some(found) = found else {
            ctx.clear_outline();
            return Ok(());
        };
        let Some(definition) = found.scenario_definition() else {
            ctx.clear_outline();
            return Ok(());
        };
        let name = definition.name();

        if ctx.outline_name() != Some(name) {
            let parent = ctx.feature;
            let (node, created) = self
                .outlines
                .get_or_create(name, || self.create_outline(parent, &found, definition))?;
            debug!(outline = name, %node, created, "entered outline");
            ctx.outline = Some(OpenOutline {
                name: name.to_owned(),
                node,
            });
            ctx.examples = None;
        }

        if let Some((id, examples)) = found.examples() {
            if ctx.examples.as_ref() != Some(&id) {
                let grew = self.outlines.append_examples(name, &id, self.report, || {
                    let rendered = table::render(examples.rows())?;
                    Ok::<_, TableError>(examples_block(examples.name(), rendered.markup()))
                })?;
                debug!(outline = name, examples_line = id.line, grew, "entered examples");
                ctx.examples = Some(id);
            }
        }
        Ok(())
    }

    /// The outline's description is its own description followed by the
    /// definition-time arguments of its steps.
    fn create_outline(
        &self,
        parent: Option<NodeId>,
        found: &SourceMatch,
        definition: &SourceNode,
    ) -> Result<NodeId, ReportError> {
        let mut description = definition.description().unwrap_or_default().to_owned();
        for step in found.scenario_steps() {
            if let Some(argument) = step.argument() {
                description.push_str(&argument_markup(argument)?);
            }
        }
        let description = (!description.is_empty()).then_some(description);
        let node = create_under(
            self.report,
            parent,
            NodeKind::ScenarioOutline,
            definition.name(),
            description.as_deref(),
        );
        for tag in definition.tags() {
            self.report.assign_tag(node, tag);
        }
        Ok(node)
    }

    /// Create the scenario node for `case` under the open outline, else the
    /// open feature, else as a root.
    pub(crate) fn enter_scenario(&self, ctx: &mut ExecutionContext, case: &TestCase) {
        ctx.clear_step();
        let found = self.sources.lookup(&case.uri, case.line);
        let definition = found.as_ref().and_then(SourceMatch::scenario_definition);
        let (name, description) = definition.map_or((case.name.as_str(), None), |definition| {
            (definition.name(), definition.description())
        });

        let parent = ctx.outline().or(ctx.feature);
        let node = create_under(self.report, parent, NodeKind::Scenario, name, description);
        for tag in &case.tags {
            self.report.assign_tag(node, &with_at_prefix(tag));
        }
        debug!(scenario = name, %node, line = case.line, "entered scenario");
        ctx.scenario = Some(node);
    }

    /// Create the node for a step or hook under the open scenario.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Table`] when the step's table argument is
    /// ragged. The step node is still opened so its result can be recorded.
    pub(crate) fn enter_step(
        &self,
        ctx: &mut ExecutionContext,
        step: &TestStep,
    ) -> Result<(), ReportError> {
        ctx.clear_step();
        let code_location = step.code_location.as_deref();

        if step.is_hook {
            let name = non_empty(step.text.as_ref())
                .or(code_location)
                .unwrap_or(HOOK_FALLBACK_NAME);
            let node = create_under(
                self.report,
                ctx.scenario,
                NodeKind::Asterisk,
                name,
                code_location,
            );
            ctx.step = Some(node);
            ctx.in_hook = true;
            return Ok(());
        }

        let found = ctx
            .feature_file
            .as_deref()
            .zip(step.line)
            .and_then(|(uri, line)| self.sources.lookup(uri, line));
        let definition = found.as_ref().and_then(SourceMatch::step_definition);

        let runtime_text = non_empty(step.text.as_ref());
        let (kind, name) = match definition {
            Some(definition) => {
                let keyword = definition.keyword().trim();
                let text = runtime_text.map_or_else(
                    || escape_angle_brackets(definition.name()),
                    str::to_owned,
                );
                (NodeKind::from_keyword(keyword), format!("{keyword} {text}"))
            }
            None => {
                debug!(line = ?step.line, "step does not resolve to a source definition");
                (
                    NodeKind::Asterisk,
                    runtime_text.unwrap_or(UNRESOLVED_STEP_NAME).to_owned(),
                )
            }
        };

        let node = create_under(self.report, ctx.scenario, kind, &name, code_location);
        ctx.step = Some(node);

        let argument = step
            .argument
            .as_ref()
            .or_else(|| definition.and_then(SourceNode::argument));
        if let Some(argument) = argument {
            let markup = argument_markup(argument)?;
            self.report.log(node, LogEntry::markup(Outcome::Pass, markup));
        }
        Ok(())
    }
}
