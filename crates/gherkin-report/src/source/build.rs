//! Conversion of a `gherkin` AST into a line-addressed arena.

use gherkin::GherkinEnv;

use super::ParsedSource;
use super::node::{SourceKind, SourceNode};
use crate::error::SourceError;
use crate::event::StepArgument;

pub(super) fn parse(uri: &str, text: &str) -> Result<ParsedSource, SourceError> {
    let mut source = text.to_owned();
    normalise_trailing_newline(&mut source);
    let feature =
        gherkin::Feature::parse(source.as_str(), GherkinEnv::default()).map_err(|source| {
            SourceError::Parse {
                uri: uri.to_owned(),
                source,
            }
        })?;

    let lines: Vec<&str> = source.lines().collect();
    let mut arena = Arena::default();
    arena.push_feature(&feature, &lines);
    arena.assign_end_lines(lines.len());
    Ok(ParsedSource {
        uri: uri.to_owned(),
        nodes: arena.nodes,
    })
}

fn normalise_trailing_newline(text: &mut String) {
    if !text.ends_with('\n') {
        text.push('\n');
    }
}

fn normalise_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| {
            if tag.starts_with('@') {
                tag.clone()
            } else {
                format!("@{tag}")
            }
        })
        .collect()
}

fn step_argument(step: &gherkin::Step) -> Option<StepArgument> {
    if let Some(doc) = step.docstring.as_ref() {
        return Some(StepArgument::DocString(doc.clone()));
    }
    step.table
        .as_ref()
        .map(|table| StepArgument::DataTable(table.rows.clone()))
}

/// Split an `Examples:` keyword line into keyword and name.
fn split_keyword_line(line: &str) -> (String, String) {
    match line.trim().split_once(':') {
        Some((keyword, name)) => (keyword.trim().to_owned(), name.trim().to_owned()),
        None => (line.trim().to_owned(), String::new()),
    }
}

/// Line numbers of the table rows that follow an `Examples:` keyword line.
///
/// Description lines before the table are skipped; blank and comment lines
/// may appear between rows.
fn table_row_lines(lines: &[&str], keyword_line: usize) -> Vec<usize> {
    let mut rows = Vec::new();
    for (offset, line) in lines.iter().enumerate().skip(keyword_line) {
        let trimmed = line.trim();
        if trimmed.starts_with('|') {
            rows.push(offset + 1);
        } else if !rows.is_empty() && !trimmed.is_empty() && !trimmed.starts_with('#') {
            break;
        }
    }
    rows
}

#[derive(Default)]
struct Arena {
    nodes: Vec<SourceNode>,
}

impl Arena {
    fn push(&mut self, mut node: SourceNode, parent: Option<usize>) -> usize {
        node.parent = parent;
        node.depth = parent
            .and_then(|idx| self.nodes.get(idx))
            .map_or(0, |p| p.depth + 1);
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn push_feature(&mut self, feature: &gherkin::Feature, lines: &[&str]) {
        let mut node = SourceNode::new(
            SourceKind::Feature,
            &feature.keyword,
            &feature.name,
            feature.position.line,
        );
        node.description.clone_from(&feature.description);
        node.tags = normalise_tags(&feature.tags);
        let root = self.push(node, None);

        if let Some(background) = feature.background.as_ref() {
            self.push_background(background, root);
        }
        for scenario in &feature.scenarios {
            self.push_scenario(scenario, root, lines);
        }
        for rule in &feature.rules {
            let mut node =
                SourceNode::new(SourceKind::Rule, &rule.keyword, &rule.name, rule.position.line);
            node.tags = normalise_tags(&rule.tags);
            let rule_idx = self.push(node, Some(root));
            if let Some(background) = rule.background.as_ref() {
                self.push_background(background, rule_idx);
            }
            for scenario in &rule.scenarios {
                self.push_scenario(scenario, rule_idx, lines);
            }
        }
    }

    fn push_background(&mut self, background: &gherkin::Background, parent: usize) {
        let node = SourceNode::new(
            SourceKind::Background,
            &background.keyword,
            "",
            background.position.line,
        );
        let idx = self.push(node, Some(parent));
        self.push_steps(&background.steps, idx);
    }

    fn push_scenario(&mut self, scenario: &gherkin::Scenario, parent: usize, lines: &[&str]) {
        let outline = scenario.keyword.contains("Outline")
            || scenario.keyword.contains("Template")
            || !scenario.examples.is_empty();
        let mut node = SourceNode::new(
            SourceKind::Scenario { outline },
            &scenario.keyword,
            &scenario.name,
            scenario.position.line,
        );
        node.description.clone_from(&scenario.description);
        node.tags = normalise_tags(&scenario.tags);
        let idx = self.push(node, Some(parent));
        self.push_steps(&scenario.steps, idx);
        for examples in &scenario.examples {
            self.push_examples(examples, idx, lines);
        }
    }

    fn push_steps(&mut self, steps: &[gherkin::Step], parent: usize) {
        for step in steps {
            let mut node =
                SourceNode::new(SourceKind::Step, &step.keyword, &step.value, step.position.line);
            node.argument = step_argument(step);
            self.push(node, Some(parent));
        }
    }

    fn push_examples(&mut self, examples: &gherkin::Examples, parent: usize, lines: &[&str]) {
        let keyword_line = examples.position.line;
        let (keyword, name) = lines
            .get(keyword_line.saturating_sub(1))
            .map_or_else(|| (examples.keyword.clone(), String::new()), |line| {
                split_keyword_line(line)
            });
        let rows = examples
            .table
            .as_ref()
            .map(|table| table.rows.clone())
            .unwrap_or_default();

        let mut node = SourceNode::new(SourceKind::Examples, &keyword, &name, keyword_line);
        node.tags = normalise_tags(&examples.tags);
        node.rows.clone_from(&rows);
        let idx = self.push(node, Some(parent));

        let row_lines = table_row_lines(lines, keyword_line);
        for (cells, line) in rows.into_iter().zip(row_lines).skip(1) {
            let mut row = SourceNode::new(SourceKind::ExampleRow, "", "", line);
            row.rows = vec![cells];
            self.push(row, Some(idx));
        }
    }

    /// A node ends one line before its next sibling starts, or where its
    /// parent ends. Example rows occupy a single line.
    fn assign_end_lines(&mut self, last_line: usize) {
        for idx in 0..self.nodes.len() {
            let Some(node) = self.nodes.get(idx) else {
                continue;
            };
            if node.kind == SourceKind::ExampleRow {
                continue;
            }
            let parent_end = node
                .parent
                .and_then(|p| self.nodes.get(p))
                .map_or(last_line, |p| p.end_line);
            let next_sibling_start = self
                .nodes
                .iter()
                .filter(|other| other.parent == node.parent && other.start_line > node.start_line)
                .map(|other| other.start_line)
                .min();
            let end = next_sibling_start
                .map_or(parent_end, |start| start.saturating_sub(1))
                .max(node.start_line);
            if let Some(node) = self.nodes.get_mut(idx) {
                node.end_line = end;
            }
        }
    }
}
