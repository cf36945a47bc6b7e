//! Line-addressed index over parsed feature sources.
//!
//! Runtime events only carry a file URI and a line number. The index maps
//! that pair back to the Gherkin construct it came from, together with the
//! chain of enclosing constructs (step, scenario, rule, feature).
//!
//! Each file is parsed once into an arena of [`SourceNode`]s. Nodes refer to
//! their parent by index, so walking up from a step to its feature is a walk
//! along a short integer chain.

mod build;
mod node;

use std::sync::{Arc, PoisonError, RwLock};

use hashbrown::HashMap;
use tracing::debug;

pub use node::{SourceKind, SourceNode};

use crate::error::SourceError;

/// Identity of an Examples block: its file and keyword line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExamplesId {
    /// URI of the file declaring the block.
    pub uri: String,
    /// 1-based line of the `Examples:` keyword.
    pub line: usize,
}

/// Metadata of a parsed feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureInfo {
    /// URI of the file declaring the feature.
    pub uri: String,
    /// Feature name.
    pub name: String,
    /// Feature description, when present.
    pub description: Option<String>,
    /// Feature tags with `@` prefixes.
    pub tags: Vec<String>,
}

/// The arena for one parsed file.
#[derive(Debug)]
pub struct ParsedSource {
    uri: String,
    nodes: Vec<SourceNode>,
}

impl ParsedSource {
    /// URI the source was read from.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Node at `index`.
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&SourceNode> {
        self.nodes.get(index)
    }

    /// The feature node at the root of the arena.
    #[must_use]
    pub fn feature(&self) -> Option<&SourceNode> {
        self.nodes.first()
    }

    /// Indices of `index` and its ancestors, innermost first.
    pub fn chain(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(
            self.nodes.get(index).map(|_| index),
            move |current| self.nodes.get(*current).and_then(|n| n.parent),
        )
    }

    /// Indices of the direct children of `index`, in source order.
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.parent == Some(index))
            .map(|(idx, _)| idx)
    }

    /// Resolve `line` to a node: an exact keyword-line hit first, otherwise
    /// the innermost node whose range contains the line.
    #[must_use]
    pub fn locate(&self, line: usize) -> Option<usize> {
        self.deepest(|node| node.start_line == line)
            .or_else(|| self.deepest(|node| node.contains_line(line)))
    }

    fn deepest(&self, wanted: impl Fn(&SourceNode) -> bool) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| wanted(*node))
            .max_by_key(|(_, node)| node.depth)
            .map(|(idx, _)| idx)
    }

    fn feature_info(&self) -> Option<FeatureInfo> {
        self.feature().map(|feature| FeatureInfo {
            uri: self.uri.clone(),
            name: feature.name.clone(),
            description: feature.description.clone(),
            tags: feature.tags.clone(),
        })
    }
}

/// Result of a successful [`SourceIndex::lookup`].
///
/// Classification queries answer against the chain captured at lookup
/// time, so a later re-read of the file does not affect an existing match.
#[derive(Debug, Clone)]
pub struct SourceMatch {
    source: Arc<ParsedSource>,
    index: usize,
}

impl SourceMatch {
    /// The resolved node.
    #[must_use]
    pub fn node(&self) -> Option<&SourceNode> {
        self.source.node(self.index)
    }

    /// The parsed file the match belongs to.
    #[must_use]
    pub fn source(&self) -> &ParsedSource {
        &self.source
    }

    fn nearest(&self, wanted: impl Fn(&SourceNode) -> bool) -> Option<(usize, &SourceNode)> {
        self.source
            .chain(self.index)
            .filter_map(|idx| self.source.node(idx).map(|node| (idx, node)))
            .find(|(_, node)| wanted(*node))
    }

    /// The enclosing scenario or outline definition.
    #[must_use]
    pub fn scenario_definition(&self) -> Option<&SourceNode> {
        self.nearest(|node| matches!(node.kind, SourceKind::Scenario { .. }))
            .map(|(_, node)| node)
    }

    /// Whether the enclosing scenario definition is an outline.
    #[must_use]
    pub fn is_outline_scenario(&self) -> bool {
        self.scenario_definition().is_some_and(SourceNode::is_outline)
    }

    /// The enclosing background.
    #[must_use]
    pub fn background(&self) -> Option<&SourceNode> {
        self.nearest(|node| node.kind == SourceKind::Background)
            .map(|(_, node)| node)
    }

    /// Whether the resolved node is a step declared in a background.
    #[must_use]
    pub fn is_background_step(&self) -> bool {
        let Some(node) = self.node() else {
            return false;
        };
        node.kind == SourceKind::Step
            && node
                .parent
                .and_then(|parent| self.source.node(parent))
                .is_some_and(|parent| parent.kind == SourceKind::Background)
    }

    /// The resolved step definition, if the match is a step.
    #[must_use]
    pub fn step_definition(&self) -> Option<&SourceNode> {
        self.node().filter(|node| node.kind == SourceKind::Step)
    }

    /// The enclosing Examples block and its identity.
    #[must_use]
    pub fn examples(&self) -> Option<(ExamplesId, &SourceNode)> {
        self.nearest(|node| node.kind == SourceKind::Examples)
            .map(|(_, node)| {
                let id = ExamplesId {
                    uri: self.source.uri.clone(),
                    line: node.start_line,
                };
                (id, node)
            })
    }

    /// Steps declared directly under the enclosing scenario definition.
    pub fn scenario_steps(&self) -> impl Iterator<Item = &SourceNode> + '_ {
        let scenario = self
            .nearest(|node| matches!(node.kind, SourceKind::Scenario { .. }))
            .map(|(idx, _)| idx);
        scenario
            .into_iter()
            .flat_map(|idx| self.source.children(idx))
            .filter_map(|idx| self.source.node(idx))
            .filter(|node| node.kind == SourceKind::Step)
    }
}

/// Cache of parsed feature sources keyed by URI.
///
/// Reads vastly outnumber writes, so the map sits behind a `RwLock`. Two
/// contexts racing to index the same file both parse it; the last write
/// wins, which is harmless because the parses are equivalent.
#[derive(Debug, Default)]
pub struct SourceIndex {
    files: RwLock<HashMap<String, Arc<ParsedSource>>>,
}

impl SourceIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` and store it under `uri`, replacing any prior parse.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Parse`] when the text is not valid Gherkin.
    /// Any earlier parse for `uri` is dropped, so later lookups against the
    /// file report no match.
    pub fn add_source_read(&self, uri: &str, text: &str) -> Result<(), SourceError> {
        let parsed = build::parse(uri, text);
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        match parsed {
            Ok(parsed) => {
                debug!(uri, nodes = parsed.nodes.len(), "indexed feature source");
                files.insert(uri.to_owned(), Arc::new(parsed));
                Ok(())
            }
            Err(err) => {
                files.remove(uri);
                Err(err)
            }
        }
    }

    fn get(&self, uri: &str) -> Option<Arc<ParsedSource>> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files.get(uri).cloned()
    }

    /// Whether `uri` has a successful parse on record.
    #[must_use]
    pub fn contains(&self, uri: &str) -> bool {
        self.get(uri).is_some()
    }

    /// Resolve `line` in `uri` to the construct declared there.
    ///
    /// Returns `None` if the file was never read, failed to parse, or the
    /// line lies outside every construct. Hook steps have no source line and
    /// always land here.
    #[must_use]
    pub fn lookup(&self, uri: &str, line: usize) -> Option<SourceMatch> {
        let source = self.get(uri)?;
        let index = source.locate(line)?;
        Some(SourceMatch { source, index })
    }

    /// Feature metadata for `uri`.
    #[must_use]
    pub fn feature(&self, uri: &str) -> Option<FeatureInfo> {
        self.get(uri)?.feature_info()
    }
}

#[cfg(test)]
mod tests;
