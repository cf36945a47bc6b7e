//! In-memory [`ReportModel`] backend.
//!
//! `MemoryReport` keeps every node in a map keyed by [`NodeId`] behind a
//! single mutex. Readers take owned [`NodeSnapshot`] trees so rendering never
//! holds the lock. Configured [`ReportOutput`]s are written on
//! [`ReportModel::flush`].

use std::sync::{Mutex, MutexGuard};

use camino::{Utf8Path, Utf8PathBuf};
use hashbrown::HashMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::model::{LogEntry, MediaRef, NodeId, NodeKind, Outcome, ReportModel};
use crate::{TreeError, json, junit};

/// Destination written when the report is flushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutput {
    /// JSON tree written to the given path.
    Json(Utf8PathBuf),
    /// `JUnit` XML written to the given path.
    Junit(Utf8PathBuf),
}

impl ReportOutput {
    /// Destination path of the output.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Json(path) | Self::Junit(path) => path,
        }
    }
}

#[derive(Debug)]
struct NodeRecord {
    kind: NodeKind,
    name: String,
    description: Option<String>,
    tags: Vec<String>,
    logs: Vec<LogEntry>,
    media: Vec<MediaRef>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeRecord {
    fn new(kind: NodeKind, name: &str, description: Option<&str>, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            name: name.to_owned(),
            description: description.map(str::to_owned),
            tags: Vec::new(),
            logs: Vec::new(),
            media: Vec::new(),
            parent,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct TreeState {
    next_id: u64,
    nodes: HashMap<NodeId, NodeRecord>,
    roots: Vec<NodeId>,
}

impl TreeState {
    fn allocate(&mut self) -> NodeId {
        self.next_id = self.next_id.saturating_add(1);
        NodeId::new(self.next_id)
    }

    fn snapshot(&self, id: NodeId) -> Option<NodeSnapshot> {
        let record = self.nodes.get(&id)?;
        let children: Vec<NodeSnapshot> = record
            .children
            .iter()
            .filter_map(|child| self.snapshot(*child))
            .collect();
        let own = record
            .logs
            .iter()
            .map(|entry| entry.status)
            .filter(|status| *status != Outcome::Info);
        let status = own
            .chain(children.iter().map(|child| child.status))
            .max()
            .unwrap_or(Outcome::Pass);
        Some(NodeSnapshot {
            id,
            kind: record.kind,
            name: record.name.clone(),
            description: record.description.clone(),
            tags: record.tags.clone(),
            status,
            logs: record.logs.clone(),
            media: record.media.clone(),
            children,
        })
    }

    fn remove(&mut self, id: NodeId) {
        let Some(record) = self.nodes.remove(&id) else {
            return;
        };
        match record.parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            Some(parent) => parent.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }
        let mut pending = record.children;
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.nodes.remove(&child) {
                pending.extend(removed.children);
            }
        }
    }
}

/// Owned view of a node and its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSnapshot {
    /// Handle of the node.
    #[serde(skip)]
    pub id: NodeId,
    /// Node kind.
    pub kind: NodeKind,
    /// Display name.
    pub name: String,
    /// Description, including any appended markup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags in assignment order.
    pub tags: Vec<String>,
    /// Status derived from the node's logs and children.
    pub status: Outcome,
    /// Log history in insertion order.
    pub logs: Vec<LogEntry>,
    /// Node-level screen captures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaRef>,
    /// Child nodes in creation order.
    pub children: Vec<Self>,
}

impl NodeSnapshot {
    /// Depth-first iterator over this node and its descendants.
    pub fn descendants(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

/// Thread-safe in-memory report tree.
///
/// # Examples
///
/// ```
/// use gherkin_report_tree::{MemoryReport, NodeKind, ReportModel};
///
/// let report = MemoryReport::new();
/// let feature = report.create_node(NodeKind::Feature, "Checkout", None);
/// let scenario = report.create_child_node(feature, NodeKind::Scenario, "pay", None);
/// assert_eq!(report.children(feature), vec![scenario]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryReport {
    state: Mutex<TreeState>,
    outputs: Vec<ReportOutput>,
}

impl MemoryReport {
    /// Create an empty report without outputs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty report that writes the given outputs on flush.
    #[must_use]
    pub fn with_outputs(outputs: Vec<ReportOutput>) -> Self {
        Self {
            state: Mutex::new(TreeState::default()),
            outputs,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TreeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Configured outputs.
    #[must_use]
    pub fn outputs(&self) -> &[ReportOutput] {
        &self.outputs
    }

    /// Snapshot every top-level node and its subtree.
    #[must_use]
    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        let state = self.lock();
        state
            .roots
            .iter()
            .filter_map(|root| state.snapshot(*root))
            .collect()
    }

    /// Snapshot a single node, if it still exists.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<NodeSnapshot> {
        self.lock().snapshot(id)
    }

    /// Whether the node exists in the tree.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.lock().nodes.contains_key(&id)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().nodes.is_empty()
    }

    /// Handles of the top-level nodes.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.lock().roots.clone()
    }

    /// Handles of the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.lock()
            .nodes
            .get(&id)
            .map(|record| record.children.clone())
            .unwrap_or_default()
    }

    /// Log history of a node.
    #[must_use]
    pub fn logs(&self, id: NodeId) -> Vec<LogEntry> {
        self.lock()
            .nodes
            .get(&id)
            .map(|record| record.logs.clone())
            .unwrap_or_default()
    }

    /// Tags assigned to a node.
    #[must_use]
    pub fn tags(&self, id: NodeId) -> Vec<String> {
        self.lock()
            .nodes
            .get(&id)
            .map(|record| record.tags.clone())
            .unwrap_or_default()
    }

    /// Display name of a node.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<String> {
        self.lock().nodes.get(&id).map(|record| record.name.clone())
    }

    /// Kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.lock().nodes.get(&id).map(|record| record.kind)
    }

    /// Count live nodes of the given kind whose name matches.
    #[must_use]
    pub fn count_named(&self, kind: NodeKind, name: &str) -> usize {
        self.lock()
            .nodes
            .values()
            .filter(|record| record.kind == kind && record.name == name)
            .count()
    }

    fn write_output(output: &ReportOutput, snapshot: &[NodeSnapshot]) -> Result<(), TreeError> {
        let rendered = match output {
            ReportOutput::Json(_) => json::to_string(snapshot)?,
            ReportOutput::Junit(_) => {
                let mut buffer = String::new();
                junit::write(&mut buffer, snapshot)?;
                buffer
            }
        };
        let path = output.path();
        let write_err = |source| TreeError::Write {
            path: path.to_owned(),
            source,
        };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, rendered).map_err(write_err)?;
        info!(path = %path, "report written");
        Ok(())
    }
}

impl ReportModel for MemoryReport {
    fn create_node(&self, kind: NodeKind, name: &str, description: Option<&str>) -> NodeId {
        let mut state = self.lock();
        let id = state.allocate();
        state
            .nodes
            .insert(id, NodeRecord::new(kind, name, description, None));
        state.roots.push(id);
        id
    }

    fn create_child_node(
        &self,
        parent: NodeId,
        kind: NodeKind,
        name: &str,
        description: Option<&str>,
    ) -> NodeId {
        let mut state = self.lock();
        let id = state.allocate();
        let attached = state.nodes.get_mut(&parent).map(|record| record.children.push(id));
        if attached.is_some() {
            state
                .nodes
                .insert(id, NodeRecord::new(kind, name, description, Some(parent)));
        } else {
            debug!(%parent, name, "parent node missing; creating top-level node");
            state
                .nodes
                .insert(id, NodeRecord::new(kind, name, description, None));
            state.roots.push(id);
        }
        id
    }

    fn description(&self, node: NodeId) -> Option<String> {
        self.lock()
            .nodes
            .get(&node)
            .and_then(|record| record.description.clone())
    }

    fn set_description(&self, node: NodeId, text: &str) {
        if let Some(record) = self.lock().nodes.get_mut(&node) {
            record.description = Some(text.to_owned());
        }
    }

    fn assign_tag(&self, node: NodeId, tag: &str) {
        if let Some(record) = self.lock().nodes.get_mut(&node) {
            if !record.tags.iter().any(|existing| existing == tag) {
                record.tags.push(tag.to_owned());
            }
        }
    }

    fn log(&self, node: NodeId, entry: LogEntry) {
        if let Some(record) = self.lock().nodes.get_mut(&node) {
            record.logs.push(entry);
        }
    }

    fn add_screen_capture(&self, node: NodeId, media: MediaRef) {
        if let Some(record) = self.lock().nodes.get_mut(&node) {
            record.media.push(media);
        }
    }

    fn has_log(&self, node: NodeId) -> bool {
        self.lock()
            .nodes
            .get(&node)
            .is_some_and(|record| !record.logs.is_empty())
    }

    fn last_log_status(&self, node: NodeId) -> Option<Outcome> {
        self.lock()
            .nodes
            .get(&node)
            .and_then(|record| record.logs.last())
            .map(|entry| entry.status)
    }

    fn has_screen_capture(&self, node: NodeId) -> bool {
        self.lock().nodes.get(&node).is_some_and(|record| {
            !record.media.is_empty() || record.logs.iter().any(LogEntry::is_screen_capture)
        })
    }

    fn remove_node(&self, node: NodeId) {
        self.lock().remove(node);
    }

    fn flush(&self) -> Result<(), TreeError> {
        if self.outputs.is_empty() {
            debug!("no report outputs configured");
            return Ok(());
        }
        let snapshot = self.snapshot();
        for output in &self.outputs {
            Self::write_output(output, &snapshot)?;
        }
        Ok(())
    }
}
