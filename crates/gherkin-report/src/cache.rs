//! Cross-context caches deduplicating feature and outline report nodes.
//!
//! Each cache sits behind its own mutex and every create-or-get runs to
//! completion under that lock, so two contexts racing on the same name
//! converge on a single report node.

use std::sync::{Mutex, MutexGuard};

use gherkin_report_tree::{NodeId, ReportModel};
use hashbrown::{HashMap, HashSet};

use crate::source::ExamplesId;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Feature name to report node.
#[derive(Debug, Default)]
pub(crate) struct FeatureCache {
    nodes: Mutex<HashMap<String, NodeId>>,
}

impl FeatureCache {
    /// Return the node cached for `name`, or run `create` and publish its
    /// result. The flag is `true` when `create` ran.
    pub(crate) fn get_or_create(
        &self,
        name: &str,
        create: impl FnOnce() -> NodeId,
    ) -> (NodeId, bool) {
        let mut nodes = lock(&self.nodes);
        if let Some(node) = nodes.get(name) {
            return (*node, false);
        }
        let node = create();
        nodes.insert(name.to_owned(), node);
        (node, true)
    }

    pub(crate) fn get(&self, name: &str) -> Option<NodeId> {
        lock(&self.nodes).get(name).copied()
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.nodes).len()
    }
}

#[derive(Debug)]
struct OutlineEntry {
    node: NodeId,
    seen_examples: HashSet<ExamplesId>,
}

/// Outline name to report node, plus the Examples blocks already rendered
/// into that outline's description.
#[derive(Debug, Default)]
pub(crate) struct OutlineCache {
    entries: Mutex<HashMap<String, OutlineEntry>>,
}

impl OutlineCache {
    /// Return the node cached for `name`, or run `create` and publish its
    /// result. The flag is `true` when `create` ran.
    pub(crate) fn get_or_create<E>(
        &self,
        name: &str,
        create: impl FnOnce() -> Result<NodeId, E>,
    ) -> Result<(NodeId, bool), E> {
        let mut entries = lock(&self.entries);
        if let Some(entry) = entries.get(name) {
            return Ok((entry.node, false));
        }
        let node = create()?;
        entries.insert(
            name.to_owned(),
            OutlineEntry {
                node,
                seen_examples: HashSet::new(),
            },
        );
        Ok((node, true))
    }

    /// Append the markup produced by `render` to the outline's description
    /// unless `examples` was already appended. Returns whether the
    /// description grew.
    ///
    /// The read-modify-write of the description happens under the cache
    /// lock.
    pub(crate) fn append_examples<E>(
        &self,
        name: &str,
        examples: &ExamplesId,
        report: &dyn ReportModel,
        render: impl FnOnce() -> Result<String, E>,
    ) -> Result<bool, E> {
        let mut entries = lock(&self.entries);
        let Some(entry) = entries.get_mut(name) else {
            return Ok(false);
        };
        if entry.seen_examples.contains(examples) {
            return Ok(false);
        }
        let markup = render()?;
        let mut description = report.description(entry.node).unwrap_or_default();
        description.push_str(&markup);
        report.set_description(entry.node, &description);
        entry.seen_examples.insert(examples.clone());
        Ok(true)
    }

    pub(crate) fn get(&self, name: &str) -> Option<NodeId> {
        lock(&self.entries).get(name).map(|entry| entry.node)
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests use explicit failures for clarity")]
mod tests {
    use super::*;
    use gherkin_report_tree::{MemoryReport, NodeKind};
    use std::convert::Infallible;

    #[test]
    fn feature_cache_creates_once_per_name() {
        let cache = FeatureCache::default();
        let (first, created) = cache.get_or_create("Checkout", || NodeId::new(1));
        assert!(created);
        let (second, created) = cache.get_or_create("Checkout", || NodeId::new(2));
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(cache.get("Checkout"), Some(NodeId::new(1)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn outline_creation_errors_are_not_cached() {
        let cache = OutlineCache::default();
        let result: Result<(NodeId, bool), &str> = cache.get_or_create("pay", || Err("ragged"));
        assert!(result.is_err());
        assert!(cache.get("pay").is_none());
    }

    #[test]
    fn examples_are_appended_once() {
        let report = MemoryReport::new();
        let cache = OutlineCache::default();
        let (outline, _) = cache
            .get_or_create::<Infallible>("pay", || {
                Ok(report.create_node(NodeKind::ScenarioOutline, "pay", Some("base")))
            })
            .expect("outline created");
        let id = ExamplesId {
            uri: "file:a.feature".to_string(),
            line: 7,
        };

        let grew = cache
            .append_examples::<Infallible>("pay", &id, &report, || Ok("<table/>".to_string()))
            .expect("append");
        assert!(grew);
        let grew = cache
            .append_examples::<Infallible>("pay", &id, &report, || Ok("<again/>".to_string()))
            .expect("append");
        assert!(!grew);
        assert_eq!(report.description(outline).as_deref(), Some("base<table/>"));
    }

    #[test]
    fn failed_render_leaves_examples_unseen() {
        let report = MemoryReport::new();
        let cache = OutlineCache::default();
        let _ = cache.get_or_create::<Infallible>("pay", || {
            Ok(report.create_node(NodeKind::ScenarioOutline, "pay", None))
        });
        let id = ExamplesId {
            uri: "file:a.feature".to_string(),
            line: 7,
        };
        let failed = cache.append_examples("pay", &id, &report, || Err("ragged"));
        assert_eq!(failed, Err("ragged"));
        let grew = cache
            .append_examples::<Infallible>("pay", &id, &report, || Ok("<table/>".to_string()))
            .expect("append");
        assert!(grew);
    }
}
