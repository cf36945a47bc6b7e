//! JSON writer for report trees.
//!
//! The writer serialises a snapshot into a predictable, machine-readable
//! shape. Node kinds and statuses are lowercase so downstream tools can rely
//! on consistent casing.

use std::io::Write;

use serde::Serialize;

use crate::NodeSnapshot;

#[derive(Serialize)]
struct JsonReport<'a> {
    features: &'a [NodeSnapshot],
}

/// Serialise the provided nodes into the supplied writer.
///
/// # Examples
/// ```rust
/// use gherkin_report_tree::{json, MemoryReport, NodeKind, ReportModel};
///
/// let report = MemoryReport::new();
/// report.create_node(NodeKind::Feature, "Checkout", None);
/// let mut buffer = Vec::new();
/// json::write(&mut buffer, &report.snapshot()).unwrap();
/// let output = String::from_utf8(buffer).unwrap();
/// assert!(output.contains("\"status\":\"pass\""));
/// ```
///
/// # Errors
/// Returns an error when serialisation of the provided nodes fails.
pub fn write<W: Write>(writer: &mut W, nodes: &[NodeSnapshot]) -> serde_json::Result<()> {
    serde_json::to_writer(writer, &JsonReport { features: nodes })
}

/// Produce a JSON string representation of the provided nodes.
///
/// # Examples
/// ```rust
/// use gherkin_report_tree::{json, MemoryReport, NodeKind, ReportModel};
///
/// let report = MemoryReport::new();
/// report.create_node(NodeKind::Feature, "Checkout", None);
/// let json = json::to_string(&report.snapshot()).unwrap();
/// assert!(json.contains("\"name\":\"Checkout\""));
/// ```
///
/// # Errors
/// Returns an error when serialising the provided nodes fails.
pub fn to_string(nodes: &[NodeSnapshot]) -> serde_json::Result<String> {
    serde_json::to_string(&JsonReport { features: nodes })
}
