//! `JUnit` XML writer for report trees.
//!
//! Each top-level node becomes a `<testsuite>` and every scenario beneath it,
//! including scenarios grouped under outlines, becomes a `<testcase>`. Failed
//! and skipped scenarios carry a `<failure>` or `<skipped>` child whose
//! message is the first matching log text found in the scenario's steps.

use std::fmt::{self, Write};

use crate::escape::write_escaped;
use crate::{NodeKind, NodeSnapshot, Outcome};

/// Render the supplied nodes as a `JUnit` XML document.
///
/// # Examples
/// ```
/// use gherkin_report_tree::{junit, MemoryReport, NodeKind, ReportModel};
///
/// let report = MemoryReport::new();
/// let feature = report.create_node(NodeKind::Feature, "Checkout", None);
/// report.create_child_node(feature, NodeKind::Scenario, "pay", None);
/// let mut output = String::new();
/// junit::write(&mut output, &report.snapshot()).unwrap();
/// assert!(output.contains("<testcase name=\"pay\" classname=\"Checkout\" />"));
/// ```
///
/// # Errors
/// Returns an error if writing to the provided formatter fails.
pub fn write<W: Write>(writer: &mut W, nodes: &[NodeSnapshot]) -> fmt::Result {
    writer.write_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n")?;
    writer.write_str("<testsuites>\n")?;
    for suite in nodes {
        write_suite(writer, suite)?;
    }
    writer.write_str("</testsuites>\n")
}

fn write_suite<W: Write>(writer: &mut W, suite: &NodeSnapshot) -> fmt::Result {
    let scenarios: Vec<&NodeSnapshot> = suite
        .descendants()
        .filter(|node| node.kind == NodeKind::Scenario)
        .collect();
    let tests = scenarios.len();
    let failures = scenarios
        .iter()
        .filter(|node| node.status == Outcome::Fail)
        .count();
    let skipped = scenarios
        .iter()
        .filter(|node| node.status == Outcome::Skip)
        .count();
    writer.write_str("  <testsuite name=\"")?;
    write_escaped(writer, &suite.name)?;
    writeln!(
        writer,
        "\" tests=\"{tests}\" failures=\"{failures}\" skipped=\"{skipped}\">",
    )?;
    for scenario in scenarios {
        write_case(writer, &suite.name, scenario)?;
    }
    writer.write_str("  </testsuite>\n")
}

fn write_case<W: Write>(writer: &mut W, classname: &str, scenario: &NodeSnapshot) -> fmt::Result {
    writer.write_str("    <testcase name=\"")?;
    write_escaped(writer, &scenario.name)?;
    writer.write_str("\" classname=\"")?;
    write_escaped(writer, classname)?;
    writer.write_char('"')?;
    let element = match scenario.status {
        Outcome::Fail => "failure",
        Outcome::Skip => "skipped",
        Outcome::Pass | Outcome::Info => return writer.write_str(" />\n"),
    };
    writer.write_str(">\n")?;
    write!(writer, "      <{element}")?;
    if let Some(message) = first_message(scenario, scenario.status) {
        writer.write_str(" message=\"")?;
        write_escaped(writer, message)?;
        writer.write_char('"')?;
    }
    writer.write_str(" />\n")?;
    writer.write_str("    </testcase>\n")
}

fn first_message(scenario: &NodeSnapshot, status: Outcome) -> Option<&str> {
    scenario
        .descendants()
        .flat_map(|node| node.logs.iter())
        .filter(|entry| entry.status == status)
        .find_map(|entry| entry.text_content().filter(|text| !text.is_empty()))
}
