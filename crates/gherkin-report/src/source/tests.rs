//! Tests for the source index.

use super::*;
use crate::event::StepArgument;
use rstest::{fixture, rstest};

const CHECKOUT_URI: &str = "file:features/checkout.feature";

const CHECKOUT: &str = concat!(
    "@billing\n",
    "Feature: Checkout\n",
    "  Paying for items.\n",
    "\n",
    "  Background:\n",
    "    Given a logged in user\n",
    "\n",
    "  Scenario: Pay by card\n",
    "    Given a cart with \"tea\"\n",
    "    When I pay with:\n",
    "      | card | 4111 |\n",
    "    Then I see a receipt\n",
    "\n",
    "  @pricing\n",
    "  Scenario Outline: Price lookup\n",
    "    Given an item <item>\n",
    "    Then it costs <price>\n",
    "\n",
    "    Examples: Drinks\n",
    "      | item | price |\n",
    "      | tea  | 2     |\n",
    "      | cafe | 3     |\n",
    "\n",
    "    Examples:\n",
    "      | item | price |\n",
    "      | cake | 4     |",
);

#[fixture]
fn index() -> SourceIndex {
    let index = SourceIndex::new();
    if let Err(err) = index.add_source_read(CHECKOUT_URI, CHECKOUT) {
        panic!("checkout feature should parse: {err}");
    }
    index
}

fn lookup(index: &SourceIndex, line: usize) -> SourceMatch {
    let Some(found) = index.lookup(CHECKOUT_URI, line) else {
        panic!("line {line} should resolve");
    };
    found
}

#[rstest]
fn feature_metadata_is_available(index: SourceIndex) {
    let Some(feature) = index.feature(CHECKOUT_URI) else {
        panic!("feature should be indexed");
    };
    assert_eq!(feature.name, "Checkout");
    assert_eq!(feature.tags, vec!["@billing"]);
    assert!(
        feature
            .description
            .as_deref()
            .is_some_and(|text| text.contains("Paying for items."))
    );
}

#[rstest]
fn background_steps_are_classified(index: SourceIndex) {
    let found = lookup(&index, 6);
    assert!(found.is_background_step());
    assert!(found.background().is_some());
    assert!(found.scenario_definition().is_none());
    assert_eq!(
        found.step_definition().map(SourceNode::name),
        Some("a logged in user")
    );
}

#[rstest]
fn scenario_line_resolves_to_plain_scenario(index: SourceIndex) {
    let found = lookup(&index, 8);
    assert!(!found.is_outline_scenario());
    assert_eq!(
        found.scenario_definition().map(SourceNode::name),
        Some("Pay by card")
    );
    assert!(found.step_definition().is_none());
}

#[rstest]
fn table_lines_resolve_to_their_step(index: SourceIndex) {
    let found = lookup(&index, 11);
    let Some(step) = found.step_definition() else {
        panic!("table line should resolve to its step");
    };
    assert_eq!(step.start_line(), 10);
    assert_eq!(step.keyword().trim(), "When");
    assert_eq!(
        step.argument(),
        Some(&StepArgument::DataTable(vec![vec![
            "card".to_string(),
            "4111".to_string()
        ]]))
    );
    assert!(!found.is_background_step());
}

#[rstest]
fn example_rows_resolve_to_outline_and_examples(index: SourceIndex) {
    let found = lookup(&index, 21);
    assert_eq!(found.node().map(SourceNode::kind), Some(SourceKind::ExampleRow));
    assert!(found.is_outline_scenario());
    let Some(outline) = found.scenario_definition() else {
        panic!("row should belong to an outline");
    };
    assert_eq!(outline.name(), "Price lookup");
    assert_eq!(outline.tags(), ["@pricing"]);

    let Some((id, examples)) = found.examples() else {
        panic!("row should belong to an Examples block");
    };
    assert_eq!(
        id,
        ExamplesId {
            uri: CHECKOUT_URI.to_string(),
            line: 19
        }
    );
    assert_eq!(examples.name(), "Drinks");
    assert_eq!(examples.keyword(), "Examples");
    assert_eq!(examples.rows().len(), 3);
}

#[rstest]
#[case::feature(2, SourceKind::Feature, 26)]
#[case::background(5, SourceKind::Background, 7)]
#[case::scenario_runs_to_next_tag_line(8, SourceKind::Scenario { outline: false }, 14)]
#[case::step_covers_its_table(10, SourceKind::Step, 11)]
#[case::last_step_ends_with_scenario(12, SourceKind::Step, 14)]
#[case::outline_runs_to_feature_end(15, SourceKind::Scenario { outline: true }, 26)]
#[case::examples_end_before_next_block(19, SourceKind::Examples, 23)]
#[case::example_row_is_one_line(21, SourceKind::ExampleRow, 21)]
fn construct_ranges_follow_layout(
    index: SourceIndex,
    #[case] line: usize,
    #[case] kind: SourceKind,
    #[case] end_line: usize,
) {
    let found = lookup(&index, line);
    let Some(node) = found.node() else {
        panic!("line {line} should resolve to a node");
    };
    assert_eq!(node.kind(), kind);
    assert_eq!(node.start_line(), line);
    assert_eq!(node.end_line(), end_line);
}

#[rstest]
fn unnamed_examples_have_distinct_identity(index: SourceIndex) {
    let first = lookup(&index, 22).examples().map(|(id, _)| id);
    let second = lookup(&index, 26).examples().map(|(id, node)| (id, node.name().to_owned()));
    let Some((second_id, second_name)) = second else {
        panic!("second block should resolve");
    };
    assert_eq!(second_id.line, 24);
    assert_eq!(second_name, "");
    assert_ne!(first, Some(second_id));
}

#[rstest]
fn outline_steps_are_listed_in_order(index: SourceIndex) {
    let found = lookup(&index, 21);
    let steps: Vec<&str> = found.scenario_steps().map(SourceNode::name).collect();
    assert_eq!(steps, vec!["an item <item>", "it costs <price>"]);
}

#[rstest]
#[case::before_feature(1)]
#[case::past_end(100)]
fn lines_outside_any_construct_are_unresolved(index: SourceIndex, #[case] line: usize) {
    assert!(index.lookup(CHECKOUT_URI, line).is_none());
}

#[rstest]
fn unknown_files_are_unresolved(index: SourceIndex) {
    assert!(index.lookup("file:features/missing.feature", 2).is_none());
    assert!(index.feature("file:features/missing.feature").is_none());
}

#[rstest]
fn parse_failure_drops_prior_entry(index: SourceIndex) {
    let result = index.add_source_read(CHECKOUT_URI, "this is not gherkin\n");
    assert!(matches!(result, Err(SourceError::Parse { .. })));
    assert!(!index.contains(CHECKOUT_URI));
    assert!(index.lookup(CHECKOUT_URI, 8).is_none());
}

#[rstest]
fn rereading_replaces_the_parse(index: SourceIndex) {
    let renamed = CHECKOUT.replace("Feature: Checkout", "Feature: Basket");
    assert!(index.add_source_read(CHECKOUT_URI, &renamed).is_ok());
    assert_eq!(
        index.feature(CHECKOUT_URI).map(|feature| feature.name),
        Some("Basket".to_string())
    );
}

#[test]
fn rules_sit_between_feature_and_scenarios() {
    let index = SourceIndex::new();
    let text = concat!(
        "Feature: Rules\n",
        "\n",
        "  Rule: Discounts\n",
        "    Background:\n",
        "      Given a member\n",
        "\n",
        "    Scenario: Member discount\n",
        "      Then the price drops\n",
    );
    assert!(index.add_source_read("file:rules.feature", text).is_ok());

    let Some(found) = index.lookup("file:rules.feature", 8) else {
        panic!("rule step should resolve");
    };
    assert_eq!(found.node().map(SourceNode::depth), Some(3));
    let kinds: Vec<SourceKind> = found
        .source()
        .chain(3)
        .filter_map(|idx| found.source().node(idx))
        .map(SourceNode::kind)
        .collect();
    assert_eq!(
        kinds,
        vec![SourceKind::Step, SourceKind::Background, SourceKind::Rule, SourceKind::Feature]
    );
    assert!(
        index
            .lookup("file:rules.feature", 5)
            .is_some_and(|found| found.is_background_step())
    );
}
