//! Shared fixtures for gherkin-report behavioural tests.

use gherkin_report::{Event, ExecutionContext, Reporter, TestCase};

/// URI of the checkout feature.
pub const CHECKOUT_URI: &str = "file:features/checkout.feature";

/// A feature with a background, a plain scenario and an outline with two
/// Examples blocks.
///
/// Line map: background step 5, scenario 8, outline 14, Drinks rows 20-21,
/// Cakes row 25.
pub const CHECKOUT: &str = concat!(
    "@billing\n",
    "Feature: Checkout\n",
    "\n",
    "  Background:\n",
    "    Given a logged in user\n",
    "\n",
    "  @smoke\n",
    "  Scenario: Pay by card\n",
    "    Given a cart with \"tea\"\n",
    "    When I pay with:\n",
    "      | card | 4111 |\n",
    "    Then I see a receipt\n",
    "\n",
    "  Scenario Outline: Price lookup\n",
    "    Given an item <item>\n",
    "    Then it costs <price>\n",
    "\n",
    "    Examples: Drinks\n",
    "      | item | price |\n",
    "      | tea  | 2     |\n",
    "      | cafe | 3     |\n",
    "\n",
    "    Examples: Cakes\n",
    "      | item | price |\n",
    "      | tart | 4     |\n",
);

/// Event announcing the checkout source.
pub fn checkout_source() -> Event {
    Event::SourceRead {
        uri: CHECKOUT_URI.to_string(),
        source: CHECKOUT.to_string(),
    }
}

/// Event starting the checkout case declared at `line`.
pub fn checkout_case(line: usize, name: &str) -> Event {
    Event::CaseStarted(TestCase::new(CHECKOUT_URI, line, name))
}

/// Dispatch `events` in order, failing the test on the first error.
pub fn feed(
    reporter: &Reporter,
    ctx: &mut ExecutionContext,
    events: impl IntoIterator<Item = Event>,
) {
    for event in events {
        if let Err(err) = reporter.dispatch(ctx, event) {
            panic!("dispatch failed: {err}");
        }
    }
}
