//! Diagnostic logging for the reporter.
//!
//! Diagnostics go to stderr so they never interleave with the test runner's
//! own progress output on stdout.

use tracing_subscriber::EnvFilter;

use crate::config::ReporterConfig;

const CRATE_TARGETS: [&str; 2] = ["gherkin_report", "gherkin_report_tree"];

/// Build a filter that applies the configured level to the reporter crates
/// and keeps everything else at `warn`.
fn filter_from_config(config: &ReporterConfig) -> EnvFilter {
    let level = config.log_level.as_filter_str();
    let directives = CRATE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .fold(String::from("warn"), |acc, directive| acc + "," + &directive);
    EnvFilter::new(directives)
}

/// Install a global tracing subscriber for the reporter.
///
/// A subscriber already installed by the embedding runner wins; the call is
/// then a no-op.
pub fn init_logging(config: &ReporterConfig) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_from_config(config))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(false)
        .with_line_number(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
