//! Reporter configuration.
//!
//! Settings are layered from lowest to highest precedence: built-in
//! defaults, a `key=value` properties file, environment variables prefixed
//! with `GHERKIN_REPORT_`, and explicit overrides supplied by the embedding
//! runner.

use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use gherkin_report_tree::ReportOutput;

use crate::error::ReportError;

/// Log level enumeration matching tracing crate levels.
///
/// Defaults to `Info` when not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Most verbose logging, includes all trace spans.
    Trace,
    /// Debug-level information for development.
    Debug,
    /// Standard informational messages.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for failures.
    Error,
}

impl FromStr for LogLevel {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ReportError::InvalidConfig(format!(
                "unknown log level '{s}', expected one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Default directory receiving embedded attachments.
pub const DEFAULT_SCREENSHOT_DIR: &str = "test-output/";

const ENV_SCREENSHOT_DIR: &str = "GHERKIN_REPORT_SCREENSHOT_DIR";
const ENV_SCREENSHOT_REL_PATH: &str = "GHERKIN_REPORT_SCREENSHOT_REL_PATH";
const ENV_LOG_LEVEL: &str = "GHERKIN_REPORT_LOG_LEVEL";
const ENV_JSON_OUT: &str = "GHERKIN_REPORT_JSON_OUT";
const ENV_JUNIT_OUT: &str = "GHERKIN_REPORT_JUNIT_OUT";

const PROP_SCREENSHOT_DIR: &str = "screenshot.dir";
const PROP_SCREENSHOT_REL_PATH: &str = "screenshot.rel.path";
const PROP_LOG_LEVEL: &str = "log.level";
const PROP_JSON_OUT: &str = "report.json.out";
const PROP_JUNIT_OUT: &str = "report.junit.out";

/// Configuration consumed by the reporter.
///
/// # Environment Variables
///
/// - `GHERKIN_REPORT_SCREENSHOT_DIR`: directory receiving embedded files
/// - `GHERKIN_REPORT_SCREENSHOT_REL_PATH`: prefix used when linking embedded
///   files from the report
/// - `GHERKIN_REPORT_LOG_LEVEL`: log level (trace, debug, info, warn, error)
/// - `GHERKIN_REPORT_JSON_OUT`: path of the JSON report written on flush
/// - `GHERKIN_REPORT_JUNIT_OUT`: path of the `JUnit` report written on flush
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterConfig {
    /// Directory receiving embedded attachments.
    pub screenshot_dir: Utf8PathBuf,
    /// Prefix prepended to attachment file names in the report.
    pub screenshot_rel_path: String,
    /// Log level.
    pub log_level: LogLevel,
    /// JSON report destination.
    pub json_out: Option<Utf8PathBuf>,
    /// `JUnit` report destination.
    pub junit_out: Option<Utf8PathBuf>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: Utf8PathBuf::from(DEFAULT_SCREENSHOT_DIR),
            screenshot_rel_path: DEFAULT_SCREENSHOT_DIR.to_owned(),
            log_level: LogLevel::default(),
            json_out: None,
            junit_out: None,
        }
    }
}

#[derive(Debug, Default)]
struct RawSettings {
    screenshot_dir: Option<String>,
    screenshot_rel_path: Option<String>,
    log_level: Option<String>,
    json_out: Option<String>,
    junit_out: Option<String>,
}

impl RawSettings {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            screenshot_dir: lookup(ENV_SCREENSHOT_DIR),
            screenshot_rel_path: lookup(ENV_SCREENSHOT_REL_PATH),
            log_level: lookup(ENV_LOG_LEVEL),
            json_out: lookup(ENV_JSON_OUT),
            junit_out: lookup(ENV_JUNIT_OUT),
        }
    }

    fn from_properties(text: &str) -> Self {
        let mut raw = Self::default();
        for (key, value) in parse_properties(text) {
            let slot = match key {
                PROP_SCREENSHOT_DIR => &mut raw.screenshot_dir,
                PROP_SCREENSHOT_REL_PATH => &mut raw.screenshot_rel_path,
                PROP_LOG_LEVEL => &mut raw.log_level,
                PROP_JSON_OUT => &mut raw.json_out,
                PROP_JUNIT_OUT => &mut raw.junit_out,
                _ => continue,
            };
            *slot = Some(value.to_owned());
        }
        raw
    }

    /// Fields set in `other` replace the corresponding fields in `self`.
    fn layer(self, other: Self) -> Self {
        Self {
            screenshot_dir: other.screenshot_dir.or(self.screenshot_dir),
            screenshot_rel_path: other.screenshot_rel_path.or(self.screenshot_rel_path),
            log_level: other.log_level.or(self.log_level),
            json_out: other.json_out.or(self.json_out),
            junit_out: other.junit_out.or(self.junit_out),
        }
    }

    fn resolve(self) -> Result<ReporterConfig, ReportError> {
        let screenshot_dir = non_empty(self.screenshot_dir)
            .map_or_else(|| Utf8PathBuf::from(DEFAULT_SCREENSHOT_DIR), Utf8PathBuf::from);
        let screenshot_rel_path =
            non_empty(self.screenshot_rel_path).unwrap_or_else(|| screenshot_dir.to_string());
        let log_level = match non_empty(self.log_level) {
            Some(value) => value.parse()?,
            None => LogLevel::default(),
        };
        Ok(ReporterConfig {
            screenshot_dir,
            screenshot_rel_path,
            log_level,
            json_out: non_empty(self.json_out).map(Utf8PathBuf::from),
            junit_out: non_empty(self.junit_out).map(Utf8PathBuf::from),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty() && v != "null")
}

/// Parse `key=value` (or `key: value`) lines, skipping `#` and `!` comments.
fn parse_properties(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.lines().filter_map(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            return None;
        }
        let (key, value) = line.split_once(['=', ':'])?;
        Some((key.trim(), value.trim()))
    })
}

impl ReporterConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidConfig` if a variable contains an invalid
    /// value.
    pub fn from_env() -> Result<Self, ReportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidConfig` if a variable contains an invalid
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ReportError> {
        RawSettings::from_lookup(lookup).resolve()
    }

    /// Load configuration from properties text, letting variables from
    /// `lookup` take precedence.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidConfig` if a value is invalid.
    pub fn from_properties_str(
        text: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ReportError> {
        RawSettings::from_properties(text)
            .layer(RawSettings::from_lookup(lookup))
            .resolve()
    }

    /// Load configuration from a properties file and the process
    /// environment. A missing file is treated as empty.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Io` if the file exists but cannot be read, or
    /// `ReportError::InvalidConfig` if a value is invalid.
    pub fn from_properties_file(path: &Utf8Path) -> Result<Self, ReportError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err.into()),
        };
        Self::from_properties_str(&text, |key| std::env::var(key).ok())
    }

    /// Apply optional overrides to an existing configuration.
    ///
    /// This is intended for runner-supplied values that should take
    /// precedence over environment-based defaults.
    #[must_use]
    pub fn apply_overrides(
        mut self,
        screenshot_dir: Option<Utf8PathBuf>,
        log_level: Option<LogLevel>,
    ) -> Self {
        if let Some(dir) = screenshot_dir {
            self.screenshot_dir = dir;
        }

        if let Some(level) = log_level {
            self.log_level = level;
        }

        self
    }

    /// Report files to write when the run finishes.
    #[must_use]
    pub fn report_outputs(&self) -> Vec<ReportOutput> {
        self.json_out
            .iter()
            .cloned()
            .map(ReportOutput::Json)
            .chain(self.junit_out.iter().cloned().map(ReportOutput::Junit))
            .collect()
    }

    /// Create a new configuration with the specified screenshot directory.
    ///
    /// The link prefix follows the directory.
    #[must_use]
    pub fn with_screenshot_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self.screenshot_rel_path = self.screenshot_dir.to_string();
        self
    }

    /// Create a new configuration with the specified link prefix.
    #[must_use]
    pub fn with_screenshot_rel_path(mut self, prefix: impl Into<String>) -> Self {
        self.screenshot_rel_path = prefix.into();
        self
    }

    /// Create a new configuration with the specified log level.
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn log_level_parses_valid_values() {
        assert_eq!("trace".parse::<LogLevel>().ok(), Some(LogLevel::Trace));
        assert_eq!("debug".parse::<LogLevel>().ok(), Some(LogLevel::Debug));
        assert_eq!("info".parse::<LogLevel>().ok(), Some(LogLevel::Info));
        assert_eq!("warning".parse::<LogLevel>().ok(), Some(LogLevel::Warn));
        assert_eq!("ERROR".parse::<LogLevel>().ok(), Some(LogLevel::Error));
    }

    #[test]
    fn log_level_rejects_invalid_values() {
        let result = "loud".parse::<LogLevel>();
        assert!(result.unwrap_err().to_string().contains("unknown log level"));
    }

    #[test]
    fn default_config_uses_test_output() {
        let config = ReporterConfig::default();
        assert_eq!(config.screenshot_dir, Utf8PathBuf::from("test-output/"));
        assert_eq!(config.screenshot_rel_path, "test-output/");
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.json_out.is_none());
    }

    #[test]
    fn empty_lookup_yields_defaults() {
        let config = ReporterConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ReporterConfig::default());
    }

    #[test]
    fn rel_path_falls_back_to_screenshot_dir() {
        let config = ReporterConfig::from_lookup(lookup_from(&[
            ("GHERKIN_REPORT_SCREENSHOT_DIR", "target/shots/"),
            ("GHERKIN_REPORT_SCREENSHOT_REL_PATH", ""),
        ]))
        .unwrap();
        assert_eq!(config.screenshot_dir, Utf8PathBuf::from("target/shots/"));
        assert_eq!(config.screenshot_rel_path, "target/shots/");
    }

    #[test]
    fn lookup_reads_every_setting() {
        let config = ReporterConfig::from_lookup(lookup_from(&[
            ("GHERKIN_REPORT_SCREENSHOT_DIR", "out/"),
            ("GHERKIN_REPORT_SCREENSHOT_REL_PATH", "../out/"),
            ("GHERKIN_REPORT_LOG_LEVEL", "debug"),
            ("GHERKIN_REPORT_JSON_OUT", "out/report.json"),
            ("GHERKIN_REPORT_JUNIT_OUT", "out/junit.xml"),
        ]))
        .unwrap();
        assert_eq!(config.screenshot_rel_path, "../out/");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.json_out, Some(Utf8PathBuf::from("out/report.json")));
        assert_eq!(config.junit_out, Some(Utf8PathBuf::from("out/junit.xml")));
    }

    #[test]
    fn report_outputs_follow_configured_paths() {
        let mut config = ReporterConfig::default();
        assert!(config.report_outputs().is_empty());
        config.json_out = Some(Utf8PathBuf::from("out/report.json"));
        config.junit_out = Some(Utf8PathBuf::from("out/junit.xml"));
        assert_eq!(
            config.report_outputs(),
            vec![
                ReportOutput::Json(Utf8PathBuf::from("out/report.json")),
                ReportOutput::Junit(Utf8PathBuf::from("out/junit.xml")),
            ]
        );
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let result =
            ReporterConfig::from_lookup(lookup_from(&[("GHERKIN_REPORT_LOG_LEVEL", "chatty")]));
        assert!(matches!(result, Err(ReportError::InvalidConfig(_))));
    }

    #[test]
    fn environment_takes_precedence_over_properties() {
        let properties = concat!(
            "# reporter settings\n",
            "screenshot.dir = props/\n",
            "! legacy comment\n",
            "log.level: warn\n",
            "report.json.out=props/report.json\n",
            "unrelated.key=ignored\n",
        );
        let config = ReporterConfig::from_properties_str(
            properties,
            lookup_from(&[("GHERKIN_REPORT_SCREENSHOT_DIR", "env/")]),
        )
        .unwrap();
        assert_eq!(config.screenshot_dir, Utf8PathBuf::from("env/"));
        assert_eq!(config.screenshot_rel_path, "env/");
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.json_out, Some(Utf8PathBuf::from("props/report.json")));
    }

    #[test]
    fn missing_properties_file_is_treated_as_empty() {
        let config =
            ReporterConfig::from_properties_file(Utf8Path::new("does/not/exist.properties"));
        assert!(config.is_ok());
    }

    #[test]
    fn apply_overrides_updates_selected_fields() {
        let config = ReporterConfig::default()
            .apply_overrides(Some(Utf8PathBuf::from("shots/")), Some(LogLevel::Error));
        assert_eq!(config.screenshot_dir, Utf8PathBuf::from("shots/"));
        assert_eq!(config.log_level, LogLevel::Error);

        let config = ReporterConfig::default().apply_overrides(None, None);
        assert_eq!(config, ReporterConfig::default());
    }

    #[test]
    fn builders_keep_rel_path_in_step() {
        let config = ReporterConfig::default()
            .with_screenshot_dir("shots/")
            .with_log_level(LogLevel::Trace);
        assert_eq!(config.screenshot_rel_path, "shots/");
        let config = config.with_screenshot_rel_path("media/");
        assert_eq!(config.screenshot_rel_path, "media/");
        assert_eq!(config.log_level, LogLevel::Trace);
    }
}
