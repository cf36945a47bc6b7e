//! Embedded attachments and free-text output.
//!
//! Embedded bytes of a known image or video type are written to the
//! configured screenshot directory and linked from the open step as a screen
//! capture. Unknown MIME types are dropped without a trace: engines try
//! several types opportunistically.

use std::sync::atomic::{AtomicUsize, Ordering};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use gherkin_report_tree::{LogEntry, MediaRef, NodeId, NodeKind, Outcome, ReportModel};
use tracing::{debug, error};

use crate::config::ReporterConfig;
use crate::context::ExecutionContext;
use crate::error::ReportError;
use crate::tracker::create_under;

const EMBED_NODE_NAME: &str = "Embed";

static EMBEDDED_FILES: AtomicUsize = AtomicUsize::new(0);

/// File extension for a supported attachment MIME type.
#[must_use]
pub fn extension_for(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "image/bmp" => Some("bmp"),
        "image/gif" => Some("gif"),
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/svg+xml" => Some("svg"),
        "video/ogg" => Some("ogg"),
        _ => None,
    }
}

/// Next process-wide attachment file name, e.g. `embedded3.png`.
fn next_file_name(extension: &str) -> String {
    let n = EMBEDDED_FILES.fetch_add(1, Ordering::Relaxed) + 1;
    format!("embedded{n}.{extension}")
}

fn write_file(dir: &Utf8Path, file_name: &str, data: &[u8]) -> Result<(), ReportError> {
    let path = dir.join(file_name);
    let wrap = |source| ReportError::Attachment {
        path: path.clone(),
        source,
    };
    Dir::create_ambient_dir_all(dir, ambient_authority()).map_err(wrap)?;
    let dir = Dir::open_ambient_dir(dir, ambient_authority()).map_err(wrap)?;
    dir.write(file_name, data).map_err(wrap)
}

/// Borrowed view over the state attachment handling needs.
pub(crate) struct AttachmentHandler<'a> {
    pub(crate) report: &'a dyn ReportModel,
    pub(crate) config: &'a ReporterConfig,
}

impl AttachmentHandler<'_> {
    /// The open step, or a synthetic `Embed` node under the open scenario
    /// when no step is open.
    fn step_or_embed_node(&self, ctx: &mut ExecutionContext) -> NodeId {
        if let Some(step) = ctx.step {
            return step;
        }
        let node = create_under(
            self.report,
            ctx.scenario,
            NodeKind::Asterisk,
            EMBED_NODE_NAME,
            None,
        );
        ctx.step = Some(node);
        node
    }

    /// Write `data` and link it from the open step.
    ///
    /// Returns the path of the written file, or `None` when the MIME type is
    /// unsupported or the write failed. Write failures are logged.
    pub(crate) fn embed(
        &self,
        ctx: &mut ExecutionContext,
        mime_type: &str,
        data: &[u8],
    ) -> Option<Utf8PathBuf> {
        let Some(extension) = extension_for(mime_type) else {
            debug!(mime_type, "ignoring attachment of unsupported type");
            return None;
        };
        let file_name = next_file_name(extension);
        let dir = &self.config.screenshot_dir;
        if let Err(err) = write_file(dir, &file_name, data) {
            error!(error = %err, "failed to write attachment");
            return None;
        }

        let node = self.step_or_embed_node(ctx);
        let link = format!("{}{file_name}", self.config.screenshot_rel_path);
        self.report
            .log(node, LogEntry::screen_capture(MediaRef::new(link)));
        debug!(%node, file = %file_name, bytes = data.len(), "attachment embedded");
        Some(dir.join(file_name))
    }

    /// Log `text` on the open step, else on the open scenario.
    pub(crate) fn write(&self, ctx: &ExecutionContext, text: &str) {
        if text.is_empty() {
            return;
        }
        match ctx.step.or(ctx.scenario) {
            Some(node) => self.report.log(node, LogEntry::text(Outcome::Info, text)),
            None => debug!("dropping text written outside any scenario"),
        }
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests use explicit failures for clarity")]
mod tests {
    use super::*;
    use gherkin_report_tree::{LogBody, MemoryReport};
    use rstest::rstest;
    use serial_test::serial;

    fn temp_config() -> (tempfile::TempDir, ReporterConfig) {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().join("shots")).expect("utf-8 path");
        let config = ReporterConfig::default()
            .with_screenshot_dir(root)
            .with_screenshot_rel_path("shots/");
        (dir, config)
    }

    #[rstest]
    #[case("image/bmp", Some("bmp"))]
    #[case("image/gif", Some("gif"))]
    #[case("image/jpeg", Some("jpg"))]
    #[case("image/png", Some("png"))]
    #[case("image/svg+xml", Some("svg"))]
    #[case("video/ogg", Some("ogg"))]
    #[case("application/octet-stream", None)]
    #[case("text/plain", None)]
    fn mime_types_map_to_extensions(#[case] mime: &str, #[case] expected: Option<&str>) {
        assert_eq!(extension_for(mime), expected);
    }

    #[test]
    #[serial]
    fn file_names_increase_monotonically() {
        let first = next_file_name("png");
        let second = next_file_name("png");
        let number = |name: &str| -> usize {
            name.trim_start_matches("embedded")
                .trim_end_matches(".png")
                .parse()
                .expect("numeric suffix")
        };
        assert!(number(&second) > number(&first));
    }

    #[test]
    #[serial]
    fn png_is_written_and_linked_from_the_step() {
        let (_guard, config) = temp_config();
        let report = MemoryReport::new();
        let step = report.create_node(NodeKind::Given, "Given a cart", None);
        let mut ctx = ExecutionContext {
            step: Some(step),
            ..ExecutionContext::default()
        };
        let handler = AttachmentHandler {
            report: &report,
            config: &config,
        };

        let written = handler
            .embed(&mut ctx, "image/png", b"\x89PNG")
            .expect("attachment written");

        assert_eq!(std::fs::read(&written).expect("read back"), b"\x89PNG");
        let logs = report.logs(step);
        assert_eq!(logs.len(), 1);
        let Some(LogBody::ScreenCapture(media)) = logs.first().map(|entry| &entry.body) else {
            panic!("expected a screen capture entry");
        };
        let file_name = written.file_name().expect("file name");
        assert_eq!(media.path, format!("shots/{file_name}"));
    }

    #[test]
    fn unknown_mime_type_writes_nothing() {
        let (guard, config) = temp_config();
        let report = MemoryReport::new();
        let mut ctx = ExecutionContext::new();
        let handler = AttachmentHandler {
            report: &report,
            config: &config,
        };

        assert!(handler.embed(&mut ctx, "application/octet-stream", b"raw").is_none());
        assert!(report.is_empty());
        assert!(ctx.step().is_none());
        assert!(!guard.path().join("shots").exists());
    }

    #[test]
    #[serial]
    fn embed_without_step_opens_an_embed_node() {
        let (_guard, config) = temp_config();
        let report = MemoryReport::new();
        let scenario = report.create_node(NodeKind::Scenario, "pay", None);
        let mut ctx = ExecutionContext {
            scenario: Some(scenario),
            ..ExecutionContext::default()
        };
        let handler = AttachmentHandler {
            report: &report,
            config: &config,
        };

        assert!(handler.embed(&mut ctx, "image/gif", b"GIF89a").is_some());

        let Some(embed) = ctx.step() else {
            panic!("embed node should be open");
        };
        assert_eq!(report.children(scenario), vec![embed]);
        assert_eq!(report.name(embed).as_deref(), Some("Embed"));
        assert!(report.has_screen_capture(embed));
    }

    #[test]
    #[serial]
    fn write_failure_is_absorbed() {
        let (guard, _) = temp_config();
        let blocker = guard.path().join("blocker");
        std::fs::write(&blocker, b"file").expect("create blocking file");
        let dir = Utf8PathBuf::from_path_buf(blocker.join("shots")).expect("utf-8 path");
        let config = ReporterConfig::default().with_screenshot_dir(dir);
        let report = MemoryReport::new();
        let step = report.create_node(NodeKind::Given, "Given", None);
        let mut ctx = ExecutionContext {
            step: Some(step),
            ..ExecutionContext::default()
        };
        let handler = AttachmentHandler {
            report: &report,
            config: &config,
        };

        assert!(handler.embed(&mut ctx, "image/png", b"png").is_none());
        assert!(!report.has_log(step));
    }

    #[test]
    fn write_prefers_step_then_scenario() {
        let report = MemoryReport::new();
        let config = ReporterConfig::default();
        let scenario = report.create_node(NodeKind::Scenario, "pay", None);
        let step = report.create_child_node(scenario, NodeKind::Given, "Given", None);
        let handler = AttachmentHandler {
            report: &report,
            config: &config,
        };

        let mut ctx = ExecutionContext {
            scenario: Some(scenario),
            ..ExecutionContext::default()
        };
        handler.write(&ctx, "on scenario");
        ctx.step = Some(step);
        handler.write(&ctx, "on step");
        handler.write(&ctx, "");

        assert_eq!(report.logs(scenario).len(), 1);
        assert_eq!(
            report.logs(step).first().and_then(LogEntry::text_content),
            Some("on step")
        );
        assert_eq!(report.logs(step).len(), 1);
    }
}
