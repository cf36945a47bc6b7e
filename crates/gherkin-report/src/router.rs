//! Event routing.
//!
//! A [`Reporter`] owns the state shared by every worker: the source index,
//! the feature and outline caches and the report backend. Workers each hold
//! an [`ExecutionContext`] and feed their events through
//! [`Reporter::dispatch`].

use std::sync::Arc;

use camino::Utf8PathBuf;
use gherkin_report_tree::{LogEntry, MediaRef, MemoryReport, NodeId, Outcome, ReportModel};
use tracing::{debug, info, warn};

use crate::attachment::AttachmentHandler;
use crate::cache::{FeatureCache, OutlineCache};
use crate::config::ReporterConfig;
use crate::context::ExecutionContext;
use crate::error::ReportError;
use crate::event::{Event, TestCase};
use crate::result::apply_result;
use crate::source::SourceIndex;
use crate::tracker::HierarchyTracker;

struct Shared {
    config: ReporterConfig,
    report: Arc<dyn ReportModel>,
    sources: SourceIndex,
    features: FeatureCache,
    outlines: OutlineCache,
}

/// Correlates engine events with feature sources and drives a report model.
///
/// Cloning is cheap; clones share all state.
#[derive(Clone)]
pub struct Reporter {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("config", &self.shared.config)
            .field("sources", &self.shared.sources)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    /// Create a reporter driving `report`.
    #[must_use]
    pub fn new(config: ReporterConfig, report: Arc<dyn ReportModel>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                report,
                sources: SourceIndex::new(),
                features: FeatureCache::default(),
                outlines: OutlineCache::default(),
            }),
        }
    }

    /// Create a reporter backed by a [`MemoryReport`] that writes the
    /// outputs named in `config` when the run finishes.
    #[must_use]
    pub fn in_memory(config: ReporterConfig) -> (Self, Arc<MemoryReport>) {
        let report = Arc::new(MemoryReport::with_outputs(config.report_outputs()));
        let reporter = Self::new(config, report.clone());
        (reporter, report)
    }

    /// A fresh context for a new worker.
    #[must_use]
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new()
    }

    /// Indexed feature sources.
    #[must_use]
    pub fn sources(&self) -> &SourceIndex {
        &self.shared.sources
    }

    /// Feature node shared under `name`, if one was created.
    #[must_use]
    pub fn cached_feature(&self, name: &str) -> Option<NodeId> {
        self.shared.features.get(name)
    }

    /// Number of distinct feature names seen.
    #[must_use]
    pub fn cached_feature_count(&self) -> usize {
        self.shared.features.len()
    }

    /// Outline node shared under `name`, if one was created.
    #[must_use]
    pub fn cached_outline(&self, name: &str) -> Option<NodeId> {
        self.shared.outlines.get(name)
    }

    fn tracker(&self) -> HierarchyTracker<'_> {
        HierarchyTracker {
            report: self.shared.report.as_ref(),
            sources: &self.shared.sources,
            features: &self.shared.features,
            outlines: &self.shared.outlines,
        }
    }

    fn attachments(&self) -> AttachmentHandler<'_> {
        AttachmentHandler {
            report: self.shared.report.as_ref(),
            config: &self.shared.config,
        }
    }

    /// Apply one event from the worker owning `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Table`] when an Examples table or step table is
    /// ragged, and [`ReportError::Flush`] when the report cannot be written on
    /// [`Event::RunFinished`]. Unparseable sources, unresolvable lines,
    /// unsupported attachments and attachment write failures are logged and
    /// absorbed.
    pub fn dispatch(&self, ctx: &mut ExecutionContext, event: Event) -> Result<(), ReportError> {
        match event {
            Event::SourceRead { uri, source } => {
                if let Err(err) = self.shared.sources.add_source_read(&uri, &source) {
                    warn!(error = %err, "skipping unparseable feature source");
                }
                Ok(())
            }
            Event::CaseStarted(case) => self.start_case(ctx, &case),
            Event::StepStarted(step) => self.tracker().enter_step(ctx, &step),
            Event::StepFinished(result) => {
                apply_result(self.shared.report.as_ref(), ctx, &result);
                Ok(())
            }
            Event::Embed { mime_type, data } => {
                self.attachments().embed(ctx, &mime_type, &data);
                Ok(())
            }
            Event::Write { text } => {
                self.attachments().write(ctx, &text);
                Ok(())
            }
            Event::RunFinished => self.finish(),
        }
    }

    /// The scenario node is created even when its outline cannot be
    /// rendered, so its steps still have a parent.
    fn start_case(&self, ctx: &mut ExecutionContext, case: &TestCase) -> Result<(), ReportError> {
        let tracker = self.tracker();
        tracker.enter_feature(ctx, case);
        let outline = tracker.enter_outline_if_applicable(ctx, case);
        tracker.enter_scenario(ctx, case);
        outline
    }

    fn finish(&self) -> Result<(), ReportError> {
        self.shared.report.flush()?;
        info!(features = self.shared.features.len(), "report flushed");
        Ok(())
    }

    /// Log `message` on the worker's open step.
    pub fn add_step_log(&self, ctx: &ExecutionContext, message: &str) {
        match ctx.step {
            Some(step) => self
                .shared
                .report
                .log(step, LogEntry::text(Outcome::Info, message)),
            None => debug!("no open step for step log"),
        }
    }

    /// Attach the screen capture at `path` to the worker's open step.
    pub fn add_step_screen_capture(
        &self,
        ctx: &ExecutionContext,
        path: impl Into<Utf8PathBuf>,
        title: Option<&str>,
    ) {
        let Some(step) = ctx.step else {
            debug!("no open step for screen capture");
            return;
        };
        let mut media = MediaRef::new(path.into().into_string());
        if let Some(title) = title {
            media = media.with_title(title);
        }
        self.shared.report.add_screen_capture(step, media);
    }

    /// The worker's open step node.
    #[must_use]
    pub fn current_step(&self, ctx: &ExecutionContext) -> Option<NodeId> {
        ctx.step
    }
}
