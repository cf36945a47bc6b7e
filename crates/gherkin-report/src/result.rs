//! Folds step results into the open step node.

use gherkin_report_tree::{LogEntry, Outcome, ReportModel};
use tracing::debug;

use crate::context::ExecutionContext;
use crate::event::{StepResult, StepStatus};

const FAILED_FALLBACK: &str = "Step failed";
const SKIPPED_FALLBACK: &str = "Step skipped";

fn detail(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|text| !text.is_empty())
}

/// Record `result` against the context's open step.
///
/// A passed hook that left no log and no screen capture is removed from the
/// report. Statuses without a reporting rule are ignored.
pub(crate) fn apply_result(
    report: &dyn ReportModel,
    ctx: &mut ExecutionContext,
    result: &StepResult,
) {
    let Some(step) = ctx.step else {
        debug!(status = ?result.status, "step result without an open step");
        return;
    };

    match result.status {
        StepStatus::Failed => {
            let text = detail(result.error.as_ref())
                .or_else(|| detail(result.error_message.as_ref()))
                .unwrap_or(FAILED_FALLBACK);
            report.log(step, LogEntry::text(Outcome::Fail, text));
        }
        StepStatus::Skipped | StepStatus::Pending => {
            if let Some(error) = detail(result.error.as_ref()) {
                report.log(step, LogEntry::text(Outcome::Skip, error));
            } else if report.last_log_status(step) != Some(Outcome::Skip) {
                let text = detail(result.error_message.as_ref()).unwrap_or(SKIPPED_FALLBACK);
                report.log(step, LogEntry::text(Outcome::Skip, text));
            }
        }
        StepStatus::Passed => {
            if ctx.in_hook && !report.has_log(step) && !report.has_screen_capture(step) {
                debug!(%step, "removing hook without output");
                report.remove_node(step);
                ctx.clear_step();
                return;
            }
            if !report.has_log(step) {
                report.log(step, LogEntry::pass());
            }
        }
        StepStatus::Ambiguous | StepStatus::Undefined | StepStatus::Unknown => {
            debug!(%step, status = ?result.status, "ignoring step status");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gherkin_report_tree::{MediaRef, MemoryReport, NodeId, NodeKind};
    use rstest::{fixture, rstest};

    struct Open {
        report: MemoryReport,
        ctx: ExecutionContext,
        step: NodeId,
    }

    impl Open {
        fn apply(&mut self, result: &StepResult) {
            apply_result(&self.report, &mut self.ctx, result);
        }

        fn texts(&self) -> Vec<(Outcome, String)> {
            self.report
                .logs(self.step)
                .into_iter()
                .map(|entry| {
                    let text = entry.text_content().unwrap_or_default().to_owned();
                    (entry.status, text)
                })
                .collect()
        }
    }

    fn open(is_hook: bool) -> Open {
        let report = MemoryReport::new();
        let scenario = report.create_node(NodeKind::Scenario, "pay", None);
        let step = report.create_child_node(scenario, NodeKind::Given, "Given a cart", None);
        let ctx = ExecutionContext {
            scenario: Some(scenario),
            step: Some(step),
            in_hook: is_hook,
            ..ExecutionContext::default()
        };
        Open { report, ctx, step }
    }

    #[fixture]
    fn step() -> Open {
        open(false)
    }

    #[fixture]
    fn hook() -> Open {
        open(true)
    }

    #[rstest]
    #[case::error(Some("trace"), Some("message"), "trace")]
    #[case::message(None, Some("message"), "message")]
    #[case::fallback(None, None, "Step failed")]
    fn failure_detail_prefers_error(
        mut step: Open,
        #[case] error: Option<&str>,
        #[case] message: Option<&str>,
        #[case] expected: &str,
    ) {
        let result = StepResult {
            status: StepStatus::Failed,
            error: error.map(str::to_owned),
            error_message: message.map(str::to_owned),
        };
        step.apply(&result);
        assert_eq!(step.texts(), vec![(Outcome::Fail, expected.to_owned())]);
    }

    #[rstest]
    fn passed_step_gets_one_generic_entry(mut step: Open) {
        step.apply(&StepResult::new(StepStatus::Passed));
        step.apply(&StepResult::new(StepStatus::Passed));
        assert_eq!(step.texts(), vec![(Outcome::Pass, String::new())]);
    }

    #[rstest]
    fn passed_step_with_log_gets_no_generic_entry(mut step: Open) {
        step.report.log(step.step, LogEntry::text(Outcome::Info, "note"));
        step.apply(&StepResult::new(StepStatus::Passed));
        assert_eq!(step.texts(), vec![(Outcome::Info, "note".to_owned())]);
    }

    #[rstest]
    fn repeated_skip_is_not_duplicated(mut step: Open) {
        step.apply(&StepResult::new(StepStatus::Skipped));
        step.apply(&StepResult::new(StepStatus::Pending));
        assert_eq!(step.texts(), vec![(Outcome::Skip, "Step skipped".to_owned())]);
    }

    #[rstest]
    fn skip_after_other_status_is_recorded(mut step: Open) {
        step.report.log(step.step, LogEntry::text(Outcome::Info, "note"));
        step.apply(&StepResult::new(StepStatus::Skipped));
        assert_eq!(
            step.texts(),
            vec![
                (Outcome::Info, "note".to_owned()),
                (Outcome::Skip, "Step skipped".to_owned()),
            ]
        );
    }

    #[rstest]
    fn skip_error_is_always_recorded(mut step: Open) {
        step.apply(&StepResult::new(StepStatus::Skipped).with_message("not ready"));
        step.apply(&StepResult::new(StepStatus::Skipped).with_error("skip trace"));
        assert_eq!(
            step.texts(),
            vec![
                (Outcome::Skip, "not ready".to_owned()),
                (Outcome::Skip, "skip trace".to_owned()),
            ]
        );
    }

    #[rstest]
    fn silent_hook_is_retracted(mut hook: Open) {
        hook.apply(&StepResult::new(StepStatus::Passed));
        assert!(!hook.report.contains(hook.step));
        assert!(hook.ctx.step().is_none());
        assert!(!hook.ctx.in_hook());
    }

    #[rstest]
    fn hook_with_log_is_kept(mut hook: Open) {
        hook.report.log(hook.step, LogEntry::text(Outcome::Info, "seeded data"));
        hook.apply(&StepResult::new(StepStatus::Passed));
        assert!(hook.report.contains(hook.step));
        assert_eq!(hook.ctx.step(), Some(hook.step));
    }

    #[rstest]
    fn hook_with_node_capture_is_kept(mut hook: Open) {
        hook.report
            .add_screen_capture(hook.step, MediaRef::new("shots/final.png"));
        hook.apply(&StepResult::new(StepStatus::Passed));
        assert!(hook.report.contains(hook.step));
        assert_eq!(hook.texts(), vec![(Outcome::Pass, String::new())]);
    }

    #[rstest]
    #[case(StepStatus::Ambiguous)]
    #[case(StepStatus::Undefined)]
    #[case(StepStatus::Unknown)]
    fn unhandled_statuses_are_ignored(mut step: Open, #[case] status: StepStatus) {
        step.apply(&StepResult::new(status));
        assert!(step.texts().is_empty());
    }

    #[test]
    fn no_open_step_is_a_no_op() {
        let report = MemoryReport::new();
        let mut ctx = ExecutionContext::new();
        apply_result(&report, &mut ctx, &StepResult::new(StepStatus::Failed));
        assert!(report.is_empty());
    }
}
