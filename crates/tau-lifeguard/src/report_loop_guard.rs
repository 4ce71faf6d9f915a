use crate::event_context::TriggeringEvent;
use crate::report_options::ReportOptions;

/// Return true when the event concerns the very issue this failure would be
/// reported to. An app listening to `issues.opened` that crashes would
/// otherwise receive the event for its own report, crash again, and loop.
pub fn should_skip_report(event: &TriggeringEvent, report_title: &str) -> bool {
    event
        .associated_issue_title()
        .is_some_and(|title| title == report_title)
}

/// Return true when the event is about an issue that already carries the
/// report label, so the guarded handler must not run at all.
pub fn should_skip_handler(event: &TriggeringEvent, options: &ReportOptions) -> bool {
    options
        .report_label()
        .is_some_and(|label| event.associated_issue_has_label(label))
}
