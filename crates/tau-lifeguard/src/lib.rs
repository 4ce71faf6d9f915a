//! Error capture and deduplication for Tau event handlers.
//!
//! A guarded handler that fails is reported as a GitHub-style issue keyed by a
//! short fingerprint of the error text. Repeated failures bump an
//! `Occurrences:` counter on the existing issue instead of opening new ones,
//! and events caused by the reporter's own issues are ignored.

pub mod error_fingerprint;
pub mod event_context;
pub mod invocation_guard;
pub mod issue_reconciler;
pub mod issue_search_query;
pub mod report_loop_guard;
pub mod report_options;
pub mod ticket_store;

pub use error_fingerprint::{
    canonicalize_failure, fingerprint_error_text, ErrorFingerprint, FailureRecord,
    UNKNOWN_ERROR_TEXT,
};
pub use event_context::{InvocationContext, RepoRef, TriggeringEvent};
pub use invocation_guard::{
    event_handler, EventApp, EventHandler, EventHandlerFuture, GuardedRegistry, HandlerRegistry,
    Lifeguard, WILDCARD_EVENT,
};
pub use issue_reconciler::{
    increment_occurrences, reconcile_failure_report, render_new_ticket_body, report_failure,
    resolve_ticket_state, LifeguardError, ReportOutcome,
};
pub use issue_search_query::build_issue_search_query;
pub use report_loop_guard::{should_skip_handler, should_skip_report};
pub use report_options::ReportOptions;
pub use ticket_store::{
    NewTicket, Ticket, TicketState, TicketStore, TicketStoreError, TicketUpdate,
};

#[cfg(test)]
mod test_support;
