use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::error_fingerprint::{
    canonicalize_failure, fingerprint_error_text, ErrorFingerprint, FailureRecord,
};
use crate::event_context::InvocationContext;
use crate::issue_search_query::build_issue_search_query;
use crate::report_loop_guard::should_skip_report;
use crate::report_options::ReportOptions;
use crate::ticket_store::{
    NewTicket, Ticket, TicketState, TicketStore, TicketStoreError, TicketUpdate,
};

const OCCURRENCES_MARKER_PATTERN: &str = r"(Occurrences:\s*)([0-9]+)";

#[derive(Debug, Error)]
/// Enumerates supported `LifeguardError` values.
pub enum LifeguardError {
    #[error("failed to search for an existing error report")]
    Search(#[source] TicketStoreError),
    #[error("failed to create error report issue")]
    Create(#[source] TicketStoreError),
    #[error("failed to update error report issue #{number}")]
    Update {
        number: u64,
        #[source]
        source: TicketStoreError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `ReportOutcome` values.
pub enum ReportOutcome {
    /// The triggering event is about this report's own issue.
    SkippedLoop { title: String },
    Created { title: String },
    Updated {
        number: u64,
        /// New counter value; `None` when the body carried no marker.
        occurrences: Option<u64>,
        reopened: bool,
    },
}

/// Fingerprint a failure and reconcile it against the ticket store.
pub async fn report_failure(
    store: &dyn TicketStore,
    context: &InvocationContext,
    failure: &FailureRecord,
    options: &ReportOptions,
) -> Result<ReportOutcome, LifeguardError> {
    let canonical_text = canonicalize_failure(failure);
    let fingerprint = fingerprint_error_text(&canonical_text);
    reconcile_failure_report(store, context, &fingerprint, &canonical_text, options).await
}

/// Create a new report issue or bump the counter on the most recently updated
/// match. Only the first search hit is trusted; fingerprint collisions beyond
/// that are not resolved.
pub async fn reconcile_failure_report(
    store: &dyn TicketStore,
    context: &InvocationContext,
    fingerprint: &ErrorFingerprint,
    canonical_text: &str,
    options: &ReportOptions,
) -> Result<ReportOutcome, LifeguardError> {
    let title = options.issue_title(fingerprint);
    if should_skip_report(&context.event, &title) {
        tracing::warn!(
            event = context.event.name.as_str(),
            title = title.as_str(),
            "skipping error report for event caused by its own issue"
        );
        return Ok(ReportOutcome::SkippedLoop { title });
    }

    let repo = &context.repo;
    let query = build_issue_search_query(fingerprint, options);
    tracing::debug!(
        repo = repo.as_slug().as_str(),
        query = query.as_str(),
        "searching for existing error report"
    );
    let existing = store
        .search_tickets(repo, &query)
        .await
        .map_err(LifeguardError::Search)?
        .into_iter()
        .next();

    let Some(ticket) = existing else {
        let body = render_new_ticket_body(&options.body, canonical_text);
        store
            .create_ticket(
                repo,
                NewTicket {
                    title: title.clone(),
                    body,
                    labels: options.issue_labels(),
                },
            )
            .await
            .map_err(LifeguardError::Create)?;
        tracing::info!(
            repo = repo.as_slug().as_str(),
            fingerprint = fingerprint.as_str(),
            "created error report issue"
        );
        return Ok(ReportOutcome::Created { title });
    };

    update_existing_ticket(store, context, ticket, options).await
}

async fn update_existing_ticket(
    store: &dyn TicketStore,
    context: &InvocationContext,
    ticket: Ticket,
    options: &ReportOptions,
) -> Result<ReportOutcome, LifeguardError> {
    let Ticket {
        number,
        body,
        state,
        ..
    } = ticket;
    let (body, occurrences) = increment_occurrences(body.as_deref().unwrap_or_default());
    let next_state = resolve_ticket_state(state, options.reopen);
    let reopened = state != next_state;
    store
        .update_ticket(
            &context.repo,
            TicketUpdate {
                number,
                body,
                state: Some(next_state),
            },
        )
        .await
        .map_err(|source| LifeguardError::Update { number, source })?;
    tracing::info!(
        repo = context.repo.as_slug().as_str(),
        issue = number,
        occurrences = occurrences.unwrap_or_default(),
        reopened,
        "updated error report issue"
    );
    Ok(ReportOutcome::Updated {
        number,
        occurrences,
        reopened,
    })
}

/// Body for a first report: configured body, fenced error text, counter.
pub fn render_new_ticket_body(body: &str, canonical_text: &str) -> String {
    [
        body.to_string(),
        format!("```\n{canonical_text}\n```"),
        "Occurrences: 1".to_string(),
    ]
    .join("\n\n")
}

/// Bump the first `Occurrences: <N>` marker, keeping its label and spacing.
/// Bodies without a marker (or with a counter at `u64::MAX`) come back unchanged.
pub fn increment_occurrences(body: &str) -> (String, Option<u64>) {
    let Some(captures) = occurrences_marker().and_then(|marker| marker.captures(body)) else {
        return (body.to_string(), None);
    };
    let (Some(label), Some(value)) = (captures.get(1), captures.get(2)) else {
        return (body.to_string(), None);
    };
    let Some(next) = value
        .as_str()
        .parse::<u64>()
        .ok()
        .and_then(|count| count.checked_add(1))
    else {
        return (body.to_string(), None);
    };
    let mut updated = String::with_capacity(body.len() + 1);
    updated.push_str(&body[..label.end()]);
    updated.push_str(&next.to_string());
    updated.push_str(&body[value.end()..]);
    (updated, Some(next))
}

/// Closed issues are reopened only when reopening is enabled.
pub fn resolve_ticket_state(current: TicketState, reopen: bool) -> TicketState {
    match current {
        TicketState::Closed if reopen => TicketState::Open,
        state => state,
    }
}

fn occurrences_marker() -> Option<&'static Regex> {
    static MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    MARKER
        .get_or_init(|| Regex::new(OCCURRENCES_MARKER_PATTERN).ok())
        .as_ref()
}
