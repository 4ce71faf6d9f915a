//! In-memory ticket store double shared by the crate's unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::event_context::{InvocationContext, RepoRef, TriggeringEvent};
use crate::ticket_store::{
    NewTicket, Ticket, TicketState, TicketStore, TicketStoreError, TicketUpdate,
};

pub(crate) const WHOOPS_TITLE: &str = "[85d8ae40] Probot integration problem";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreCall {
    Search(String),
    Create(NewTicket),
    Update(TicketUpdate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreMode {
    Scripted,
    Persistent,
    FailingSearch,
    FailingCreate,
    FailingUpdate,
}

pub(crate) struct RecordingTicketStore {
    mode: StoreMode,
    tickets: Mutex<Vec<Ticket>>,
    calls: Mutex<Vec<StoreCall>>,
}

impl Default for RecordingTicketStore {
    fn default() -> Self {
        Self::with_mode(StoreMode::Scripted, Vec::new())
    }
}

impl RecordingTicketStore {
    fn with_mode(mode: StoreMode, tickets: Vec<Ticket>) -> Self {
        Self {
            mode,
            tickets: Mutex::new(tickets),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every search returns `results` verbatim; writes are only recorded.
    pub(crate) fn with_search_results(results: Vec<Ticket>) -> Self {
        Self::with_mode(StoreMode::Scripted, results)
    }

    /// Behaves like a tiny issue tracker: creates and updates are visible to
    /// later searches, most recently touched first.
    pub(crate) fn persistent() -> Self {
        Self::with_mode(StoreMode::Persistent, Vec::new())
    }

    pub(crate) fn failing_search() -> Self {
        Self::with_mode(StoreMode::FailingSearch, Vec::new())
    }

    pub(crate) fn failing_create() -> Self {
        Self::with_mode(StoreMode::FailingCreate, Vec::new())
    }

    /// Searches return `results`; every update is rejected.
    pub(crate) fn failing_update(results: Vec<Ticket>) -> Self {
        Self::with_mode(StoreMode::FailingUpdate, results)
    }

    pub(crate) async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    pub(crate) async fn creates(&self) -> Vec<NewTicket> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Create(ticket) => Some(ticket),
                _ => None,
            })
            .collect()
    }

    pub(crate) async fn updates(&self) -> Vec<TicketUpdate> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Update(update) => Some(update),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl TicketStore for RecordingTicketStore {
    async fn search_tickets(
        &self,
        _repo: &RepoRef,
        query: &str,
    ) -> Result<Vec<Ticket>, TicketStoreError> {
        self.calls
            .lock()
            .await
            .push(StoreCall::Search(query.to_string()));
        if self.mode == StoreMode::FailingSearch {
            return Err(TicketStoreError::HttpStatus {
                operation: "search issues",
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        let tickets = self.tickets.lock().await.clone();
        if self.mode != StoreMode::Persistent {
            return Ok(tickets);
        }
        let open_only = query.split(' ').any(|clause| clause == "is:open");
        let fingerprint = query.rsplit(' ').next().unwrap_or_default();
        Ok(tickets
            .into_iter()
            .filter(|ticket| ticket.title.contains(fingerprint))
            .filter(|ticket| !open_only || ticket.state == TicketState::Open)
            .collect())
    }

    async fn create_ticket(
        &self,
        _repo: &RepoRef,
        ticket: NewTicket,
    ) -> Result<(), TicketStoreError> {
        self.calls
            .lock()
            .await
            .push(StoreCall::Create(ticket.clone()));
        if self.mode == StoreMode::FailingCreate {
            return Err(TicketStoreError::InvalidResponse {
                operation: "create issue",
                message: "rejected".to_string(),
            });
        }
        if self.mode == StoreMode::Persistent {
            let mut tickets = self.tickets.lock().await;
            let number = tickets.len() as u64 + 1;
            tickets.insert(
                0,
                Ticket {
                    number,
                    title: ticket.title,
                    body: Some(ticket.body),
                    state: TicketState::Open,
                },
            );
        }
        Ok(())
    }

    async fn update_ticket(
        &self,
        _repo: &RepoRef,
        update: TicketUpdate,
    ) -> Result<(), TicketStoreError> {
        self.calls
            .lock()
            .await
            .push(StoreCall::Update(update.clone()));
        if self.mode == StoreMode::FailingUpdate {
            return Err(TicketStoreError::HttpStatus {
                operation: "update issue",
                status: 404,
                body: "Not Found".to_string(),
            });
        }
        if self.mode == StoreMode::Persistent {
            let mut tickets = self.tickets.lock().await;
            if let Some(index) = tickets
                .iter()
                .position(|ticket| ticket.number == update.number)
            {
                let mut ticket = tickets.remove(index);
                ticket.body = Some(update.body);
                if let Some(state) = update.state {
                    ticket.state = state;
                }
                tickets.insert(0, ticket);
            }
        }
        Ok(())
    }
}

pub(crate) fn ticket(number: u64, body: &str, state: TicketState) -> Ticket {
    Ticket {
        number,
        title: WHOOPS_TITLE.to_string(),
        body: Some(body.to_string()),
        state,
    }
}

/// Context for an `issues.opened` delivery on `foo/bar` carrying `issue`.
pub(crate) fn issue_event_context(issue: Value) -> InvocationContext {
    InvocationContext::new(
        RepoRef::new("foo", "bar"),
        TriggeringEvent::new(
            "issues.opened",
            json!({
                "issue": issue,
                "repository": { "owner": { "login": "foo" }, "name": "bar" },
                "installation": { "id": 1 }
            }),
        ),
    )
}
