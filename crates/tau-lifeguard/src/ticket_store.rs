use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event_context::RepoRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Enumerates supported `TicketState` values.
pub enum TicketState {
    Open,
    Closed,
}

impl TicketState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// An issue as returned by a ticket store search.
pub struct Ticket {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: TicketState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Payload for opening a new issue.
pub struct NewTicket {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Payload for patching an existing issue.
pub struct TicketUpdate {
    #[serde(skip)]
    pub number: u64,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<TicketState>,
}

#[derive(Debug, Error)]
/// Enumerates supported `TicketStoreError` values.
pub enum TicketStoreError {
    #[error("ticket store {operation} failed with status {status}: {body}")]
    HttpStatus {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("ticket store {operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("invalid ticket store response for {operation}: {message}")]
    InvalidResponse {
        operation: &'static str,
        message: String,
    },
}

#[async_trait]
/// Trait contract for the issue tracker a `Lifeguard` reports into.
///
/// Implementations perform exactly one request per call: no retries and no
/// caching, so failures surface to the reporter as they happen.
pub trait TicketStore: Send + Sync {
    /// Run a search query; items come back in the order the query sorts by.
    async fn search_tickets(
        &self,
        repo: &RepoRef,
        query: &str,
    ) -> Result<Vec<Ticket>, TicketStoreError>;

    async fn create_ticket(
        &self,
        repo: &RepoRef,
        ticket: NewTicket,
    ) -> Result<(), TicketStoreError>;

    async fn update_ticket(
        &self,
        repo: &RepoRef,
        update: TicketUpdate,
    ) -> Result<(), TicketStoreError>;
}
