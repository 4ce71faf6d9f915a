//! GitHub Issues backend for `tau-lifeguard`.
//!
//! Implements the `TicketStore` port on top of the GitHub REST API: issue
//! search, issue creation and issue edits, one request per call.

pub mod github_client_config;
pub mod github_ticket_client;

pub use github_client_config::{
    GithubTicketClientConfig, DEFAULT_GITHUB_API_BASE, DEFAULT_REQUEST_TIMEOUT_MS,
};
pub use github_ticket_client::GithubTicketClient;
