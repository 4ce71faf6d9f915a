use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tau_lifeguard::{NewTicket, RepoRef, Ticket, TicketStore, TicketStoreError, TicketUpdate};

use crate::github_client_config::GithubTicketClientConfig;

const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Deserialize)]
struct GithubIssueSearchResponse {
    #[serde(default)]
    items: Vec<Ticket>,
}

#[derive(Clone)]
/// GitHub REST client implementing [`TicketStore`].
pub struct GithubTicketClient {
    http: reqwest::Client,
    api_base: String,
}

impl GithubTicketClient {
    pub fn new(config: GithubTicketClientConfig) -> Result<Self> {
        config.validate()?;
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("Tau-lifeguard"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", config.token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid github authorization header")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("failed to create github ticket client")?;
        Ok(Self {
            http: client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, TicketStoreError> {
        let response = request
            .send()
            .await
            .map_err(|error| TicketStoreError::Transport {
                operation,
                source: Box::new(error),
            })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(
            operation,
            status = status.as_u16(),
            "github api request rejected"
        );
        Err(TicketStoreError::HttpStatus {
            operation,
            status: status.as_u16(),
            body: truncate_for_error(&body, ERROR_BODY_MAX_CHARS),
        })
    }

    async fn send_json<T>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TicketStoreError>
    where
        T: DeserializeOwned,
    {
        self.send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|error| TicketStoreError::InvalidResponse {
                operation,
                message: error.to_string(),
            })
    }
}

#[async_trait]
impl TicketStore for GithubTicketClient {
    async fn search_tickets(
        &self,
        repo: &RepoRef,
        query: &str,
    ) -> Result<Vec<Ticket>, TicketStoreError> {
        let scoped_query = scope_search_query(repo, query);
        let response: GithubIssueSearchResponse = self
            .send_json(
                "search issues",
                self.http
                    .get(format!("{}/search/issues", self.api_base))
                    .query(&[("q", scoped_query.as_str())]),
            )
            .await?;
        Ok(response.items)
    }

    async fn create_ticket(
        &self,
        repo: &RepoRef,
        ticket: NewTicket,
    ) -> Result<(), TicketStoreError> {
        self.send(
            "create issue",
            self.http
                .post(format!(
                    "{}/repos/{}/{}/issues",
                    self.api_base, repo.owner, repo.name
                ))
                .json(&ticket),
        )
        .await?;
        Ok(())
    }

    async fn update_ticket(
        &self,
        repo: &RepoRef,
        update: TicketUpdate,
    ) -> Result<(), TicketStoreError> {
        self.send(
            "update issue",
            self.http
                .patch(format!(
                    "{}/repos/{}/{}/issues/{}",
                    self.api_base, repo.owner, repo.name, update.number
                ))
                .json(&update),
        )
        .await?;
        Ok(())
    }
}

// GitHub search is global; pin it to the repository and to issues so
// same-fingerprint reports elsewhere never match.
fn scope_search_query(repo: &RepoRef, query: &str) -> String {
    format!("{} repo:{} is:issue", query.trim(), repo.as_slug())
}

fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}
