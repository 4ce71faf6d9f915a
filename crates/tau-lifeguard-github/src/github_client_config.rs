use std::fmt;

use anyhow::{bail, Result};
use serde::Deserialize;

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
/// Connection settings for [`crate::GithubTicketClient`].
pub struct GithubTicketClientConfig {
    pub api_base: String,
    pub token: String,
    pub request_timeout_ms: u64,
}

impl Default for GithubTicketClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            token: String::new(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl fmt::Debug for GithubTicketClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubTicketClientConfig")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl GithubTicketClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_request_timeout_ms(mut self, request_timeout_ms: u64) -> Self {
        self.request_timeout_ms = request_timeout_ms;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            bail!("github token must not be empty");
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            bail!("github api base '{}' must be an http(s) url", self.api_base);
        }
        Ok(())
    }
}
