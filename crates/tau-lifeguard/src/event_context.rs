use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Repository coordinates (`owner/name`) used for every issue write.
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn as_slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// The webhook event that triggered a handler invocation.
pub struct TriggeringEvent {
    pub name: String,
    pub payload: Value,
}

impl TriggeringEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Title of the issue (or pull request) this event is about, if any.
    pub fn associated_issue_title(&self) -> Option<&str> {
        self.associated_issue()
            .and_then(|entry| entry.get("title"))
            .and_then(Value::as_str)
    }

    /// Whether the issue (or pull request) this event is about carries
    /// `label`. Labels may be webhook objects (`{"name": ..}`) or plain names.
    pub fn associated_issue_has_label(&self, label: &str) -> bool {
        self.associated_issue()
            .and_then(|entry| entry.get("labels"))
            .and_then(Value::as_array)
            .is_some_and(|labels| {
                labels.iter().any(|entry| {
                    entry
                        .get("name")
                        .and_then(Value::as_str)
                        .or_else(|| entry.as_str())
                        .is_some_and(|name| name == label)
                })
            })
    }

    fn associated_issue(&self) -> Option<&Value> {
        ["issue", "pull_request"]
            .iter()
            .filter_map(|key| self.payload.get(*key))
            .find(|entry| entry.is_object())
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Everything a guarded handler is invoked with.
pub struct InvocationContext {
    pub repo: RepoRef,
    pub event: TriggeringEvent,
}

impl InvocationContext {
    pub fn new(repo: RepoRef, event: TriggeringEvent) -> Self {
        Self { repo, event }
    }

    /// Build a context from a raw webhook delivery, resolving the repository
    /// from `repository.owner.login` and `repository.name`.
    pub fn from_webhook(name: impl Into<String>, payload: Value) -> Result<Self> {
        let repository = payload
            .get("repository")
            .ok_or_else(|| anyhow!("webhook payload is missing 'repository'"))?;
        let owner = repository
            .get("owner")
            .and_then(|owner| owner.get("login"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| anyhow!("webhook payload is missing 'repository.owner.login'"))?;
        let repo_name = repository
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| anyhow!("webhook payload is missing 'repository.name'"))?;
        let repo = RepoRef::new(owner, repo_name);
        Ok(Self::new(repo, TriggeringEvent::new(name, payload)))
    }
}
