use serde::{Deserialize, Serialize};

use crate::error_fingerprint::ErrorFingerprint;

pub const DEFAULT_REPORT_TITLE: &str = "Probot integration problem";
pub const DEFAULT_REPORT_BODY: &str = "An error occurred";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Issue settings shared by every report a single `Lifeguard` files.
///
/// Milestones and assignees are not supported.
pub struct ReportOptions {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub reopen: bool,
    /// Label stamped on every report issue. Reports are only matched against
    /// issues carrying it, and events about such issues never reach the
    /// guarded handler.
    pub report_label: Option<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_REPORT_TITLE.to_string(),
            body: DEFAULT_REPORT_BODY.to_string(),
            labels: Vec::new(),
            reopen: false,
            report_label: None,
        }
    }
}

impl ReportOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reopen(mut self, reopen: bool) -> Self {
        self.reopen = reopen;
        self
    }

    pub fn with_report_label(mut self, label: impl Into<String>) -> Self {
        self.report_label = Some(label.into());
        self
    }

    /// Configured report label, ignoring a blank one.
    pub fn report_label(&self) -> Option<&str> {
        self.report_label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }

    /// Labels applied to a new report: the configured labels followed by the
    /// report label unless it is already among them.
    pub fn issue_labels(&self) -> Vec<String> {
        let mut labels = self.labels.clone();
        if let Some(report_label) = self.report_label() {
            if !labels.iter().any(|label| label.trim() == report_label) {
                labels.push(report_label.to_string());
            }
        }
        labels
    }

    /// Issue title for a fingerprint: `[<fingerprint>] <title>`.
    pub fn issue_title(&self, fingerprint: &ErrorFingerprint) -> String {
        format!("[{fingerprint}] {}", self.title)
    }
}
