use std::error::Error as StdError;
use std::fmt;

use sha2::{Digest, Sha256};

/// Canonical text used when a failure renders to nothing at all.
pub const UNKNOWN_ERROR_TEXT: &str = "Unknown error";

const FINGERPRINT_DIGEST_BYTES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// Enumerates the failure shapes a guarded handler can surface.
pub enum FailureRecord {
    /// A structured error. `trace` carries the rendered cause chain when the
    /// error has one, `message` the top-level message and `rendered` the
    /// generic string coercion.
    Structured {
        trace: Option<String>,
        message: Option<String>,
        rendered: String,
    },
    Text(String),
    Bytes(Vec<u8>),
    #[default]
    Empty,
}

impl FailureRecord {
    pub fn from_error(error: &(dyn StdError + 'static)) -> Self {
        let chain = std::iter::successors(Some(error), |&current| current.source());
        Self::Structured {
            trace: render_cause_chain(chain),
            message: Some(error.to_string()),
            rendered: error.to_string(),
        }
    }

    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        Self::Structured {
            trace: render_cause_chain(error.chain()),
            message: Some(error.to_string()),
            rendered: format!("{error:#}"),
        }
    }
}

impl From<&anyhow::Error> for FailureRecord {
    fn from(error: &anyhow::Error) -> Self {
        Self::from_anyhow(error)
    }
}

impl From<String> for FailureRecord {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for FailureRecord {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for FailureRecord {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Short deduplication key: the first 8 hex characters of a SHA-256 digest.
pub struct ErrorFingerprint(String);

impl ErrorFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render a failure as text, preferring the cause chain, then the message,
/// then the plain string coercion. Never returns an empty string.
pub fn canonicalize_failure(failure: &FailureRecord) -> String {
    let candidate = match failure {
        FailureRecord::Structured {
            trace,
            message,
            rendered,
        } => [trace.as_deref(), message.as_deref(), Some(rendered.as_str())]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
            .map(ToOwned::to_owned),
        FailureRecord::Text(text) => Some(text.clone()),
        FailureRecord::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        FailureRecord::Empty => None,
    };
    candidate
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| UNKNOWN_ERROR_TEXT.to_string())
}

pub fn fingerprint_error_text(text: &str) -> ErrorFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let code = digest[..FINGERPRINT_DIGEST_BYTES]
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    ErrorFingerprint(code)
}

// Only errors with at least one cause get a trace; a lone message falls
// through to the message branch so its fingerprint matches a plain string.
fn render_cause_chain<'a>(
    chain: impl Iterator<Item = &'a (dyn StdError + 'static)>,
) -> Option<String> {
    let mut lines = chain.map(|cause| cause.to_string());
    let head = lines.next()?;
    let causes = lines.collect::<Vec<_>>();
    if causes.is_empty() {
        return None;
    }
    let mut rendered = head;
    rendered.push_str("\n\nCaused by:");
    for (index, cause) in causes.iter().enumerate() {
        rendered.push_str(&format!("\n    {index}: {cause}"));
    }
    Some(rendered)
}
