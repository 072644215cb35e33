use serde_json::{Value as JsonValue, json};

use crate::types::CorrelationId;

/// Boxed error returned by consumer-provided hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No response was received (connection failure, timeout, unreadable body).
    #[error("HTTP transport error: {source}")]
    Transport {
        correlation_id: Option<CorrelationId>,
        #[source]
        source: reqwest::Error,
    },

    /// A response arrived but its `subCode` (or HTTP status) marks it as rejected.
    /// `body` is the full response body.
    #[error(
        "provider rejected the call (HTTP {status}, subCode {})",
        .sub_code.as_deref().unwrap_or("none")
    )]
    Provider {
        correlation_id: CorrelationId,
        status: u16,
        sub_code: Option<String>,
        body: JsonValue,
    },

    /// A registered hook reported an error. Supersedes `original`, if any.
    #[error("hook rejected the call: {hook_error}")]
    Hook {
        correlation_id: Option<CorrelationId>,
        #[source]
        hook_error: BoxError,
        original: Option<Box<Error>>,
    },

    /// `/authorize` answered successfully but carried no token.
    #[error("authorize call returned no token")]
    MissingToken { correlation_id: CorrelationId },

    /// The outbound request could not be built.
    #[error("invalid request: {detail}")]
    InvalidRequest {
        correlation_id: Option<CorrelationId>,
        detail: String,
    },

    /// A validated response did not have the expected shape.
    #[error("unexpected response: {detail}")]
    UnexpectedResponse {
        correlation_id: CorrelationId,
        detail: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Correlation id of the call that produced this error, when one was assigned.
    #[must_use]
    pub fn correlation_id(&self) -> Option<CorrelationId> {
        match self {
            Self::Transport { correlation_id, .. }
            | Self::Hook { correlation_id, .. }
            | Self::InvalidRequest { correlation_id, .. } => *correlation_id,
            Self::Provider { correlation_id, .. }
            | Self::MissingToken { correlation_id }
            | Self::UnexpectedResponse { correlation_id, .. } => Some(*correlation_id),
            Self::Config(_) => None,
        }
    }

    /// Response body of a provider rejection.
    #[must_use]
    pub fn provider_body(&self) -> Option<&JsonValue> {
        match self {
            Self::Provider { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Wraps `self` as the original outcome of a call a hook then rejected.
    pub(crate) fn superseded_by(self, hook_error: BoxError) -> Self {
        Self::Hook {
            correlation_id: self.correlation_id(),
            hook_error,
            original: Some(Box::new(self)),
        }
    }

    /// JSON form handed to hooks as `HookInvocation::error`.
    ///
    /// Provider rejections expose the response body with `correlationId` added;
    /// everything else becomes `{ "message", "correlationId" }`.
    pub(crate) fn hook_payload(&self) -> JsonValue {
        let id = self.correlation_id().map(|id| id.to_string());
        match self {
            Self::Provider { body, .. } => {
                let mut payload = body.clone();
                match payload.as_object_mut() {
                    Some(map) => {
                        map.insert("correlationId".into(), json!(id));
                        payload
                    }
                    None => json!({ "body": payload, "correlationId": id }),
                }
            }
            other => json!({ "message": other.to_string(), "correlationId": id }),
        }
    }
}
