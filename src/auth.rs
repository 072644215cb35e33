use std::time::Duration;

use reqwest::header::HeaderName;

use crate::endpoints;
use crate::error::{Error, Result};
use crate::pipeline::{Pipeline, RequestSpec};
use crate::types::{AccessToken, CorrelationId};

/// Base delay of the login retry backoff.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

const CLIENT_ID_HEADER: &str = "x-client-id";
const CLIENT_SECRET_HEADER: &str = "x-client-secret";

/// Backoff between failed login cycles: `base * 2^attempt`, attempt starting at 1.
///
/// Unbounded unless a maximum is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_RETRY_BASE_DELAY,
            max_delay: None,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(base_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay: None,
        }
    }

    /// Caps every delay at `max_delay`.
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    #[must_use]
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// Delay after the `attempt`-th failed cycle (1-based). Saturates instead of overflowing.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

/// Step of the login handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    /// `POST /authorize` with the client credentials.
    Authenticate,
    /// `POST /verifyToken` with the bearer token.
    VerifyToken,
}

impl std::fmt::Display for HandshakeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Authenticate => "authenticate",
            Self::VerifyToken => "verify_token",
        })
    }
}

/// Drives the authenticate → verify-token handshake over a [`Pipeline`].
pub(crate) struct AuthSession<'a> {
    pipeline: &'a Pipeline,
    retry: RetryPolicy,
}

impl<'a> AuthSession<'a> {
    pub(crate) fn new(pipeline: &'a Pipeline, retry: RetryPolicy) -> Self {
        Self { pipeline, retry }
    }

    /// Exchanges the client credentials for a token and installs it as the
    /// default `Authorization` header.
    ///
    /// # Errors
    ///
    /// Any pipeline error, or [`Error::MissingToken`] if the accepted response
    /// carries no `data.token`.
    pub(crate) async fn authenticate(&self, correlation_id: Option<CorrelationId>) -> Result<()> {
        let session = self.pipeline.session();
        let spec = RequestSpec::post(endpoints::AUTHENTICATE)
            .credential(HeaderName::from_static(CLIENT_ID_HEADER), session.client_id())
            .credential(
                HeaderName::from_static(CLIENT_SECRET_HEADER),
                session.client_secret(),
            );

        let response = self.pipeline.send(correlation_id, spec).await?;
        let token = response
            .body
            .pointer("/data/token")
            .and_then(|v| v.as_str())
            .and_then(AccessToken::new)
            .ok_or(Error::MissingToken {
                correlation_id: response.correlation_id,
            })?;

        session
            .set_token(token)
            .map_err(|e| Error::InvalidRequest {
                correlation_id: Some(response.correlation_id),
                detail: format!("token is not a valid header value: {e}"),
            })
    }

    /// Confirms the installed token with the provider and marks it verified.
    ///
    /// # Errors
    ///
    /// Any pipeline error.
    pub(crate) async fn verify_token(&self, correlation_id: Option<CorrelationId>) -> Result<()> {
        self.pipeline
            .send(correlation_id, RequestSpec::post(endpoints::VERIFY_TOKEN))
            .await?;
        self.pipeline.session().mark_verified();
        Ok(())
    }

    /// One handshake cycle. Verification never runs if authentication failed.
    pub(crate) async fn handshake(&self) -> Result<(), (HandshakeStage, Error)> {
        self.authenticate(None)
            .await
            .map_err(|e| (HandshakeStage::Authenticate, e))?;
        self.verify_token(None)
            .await
            .map_err(|e| (HandshakeStage::VerifyToken, e))
    }

    /// Repeats the handshake until it succeeds, sleeping per [`RetryPolicy`]
    /// between cycles. Returns the number of failed cycles.
    pub(crate) async fn run_until_verified(&self) -> u32 {
        let mut attempt = 1;
        loop {
            match self.handshake().await {
                Ok(()) => return attempt - 1,
                Err((stage, error)) => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        stage = %stage,
                        attempt,
                        retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "Cashfree login failed"
                    );
                    attempt = attempt.saturating_add(1);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
