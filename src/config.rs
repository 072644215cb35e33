use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::auth::RetryPolicy;
use crate::endpoints;
use crate::error::Error;
use crate::hook::{Hook, SharedHook};

/// Payout client configuration.
///
/// Credentials are constructor parameters; everything else has a default and
/// is overridden with `with_*` methods.
///
/// Use [`from_env()`](ClientConfig::from_env) for convention-based setup,
/// or [`new()`](ClientConfig::new) with `with_*` methods for full control.
#[derive(Clone)]
#[non_exhaustive]
pub struct ClientConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) base_url: Url,
    pub(crate) timeout: Duration,
    pub(crate) user_agent: Option<String>,
    pub(crate) deferred_readiness: bool,
    pub(crate) retry: RetryPolicy,
    pub(crate) pre_hook: Option<SharedHook>,
    pub(crate) post_hook: Option<SharedHook>,
    pub(crate) http: Option<reqwest::Client>,
}

impl ClientConfig {
    /// Production host, 30 s timeout, deferred readiness on, no hooks.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url: production_base_url(),
            timeout: endpoints::DEFAULT_TIMEOUT,
            user_agent: None,
            deferred_readiness: true,
            retry: RetryPolicy::default(),
            pre_hook: None,
            post_hook: None,
            http: None,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `CASHFREE_CLIENT_ID`
    /// - `CASHFREE_CLIENT_SECRET`
    ///
    /// # Optional env vars
    /// - `CASHFREE_BASE_URL`: Override the API host (e.g. the test host)
    /// - `CASHFREE_TIMEOUT_SECS`: Transport timeout in whole seconds
    /// - `CASHFREE_DEFERRED_READINESS`: `1`/`true` or `0`/`false`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required var is missing or a value is invalid.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let client_id = lookup("CASHFREE_CLIENT_ID")
            .ok_or_else(|| Error::Config("CASHFREE_CLIENT_ID is required".into()))?;
        let client_secret = lookup("CASHFREE_CLIENT_SECRET")
            .ok_or_else(|| Error::Config("CASHFREE_CLIENT_SECRET is required".into()))?;

        let mut config = Self::new(client_id, client_secret);

        if let Some(url_str) = lookup("CASHFREE_BASE_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| Error::Config(format!("CASHFREE_BASE_URL: {e}")))?;
            config = config.with_base_url(url);
        }
        if let Some(secs) = lookup("CASHFREE_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("CASHFREE_TIMEOUT_SECS: {e}")))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(flag) = lookup("CASHFREE_DEFERRED_READINESS") {
            let deferred = match flag.trim() {
                "1" | "true" => true,
                "0" | "false" => false,
                other => {
                    return Err(Error::Config(format!(
                        "CASHFREE_DEFERRED_READINESS: expected 1, true, 0 or false, got {other:?}"
                    )));
                }
            };
            config = config.with_deferred_readiness(deferred);
        }

        Ok(config)
    }

    /// Override the API host (default: production).
    #[must_use]
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = url;
        self
    }

    /// Point at the sandbox host.
    #[must_use]
    pub fn with_test_environment(mut self) -> Self {
        self.base_url = test_base_url();
        self
    }

    /// Override the transport timeout (default: 30 s). Ignored with a custom HTTP client.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ignored with a custom HTTP client.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// When on (default), construction starts the login handshake in the
    /// background and business calls wait for it. When off, the caller
    /// drives [`Client::authenticate`](crate::Client::authenticate) and
    /// [`Client::verify_token`](crate::Client::verify_token).
    #[must_use]
    pub fn with_deferred_readiness(mut self, enabled: bool) -> Self {
        self.deferred_readiness = enabled;
        self
    }

    /// Override the login retry backoff (default: 500 ms base, uncapped).
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Base of the `base * 2^attempt` login backoff (default: 500 ms).
    #[must_use]
    pub fn with_retry_base_delay(mut self, base_delay: Duration) -> Self {
        self.retry = match self.retry.max_delay() {
            Some(max) => RetryPolicy::new(base_delay).with_max_delay(max),
            None => RetryPolicy::new(base_delay),
        };
        self
    }

    /// Caps the login backoff. Uncapped unless set.
    #[must_use]
    pub fn with_max_retry_delay(mut self, max_delay: Duration) -> Self {
        self.retry = self.retry.with_max_delay(max_delay);
        self
    }

    #[must_use]
    pub fn with_pre_hook(mut self, hook: impl Hook) -> Self {
        self.pre_hook = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn with_post_hook(mut self, hook: impl Hook) -> Self {
        self.post_hook = Some(Arc::new(hook));
        self
    }

    /// Use a preconfigured `reqwest` client instead of building one.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn deferred_readiness(&self) -> bool {
        self.deferred_readiness
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

// Manual Debug: the client secret stays out of logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("deferred_readiness", &self.deferred_readiness)
            .field("retry", &self.retry)
            .field("pre_hook", &self.pre_hook.is_some())
            .field("post_hook", &self.post_hook.is_some())
            .finish_non_exhaustive()
    }
}

fn production_base_url() -> Url {
    Url::parse(endpoints::PRODUCTION_BASE_URL).expect("valid default URL")
}

fn test_base_url() -> Url {
    Url::parse(endpoints::TEST_BASE_URL).expect("valid default URL")
}
