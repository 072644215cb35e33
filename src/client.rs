//! Payout API client.
//!
//! ```rust,ignore
//! use cashfree_payout::{Client, ClientConfig};
//!
//! let client = Client::new(ClientConfig::from_env()?)?;
//! // Queued until the background login completes.
//! let balance = client.get_balance().await?;
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use crate::auth::{AuthSession, RetryPolicy};
use crate::config::ClientConfig;
use crate::endpoints;
use crate::error::{Error, Result};
use crate::payout::{
    BankDetails, BankValidation, BeneficiaryLookup, NewBeneficiary, Page, RemoveBeneficiary,
    TransferLookup, TransferRequest,
};
use crate::pipeline::{InboundResponse, Pipeline, RequestSpec};
use crate::readiness::ReadinessGate;
use crate::session::{Session, SessionSnapshot};
use crate::types::{BeneficiaryId, CorrelationId};
use crate::validate::{self, LifecycleStatus};

#[derive(Debug)]
struct Inner {
    pipeline: Pipeline,
    gate: ReadinessGate,
    retry: RetryPolicy,
}

impl Inner {
    /// Background login: handshake until verified, then release queued calls.
    async fn login(&self) {
        let failures = AuthSession::new(&self.pipeline, self.retry)
            .run_until_verified()
            .await;
        let released = self.gate.open();
        tracing::info!(failures, released, "Cashfree session ready");
    }
}

/// Aborts the background login once the last client handle is gone.
#[derive(Debug)]
struct HandshakeTask(AbortHandle);

impl Drop for HandshakeTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Cashfree Payouts client.
///
/// Cheap to clone; clones share the session, hooks and readiness state.
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<Inner>,
    correlation_id: Option<CorrelationId>,
    _handshake: Option<Arc<HandshakeTask>>,
}

impl Client {
    /// Builds the client. With deferred readiness (the default) the login
    /// handshake starts on the current Tokio runtime and business calls queue
    /// until it succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built, or if
    /// deferred readiness is on and no Tokio runtime is running.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let ClientConfig {
            client_id,
            client_secret,
            base_url,
            timeout,
            user_agent,
            deferred_readiness,
            retry,
            pre_hook,
            post_hook,
            http,
        } = config;

        let runtime = if deferred_readiness {
            let handle = Handle::try_current().map_err(|_| {
                Error::Config("deferred readiness needs a running Tokio runtime".into())
            })?;
            Some(handle)
        } else {
            None
        };

        let http = match http {
            Some(http) => http,
            None => {
                let mut builder = reqwest::Client::builder().timeout(timeout);
                if let Some(user_agent) = user_agent {
                    builder = builder.user_agent(user_agent);
                }
                builder
                    .build()
                    .map_err(|e| Error::Config(format!("HTTP client: {e}")))?
            }
        };

        let session = Session::new(client_id, client_secret, pre_hook, post_hook);
        let inner = Arc::new(Inner {
            pipeline: Pipeline::new(http, base_url, session),
            gate: if runtime.is_some() {
                ReadinessGate::pending()
            } else {
                ReadinessGate::opened()
            },
            retry,
        });

        let handshake = runtime.map(|runtime| {
            let task_inner = Arc::clone(&inner);
            let task = runtime.spawn(async move { task_inner.login().await });
            Arc::new(HandshakeTask(task.abort_handle()))
        });

        Ok(Self {
            inner,
            correlation_id: None,
            _handshake: handshake,
        })
    }

    /// A handle whose calls all carry `correlation_id` instead of a fresh one.
    #[must_use]
    pub fn with_correlation_id(&self, correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id: Some(correlation_id),
            ..self.clone()
        }
    }

    /// Lifecycle status of the session right now.
    #[must_use]
    pub fn validate(&self) -> LifecycleStatus {
        validate::classify(Some(&self.snapshot()))
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.pipeline.session().snapshot()
    }

    /// Whether business calls run immediately instead of queueing.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.gate.is_open()
    }

    /// Resolves once queued business calls have been released.
    pub async fn wait_ready(&self) {
        self.inner.gate.wait().await;
    }

    /// Exchanges the client credentials for a bearer token. Never queued.
    ///
    /// # Errors
    ///
    /// Pipeline errors, or [`Error::MissingToken`] if no token was issued.
    pub async fn authenticate(&self) -> Result<()> {
        self.auth().authenticate(self.correlation_id).await
    }

    /// Verifies the current token with the provider. Never queued.
    ///
    /// # Errors
    ///
    /// Pipeline errors.
    pub async fn verify_token(&self) -> Result<()> {
        self.auth().verify_token(self.correlation_id).await
    }

    /// Checks that a bank account exists.
    ///
    /// # Errors
    ///
    /// [`Error::Provider`] carrying the whole response body if the account
    /// does not exist, plus the usual pipeline errors.
    pub async fn validate_beneficiary(&self, details: &BankDetails) -> Result<BankValidation> {
        let response = self
            .call(RequestSpec::get(endpoints::VALIDATE_BENEFICIARY).query(details))
            .await?;

        let exists = response
            .body
            .pointer("/data/accountExists")
            .and_then(JsonValue::as_str)
            == Some("YES");
        if !exists {
            return Err(response.into_rejection());
        }
        field(&response, "/data")
    }

    /// Registers a beneficiary. Returns the whole response body.
    ///
    /// # Errors
    ///
    /// Pipeline errors.
    pub async fn add_beneficiary(&self, beneficiary: &NewBeneficiary) -> Result<JsonValue> {
        self.call(RequestSpec::post(endpoints::ADD_BENEFICIARY).json(beneficiary))
            .await
            .map(|response| response.body)
    }

    /// Beneficiary details (`data`).
    ///
    /// # Errors
    ///
    /// Pipeline errors.
    pub async fn get_beneficiary(&self, bene_id: &BeneficiaryId) -> Result<JsonValue> {
        let path = format!(
            "{}/{}",
            endpoints::GET_BENEFICIARY,
            urlencoding::encode(&bene_id.0)
        );
        let response = self.call(RequestSpec::get(path)).await?;
        Ok(data_or(response, "/data", JsonValue::Null))
    }

    /// Id of the beneficiary registered for a bank account.
    ///
    /// # Errors
    ///
    /// [`Error::UnexpectedResponse`] if the response carries no `data.beneId`,
    /// plus the usual pipeline errors.
    pub async fn get_beneficiary_id(&self, lookup: &BeneficiaryLookup) -> Result<BeneficiaryId> {
        let response = self
            .call(RequestSpec::get(endpoints::GET_BENEFICIARY_ID).query(lookup))
            .await?;
        field(&response, "/data/beneId")
    }

    /// One page of beneficiaries. Empty when the response lists none.
    ///
    /// # Errors
    ///
    /// Pipeline errors.
    pub async fn get_beneficiaries(&self, page: &Page) -> Result<Vec<JsonValue>> {
        let response = self
            .call(RequestSpec::get(endpoints::GET_BENEFICIARIES).query(page))
            .await?;
        list(response, "/data/beneficiaries")
    }

    /// Deletes a beneficiary. Returns the whole response body.
    ///
    /// # Errors
    ///
    /// Pipeline errors.
    pub async fn remove_beneficiary(&self, beneficiary: &RemoveBeneficiary) -> Result<JsonValue> {
        self.call(RequestSpec::post(endpoints::REMOVE_BENEFICIARY).json(beneficiary))
            .await
            .map(|response| response.body)
    }

    /// Requests a payout. Returns the whole response body; a pending or
    /// acknowledged transfer (`subCode` 201/202) is a success.
    ///
    /// # Errors
    ///
    /// Pipeline errors.
    pub async fn request_transfer(&self, transfer: &TransferRequest) -> Result<JsonValue> {
        self.call(RequestSpec::post(endpoints::REQUEST_TRANSFER).json(transfer))
            .await
            .map(|response| response.body)
    }

    /// Ledger and available balance (`data`).
    ///
    /// # Errors
    ///
    /// Pipeline errors.
    pub async fn get_balance(&self) -> Result<JsonValue> {
        let response = self.call(RequestSpec::get(endpoints::GET_BALANCE)).await?;
        Ok(data_or(response, "/data", JsonValue::Null))
    }

    /// One page of transfers. Empty when the response lists none.
    ///
    /// # Errors
    ///
    /// Pipeline errors.
    pub async fn list_transfers(&self, page: &Page) -> Result<Vec<JsonValue>> {
        let response = self
            .call(RequestSpec::get(endpoints::LIST_TRANSFERS).query(page))
            .await?;
        list(response, "/data/transfers")
    }

    /// Status of one transfer (`data`).
    ///
    /// # Errors
    ///
    /// Pipeline errors.
    pub async fn get_transfer(&self, lookup: &TransferLookup) -> Result<JsonValue> {
        let response = self
            .call(RequestSpec::get(endpoints::GET_TRANSFER).query(lookup))
            .await?;
        Ok(data_or(response, "/data", JsonValue::Null))
    }

    fn auth(&self) -> AuthSession<'_> {
        AuthSession::new(&self.inner.pipeline, self.inner.retry)
    }

    /// Business call: waits its turn at the readiness gate, then goes through the pipeline.
    async fn call(&self, spec: RequestSpec) -> Result<InboundResponse> {
        self.inner.gate.wait().await;
        self.inner.pipeline.send(self.correlation_id, spec).await
    }
}

/// Value at `pointer`, or `default` when absent.
fn data_or(response: InboundResponse, pointer: &str, default: JsonValue) -> JsonValue {
    let mut body = response.body;
    body.pointer_mut(pointer)
        .map(JsonValue::take)
        .unwrap_or(default)
}

/// List at `pointer`; absent or null is empty.
fn list(response: InboundResponse, pointer: &str) -> Result<Vec<JsonValue>> {
    let correlation_id = response.correlation_id;
    match data_or(response, pointer, JsonValue::Null) {
        JsonValue::Array(items) => Ok(items),
        JsonValue::Null => Ok(Vec::new()),
        other => Err(Error::UnexpectedResponse {
            correlation_id,
            detail: format!("{pointer} is not a list: {other}"),
        }),
    }
}

/// Required value at `pointer`, deserialized.
fn field<T: DeserializeOwned>(response: &InboundResponse, pointer: &str) -> Result<T> {
    let unexpected = |detail: String| Error::UnexpectedResponse {
        correlation_id: response.correlation_id,
        detail,
    };
    let value = response
        .body
        .pointer(pointer)
        .filter(|v| !v.is_null())
        .ok_or_else(|| unexpected(format!("missing {pointer}")))?;
    serde_json::from_value(value.clone()).map_err(|e| unexpected(format!("{pointer}: {e}")))
}
