use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::BoxError;
use crate::pipeline::{InboundResponse, OutboundRequest};
use crate::types::CorrelationId;

/// The request or response a hook is observing.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum HookData {
    Request(OutboundRequest),
    Response(InboundResponse),
}

/// Argument passed to a [`Hook`].
///
/// Exactly one of `error` and `data` is populated:
///
/// | call site | `data` | `params` | `error` |
/// |---|---|---|---|
/// | pre-hook | the outbound request | whitelisted request fields | |
/// | post-hook, accepted | the response | response body + `correlationId` | |
/// | post-hook, provider rejection | | | response body + `correlationId` |
/// | request construction / transport failure | | | `{ message, correlationId }` |
///
/// A pre-hook may edit the request in `data`; the edited request is what gets sent.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct HookInvocation {
    pub error: Option<JsonValue>,
    pub data: Option<HookData>,
    pub params: Option<JsonValue>,
}

impl HookInvocation {
    pub(crate) fn request(request: OutboundRequest) -> Self {
        Self {
            error: None,
            params: Some(request.whitelisted_params()),
            data: Some(HookData::Request(request)),
        }
    }

    pub(crate) fn response(response: InboundResponse) -> Self {
        Self {
            error: None,
            params: Some(response.params()),
            data: Some(HookData::Response(response)),
        }
    }

    pub(crate) fn failure(error: JsonValue) -> Self {
        Self {
            error: Some(error),
            data: None,
            params: None,
        }
    }

    /// `true` when the hook is observing a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Correlation id of the call, from `data` or the `correlationId` field of `error`.
    #[must_use]
    pub fn correlation_id(&self) -> Option<CorrelationId> {
        match &self.data {
            Some(HookData::Request(r)) => Some(r.correlation_id),
            Some(HookData::Response(r)) => Some(r.correlation_id),
            None => self
                .error
                .as_ref()?
                .get("correlationId")?
                .as_str()?
                .parse()
                .ok(),
        }
    }

    #[must_use]
    pub fn outbound(&self) -> Option<&OutboundRequest> {
        match &self.data {
            Some(HookData::Request(r)) => Some(r),
            _ => None,
        }
    }

    /// Mutable access to the outbound request (pre-hook only).
    pub fn outbound_mut(&mut self) -> Option<&mut OutboundRequest> {
        match &mut self.data {
            Some(HookData::Request(r)) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn inbound(&self) -> Option<&InboundResponse> {
        match &self.data {
            Some(HookData::Response(r)) => Some(r),
            _ => None,
        }
    }
}

/// Consumer-provided interception point, run before every request (pre-hook)
/// or after every response or failure (post-hook).
///
/// Returning `Err` vetoes the call: a pre-hook error stops the request before
/// it is sent, a post-hook error replaces the call's outcome. The call does
/// not settle until the hook's future completes.
///
/// # Example
///
/// ```rust,ignore
/// struct RequireTransferRemarks;
///
/// impl Hook for RequireTransferRemarks {
///     async fn call(&self, invocation: &mut HookInvocation) -> Result<(), BoxError> {
///         let Some(request) = invocation.outbound() else { return Ok(()) };
///         if request.path.ends_with("/requestTransfer")
///             && request.body.as_ref().and_then(|b| b.get("remarks")).is_none()
///         {
///             return Err("transfers must carry remarks".into());
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Hook: Send + Sync + 'static {
    fn call(
        &self,
        invocation: &mut HookInvocation,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Object-safe wrapper for Hook (needed for Arc<dyn>).
pub(crate) trait HookDyn: Send + Sync {
    fn call_dyn<'a>(
        &'a self,
        invocation: &'a mut HookInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>>;
}

impl<T: Hook> HookDyn for T {
    fn call_dyn<'a>(
        &'a self,
        invocation: &'a mut HookInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>> {
        Box::pin(self.call(invocation))
    }
}

pub(crate) type SharedHook = Arc<dyn HookDyn>;
