//! Request/response interception around the HTTP transport.
//!
//! Every call goes through [`Pipeline::send`]:
//!
//! 1. assign a [`CorrelationId`] (caller-supplied or fresh) and merge default headers
//! 2. pre-hook with the outbound request; an error aborts before the network
//! 3. send through `reqwest`
//! 4. validate HTTP status and provider `subCode`; a rejection turns the body into the error
//! 5. post-hook in success or error mode; a hook error supersedes the outcome
//!
//! Request construction failures go to the pre-hook and transport failures to
//! the post-hook, both in error mode.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use url::Url;

use crate::error::{Error, Result};
use crate::hook::{HookData, HookInvocation, SharedHook};
use crate::session::Session;
use crate::sub_code;
use crate::types::CorrelationId;

/// An outbound request as seen (and editable) by the pre-hook.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct OutboundRequest {
    pub correlation_id: CorrelationId,
    pub method: Method,
    pub base_url: Url,
    /// Endpoint path, appended to `base_url`.
    pub path: String,
    /// Default headers merged with per-call headers.
    pub headers: HeaderMap,
    pub query: Option<JsonValue>,
    pub body: Option<JsonValue>,
}

impl OutboundRequest {
    /// `base_url` with `path` appended.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the joined string is not a valid URL.
    pub fn url(&self) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{}", self.path))
    }

    /// Fields exposed to the pre-hook as `params`. Sensitive header values are masked.
    pub(crate) fn whitelisted_params(&self) -> JsonValue {
        let headers: serde_json::Map<String, JsonValue> = self
            .headers
            .iter()
            .filter_map(|(name, value)| {
                let value = if value.is_sensitive() {
                    "***"
                } else {
                    value.to_str().ok()?
                };
                Some((name.as_str().to_owned(), JsonValue::from(value)))
            })
            .collect();

        json!({
            "headers": headers,
            "method": self.method.as_str(),
            "baseUrl": self.base_url.as_str(),
            "url": self.path,
            "params": self.query,
            "correlationId": self.correlation_id.to_string(),
        })
    }
}

/// A decoded response, tagged with the correlation id of its request.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct InboundResponse {
    pub correlation_id: CorrelationId,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: JsonValue,
}

impl InboundResponse {
    #[must_use]
    pub fn sub_code(&self) -> Option<String> {
        sub_code::extract(&self.body)
    }

    /// 2xx status and an accepted `subCode`.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.status.is_success() && self.sub_code().is_some_and(|c| sub_code::is_success(&c))
    }

    /// Response body with `correlationId` added, exposed to the post-hook as `params`.
    pub(crate) fn params(&self) -> JsonValue {
        let mut params = self.body.clone();
        if let Some(map) = params.as_object_mut() {
            map.insert(
                "correlationId".into(),
                JsonValue::from(self.correlation_id.to_string()),
            );
        }
        params
    }

    pub(crate) fn into_rejection(self) -> Error {
        Error::Provider {
            correlation_id: self.correlation_id,
            status: self.status.as_u16(),
            sub_code: self.sub_code(),
            body: self.body,
        }
    }
}

/// Request description assembled by client methods before a correlation id exists.
#[derive(Debug)]
pub(crate) struct RequestSpec {
    method: Method,
    path: String,
    credentials: Vec<(HeaderName, String)>,
    query: Option<JsonValue>,
    body: Option<JsonValue>,
    invalid: Option<String>,
}

impl RequestSpec {
    pub(crate) fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            credentials: Vec::new(),
            query: None,
            body: None,
            invalid: None,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Adds a header whose value is masked in hook params and debug output.
    pub(crate) fn credential(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.credentials.push((name, value.into()));
        self
    }

    pub(crate) fn query<T: Serialize + ?Sized>(mut self, params: &T) -> Self {
        match serde_json::to_value(params) {
            Ok(value) => self.query = Some(value),
            Err(e) => self.invalid = Some(format!("query parameters: {e}")),
        }
        self
    }

    pub(crate) fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = Some(value),
            Err(e) => self.invalid = Some(format!("request body: {e}")),
        }
        self
    }

    fn build(
        self,
        correlation_id: CorrelationId,
        base_url: &Url,
        mut headers: HeaderMap,
    ) -> Result<OutboundRequest> {
        let invalid = |detail: String| Error::InvalidRequest {
            correlation_id: Some(correlation_id),
            detail,
        };

        if let Some(detail) = self.invalid {
            return Err(invalid(detail));
        }

        for (name, value) in self.credentials {
            let mut value = HeaderValue::from_str(&value)
                .map_err(|e| invalid(format!("header {name}: {e}")))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let request = OutboundRequest {
            correlation_id,
            method: self.method,
            base_url: base_url.clone(),
            path: self.path,
            headers,
            query: self.query,
            body: self.body,
        };
        request
            .url()
            .map_err(|e| invalid(format!("url {}: {e}", request.path)))?;
        Ok(request)
    }
}

/// HTTP transport wrapped with hooks and provider-level validation.
#[derive(Debug)]
pub(crate) struct Pipeline {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl Pipeline {
    pub(crate) fn new(http: reqwest::Client, base_url: Url, session: Session) -> Self {
        Self {
            http,
            base_url,
            session,
        }
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    /// Sends one request through the hooks and returns the validated response.
    ///
    /// # Errors
    ///
    /// Returns a hook error if either hook rejects the call (it supersedes any
    /// other outcome), [`Error::Provider`] for a rejected response,
    /// [`Error::Transport`] if no response arrived, and [`Error::InvalidRequest`]
    /// if the request could not be built.
    pub(crate) async fn send(
        &self,
        correlation_id: Option<CorrelationId>,
        spec: RequestSpec,
    ) -> Result<InboundResponse> {
        let correlation_id = correlation_id.unwrap_or_else(CorrelationId::generate);

        let request = match spec.build(
            correlation_id,
            &self.base_url,
            self.session.default_headers(),
        ) {
            Ok(request) => request,
            Err(e) => return Err(intercept_failure(self.session.pre_hook(), e).await),
        };

        let request = self.before_send(request).await?;

        let response = match self.transmit(&request).await {
            Ok(response) => response,
            Err(e) => return Err(intercept_failure(self.session.post_hook(), e).await),
        };

        self.after_receive(response).await
    }

    async fn before_send(&self, request: OutboundRequest) -> Result<OutboundRequest> {
        let Some(hook) = self.session.pre_hook() else {
            return Ok(request);
        };

        let correlation_id = request.correlation_id;
        let mut invocation = HookInvocation::request(request);
        if let Err(hook_error) = hook.call_dyn(&mut invocation).await {
            tracing::debug!(
                correlation_id = %correlation_id,
                error = %hook_error,
                "pre-hook rejected request"
            );
            return Err(Error::Hook {
                correlation_id: Some(correlation_id),
                hook_error,
                original: None,
            });
        }

        match invocation.data {
            Some(HookData::Request(request)) => Ok(request),
            _ => Err(Error::InvalidRequest {
                correlation_id: Some(correlation_id),
                detail: "pre-hook removed the outbound request".into(),
            }),
        }
    }

    async fn transmit(&self, request: &OutboundRequest) -> Result<InboundResponse> {
        let correlation_id = request.correlation_id;
        let url = request.url().map_err(|e| Error::InvalidRequest {
            correlation_id: Some(correlation_id),
            detail: format!("url {}: {e}", request.path),
        })?;

        tracing::debug!(
            correlation_id = %correlation_id,
            method = %request.method,
            path = %request.path,
            "sending request"
        );

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if let Some(query) = &request.query {
            builder = builder.query(query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let transport = move |source| Error::Transport {
            correlation_id: Some(correlation_id),
            source,
        };
        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.json::<JsonValue>().await.map_err(transport)?;

        Ok(InboundResponse {
            correlation_id,
            status,
            headers,
            body,
        })
    }

    async fn after_receive(&self, response: InboundResponse) -> Result<InboundResponse> {
        let correlation_id = response.correlation_id;
        tracing::debug!(
            correlation_id = %correlation_id,
            status = response.status.as_u16(),
            sub_code = response.sub_code().as_deref().unwrap_or("none"),
            "received response"
        );

        if !response.is_accepted() {
            let rejection = response.into_rejection();
            return Err(intercept_failure(self.session.post_hook(), rejection).await);
        }

        let Some(hook) = self.session.post_hook() else {
            return Ok(response);
        };

        let mut invocation = HookInvocation::response(response);
        if let Err(hook_error) = hook.call_dyn(&mut invocation).await {
            tracing::debug!(
                correlation_id = %correlation_id,
                error = %hook_error,
                "post-hook rejected response"
            );
            return Err(Error::Hook {
                correlation_id: Some(correlation_id),
                hook_error,
                original: None,
            });
        }

        match invocation.data {
            Some(HookData::Response(response)) => Ok(response),
            _ => Err(Error::UnexpectedResponse {
                correlation_id,
                detail: "post-hook removed the response".into(),
            }),
        }
    }
}

/// Runs `hook` in error mode. A hook error supersedes `error`, which is kept as the original.
async fn intercept_failure(hook: Option<&SharedHook>, error: Error) -> Error {
    let Some(hook) = hook else {
        return error;
    };

    let mut invocation = HookInvocation::failure(error.hook_payload());
    match hook.call_dyn(&mut invocation).await {
        Ok(()) => error,
        Err(hook_error) => error.superseded_by(hook_error),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use reqwest::header::AUTHORIZATION;
    use tokio::sync::Notify;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::BoxError;
    use crate::hook::Hook;
    use crate::types::AccessToken;

    fn base() -> Url {
        "https://payout-gamma.cashfree.com".parse().unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<HookInvocation>>,
        fail: bool,
    }

    impl Hook for Arc<Recorder> {
        async fn call(&self, invocation: &mut HookInvocation) -> Result<(), BoxError> {
            self.seen.lock().unwrap().push(invocation.clone());
            if self.fail {
                Err("recorder says no".into())
            } else {
                Ok(())
            }
        }
    }

    struct AddTraceHeader;

    impl Hook for AddTraceHeader {
        async fn call(&self, invocation: &mut HookInvocation) -> Result<(), BoxError> {
            if let Some(request) = invocation.outbound_mut() {
                request
                    .headers
                    .insert("x-trace", HeaderValue::from_static("on"));
            }
            Ok(())
        }
    }

    /// Holds requests to `path` until released; other requests pass straight through.
    struct HoldPath {
        path: &'static str,
        release: Arc<Notify>,
    }

    impl Hook for HoldPath {
        async fn call(&self, invocation: &mut HookInvocation) -> Result<(), BoxError> {
            let held = invocation.outbound().is_some_and(|r| r.path == self.path);
            if held {
                self.release.notified().await;
            }
            Ok(())
        }
    }

    fn pipeline(
        base_url: &str,
        pre: Option<SharedHook>,
        post: Option<SharedHook>,
    ) -> Pipeline {
        Pipeline::new(
            reqwest::Client::new(),
            base_url.parse().unwrap(),
            Session::new("id".into(), "secret".into(), pre, post),
        )
    }

    fn ok_body() -> JsonValue {
        json!({ "status": "SUCCESS", "subCode": "200", "data": { "balance": "10.00" } })
    }

    #[test]
    fn request_build_merges_defaults_and_masks_credentials() {
        let mut defaults = HeaderMap::new();
        defaults.insert(AUTHORIZATION, HeaderValue::from_static("Bearer old"));

        let request = RequestSpec::post("/payout/v1/authorize")
            .credential(HeaderName::from_static("x-client-id"), "id")
            .build(CorrelationId::generate(), &base(), defaults)
            .unwrap();

        assert_eq!(request.headers.get(AUTHORIZATION).unwrap(), "Bearer old");
        assert!(request.headers.get("x-client-id").unwrap().is_sensitive());
        assert_eq!(
            request.url().unwrap().as_str(),
            "https://payout-gamma.cashfree.com/payout/v1/authorize"
        );
    }

    #[test]
    fn request_build_reports_unserializable_query() {
        let mut bad = HashMap::new();
        bad.insert((1, 2), "pair keys are not strings");
        let id = CorrelationId::generate();

        let err = RequestSpec::get("/payout/v1/getBalance")
            .query(&bad)
            .build(id, &base(), HeaderMap::new())
            .unwrap_err();

        assert!(matches!(err, Error::InvalidRequest { .. }));
        assert_eq!(err.correlation_id(), Some(id));
    }

    #[test]
    fn whitelisted_params_expose_request_fields() {
        let id = CorrelationId::generate();
        let request = RequestSpec::get("/payout/v1/getBeneId")
            .query(&json!({ "ifsc": "SBIN0000001" }))
            .credential(HeaderName::from_static("x-client-secret"), "shh")
            .build(id, &base(), HeaderMap::new())
            .unwrap();

        let params = request.whitelisted_params();
        assert_eq!(params["method"], "GET");
        assert_eq!(params["url"], "/payout/v1/getBeneId");
        assert_eq!(params["baseUrl"], "https://payout-gamma.cashfree.com/");
        assert_eq!(params["params"]["ifsc"], "SBIN0000001");
        assert_eq!(params["headers"]["x-client-secret"], "***");
        assert_eq!(params["correlationId"], id.to_string());
    }

    #[test]
    fn base_url_with_path_prefix_is_kept() {
        let request = RequestSpec::get("/payout/v1/getBalance")
            .build(
                CorrelationId::generate(),
                &"http://localhost:8080/proxy/".parse().unwrap(),
                HeaderMap::new(),
            )
            .unwrap();
        assert_eq!(
            request.url().unwrap().as_str(),
            "http://localhost:8080/proxy/payout/v1/getBalance"
        );
    }

    #[test]
    fn response_acceptance_needs_status_and_sub_code() {
        let response = |status: u16, body: JsonValue| InboundResponse {
            correlation_id: CorrelationId::generate(),
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body,
        };

        assert!(response(200, json!({ "subCode": "200" })).is_accepted());
        assert!(response(200, json!({ "subCode": "202" })).is_accepted());
        assert!(!response(200, json!({ "subCode": "403" })).is_accepted());
        assert!(!response(200, json!({})).is_accepted());
        assert!(!response(401, json!({ "subCode": "200" })).is_accepted());
    }

    #[tokio::test]
    async fn correlation_id_flows_from_request_to_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payout/v1/getBalance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;

        let pre = Arc::new(Recorder::default());
        let post = Arc::new(Recorder::default());
        let p = pipeline(
            &server.uri(),
            Some(Arc::new(pre.clone())),
            Some(Arc::new(post.clone())),
        );

        let response = p
            .send(None, RequestSpec::get("/payout/v1/getBalance"))
            .await
            .unwrap();

        let request_id = pre.seen.lock().unwrap()[0].correlation_id().unwrap();
        let post_seen = post.seen.lock().unwrap();
        assert_eq!(response.correlation_id, request_id);
        assert_eq!(post_seen[0].correlation_id(), Some(request_id));
        assert_eq!(
            post_seen[0].params.as_ref().unwrap()["correlationId"],
            request_id.to_string()
        );
        assert!(!post_seen[0].is_error());
    }

    #[tokio::test]
    async fn caller_supplied_correlation_id_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(path("/payout/v1/getBalance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;

        let p = pipeline(&server.uri(), None, None);
        let id = CorrelationId::generate();
        let response = p
            .send(Some(id), RequestSpec::get("/payout/v1/getBalance"))
            .await
            .unwrap();
        assert_eq!(response.correlation_id, id);
    }

    #[tokio::test]
    async fn pre_hook_edits_are_sent() {
        let server = MockServer::start().await;
        Mock::given(path("/payout/v1/getBalance"))
            .and(header("x-trace", "on"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let p = pipeline(&server.uri(), Some(Arc::new(AddTraceHeader)), None);
        p.send(None, RequestSpec::get("/payout/v1/getBalance"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn pre_hook_error_never_reaches_network() {
        let server = MockServer::start().await;
        Mock::given(path("/payout/v1/getBalance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(0)
            .mount(&server)
            .await;

        let pre = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let p = pipeline(&server.uri(), Some(Arc::new(pre)), None);
        let id = CorrelationId::generate();

        let err = p
            .send(Some(id), RequestSpec::get("/payout/v1/getBalance"))
            .await
            .unwrap_err();

        assert_eq!(err.correlation_id(), Some(id));
        assert!(matches!(err, Error::Hook { original: None, .. }));
    }

    #[tokio::test]
    async fn rejected_sub_code_goes_to_post_hook_as_error() {
        let server = MockServer::start().await;
        let body = json!({ "status": "ERROR", "subCode": "403", "message": "Token is not valid" });
        Mock::given(path("/payout/v1/getBalance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let post = Arc::new(Recorder::default());
        let p = pipeline(&server.uri(), None, Some(Arc::new(post.clone())));

        let err = p
            .send(None, RequestSpec::get("/payout/v1/getBalance"))
            .await
            .unwrap_err();

        assert_eq!(err.provider_body(), Some(&body));
        let seen = post.seen.lock().unwrap();
        let invocation = &seen[0];
        assert!(invocation.is_error());
        assert!(invocation.data.is_none());
        assert_eq!(invocation.error.as_ref().unwrap()["message"], "Token is not valid");
        assert_eq!(invocation.correlation_id(), err.correlation_id());
    }

    #[tokio::test]
    async fn post_hook_error_supersedes_rejection() {
        let server = MockServer::start().await;
        Mock::given(path("/payout/v1/getBalance"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "subCode": "520" })),
            )
            .mount(&server)
            .await;

        let post = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let p = pipeline(&server.uri(), None, Some(Arc::new(post)));

        let err = p
            .send(None, RequestSpec::get("/payout/v1/getBalance"))
            .await
            .unwrap_err();

        match err {
            Error::Hook {
                correlation_id: Some(_),
                original: Some(original),
                ..
            } => assert!(matches!(*original, Error::Provider { .. })),
            other => panic!("expected superseding hook error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn post_hook_error_supersedes_success() {
        let server = MockServer::start().await;
        Mock::given(path("/payout/v1/getBalance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;

        let post = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let p = pipeline(&server.uri(), None, Some(Arc::new(post)));

        let err = p
            .send(None, RequestSpec::get("/payout/v1/getBalance"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Hook { original: None, .. }));
    }

    #[tokio::test]
    async fn transport_failure_goes_to_post_hook() {
        let post = Arc::new(Recorder::default());
        let p = pipeline("http://127.0.0.1:1", None, Some(Arc::new(post.clone())));
        let id = CorrelationId::generate();

        let err = p
            .send(Some(id), RequestSpec::get("/payout/v1/getBalance"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(err.correlation_id(), Some(id));
        let seen = post.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].correlation_id(), Some(id));
    }

    #[tokio::test]
    async fn construction_failure_goes_to_pre_hook() {
        let pre = Arc::new(Recorder::default());
        let p = pipeline("http://127.0.0.1:1", Some(Arc::new(pre.clone())), None);

        let err = p
            .send(
                None,
                RequestSpec::post("/payout/v1/authorize")
                    .credential(HeaderName::from_static("x-client-id"), "bad\nvalue"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidRequest { .. }));
        let seen = pre.seen.lock().unwrap();
        assert!(seen[0].is_error());
        assert!(seen[0].outbound().is_none());
    }

    #[tokio::test]
    async fn default_authorization_header_is_applied() {
        let server = MockServer::start().await;
        Mock::given(path("/payout/v1/getBeneId"))
            .and(header("authorization", "Bearer tok"))
            .and(query_param("ifsc", "SBIN0000001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let p = pipeline(&server.uri(), None, None);
        p.session()
            .set_token(AccessToken::new("tok").unwrap())
            .unwrap();

        p.send(
            None,
            RequestSpec::get("/payout/v1/getBeneId").query(&json!({ "ifsc": "SBIN0000001" })),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn concurrent_calls_keep_their_own_correlation_ids() {
        let server = MockServer::start().await;
        Mock::given(path("/payout/v1/getTransferStatus"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok_body())
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        Mock::given(path("/payout/v1/getBalance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;

        let post = Arc::new(Recorder::default());
        let p = pipeline(&server.uri(), None, Some(Arc::new(post.clone())));
        let slow_id = CorrelationId::generate();
        let fast_id = CorrelationId::generate();

        let (slow, fast) = tokio::join!(
            p.send(Some(slow_id), RequestSpec::get("/payout/v1/getTransferStatus")),
            p.send(Some(fast_id), RequestSpec::get("/payout/v1/getBalance")),
        );

        assert_eq!(slow.unwrap().correlation_id, slow_id);
        assert_eq!(fast.unwrap().correlation_id, fast_id);

        let seen = post.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        for invocation in seen.iter() {
            let response = invocation.inbound().unwrap();
            let expected = if response.correlation_id == slow_id {
                slow_id
            } else {
                fast_id
            };
            assert_eq!(invocation.correlation_id(), Some(expected));
            assert_eq!(
                invocation.params.as_ref().unwrap()["correlationId"],
                expected.to_string()
            );
        }
        assert_eq!(seen[0].correlation_id(), Some(fast_id));
        assert_eq!(seen[1].correlation_id(), Some(slow_id));
    }

    #[tokio::test]
    async fn held_hook_stalls_only_its_own_call() {
        let server = MockServer::start().await;
        Mock::given(path("/payout/v1/getBalance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;
        Mock::given(path("/payout/v1/getTransfers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;

        let release = Arc::new(Notify::new());
        let p = Arc::new(pipeline(
            &server.uri(),
            Some(Arc::new(HoldPath {
                path: "/payout/v1/getTransfers",
                release: release.clone(),
            })),
            None,
        ));

        let held = tokio::spawn({
            let p = p.clone();
            async move { p.send(None, RequestSpec::get("/payout/v1/getTransfers")).await }
        });
        tokio::task::yield_now().await;

        tokio::time::timeout(
            Duration::from_secs(5),
            p.send(None, RequestSpec::get("/payout/v1/getBalance")),
        )
        .await
        .expect("free call finished while the other was held")
        .unwrap();
        assert!(!held.is_finished());

        release.notify_one();
        held.await.unwrap().unwrap();
    }
}
