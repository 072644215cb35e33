use std::sync::{PoisonError, RwLock};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};

use crate::hook::SharedHook;
use crate::types::AccessToken;

/// Point-in-time view of a session, as consumed by [`classify`](crate::validate::classify).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct SessionSnapshot {
    /// Both client id and client secret are non-empty.
    pub has_credentials: bool,
    pub token: Option<AccessToken>,
    pub token_verified: bool,
}

impl SessionSnapshot {
    #[must_use]
    pub fn new(has_credentials: bool, token: Option<AccessToken>, token_verified: bool) -> Self {
        Self {
            has_credentials,
            token,
            token_verified,
        }
    }
}

#[derive(Default)]
struct TokenState {
    token: Option<AccessToken>,
    token_verified: bool,
    default_headers: HeaderMap,
}

/// Credentials, hooks and login state owned by one client.
///
/// Token state is written only by the login handshake and read by every
/// request, so it sits behind a lock.
pub(crate) struct Session {
    client_id: String,
    client_secret: String,
    pre_hook: Option<SharedHook>,
    post_hook: Option<SharedHook>,
    state: RwLock<TokenState>,
}

impl Session {
    pub(crate) fn new(
        client_id: String,
        client_secret: String,
        pre_hook: Option<SharedHook>,
        post_hook: Option<SharedHook>,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            pre_hook,
            post_hook,
            state: RwLock::new(TokenState::default()),
        }
    }

    pub(crate) fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub(crate) fn pre_hook(&self) -> Option<&SharedHook> {
        self.pre_hook.as_ref()
    }

    pub(crate) fn post_hook(&self) -> Option<&SharedHook> {
        self.post_hook.as_ref()
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        SessionSnapshot {
            has_credentials: !self.client_id.is_empty() && !self.client_secret.is_empty(),
            token: state.token.clone(),
            token_verified: state.token_verified,
        }
    }

    /// Headers merged into every outbound request.
    pub(crate) fn default_headers(&self) -> HeaderMap {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .default_headers
            .clone()
    }

    /// Stores a freshly issued token and installs it as the default `Authorization` header.
    /// A token that cannot be sent as a header is not stored.
    pub(crate) fn set_token(&self, token: AccessToken) -> Result<(), InvalidHeaderValue> {
        let mut header = HeaderValue::from_str(&token.bearer())?;
        header.set_sensitive(true);

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.default_headers.insert(AUTHORIZATION, header);
        state.token = Some(token);
        Ok(())
    }

    /// Marks the current token as verified. No-op without a token.
    pub(crate) fn mark_verified(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.token.is_some() {
            state.token_verified = true;
        }
    }
}

// Manual Debug: never print the secret or the token.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client_id", &self.client_id)
            .field("pre_hook", &self.pre_hook.is_some())
            .field("post_hook", &self.post_hook.is_some())
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, secret: &str) -> Session {
        Session::new(id.into(), secret.into(), None, None)
    }

    #[test]
    fn fresh_session_has_no_token() {
        let snapshot = session("id", "secret").snapshot();
        assert!(snapshot.has_credentials);
        assert!(snapshot.token.is_none());
        assert!(!snapshot.token_verified);
    }

    #[test]
    fn empty_credentials_are_missing() {
        assert!(!session("", "secret").snapshot().has_credentials);
        assert!(!session("id", "").snapshot().has_credentials);
    }

    #[test]
    fn set_token_installs_bearer_header() {
        let s = session("id", "secret");
        s.set_token(AccessToken::new("abc").unwrap()).unwrap();

        let headers = s.default_headers();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
        assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());
        assert_eq!(s.snapshot().token.unwrap().as_str(), "abc");
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let s = session("id", "secret");
        assert!(s.set_token(AccessToken::new("a\nb").unwrap()).is_err());
        assert!(s.snapshot().token.is_none());
    }

    #[test]
    fn verify_requires_token() {
        let s = session("id", "secret");
        s.mark_verified();
        assert!(!s.snapshot().token_verified);

        s.set_token(AccessToken::new("abc").unwrap()).unwrap();
        s.mark_verified();
        assert!(s.snapshot().token_verified);
    }

    #[test]
    fn debug_hides_secret() {
        let s = session("id", "top-secret");
        s.set_token(AccessToken::new("tok-123").unwrap()).unwrap();
        let out = format!("{s:?}");
        assert!(!out.contains("top-secret"));
        assert!(!out.contains("tok-123"));
    }
}
