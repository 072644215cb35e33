use serde::{Deserialize, Serialize};

use crate::session::SessionSnapshot;

/// Login lifecycle of a client. Derived from the session, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    /// Client id or client secret missing.
    Uninitialized,
    /// Credentials present, no token yet.
    Unauthenticated,
    /// Token issued but not yet verified.
    Authenticated,
    /// Token issued and verified; the client is usable.
    TokenVerified,
}

impl LifecycleStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Authenticated => "AUTHENTICATED",
            Self::TokenVerified => "TOKEN_VERIFIED",
        }
    }
}

impl std::fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a session to its lifecycle status. An absent session is `Uninitialized`.
#[must_use]
pub fn classify(session: Option<&SessionSnapshot>) -> LifecycleStatus {
    match session {
        Some(s) if s.has_credentials => match (&s.token, s.token_verified) {
            (None, _) => LifecycleStatus::Unauthenticated,
            (Some(_), false) => LifecycleStatus::Authenticated,
            (Some(_), true) => LifecycleStatus::TokenVerified,
        },
        _ => LifecycleStatus::Uninitialized,
    }
}
