//! Session credential held by the client.

use std::time::Duration;

use tokio::time::Instant;

/// How long before the reported expiry a token stops being reused.
pub const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Username and password used to obtain bearer tokens.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The single bearer token the client holds, if any.
#[derive(Default)]
pub(crate) struct TokenState {
    token: Option<String>,
    /// `None` for a token supplied up front, whose lifetime is unknown.
    expires_at: Option<Instant>,
}

impl TokenState {
    pub(crate) fn with_static_token(token: Option<String>) -> Self {
        Self {
            token: token.filter(|token| !token.is_empty()),
            expires_at: None,
        }
    }

    pub(crate) fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Store a freshly issued token.
    pub(crate) fn replace(&mut self, token: String, expires_in: Duration) {
        let expires_at = Instant::now() + expires_in;
        self.expires_at = Some(expires_at.checked_sub(TOKEN_EXPIRY_MARGIN).unwrap_or_else(Instant::now));
        self.token = Some(token);
    }

    /// A token is fresh only when it was issued by a login and its margin has
    /// not yet been reached.
    pub(crate) fn is_fresh(&self) -> bool {
        match (&self.token, self.expires_at) {
            (Some(_), Some(expires_at)) => Instant::now() < expires_at,
            _ => false,
        }
    }
}
