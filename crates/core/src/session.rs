//! Current-user session seam.
//!
//! Sign-in flows live outside this workspace; the repositories and screens
//! only need the signed-in user's id. Auth failures surface as
//! [`Error::Auth`](crate::errors::Error::Auth).

use crate::errors::{Error, Result};

/// Source of the signed-in user's id.
pub trait SessionProvider: Send + Sync {
    fn current_user_id(&self) -> Result<String>;
}

/// Fixed session, as used by the daemon (id from configuration) and tests.
#[derive(Debug, Clone)]
pub struct StaticSession {
    user_id: Option<String>,
}

impl StaticSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// A session with nobody signed in.
    pub fn signed_out() -> Self {
        Self { user_id: None }
    }
}

impl SessionProvider for StaticSession {
    fn current_user_id(&self) -> Result<String> {
        self.user_id
            .clone()
            .ok_or_else(|| Error::Auth("no user is signed in".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_out_session_is_an_auth_error() {
        let session = StaticSession::signed_out();
        assert!(matches!(session.current_user_id(), Err(Error::Auth(_))));
    }

    #[test]
    fn static_session_returns_configured_id() {
        let session = StaticSession::new("u1");
        assert_eq!(session.current_user_id().unwrap(), "u1");
    }
}
