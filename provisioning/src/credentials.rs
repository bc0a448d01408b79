//! Bearer token storage for an admin session.

use std::sync::{Arc, RwLock};

/// Source of the bearer token attached to admin requests.
///
/// The client only ever talks to this trait, so a session can be backed by memory,
/// a keyring, or a test double.
pub trait CredentialProvider: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: String);
    fn clear(&self);
}

/// Process-scoped token store. Lives as long as the session that created it.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    token: Arc<RwLock<Option<String>>>,
}

impl SessionCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let creds = Self::new();
        creds.set(token.into());
        creds
    }
}

impl CredentialProvider for SessionCredentials {
    fn get(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set(&self, token: String) {
        // An empty token is the same as no token.
        let value = if token.is_empty() { None } else { Some(token) };
        match self.token.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }

    fn clear(&self) {
        match self.token.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear() {
        let creds = SessionCredentials::new();
        assert_eq!(creds.get(), None);

        creds.set("abc".to_string());
        assert_eq!(creds.get(), Some("abc".to_string()));

        creds.clear();
        assert_eq!(creds.get(), None);
    }

    #[test]
    fn test_empty_token_is_absent() {
        let creds = SessionCredentials::with_token("");
        assert_eq!(creds.get(), None);
    }

    #[test]
    fn test_clones_share_the_session() {
        let creds = SessionCredentials::new();
        let other = creds.clone();
        creds.set("shared".to_string());
        assert_eq!(other.get(), Some("shared".to_string()));
    }
}
