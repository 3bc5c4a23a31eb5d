use tracing::{error, info, warn};

use crate::config::Credentials;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Credentials not found in configuration.")]
    MissingCredentials,
}

/// Checks a username/password pair against the configured secrets
#[derive(Clone)]
pub struct AuthService {
    credentials: Option<Credentials>,
}

impl AuthService {
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self { credentials }
    }

    /// `Ok(true)` on a match, `Ok(false)` on a mismatch, and an error when
    /// no secrets are configured at all.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        let Some(stored) = &self.credentials else {
            error!("Login attempted but no dashboard credentials are configured");
            return Err(AuthError::MissingCredentials);
        };

        let ok = stored.username == username && stored.password == password;
        if ok {
            info!("User {} authenticated", username);
        } else {
            warn!("Rejected login for user {}", username);
        }
        Ok(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(Some(Credentials {
            username: "scout".to_string(),
            password: "s3cret".to_string(),
        }))
    }

    #[test]
    fn test_authenticate_match() {
        assert!(service().authenticate("scout", "s3cret").unwrap());
    }

    #[test]
    fn test_authenticate_mismatch() {
        assert!(!service().authenticate("scout", "wrong").unwrap());
        assert!(!service().authenticate("other", "s3cret").unwrap());
    }

    #[test]
    fn test_authenticate_without_configuration() {
        let result = AuthService::new(None).authenticate("scout", "s3cret");
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }
}
