//! Credentials, auth responses and session state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{NexusError, Result};
use crate::user::{Role, UserProfile};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Email/password pair sent to the login endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Rejects blank fields before any remote call.
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(NexusError::validation("email", "Email is required"));
        }
        if self.password.is_empty() {
            return Err(NexusError::validation("password", "Password is required"));
        }
        Ok(())
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration form submitted to the register endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
        ] {
            if value.trim().is_empty() {
                return Err(NexusError::validation(field, "This field is required."));
            }
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(NexusError::validation(
                "password",
                format!("Password must be at least {} characters.", MIN_PASSWORD_LENGTH),
            ));
        }
        if self.password != self.password2 {
            return Err(NexusError::validation("password2", "Passwords do not match."));
        }
        Ok(())
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Password change form.
#[derive(Clone, Serialize, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChange {
    pub fn validate(&self) -> Result<()> {
        if self.current_password.is_empty() {
            return Err(NexusError::validation(
                "current_password",
                "Current password is required.",
            ));
        }
        if self.new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(NexusError::validation(
                "new_password",
                format!("Password must be at least {} characters.", MIN_PASSWORD_LENGTH),
            ));
        }
        if self.new_password != self.confirm_password {
            return Err(NexusError::validation(
                "confirm_password",
                "Passwords do not match.",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordChange { .. }")
    }
}

/// Body returned by the login and register endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub access: String,
    pub refresh: String,
}

/// Body returned by the token refresh endpoint.
///
/// `refresh` is only present when the server rotates refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRefresh {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Mutable part of the auth session kept by the session service.
///
/// Tokens live in the shared [`TokenCell`](super::TokenCell); the session
/// writes both under one lock so readers never observe a half-applied login.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub user: Option<UserProfile>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Point-in-time view of the session handed to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub user: Option<UserProfile>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl SessionSnapshot {
    /// Assembles a snapshot; `is_authenticated` is derived, never stored.
    pub fn new(
        state: &SessionState,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Self {
        let is_authenticated = access_token.is_some() && state.user.is_some();
        Self {
            user: state.user.clone(),
            access_token,
            refresh_token,
            is_authenticated,
            is_loading: state.is_loading,
            error: state.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "analytical".to_string(),
            password2: "analytical".to_string(),
            username: None,
            role: None,
        }
    }

    #[test]
    fn test_login_requires_email_and_password() {
        assert!(LoginCredentials::new("", "secret").validate().is_err());
        assert!(LoginCredentials::new("a@b.c", "").validate().is_err());
        assert!(LoginCredentials::new("a@b.c", "secret").validate().is_ok());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let debug = format!("{:?}", LoginCredentials::new("a@b.c", "hunter2"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_register_password_mismatch() {
        let mut request = register_request();
        assert!(request.validate().is_ok());

        request.password2 = "different1".to_string();
        let err = request.validate().unwrap_err();
        assert!(matches!(err, NexusError::Validation { ref field, .. } if field == "password2"));
    }

    #[test]
    fn test_password_change_confirmation() {
        let change = PasswordChange {
            current_password: "old-password".to_string(),
            new_password: "new-password".to_string(),
            confirm_password: "new-passw0rd".to_string(),
        };
        assert!(change.validate().is_err());
    }

    #[test]
    fn test_snapshot_requires_token_and_user() {
        let state = SessionState::default();
        let snapshot = SessionSnapshot::new(&state, Some("token".to_string()), None);
        assert!(!snapshot.is_authenticated);
    }
}
