//! Types for authentication and user management

use serde::{Deserialize, Serialize};

/// Cached profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user ID
    pub id: i64,

    /// The user's email address
    pub email: String,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,
}

impl UserProfile {
    /// Stand-in profile used when the profile fetch after login fails
    pub fn placeholder(email: &str) -> Self {
        Self {
            id: 0,
            email: email.to_string(),
            name: None,
            phone: None,
        }
    }

    /// Whether this is a stand-in rather than a profile from the server
    pub fn is_placeholder(&self) -> bool {
        self.id == 0
    }
}

/// Response of `POST /auth/token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// The bearer token
    pub access_token: String,

    /// Token type, always `bearer`
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

pub(crate) fn default_token_type() -> String {
    "bearer".to_string()
}

/// Body of `POST /auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Profile fields that can be changed. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProfileUpdate {
    /// Build an update from form input.
    ///
    /// Blank fields are dropped; a non-blank password must match its
    /// confirmation.
    pub fn from_form(name: &str, password: &str, confirm_password: &str) -> Result<Self, crate::Error> {
        if !password.is_empty() && password != confirm_password {
            return Err(crate::Error::validation("Passwords do not match"));
        }

        Ok(Self {
            name: non_blank(name),
            password: if password.is_empty() {
                None
            } else {
                Some(password.to_string())
            },
        })
    }

    /// Whether nothing would be sent
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.password.is_none()
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_update_skips_blank_fields() {
        let update = ProfileUpdate::from_form("  ", "", "").unwrap();
        assert!(update.is_empty());
        assert_eq!(serde_json::to_string(&update).unwrap(), "{}");
    }

    #[test]
    fn profile_update_rejects_mismatched_passwords() {
        let err = ProfileUpdate::from_form("Lina", "secret1", "secret2").unwrap_err();
        assert_eq!(err.user_message(), "Passwords do not match");
    }

    #[test]
    fn profile_deserializes_without_optional_fields() {
        let user: UserProfile =
            serde_json::from_str(r#"{"id":7,"email":"a@b.jo"}"#).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.name, None);
        assert!(!user.is_placeholder());
    }
}
