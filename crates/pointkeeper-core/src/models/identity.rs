use std::fmt;

use serde::{Deserialize, Serialize};

/// The logged-in user as persisted under the `user` storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
}

impl Identity {
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref().filter(|s| !s.is_empty()) {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

/// User record as returned by the login endpoint. Carries a few fields
/// (`name`) the client does not keep; see [`LoginUser::into_identity`].
#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub id: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
}

impl LoginUser {
    pub fn into_identity(self) -> Identity {
        Identity {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_uses_camel_case_keys() {
        let identity = Identity {
            id: "1".to_string(),
            first_name: "Ada".to_string(),
            last_name: Some("Lovelace".to_string()),
            email: "ada@example.com".to_string(),
        };
        let json = serde_json::to_value(&identity).expect("serialize identity");
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["lastName"], "Lovelace");
        assert!(json.get("first_name").is_none());
    }

    #[test]
    fn test_identity_without_last_name() {
        let identity: Identity =
            serde_json::from_str(r#"{"id":"1","firstName":"A","email":"a@b.com"}"#)
                .expect("parse identity");
        assert_eq!(identity.last_name, None);
        assert_eq!(identity.display_name(), "A");
    }

    #[test]
    fn test_login_response_drops_name() {
        let json = r#"{"token":"t1","user":{"id":"1","firstName":"A","lastName":"B","name":"A B","email":"a@b.com"}}"#;
        let response: LoginResponse = serde_json::from_str(json).expect("parse login response");
        assert_eq!(response.token, "t1");
        let identity = response.user.into_identity();
        assert_eq!(identity.display_name(), "A B");
        assert_eq!(identity.email, "a@b.com");
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = LoginCredentials {
            email: "a@b.com".to_string(),
            password: "hunter2".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("a@b.com"));
        assert!(!debug.contains("hunter2"));
    }
}
