//! User identity and access-token claim decoding.
//!
//! The client never verifies token signatures; it only reads the payload to
//! learn who is logged in. The server remains the authority on validity.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::InvalidInputError;
use crate::tokens::AccessToken;
use crate::Result;

/// The user a session belongs to.
///
/// Built from access-token claims at login, then replaced by the server's
/// profile representation when one is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Audience claim; JWTs allow either a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn first(&self) -> Option<&str> {
        match self {
            Audience::One(aud) => Some(aud),
            Audience::Many(auds) => auds.first().map(String::as_str),
        }
    }
}

/// The subset of access-token claims the client reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Claims {
    #[serde(deserialize_with = "numeric_id")]
    pub user_id: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub aud: Option<Audience>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Accept a user id issued either as a JSON number or as a numeric string.
fn numeric_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("user_id {:?} is not numeric", text))),
    }
}

impl Claims {
    /// Decode the payload segment of a JWT without verifying it.
    pub fn decode(token: &str) -> Result<Self> {
        let invalid = |reason: String| InvalidInputError::Token { reason };

        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_)) if segments.next().is_none() => payload,
            _ => return Err(invalid("expected three dot-separated segments".into()).into()),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| invalid(format!("payload is not base64url: {}", e)))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| invalid(format!("payload is not a claim set: {}", e)).into())
    }
}

impl From<Claims> for Identity {
    /// Map claims to an identity: `username` falls back to the first audience,
    /// every missing text field becomes empty.
    fn from(claims: Claims) -> Self {
        let username = match claims.username {
            Some(username) => username,
            None => claims
                .aud
                .as_ref()
                .and_then(Audience::first)
                .unwrap_or_default()
                .to_string(),
        };

        Self {
            id: claims.user_id,
            username,
            email: claims.email.unwrap_or_default(),
            first_name: claims.first_name.unwrap_or_default(),
            last_name: claims.last_name.unwrap_or_default(),
        }
    }
}

impl Identity {
    /// Derive the identity carried by an access token.
    pub fn from_access_token(token: &AccessToken) -> Result<Self> {
        Claims::decode(token.as_str()).map(Identity::from)
    }

    /// Full name for display, or the username when no name is set.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Changed profile fields; absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jwt(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn minimal_claims_fill_defaults() {
        let token = AccessToken::new(jwt(json!({"user_id": 1, "username": "alice"})));
        let identity = Identity::from_access_token(&token).unwrap();
        assert_eq!(
            identity,
            Identity {
                id: 1,
                username: "alice".into(),
                email: String::new(),
                first_name: String::new(),
                last_name: String::new(),
            }
        );
    }

    #[test]
    fn username_falls_back_to_audience() {
        let token = AccessToken::new(jwt(json!({"user_id": 7, "aud": "carol"})));
        assert_eq!(Identity::from_access_token(&token).unwrap().username, "carol");

        let token = AccessToken::new(jwt(json!({"user_id": 7, "aud": ["dave", "web"]})));
        assert_eq!(Identity::from_access_token(&token).unwrap().username, "dave");

        let token = AccessToken::new(jwt(json!({"user_id": 7})));
        assert_eq!(Identity::from_access_token(&token).unwrap().username, "");
    }

    #[test]
    fn full_claims_are_copied() {
        let token = AccessToken::new(jwt(json!({
            "token_type": "access",
            "exp": 1_900_000_000,
            "user_id": 3,
            "username": "erin",
            "email": "erin@example.com",
            "first_name": "Erin",
            "last_name": "Lee"
        })));
        let identity = Identity::from_access_token(&token).unwrap();
        assert_eq!(identity.email, "erin@example.com");
        assert_eq!(identity.display_name(), "Erin Lee");
    }

    #[test]
    fn string_user_id_is_accepted() {
        let token = AccessToken::new(jwt(json!({"user_id": "1", "username": "alice"})));
        let identity = Identity::from_access_token(&token).unwrap();
        assert_eq!(identity.id, 1);
        assert_eq!(identity.username, "alice");

        let token = AccessToken::new(jwt(json!({"user_id": "abc"})));
        assert!(Identity::from_access_token(&token).is_err());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for bad in ["", "not-a-jwt", "a.b", "a.!!!.c", "a.b.c.d"] {
            assert!(
                Identity::from_access_token(&AccessToken::new(bad)).is_err(),
                "{bad:?} should not decode"
            );
        }
        let no_user = AccessToken::new(jwt(json!({"username": "alice"})));
        assert!(Identity::from_access_token(&no_user).is_err());
    }

    #[test]
    fn profile_update_sends_only_changed_fields() {
        let update = ProfileUpdate {
            first_name: Some("Alice".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"first_name": "Alice"})
        );
        assert!(ProfileUpdate::default().is_empty());
    }
}
