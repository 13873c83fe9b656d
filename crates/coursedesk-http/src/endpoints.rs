//! Endpoint paths and request/response bodies.

use serde::{Deserialize, Serialize};

// ============================================================================
// Endpoint Paths
// ============================================================================

/// Exchange credentials for a token pair.
pub const LOGIN: &str = "login/";

/// Create an account. Returns the user, no tokens.
pub const REGISTER: &str = "register/";

/// Exchange a refresh token for a new pair.
pub const REFRESH: &str = "token/refresh/";

/// The authenticated user's profile (GET/PUT).
pub const PROFILE: &str = "profile/";

/// Endpoints whose 401 means "bad credentials", never "expired session".
pub(crate) fn is_auth_endpoint(path: &str) -> bool {
    let path = path.trim_start_matches('/');
    path == LOGIN || path == REFRESH
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for the refresh endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response from the refresh endpoint.
///
/// `refresh` is only present when the server rotates refresh tokens.
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_endpoints_are_exempt() {
        assert!(is_auth_endpoint("login/"));
        assert!(is_auth_endpoint("/token/refresh/"));
        assert!(!is_auth_endpoint("courses/"));
        assert!(!is_auth_endpoint("profile/"));
        assert!(!is_auth_endpoint("register/"));
    }
}
