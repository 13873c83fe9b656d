//! Transport configuration.

use std::time::Duration;

use url::Url;

use coursedesk_core::Result;
use coursedesk_core::error::InvalidInputError;

/// API base used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/";

/// Route a consumer should show when the session ends.
pub const LOGIN_ROUTE: &str = "/login";

/// Settings for an [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    user_agent: String,
    timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a configuration for the given API base URL.
    ///
    /// The base must be `http` or `https`. A trailing slash is added if
    /// missing so relative endpoint paths resolve beneath it.
    pub fn new(base_url: &str) -> Result<Self> {
        let invalid = |reason: &str| InvalidInputError::ApiUrl {
            value: base_url.to_string(),
            reason: reason.to_string(),
        };

        let mut url = Url::parse(base_url).map_err(|e| invalid(&e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https").into());
        }
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot be used as a base").into());
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("base URL must not carry a query or fragment").into());
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            base_url: url,
            user_agent: concat!("coursedesk/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: None,
        })
    }

    /// Abort requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Resolve an endpoint path against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| {
                InvalidInputError::Other {
                    message: format!("bad endpoint path '{}': {}", path, e),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_trailing_slash() {
        let config = ClientConfig::new("https://api.example.com/api").unwrap();
        assert_eq!(config.base_url().as_str(), "https://api.example.com/api/");
        assert_eq!(
            config.endpoint("token/refresh/").unwrap().as_str(),
            "https://api.example.com/api/token/refresh/"
        );
    }

    #[test]
    fn leading_slash_stays_under_base() {
        let config = ClientConfig::new(DEFAULT_API_URL).unwrap();
        assert_eq!(
            config.endpoint("/courses/3/").unwrap().as_str(),
            "http://127.0.0.1:8000/api/courses/3/"
        );
    }

    #[test]
    fn rejects_bad_bases() {
        assert!(ClientConfig::new("not a url").is_err());
        assert!(ClientConfig::new("ftp://example.com/").is_err());
        assert!(ClientConfig::new("mailto:alice@example.com").is_err());
        assert!(ClientConfig::new("https://example.com/api/?x=1").is_err());
    }

    #[test]
    fn builder_options() {
        let config = ClientConfig::new(DEFAULT_API_URL)
            .unwrap()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("tests");
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.user_agent(), "tests");
    }
}
