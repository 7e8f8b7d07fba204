//! # Client Configuration
//!
//! [`ClientConfig`] is the only input the adapter needs besides its transport. It is plain
//! data: build it in code or deserialize it from whatever configuration source the embedding
//! application already has.
use http::{HeaderValue, Uri, header::InvalidHeaderValue, uri::InvalidUri};
use serde::Deserialize;

/// Errors that can occur when turning a [`ClientConfig`] into a client.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid base uri '{uri}': '{source}'")]
    InvalidBaseUri { uri: String, source: InvalidUri },
    #[error("Authorization token is not a valid header value: '{0}'")]
    InvalidAuthorizationToken(#[source] InvalidHeaderValue),
}

/// Where to send calls and how to authenticate them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Prefix every method path is appended to (e.g. `https://gateway.example.com`).
    ///
    /// No normalization happens: `base_uri` and the method path are concatenated verbatim.
    pub base_uri: String,
    /// Bearer token sent with every request. `None` and the empty string both disable
    /// the `Authorization` header.
    #[serde(default)]
    pub authorization_token: Option<String>,
}

impl ClientConfig {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            authorization_token: None,
        }
    }

    pub fn with_authorization_token(mut self, token: impl Into<String>) -> Self {
        self.authorization_token = Some(token.into());
        self
    }

    /// Checks that `base_uri` parses on its own, so obviously broken configurations fail
    /// when the client is built rather than on the first call.
    pub(crate) fn validate_base_uri(&self) -> Result<(), ConfigError> {
        self.base_uri
            .parse::<Uri>()
            .map(|_| ())
            .map_err(|source| ConfigError::InvalidBaseUri {
                uri: self.base_uri.clone(),
                source,
            })
    }

    /// Builds the `Authorization` header value, if a non-empty token is configured.
    pub(crate) fn authorization_header(&self) -> Result<Option<HeaderValue>, ConfigError> {
        let Some(token) = self.authorization_token.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(ConfigError::InvalidAuthorizationToken)?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_disables_authorization() {
        let config = ClientConfig::new("http://svc.local").with_authorization_token("");
        assert!(config.authorization_header().unwrap().is_none());

        let config = ClientConfig::new("http://svc.local");
        assert!(config.authorization_header().unwrap().is_none());
    }

    #[test]
    fn token_becomes_sensitive_bearer_header() {
        let config = ClientConfig::new("http://svc.local").with_authorization_token("abc");
        let header = config.authorization_header().unwrap().unwrap();

        assert_eq!(header, "Bearer abc");
        assert!(header.is_sensitive());
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let config = ClientConfig::new("http://svc.local").with_authorization_token("a\nb");

        assert!(matches!(
            config.authorization_header(),
            Err(ConfigError::InvalidAuthorizationToken(_))
        ));
    }

    #[test]
    fn base_uri_must_parse() {
        assert!(ClientConfig::new("http://svc.local").validate_base_uri().is_ok());

        let config = ClientConfig::new("http://bad host");
        assert!(matches!(
            config.validate_base_uri(),
            Err(ConfigError::InvalidBaseUri { .. })
        ));
    }

    #[test]
    fn deserializes_without_token() {
        let config: ClientConfig =
            serde_json::from_value(serde_json::json!({ "base_uri": "http://svc.local" })).unwrap();

        assert_eq!(config, ClientConfig::new("http://svc.local"));
    }
}
