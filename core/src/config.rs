//! Client configuration.

use std::fmt;

use crate::error::ApiError;

pub const ENV_API_URL: &str = "FARMOPSX_API_URL";
pub const ENV_API_TOKEN: &str = "FARMOPSX_API_TOKEN";

/// Bearer token that never shows up in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<secret>")
    }
}

impl fmt::Display for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<secret>")
    }
}

impl From<&str> for SecretToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for SecretToken {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

/// Everything a request needs besides its own target and options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    token: Option<SecretToken>,
    resource: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            resource: None,
        }
    }

    /// Read `FARMOPSX_API_URL` (required) and `FARMOPSX_API_TOKEN` (optional).
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let base_url = lookup(ENV_API_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ApiError::ConfigError(format!("{ENV_API_URL} is not set")))?;
        let mut config = Self::new(base_url.trim());
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|t| !t.is_empty()) {
            config.token = Some(SecretToken::new(token));
        }
        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<SecretToken>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&SecretToken> {
        self.token.as_ref()
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    pub(crate) fn set_token(&mut self, token: SecretToken) {
        self.token = Some(token);
    }

    pub(crate) fn set_resource(&mut self, resource: Option<String>) {
        self.resource = resource;
    }
}
