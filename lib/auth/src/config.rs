//! Provider and authorisation settings.
//!
//! Both types deserialize from the server's configuration. Endpoint URLs
//! are derived from the provider domain the way Auth0 lays them out.

use crate::error::ConfigurationError;
use crate::identity::AuthorisedIdentity;
use mon_core::Result;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Settings for the OAuth2 login flow.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Clone, Deserialize)]
pub struct LoginConfig {
    /// The provider's domain (e.g. "example.eu.auth0.com").
    domain: String,
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// Where the provider redirects after login (e.g. "https://mon.example.com/logincallback").
    callback_url: String,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "openid,email"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// Upper bound on the authorization code exchange.
    /// Default: 10
    #[serde(default = "default_exchange_timeout_seconds")]
    exchange_timeout_seconds: u64,
}

fn default_scopes() -> String {
    "openid,email".to_string()
}

fn default_exchange_timeout_seconds() -> u64 {
    10
}

impl LoginConfig {
    /// Creates a login configuration with defaults for optional fields.
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            callback_url: callback_url.into(),
            scopes: default_scopes(),
            exchange_timeout_seconds: default_exchange_timeout_seconds(),
        }
    }

    /// Replaces the requested scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scopes = scopes.join(",");
        self
    }

    #[must_use]
    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout_seconds = timeout.as_secs();
        self
    }

    /// Checks that every required setting is present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` naming the first unusable setting.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_domain("login domain", &self.domain)?;
        require("client id", &self.client_id)?;
        require("client secret", &self.client_secret)?;
        require("callback url", &self.callback_url)?;
        if self.scopes().is_empty() {
            return Err(ConfigurationError::Missing { setting: "scopes" }.into());
        }
        if self.exchange_timeout_seconds == 0 {
            return Err(ConfigurationError::Invalid {
                setting: "exchange timeout",
                reason: "must be at least one second".to_string(),
            }
            .into());
        }
        Ok(())
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    #[must_use]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Returns the provider's authorization endpoint.
    #[must_use]
    pub fn authorize_url(&self) -> String {
        format!("https://{}/authorize", self.domain)
    }

    /// Returns the provider's token endpoint.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("https://{}/oauth/token", self.domain)
    }

    /// Returns the OAuth2 scopes to request, parsed from comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    #[must_use]
    pub fn exchange_timeout(&self) -> Duration {
        Duration::from_secs(self.exchange_timeout_seconds)
    }
}

impl fmt::Debug for LoginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginConfig")
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("callback_url", &self.callback_url)
            .field("scopes", &self.scopes)
            .field("exchange_timeout_seconds", &self.exchange_timeout_seconds)
            .finish()
    }
}

/// Settings for authorising API requests.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorisationConfig {
    /// The provider domain whose signing keys and issuer are trusted.
    domain: String,
    /// The one email address allowed to use the API.
    email: String,
    /// Default: true
    #[serde(default = "default_require_verified_email")]
    require_verified_email: bool,
    /// Expected `aud` claim; not checked when absent.
    #[serde(default)]
    audience: Option<String>,
    /// Default: 300
    #[serde(default = "default_jwks_cache_ttl_seconds")]
    jwks_cache_ttl_seconds: u64,
}

fn default_require_verified_email() -> bool {
    true
}

fn default_jwks_cache_ttl_seconds() -> u64 {
    300
}

impl AuthorisationConfig {
    #[must_use]
    pub fn new(domain: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            email: email.into(),
            require_verified_email: default_require_verified_email(),
            audience: None,
            jwks_cache_ttl_seconds: default_jwks_cache_ttl_seconds(),
        }
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    #[must_use]
    pub fn with_require_verified_email(mut self, required: bool) -> Self {
        self.require_verified_email = required;
        self
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError` if the domain or email is missing.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_domain("authorisation domain", &self.domain)?;
        require("authorised email", &self.email)?;
        Ok(())
    }

    /// Returns the URL of the provider's JSON Web Key Set.
    #[must_use]
    pub fn jwks_url(&self) -> String {
        format!("https://{}/.well-known/jwks.json", self.domain)
    }

    /// Returns the issuer tokens must carry.
    #[must_use]
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.domain)
    }

    #[must_use]
    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    #[must_use]
    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_seconds)
    }

    #[must_use]
    pub fn authorised_identity(&self) -> AuthorisedIdentity {
        AuthorisedIdentity::new(self.email.clone(), self.require_verified_email)
    }
}

fn require(setting: &'static str, value: &str) -> Result<(), ConfigurationError> {
    if value.trim().is_empty() {
        return Err(ConfigurationError::Missing { setting }.into());
    }
    Ok(())
}

fn validate_domain(setting: &'static str, domain: &str) -> Result<(), ConfigurationError> {
    require(setting, domain)?;
    if domain.contains('/') {
        return Err(ConfigurationError::Invalid {
            setting,
            reason: format!("expected a bare host name, got {domain:?}"),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_config_deserializes_with_defaults() {
        let json = r#"{
            "domain": "mon.eu.auth0.com",
            "client_id": "my-client",
            "client_secret": "secret",
            "callback_url": "https://mon.example.com/logincallback"
        }"#;

        let config: LoginConfig = serde_json::from_str(json).expect("deserialize");

        assert_eq!(config.scopes(), vec!["openid", "email"]);
        assert_eq!(config.exchange_timeout(), Duration::from_secs(10));
        assert_eq!(config.authorize_url(), "https://mon.eu.auth0.com/authorize");
        assert_eq!(config.token_url(), "https://mon.eu.auth0.com/oauth/token");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn login_config_debug_hides_secret() {
        let config = LoginConfig::new("d", "id", "super-secret", "https://cb");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn login_config_requires_client_secret() {
        let config = LoginConfig::new("mon.eu.auth0.com", "id", "", "https://cb");
        let report = config.validate().expect_err("should be invalid");
        assert_eq!(
            report.current_context(),
            &ConfigurationError::Missing {
                setting: "client secret"
            }
        );
    }

    #[test]
    fn domain_with_scheme_is_rejected() {
        let config = AuthorisationConfig::new("https://mon.eu.auth0.com", "me@example.com");
        assert!(config.validate().is_err());
    }

    #[test]
    fn authorisation_config_requires_email() {
        let config = AuthorisationConfig::new("mon.eu.auth0.com", " ");
        let report = config.validate().expect_err("should be invalid");
        assert_eq!(report.current_context().to_string(), "no authorised email given");
    }

    #[test]
    fn authorisation_config_derives_provider_urls() {
        let json = r#"{"domain": "mon.eu.auth0.com", "email": "me@example.com"}"#;
        let config: AuthorisationConfig = serde_json::from_str(json).expect("deserialize");

        assert_eq!(config.jwks_url(), "https://mon.eu.auth0.com/.well-known/jwks.json");
        assert_eq!(config.issuer(), "https://mon.eu.auth0.com/");
        assert_eq!(config.audience(), None);
        assert_eq!(config.jwks_cache_ttl(), Duration::from_secs(300));

        let identity = config.authorised_identity();
        assert_eq!(identity.email(), "me@example.com");
        assert!(identity.requires_verified_email());
    }
}
