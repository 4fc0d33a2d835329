use crate::error::ExchangeError;
use async_trait::async_trait;
use mon_core::Result;
use serde_json::{Map, Value};
use std::fmt;

/// A token response from the provider's token endpoint.
#[derive(Clone, PartialEq)]
pub struct ProviderToken {
    access_token: String,
    extra: Map<String, Value>,
}

impl ProviderToken {
    #[must_use]
    pub fn new(access_token: impl Into<String>, extra: Map<String, Value>) -> Self {
        Self {
            access_token: access_token.into(),
            extra,
        }
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns a response field outside the OAuth2 core set.
    #[must_use]
    pub fn extra(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Returns the OpenID Connect identity token, if present and non-empty.
    #[must_use]
    pub fn id_token(&self) -> Option<&str> {
        self.extra("id_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
    }
}

impl fmt::Debug for ProviderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderToken")
            .field("access_token", &"[redacted]")
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The OAuth2 provider side of the login flow.
#[async_trait]
pub trait AuthCodeExchanger: Send + Sync {
    /// Returns the provider's authorization URL carrying `state`.
    fn auth_code_url(&self, state: &str) -> String;

    /// Exchanges an authorization code for a token.
    ///
    /// # Errors
    ///
    /// Returns `ExchangeError::Provider` if the provider rejects the code or
    /// cannot be reached.
    async fn exchange(&self, code: &str) -> Result<ProviderToken, ExchangeError>;
}
