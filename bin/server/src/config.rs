//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__`
//! separating nested sections (`AUTHORISATION__EMAIL`, `LOGIN__CLIENT_ID`).
//!
//! See [`AuthorisationConfig`] and [`LoginConfig`] for the authentication
//! settings.

use mon_auth::{AuthorisationConfig, ConfigurationError, LoginConfig};
use rootcause::prelude::Report;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Upper bound on pooled database connections.
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// Who may call the protected API, and how their tokens are checked.
    pub authorisation: AuthorisationConfig,

    /// OAuth2 login settings. The login endpoints are only mounted when set.
    #[serde(default)]
    pub login: Option<LoginConfig>,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_database_max_connections() -> u32 {
    5
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(
            config::Environment::default()
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_source<T>(source: T) -> Result<Self, config::ConfigError>
    where
        T: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    /// Checks the settings the deserializer cannot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` naming the first unusable setting.
    pub fn validate(&self) -> Result<(), Report<ConfigurationError>> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigurationError::Missing {
                setting: "database url",
            }
            .into());
        }
        if self.bind_address.trim().is_empty() {
            return Err(ConfigurationError::Missing {
                setting: "bind address",
            }
            .into());
        }
        self.authorisation.validate()?;
        if let Some(login) = &self.login {
            login.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, config::ConfigError> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_source(
            config::Environment::default()
                .separator("__")
                .try_parsing(true)
                .source(Some(env)),
        )
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/mon"),
        ("AUTHORISATION__DOMAIN", "mon.eu.auth0.com"),
        ("AUTHORISATION__EMAIL", "me@example.com"),
    ];

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(REQUIRED).expect("config");

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.database_max_connections, 5);
        assert!(config.login.is_none());
        assert!(config.authorisation.authorised_identity().requires_verified_email());
        config.validate().expect("valid");
    }

    #[test]
    fn login_section_is_read_when_present() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("LOGIN__DOMAIN", "mon.eu.auth0.com"),
            ("LOGIN__CLIENT_ID", "client"),
            ("LOGIN__CLIENT_SECRET", "secret"),
            ("LOGIN__CALLBACK_URL", "https://mon.example.com/logincallback"),
            ("LOGIN__EXCHANGE_TIMEOUT_SECONDS", "3"),
        ]);

        let config = load(&vars).expect("config");
        let login = config.login.as_ref().expect("login section");

        assert_eq!(login.client_id(), "client");
        assert_eq!(login.exchange_timeout().as_secs(), 3);
        assert_eq!(login.scopes(), vec!["openid", "email"]);
        config.validate().expect("valid");
    }

    #[test]
    fn missing_authorisation_fails_to_load() {
        assert!(load(&[("DATABASE_URL", "postgres://localhost/mon")]).is_err());
    }

    #[test]
    fn empty_email_fails_validation() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/mon"),
            ("AUTHORISATION__DOMAIN", "mon.eu.auth0.com"),
            ("AUTHORISATION__EMAIL", ""),
        ])
        .expect("config");

        let report = config.validate().expect_err("no email");
        assert!(matches!(
            report.current_context(),
            ConfigurationError::Missing { .. }
        ));
    }
}
