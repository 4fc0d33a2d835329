use super::exchanger::{AuthCodeExchanger, ProviderToken};
use crate::config::LoginConfig;
use crate::error::{ConfigurationError, ExchangeError};
use async_trait::async_trait;
use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenType,
};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, ExtraTokenFields, RedirectUrl,
    Scope, StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
};
use mon_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

/// Every token response field outside the OAuth2 core set, `id_token` included.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
struct ProviderExtraFields {
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl ExtraTokenFields for ProviderExtraFields {}

type ProviderTokenResponse = StandardTokenResponse<ProviderExtraFields, BasicTokenType>;

type ProviderClient = oauth2::Client<
    BasicErrorResponse,
    ProviderTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
>;

/// Exchanges authorization codes with a standard OAuth2 provider.
#[derive(Clone)]
pub struct OAuth2CodeExchanger {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    scopes: Vec<Scope>,
    http_client: reqwest::Client,
}

impl OAuth2CodeExchanger {
    /// Creates an exchanger for the provider described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a setting is missing or a derived URL
    /// does not parse.
    pub fn new(config: &LoginConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Self::with_endpoints(
            config.client_id(),
            config.client_secret(),
            &config.authorize_url(),
            &config.token_url(),
            config.callback_url(),
            &config.scopes(),
        )
    }

    /// Creates an exchanger with explicit endpoint URLs.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a URL does not parse.
    pub fn with_endpoints(
        client_id: &str,
        client_secret: &str,
        auth_url: &str,
        token_url: &str,
        redirect_url: &str,
        scopes: &[&str],
    ) -> Result<Self, ConfigurationError> {
        let invalid = |setting: &'static str| {
            move |e: oauth2::url::ParseError| ConfigurationError::Invalid {
                setting,
                reason: e.to_string(),
            }
        };

        let http_client = reqwest::Client::builder()
            // Following redirects from the token endpoint would allow SSRF.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ConfigurationError::Invalid {
                setting: "oauth2 http client",
                reason: e.to_string(),
            })?;

        Ok(Self {
            client_id: ClientId::new(client_id.to_string()),
            client_secret: ClientSecret::new(client_secret.to_string()),
            auth_url: AuthUrl::new(auth_url.to_string()).map_err(invalid("authorize url"))?,
            token_url: TokenUrl::new(token_url.to_string()).map_err(invalid("token url"))?,
            redirect_url: RedirectUrl::new(redirect_url.to_string())
                .map_err(invalid("callback url"))?,
            scopes: scopes.iter().map(|s| Scope::new((*s).to_string())).collect(),
            http_client,
        })
    }

    fn client(&self) -> ProviderClient {
        ProviderClient::new(self.client_id.clone())
    }
}

#[async_trait]
impl AuthCodeExchanger for OAuth2CodeExchanger {
    fn auth_code_url(&self, state: &str) -> String {
        let client = self
            .client()
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let state = state.to_string();
        let mut request = client.authorize_url(move || CsrfToken::new(state));
        for scope in &self.scopes {
            request = request.add_scope(scope.clone());
        }

        let (url, _csrf_token) = request.url();
        url.to_string()
    }

    #[instrument(skip_all, fields(token_url = %self.token_url.url()))]
    async fn exchange(&self, code: &str) -> Result<ProviderToken, ExchangeError> {
        let client = self
            .client()
            .set_client_secret(self.client_secret.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let response: ProviderTokenResponse = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| ExchangeError::Provider {
                details: e.to_string(),
            })?;

        Ok(ProviderToken::new(
            response.access_token().secret().clone(),
            response.extra_fields().fields.clone(),
        ))
    }
}
