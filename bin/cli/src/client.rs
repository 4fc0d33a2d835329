//! HTTP client for the mon server.

use crate::error::CliError;
use mon_core::{AccountId, BalanceId};
use mon_ledger::{Account, AccountDetails, Balance, BalanceDetails};
use reqwest::{Method, RequestBuilder};
use rootcause::prelude::{Report, ResultExt};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of the auth server's `GET /loginurl`.
#[derive(Debug, Deserialize)]
struct LoginUrlResponse {
    login_url: String,
}

/// Asks the auth server for a provider login URL.
///
/// # Errors
///
/// Returns `CliError` if the server cannot be reached or answers with
/// anything other than a login URL.
pub async fn fetch_login_url(auth_server_url: &str) -> Result<String, Report<CliError>> {
    let url = format!("{}/loginurl", auth_server_url.trim_end_matches('/'));
    let http = http_client()?;
    let response: LoginUrlResponse = send(http.get(&url), &url).await?;
    Ok(response.login_url)
}

fn http_client() -> Result<reqwest::Client, Report<CliError>> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context(CliError::Request { url: String::new() })
}

async fn execute(request: RequestBuilder, url: &str) -> Result<reqwest::Response, Report<CliError>> {
    let response = request.send().await.context_with(|| CliError::Request {
        url: url.to_string(),
    })?;

    let status = response.status();
    debug!(%url, %status, "response received");
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CliError::Status {
        status: status.as_u16(),
        body: body.trim().to_string(),
    }
    .into())
}

async fn send<T: DeserializeOwned>(request: RequestBuilder, url: &str) -> Result<T, Report<CliError>> {
    execute(request, url)
        .await?
        .json()
        .await
        .context_with(|| CliError::Decode {
            url: url.to_string(),
        })
}

/// Client for the ledger API.
#[derive(Debug, Clone)]
pub struct MonClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl MonClient {
    /// Creates a client for the server at `base_url`, authenticating with
    /// `token` when one is given.
    ///
    /// # Errors
    ///
    /// Returns `MissingSetting` if the server URL is empty.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, Report<CliError>> {
        if base_url.trim().is_empty() {
            return Err(CliError::MissingSetting {
                setting: "server url",
            }
            .into());
        }
        Ok(Self {
            http: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> (RequestBuilder, String) {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.http.request(method, &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        (request, url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Report<CliError>> {
        let (request, url) = self.request(Method::GET, path);
        send(request, &url).await
    }

    async fn delete(&self, path: &str) -> Result<(), Report<CliError>> {
        let (request, url) = self.request(Method::DELETE, path);
        execute(request, &url).await?;
        Ok(())
    }

    pub async fn accounts(&self) -> Result<Vec<Account>, Report<CliError>> {
        self.get("/accounts").await
    }

    pub async fn account(&self, id: AccountId) -> Result<Account, Report<CliError>> {
        self.get(&format!("/accounts/{id}")).await
    }

    pub async fn create_account(
        &self,
        details: &AccountDetails,
    ) -> Result<Account, Report<CliError>> {
        let (request, url) = self.request(Method::POST, "/accounts");
        send(request.json(details), &url).await
    }

    pub async fn delete_account(&self, id: AccountId) -> Result<(), Report<CliError>> {
        self.delete(&format!("/accounts/{id}")).await
    }

    /// Lists an account's balances, oldest first.
    pub async fn balances(&self, account_id: AccountId) -> Result<Vec<Balance>, Report<CliError>> {
        self.get(&format!("/accounts/{account_id}/balances")).await
    }

    pub async fn add_balance(
        &self,
        account_id: AccountId,
        details: &BalanceDetails,
    ) -> Result<Balance, Report<CliError>> {
        let (request, url) = self.request(Method::POST, &format!("/accounts/{account_id}/balances"));
        send(request.json(details), &url).await
    }

    pub async fn balance(&self, id: BalanceId) -> Result<Balance, Report<CliError>> {
        self.get(&format!("/balances/{id}")).await
    }

    pub async fn delete_balance(&self, id: BalanceId) -> Result<(), Report<CliError>> {
        self.delete(&format!("/balances/{id}")).await
    }
}
