use super::exchanger::AuthCodeExchanger;
use super::state::CsrfStateStore;
use crate::error::{ExchangeError, LoginError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mon_core::Result;
use rootcause::prelude::{Report, ResultExt};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Number of random bytes in a CSRF state value.
const STATE_BYTES: usize = 32;

/// Produces CSRF state values.
pub type StateGenerator = Arc<dyn Fn() -> Result<String, LoginError> + Send + Sync>;

/// Generates 32 bytes of OS randomness, base64 encoded.
///
/// # Errors
///
/// Returns `StateGeneration` if the OS random source fails.
pub fn generate_state_value() -> Result<String, LoginError> {
    let mut bytes = [0u8; STATE_BYTES];
    getrandom::fill(&mut bytes).context(LoginError::StateGeneration)?;
    Ok(STANDARD.encode(bytes))
}

/// Query parameters of the provider's redirect back to us.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub state: Option<String>,
    pub code: Option<String>,
    /// Set by the provider when the user did not complete the login.
    pub error: Option<String>,
}

/// The identity token obtained by a completed login.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityToken(String);

impl IdentityToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdentityToken([redacted])")
    }
}

/// Issues login URLs and completes logins on callback.
pub struct LoginFlow {
    exchanger: Arc<dyn AuthCodeExchanger>,
    state: CsrfStateStore,
    generate_state: StateGenerator,
    exchange_timeout: Duration,
}

impl LoginFlow {
    pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

    #[must_use]
    pub fn new(exchanger: Arc<dyn AuthCodeExchanger>) -> Self {
        Self {
            exchanger,
            state: CsrfStateStore::new(),
            generate_state: Arc::new(generate_state_value),
            exchange_timeout: Self::DEFAULT_EXCHANGE_TIMEOUT,
        }
    }

    /// Bounds how long the code exchange may take.
    #[must_use]
    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_state_generator(mut self, generator: StateGenerator) -> Self {
        self.generate_state = generator;
        self
    }

    /// Returns a provider login URL bound to a fresh CSRF state.
    ///
    /// Any login started from an earlier URL can no longer complete.
    ///
    /// # Errors
    ///
    /// Returns `StateGeneration` if no random state could be produced; the
    /// previously stored state is left in place.
    pub fn issue_login_url(&self) -> Result<String, LoginError> {
        let state = (self.generate_state)()?;
        self.state.set(state.clone());
        debug!("issued login url");
        Ok(self.exchanger.auth_code_url(&state))
    }

    /// Completes a login from the provider's redirect.
    ///
    /// The state is checked before the code so a forged callback never
    /// reaches the provider. The stored state is left in place afterwards.
    ///
    /// # Errors
    ///
    /// Returns a report whose current context is the [`LoginError`] for the
    /// first check that failed. Exchange failures keep the provider error
    /// as the cause.
    #[instrument(skip_all)]
    pub async fn handle_callback(
        &self,
        params: &CallbackParams,
    ) -> Result<IdentityToken, LoginError> {
        let expected = self.state.get().ok_or(LoginError::StateNotIssued)?;
        if params.state.as_deref() != Some(expected.as_str()) {
            return Err(LoginError::CsrfMismatch.into());
        }

        let Some(code) = params.code.as_deref().filter(|code| !code.is_empty()) else {
            if let Some(error) = &params.error {
                debug!(provider_error = %error, "callback without code");
            }
            return Err(LoginError::MissingCode.into());
        };

        let token = match tokio::time::timeout(self.exchange_timeout, self.exchanger.exchange(code)).await
        {
            Ok(Ok(token)) => token,
            Ok(Err(report)) => return Err(report.context(LoginError::Exchange)),
            Err(_) => {
                let timeout: Report<ExchangeError> = ExchangeError::Timeout {
                    after: self.exchange_timeout,
                }
                .into();
                return Err(timeout.context(LoginError::Exchange));
            }
        };

        let id_token = token.id_token().ok_or(LoginError::MissingIdToken)?;
        debug!("login completed");
        Ok(IdentityToken(id_token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::login::exchanger::ProviderToken;
    use async_trait::async_trait;
    use serde_json::{Map, Value, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeExchanger {
        response: std::result::Result<Value, ExchangeError>,
        delay: Duration,
        codes: Mutex<Vec<String>>,
    }

    impl FakeExchanger {
        fn returning(extra: Value) -> Self {
            Self {
                response: Ok(extra),
                delay: Duration::ZERO,
                codes: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: ExchangeError) -> Self {
            Self {
                response: Err(error),
                delay: Duration::ZERO,
                codes: Mutex::new(Vec::new()),
            }
        }

        fn codes(&self) -> Vec<String> {
            self.codes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AuthCodeExchanger for FakeExchanger {
        fn auth_code_url(&self, state: &str) -> String {
            format!("https://provider.example.com/authorize?state={state}")
        }

        async fn exchange(&self, code: &str) -> Result<ProviderToken, ExchangeError> {
            self.codes.lock().unwrap().push(code.to_string());
            tokio::time::sleep(self.delay).await;
            match &self.response {
                Ok(Value::Object(extra)) => Ok(ProviderToken::new("access", extra.clone())),
                Ok(_) => Ok(ProviderToken::new("access", Map::new())),
                Err(err) => Err(err.clone().into()),
            }
        }
    }

    fn sequence(states: &'static [&'static str]) -> StateGenerator {
        let next = AtomicUsize::new(0);
        Arc::new(move || {
            let i = next.fetch_add(1, Ordering::SeqCst);
            Ok(states[i % states.len()].to_string())
        })
    }

    fn flow(exchanger: Arc<FakeExchanger>) -> LoginFlow {
        LoginFlow::new(exchanger).with_state_generator(sequence(&["S1", "S2"]))
    }

    fn callback(state: Option<&str>, code: Option<&str>) -> CallbackParams {
        CallbackParams {
            state: state.map(str::to_string),
            code: code.map(str::to_string),
            error: None,
        }
    }

    fn id_token_response() -> Value {
        json!({"id_token": "signed.jwt.value"})
    }

    #[test]
    fn generated_state_is_32_random_bytes() {
        let a = generate_state_value().expect("state");
        let b = generate_state_value().expect("state");

        assert_eq!(STANDARD.decode(&a).expect("base64").len(), STATE_BYTES);
        assert_ne!(a, b);
    }

    #[test]
    fn consecutive_login_urls_carry_different_states() {
        let flow = LoginFlow::new(Arc::new(FakeExchanger::returning(id_token_response())));

        let first = flow.issue_login_url().expect("url");
        let first_state = flow.state.get().expect("stored");
        let second = flow.issue_login_url().expect("url");
        let second_state = flow.state.get().expect("stored");

        assert_ne!(first_state, second_state);
        assert_ne!(first, second);
        assert!(second.ends_with(&format!("state={second_state}")));
    }

    #[test]
    fn failed_state_generation_keeps_previous_state() {
        let flow = LoginFlow::new(Arc::new(FakeExchanger::returning(id_token_response())));
        flow.issue_login_url().expect("url");
        let before = flow.state.get();

        let flow = LoginFlow {
            generate_state: Arc::new(|| Err(LoginError::StateGeneration.into())),
            ..flow
        };
        let report = flow.issue_login_url().expect_err("generator fails");

        assert_eq!(report.current_context(), &LoginError::StateGeneration);
        assert_eq!(flow.state.get(), before);
    }

    #[tokio::test]
    async fn issue_then_callback_returns_identity_token() {
        let exchanger = Arc::new(FakeExchanger::returning(id_token_response()));
        let flow = flow(Arc::clone(&exchanger));

        let url = flow.issue_login_url().expect("url");
        assert_eq!(url, "https://provider.example.com/authorize?state=S1");

        let token = flow
            .handle_callback(&callback(Some("S1"), Some("abc")))
            .await
            .expect("login");

        assert_eq!(token.as_str(), "signed.jwt.value");
        assert_eq!(exchanger.codes(), vec!["abc".to_string()]);
    }

    #[tokio::test]
    async fn reissuing_invalidates_the_earlier_state() {
        let flow = flow(Arc::new(FakeExchanger::returning(id_token_response())));
        flow.issue_login_url().expect("S1");
        flow.issue_login_url().expect("S2");

        let report = flow
            .handle_callback(&callback(Some("S1"), Some("abc")))
            .await
            .expect_err("stale state");
        assert_eq!(report.current_context(), &LoginError::CsrfMismatch);

        let token = flow
            .handle_callback(&callback(Some("S2"), Some("abc")))
            .await
            .expect("current state");
        assert_eq!(token.as_str(), "signed.jwt.value");
    }

    #[tokio::test]
    async fn callback_before_any_login_url_is_an_internal_error() {
        let exchanger = Arc::new(FakeExchanger::returning(id_token_response()));
        let flow = flow(Arc::clone(&exchanger));

        for params in [
            callback(None, None),
            callback(Some("S1"), Some("abc")),
            callback(Some(""), Some("abc")),
        ] {
            let report = flow.handle_callback(&params).await.expect_err("no state");
            assert_eq!(report.current_context(), &LoginError::StateNotIssued);
            assert!(!report.current_context().is_client_error());
        }
        assert!(exchanger.codes().is_empty());
    }

    #[tokio::test]
    async fn mismatched_or_missing_state_is_rejected_before_exchange() {
        let exchanger = Arc::new(FakeExchanger::returning(id_token_response()));
        let flow = flow(Arc::clone(&exchanger));
        flow.issue_login_url().expect("url");

        for state in [None, Some(""), Some("S2"), Some("s1"), Some("S1 ")] {
            let report = flow
                .handle_callback(&callback(state, Some("abc")))
                .await
                .expect_err("bad state");
            assert_eq!(report.current_context(), &LoginError::CsrfMismatch);
        }
        assert!(exchanger.codes().is_empty());
    }

    #[tokio::test]
    async fn missing_code_is_a_client_error() {
        let exchanger = Arc::new(FakeExchanger::returning(id_token_response()));
        let flow = flow(Arc::clone(&exchanger));
        flow.issue_login_url().expect("url");

        for code in [None, Some("")] {
            let report = flow
                .handle_callback(&callback(Some("S1"), code))
                .await
                .expect_err("no code");
            assert_eq!(report.current_context(), &LoginError::MissingCode);
            assert!(report.current_context().is_client_error());
            assert!(report.children().is_empty());
        }
        assert!(exchanger.codes().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_keeps_its_cause() {
        let flow = flow(Arc::new(FakeExchanger::failing(ExchangeError::Provider {
            details: "invalid_grant".to_string(),
        })));
        flow.issue_login_url().expect("url");

        let report = flow
            .handle_callback(&callback(Some("S1"), Some("abc")))
            .await
            .expect_err("provider failed");

        assert_eq!(report.current_context(), &LoginError::Exchange);
        assert!(format!("{report:?}").contains("invalid_grant"));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let exchanger = FakeExchanger {
            delay: Duration::from_secs(5),
            ..FakeExchanger::returning(id_token_response())
        };
        let flow = flow(Arc::new(exchanger)).with_exchange_timeout(Duration::from_millis(20));
        flow.issue_login_url().expect("url");

        let report = flow
            .handle_callback(&callback(Some("S1"), Some("abc")))
            .await
            .expect_err("timed out");

        assert_eq!(report.current_context(), &LoginError::Exchange);
        assert!(format!("{report:?}").contains("timed out"));
    }

    #[tokio::test]
    async fn response_without_id_token_is_an_internal_error() {
        for extra in [json!({}), json!({"id_token": ""}), json!({"id_token": null})] {
            let flow = flow(Arc::new(FakeExchanger::returning(extra)));
            flow.issue_login_url().expect("url");

            let report = flow
                .handle_callback(&callback(Some("S1"), Some("abc")))
                .await
                .expect_err("no id token");

            assert_eq!(report.current_context(), &LoginError::MissingIdToken);
            assert!(!report.current_context().is_client_error());
        }
    }

    #[tokio::test]
    async fn successful_callback_does_not_consume_state() {
        let flow = flow(Arc::new(FakeExchanger::returning(id_token_response())));
        flow.issue_login_url().expect("url");

        for _ in 0..2 {
            flow.handle_callback(&callback(Some("S1"), Some("abc")))
                .await
                .expect("login");
        }
    }
}
