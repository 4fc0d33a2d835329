//! Bearer token validation against a provider's JSON Web Key Set.
//!
//! Keys are fetched over HTTP and cached for a TTL. A token naming a key id
//! missing from the cache triggers one early refetch, rate limited so that
//! made-up key ids cannot be used to hammer the provider. Only one fetch runs
//! at a time, and a failed fetch is not retried until the refresh interval
//! has passed.

use crate::config::AuthorisationConfig;
use crate::error::{ConfigurationError, TokenError};
use crate::token::{TokenValidator, ValidatedToken, bearer_token};
use async_trait::async_trait;
use http::request::Parts;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use mon_core::Result;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const LEEWAY_SECONDS: u64 = 60;

struct CacheEntry {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Verifies RS/PS/ES-signed JWTs with keys from a JWKS endpoint.
pub struct JwksTokenValidator {
    jwks_url: String,
    issuer: String,
    audience: Option<String>,
    cache_ttl: Duration,
    cache: RwLock<Option<CacheEntry>>,
    /// Held while fetching; records when the last fetch failed.
    refresh: Mutex<Option<Instant>>,
    client: reqwest::Client,
}

enum Cached {
    Hit(Jwk),
    Unknown,
    Miss,
}

impl JwksTokenValidator {
    /// Creates a validator trusting keys at `jwks_url` for tokens issued by
    /// `issuer`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the HTTP client cannot be built.
    pub fn new(
        jwks_url: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ConfigurationError::Invalid {
                setting: "jwks http client",
                reason: e.to_string(),
            })?;

        Ok(Self {
            jwks_url: jwks_url.into(),
            issuer: issuer.into(),
            audience: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: RwLock::new(None),
            refresh: Mutex::new(None),
            client,
        })
    }

    /// Creates a validator for the provider named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the HTTP client cannot be built.
    pub fn from_config(config: &AuthorisationConfig) -> Result<Self, ConfigurationError> {
        let mut validator =
            Self::new(config.jwks_url(), config.issuer())?.with_cache_ttl(config.jwks_cache_ttl());
        if let Some(audience) = config.audience() {
            validator = validator.with_audience(audience);
        }
        Ok(validator)
    }

    /// Requires tokens to carry this `aud` claim.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Finds the key for `kid`, fetching the key set when the cache is cold,
    /// stale, or (at most once per refresh interval) missing the key.
    async fn find_key(&self, kid: Option<&str>) -> Result<Jwk, TokenError> {
        let unknown = || TokenError::UnknownKey {
            kid: kid.map(str::to_string),
        };

        match self.cached_key(kid).await {
            Cached::Hit(jwk) => return Ok(jwk),
            Cached::Unknown => return Err(unknown().into()),
            Cached::Miss => {}
        }

        let mut last_failure = self.refresh.lock().await;
        // Another request may have refreshed while we waited.
        match self.cached_key(kid).await {
            Cached::Hit(jwk) => return Ok(jwk),
            Cached::Unknown => return Err(unknown().into()),
            Cached::Miss => {}
        }
        if let Some(failed_at) = *last_failure
            && failed_at.elapsed() < MIN_REFRESH_INTERVAL
        {
            return Err(TokenError::KeySet {
                details: "key set fetch failed recently".to_string(),
            }
            .into());
        }

        let keys = match self.fetch_keys().await {
            Ok(keys) => keys,
            Err(report) => {
                *last_failure = Some(Instant::now());
                return Err(report);
            }
        };
        *last_failure = None;

        let jwk = select_key(&keys, kid);
        *self.cache.write().await = Some(CacheEntry {
            keys,
            fetched_at: Instant::now(),
        });
        jwk.ok_or_else(|| unknown().into())
    }

    async fn cached_key(&self, kid: Option<&str>) -> Cached {
        let cache = self.cache.read().await;
        let Some(entry) = cache.as_ref() else {
            return Cached::Miss;
        };
        let age = entry.fetched_at.elapsed();
        match select_key(&entry.keys, kid) {
            Some(jwk) if age < self.cache_ttl => Cached::Hit(jwk),
            None if age < MIN_REFRESH_INTERVAL => Cached::Unknown,
            _ => Cached::Miss,
        }
    }

    #[instrument(skip(self), fields(url = %self.jwks_url))]
    async fn fetch_keys(&self) -> Result<JwkSet, TokenError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| TokenError::KeySet {
                details: e.to_string(),
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "key set endpoint returned an error");
            return Err(TokenError::KeySet {
                details: format!("HTTP {} from key set endpoint", response.status()),
            }
            .into());
        }

        let keys: JwkSet = response.json().await.map_err(|e| TokenError::KeySet {
            details: e.to_string(),
        })?;
        debug!(keys = keys.keys.len(), "fetched key set");
        Ok(keys)
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.leeway = LEEWAY_SECONDS;
        validation.set_issuer(&[&self.issuer]);
        match &self.audience {
            Some(audience) => {
                validation.set_required_spec_claims(&["exp", "iss", "aud"]);
                validation.set_audience(&[audience]);
            }
            None => {
                validation.set_required_spec_claims(&["exp", "iss"]);
                validation.validate_aud = false;
            }
        }
        validation
    }
}

#[async_trait]
impl TokenValidator for JwksTokenValidator {
    async fn validate(&self, request: &Parts) -> Result<ValidatedToken, TokenError> {
        let token = bearer_token(&request.headers)?;

        let header = decode_header(token).map_err(|e| TokenError::Malformed {
            reason: e.to_string(),
        })?;
        let jwk = self.find_key(header.kid.as_deref()).await?;
        let key = decoding_key(&jwk, header.alg)?;

        let data = decode::<Map<String, Value>>(token, &key, &self.validation(header.alg))
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid {
                    reason: e.to_string(),
                },
            })?;

        Ok(ValidatedToken::new(data.claims))
    }
}

/// Picks the key named by `kid`, or the only key when the token names none.
fn select_key(keys: &JwkSet, kid: Option<&str>) -> Option<Jwk> {
    match kid {
        Some(kid) => keys.find(kid).cloned(),
        None if keys.keys.len() == 1 => keys.keys.first().cloned(),
        None => None,
    }
}

/// Builds the decoding key for `jwk`, refusing algorithms the key was not
/// issued for.
fn decoding_key(jwk: &Jwk, algorithm: Algorithm) -> Result<DecodingKey, TokenError> {
    let unsupported = || TokenError::UnsupportedAlgorithm {
        algorithm: format!("{algorithm:?}"),
    };

    if let Some(declared) = jwk.common.key_algorithm
        && declared_algorithm(declared) != Some(algorithm)
    {
        return Err(unsupported().into());
    }

    let key = match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa)
            if matches!(
                algorithm,
                Algorithm::RS256
                    | Algorithm::RS384
                    | Algorithm::RS512
                    | Algorithm::PS256
                    | Algorithm::PS384
                    | Algorithm::PS512
            ) =>
        {
            DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
        }
        AlgorithmParameters::EllipticCurve(ec)
            if matches!(algorithm, Algorithm::ES256 | Algorithm::ES384) =>
        {
            DecodingKey::from_ec_components(&ec.x, &ec.y)
        }
        _ => return Err(unsupported().into()),
    };

    key.map_err(|e| {
        TokenError::KeySet {
            details: format!("unusable key: {e}"),
        }
        .into()
    })
}

fn declared_algorithm(algorithm: KeyAlgorithm) -> Option<Algorithm> {
    match algorithm {
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        _ => None,
    }
}
