use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use moka::future::Cache;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, warn};

use crate::config::Auth0Config;
use crate::error::{AuthError, AuthResult};

const HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kid: String,
    pub n: String,
    pub e: String,
    pub kty: String,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(rename = "use", default)]
    pub use_: Option<String>,
}

impl Jwk {
    pub fn to_decoding_key(&self) -> AuthResult<DecodingKey> {
        DecodingKey::from_rsa_components(&self.n, &self.e).map_err(|e| {
            error!(
                error = %e,
                kid = %self.kid,
                "Failed to build RSA decoding key from JWK"
            );
            AuthError::Internal(anyhow::anyhow!("invalid JWK components: {}", e))
        })
    }
}

#[derive(Debug, Clone)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

impl<'de> Deserialize<'de> for Jwks {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawJwks {
            keys: Vec<serde_json::Value>,
        }

        // Tenants can publish EC or OKP members alongside their RSA
        // signing keys; only the RSA entries are usable for RS256.
        let raw = RawJwks::deserialize(deserializer)?;
        let keys = raw
            .keys
            .into_iter()
            .filter_map(|value| serde_json::from_value::<Jwk>(value).ok())
            .filter(|key| key.kty == "RSA")
            .collect();
        Ok(Self { keys })
    }
}

impl Jwks {
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    fn kids(&self) -> Vec<&str> {
        self.keys.iter().map(|k| k.kid.as_str()).collect()
    }
}

/// Trait for signing-key resolution - allows mocking in tests
#[async_trait]
pub trait JwksResolver: Send + Sync {
    async fn get_decoding_key(&self, kid: &str) -> AuthResult<DecodingKey>;
}

/// Fetches the tenant JWKS document and caches the parsed key set.
///
/// The whole set is cached under a single entry with a TTL, so key
/// lookups between refreshes never touch the network. Concurrent
/// requests during a refresh are coalesced into one fetch, and fetch
/// failures are never cached.
pub struct JwksCache {
    client: Client,
    jwks_url: String,
    cache: Cache<String, Arc<Jwks>>,
}

impl JwksCache {
    pub fn new(config: &Auth0Config) -> AuthResult<Self> {
        let jwks_url = config
            .jwks_url()
            .ok_or(AuthError::NotConfigured("AUTH0_DOMAIN"))?;
        Self::from_url(jwks_url, config.jwks_cache_ttl_secs)
    }

    /// Builds a cache against an explicit JWKS endpoint. Useful for
    /// issuers whose key-set URL is not derived from an Auth0 domain.
    pub fn from_url(jwks_url: impl Into<String>, ttl_secs: u64) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AuthError::Internal(anyhow::anyhow!("failed to build HTTP client: {}", e))
            })?;

        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_secs))
            .max_capacity(1)
            .build();

        Ok(Self {
            client,
            jwks_url: jwks_url.into(),
            cache,
        })
    }

    pub async fn get_decoding_key(&self, kid: &str) -> AuthResult<DecodingKey> {
        let keys = self.key_set().await?;
        if let Some(jwk) = keys.find(kid) {
            return jwk.to_decoding_key();
        }

        // The tenant may have rotated its keys since the last fetch;
        // refresh once before rejecting the kid.
        self.cache.invalidate(&self.jwks_url).await;
        let keys = self.key_set().await?;
        match keys.find(kid) {
            Some(jwk) => jwk.to_decoding_key(),
            None => {
                warn!(
                    kid = %kid,
                    available_kids = ?keys.kids(),
                    auth_failure_category = "unknown_kid",
                    "Token validation failed: unknown key ID"
                );
                Err(AuthError::UnknownKeyId(kid.to_string()))
            }
        }
    }

    /// Returns the cached key set, fetching it when absent or expired.
    /// `try_get_with` de-duplicates concurrent fetches for the same URL
    /// and does not store errors, so the next caller retries.
    async fn key_set(&self) -> AuthResult<Arc<Jwks>> {
        self.cache
            .try_get_with(self.jwks_url.clone(), async {
                self.fetch_jwks().await.map(Arc::new)
            })
            .await
            .map_err(|e: Arc<AuthError>| match e.as_ref() {
                AuthError::JwksUnavailable(reason) => AuthError::JwksUnavailable(reason.clone()),
                other => AuthError::JwksUnavailable(other.to_string()),
            })
    }

    async fn fetch_jwks(&self) -> AuthResult<Jwks> {
        let response = self.client.get(&self.jwks_url).send().await.map_err(|e| {
            error!(
                error = %e,
                url = %self.jwks_url,
                auth_failure_category = "jwks_fetch_failed",
                "Failed to fetch JWKS from Auth0"
            );
            AuthError::JwksUnavailable(format!("request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            error!(
                status = %status,
                url = %self.jwks_url,
                auth_failure_category = "jwks_fetch_failed",
                "JWKS endpoint returned non-success status"
            );
            return Err(AuthError::JwksUnavailable(format!(
                "endpoint returned status {}",
                status
            )));
        }

        let jwks: Jwks = response.json().await.map_err(|e| {
            error!(
                error = %e,
                auth_failure_category = "jwks_fetch_failed",
                "Failed to parse JWKS response"
            );
            AuthError::JwksUnavailable(format!("invalid key set document: {}", e))
        })?;

        Ok(jwks)
    }
}

#[async_trait]
impl JwksResolver for JwksCache {
    async fn get_decoding_key(&self, kid: &str) -> AuthResult<DecodingKey> {
        self.get_decoding_key(kid).await
    }
}
