pub mod defaults;

use figment::{providers::Env, Figment};
use serde::Deserialize;

use crate::error::{AuthError, AuthResult};

/// Auth0 tenant settings, usually loaded from `AUTH0_*` environment
/// variables via [`Auth0Config::from_env`].
///
/// The integration is considered disabled until a domain or audience is
/// set, so hosts can register the extractor unconditionally and flip it
/// on through the environment.
#[derive(Deserialize, Clone)]
pub struct Auth0Config {
    /// Tenant domain, e.g. `your-tenant.auth0.com`.
    #[serde(default)]
    pub domain: Option<String>,
    /// API identifier expected in the `aud` claim.
    #[serde(default)]
    pub audience: Option<String>,
    /// Expected `iss` claim. Defaults to `https://{domain}/` when unset.
    #[serde(default)]
    pub issuer: Option<String>,
    /// How long a fetched key set stays fresh.
    #[serde(default = "defaults::default_jwks_cache_ttl_secs")]
    pub jwks_cache_ttl_secs: u64,
    /// Clock skew tolerated when checking `exp` and `nbf`.
    #[serde(default = "defaults::default_leeway_secs")]
    pub leeway_secs: u64,
    /// Claim that names the authenticated principal.
    #[serde(default = "defaults::default_principal_claim")]
    pub principal_claim: String,
    /// Machine-to-machine application credentials, only needed for the
    /// Management API client.
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for Auth0Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth0Config")
            .field("domain", &self.domain)
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("jwks_cache_ttl_secs", &self.jwks_cache_ttl_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("principal_claim", &self.principal_claim)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for Auth0Config {
    fn default() -> Self {
        Self {
            domain: None,
            audience: None,
            issuer: None,
            jwks_cache_ttl_secs: defaults::default_jwks_cache_ttl_secs(),
            leeway_secs: defaults::default_leeway_secs(),
            principal_claim: defaults::default_principal_claim(),
            client_id: None,
            client_secret: None,
        }
    }
}

impl Auth0Config {
    /// Reads `AUTH0_DOMAIN`, `AUTH0_AUDIENCE`, `AUTH0_ISSUER`,
    /// `AUTH0_JWKS_CACHE_TTL_SECS`, `AUTH0_LEEWAY_SECS`,
    /// `AUTH0_PRINCIPAL_CLAIM`, `AUTH0_CLIENT_ID` and `AUTH0_CLIENT_SECRET`.
    pub fn from_env() -> AuthResult<Self> {
        let mut config: Self = Figment::new()
            .merge(Env::prefixed("AUTH0_"))
            .extract()
            .map_err(|e| {
                AuthError::Internal(anyhow::anyhow!("invalid AUTH0_* environment: {e}"))
            })?;

        config.domain = defaults::normalize_domain(config.domain);
        config.audience = defaults::normalize_optional_string(config.audience);
        config.issuer = defaults::normalize_optional_string(config.issuer);
        config.client_id = defaults::normalize_optional_string(config.client_id);
        config.client_secret = defaults::normalize_optional_string(config.client_secret);
        if config.principal_claim.trim().is_empty() {
            config.principal_claim = defaults::default_principal_claim();
        }

        Ok(config)
    }

    fn non_empty(value: Option<&str>) -> Option<&str> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        })
    }

    pub fn is_enabled(&self) -> bool {
        Self::non_empty(self.domain.as_deref()).is_some()
            || Self::non_empty(self.audience.as_deref()).is_some()
    }

    pub fn validate(&self) -> AuthResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        if Self::non_empty(self.domain.as_deref()).is_none() {
            return Err(AuthError::NotConfigured("AUTH0_DOMAIN"));
        }

        if Self::non_empty(self.audience.as_deref()).is_none() {
            return Err(AuthError::NotConfigured("AUTH0_AUDIENCE"));
        }

        Ok(())
    }

    /// Expected `iss` value, falling back to `https://{domain}/`.
    pub fn issuer(&self) -> Option<String> {
        Self::non_empty(self.issuer.as_deref())
            .map(|issuer| issuer.to_string())
            .or_else(|| {
                Self::non_empty(self.domain.as_deref())
                    .map(|domain| format!("https://{}/", domain))
            })
    }

    /// Well-known JWKS document for the tenant.
    pub fn jwks_url(&self) -> Option<String> {
        Self::non_empty(self.domain.as_deref())
            .map(|domain| format!("https://{}/.well-known/jwks.json", domain))
    }
}
