use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::Auth0Config;
use crate::error::{AuthError, AuthResult};

const HTTP_TIMEOUT_SECS: u64 = 10;

/// Trait for the Auth0 Management API operations the crate exposes
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// Obtain a machine-to-machine access token via the client
    /// credentials grant.
    async fn client_credentials_token(&self) -> AuthResult<TokenResponse>;

    /// Fetch the Auth0 user record behind a subject, authorized by
    /// `access_token` (either a management token or the user's own).
    async fn user_profile(&self, access_token: &str, user_id: &str) -> AuthResult<UserProfile>;
}

/// Response from POST /oauth/token (client credentials grant)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub scope: Option<String>,
}

/// Subset of GET /api/v2/users/{id} the crate consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub user_metadata: Option<serde_json::Value>,
}

/// Request body for the client credentials grant
#[derive(Debug, Serialize)]
struct ClientCredentialsRequest {
    grant_type: String,
    client_id: String,
    client_secret: String,
    audience: String,
}

/// Error payload from Auth0. The OAuth endpoints answer with
/// `error`/`error_description`; the Management API answers with
/// `errorCode`/`message`. Both shapes are folded into one struct.
#[derive(Debug, Clone, Deserialize)]
pub struct ManagementErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: String,
    #[serde(default, rename = "errorCode")]
    pub error_code: String,
    #[serde(default)]
    pub message: String,
}

impl ManagementErrorBody {
    pub fn code(&self) -> &str {
        if self.error_code.is_empty() {
            self.error.as_str()
        } else {
            self.error_code.as_str()
        }
    }

    pub fn description(&self) -> &str {
        if !self.error_description.is_empty() {
            self.error_description.as_str()
        } else if !self.message.is_empty() {
            self.message.as_str()
        } else {
            "Auth0 request failed"
        }
    }

    /// Maps Auth0 error codes to AuthError variants
    pub fn to_auth_error(&self) -> AuthError {
        match self.code() {
            "access_denied" | "unauthorized" | "invalid_grant" | "invalid_client"
            | "unauthorized_client" => AuthError::Unauthorized,
            "too_many_requests" => AuthError::RateLimited,
            "invalid_request" | "invalid_body" | "bad_request" => {
                AuthError::BadRequest("Invalid request".to_string())
            }
            "server_error" | "temporarily_unavailable" => AuthError::ServiceUnavailable {
                service: "Auth0".to_string(),
                message: "Authentication service temporarily unavailable".to_string(),
            },
            _ => AuthError::Internal(anyhow::anyhow!("Auth0 management API error")),
        }
    }
}

/// HTTP-based Management API client
pub struct HttpManagementClient {
    domain: String,
    config: Auth0Config,
    client: Client,
}

impl HttpManagementClient {
    /// Create a new Management API client
    ///
    /// Requires `domain` in the config; `client_id` and `client_secret`
    /// are additionally required for the client credentials grant.
    pub fn new(config: Auth0Config) -> AuthResult<Self> {
        let domain = config
            .domain
            .clone()
            .ok_or(AuthError::NotConfigured("AUTH0_DOMAIN"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AuthError::Internal(anyhow::anyhow!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            domain,
            config,
            client,
        })
    }

    pub(crate) fn domain(&self) -> &str {
        &self.domain
    }

    pub(crate) fn oauth_token_url(&self) -> String {
        format!("https://{}/oauth/token", self.domain())
    }

    pub(crate) fn user_url(&self, user_id: &str) -> String {
        format!("https://{}/api/v2/users/{}", self.domain(), user_id)
    }

    /// Audience requested for management tokens. Falls back to the
    /// tenant's Management API identifier when none is configured.
    pub(crate) fn token_audience(&self) -> String {
        self.config
            .audience
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("https://{}/api/v2/", self.domain()))
    }

    pub(crate) async fn handle_error(&self, response: reqwest::Response) -> AuthError {
        let status = response.status();

        match response.json::<ManagementErrorBody>().await {
            Ok(body) => {
                // Log full Auth0 error details server-side, return a
                // generic mapping to avoid leaking tenant internals.
                error!(
                    status = %status,
                    code = %body.code(),
                    description = %body.description(),
                    "Auth0 API error response"
                );
                body.to_auth_error()
            }
            Err(_) => {
                error!(
                    status = %status,
                    "Auth0 API request failed with unparsable error"
                );
                match status.as_u16() {
                    401 | 403 => AuthError::Unauthorized,
                    429 => AuthError::RateLimited,
                    500..=599 => AuthError::ServiceUnavailable {
                        service: "Auth0".to_string(),
                        message: "Authentication service temporarily unavailable".to_string(),
                    },
                    _ => AuthError::BadRequest("Invalid request".to_string()),
                }
            }
        }
    }
}

#[async_trait]
impl ManagementApi for HttpManagementClient {
    async fn client_credentials_token(&self) -> AuthResult<TokenResponse> {
        let client_id = self
            .config
            .client_id
            .clone()
            .ok_or(AuthError::NotConfigured("AUTH0_CLIENT_ID"))?;
        let client_secret = self
            .config
            .client_secret
            .clone()
            .ok_or(AuthError::NotConfigured("AUTH0_CLIENT_SECRET"))?;

        let request = ClientCredentialsRequest {
            grant_type: "client_credentials".to_string(),
            client_id,
            client_secret,
            audience: self.token_audience(),
        };

        let response = self
            .client
            .post(self.oauth_token_url())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    url = %self.oauth_token_url(),
                    "Failed to send client credentials request to Auth0"
                );
                AuthError::Internal(anyhow::anyhow!("failed to send token request: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(self.handle_error(response).await);
        }

        response.json::<TokenResponse>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Auth0 token response");
            AuthError::Internal(anyhow::anyhow!("failed to parse token response: {}", e))
        })
    }

    async fn user_profile(&self, access_token: &str, user_id: &str) -> AuthResult<UserProfile> {
        let url = self.user_url(user_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    url = %url,
                    "Failed to send user profile request to Auth0"
                );
                AuthError::Internal(anyhow::anyhow!("failed to send user request: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(self.handle_error(response).await);
        }

        response.json::<UserProfile>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Auth0 user profile");
            AuthError::Internal(anyhow::anyhow!("failed to parse user profile: {}", e))
        })
    }
}

/// Disabled Management API client for when Auth0 is not configured
pub struct DisabledManagementClient;

#[async_trait]
impl ManagementApi for DisabledManagementClient {
    async fn client_credentials_token(&self) -> AuthResult<TokenResponse> {
        Err(AuthError::ServiceUnavailable {
            service: "Auth0".to_string(),
            message: "Auth0 is not configured. Please set AUTH0_DOMAIN and AUTH0_AUDIENCE."
                .to_string(),
        })
    }

    async fn user_profile(&self, _access_token: &str, _user_id: &str) -> AuthResult<UserProfile> {
        Err(AuthError::ServiceUnavailable {
            service: "Auth0".to_string(),
            message: "Auth0 is not configured. Please set AUTH0_DOMAIN and AUTH0_AUDIENCE."
                .to_string(),
        })
    }
}
