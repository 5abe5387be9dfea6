use std::sync::Arc;

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use async_trait::async_trait;

use crate::claims::{Claims, Principal};
use crate::config::Auth0Config;
use crate::error::{AuthError, AuthResult};
use crate::jwks::JwksResolver;
use crate::validate::validate_token;

/// Maps verified claims onto a host-side identity.
///
/// Register one as `web::Data<Arc<dyn PrincipalMapper>>` when the host
/// needs more than the default claim-to-username mapping, e.g. an
/// account lookup or just-in-time provisioning.
#[async_trait]
pub trait PrincipalMapper: Send + Sync {
    async fn resolve(&self, claims: &Claims) -> AuthResult<Principal>;
}

/// Pulls the bearer token out of the `Authorization` header.
pub fn bearer_token(req: &HttpRequest) -> AuthResult<&str> {
    match req.headers().get(AUTHORIZATION) {
        Some(header) => match header.to_str() {
            Ok(value) => match value.strip_prefix("Bearer ") {
                Some(token) if !token.is_empty() => Ok(token),
                _ => Err(AuthError::Unauthorized),
            },
            Err(_) => Err(AuthError::Unauthorized),
        },
        None => Err(AuthError::Unauthorized),
    }
}

/// Extractor that verifies the request's bearer token and resolves the
/// principal behind it.
///
/// Expects `web::Data<Auth0Config>` and `web::Data<Arc<dyn JwksResolver>>`
/// to be registered on the app; both missing pieces are treated as a
/// deployment bug rather than an authentication failure.
pub struct AuthenticatedUser(pub Principal);

impl FromRequest for AuthenticatedUser {
    type Error = AuthError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = AuthResult<Self>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let token = bearer_token(&req)?;

            let resolver = req
                .app_data::<web::Data<Arc<dyn JwksResolver>>>()
                .ok_or_else(|| {
                    AuthError::Internal(anyhow::anyhow!("missing JwksResolver app data"))
                })?;
            let config = req.app_data::<web::Data<Auth0Config>>().ok_or_else(|| {
                AuthError::Internal(anyhow::anyhow!("missing Auth0Config app data"))
            })?;

            let claims = validate_token(token, resolver.as_ref().as_ref(), config.get_ref()).await?;

            let principal = match req.app_data::<web::Data<Arc<dyn PrincipalMapper>>>() {
                Some(mapper) => mapper.resolve(&claims).await?,
                None => Principal::from_claims(claims, config.get_ref())?,
            };

            Ok(AuthenticatedUser(principal))
        })
    }
}
