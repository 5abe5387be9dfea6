use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use tracing::warn;

use crate::claims::{Claims, Principal, RawClaims};
use crate::config::Auth0Config;
use crate::error::{AuthError, AuthResult};
use crate::jwks::JwksResolver;

/// Verifies a bearer token against the tenant's signing keys and
/// returns its claims.
///
/// The token must be RS256-signed by a key the resolver knows, carry
/// the configured audience and issuer, and be within its validity
/// window (with the configured leeway). Tokens signed with any other
/// algorithm are rejected before a key is ever resolved, so an
/// attacker cannot downgrade to `none` or swap in an HMAC secret.
pub async fn validate_token(
    token: &str,
    resolver: &dyn JwksResolver,
    config: &Auth0Config,
) -> AuthResult<Claims> {
    let header = decode_header(token).map_err(|e| {
        warn!(
            error = %e,
            auth_failure_category = "malformed_token",
            "Failed to decode token header"
        );
        AuthError::MalformedToken
    })?;

    if header.alg != Algorithm::RS256 {
        warn!(
            alg = ?header.alg,
            auth_failure_category = "invalid_signature",
            "Token signed with an unexpected algorithm"
        );
        return Err(AuthError::InvalidSignature);
    }

    let kid = header.kid.ok_or_else(|| {
        warn!(
            auth_failure_category = "invalid_signature",
            "Token header missing kid"
        );
        AuthError::InvalidSignature
    })?;

    let expected_issuer = config
        .issuer()
        .ok_or(AuthError::NotConfigured("AUTH0_DOMAIN"))?;
    let expected_audience = config
        .audience
        .as_ref()
        .ok_or(AuthError::NotConfigured("AUTH0_AUDIENCE"))?;

    let decoding_key = resolver.get_decoding_key(&kid).await?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[&expected_issuer]);
    validation.set_audience(&[expected_audience]);
    validation.validate_nbf = true;
    validation.leeway = config.leeway_secs;

    // Decode into the lenient claims shape so a claim absent from the
    // payload reads as MissingClaim rather than a deserialization error.
    let token_data = decode::<RawClaims>(token, &decoding_key, &validation)
        .map_err(|e| map_validation_error(e, &expected_issuer, expected_audience))?;

    token_data.claims.into_claims()
}

/// Verifies a token and resolves the principal it belongs to.
pub async fn authenticate(
    token: &str,
    resolver: &dyn JwksResolver,
    config: &Auth0Config,
) -> AuthResult<Principal> {
    let claims = validate_token(token, resolver, config).await?;
    Principal::from_claims(claims, config)
}

fn map_validation_error(
    error: jsonwebtoken::errors::Error,
    expected_issuer: &str,
    expected_audience: &str,
) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::ExpiredSignature => {
            warn!(auth_failure_category = "expired", "Token has expired");
            AuthError::TokenExpired
        }
        ErrorKind::ImmatureSignature => {
            warn!(
                auth_failure_category = "immature",
                "Token not yet valid (nbf)"
            );
            AuthError::ImmatureToken
        }
        ErrorKind::InvalidIssuer => {
            warn!(
                expected_issuer = %expected_issuer,
                auth_failure_category = "wrong_issuer",
                "Token has invalid issuer"
            );
            AuthError::InvalidIssuer
        }
        ErrorKind::InvalidAudience => {
            warn!(
                expected_audience = %expected_audience,
                auth_failure_category = "wrong_audience",
                "Token has invalid audience"
            );
            AuthError::InvalidAudience
        }
        ErrorKind::InvalidSignature => {
            warn!(
                auth_failure_category = "invalid_signature",
                "Token has invalid signature"
            );
            AuthError::InvalidSignature
        }
        ErrorKind::InvalidAlgorithm => {
            warn!(
                auth_failure_category = "invalid_signature",
                "Token algorithm does not match the verification key"
            );
            AuthError::InvalidSignature
        }
        ErrorKind::MissingRequiredClaim(claim) => {
            warn!(
                claim = %claim,
                auth_failure_category = "missing_claim",
                "Token is missing a required claim"
            );
            AuthError::MissingClaim(claim.clone())
        }
        ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            warn!(
                error = %error,
                auth_failure_category = "malformed_token",
                "Token payload could not be decoded"
            );
            AuthError::MalformedToken
        }
        _ => {
            warn!(
                error = %error,
                auth_failure_category = "invalid_signature",
                "Token validation failed"
            );
            AuthError::InvalidSignature
        }
    }
}
