use serde::{Deserialize, Serialize};

use crate::config::Auth0Config;
use crate::error::{AuthError, AuthResult};

/// Claims carried by an Auth0-issued access token.
///
/// Only the registered claims the crate validates are typed; everything
/// else (namespaced permissions, org metadata and so on) lands in
/// `custom_claims` untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: Audience,
    pub exp: u64,
    pub iat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(flatten)]
    pub custom_claims: std::collections::HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::Single(s) => s == expected,
            Audience::Multiple(v) => v.iter().any(|s| s == expected),
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Audience::Single(s) => vec![s.clone()],
            Audience::Multiple(v) => v.clone(),
        }
    }
}

impl Claims {
    /// Looks up the claim configured as the principal identifier.
    ///
    /// The claim must carry a non-empty string value; numeric or
    /// structured claims are treated as absent.
    pub fn principal_value(&self, claim: &str) -> AuthResult<String> {
        let value = match claim {
            "sub" => Some(self.sub.clone()),
            "email" => self.email.clone(),
            "name" => self.name.clone(),
            "nickname" => self.nickname.clone(),
            _ => self
                .custom_claims
                .get(claim)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        };

        match value {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(AuthError::MissingClaim(claim.to_string())),
        }
    }
}

/// Lenient mirror of [`Claims`] used as the decode target.
///
/// Registered claims are optional here so that an absent claim surfaces
/// as [`AuthError::MissingClaim`] after signature verification, instead
/// of a serde missing-field error that would read as a malformed token.
#[derive(Debug, Deserialize)]
pub(crate) struct RawClaims {
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    aud: Option<Audience>,
    #[serde(default)]
    exp: Option<u64>,
    #[serde(default)]
    iat: Option<u64>,
    #[serde(default)]
    nbf: Option<u64>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    #[serde(flatten)]
    custom_claims: std::collections::HashMap<String, serde_json::Value>,
}

impl RawClaims {
    pub(crate) fn into_claims(self) -> AuthResult<Claims> {
        fn require<T>(value: Option<T>, claim: &'static str) -> AuthResult<T> {
            value.ok_or_else(|| AuthError::MissingClaim(claim.to_string()))
        }

        Ok(Claims {
            iss: require(self.iss, "iss")?,
            sub: require(self.sub, "sub")?,
            aud: require(self.aud, "aud")?,
            exp: require(self.exp, "exp")?,
            iat: require(self.iat, "iat")?,
            nbf: self.nbf,
            email: self.email,
            email_verified: self.email_verified,
            name: self.name,
            nickname: self.nickname,
            picture: self.picture,
            custom_claims: self.custom_claims,
        })
    }
}

/// The identity a verified token resolves to.
#[derive(Debug, Clone)]
pub struct Principal {
    /// Local account name derived from the principal claim.
    pub username: String,
    /// Raw `sub` claim, e.g. `auth0|62ea0b...`.
    pub subject: String,
    /// Full verified claim set for anything the host needs beyond the name.
    pub claims: Claims,
}

impl Principal {
    pub fn from_claims(claims: Claims, config: &Auth0Config) -> AuthResult<Self> {
        let value = claims.principal_value(&config.principal_claim)?;
        let username = if config.principal_claim == "sub" {
            username_from_subject(&value)
        } else {
            value
        };

        Ok(Self {
            username,
            subject: claims.sub.clone(),
            claims,
        })
    }
}

/// Turns an Auth0 subject into a local username.
///
/// Subjects look like `auth0|62ea0b2e...` or `google-oauth2|1047...`;
/// the connection separator is replaced so the result is usable as a
/// plain account name: `auth0.62ea0b2e...`.
pub fn username_from_subject(subject: &str) -> String {
    subject.replace('|', ".")
}
