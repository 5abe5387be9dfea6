//! Signed-token builders for the auth integration tests.
//!
//! The RSA key pair and the matching JWKS document live next to the test
//! sources so every harness signs and verifies with the same material.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use auth0_guard::{Audience, Claims};

pub const TEST_PRIVATE_KEY_PEM: &str = include_str!("../test_private_key.pem");
pub const TEST_PUBLIC_KEY_PEM: &str = include_str!("../test_public_key.pem");
pub const TEST_JWKS_JSON: &str = include_str!("../test_jwks.json");

pub const TEST_KID: &str = "test-key-id";
pub const TEST_ISSUER: &str = "https://test-tenant.auth0.com/";
pub const TEST_AUDIENCE: &str = "https://api.example.test";

pub fn claims_for(sub: &str, exp: i64) -> Claims {
    Claims {
        iss: TEST_ISSUER.to_string(),
        sub: sub.to_string(),
        aud: Audience::Single(TEST_AUDIENCE.to_string()),
        exp: exp as u64,
        iat: (Utc::now() - Duration::minutes(1)).timestamp() as u64,
        nbf: None,
        email: Some("user@example.test".to_string()),
        email_verified: Some(true),
        name: Some("Test User".to_string()),
        nickname: None,
        picture: None,
        custom_claims: HashMap::new(),
    }
}

pub fn sign_rs256(claims: &Claims, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY_PEM.as_bytes())
        .expect("test private key should parse");
    encode(&header, claims, &key).expect("failed to sign test token")
}

pub fn valid_token(sub: &str) -> String {
    let exp = (Utc::now() + Duration::hours(1)).timestamp();
    sign_rs256(&claims_for(sub, exp), TEST_KID)
}

pub fn expired_token(sub: &str) -> String {
    let exp = (Utc::now() - Duration::hours(1)).timestamp();
    sign_rs256(&claims_for(sub, exp), TEST_KID)
}

pub fn wrong_audience_token(sub: &str) -> String {
    let exp = (Utc::now() + Duration::hours(1)).timestamp();
    let mut claims = claims_for(sub, exp);
    claims.aud = Audience::Single("https://other-api.example.test".to_string());
    sign_rs256(&claims, TEST_KID)
}

/// Flips a bit in the signature segment so verification must fail.
pub fn tamper_signature(token: &str) -> String {
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let sig = parts.last_mut().expect("token should have a signature part");
    let mut bytes = sig.clone().into_bytes();
    bytes[0] = if bytes[0] == b'A' { b'B' } else { b'A' };
    *sig = String::from_utf8(bytes).expect("signature should stay ascii");
    parts.join(".")
}
