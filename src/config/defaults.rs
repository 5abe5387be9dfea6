pub fn default_jwks_cache_ttl_secs() -> u64 {
    3600
}

pub fn default_leeway_secs() -> u64 {
    30
}

pub fn default_principal_claim() -> String {
    "sub".to_string()
}

pub fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Tenant domains are frequently pasted with a scheme or trailing slash;
/// the rest of the crate expects a bare host name.
pub fn normalize_domain(value: Option<String>) -> Option<String> {
    normalize_optional_string(value).map(|domain| {
        let stripped = domain
            .strip_prefix("https://")
            .or_else(|| domain.strip_prefix("http://"))
            .unwrap_or(&domain);
        stripped.trim_end_matches('/').to_string()
    })
}
