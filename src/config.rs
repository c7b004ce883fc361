//! Environment-driven configuration.
//!
//! The base URL is cosmetic: it is echoed back as `api` metadata in
//! responses so callers see which endpoint a real deployment would hit.
//! The engine never dials it.

/// Placeholder used when no environment variable is set.
pub const DEFAULT_BASE_URL: &str = "https://your-commerce-instance.commerce.dynamics.com";

/// Environment variables consulted, in order.
const BASE_URL_VARS: &[&str] = &["COMMERCE_BASE_URL", "DYNAMICS365_BASE_URL"];

#[derive(Debug, Clone)]
pub struct CommerceConfig {
    base_url: String,
}

impl CommerceConfig {
    pub fn from_env() -> Self {
        for var in BASE_URL_VARS {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    return Self::with_base_url(value);
                }
            }
        }
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            base_url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let config = CommerceConfig::with_base_url("https://shop.example.com/");
        assert_eq!(config.base_url(), "https://shop.example.com");
    }
}
