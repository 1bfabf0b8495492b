use crate::error::ApiError;
use std::env;
use std::time::Duration;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Connection settings for the Comptoir backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn new(api_url: impl AsRef<str>) -> Result<Self, ApiError> {
        let mut base = api_url.as_ref().trim().to_string();
        if base.is_empty() {
            return Err(ApiError::InvalidConfig("api base url cannot be empty".into()));
        }
        if !base.contains("://") {
            let inferred_scheme = infer_scheme(&base);
            base = format!("{inferred_scheme}{base}");
        }
        // A trailing slash keeps the final path segment when joining
        // relative endpoint paths onto the base.
        if !base.ends_with('/') {
            base.push('/');
        }
        let parsed = Url::parse(&base)
            .map_err(|err| ApiError::InvalidConfig(format!("invalid api base url: {err}")))?;
        Ok(Self {
            base_url: parsed,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        })
    }

    /// Reads `COMPTOIR_API_URL`, falling back to the local development backend.
    pub fn from_env() -> Result<Self, ApiError> {
        let base = env::var("COMPTOIR_API_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::new(base)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

fn infer_scheme(base: &str) -> &'static str {
    let host_part = base.split('/').next().unwrap_or(base);
    let host_lower = host_part.to_ascii_lowercase();
    if host_lower.starts_with("localhost")
        || host_lower == "0.0.0.0"
        || host_lower.starts_with("127.")
        || host_lower.starts_with("10.")
        || host_lower.starts_with("192.168.")
        || host_lower.starts_with("[::1]")
    {
        "http://"
    } else {
        "https://"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_https_for_public_hosts() {
        assert_eq!(infer_scheme("api.comptoir.example"), "https://");
        assert_eq!(infer_scheme("13.215.162.4"), "https://");
    }

    #[test]
    fn defaults_to_http_for_local_hosts() {
        for host in ["localhost", "localhost:8000", "127.0.0.1:8000", "192.168.1.10"] {
            assert_eq!(infer_scheme(host), "http://");
        }
    }

    #[test]
    fn keeps_the_api_path_segment_when_joining() {
        let config = ApiConfig::new("localhost:8000/api").unwrap();
        assert_eq!(config.base_url().as_str(), "http://localhost:8000/api/");
        let endpoint = config.base_url().join("products/").unwrap();
        assert_eq!(endpoint.as_str(), "http://localhost:8000/api/products/");
    }

    #[test]
    fn rejects_empty_base_url() {
        assert!(matches!(ApiConfig::new("  "), Err(ApiError::InvalidConfig(_))));
    }
}
