//! Clients for the four upstream chemistry/materials data providers.
//!
//! This crate provides:
//! - [`MaterialsClient`] — material id → structural/physical summary
//! - [`RegistryClient`] — chemical formula → registry number (scraped page)
//! - [`TranslatorClient`] — registry number → compound id
//! - [`PropertiesClient`] — batched compound id → property bags
//!
//! Each client wraps exactly one upstream call; all cross-provider
//! correlation lives in `chemfuse-core`.

pub mod materials;
pub mod properties;
pub mod registry;
pub mod translator;

pub use materials::MaterialsClient;
pub use properties::PropertiesClient;
pub use registry::RegistryClient;
pub use translator::TranslatorClient;

use chemfuse_shared::{ChemFuseError, Result};

/// User-Agent string for provider requests.
const USER_AGENT: &str = concat!("chemfuse/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Build a reqwest client with the shared provider settings.
pub(crate) fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|e| ChemFuseError::Network(format!("failed to build HTTP client: {e}")))
}

/// Validate a provider base URL and normalize it (no trailing slash).
pub(crate) fn normalize_base(base_url: &str) -> Result<String> {
    let parsed = url::Url::parse(base_url)
        .map_err(|e| ChemFuseError::config(format!("invalid provider base URL '{base_url}': {e}")))?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_base_strips_trailing_slash() {
        assert_eq!(
            normalize_base("https://webbook.nist.gov/").unwrap(),
            "https://webbook.nist.gov"
        );
        assert_eq!(
            normalize_base("http://127.0.0.1:8080").unwrap(),
            "http://127.0.0.1:8080"
        );
    }

    #[test]
    fn normalize_base_rejects_garbage() {
        assert!(normalize_base("not a url").is_err());
    }
}
