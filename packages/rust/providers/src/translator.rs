//! Registry number → compound id translation client.
//!
//! The translation service answers with a JSON array of conversion objects;
//! the first element's `results` array carries the compound id(s). This is
//! the one pipeline stage without a defensive fallback: a body that does not
//! decode is a hard [`ChemFuseError::Provider`] error for the whole request.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, instrument};

use chemfuse_shared::{ChemFuseError, Result};

use crate::{build_client, normalize_base};

/// Client for the registry-number translation service.
#[derive(Clone)]
pub struct TranslatorClient {
    client: Client,
    base_url: String,
}

/// One conversion object from the translation service.
#[derive(Debug, Deserialize)]
struct Conversion {
    #[serde(default)]
    results: Vec<Value>,
}

impl TranslatorClient {
    /// Create a client for the given provider base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: normalize_base(base_url)?,
        })
    }

    /// Translate a registry number into the property provider's compound id.
    ///
    /// `Ok(None)` when the service knows the number but has no conversion;
    /// `Err(Provider)` when the payload cannot be decoded.
    #[instrument(skip_all, fields(registry_number = %registry_number))]
    pub async fn compound_id(&self, registry_number: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/rest/convert/CAS/Pubchem%20CID/{registry_number}",
            self.base_url
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChemFuseError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            error!(%registry_number, %status, "translation service returned non-success status");
        }

        let body = response
            .text()
            .await
            .map_err(|e| ChemFuseError::Network(format!("{url}: failed to read body: {e}")))?;

        let conversions: Vec<Conversion> = serde_json::from_str(&body)
            .map_err(|e| ChemFuseError::Provider(format!("translation payload: {e}")))?;

        let first = conversions.into_iter().next().ok_or_else(|| {
            ChemFuseError::Provider("translation payload: empty conversion list".into())
        })?;

        let id = first
            .results
            .first()
            .map(coerce_id)
            .filter(|s| !s.is_empty());

        match &id {
            Some(cid) => debug!(%registry_number, compound_id = %cid, "compound id resolved"),
            None => debug!(%registry_number, "no compound id for registry number"),
        }

        Ok(id)
    }
}

/// The service types ids inconsistently (string or number); normalize to string.
fn coerce_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn id_coercion_normalizes_types() {
        assert_eq!(coerce_id(&Value::String("962".into())), "962");
        assert_eq!(coerce_id(&serde_json::json!(962)), "962");
        assert_eq!(coerce_id(&Value::Null), "");
    }

    #[tokio::test]
    async fn resolves_compound_id() {
        let server = MockServer::start().await;

        let body = serde_json::json!([{
            "fromIdentifier": "CAS",
            "searchTerm": "7732-18-5",
            "toIdentifier": "PubChem CID",
            "results": ["962"]
        }]);

        Mock::given(method("GET"))
            .and(path_regex(r"^/rest/convert/CAS/.*/7732-18-5$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = TranslatorClient::new(&server.uri()).unwrap();
        let id = client.compound_id("7732-18-5").await.unwrap();
        assert_eq!(id, Some("962".to_string()));
    }

    #[tokio::test]
    async fn empty_results_is_a_miss() {
        let server = MockServer::start().await;

        let body = serde_json::json!([{"results": []}]);

        Mock::given(method("GET"))
            .and(path_regex(r"^/rest/convert/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = TranslatorClient::new(&server.uri()).unwrap();
        let id = client.compound_id("50-00-0").await.unwrap();
        assert_eq!(id, None);
    }

    #[tokio::test]
    async fn absent_results_field_is_a_miss() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/rest/convert/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{}])))
            .mount(&server)
            .await;

        let client = TranslatorClient::new(&server.uri()).unwrap();
        let id = client.compound_id("50-00-0").await.unwrap();
        assert_eq!(id, None);
    }

    #[tokio::test]
    async fn undecodable_body_is_a_hard_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/rest/convert/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway error</html>"))
            .mount(&server)
            .await;

        let client = TranslatorClient::new(&server.uri()).unwrap();
        let err = client.compound_id("7732-18-5").await.unwrap_err();
        assert!(matches!(err, ChemFuseError::Provider(_)));
    }

    #[tokio::test]
    async fn empty_conversion_list_is_a_hard_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/rest/convert/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = TranslatorClient::new(&server.uri()).unwrap();
        let err = client.compound_id("7732-18-5").await.unwrap_err();
        assert!(matches!(err, ChemFuseError::Provider(_)));
    }

    #[tokio::test]
    async fn non_success_status_still_decodes_body() {
        let server = MockServer::start().await;

        let body = serde_json::json!([{"results": ["962"]}]);

        Mock::given(method("GET"))
            .and(path_regex(r"^/rest/convert/"))
            .respond_with(ResponseTemplate::new(500).set_body_json(body))
            .mount(&server)
            .await;

        let client = TranslatorClient::new(&server.uri()).unwrap();
        let id = client.compound_id("7732-18-5").await.unwrap();
        assert_eq!(id, Some("962".to_string()));
    }
}
