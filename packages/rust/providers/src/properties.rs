//! Batched compound-property fetch client.
//!
//! One request covers every compound id collected across a whole input
//! batch. The decoded payload is handed back unprojected; interpreting the
//! property bags is the correlator's job.

use reqwest::Client;
use tracing::{debug, error, instrument};

use chemfuse_shared::{ChemFuseError, PropertyPayload, Result};

use crate::{build_client, normalize_base};

/// Client for the compound-property provider.
#[derive(Clone)]
pub struct PropertiesClient {
    client: Client,
    base_url: String,
}

impl PropertiesClient {
    /// Create a client for the given provider base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: normalize_base(base_url)?,
        })
    }

    /// Fetch property bags for a comma-joined list of compound ids.
    ///
    /// A trailing separator is tolerated and stripped. Payloads without a
    /// compound collection (e.g. the provider's fault envelope) decode to an
    /// empty one.
    #[instrument(skip_all, fields(cids = %cids))]
    pub async fn fetch_batch(&self, cids: &str) -> Result<PropertyPayload> {
        let cids = cids.strip_suffix(',').unwrap_or(cids);
        let url = format!("{}/rest/pug/compound/cid/JSON", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("cid", cids)])
            .send()
            .await
            .map_err(|e| ChemFuseError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            error!(%cids, %status, "property fetch returned non-success status");
        }

        let payload: PropertyPayload = response
            .json()
            .await
            .map_err(|e| ChemFuseError::Provider(format!("property payload: {e}")))?;

        debug!(compounds = payload.compounds.len(), "property batch decoded");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fixture_payload() -> String {
        std::fs::read_to_string("../../../fixtures/json/pug-962.json").expect("read pug fixture")
    }

    #[tokio::test]
    async fn fetches_and_decodes_batch() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/pug/compound/cid/JSON"))
            .and(query_param("cid", "962"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(fixture_payload(), "application/json"),
            )
            .mount(&server)
            .await;

        let client = PropertiesClient::new(&server.uri()).unwrap();
        let payload = client.fetch_batch("962").await.unwrap();

        assert_eq!(payload.compounds.len(), 1);
        assert_eq!(payload.compounds[0].cid(), 962);
        assert!(!payload.compounds[0].props.is_empty());
    }

    #[tokio::test]
    async fn trailing_separator_is_stripped() {
        let server = MockServer::start().await;

        // The mock only matches the cleaned id list
        Mock::given(method("GET"))
            .and(path("/rest/pug/compound/cid/JSON"))
            .and(query_param("cid", "962,241"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"PC_Compounds": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = PropertiesClient::new(&server.uri()).unwrap();
        let payload = client.fetch_batch("962,241,").await.unwrap();
        assert!(payload.compounds.is_empty());
    }

    #[tokio::test]
    async fn fault_envelope_decodes_to_empty_collection() {
        let server = MockServer::start().await;

        let fault = serde_json::json!({
            "Fault": {
                "Code": "PUGREST.NotFound",
                "Message": "No CID found"
            }
        });

        Mock::given(method("GET"))
            .and(path("/rest/pug/compound/cid/JSON"))
            .respond_with(ResponseTemplate::new(404).set_body_json(fault))
            .mount(&server)
            .await;

        let client = PropertiesClient::new(&server.uri()).unwrap();
        let payload = client.fetch_batch("0").await.unwrap();
        assert!(payload.compounds.is_empty());
    }

    #[tokio::test]
    async fn undecodable_body_is_a_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/pug/compound/cid/JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = PropertiesClient::new(&server.uri()).unwrap();
        let err = client.fetch_batch("962").await.unwrap_err();
        assert!(matches!(err, ChemFuseError::Provider(_)));
    }
}
