//! Materials-summary provider client.
//!
//! Resolves material identifiers to structural/physical summary fields.
//! A "not found" is an empty result list, never an error; the aggregation
//! pipeline treats everything short of a transport failure as a miss.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, instrument};

use chemfuse_shared::{ChemFuseError, MaterialSummary, Result};

use crate::{build_client, normalize_base};

/// Fields requested from the summary endpoint.
const SUMMARY_FIELDS: &str = "material_id,formula_pretty,volume,density,symmetry,band_gap";

/// Client for the materials-summary provider.
#[derive(Clone)]
pub struct MaterialsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MaterialsClient {
    /// Create a client for the given provider base URL, authenticated with `api_key`.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: normalize_base(base_url)?,
            api_key: api_key.into(),
        })
    }

    /// Look up summaries for one identifier or a comma-joined list.
    ///
    /// Returns one [`MaterialSummary`] per matched identifier. Misses,
    /// non-success statuses, and undecodable bodies all yield an empty list.
    #[instrument(skip_all, fields(ids = %ids))]
    pub async fn summaries(&self, ids: &str) -> Result<Vec<MaterialSummary>> {
        let url = format!("{}/materials/summary/", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .query(&[("material_ids", ids), ("_fields", SUMMARY_FIELDS)])
            .send()
            .await
            .map_err(|e| ChemFuseError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            error!(%ids, %status, "summary lookup failed");
            return Ok(Vec::new());
        }

        let envelope: SummaryEnvelope = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                error!(%ids, error = %e, "summary payload could not be decoded");
                return Ok(Vec::new());
            }
        };

        let summaries: Vec<MaterialSummary> = envelope
            .data
            .into_iter()
            .map(SummaryDoc::into_summary)
            .collect();

        debug!(matched = summaries.len(), "summaries resolved");
        Ok(summaries)
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(default)]
    data: Vec<SummaryDoc>,
}

#[derive(Debug, Deserialize)]
struct SummaryDoc {
    material_id: Option<String>,
    formula_pretty: Option<String>,
    volume: Option<f64>,
    density: Option<f64>,
    symmetry: Option<SymmetryDoc>,
    band_gap: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SymmetryDoc {
    crystal_system: Option<String>,
}

impl SummaryDoc {
    /// Coerce into the domain type: numerics rendered as strings, missing
    /// fields as `""`.
    fn into_summary(self) -> MaterialSummary {
        MaterialSummary {
            mp_id: self.material_id.unwrap_or_default(),
            formula: self.formula_pretty.unwrap_or_default(),
            volume: self.volume.map(render_number).unwrap_or_default(),
            density: self.density.map(render_number).unwrap_or_default(),
            symmetry: self
                .symmetry
                .and_then(|s| s.crystal_system)
                .unwrap_or_default(),
            band_gap: self.band_gap.map(render_number).unwrap_or_default(),
        }
    }
}

fn render_number(v: f64) -> String {
    format!("{v}")
}
