//! The lookup-and-correlate pipeline over the four data providers.
//!
//! For each identifier the correlator chains summary lookup → registry
//! number → compound id, sequentially and paced by the [`RateGate`], then
//! fetches every resolved compound's properties in one batched call and
//! joins them back onto the per-identifier records.
//!
//! Failure policy: provider misses degrade to empty fields and processing
//! continues. Only two things abort a request — a batch over the configured
//! bound (before any external call), and a translation payload that cannot
//! be decoded.

use tracing::{debug, info, instrument, warn};

use chemfuse_providers::{MaterialsClient, PropertiesClient, RegistryClient, TranslatorClient};
use chemfuse_shared::{
    AggregatedRecord, ChemFuseError, CompoundProp, PipelineConfig, PropertyPayload, Result,
};

use crate::gate::RateGate;

/// Orchestrates the four lookup stages and the final join.
pub struct Correlator {
    materials: MaterialsClient,
    registry: RegistryClient,
    translator: TranslatorClient,
    properties: PropertiesClient,
    gate: RateGate,
    max_batch: usize,
}

impl Correlator {
    /// Build a correlator over the given provider clients.
    pub fn new(
        materials: MaterialsClient,
        registry: RegistryClient,
        translator: TranslatorClient,
        properties: PropertiesClient,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            materials,
            registry,
            translator,
            properties,
            gate: RateGate::from_millis(config.rate_limit_ms),
            max_batch: config.max_batch,
        }
    }

    /// Aggregate one ordered batch of material identifiers.
    ///
    /// Returns exactly one record per input identifier, in input order.
    #[instrument(skip_all, fields(batch = ids.len()))]
    pub async fn aggregate(&self, ids: &[String]) -> Result<Vec<AggregatedRecord>> {
        if ids.len() > self.max_batch {
            return Err(ChemFuseError::validation(format!(
                "too many IDs provided: please provide no more than {} IDs",
                self.max_batch
            )));
        }

        info!(batch = ids.len(), "starting aggregation");

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self.resolve_identifier(id).await?;
            records.push(record);
            self.gate.pause().await;
        }

        let joined = records
            .iter()
            .map(|r| r.compound_id.as_str())
            .filter(|cid| !cid.is_empty())
            .collect::<Vec<_>>()
            .join(",");

        if joined.is_empty() {
            debug!("no compound ids resolved, skipping property fetch");
            return Ok(records);
        }

        match self.properties.fetch_batch(&joined).await {
            Ok(payload) => join_properties(&mut records, payload),
            Err(e) => {
                warn!(error = %e, "property fetch failed, leaving property fields empty");
            }
        }

        info!(records = records.len(), "aggregation complete");
        Ok(records)
    }

    /// Run the dependent per-identifier stages with fresh state.
    ///
    /// Each identifier starts from an empty record; nothing resolved for a
    /// previous identifier carries over.
    async fn resolve_identifier(&self, id: &str) -> Result<AggregatedRecord> {
        let mut record = AggregatedRecord::for_identifier(id);

        match self.materials.summaries(id).await {
            Ok(summaries) => match summaries.into_iter().next() {
                Some(summary) => record.apply_summary(&summary),
                None => debug!(%id, "no material summary"),
            },
            Err(e) => warn!(%id, error = %e, "material summary lookup failed"),
        }

        if record.formula.is_empty() {
            return Ok(record);
        }

        match self.registry.registry_number(&record.formula).await {
            Ok(Some(number)) => record.registry_number = number,
            Ok(None) => debug!(%id, formula = %record.formula, "no registry number"),
            Err(e) => warn!(%id, error = %e, "registry number lookup failed"),
        }

        if record.registry_number.is_empty() {
            return Ok(record);
        }

        // The one stage without defensive fallback: a payload the translator
        // cannot decode aborts the whole request.
        if let Some(cid) = self.translator.compound_id(&record.registry_number).await? {
            record.compound_id = cid;
        }

        Ok(record)
    }
}

/// Join fetched property bags onto the records by exact compound-id match.
///
/// A compound entry that matches no record is dropped; a matched record gets
/// the bag applied in encounter order, later matches overwriting earlier
/// ones.
fn join_properties(records: &mut [AggregatedRecord], payload: PropertyPayload) {
    for entry in payload.compounds {
        let cid = entry.cid().to_string();
        let Some(record) = records.iter_mut().find(|r| r.compound_id == cid) else {
            debug!(%cid, "compound entry matches no requested id, skipping");
            continue;
        };
        for prop in &entry.props {
            apply_property(record, prop);
        }
    }
}

/// Assign one property by exact label/name match.
fn apply_property(record: &mut AggregatedRecord, prop: &CompoundProp) {
    let label = prop.urn.label.as_deref();
    let name = prop.urn.name.as_deref();

    if label == Some("IUPAC Name") {
        if let Some(v) = &prop.value.sval {
            record.iupac_name = v.clone();
        }
    }
    if label == Some("Molecular Weight") {
        if let Some(v) = &prop.value.sval {
            record.molecular_weight = v.clone();
        }
    }
    if label == Some("SMILES") && name == Some("Canonical") {
        if let Some(v) = &prop.value.sval {
            record.canonical_smiles = v.clone();
        }
    }
    if label == Some("InChI") {
        if let Some(v) = &prop.value.sval {
            record.inchi = v.clone();
        }
    }
    if label == Some("InChIKey") {
        if let Some(v) = &prop.value.sval {
            record.inchikey = v.clone();
        }
    }
    if name == Some("Hydrogen Bond Donor") {
        if let Some(v) = prop.value.ival {
            record.hbd = Some(v);
        }
    }
    if name == Some("Hydrogen Bond Acceptor") {
        if let Some(v) = prop.value.ival {
            record.hba = Some(v);
        }
    }
    if label == Some("Rotatable Bond") {
        if let Some(v) = prop.value.ival {
            record.rb = Some(v);
        }
    }
}
