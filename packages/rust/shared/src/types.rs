//! Core domain types for chemfuse aggregation.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// MaterialSummary
// ---------------------------------------------------------------------------

/// Structural/physical summary for one material identifier, as served by the
/// raw summary endpoint. Numeric fields are rendered as strings; anything the
/// provider omits is coerced to `""`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialSummary {
    /// Material identifier in the summary provider's namespace.
    pub mp_id: String,
    /// Pretty chemical formula (may be empty).
    pub formula: String,
    /// Unit cell volume in cubic angstroms.
    pub volume: String,
    /// Density in g/cm^3.
    pub density: String,
    /// Crystal symmetry system.
    pub symmetry: String,
    /// Band gap in eV.
    pub band_gap: String,
}

// ---------------------------------------------------------------------------
// AggregatedRecord
// ---------------------------------------------------------------------------

/// The fully correlated row for one input identifier.
///
/// Every field starts empty; each pipeline stage fills in what it resolved.
/// The bond counts stay `None` until the property provider supplies integer
/// values, so the external rendering can tell "unresolved" apart from zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedRecord {
    pub material_id: String,
    pub formula: String,
    pub volume: String,
    pub density: String,
    pub symmetry: String,
    pub band_gap: String,
    /// Compound id in the property provider's namespace.
    pub compound_id: String,
    /// Chemical registry number resolved from the formula.
    pub registry_number: String,
    pub iupac_name: String,
    pub molecular_weight: String,
    pub canonical_smiles: String,
    pub inchi: String,
    pub inchikey: String,
    pub hbd: Option<i64>,
    pub hba: Option<i64>,
    pub rb: Option<i64>,
}

impl AggregatedRecord {
    /// Start a record for one identifier, everything else unresolved.
    pub fn for_identifier(id: impl Into<String>) -> Self {
        Self {
            material_id: id.into(),
            ..Self::default()
        }
    }

    /// Copy the summary fields resolved for this identifier.
    pub fn apply_summary(&mut self, summary: &MaterialSummary) {
        self.formula = summary.formula.clone();
        self.volume = summary.volume.clone();
        self.density = summary.density.clone();
        self.symmetry = summary.symmetry.clone();
        self.band_gap = summary.band_gap.clone();
    }
}

// ---------------------------------------------------------------------------
// ChemTable
// ---------------------------------------------------------------------------

/// Column-oriented projection of an ordered set of [`AggregatedRecord`]s.
///
/// This is the external response shape: every column is aligned by position
/// with the input identifier order. Key names (units included) are part of
/// the public contract.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChemTable {
    pub mp_id: Vec<String>,
    pub formula: Vec<String>,
    #[serde(rename = "volume (A^3)")]
    pub volume: Vec<String>,
    #[serde(rename = "density (g/cm^3)")]
    pub density: Vec<String>,
    pub symmetry: Vec<String>,
    #[serde(rename = "band_gap (eV)")]
    pub band_gap: Vec<String>,
    pub pubchem_cid: Vec<String>,
    pub cas_rn: Vec<String>,
    pub iupac_name: Vec<String>,
    #[serde(rename = "molecular_weight (g/mol)")]
    pub molecular_weight: Vec<String>,
    pub canonical_smiles: Vec<String>,
    pub inchi: Vec<String>,
    pub inchikey: Vec<String>,
    #[serde(serialize_with = "count_column")]
    pub hbd: Vec<Option<i64>>,
    #[serde(serialize_with = "count_column")]
    pub hba: Vec<Option<i64>>,
    #[serde(serialize_with = "count_column")]
    pub rb: Vec<Option<i64>>,
}

impl ChemTable {
    /// Project row-oriented records into the columnar response shape.
    pub fn from_records(records: &[AggregatedRecord]) -> Self {
        let mut table = Self::default();
        for rec in records {
            table.mp_id.push(rec.material_id.clone());
            table.formula.push(rec.formula.clone());
            table.volume.push(rec.volume.clone());
            table.density.push(rec.density.clone());
            table.symmetry.push(rec.symmetry.clone());
            table.band_gap.push(rec.band_gap.clone());
            table.pubchem_cid.push(rec.compound_id.clone());
            table.cas_rn.push(rec.registry_number.clone());
            table.iupac_name.push(rec.iupac_name.clone());
            table.molecular_weight.push(rec.molecular_weight.clone());
            table.canonical_smiles.push(rec.canonical_smiles.clone());
            table.inchi.push(rec.inchi.clone());
            table.inchikey.push(rec.inchikey.clone());
            table.hbd.push(rec.hbd);
            table.hba.push(rec.hba);
            table.rb.push(rec.rb);
        }
        table
    }

    /// Number of rows in the table.
    pub fn len(&self) -> usize {
        self.mp_id.len()
    }

    /// True when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.mp_id.is_empty()
    }
}

/// Serialize a bond-count column the way the provider types it: the integer
/// when resolved, `""` when not.
fn count_column<S>(vals: &[Option<i64>], ser: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut seq = ser.serialize_seq(Some(vals.len()))?;
    for v in vals {
        match v {
            Some(n) => seq.serialize_element(n)?,
            None => seq.serialize_element("")?,
        }
    }
    seq.end()
}

// ---------------------------------------------------------------------------
// Property provider payload
// ---------------------------------------------------------------------------

/// Decoded batch payload from the compound-property provider.
///
/// Kept structurally faithful to the wire format (`PC_Compounds` with
/// per-compound `props` bags); the correlator interprets it, the fetcher
/// does not project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyPayload {
    #[serde(rename = "PC_Compounds", default)]
    pub compounds: Vec<CompoundEntry>,
}

/// One compound's identity and property bag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompoundEntry {
    #[serde(default)]
    pub id: CompoundIdTag,
    #[serde(default)]
    pub props: Vec<CompoundProp>,
}

impl CompoundEntry {
    /// The compound id this entry is keyed by.
    pub fn cid(&self) -> u64 {
        self.id.id.cid
    }
}

/// Nested id envelope: `{"id": {"id": {"cid": 962}}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompoundIdTag {
    #[serde(default)]
    pub id: CidValue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CidValue {
    #[serde(default)]
    pub cid: u64,
}

/// One named/typed property: `{"urn": {...}, "value": {...}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompoundProp {
    #[serde(default)]
    pub urn: PropUrn,
    #[serde(default)]
    pub value: PropValue,
}

/// Property naming: matching is exact on `label` and, where specified, `name`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropUrn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Property value, typed as string, integer, or float by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ival: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fval: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_starts_empty() {
        let rec = AggregatedRecord::for_identifier("mp-149");
        assert_eq!(rec.material_id, "mp-149");
        assert_eq!(rec.formula, "");
        assert_eq!(rec.compound_id, "");
        assert_eq!(rec.hbd, None);
    }

    #[test]
    fn table_projection_preserves_order() {
        let mut first = AggregatedRecord::for_identifier("mp-1");
        first.formula = "H2O".into();
        first.compound_id = "962".into();
        first.hbd = Some(1);
        let second = AggregatedRecord::for_identifier("mp-2");

        let table = ChemTable::from_records(&[first, second]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.mp_id, vec!["mp-1", "mp-2"]);
        assert_eq!(table.formula, vec!["H2O", ""]);
        assert_eq!(table.pubchem_cid, vec!["962", ""]);
        assert_eq!(table.hbd, vec![Some(1), None]);
    }

    #[test]
    fn table_serializes_contract_keys() {
        let mut rec = AggregatedRecord::for_identifier("mp-1");
        rec.volume = "18.07".into();
        rec.hba = Some(2);
        let table = ChemTable::from_records(&[rec]);

        let json = serde_json::to_value(&table).expect("serialize table");
        assert_eq!(json["mp_id"][0], "mp-1");
        assert_eq!(json["volume (A^3)"][0], "18.07");
        assert_eq!(json["density (g/cm^3)"][0], "");
        assert_eq!(json["band_gap (eV)"][0], "");
        assert_eq!(json["molecular_weight (g/mol)"][0], "");
        // Resolved counts render as integers, unresolved as ""
        assert_eq!(json["hba"][0], 2);
        assert_eq!(json["hbd"][0], "");
        assert_eq!(json["rb"][0], "");
    }

    #[test]
    fn property_payload_fixture_decodes() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/pug-962.json")
            .expect("read fixture");
        let payload: PropertyPayload =
            serde_json::from_str(&fixture).expect("deserialize fixture payload");

        assert_eq!(payload.compounds.len(), 1);
        let entry = &payload.compounds[0];
        assert_eq!(entry.cid(), 962);
        assert!(entry.props.iter().any(|p| {
            p.urn.label.as_deref() == Some("InChI") && p.value.sval.is_some()
        }));
    }

    #[test]
    fn payload_without_compounds_decodes_empty() {
        // Error payloads (e.g. a Fault body) carry no compound collection
        let payload: PropertyPayload =
            serde_json::from_str(r#"{"Fault": {"Code": "PUGREST.BadRequest"}}"#)
                .expect("deserialize fault payload");
        assert!(payload.compounds.is_empty());
    }
}
