use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One table row keyed by its lower-cased column header.
///
/// Headers vary per document, so this stays a dynamic JSON object. serde_json
/// is built with `preserve_order` so the column order of the source table
/// survives into prompts and reports.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Sentinel prefix recorded when the oracle fails or answers with an
/// empty/null prefix. Never absent, so downstream matching can stay total.
pub const PREFIX_UNKNOWN: &str = "UNKNOWN";

/// A (context paragraph, table) pair extracted from the specification
/// document, before prefix resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Block {
    #[schemars(
        description = "The nearest non-empty paragraph preceding the table, or null when the table opens the document"
    )]
    pub context_paragraph: Option<String>,

    #[schemars(description = "One field-map per table row, keyed by lower-cased column header")]
    pub table_data: Vec<FieldMap>,

    #[schemars(description = "Position of this block in document order, starting at 0")]
    pub block_index: usize,
}

/// A block after prefix resolution. `prefixe_detecte` is never empty: oracle
/// failures degrade to [`PREFIX_UNKNOWN`] and keep the failure detail here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedBlock {
    pub prefixe_detecte: String,
    pub table_data: Vec<FieldMap>,
    pub block_index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erreur: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

/// Outcome of matching one PCR line against the resolved blocks.
/// At most one block per line: lowest `block_index` whose prefix starts the
/// line wins, scanning stops on first hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineMatch {
    pub line_index: usize,
    pub line: String,
    pub matched_block: Option<ResolvedBlock>,
}

/// How a [`ConformityRecord`] came to be. An unmatched line and a failed
/// oracle call are both non-conforming but remain distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// The oracle returned a well-formed verdict for the line.
    Verifie,
    /// No block prefix matched the line; the oracle was never consulted.
    SansBloc,
    /// The oracle call failed or returned an unparseable response.
    EchecOracle,
}

/// Per-field verdict inside a conformity report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldVerdict {
    #[schemars(description = "Field name as declared in the specification table")]
    pub nom: String,

    #[schemars(description = "Value extracted from the PCR line for this field")]
    pub valeur: String,

    #[schemars(description = "Whether the value satisfies the declared constraints")]
    pub conforme: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Precise error description, or null when the field conforms")]
    pub erreur: Option<String>,

    #[serde(default)]
    #[schemars(description = "Expected length of the field in characters")]
    pub longueur_attendue: u32,
}

/// Field-order verdict. `suggestion_ordre_corrige` is present exactly when
/// the order is non-conforming; a conforming verdict never serializes the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OrderVerdict {
    pub conforme: bool,

    #[schemars(description = "Field names in the order the specification declares them")]
    pub ordre_attendu: Vec<String>,

    #[schemars(description = "Field names in the order they appear in the PCR line")]
    pub ordre_lu: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        description = "Corrected field order; only present when the read order is non-conforming"
    )]
    pub suggestion_ordre_corrige: Option<Vec<String>>,
}

/// One report entry per non-blank PCR line. Every line yields exactly one
/// record, even on failure, so the report is always complete in cardinality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConformityRecord {
    pub line: String,
    pub conforme: bool,
    pub statut: RecordStatus,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub champs: Vec<FieldVerdict>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordre_champs: Option<OrderVerdict>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ligne_corrigee: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erreurs: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl ConformityRecord {
    /// Record for a line no block prefix matched. Terminal: the oracle is
    /// never consulted for these.
    pub fn unmatched(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            conforme: false,
            statut: RecordStatus::SansBloc,
            champs: Vec::new(),
            ordre_champs: None,
            ligne_corrigee: None,
            erreurs: Some(vec!["Aucun bloc associé à cette ligne.".to_string()]),
            raw_response: None,
        }
    }

    /// Record for a line whose verification degraded (transport failure or
    /// unparseable oracle response). The raw response, when there is one,
    /// is retained for operator inspection.
    pub fn verification_failed(
        line: impl Into<String>,
        detail: impl Into<String>,
        raw_response: Option<String>,
    ) -> Self {
        Self {
            line: line.into(),
            conforme: false,
            statut: RecordStatus::EchecOracle,
            champs: Vec::new(),
            ordre_champs: None,
            ligne_corrigee: None,
            erreurs: Some(vec![detail.into()]),
            raw_response,
        }
    }
}
