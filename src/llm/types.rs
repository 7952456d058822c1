use crate::schema::{FieldVerdict, OrderVerdict};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of the oracle round-trip itself (network, auth, rate limit, or an
/// unusable completion). Always contained at the call site: a failed call
/// degrades to a sentinel or diagnostic record, never aborts the batch.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Oracle transport failure: {0}")]
    Transport(String),

    #[error("Oracle API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Oracle returned an empty completion")]
    EmptyCompletion,
}

/// External decision oracle: one blocking round-trip per call, prompt text
/// in, response text out. Injected so deterministic fakes can drive the test
/// suite without network access.
#[allow(async_fn_in_trait)]
pub trait Oracle {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
    ) -> std::result::Result<String, OracleError>;
}

impl<T: Oracle> Oracle for &T {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
    ) -> std::result::Result<String, OracleError> {
        (**self).complete(model, prompt).await
    }
}

/// Exact shape the prefix oracle must answer with.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PrefixResponse {
    #[schemars(description = "Index of the analyzed block, echoed back unchanged")]
    pub block_index: usize,

    #[schemars(
        description = "Detected identifier prefix; must never be null or empty, always infer the most plausible one"
    )]
    pub prefixe_detecte: String,
}

/// Exact shape the conformity oracle must answer with.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConformityResponse {
    #[schemars(description = "The analyzed PCR line, echoed back unchanged")]
    pub line: String,

    #[schemars(description = "Overall conformity of the line")]
    pub conforme: bool,

    #[serde(default)]
    #[schemars(description = "One verdict per specified field, in specification order")]
    pub champs: Vec<FieldVerdict>,

    #[serde(default)]
    #[schemars(description = "Verdict on the field order in the line")]
    pub ordre_champs: Option<OrderVerdict>,

    #[serde(default)]
    #[schemars(description = "Fully corrected PCR line respecting order, lengths and constraints")]
    pub ligne_corrigee: Option<String>,

    #[serde(default)]
    #[schemars(description = "Free-form error descriptions, when any")]
    pub erreurs: Option<Vec<String>>,
}

/// Progress events emitted over an optional channel while an audit runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnalysisEvent {
    Starting,
    ResolvingPrefix { block_index: usize },
    PrefixResolved { block_index: usize, prefixe: String },
    PrefixFallback { block_index: usize, reason: String },
    MatchingLines { line_count: usize },
    VerifyingLine { line_index: usize },
    LineVerified { line_index: usize, conforme: bool },
    VerificationFailed { line_index: usize, reason: String },
    Completed,
}
