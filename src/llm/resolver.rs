use crate::llm::prompts::{build_prefix_prompt, clean_json_output};
use crate::llm::types::{AnalysisEvent, Oracle, PrefixResponse};
use crate::schema::{Block, ResolvedBlock, PREFIX_UNKNOWN};
use log::{debug, warn};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::time::sleep;

/// Default model used by the prefix oracle.
pub const DEFAULT_PREFIX_MODEL: &str = "meta-llama/Llama-4-Maverick-17B-128E-Instruct-FP8";

/// Delay between successive prefix oracle calls. Rate-limit discipline, not
/// a correctness requirement; tests set it to zero.
pub const DEFAULT_PREFIX_THROTTLE: Duration = Duration::from_secs(3);

/// Resolves the identifier prefix of each block through the oracle, one call
/// per block, no retries. Any failure degrades to the `UNKNOWN` sentinel so
/// every block leaves resolution with a non-empty prefix.
pub struct PrefixResolver<O> {
    oracle: O,
    model: String,
    throttle: Duration,
}

impl<O: Oracle> PrefixResolver<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            model: DEFAULT_PREFIX_MODEL.to_string(),
            throttle: DEFAULT_PREFIX_THROTTLE,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// One oracle round-trip for one block. Transport failures, unparseable
    /// responses and empty/null prefixes all land on the sentinel; the
    /// failure detail (and raw response, when one exists) is retained.
    pub async fn resolve_block(&self, block: &Block) -> ResolvedBlock {
        let prompt = build_prefix_prompt(block);

        let raw = match self.oracle.complete(&self.model, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "prefix oracle transport failure on block {}: {}",
                    block.block_index, e
                );
                return self.fallback(block, format!("Erreur oracle : {}", e), None);
            }
        };

        match parse_prefix_response(&raw) {
            Ok(response) => {
                debug!(
                    "block {} resolved to prefix {:?}",
                    block.block_index, response.prefixe_detecte
                );
                ResolvedBlock {
                    prefixe_detecte: response.prefixe_detecte,
                    table_data: block.table_data.clone(),
                    block_index: block.block_index,
                    erreur: None,
                    raw_response: None,
                }
            }
            Err(detail) => {
                warn!(
                    "prefix oracle response rejected on block {}: {}",
                    block.block_index, detail
                );
                self.fallback(block, detail, Some(raw))
            }
        }
    }

    /// Resolves all blocks in order, sleeping the configured throttle after
    /// each oracle call.
    pub async fn resolve_all(
        &self,
        blocks: impl IntoIterator<Item = Block>,
        progress: Option<&Sender<AnalysisEvent>>,
    ) -> Vec<ResolvedBlock> {
        let mut resolved = Vec::new();
        for block in blocks {
            send_event(
                progress,
                AnalysisEvent::ResolvingPrefix {
                    block_index: block.block_index,
                },
            )
            .await;

            let result = self.resolve_block(&block).await;

            let event = match &result.erreur {
                None => AnalysisEvent::PrefixResolved {
                    block_index: result.block_index,
                    prefixe: result.prefixe_detecte.clone(),
                },
                Some(reason) => AnalysisEvent::PrefixFallback {
                    block_index: result.block_index,
                    reason: reason.clone(),
                },
            };
            send_event(progress, event).await;

            resolved.push(result);
            sleep(self.throttle).await;
        }
        resolved
    }

    fn fallback(&self, block: &Block, detail: String, raw: Option<String>) -> ResolvedBlock {
        ResolvedBlock {
            prefixe_detecte: PREFIX_UNKNOWN.to_string(),
            table_data: block.table_data.clone(),
            block_index: block.block_index,
            erreur: Some(detail),
            raw_response: raw,
        }
    }
}

/// Parses and validates the oracle's answer. The never-null business rule is
/// enforced here rather than trusted to instruction compliance: a
/// well-formed response carrying an empty or "null" prefix is rejected.
fn parse_prefix_response(raw: &str) -> std::result::Result<PrefixResponse, String> {
    let response: PrefixResponse = serde_json::from_str(clean_json_output(raw))
        .map_err(|e| format!("Réponse JSON invalide de l'oracle : {}", e))?;

    let prefix = response.prefixe_detecte.trim().to_string();
    if prefix.is_empty() || prefix.eq_ignore_ascii_case("null") {
        return Err("L'oracle a renvoyé un préfixe vide.".to_string());
    }

    Ok(PrefixResponse {
        block_index: response.block_index,
        prefixe_detecte: prefix,
    })
}

pub(crate) async fn send_event(sender: Option<&Sender<AnalysisEvent>>, event: AnalysisEvent) {
    if let Some(tx) = sender {
        let _ = tx.send(event).await;
    }
}
