use crate::llm::prompts::{build_conformity_prompt, clean_json_output};
use crate::llm::resolver::send_event;
use crate::llm::types::{AnalysisEvent, ConformityResponse, Oracle};
use crate::schema::{ConformityRecord, LineMatch, RecordStatus};
use log::{debug, warn};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::time::sleep;

/// Default model used by the conformity oracle.
pub const DEFAULT_CONFORMITY_MODEL: &str = "mistralai/Mixtral-8x7B-Instruct-v0.1";

/// Delay between successive conformity oracle calls; only applied after
/// calls that actually reached the oracle.
pub const DEFAULT_CONFORMITY_THROTTLE: Duration = Duration::from_secs(2);

/// Judges each matched line against its block's field specifications through
/// the oracle. Unmatched lines never reach the oracle; every line still
/// yields exactly one record.
pub struct ConformityVerifier<O> {
    oracle: O,
    model: String,
    throttle: Duration,
}

impl<O: Oracle> ConformityVerifier<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            model: DEFAULT_CONFORMITY_MODEL.to_string(),
            throttle: DEFAULT_CONFORMITY_THROTTLE,
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

    /// One record for one match. Terminal states: unmatched lines synthesize
    /// a non-conforming record without an oracle call; oracle failures and
    /// unparseable responses synthesize one carrying the diagnostic detail.
    pub async fn verify_line(&self, line_match: &LineMatch) -> ConformityRecord {
        let block = match &line_match.matched_block {
            Some(block) => block,
            None => {
                debug!("line {} has no block, skipping oracle", line_match.line_index);
                return ConformityRecord::unmatched(&line_match.line);
            }
        };

        let prompt = build_conformity_prompt(&line_match.line, &block.table_data);

        let raw = match self.oracle.complete(&self.model, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "conformity oracle transport failure on line {}: {}",
                    line_match.line_index, e
                );
                return ConformityRecord::verification_failed(
                    &line_match.line,
                    format!("Erreur oracle : {}", e),
                    None,
                );
            }
        };

        match parse_conformity_response(&raw, &line_match.line) {
            Ok(record) => record,
            Err(detail) => {
                warn!(
                    "conformity oracle response rejected on line {}: {}",
                    line_match.line_index, detail
                );
                ConformityRecord::verification_failed(&line_match.line, detail, Some(raw))
            }
        }
    }

    /// Verifies all matches in file order, throttling between oracle calls.
    /// One bad line never aborts the batch.
    pub async fn verify_all(
        &self,
        matches: &[LineMatch],
        progress: Option<&Sender<AnalysisEvent>>,
    ) -> Vec<ConformityRecord> {
        let mut records = Vec::with_capacity(matches.len());
        for line_match in matches {
            send_event(
                progress,
                AnalysisEvent::VerifyingLine {
                    line_index: line_match.line_index,
                },
            )
            .await;

            let consulted_oracle = line_match.matched_block.is_some();
            let record = self.verify_line(line_match).await;

            let event = match record.statut {
                RecordStatus::EchecOracle => AnalysisEvent::VerificationFailed {
                    line_index: line_match.line_index,
                    reason: record
                        .erreurs
                        .as_ref()
                        .and_then(|e| e.first().cloned())
                        .unwrap_or_default(),
                },
                _ => AnalysisEvent::LineVerified {
                    line_index: line_match.line_index,
                    conforme: record.conforme,
                },
            };
            send_event(progress, event).await;

            records.push(record);
            if consulted_oracle {
                sleep(self.throttle).await;
            }
        }
        records
    }
}

/// Parses the oracle's verdict and enforces the report-schema rules the
/// prompt asks for: the record's `line` is the actual line from the file, a
/// conforming order never carries a correction suggestion, and a
/// non-conforming order must carry one.
fn parse_conformity_response(
    raw: &str,
    line: &str,
) -> std::result::Result<ConformityRecord, String> {
    let response: ConformityResponse = serde_json::from_str(clean_json_output(raw))
        .map_err(|_| "Réponse JSON invalide de l'oracle.".to_string())?;

    let mut ordre_champs = response.ordre_champs;
    if let Some(verdict) = ordre_champs.as_mut() {
        if verdict.conforme {
            verdict.suggestion_ordre_corrige = None;
        } else if verdict.suggestion_ordre_corrige.is_none() {
            return Err(
                "Ordre non conforme sans suggestion_ordre_corrige dans la réponse.".to_string(),
            );
        }
    }

    Ok(ConformityRecord {
        line: line.to_string(),
        conforme: response.conforme,
        statut: RecordStatus::Verifie,
        champs: response.champs,
        ordre_champs,
        ligne_corrigee: response.ligne_corrigee,
        erreurs: response.erreurs,
        raw_response: None,
    })
}
