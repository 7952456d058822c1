use crate::document::SpecDocument;
use crate::error::{ConformityError, Result};
use crate::llm::{
    AnalysisEvent, ConformityVerifier, Oracle, PrefixResolver, DEFAULT_CONFORMITY_MODEL,
    DEFAULT_CONFORMITY_THROTTLE, DEFAULT_PREFIX_MODEL, DEFAULT_PREFIX_THROTTLE,
};
use crate::matcher::{extract_pcr_lines, match_lines};
use crate::schema::{ConformityRecord, ResolvedBlock};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc::Sender;

/// Tunables for one audit run. Throttles are rate-limit discipline only and
/// are set to zero in tests.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub prefix_model: String,
    pub conformity_model: String,
    pub prefix_throttle: Duration,
    pub conformity_throttle: Duration,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            prefix_model: DEFAULT_PREFIX_MODEL.to_string(),
            conformity_model: DEFAULT_CONFORMITY_MODEL.to_string(),
            prefix_throttle: DEFAULT_PREFIX_THROTTLE,
            conformity_throttle: DEFAULT_CONFORMITY_THROTTLE,
        }
    }
}

/// Everything one run produces: the resolved blocks and the per-line verdict
/// records, both in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub blocks: Vec<ResolvedBlock>,
    pub records: Vec<ConformityRecord>,
}

/// End-to-end pipeline: block extraction → prefix resolution → line matching
/// → conformity verification. Sequential and single-task; blocks and records
/// live only for the run.
pub struct ConformityAudit<O> {
    oracle: O,
    config: AuditConfig,
}

impl<O: Oracle> ConformityAudit<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            config: AuditConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AuditConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs a full audit of `pcr_text` against `document`. Only a document
    /// yielding no blocks aborts the run; every oracle-related failure is
    /// contained in its block or record, so the report is always complete in
    /// cardinality.
    pub async fn run(
        &self,
        document: &SpecDocument,
        pcr_text: &str,
        progress: Option<&Sender<AnalysisEvent>>,
    ) -> Result<AuditReport> {
        crate::llm::resolver::send_event(progress, AnalysisEvent::Starting).await;

        let blocks: Vec<_> = document.extract_blocks().collect();
        if blocks.is_empty() {
            return Err(ConformityError::Extraction(
                "document contains no specification blocks".to_string(),
            ));
        }
        info!("extracted {} specification blocks", blocks.len());

        let resolver = PrefixResolver::new(&self.oracle)
            .with_model(self.config.prefix_model.clone())
            .with_throttle(self.config.prefix_throttle);
        let resolved = resolver.resolve_all(blocks, progress).await;

        let lines = extract_pcr_lines(pcr_text);
        crate::llm::resolver::send_event(
            progress,
            AnalysisEvent::MatchingLines {
                line_count: lines.len(),
            },
        )
        .await;
        let matches = match_lines(&resolved, &lines);
        debug!(
            "{} of {} lines matched a block",
            matches.iter().filter(|m| m.matched_block.is_some()).count(),
            matches.len()
        );

        let verifier = ConformityVerifier::new(&self.oracle)
            .with_model(self.config.conformity_model.clone())
            .with_throttle(self.config.conformity_throttle);
        let records = verifier.verify_all(&matches, progress).await;

        crate::llm::resolver::send_event(progress, AnalysisEvent::Completed).await;
        info!(
            "audit complete: {} records, {} conforming",
            records.len(),
            records.iter().filter(|r| r.conforme).count()
        );

        Ok(AuditReport {
            blocks: resolved,
            records,
        })
    }
}
