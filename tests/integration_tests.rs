use pcr_conformity::*;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Deterministic oracle: answers prefix prompts from a per-block script and
/// conformity prompts from a per-line script, by inspecting the prompt text
/// the way the real model would see it.
struct ScriptedOracle {
    prefix_answers: HashMap<usize, String>,
    conformity_answers: Mutex<Vec<String>>,
}

impl Oracle for ScriptedOracle {
    async fn complete(
        &self,
        _model: &str,
        prompt: &str,
    ) -> std::result::Result<String, OracleError> {
        if prompt.contains("prefixe_detecte") && prompt.contains("bloc à analyser") {
            for (index, prefix) in &self.prefix_answers {
                if prompt.contains(&format!("\"block_index\": {}", index)) {
                    return Ok(format!(
                        "{{\"block_index\": {}, \"prefixe_detecte\": \"{}\"}}",
                        index, prefix
                    ));
                }
            }
            return Err(OracleError::Transport("unscripted block".to_string()));
        }
        Ok(self.conformity_answers.lock().unwrap().remove(0))
    }
}

fn spec_document() -> SpecDocument {
    SpecDocument::new(vec![
        DocumentElement::Paragraph {
            text: "Spécification des codes client.".to_string(),
        },
        DocumentElement::Table {
            rows: vec![
                vec!["Champ".to_string(), "Format attendu".to_string()],
                vec!["Code Client".to_string(), "CLT + 6 chiffres".to_string()],
            ],
        },
        DocumentElement::Paragraph {
            text: "Spécification des références produit.".to_string(),
        },
        DocumentElement::Table {
            rows: vec![
                vec!["Champ".to_string(), "Format attendu".to_string()],
                vec!["Référence".to_string(), "023 + 15 chiffres".to_string()],
            ],
        },
        // Zero-row table: must not become a block.
        DocumentElement::Table { rows: vec![] },
    ])
}

fn zero_throttle_config() -> AuditConfig {
    AuditConfig {
        prefix_throttle: Duration::ZERO,
        conformity_throttle: Duration::ZERO,
        ..AuditConfig::default()
    }
}

fn conforming_answer(line: &str) -> String {
    format!(
        r#"{{
            "line": "{line}",
            "conforme": true,
            "champs": [
                {{"nom": "Code Client", "valeur": "{line}", "conforme": true, "erreur": null, "longueur_attendue": 9}}
            ],
            "ordre_champs": {{
                "conforme": true,
                "ordre_attendu": ["Code Client"],
                "ordre_lu": ["Code Client"]
            }},
            "ligne_corrigee": "{line}"
        }}"#
    )
}

#[tokio::test]
async fn full_audit_produces_one_record_per_line() {
    let oracle = ScriptedOracle {
        prefix_answers: HashMap::from([(0, "CLT".to_string()), (1, "023".to_string())]),
        conformity_answers: Mutex::new(vec![
            conforming_answer("CLT123456REST"),
            "réponse hors format".to_string(),
        ]),
    };

    let pcr_text = "CLT123456REST\n\nXYZ000001\n023456789012345678\n";
    let report = ConformityAudit::new(oracle)
        .with_config(zero_throttle_config())
        .run(&spec_document(), pcr_text, None)
        .await
        .unwrap();

    // Zero-row table skipped: two resolved blocks, in document order.
    assert_eq!(report.blocks.len(), 2);
    assert_eq!(report.blocks[0].prefixe_detecte, "CLT");
    assert_eq!(report.blocks[1].prefixe_detecte, "023");
    assert_eq!(report.blocks[0].block_index, 0);

    // Blank line dropped, every remaining line yields exactly one record.
    assert_eq!(report.records.len(), 3);

    let clt = &report.records[0];
    assert_eq!(clt.line, "CLT123456REST");
    assert!(clt.conforme);
    assert_eq!(clt.statut, RecordStatus::Verifie);

    let unmatched = &report.records[1];
    assert_eq!(unmatched.line, "XYZ000001");
    assert!(!unmatched.conforme);
    assert_eq!(unmatched.statut, RecordStatus::SansBloc);

    // The 023 line reached the oracle but got a malformed verdict back.
    let degraded = &report.records[2];
    assert_eq!(degraded.statut, RecordStatus::EchecOracle);
    assert_eq!(degraded.raw_response.as_deref(), Some("réponse hors format"));
}

#[tokio::test]
async fn prefix_oracle_failure_degrades_to_sentinel_and_run_continues() {
    let oracle = ScriptedOracle {
        // Block 1 is unscripted: its prefix call fails with a transport error.
        prefix_answers: HashMap::from([(0, "CLT".to_string())]),
        conformity_answers: Mutex::new(vec![conforming_answer("CLT123456REST")]),
    };

    let report = ConformityAudit::new(oracle)
        .with_config(zero_throttle_config())
        .run(&spec_document(), "CLT123456REST\n", None)
        .await
        .unwrap();

    assert_eq!(report.blocks[0].prefixe_detecte, "CLT");
    assert_eq!(report.blocks[1].prefixe_detecte, PREFIX_UNKNOWN);
    assert!(report.blocks[1].erreur.is_some());
    assert_eq!(report.records.len(), 1);
    assert!(report.records[0].conforme);
}

#[tokio::test]
async fn document_without_blocks_aborts_the_run() {
    let oracle = ScriptedOracle {
        prefix_answers: HashMap::new(),
        conformity_answers: Mutex::new(vec![]),
    };

    let doc = SpecDocument::new(vec![DocumentElement::Paragraph {
        text: "Que du texte, aucun tableau.".to_string(),
    }]);

    let err = ConformityAudit::new(oracle)
        .with_config(zero_throttle_config())
        .run(&doc, "CLT123456\n", None)
        .await
        .unwrap_err();

    assert!(matches!(err, ConformityError::Extraction(_)));
}

#[tokio::test]
async fn progress_events_cover_the_whole_pipeline() {
    let oracle = ScriptedOracle {
        prefix_answers: HashMap::from([(0, "CLT".to_string()), (1, "023".to_string())]),
        conformity_answers: Mutex::new(vec![conforming_answer("CLT123456REST")]),
    };

    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let report = ConformityAudit::new(oracle)
        .with_config(zero_throttle_config())
        .run(&spec_document(), "CLT123456REST\n", Some(&tx))
        .await
        .unwrap();
    drop(tx);

    assert_eq!(report.records.len(), 1);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert!(matches!(events.first(), Some(AnalysisEvent::Starting)));
    assert!(matches!(events.last(), Some(AnalysisEvent::Completed)));
    assert!(events
        .iter()
        .any(|e| matches!(e, AnalysisEvent::PrefixResolved { block_index: 0, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, AnalysisEvent::MatchingLines { line_count: 1 })));
    assert!(events.iter().any(
        |e| matches!(e, AnalysisEvent::LineVerified { line_index: 0, conforme: true })
    ));
}

#[tokio::test]
async fn report_serialization_round_trips_end_to_end() {
    let oracle = ScriptedOracle {
        prefix_answers: HashMap::from([(0, "CLT".to_string()), (1, "023".to_string())]),
        conformity_answers: Mutex::new(vec![conforming_answer("CLT123456REST")]),
    };

    let report = ConformityAudit::new(oracle)
        .with_config(zero_throttle_config())
        .run(&spec_document(), "CLT123456REST\nXYZ000001\n", None)
        .await
        .unwrap();

    let rendered = render_report(&report.records).unwrap();
    let parsed = parse_report(&rendered).unwrap();
    assert_eq!(report.records, parsed);

    // Byte-reproducible for identical inputs and identical oracle answers.
    assert_eq!(rendered, render_report(&parsed).unwrap());

    // Accents from the unmatched-line diagnostic stay literal.
    assert!(rendered.contains("Aucun bloc associé à cette ligne."));
}
