//! End-to-end audit against the real Together API.
//!
//! Usage:
//!   TOGETHER_API_KEY=... cargo run --example audit_pcr --features together -- document.json transactions.txt

use anyhow::{Context, Result};
use pcr_conformity::*;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let api_key = std::env::var("TOGETHER_API_KEY").context("TOGETHER_API_KEY is not set")?;

    let mut args = std::env::args().skip(1);
    let document_path = args.next().context("missing document JSON path")?;
    let pcr_path = args.next().context("missing PCR file path")?;

    let document_json = std::fs::read_to_string(&document_path)?;
    let document = SpecDocument::from_json_str(&document_json)?;
    let pcr_text = std::fs::read_to_string(&pcr_path)?;

    let oracle = TogetherClient::new(api_key);
    let (tx, mut rx) = tokio::sync::mpsc::channel(64);

    let progress = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            eprintln!("{:?}", event);
        }
    });

    let report = ConformityAudit::new(oracle)
        .run(&document, &pcr_text, Some(&tx))
        .await?;
    drop(tx);
    progress.await?;

    println!("{}", render_report(&report.records)?);

    let conforming = report.records.iter().filter(|r| r.conforme).count();
    eprintln!(
        "{} lignes, {} conformes, {} blocs",
        report.records.len(),
        conforming,
        report.blocks.len()
    );

    Ok(())
}
