//! # PCR Conformity
//!
//! A library for auditing lines of a flat PCR transaction file against the
//! specification blocks of a reference document, using a language-model
//! oracle for prefix detection and per-line conformity verdicts.
//!
//! ## Core Concepts
//!
//! - **Block**: a (context paragraph, table) pair extracted from the
//!   specification document, identified by position
//! - **Prefix**: a short alphanumeric token expected to begin every
//!   transaction line governed by a block; inferred by the oracle, never
//!   empty after resolution (sentinel `UNKNOWN` on failure)
//! - **Match**: the first block, in document order, whose prefix literally
//!   starts a line
//! - **ConformityRecord**: one verdict per non-blank line — field presence,
//!   per-field constraints, field order, and a corrected line proposal
//!
//! Oracle failures never abort a run: each block and each line always yields
//! exactly one output entry, degraded to a sentinel or diagnostic record
//! when something went wrong.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pcr_conformity::*;
//!
//! let doc = SpecDocument::from_json_str(&document_json)?;
//! let oracle = TogetherClient::new(api_key); // feature "together"
//!
//! let report = ConformityAudit::new(oracle)
//!     .run(&doc, &pcr_text, None)
//!     .await?;
//!
//! println!("{}", render_report(&report.records)?);
//! ```

pub mod document;
pub mod engine;
pub mod error;
pub mod llm;
pub mod matcher;
pub mod report;
pub mod schema;

pub use document::{DocumentElement, SpecDocument};
pub use engine::{AuditConfig, AuditReport, ConformityAudit};
pub use error::{ConformityError, Result};
pub use llm::*;
pub use matcher::{extract_pcr_lines, match_lines, read_pcr_lines};
pub use report::{parse_report, render_report, write_report};
pub use schema::*;
