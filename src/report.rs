use crate::error::Result;
use crate::schema::ConformityRecord;
use std::path::Path;

/// Serializes the record list to the downloadable report format: 2-space
/// indentation, UTF-8, non-ASCII characters preserved literally. Key order
/// is fixed by the struct definitions and the order-preserving field maps,
/// so identical inputs and oracle answers render byte-identically.
pub fn render_report(records: &[ConformityRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Parses a rendered report back into records.
pub fn parse_report(raw: &str) -> Result<Vec<ConformityRecord>> {
    Ok(serde_json::from_str(raw)?)
}

/// Persists the report where the presentation layer serves it from.
pub fn write_report(path: impl AsRef<Path>, records: &[ConformityRecord]) -> Result<()> {
    std::fs::write(path, render_report(records)?)?;
    Ok(())
}
