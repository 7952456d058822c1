use crate::error::{ConformityError, Result};
use crate::schema::{Block, FieldMap};
use serde::{Deserialize, Serialize};

/// A top-level element of the specification document, in document order.
///
/// The presentation layer owns the original file format; it hands the core a
/// flat element sequence, typically as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentElement {
    Paragraph { text: String },
    Table { rows: Vec<Vec<String>> },
}

/// Ordered top-level view of a specification document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecDocument {
    pub elements: Vec<DocumentElement>,
}

impl SpecDocument {
    pub fn new(elements: Vec<DocumentElement>) -> Self {
        Self { elements }
    }

    /// Parses the JSON element sequence produced by the presentation layer.
    /// A structurally invalid document is the one fatal failure of the
    /// pipeline: nothing downstream can run without blocks.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| ConformityError::Extraction(format!("invalid document JSON: {}", e)))
    }

    /// Walks the document in order, pairing each table with the nearest
    /// preceding non-empty paragraph. Lazy and finite; tables with zero rows
    /// are skipped entirely. Paragraphs are never emitted on their own.
    pub fn extract_blocks(&self) -> BlockIter<'_> {
        BlockIter {
            elements: self.elements.iter(),
            last_paragraph: None,
            next_index: 0,
        }
    }
}

/// Iterator over specification blocks in document order. `block_index` is
/// assigned in emission order and is stable downstream.
pub struct BlockIter<'a> {
    elements: std::slice::Iter<'a, DocumentElement>,
    last_paragraph: Option<String>,
    next_index: usize,
}

impl Iterator for BlockIter<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        for element in self.elements.by_ref() {
            match element {
                DocumentElement::Paragraph { text } => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        self.last_paragraph = Some(trimmed.to_string());
                    }
                }
                DocumentElement::Table { rows } => {
                    if rows.is_empty() {
                        continue;
                    }
                    let block = Block {
                        context_paragraph: self.last_paragraph.clone(),
                        table_data: table_to_field_maps(rows),
                        block_index: self.next_index,
                    };
                    self.next_index += 1;
                    return Some(block);
                }
            }
        }
        None
    }
}

/// First row is the header row: lower-cased, whitespace-normalized, blank
/// headers dropped. Each following row becomes one field-map keyed by
/// header-at-column-index; extra cells beyond the header count are dropped,
/// missing cells are simply absent keys.
fn table_to_field_maps(rows: &[Vec<String>]) -> Vec<FieldMap> {
    let headers: Vec<String> = rows[0]
        .iter()
        .map(|cell| normalize_header(cell))
        .filter(|h| !h.is_empty())
        .collect();

    rows[1..]
        .iter()
        .map(|row| {
            let mut map = FieldMap::new();
            for (header, cell) in headers.iter().zip(row.iter()) {
                map.insert(
                    header.clone(),
                    serde_json::Value::String(cell.trim().to_string()),
                );
            }
            map
        })
        .collect()
}

fn normalize_header(cell: &str) -> String {
    cell.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
