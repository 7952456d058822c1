use crate::error::Result;
use crate::schema::{LineMatch, ResolvedBlock};
use log::debug;
use std::path::Path;

/// Splits the raw PCR file content into lines, trimming trailing whitespace
/// and dropping fully blank lines. Line indices downstream refer to this
/// filtered sequence.
pub fn extract_pcr_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_end().to_string())
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Reads a PCR transaction file as UTF-8 and extracts its non-blank lines.
pub fn read_pcr_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(extract_pcr_lines(&text))
}

/// Matches each line to the first block (ascending `block_index`) whose
/// detected prefix literally starts the line. Case-sensitive, first match
/// wins; when prefixes overlap (e.g. "CL" and "CLT") the lowest block index
/// is the tie-break. Pure function of its inputs.
///
/// The `UNKNOWN` sentinel participates like any other prefix; only an empty
/// prefix never matches.
pub fn match_lines(blocks: &[ResolvedBlock], lines: &[String]) -> Vec<LineMatch> {
    lines
        .iter()
        .enumerate()
        .map(|(line_index, line)| {
            let matched_block = blocks
                .iter()
                .find(|block| {
                    !block.prefixe_detecte.is_empty() && line.starts_with(&block.prefixe_detecte)
                })
                .cloned();

            if matched_block.is_none() {
                debug!("line {} matched no block prefix", line_index);
            }

            LineMatch {
                line_index,
                line: line.clone(),
                matched_block,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(index: usize, prefix: &str) -> ResolvedBlock {
        ResolvedBlock {
            prefixe_detecte: prefix.to_string(),
            table_data: Vec::new(),
            block_index: index,
            erreur: None,
            raw_response: None,
        }
    }

    #[test]
    fn extract_drops_blank_lines_and_trims_trailing_whitespace() {
        let lines = extract_pcr_lines("CLT123456REST  \n\n   \nXYZ000001\r\n");
        assert_eq!(lines, vec!["CLT123456REST", "XYZ000001"]);
    }

    #[test]
    fn line_matches_block_whose_prefix_starts_it() {
        let blocks = vec![block(0, "CLT")];
        let lines = vec!["CLT123456REST".to_string(), "XYZ000001".to_string()];

        let matches = match_lines(&blocks, &lines);
        assert_eq!(matches.len(), 2);
        assert_eq!(
            matches[0].matched_block.as_ref().unwrap().block_index,
            0
        );
        assert_eq!(matches[0].line_index, 0);
        assert!(matches[1].matched_block.is_none());
        assert_eq!(matches[1].line_index, 1);
    }

    #[test]
    fn overlapping_prefixes_resolve_to_lowest_block_index() {
        let blocks = vec![block(0, "CL"), block(1, "CLT")];
        let lines = vec!["CLT123456".to_string()];

        let matches = match_lines(&blocks, &lines);
        assert_eq!(matches[0].matched_block.as_ref().unwrap().block_index, 0);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let blocks = vec![block(0, "CLT")];
        let lines = vec!["clt123456".to_string()];

        let matches = match_lines(&blocks, &lines);
        assert!(matches[0].matched_block.is_none());
    }

    #[test]
    fn empty_prefix_never_matches() {
        let blocks = vec![block(0, "")];
        let lines = vec!["anything".to_string()];

        let matches = match_lines(&blocks, &lines);
        assert!(matches[0].matched_block.is_none());
    }

    #[test]
    fn unknown_sentinel_matches_literally() {
        let blocks = vec![block(0, "UNKNOWN")];
        let lines = vec!["UNKNOWN-suffix".to_string()];

        let matches = match_lines(&blocks, &lines);
        assert!(matches[0].matched_block.is_some());
    }

    #[test]
    fn matching_is_idempotent() {
        let blocks = vec![block(0, "CLT"), block(1, "023")];
        let lines = vec![
            "CLT123456REST".to_string(),
            "023456789012345".to_string(),
            "XYZ000001".to_string(),
        ];

        let first = match_lines(&blocks, &lines);
        let second = match_lines(&blocks, &lines);
        assert_eq!(first, second);
    }
}
