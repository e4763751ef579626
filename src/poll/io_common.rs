use std::path::Path;

use crate::poll::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Splits a cell into the labels it holds. Blank labels are dropped.
pub fn split_tier(cell: &str, delimiter: &str) -> Vec<String> {
    cell.split(delimiter)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

pub fn parse_count(cell: &str, lineno: usize) -> AppResult<u64> {
    let s = cell.trim();
    if s.is_empty() {
        return Ok(1);
    }
    s.parse::<u64>().ok().context(ParsingNumberSnafu {
        lineno,
        value: s.to_string(),
    })
}

pub fn parse_flag(cell: &str) -> bool {
    matches!(
        cell.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "x" | "test"
    )
}
