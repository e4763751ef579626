use crate::poll::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "pollId")]
    pub poll_id: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub poll_id: Option<String>,
    pub title: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteColumnIndex")]
    pub _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    pub _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
    #[serde(rename = "countColumnIndex")]
    pub count_column_index: Option<JSValue>,
    #[serde(rename = "testColumnIndex")]
    pub test_column_index: Option<JSValue>,
    /// Separates the options sharing a rank in a cell.
    #[serde(rename = "tieDelimiter")]
    pub tie_delimiter: Option<String>,
}

pub const DEFAULT_TIE_DELIMITER: &str = "~";

impl FileSource {
    /// A source made from the command line arguments.
    pub fn from_input(provider: &str, file_path: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            ..FileSource::default()
        }
    }

    /// Index of the first column holding votes, starting at 0.
    ///
    /// Defaults to the first column after the id, count and test columns.
    pub fn first_vote_column_index(&self) -> AppResult<usize> {
        if self._first_vote_column_index.is_some() {
            let x = read_js_int(&self._first_vote_column_index)?;
            return Ok(x.saturating_sub(1));
        }
        let others = [
            self.id_column_index_int()?,
            self.count_column_index_int()?,
            self.test_column_index_int()?,
        ];
        Ok(others.iter().flatten().map(|idx| idx + 1).max().unwrap_or(0))
    }

    /// Line of the first vote, starting at 1. Defaults to 2: the first line is a header.
    pub fn first_vote_row_index(&self) -> AppResult<usize> {
        if self._first_vote_row_index.is_some() {
            let x = read_js_int(&self._first_vote_row_index)?;
            ensure_whatever!(x >= 1, "firstVoteRowIndex starts at 1, got {}", x);
            Ok(x)
        } else {
            Ok(2)
        }
    }

    fn column(&self, x: &Option<JSValue>) -> AppResult<Option<usize>> {
        if x.is_some() {
            read_js_int(x).map(|idx| Some(idx.saturating_sub(1)))
        } else {
            Ok(None)
        }
    }

    pub fn id_column_index_int(&self) -> AppResult<Option<usize>> {
        self.column(&self.id_column_index)
    }

    pub fn count_column_index_int(&self) -> AppResult<Option<usize>> {
        self.column(&self.count_column_index)
    }

    pub fn test_column_index_int(&self) -> AppResult<Option<usize>> {
        self.column(&self.test_column_index)
    }

    pub fn tie_delimiter(&self) -> String {
        self.tie_delimiter
            .clone()
            .unwrap_or_else(|| DEFAULT_TIE_DELIMITER.to_string())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollOptionConfig {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RulesConfig {
    #[serde(rename = "includeTest")]
    pub include_test: Option<bool>,
    #[serde(rename = "candidateScope")]
    pub candidate_scope: Option<String>,
}

impl RulesConfig {
    pub fn candidate_scope(&self) -> AppResult<CandidateScope> {
        match self.candidate_scope.as_deref() {
            None | Some("ranked") => Ok(CandidateScope::Ranked),
            Some("allOptions") => Ok(CandidateScope::AllOptions),
            Some(x) => whatever!("unknown candidate scope: {}", x),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    pub options: Vec<PollOptionConfig>,
    #[serde(rename = "ballotSources", default)]
    pub ballot_sources: Vec<FileSource>,
    #[serde(default)]
    pub rules: RulesConfig,
}

impl PollConfig {
    /// The poll options. An option without identifier is identified by its name.
    pub fn poll_options(&self) -> Vec<PollOption> {
        self.options
            .iter()
            .map(|o| PollOption::new(o.id.as_deref().unwrap_or(&o.name), &o.name))
            .collect()
    }
}

pub fn read_config(path: &str) -> AppResult<PollConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    serde_json::from_str(&contents).context(ParsingJsonSnafu { path })
}

pub fn read_summary(path: &str) -> AppResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_summary: {}: {:?}", path, js);
    Ok(js)
}

/// Reads a column or row index: a number, a string holding a number, or an
/// Excel-style column letter (`A` is 1).
fn read_js_int(x: &Option<JSValue>) -> AppResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) if s.len() == 1 && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            let c1: u8 = s.to_ascii_lowercase().as_bytes()[0];
            Ok((c1 - b'a') as usize + 1)
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}
