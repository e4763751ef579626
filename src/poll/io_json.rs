// Ballots stored as JSON records.

use serde::{Deserialize, Serialize};

use crate::poll::{io_common::make_default_id, *};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StoredRanking {
    pub option_id: String,
    pub rank: i64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StoredBallot {
    pub id: Option<String>,
    pub rankings: Vec<StoredRanking>,
    pub count: Option<u64>,
    #[serde(default)]
    pub is_test: bool,
}

pub fn read_json_ballots(path: &str) -> AppResult<Vec<ParsedBallot>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let stored: Vec<StoredBallot> =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    let default_id = make_default_id(path);
    let res = stored
        .into_iter()
        .enumerate()
        .map(|(idx, sb)| ParsedBallot {
            id: Some(sb.id.unwrap_or_else(|| default_id(idx + 1))),
            count: sb.count.unwrap_or(1),
            is_test: sb.is_test,
            ranks: sb
                .rankings
                .into_iter()
                .map(|r| (r.option_id, r.rank))
                .collect(),
        })
        .collect();
    Ok(res)
}
