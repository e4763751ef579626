use log::info;
use snafu::prelude::*;
use std::collections::HashMap;

use crate::config::*;
use crate::results::DetailedResults;

/// A poll as it is stored: its identity and its options.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PollDefinition {
    pub poll_id: String,
    pub title: String,
    pub options: Vec<PollOption>,
    /// Closed polls accept no new ballot. Tabulation ignores this flag.
    pub is_closed: bool,
}

/// Read access to the stored polls and their ballots.
pub trait PollStore {
    fn poll(&self, poll_id: &str) -> Option<PollDefinition>;

    /// All the ballot records of a poll. Test records are dropped unless `include_test` is set.
    fn ballots(&self, poll_id: &str, include_test: bool) -> Vec<BallotRecord>;
}

/// A [PollStore] kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPollStore {
    polls: HashMap<String, PollDefinition>,
    ballots: HashMap<String, Vec<BallotRecord>>,
}

impl MemoryPollStore {
    pub fn new() -> MemoryPollStore {
        MemoryPollStore::default()
    }

    /// Adds or replaces a poll. Its ballots are kept.
    pub fn insert_poll(&mut self, poll: PollDefinition) {
        self.polls.insert(poll.poll_id.clone(), poll);
    }

    pub fn add_ballots(&mut self, poll_id: &str, records: Vec<BallotRecord>) {
        self.ballots
            .entry(poll_id.to_string())
            .or_default()
            .extend(records);
    }
}

impl PollStore for MemoryPollStore {
    fn poll(&self, poll_id: &str) -> Option<PollDefinition> {
        self.polls.get(poll_id).cloned()
    }

    fn ballots(&self, poll_id: &str, include_test: bool) -> Vec<BallotRecord> {
        self.ballots
            .get(poll_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| include_test || !r.is_test())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Fetches a poll from the store and tabulates it.
///
/// An unknown poll is reported as [TabulationError::PollNotFound].
pub fn tabulate_poll<S: PollStore + ?Sized>(
    store: &S,
    poll_id: &str,
    rules: &TabulationRules,
) -> TabulationResult<DetailedResults> {
    let poll = store.poll(poll_id).context(PollNotFoundSnafu { poll_id })?;
    let ballots = store.ballots(poll_id, rules.include_test);
    info!(
        "tabulate_poll: poll {} ({:?}): {} ballot records",
        poll.poll_id,
        poll.title,
        ballots.len()
    );
    let mut res = crate::tabulate_with_rules(&poll.options, &ballots, rules)?;
    res.poll_id = Some(poll.poll_id);
    Ok(res)
}
