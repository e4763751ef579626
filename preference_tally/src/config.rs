// ********* Input data structures ***********

use snafu::prelude::*;

/// One of the options of a poll.
///
/// Options are plain values: an identifier that ballots refer to, and a
/// display name used in all the reports.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct PollOption {
    pub id: String,
    pub name: String,
}

impl PollOption {
    pub fn new(id: &str, name: &str) -> PollOption {
        PollOption {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// The rank given by a voter to one option.
///
/// Ranks start at 1 (first choice). Several options may share a rank (a tie)
/// and ranks do not need to be contiguous.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct RankingEntry {
    pub option_id: String,
    pub rank: i64,
}

impl RankingEntry {
    pub fn new(option_id: &str, rank: i64) -> RankingEntry {
        RankingEntry {
            option_id: option_id.to_string(),
            rank,
        }
    }
}

/// Where a ballot record comes from.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Provenance {
    /// Cast by a single voter. The count is 1.
    Individual,
    /// A ranking pattern shared by `count` real voters (bulk import).
    Aggregated,
    /// A test vote. Excluded from tabulation unless explicitly requested.
    Test,
}

/// A stored ballot.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BallotRecord {
    /// Identifier of the record, used in error messages.
    pub id: Option<String>,
    pub rankings: Vec<RankingEntry>,
    /// The number of identical votes this record stands for.
    pub count: u64,
    pub provenance: Provenance,
}

impl BallotRecord {
    /// A ballot cast by a single voter.
    pub fn individual(rankings: Vec<RankingEntry>) -> BallotRecord {
        BallotRecord {
            id: None,
            rankings,
            count: 1,
            provenance: Provenance::Individual,
        }
    }

    /// A ranking pattern submitted on behalf of `count` voters.
    pub fn aggregated(rankings: Vec<RankingEntry>, count: u64) -> BallotRecord {
        BallotRecord {
            id: None,
            rankings,
            count,
            provenance: Provenance::Aggregated,
        }
    }

    pub fn test(rankings: Vec<RankingEntry>) -> BallotRecord {
        BallotRecord {
            id: None,
            rankings,
            count: 1,
            provenance: Provenance::Test,
        }
    }

    pub fn with_id(self, id: &str) -> BallotRecord {
        BallotRecord {
            id: Some(id.to_string()),
            ..self
        }
    }

    pub fn is_test(&self) -> bool {
        self.provenance == Provenance::Test
    }

    /// The label used for this record in error messages.
    pub(crate) fn label(&self, idx: usize) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("#{}", idx + 1),
        }
    }
}

// ******** Errors *********

/// Errors that prevent a tabulation from completing.
///
/// No partial result is ever returned alongside an error.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TabulationError {
    #[snafu(display("option {option_id:?} is not part of the poll"))]
    UnknownOption { option_id: String },

    #[snafu(display("option {option_id:?} is ranked more than once"))]
    DuplicateOption { option_id: String },

    #[snafu(display("the ballot does not rank any option"))]
    EmptyBallot {},

    #[snafu(display("option {option_id:?} has non-positive rank {rank}"))]
    NonPositiveRank { option_id: String, rank: i64 },

    #[snafu(display("the ballot record has a count of zero"))]
    ZeroCount {},

    #[snafu(display("ballot {ballot}: {source}"))]
    InvalidBallot {
        ballot: String,
        #[snafu(source(from(TabulationError, Box::new)))]
        source: Box<TabulationError>,
    },

    #[snafu(display("the total ballot weight exceeds {limit} votes"))]
    WeightOverflow { limit: u64 },

    #[snafu(display("invalid poll definition: {reason}"))]
    InvalidPoll { reason: String },

    #[snafu(display("poll {poll_id} not found"))]
    PollNotFound { poll_id: String },

    #[snafu(display("internal tabulation error: {message}"))]
    Computation { message: String },
}

impl TabulationError {
    /// True when the error is caused by the content of a ballot.
    pub fn is_validation(&self) -> bool {
        match self {
            TabulationError::UnknownOption { .. }
            | TabulationError::DuplicateOption { .. }
            | TabulationError::EmptyBallot {}
            | TabulationError::NonPositiveRank { .. }
            | TabulationError::ZeroCount {} => true,
            TabulationError::InvalidBallot { source, .. } => source.is_validation(),
            TabulationError::WeightOverflow { .. }
            | TabulationError::InvalidPoll { .. }
            | TabulationError::PollNotFound { .. }
            | TabulationError::Computation { .. } => false,
        }
    }
}

pub type TabulationResult<T> = Result<T, TabulationError>;

// ********* Configuration **********

/// Which poll options take part in the pairwise contests.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum CandidateScope {
    /// Only the options ranked on at least one counted ballot.
    Ranked,
    /// Every option of the poll, including options nobody ranked.
    AllOptions,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TabulationRules {
    /// Count the test ballots as well. They are reported as a separate sub-total.
    pub include_test: bool,
    pub candidate_scope: CandidateScope,
}

impl TabulationRules {
    pub const DEFAULT_RULES: TabulationRules = TabulationRules {
        include_test: false,
        candidate_scope: CandidateScope::Ranked,
    };
}

impl Default for TabulationRules {
    fn default() -> Self {
        TabulationRules::DEFAULT_RULES
    }
}
