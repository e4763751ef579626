// ******** Output data structures *********

use crate::resolve::WinnerType;

/// A distinct ranking pattern and the voters who submitted it.
#[derive(PartialEq, Debug, Clone)]
pub struct BallotType {
    /// Tiers of candidate names, best first. Names in a tier are tied.
    pub ranking: Vec<Vec<String>>,
    pub count: u64,
    pub percentage: f64,
}

impl BallotType {
    /// Human-readable ranking, e.g. `A > B ~ C`.
    pub fn ranking_string(&self) -> String {
        if self.ranking.is_empty() {
            return "Empty ballot".to_string();
        }
        self.ranking
            .iter()
            .map(|tier| tier.join(" ~ "))
            .collect::<Vec<String>>()
            .join(" > ")
    }
}

/// Support, opposition and margin of one candidate against another.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct PairSupport {
    pub support: u64,
    pub opposed: u64,
    pub margin: i64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairwiseComparison {
    pub candidate_a: String,
    pub candidate_b: String,
    pub a_beats_b: u64,
    pub b_beats_a: u64,
    /// Voters with no preference between the two.
    pub ties: u64,
    pub margin: i64,
}

impl PairwiseComparison {
    pub fn winner(&self) -> Option<&str> {
        match self.margin {
            m if m > 0 => Some(self.candidate_a.as_str()),
            m if m < 0 => Some(self.candidate_b.as_str()),
            _ => None,
        }
    }
}

/// The ballot types on which `candidate_a` is preferred to `candidate_b`.
#[derive(PartialEq, Debug, Clone)]
pub struct HeadToHead {
    pub candidate_a: String,
    pub candidate_b: String,
    pub ballot_types: Vec<BallotType>,
    /// Always equal to the support of `candidate_a` over `candidate_b`.
    pub total_count: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum PairwiseOutcome {
    Win,
    Loss,
    Tie,
}

impl PairwiseOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairwiseOutcome::Win => "win",
            PairwiseOutcome::Loss => "loss",
            PairwiseOutcome::Tie => "tie",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OpponentResult {
    pub opponent: String,
    pub result: PairwiseOutcome,
    pub margin: i64,
}

/// Win-loss-tie record of one candidate.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateRecord {
    pub candidate: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub copeland_score: i64,
    pub minimax_score: i64,
    pub opponents: Vec<OpponentResult>,
    /// Size of the largest defeat, 0 if undefeated.
    pub worst_loss_margin: u64,
}

impl CandidateRecord {
    pub fn net_wins(&self) -> i64 {
        self.wins as i64 - self.losses as i64
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum VotingMethod {
    Condorcet,
    Copeland,
    Minimax,
    CopelandGlobalMinimax,
}

impl VotingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            VotingMethod::Condorcet => "condorcet",
            VotingMethod::Copeland => "copeland",
            VotingMethod::Minimax => "minimax",
            VotingMethod::CopelandGlobalMinimax => "copeland_global_minimax",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VotingMethodResult {
    pub method: VotingMethod,
    pub winners: Vec<String>,
    pub is_tie: bool,
    /// Per-candidate scores, for the methods that have one.
    pub scores: Option<Vec<(String, i64)>>,
}

/// Everything computed for one tabulation.
#[derive(PartialEq, Debug, Clone)]
pub struct DetailedResults {
    pub poll_id: Option<String>,

    /// Total voter weight, test votes included when they were requested.
    pub total_voters: u64,
    /// The part of `total_voters` coming from test ballots.
    pub total_test_votes: u64,
    /// Number of ballot records counted.
    pub total_ballots: usize,
    pub num_candidates: usize,
    pub candidates: Vec<String>,

    pub ballot_types: Vec<BallotType>,
    pub num_bullet_votes: u64,
    pub num_complete_rankings: u64,
    pub num_linear_orders: u64,

    /// Margins, row candidate against column candidate.
    pub pairwise_matrix: Vec<(String, Vec<(String, i64)>)>,
    pub pairwise_support_matrix: Vec<(String, Vec<(String, PairSupport)>)>,
    pub pairwise_comparisons: Vec<PairwiseComparison>,

    pub condorcet_winner: Option<String>,
    pub weak_condorcet_winners: Vec<String>,
    pub winner_type: WinnerType,
    pub determined_winner: Option<String>,
    pub tied_winners: Vec<String>,
    pub is_tie: bool,

    pub candidate_records: Vec<CandidateRecord>,
    pub voting_results: Vec<VotingMethodResult>,
    pub head_to_head: Vec<HeadToHead>,
}

/// The short version of [DetailedResults].
#[derive(PartialEq, Debug, Clone)]
pub struct ResultsSummary {
    pub poll_id: Option<String>,
    pub winner_type: WinnerType,
    pub determined_winner: Option<String>,
    pub tied_winners: Vec<String>,
    pub is_tie: bool,
    pub condorcet_winner: Option<String>,
    pub weak_condorcet_winners: Vec<String>,
    pub minimax_winners: Vec<String>,
    pub copeland_winners: Vec<String>,
    pub most_common_ranking: Option<BallotType>,
}

impl DetailedResults {
    pub fn method(&self, method: VotingMethod) -> Option<&VotingMethodResult> {
        self.voting_results.iter().find(|r| r.method == method)
    }

    pub fn summary(&self) -> ResultsSummary {
        let winners_of = |m: VotingMethod| {
            self.method(m)
                .map(|r| r.winners.clone())
                .unwrap_or_default()
        };
        ResultsSummary {
            poll_id: self.poll_id.clone(),
            winner_type: self.winner_type,
            determined_winner: self.determined_winner.clone(),
            tied_winners: self.tied_winners.clone(),
            is_tie: self.is_tie,
            condorcet_winner: self.condorcet_winner.clone(),
            weak_condorcet_winners: self.weak_condorcet_winners.clone(),
            minimax_winners: winners_of(VotingMethod::Minimax),
            copeland_winners: winners_of(VotingMethod::Copeland),
            // Ballot types are sorted by decreasing count.
            most_common_ranking: self.ballot_types.first().cloned(),
        }
    }
}
