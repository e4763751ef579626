use log::{debug, info};
use std::fmt::Display;

use crate::methods::*;
use crate::profile::PreferenceProfile;
use crate::signature::CandidateId;

/// The rules of the fallback cascade, in the order they are tried.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Stage {
    Condorcet,
    WeakCondorcet,
    Copeland,
    Minimax,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Condorcet => "condorcet",
            Stage::WeakCondorcet => "weak_condorcet",
            Stage::Copeland => "copeland",
            Stage::Minimax => "minimax",
        }
    }
}

/// How the outcome of a poll was determined.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum WinnerType {
    /// A single winner, picked by the given rule.
    Decided(Stage),
    /// Several candidates remain tied after the given rule.
    Tie(Stage),
    /// No candidate or no vote.
    None,
}

impl WinnerType {
    /// The tag used in reports: `condorcet`, `tie_minimax`, `none`, ...
    pub fn tag(&self) -> String {
        match self {
            WinnerType::Decided(stage) => stage.as_str().to_string(),
            WinnerType::Tie(stage) => format!("tie_{}", stage.as_str()),
            WinnerType::None => "none".to_string(),
        }
    }
}

impl Display for WinnerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Resolution {
    pub winner_type: WinnerType,
    pub winner: Option<CandidateId>,
    /// The candidates still tied at the end of the cascade. Empty unless it is a tie.
    pub tied: Vec<CandidateId>,
}

impl Resolution {
    fn decided(stage: Stage, cid: CandidateId) -> Resolution {
        Resolution {
            winner_type: WinnerType::Decided(stage),
            winner: Some(cid),
            tied: vec![],
        }
    }

    pub fn is_tie(&self) -> bool {
        matches!(self.winner_type, WinnerType::Tie(_))
    }
}

/// Picks the winner of a poll.
///
/// The rules are tried in order and the first one that singles out a
/// candidate decides:
/// 1. the Condorcet winner,
/// 2. the weak Condorcet winner, if there is exactly one,
/// 3. the unique best Copeland score,
/// 4. the unique best Minimax score among the best Copeland scores.
///
/// Otherwise the poll is a tie between the candidates left after step 4.
pub fn resolve_winner(profile: &PreferenceProfile) -> Resolution {
    if profile.is_empty() {
        info!("resolve_winner: empty profile, no winner");
        return Resolution {
            winner_type: WinnerType::None,
            winner: None,
            tied: vec![],
        };
    }

    if let Some(cid) = condorcet_winner(profile) {
        info!("resolve_winner: Condorcet winner: {}", profile.name(cid));
        return Resolution::decided(Stage::Condorcet, cid);
    }

    let weak = weak_condorcet_winners(profile);
    debug!("resolve_winner: weak Condorcet winners: {:?}", weak);
    if let [cid] = weak.as_slice() {
        info!("resolve_winner: weak Condorcet winner: {}", profile.name(*cid));
        return Resolution::decided(Stage::WeakCondorcet, *cid);
    }

    let copeland = copeland_winners(profile);
    debug!("resolve_winner: best Copeland scores: {:?}", copeland);
    if let [cid] = copeland.as_slice() {
        info!("resolve_winner: Copeland winner: {}", profile.name(*cid));
        return Resolution::decided(Stage::Copeland, *cid);
    }

    let finalists = copeland_global_minimax(profile);
    debug!("resolve_winner: best Minimax scores among them: {:?}", finalists);
    if let [cid] = finalists.as_slice() {
        info!("resolve_winner: Minimax winner: {}", profile.name(*cid));
        return Resolution::decided(Stage::Minimax, *cid);
    }

    info!(
        "resolve_winner: tie between {:?}",
        profile.names(&finalists)
    );
    Resolution {
        winner_type: WinnerType::Tie(Stage::Minimax),
        winner: None,
        tied: finalists,
    }
}
