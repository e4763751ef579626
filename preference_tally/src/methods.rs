//! Winner determination methods over a [PreferenceProfile].
//!
//! All the functions are pure. Winner sets are returned in poll order, and an
//! empty profile (no candidate or no vote) has no winner under any method.

use crate::profile::PreferenceProfile;
use crate::signature::CandidateId;

/// The candidate with a positive margin against every other candidate, if any.
pub fn condorcet_winner(profile: &PreferenceProfile) -> Option<CandidateId> {
    if profile.is_empty() {
        return None;
    }
    profile.candidates().iter().cloned().find(|c| {
        profile
            .candidates()
            .iter()
            .all(|x| x == c || profile.margin(*c, *x) > 0)
    })
}

/// The candidates that lose no pairwise contest.
pub fn weak_condorcet_winners(profile: &PreferenceProfile) -> Vec<CandidateId> {
    if profile.is_empty() {
        return vec![];
    }
    profile
        .candidates()
        .iter()
        .cloned()
        .filter(|c| {
            profile
                .candidates()
                .iter()
                .all(|x| x == c || profile.margin(*c, *x) >= 0)
        })
        .collect()
}

/// Wins minus losses over all the pairwise contests, for every candidate.
pub fn copeland_scores(profile: &PreferenceProfile) -> Vec<(CandidateId, i64)> {
    profile
        .candidates()
        .iter()
        .map(|c| {
            let score = profile
                .candidates()
                .iter()
                .filter(|x| *x != c)
                .map(|x| profile.margin(*c, *x).signum())
                .sum();
            (*c, score)
        })
        .collect()
}

/// Minus the largest pairwise defeat of each candidate. An undefeated candidate scores 0.
pub fn minimax_scores(profile: &PreferenceProfile) -> Vec<(CandidateId, i64)> {
    profile
        .candidates()
        .iter()
        .map(|c| {
            let worst_loss = profile
                .candidates()
                .iter()
                .filter(|x| *x != c)
                .map(|x| profile.margin(*x, *c).max(0))
                .max()
                .unwrap_or(0);
            (*c, -worst_loss)
        })
        .collect()
}

pub fn copeland_winners(profile: &PreferenceProfile) -> Vec<CandidateId> {
    if profile.is_empty() {
        return vec![];
    }
    best_of(&copeland_scores(profile))
}

pub fn minimax_winners(profile: &PreferenceProfile) -> Vec<CandidateId> {
    if profile.is_empty() {
        return vec![];
    }
    best_of(&minimax_scores(profile))
}

/// Copeland winners, with the Minimax score used to break ties among them.
pub fn copeland_global_minimax(profile: &PreferenceProfile) -> Vec<CandidateId> {
    let copeland = copeland_winners(profile);
    if copeland.len() <= 1 {
        return copeland;
    }
    let minimax: Vec<(CandidateId, i64)> = minimax_scores(profile)
        .into_iter()
        .filter(|(c, _)| copeland.contains(c))
        .collect();
    best_of(&minimax)
}

/// All the candidates that reach the maximum score.
pub(crate) fn best_of(scores: &[(CandidateId, i64)]) -> Vec<CandidateId> {
    match scores.iter().map(|(_, s)| *s).max() {
        Some(best) => scores
            .iter()
            .filter(|(_, s)| *s == best)
            .map(|(c, _)| *c)
            .collect(),
        None => vec![],
    }
}
