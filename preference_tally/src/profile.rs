use log::debug;
use std::collections::HashSet;

use crate::aggregate::Aggregation;
use crate::config::*;
use crate::signature::*;
use crate::VoteCount;

/// The preferences of all the voters of a poll, built for one tabulation.
///
/// Candidates are kept in poll order. Pairwise support uses the extended
/// strict preference: a candidate left off a ballot is below every candidate
/// that ballot ranks, and two candidates left off are tied.
#[derive(Debug, Clone)]
pub struct PreferenceProfile {
    candidates: Vec<CandidateId>,
    // Indexed by candidate id, for every option of the poll.
    names: Vec<String>,
    // Sorted by signature.
    patterns: Vec<(RankingSignature, VoteCount)>,
    total: VoteCount,
    test_total: VoteCount,
    // support[i][j]: weight preferring candidates[i] over candidates[j]
    support: Vec<Vec<VoteCount>>,
}

impl PreferenceProfile {
    pub fn new(table: &OptionTable, agg: &Aggregation, scope: CandidateScope) -> PreferenceProfile {
        let patterns: Vec<(RankingSignature, VoteCount)> = agg
            .patterns()
            .into_iter()
            .filter(|(_, w)| *w > 0)
            .map(|(sig, w)| (sig.clone(), VoteCount(w)))
            .collect();

        let candidates: Vec<CandidateId> = match scope {
            CandidateScope::AllOptions => table.ids().collect(),
            CandidateScope::Ranked => {
                let ranked: HashSet<CandidateId> =
                    patterns.iter().flat_map(|(sig, _)| sig.ranked()).collect();
                table.ids().filter(|cid| ranked.contains(cid)).collect()
            }
        };
        let names = table.ids().map(|cid| table.name(cid).to_string()).collect();

        let n = candidates.len();
        let mut support = vec![vec![VoteCount::EMPTY; n]; n];
        for (sig, w) in patterns.iter() {
            for (i, a) in candidates.iter().enumerate() {
                for (j, b) in candidates.iter().enumerate() {
                    if i != j && sig.prefers(*a, *b) {
                        support[i][j] += *w;
                    }
                }
            }
        }

        let total: VoteCount = patterns.iter().map(|(_, w)| *w).sum();
        debug!(
            "PreferenceProfile::new: {} candidates, {} patterns, total weight {:?}",
            n,
            patterns.len(),
            total
        );
        PreferenceProfile {
            candidates,
            names,
            patterns,
            total,
            test_total: VoteCount(agg.test_weight()),
            support,
        }
    }

    /// The candidates, in poll order.
    pub fn candidates(&self) -> &[CandidateId] {
        &self.candidates
    }

    pub fn num_candidates(&self) -> usize {
        self.candidates.len()
    }

    /// Display name of a candidate.
    pub fn name(&self, cid: CandidateId) -> &str {
        self.names[cid.index()].as_str()
    }

    pub fn names(&self, cids: &[CandidateId]) -> Vec<String> {
        cids.iter().map(|cid| self.name(*cid).to_string()).collect()
    }

    fn position(&self, cid: CandidateId) -> Option<usize> {
        self.candidates.iter().position(|c| *c == cid)
    }

    /// Total voter weight.
    pub fn total_weight(&self) -> u64 {
        self.total.0
    }

    /// Part of the total weight coming from test ballots.
    pub fn test_weight(&self) -> u64 {
        self.test_total.0
    }

    /// No candidate or no vote: every method reports no winner.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() || self.total == VoteCount::EMPTY
    }

    /// The distinct ranking patterns and their weights.
    pub fn patterns(&self) -> impl Iterator<Item = (&RankingSignature, u64)> + '_ {
        self.patterns.iter().map(|(sig, w)| (sig, w.0))
    }

    /// Weight of the voters preferring `a` over `b`.
    ///
    /// Returns 0 for a candidate that is not part of the profile.
    pub fn support(&self, a: CandidateId, b: CandidateId) -> u64 {
        match (self.position(a), self.position(b)) {
            (Some(i), Some(j)) => self.support[i][j].0,
            _ => 0,
        }
    }

    /// Support of `a` over `b` minus support of `b` over `a`.
    ///
    /// Supports never exceed [crate::MAX_TOTAL_WEIGHT], so both fit in an `i64`.
    pub fn margin(&self, a: CandidateId, b: CandidateId) -> i64 {
        self.support(a, b) as i64 - self.support(b, a) as i64
    }

    /// Weight of the voters with no preference between `a` and `b`.
    pub fn tie_weight(&self, a: CandidateId, b: CandidateId) -> u64 {
        self.total.0 - self.support(a, b) - self.support(b, a)
    }

    /// Ranks every candidate of the profile, with or without ties.
    pub fn is_complete(&self, sig: &RankingSignature) -> bool {
        self.candidates.iter().all(|cid| sig.tier_of(*cid).is_some())
    }

    fn weight_where<F: Fn(&RankingSignature) -> bool>(&self, f: F) -> u64 {
        self.patterns
            .iter()
            .filter(|(sig, _)| f(sig))
            .map(|(_, w)| *w)
            .sum::<VoteCount>()
            .0
    }

    pub fn num_bullet_votes(&self) -> u64 {
        self.weight_where(|sig| sig.is_bullet_vote())
    }

    pub fn num_complete_rankings(&self) -> u64 {
        self.weight_where(|sig| self.is_complete(sig))
    }

    pub fn num_linear_orders(&self) -> u64 {
        self.weight_where(|sig| sig.is_linear())
    }
}
