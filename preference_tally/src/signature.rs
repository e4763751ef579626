//! Canonical form of a ballot.
//!
//! A ballot is reduced to an ordered list of tiers. Only the relative order of
//! the ranks and the grouping of ties matter: ranks `{1, 2, 2, 5}` and
//! `{1, 2, 2, 3}` give the same signature.

use log::debug;
use snafu::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::*;

/// Position of an option in the poll definition.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CandidateId(u32);

impl CandidateId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The options of a poll, indexed for lookups by identifier.
#[derive(Debug, Clone)]
pub struct OptionTable {
    options: Vec<PollOption>,
    by_id: HashMap<String, CandidateId>,
}

impl OptionTable {
    pub fn new(options: &[PollOption]) -> TabulationResult<OptionTable> {
        let mut by_id: HashMap<String, CandidateId> = HashMap::new();
        for (idx, opt) in options.iter().enumerate() {
            let previous = by_id.insert(opt.id.clone(), CandidateId(idx as u32));
            ensure!(
                previous.is_none(),
                InvalidPollSnafu {
                    reason: format!("option id {:?} is defined twice", opt.id)
                }
            );
        }
        Ok(OptionTable {
            options: options.to_vec(),
            by_id,
        })
    }

    pub fn empty() -> OptionTable {
        OptionTable {
            options: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    pub fn get(&self, option_id: &str) -> Option<CandidateId> {
        self.by_id.get(option_id).cloned()
    }

    pub fn option(&self, cid: CandidateId) -> &PollOption {
        &self.options[cid.index()]
    }

    pub fn name(&self, cid: CandidateId) -> &str {
        self.option(cid).name.as_str()
    }

    /// All the identifiers, in poll order.
    pub fn ids(&self) -> impl Iterator<Item = CandidateId> + '_ {
        (0..self.options.len()).map(|idx| CandidateId(idx as u32))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// The tiers of a ballot, best first. Each tier is sorted by poll order.
///
/// Invariant: there is at least one tier, no tier is empty and no option
/// appears twice.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct RankingSignature {
    tiers: Vec<Vec<CandidateId>>,
}

impl RankingSignature {
    pub fn tiers(&self) -> &[Vec<CandidateId>] {
        &self.tiers
    }

    /// The tier of the candidate, or None if the ballot does not rank it.
    pub fn tier_of(&self, cid: CandidateId) -> Option<usize> {
        self.tiers.iter().position(|tier| tier.contains(&cid))
    }

    pub fn num_ranked(&self) -> usize {
        self.tiers.iter().map(|t| t.len()).sum()
    }

    pub fn ranked(&self) -> impl Iterator<Item = CandidateId> + '_ {
        self.tiers.iter().flatten().cloned()
    }

    /// Extended strict preference: `a` is in a better tier than `b`, or `a`
    /// is ranked and `b` is not. Two unranked candidates are tied.
    pub fn prefers(&self, a: CandidateId, b: CandidateId) -> bool {
        match (self.tier_of(a), self.tier_of(b)) {
            (Some(ta), Some(tb)) => ta < tb,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn is_bullet_vote(&self) -> bool {
        self.num_ranked() == 1
    }

    /// No tie anywhere on the ballot, whether or not it ranks every option.
    pub fn is_linear(&self) -> bool {
        self.tiers.iter().all(|t| t.len() == 1)
    }
}

/// Reduces a list of ranking entries to its signature.
pub fn normalize(
    table: &OptionTable,
    rankings: &[RankingEntry],
) -> TabulationResult<RankingSignature> {
    ensure!(!rankings.is_empty(), EmptyBallotSnafu {});

    let mut seen: HashSet<CandidateId> = HashSet::new();
    let mut by_rank: BTreeMap<i64, Vec<CandidateId>> = BTreeMap::new();
    for entry in rankings.iter() {
        let cid = table.get(&entry.option_id).context(UnknownOptionSnafu {
            option_id: entry.option_id.clone(),
        })?;
        ensure!(
            seen.insert(cid),
            DuplicateOptionSnafu {
                option_id: entry.option_id.clone()
            }
        );
        ensure!(
            entry.rank >= 1,
            NonPositiveRankSnafu {
                option_id: entry.option_id.clone(),
                rank: entry.rank
            }
        );
        by_rank.entry(entry.rank).or_default().push(cid);
    }

    // The BTreeMap hands out the ranks in increasing order, the actual values are dropped.
    let tiers: Vec<Vec<CandidateId>> = by_rank
        .into_values()
        .map(|mut tier| {
            tier.sort();
            tier
        })
        .collect();
    Ok(RankingSignature { tiers })
}

/// Validates a stored record and computes its signature.
pub fn normalize_ballot(
    table: &OptionTable,
    ballot: &BallotRecord,
    idx: usize,
) -> TabulationResult<RankingSignature> {
    let res = if ballot.count == 0 {
        ZeroCountSnafu {}.fail()
    } else {
        normalize(table, &ballot.rankings)
    };
    let sig = res.context(InvalidBallotSnafu {
        ballot: ballot.label(idx),
    })?;
    debug!("normalize_ballot: {}: {:?}", ballot.label(idx), sig.tiers);
    Ok(sig)
}

#[cfg(test)]
pub(crate) fn signature_of(tiers: &[&[u32]]) -> RankingSignature {
    RankingSignature {
        tiers: tiers
            .iter()
            .map(|t| t.iter().map(|idx| CandidateId(*idx)).collect())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table() -> OptionTable {
        OptionTable::new(&[
            PollOption::new("a", "Alice"),
            PollOption::new("b", "Bob"),
            PollOption::new("c", "Charlie"),
            PollOption::new("d", "Dana"),
        ])
        .unwrap()
    }

    fn entries(ranks: &[(&str, i64)]) -> Vec<RankingEntry> {
        ranks
            .iter()
            .map(|(id, rank)| RankingEntry::new(id, *rank))
            .collect()
    }

    #[test]
    fn table_lookups() {
        let t = table();
        let cid = t.get("c").unwrap();
        assert_eq!(t.option(cid), &PollOption::new("c", "Charlie"));
        assert_eq!(t.name(cid), "Charlie");
        assert_eq!(t.get("z"), None);
        assert_eq!(t.ids().count(), 4);
    }

    #[test]
    fn gaps_are_dropped() {
        let t = table();
        let s1 = normalize(&t, &entries(&[("a", 1), ("b", 2), ("c", 2), ("d", 5)])).unwrap();
        let s2 = normalize(&t, &entries(&[("d", 3), ("c", 2), ("b", 2), ("a", 1)])).unwrap();
        assert_eq!(s1, s2);
        assert_eq!(s1, signature_of(&[&[0], &[1, 2], &[3]]));
    }

    #[test]
    fn omitted_options_are_absent() {
        let t = table();
        let s = normalize(&t, &entries(&[("c", 4)])).unwrap();
        assert_eq!(s.tiers().len(), 1);
        assert_eq!(s.tier_of(CandidateId(2)), Some(0));
        assert_eq!(s.tier_of(CandidateId(0)), None);
        assert!(s.is_bullet_vote());
        assert!(s.is_linear());
    }

    #[test]
    fn extended_preference_keeps_unranked_tied() {
        let s = signature_of(&[&[0], &[1, 2]]);
        assert!(s.prefers(CandidateId(0), CandidateId(1)));
        assert!(!s.prefers(CandidateId(1), CandidateId(2)));
        assert!(!s.prefers(CandidateId(2), CandidateId(1)));
        // Ranked beats unranked
        assert!(s.prefers(CandidateId(2), CandidateId(3)));
        assert!(!s.prefers(CandidateId(3), CandidateId(2)));
        // Both unranked: no preference either way.
        let bullet = signature_of(&[&[0]]);
        assert!(!bullet.prefers(CandidateId(2), CandidateId(3)));
        assert!(!bullet.prefers(CandidateId(3), CandidateId(2)));
        assert!(!bullet.prefers(CandidateId(0), CandidateId(0)));
    }

    #[test]
    fn rejects_invalid_ballots() {
        let t = table();
        assert!(matches!(
            normalize(&t, &[]),
            Err(TabulationError::EmptyBallot {})
        ));
        assert!(matches!(
            normalize(&t, &entries(&[("a", 1), ("z", 2)])),
            Err(TabulationError::UnknownOption { option_id }) if option_id == "z"
        ));
        assert!(matches!(
            normalize(&t, &entries(&[("a", 1), ("a", 2)])),
            Err(TabulationError::DuplicateOption { option_id }) if option_id == "a"
        ));
        assert!(matches!(
            normalize(&t, &entries(&[("a", 0)])),
            Err(TabulationError::NonPositiveRank { rank: 0, .. })
        ));
        assert!(matches!(
            normalize(&t, &entries(&[("a", -3)])),
            Err(TabulationError::NonPositiveRank { rank: -3, .. })
        ));
    }

    #[test]
    fn zero_count_is_rejected_with_label() {
        let t = table();
        let ballot = BallotRecord::aggregated(entries(&[("a", 1)]), 0).with_id("imp-7");
        let err = normalize_ballot(&t, &ballot, 0).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "ballot imp-7: the ballot record has a count of zero");
    }

    #[test]
    fn duplicate_poll_options() {
        let res = OptionTable::new(&[PollOption::new("a", "A"), PollOption::new("a", "B")]);
        assert!(matches!(res, Err(TabulationError::InvalidPoll { .. })));
    }

    proptest! {
        // Stretching the ranks while keeping their order never changes the signature.
        #[test]
        fn signature_ignores_rank_values(
            ranks in proptest::collection::vec(1i64..5, 4),
            gaps in proptest::collection::vec(0i64..4, 5),
        ) {
            let t = table();
            let ids = ["a", "b", "c", "d"];
            let stretch = |r: i64| r + gaps[..(r as usize)].iter().sum::<i64>();
            let plain: Vec<RankingEntry> = ids.iter().zip(ranks.iter())
                .map(|(id, r)| RankingEntry::new(id, *r)).collect();
            let stretched: Vec<RankingEntry> = ids.iter().zip(ranks.iter())
                .map(|(id, r)| RankingEntry::new(id, stretch(*r))).collect();
            prop_assert_eq!(normalize(&t, &plain).unwrap(), normalize(&t, &stretched).unwrap());
        }
    }
}
