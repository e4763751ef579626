use log::{debug, info};
use snafu::prelude::*;
use std::collections::HashMap;

use crate::config::*;
use crate::signature::*;
use crate::VoteCount;

/// Weight carried by one ranking pattern, split between regular and test votes.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
struct PatternWeight {
    counted: VoteCount,
    test: VoteCount,
}

impl PatternWeight {
    fn total(&self) -> VoteCount {
        self.counted + self.test
    }
}

/// The largest total weight a poll may carry.
///
/// Every support count and margin derived from the aggregation then fits in an `i64`.
pub const MAX_TOTAL_WEIGHT: u64 = i64::MAX as u64;

/// The multiset of ranking patterns of a poll.
///
/// Aggregating is a fold: adding the same ballots in any order, or merging
/// the aggregations of two halves of a ballot set, gives the same result.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Aggregation {
    include_test: bool,
    patterns: HashMap<RankingSignature, PatternWeight>,
    num_records: usize,
    total: VoteCount,
}

impl Aggregation {
    pub fn new(include_test: bool) -> Aggregation {
        Aggregation {
            include_test,
            patterns: HashMap::new(),
            num_records: 0,
            total: VoteCount::EMPTY,
        }
    }

    pub fn include_test(&self) -> bool {
        self.include_test
    }

    /// Adds one ballot record. Test records are dropped unless this
    /// aggregation was created to include them.
    ///
    /// Fails when the total weight would go over [MAX_TOTAL_WEIGHT]. The
    /// aggregation is left unchanged in that case.
    pub fn add(
        &mut self,
        signature: RankingSignature,
        weight: u64,
        is_test: bool,
    ) -> TabulationResult<()> {
        if is_test && !self.include_test {
            return Ok(());
        }
        self.total = checked_total(self.total, VoteCount(weight))?;
        self.num_records += 1;
        let e = self.patterns.entry(signature).or_default();
        if is_test {
            e.test += VoteCount(weight);
        } else {
            e.counted += VoteCount(weight);
        }
        Ok(())
    }

    /// Combines two aggregations by summing the weights of each pattern.
    pub fn merge(mut self, other: Aggregation) -> TabulationResult<Aggregation> {
        debug_assert_eq!(
            self.include_test, other.include_test,
            "merging aggregations with different test ballot policies"
        );
        self.total = checked_total(self.total, other.total)?;
        self.num_records += other.num_records;
        for (sig, w) in other.patterns {
            let e = self.patterns.entry(sig).or_default();
            e.counted += w.counted;
            e.test += w.test;
        }
        Ok(self)
    }

    /// Total weight of all the counted ballots, test ballots included when requested.
    pub fn total_weight(&self) -> u64 {
        self.total.0
    }

    /// The part of the total weight that comes from test ballots.
    pub fn test_weight(&self) -> u64 {
        self.patterns.values().map(|w| w.test).sum::<VoteCount>().0
    }

    pub fn weight_of(&self, signature: &RankingSignature) -> u64 {
        self.patterns
            .get(signature)
            .map(|w| w.total().0)
            .unwrap_or(0)
    }

    /// Number of ballot records that went into this aggregation.
    pub fn num_records(&self) -> usize {
        self.num_records
    }

    /// The distinct patterns with their total weight, in signature order.
    pub fn patterns(&self) -> Vec<(&RankingSignature, u64)> {
        let mut res: Vec<(&RankingSignature, u64)> = self
            .patterns
            .iter()
            .map(|(sig, w)| (sig, w.total().0))
            .collect();
        res.sort_by(|a, b| a.0.cmp(b.0));
        res
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn checked_total(total: VoteCount, weight: VoteCount) -> TabulationResult<VoteCount> {
    total
        .checked_add(weight)
        .filter(|t| t.0 <= MAX_TOTAL_WEIGHT)
        .context(WeightOverflowSnafu {
            limit: MAX_TOTAL_WEIGHT,
        })
}

/// Validates and aggregates a stream of ballot records.
///
/// Test records are filtered out before validation when they are not counted.
/// The first invalid ballot aborts the whole aggregation.
pub fn aggregate_ballots(
    table: &OptionTable,
    ballots: &[BallotRecord],
    include_test: bool,
) -> TabulationResult<Aggregation> {
    let mut agg = Aggregation::new(include_test);
    for (idx, ballot) in ballots.iter().enumerate() {
        if ballot.is_test() && !include_test {
            continue;
        }
        let sig = normalize_ballot(table, ballot, idx)?;
        agg.add(sig, ballot.count, ballot.is_test())?;
    }
    info!(
        "aggregate_ballots: {} records -> {} patterns, total weight {} (test weight {})",
        agg.num_records(),
        agg.len(),
        agg.total_weight(),
        agg.test_weight()
    );
    for (sig, w) in agg.patterns() {
        debug!("aggregate_ballots: pattern {:?}: {}", sig.tiers(), w);
    }
    Ok(agg)
}
