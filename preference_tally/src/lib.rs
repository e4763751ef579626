/*!
Tabulation of ranked-choice polls where voters may tie options and leave
options unranked.

Ballots are reduced to ranking patterns and aggregated, then compared pair
by pair. The winner is the Condorcet winner when there is one; otherwise
a cascade of weak Condorcet, Copeland and Minimax rules picks a winner or
declares a tie.

```
use preference_tally::*;

let options = vec![
    PollOption::new("a", "Alice"),
    PollOption::new("b", "Bob"),
    PollOption::new("c", "Charlie"),
];
let ballots = vec![
    BallotRecord::aggregated(vec![RankingEntry::new("a", 1), RankingEntry::new("b", 2)], 6),
    BallotRecord::aggregated(vec![RankingEntry::new("b", 1), RankingEntry::new("a", 2)], 4),
    BallotRecord::individual(vec![RankingEntry::new("c", 1)]),
];
let results = tabulate(&options, &ballots, false)?;
assert_eq!(results.determined_winner.as_deref(), Some("Alice"));
assert_eq!(results.winner_type.tag(), "condorcet");
assert_eq!(results.total_voters, 11);
# Ok::<(), TabulationError>(())
```

See the [manual] for the details of each rule.
*/

mod aggregate;
pub mod builder;
mod config;
pub mod manual;
pub mod methods;
mod profile;
mod report;
mod resolve;
mod results;
mod signature;
mod stats;
mod store;

use log::info;
use std::ops::{Add, AddAssign};

pub use crate::aggregate::{aggregate_ballots, Aggregation, MAX_TOTAL_WEIGHT};
pub use crate::config::*;
pub use crate::profile::PreferenceProfile;
pub use crate::resolve::{resolve_winner, Resolution, Stage, WinnerType};
pub use crate::results::*;
pub use crate::signature::{normalize, normalize_ballot, CandidateId, OptionTable, RankingSignature};
pub use crate::stats::*;
pub use crate::store::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash, Default)]
pub(crate) struct VoteCount(pub(crate) u64);

impl VoteCount {
    pub(crate) const EMPTY: VoteCount = VoteCount(0);

    pub(crate) fn checked_add(self, rhs: VoteCount) -> Option<VoteCount> {
        self.0.checked_add(rhs.0).map(VoteCount)
    }
}

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.map(|vc| vc.0).sum())
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

impl Add for VoteCount {
    type Output = VoteCount;
    fn add(self: VoteCount, rhs: VoteCount) -> VoteCount {
        VoteCount(self.0 + rhs.0)
    }
}

/// Tabulates a poll with the default rules.
///
/// Arguments:
/// * `options` the options of the poll, in display order
/// * `ballots` all the stored ballot records of the poll
/// * `include_test` also count the test ballots
///
/// Fails on the first invalid ballot. No partial result is returned.
pub fn tabulate(
    options: &[PollOption],
    ballots: &[BallotRecord],
    include_test: bool,
) -> TabulationResult<DetailedResults> {
    let rules = TabulationRules {
        include_test,
        ..TabulationRules::DEFAULT_RULES
    };
    tabulate_with_rules(options, ballots, &rules)
}

/// Tabulates a poll with the given rules.
pub fn tabulate_with_rules(
    options: &[PollOption],
    ballots: &[BallotRecord],
    rules: &TabulationRules,
) -> TabulationResult<DetailedResults> {
    info!(
        "Processing {} ballot records for {} options, rules: {:?}",
        ballots.len(),
        options.len(),
        rules
    );
    let table = OptionTable::new(options)?;
    let agg = aggregate_ballots(&table, ballots, rules.include_test)?;
    let profile = PreferenceProfile::new(&table, &agg, rules.candidate_scope);
    report::assemble_results(&profile, agg.num_records())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn options() -> Vec<PollOption> {
        vec![
            PollOption::new("o1", "A"),
            PollOption::new("o2", "B"),
            PollOption::new("o3", "C"),
        ]
    }

    fn ranks(entries: &[(&str, i64)]) -> Vec<RankingEntry> {
        entries
            .iter()
            .map(|(id, r)| RankingEntry::new(id, *r))
            .collect()
    }

    #[test]
    fn test_ballots_are_excluded_by_default() {
        init();
        let ballots = vec![
            BallotRecord::aggregated(ranks(&[("o1", 1), ("o2", 2)]), 3),
            BallotRecord::aggregated(ranks(&[("o2", 1), ("o1", 2)]), 2),
            BallotRecord::test(ranks(&[("o2", 1), ("o1", 2)])),
            BallotRecord::test(ranks(&[("o2", 1), ("o1", 2)])),
        ];
        let r = tabulate(&options(), &ballots, false).unwrap();
        assert_eq!(r.total_voters, 5);
        assert_eq!(r.total_test_votes, 0);
        assert_eq!(r.total_ballots, 2);
        assert_eq!(r.determined_winner.as_deref(), Some("A"));

        let r = tabulate(&options(), &ballots, true).unwrap();
        assert_eq!(r.total_voters, 7);
        assert_eq!(r.total_test_votes, 2);
        assert_eq!(r.total_ballots, 4);
        // 3 against 4
        assert_eq!(r.determined_winner.as_deref(), Some("B"));
    }

    #[test]
    fn aggregated_record_counts_as_many_voters() {
        init();
        let one = vec![BallotRecord::aggregated(ranks(&[("o1", 1), ("o2", 2)]), 5)];
        let many: Vec<BallotRecord> = (0..5)
            .map(|_| BallotRecord::individual(ranks(&[("o1", 1), ("o2", 2)])))
            .collect();
        let r1 = tabulate(&options(), &one, false).unwrap();
        let r2 = tabulate(&options(), &many, false).unwrap();
        assert_eq!(r1.pairwise_matrix, r2.pairwise_matrix);
        assert_eq!(r1.ballot_types, r2.ballot_types);
        assert_eq!(r1.total_voters, r2.total_voters);
        assert_eq!(r1.winner_type, r2.winner_type);
        assert_eq!(r1.total_ballots, 1);
        assert_eq!(r2.total_ballots, 5);
    }

    #[test]
    fn invalid_ballot_aborts() {
        init();
        let ballots = vec![
            BallotRecord::individual(ranks(&[("o1", 1)])),
            BallotRecord::individual(ranks(&[("o9", 1)])).with_id("b-2"),
        ];
        let err = tabulate(&options(), &ballots, false).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "ballot b-2: option \"o9\" is not part of the poll"
        );
    }

    #[test]
    fn no_ballots_no_winner() {
        init();
        let r = tabulate(&options(), &[], false).unwrap();
        assert_eq!(r.winner_type, WinnerType::None);
        assert_eq!(r.num_candidates, 0);
        assert!(r.candidates.is_empty());

        let rules = TabulationRules {
            candidate_scope: CandidateScope::AllOptions,
            ..TabulationRules::DEFAULT_RULES
        };
        let r = tabulate_with_rules(&options(), &[], &rules).unwrap();
        assert_eq!(r.winner_type, WinnerType::None);
        assert_eq!(r.candidates, vec!["A", "B", "C"]);
        assert_eq!(r.pairwise_matrix.len(), 3);
    }

    #[test]
    fn no_options() {
        init();
        let r = tabulate(&[], &[], false).unwrap();
        assert_eq!(r.winner_type.tag(), "none");
        assert!(r.pairwise_comparisons.is_empty());
    }

    #[test]
    fn huge_counts_are_rejected() {
        init();
        let one = vec![BallotRecord::aggregated(ranks(&[("o1", 1), ("o2", 2)]), 1 << 63)];
        let err = tabulate(&options(), &one, false).unwrap_err();
        assert!(matches!(err, TabulationError::WeightOverflow { .. }));
        assert!(!err.is_validation());

        let two = vec![
            BallotRecord::aggregated(ranks(&[("o1", 1), ("o2", 2)]), u64::MAX / 2 + 1),
            BallotRecord::aggregated(ranks(&[("o2", 1)]), u64::MAX / 2 + 1),
        ];
        let err = tabulate(&options(), &two, false).unwrap_err();
        assert!(matches!(err, TabulationError::WeightOverflow { .. }));
    }

    #[test]
    fn largest_total_weight_is_tabulated() {
        init();
        let ballots = vec![BallotRecord::aggregated(
            ranks(&[("o1", 1), ("o2", 2)]),
            MAX_TOTAL_WEIGHT,
        )];
        let r = tabulate(&options(), &ballots, false).unwrap();
        assert_eq!(r.total_voters, MAX_TOTAL_WEIGHT);
        assert_eq!(r.pairwise_comparisons[0].margin, i64::MAX);
        assert_eq!(r.determined_winner.as_deref(), Some("A"));
    }

    #[test]
    fn duplicate_option_ids() {
        let opts = vec![PollOption::new("x", "A"), PollOption::new("x", "B")];
        let err = tabulate(&opts, &[], false).unwrap_err();
        assert!(matches!(err, TabulationError::InvalidPoll { .. }));
        assert!(!err.is_validation());
    }
}
