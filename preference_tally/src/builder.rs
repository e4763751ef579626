pub use crate::config::*;

use crate::results::DetailedResults;
use crate::signature::{normalize_ballot, OptionTable};

/// A builder for adding ballots by option name.
///
/// Each option gets its name as identifier.
///
/// ```
/// pub use preference_tally::builder::Builder;
/// pub use preference_tally::TabulationRules;
/// # use preference_tally::TabulationError;
///
/// let mut builder = Builder::new(&TabulationRules::DEFAULT_RULES)
///     .options(&["Anna".to_string(), "Bob".to_string(), "Clara".to_string()])?;
///
/// builder.add_ballot_simple(&["Anna".to_string(), "Clara".to_string()])?;
/// // Bob and Clara tied in first place
/// builder.add_ballot(&[vec!["Bob".to_string(), "Clara".to_string()]], 2)?;
///
/// let results = builder.tabulate()?;
/// assert_eq!(results.determined_winner.as_deref(), Some("Clara"));
/// # Ok::<(), TabulationError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    _rules: TabulationRules,
    _options: Vec<PollOption>,
    _table: OptionTable,
    _ballots: Vec<BallotRecord>,
}

impl Builder {
    pub fn new(rules: &TabulationRules) -> Builder {
        Builder {
            _rules: rules.clone(),
            _options: Vec::new(),
            _table: OptionTable::empty(),
            _ballots: Vec::new(),
        }
    }

    /// Sets the options of the poll. Previously added ballots are dropped.
    pub fn options(self, names: &[String]) -> TabulationResult<Builder> {
        let options: Vec<PollOption> = names.iter().map(|n| PollOption::new(n, n)).collect();
        let table = OptionTable::new(&options)?;
        Ok(Builder {
            _rules: self._rules,
            _options: options,
            _table: table,
            _ballots: Vec::new(),
        })
    }

    /// Adds a ballot from a single voter, ranking the options in the given order.
    pub fn add_ballot_simple(&mut self, names: &[String]) -> TabulationResult<()> {
        let tiers: Vec<Vec<String>> = names.iter().map(|n| vec![n.clone()]).collect();
        self.add_ballot(&tiers, 1)
    }

    /// Adds a ballot standing for `count` voters.
    ///
    /// tiers: the options from best to worst; the options of a tier are tied.
    pub fn add_ballot(&mut self, tiers: &[Vec<String>], count: u64) -> TabulationResult<()> {
        let rankings: Vec<RankingEntry> = tiers
            .iter()
            .enumerate()
            .flat_map(|(idx, tier)| tier.iter().map(move |n| RankingEntry::new(n, idx as i64 + 1)))
            .collect();
        let record = if count == 1 {
            BallotRecord::individual(rankings)
        } else {
            BallotRecord::aggregated(rankings, count)
        };
        self.add_record(record)
    }

    /// Adds a ballot given as explicit ranks. Ranks may have gaps.
    pub fn add_ballot_ranks(&mut self, ranks: &[(String, i64)]) -> TabulationResult<()> {
        let rankings = ranks
            .iter()
            .map(|(n, r)| RankingEntry::new(n, *r))
            .collect();
        self.add_record(BallotRecord::individual(rankings))
    }

    /// Adds a stored record after checking it against the options.
    pub fn add_record(&mut self, record: BallotRecord) -> TabulationResult<()> {
        normalize_ballot(&self._table, &record, self._ballots.len())?;
        self._ballots.push(record);
        Ok(())
    }

    pub fn num_ballots(&self) -> usize {
        self._ballots.len()
    }

    pub fn tabulate(&self) -> TabulationResult<DetailedResults> {
        crate::tabulate_with_rules(&self._options, &self._ballots, &self._rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_and_tabulates() {
        let mut b = Builder::new(&TabulationRules::DEFAULT_RULES)
            .options(&names(&["A", "B", "C"]))
            .unwrap();
        b.add_ballot_simple(&names(&["A", "B"])).unwrap();
        b.add_ballot(&[names(&["B"]), names(&["A", "C"])], 3).unwrap();
        b.add_ballot_ranks(&[("C".to_string(), 4), ("A".to_string(), 9)])
            .unwrap();
        assert_eq!(b.num_ballots(), 3);
        let r = b.tabulate().unwrap();
        assert_eq!(r.total_voters, 5);
        assert_eq!(r.total_ballots, 3);
        assert_eq!(r.determined_winner.as_deref(), Some("B"));
    }

    #[test]
    fn rejects_unknown_names_early() {
        let mut b = Builder::new(&TabulationRules::DEFAULT_RULES)
            .options(&names(&["A", "B"]))
            .unwrap();
        let err = b.add_ballot_simple(&names(&["A", "Zed"])).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(b.num_ballots(), 0);
        assert!(b.add_ballot(&[names(&["A"])], 0).is_err());
    }

    #[test]
    fn test_records_follow_the_rules() {
        let rules = TabulationRules {
            include_test: true,
            ..TabulationRules::DEFAULT_RULES
        };
        let mut b = Builder::new(&rules).options(&names(&["A", "B"])).unwrap();
        b.add_record(BallotRecord::test(vec![RankingEntry::new("B", 1)]))
            .unwrap();
        let r = b.tabulate().unwrap();
        assert_eq!(r.total_test_votes, 1);
        assert_eq!(r.determined_winner.as_deref(), Some("B"));
    }

    #[test]
    fn duplicate_names() {
        let res = Builder::new(&TabulationRules::DEFAULT_RULES).options(&names(&["A", "A"]));
        assert!(res.is_err());
    }
}
