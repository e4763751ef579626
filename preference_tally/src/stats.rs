//! Statistics on the raw ballot records, outside of the pairwise tabulation.

use log::{info, warn};
use std::collections::BTreeMap;

use crate::aggregate::aggregate_ballots;
use crate::config::*;
use crate::signature::{normalize, CandidateId, OptionTable};

/// Counts over the ballot records of a poll.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct BallotSummary {
    /// Sum of the record counts.
    pub total_votes: u64,
    pub total_ballot_records: usize,
    pub avg_votes_per_record: f64,
    pub max_count: u64,
    /// Records standing for a single vote.
    pub individual_ballots: usize,
    /// Records standing for several votes.
    pub aggregated_ballots: usize,
}

/// Summarizes the records without validating them.
pub fn ballot_summary(ballots: &[BallotRecord], include_test: bool) -> BallotSummary {
    let counted: Vec<&BallotRecord> = ballots
        .iter()
        .filter(|b| include_test || !b.is_test())
        .collect();
    if counted.is_empty() {
        return BallotSummary::default();
    }
    // The records are not validated: the sum saturates instead of overflowing.
    let total_votes: u64 = counted
        .iter()
        .fold(0u64, |acc, b| acc.saturating_add(b.count));
    BallotSummary {
        total_votes,
        total_ballot_records: counted.len(),
        avg_votes_per_record: total_votes as f64 / counted.len() as f64,
        max_count: counted.iter().map(|b| b.count).max().unwrap_or(0),
        individual_ballots: counted.iter().filter(|b| b.count == 1).count(),
        aggregated_ballots: counted.iter().filter(|b| b.count > 1).count(),
    }
}

/// Running counts for a poll, keyed by option id.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LiveResults {
    pub total_votes: u64,
    /// Weight of all the test ballots, counted or not.
    pub total_test_votes: u64,
    /// Weight of the ballots placing each option in their first tier.
    pub first_place_counts: Vec<(String, u64)>,
    /// For each option: position (starting at 1) -> weight. Positions nobody used are absent.
    pub ranking_matrix: Vec<(String, Vec<(usize, u64)>)>,
    /// Weight of the ballots ranking both options and preferring the first one.
    /// Ballots leaving one of them unranked are not counted.
    pub pairwise_matrix: Vec<(String, Vec<(String, u64)>)>,
}

/// Computes the live counts. Invalid ballots fail the call, as for a tabulation.
pub fn live_results(
    options: &[PollOption],
    ballots: &[BallotRecord],
    include_test: bool,
) -> TabulationResult<LiveResults> {
    let table = OptionTable::new(options)?;
    let agg = aggregate_ballots(&table, ballots, include_test)?;
    let n = table.len();

    let mut first_place = vec![0u64; n];
    let mut positions: Vec<BTreeMap<usize, u64>> = vec![BTreeMap::new(); n];
    let mut pairwise = vec![vec![0u64; n]; n];
    for (sig, w) in agg.patterns() {
        for (pos, tier) in sig.tiers().iter().enumerate() {
            for cid in tier.iter() {
                if pos == 0 {
                    first_place[cid.index()] += w;
                }
                *positions[cid.index()].entry(pos + 1).or_insert(0) += w;
            }
        }
        for a in sig.ranked() {
            for b in sig.ranked() {
                if sig.prefers(a, b) {
                    pairwise[a.index()][b.index()] += w;
                }
            }
        }
    }

    let id = |cid: CandidateId| table.option(cid).id.clone();
    let res = LiveResults {
        total_votes: agg.total_weight(),
        total_test_votes: ballots
            .iter()
            .filter(|b| b.is_test())
            .fold(0u64, |acc, b| acc.saturating_add(b.count)),
        first_place_counts: table
            .ids()
            .map(|cid| (id(cid), first_place[cid.index()]))
            .collect(),
        ranking_matrix: table
            .ids()
            .zip(positions)
            .map(|(cid, m)| (id(cid), m.into_iter().collect()))
            .collect(),
        pairwise_matrix: table
            .ids()
            .map(|a| {
                let row = table
                    .ids()
                    .filter(|b| *b != a)
                    .map(|b| (id(b), pairwise[a.index()][b.index()]))
                    .collect();
                (id(a), row)
            })
            .collect(),
    };
    info!(
        "live_results: {} votes, {} test votes",
        res.total_votes, res.total_test_votes
    );
    Ok(res)
}

/// A ballot rejected during a bulk import.
#[derive(Debug)]
pub struct ImportFailure {
    /// Position of the ballot in the submission, starting at 0.
    pub index: usize,
    pub error: TabulationError,
}

#[derive(Debug)]
pub struct ImportReport {
    /// The valid ballots, ready to be stored.
    pub records: Vec<BallotRecord>,
    pub imported_count: usize,
    pub failed_count: usize,
    pub failures: Vec<ImportFailure>,
    pub message: String,
}

const MAX_REPORTED_FAILURES: usize = 3;

fn import_message(imported: usize, failures: &[ImportFailure]) -> String {
    let mut message = format!("Successfully imported {} ballots", imported);
    if !failures.is_empty() {
        let errors: Vec<String> = failures
            .iter()
            .take(MAX_REPORTED_FAILURES)
            .map(|f| format!("Ballot {}: {}", f.index + 1, f.error))
            .collect();
        message.push_str(&format!(", {} failed: {}", failures.len(), errors.join("; ")));
        if failures.len() > MAX_REPORTED_FAILURES {
            message.push_str(&format!(
                "... and {} more",
                failures.len() - MAX_REPORTED_FAILURES
            ));
        }
    }
    message
}

/// Validates each submitted ballot on its own.
///
/// Invalid ballots are reported and skipped; they never affect the valid ones.
pub fn import_ballots(
    options: &[PollOption],
    submissions: Vec<BallotRecord>,
) -> TabulationResult<ImportReport> {
    let table = OptionTable::new(options)?;
    let mut records = Vec::new();
    let mut failures = Vec::new();
    for (index, ballot) in submissions.into_iter().enumerate() {
        let checked = if ballot.count == 0 {
            Err(TabulationError::ZeroCount {})
        } else {
            normalize(&table, &ballot.rankings)
        };
        match checked {
            Ok(_) => records.push(ballot),
            Err(error) => {
                warn!("import_ballots: ballot {} rejected: {}", index + 1, error);
                failures.push(ImportFailure { index, error });
            }
        }
    }
    let message = import_message(records.len(), &failures);
    info!("import_ballots: {}", message);
    Ok(ImportReport {
        imported_count: records.len(),
        failed_count: failures.len(),
        records,
        failures,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<PollOption> {
        vec![
            PollOption::new("a", "A"),
            PollOption::new("b", "B"),
            PollOption::new("c", "C"),
        ]
    }

    fn rec(entries: &[(&str, i64)], count: u64) -> BallotRecord {
        BallotRecord::aggregated(
            entries
                .iter()
                .map(|(id, r)| RankingEntry::new(id, *r))
                .collect(),
            count,
        )
    }

    #[test]
    fn summary_of_records() {
        let ballots = vec![
            rec(&[("a", 1)], 1),
            rec(&[("b", 1)], 4),
            rec(&[("c", 1)], 1),
            BallotRecord::test(vec![RankingEntry::new("a", 1)]),
        ];
        let s = ballot_summary(&ballots, false);
        assert_eq!(s.total_votes, 6);
        assert_eq!(s.total_ballot_records, 3);
        assert!((s.avg_votes_per_record - 2.0).abs() < 1e-9);
        assert_eq!(s.max_count, 4);
        assert_eq!(s.individual_ballots, 2);
        assert_eq!(s.aggregated_ballots, 1);
        assert_eq!(ballot_summary(&ballots, true).total_ballot_records, 4);
        assert_eq!(ballot_summary(&[], false), BallotSummary::default());
    }

    #[test]
    fn summary_saturates_on_huge_counts() {
        let ballots = vec![rec(&[("a", 1)], u64::MAX), rec(&[("b", 1)], 2)];
        let s = ballot_summary(&ballots, false);
        assert_eq!(s.total_votes, u64::MAX);
        assert_eq!(s.max_count, u64::MAX);
    }

    #[test]
    fn live_counts() {
        let ballots = vec![
            rec(&[("a", 1), ("b", 3)], 2),
            rec(&[("b", 1), ("c", 1)], 1),
            rec(&[("c", 2)], 3),
            BallotRecord::test(vec![RankingEntry::new("a", 1)]),
        ];
        let l = live_results(&options(), &ballots, false).unwrap();
        assert_eq!(l.total_votes, 6);
        assert_eq!(l.total_test_votes, 1);
        assert_eq!(
            l.first_place_counts,
            vec![
                ("a".to_string(), 2),
                ("b".to_string(), 1),
                ("c".to_string(), 4)
            ]
        );
        // Rank 3 of the first ballot is its second position.
        assert_eq!(l.ranking_matrix[1], ("b".to_string(), vec![(1, 1), (2, 2)]));
        // Ballots ranking only c do not count against a.
        assert_eq!(l.pairwise_matrix[0].1, vec![("b".to_string(), 2), ("c".to_string(), 0)]);
        assert_eq!(l.pairwise_matrix[2].1, vec![("a".to_string(), 0), ("b".to_string(), 0)]);

        let with_test = live_results(&options(), &ballots, true).unwrap();
        assert_eq!(with_test.total_votes, 7);
        assert_eq!(with_test.total_test_votes, 1);
        assert_eq!(with_test.first_place_counts[0].1, 3);
    }

    #[test]
    fn live_results_reject_invalid_ballots() {
        let ballots = vec![rec(&[("a", 1), ("a", 2)], 1)];
        assert!(live_results(&options(), &ballots, false).is_err());
    }

    #[test]
    fn import_keeps_the_valid_ballots() {
        let submissions = vec![
            rec(&[("a", 1)], 1),
            rec(&[("x", 1)], 1),
            rec(&[("b", 1), ("c", 2)], 5),
        ];
        let r = import_ballots(&options(), submissions).unwrap();
        assert_eq!(r.imported_count, 2);
        assert_eq!(r.failed_count, 1);
        assert_eq!(r.records.len(), 2);
        assert_eq!(r.failures[0].index, 1);
        assert_eq!(
            r.message,
            "Successfully imported 2 ballots, 1 failed: Ballot 2: option \"x\" is not part of the poll"
        );
    }

    #[test]
    fn import_message_is_capped() {
        let submissions = vec![
            rec(&[], 1),
            rec(&[("a", 0)], 1),
            rec(&[("a", 1)], 0),
            rec(&[("a", 1), ("a", 1)], 1),
            rec(&[("z", 1)], 1),
            rec(&[("c", 1)], 1),
        ];
        let r = import_ballots(&options(), submissions).unwrap();
        assert_eq!(r.imported_count, 1);
        assert_eq!(r.failed_count, 5);
        assert_eq!(
            r.message,
            "Successfully imported 1 ballots, 5 failed: \
             Ballot 1: the ballot does not rank any option; \
             Ballot 2: option \"a\" has non-positive rank 0; \
             Ballot 3: the ballot record has a count of zero... and 2 more"
        );
    }

    #[test]
    fn import_without_failures() {
        let r = import_ballots(&options(), vec![rec(&[("a", 1)], 1)]).unwrap();
        assert_eq!(r.message, "Successfully imported 1 ballots");
        assert!(r.failures.is_empty());
    }
}
