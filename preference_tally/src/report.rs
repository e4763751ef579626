use log::{debug, info};
use snafu::prelude::*;

use crate::config::*;
use crate::methods::*;
use crate::profile::PreferenceProfile;
use crate::resolve::resolve_winner;
use crate::results::*;
use crate::signature::{CandidateId, RankingSignature};

fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64) * 100.0
    }
}

fn ballot_type(profile: &PreferenceProfile, sig: &RankingSignature, count: u64) -> BallotType {
    BallotType {
        ranking: sig.tiers().iter().map(|tier| profile.names(tier)).collect(),
        count,
        percentage: percentage(count, profile.total_weight()),
    }
}

fn ballot_types(profile: &PreferenceProfile) -> Vec<BallotType> {
    let mut res: Vec<BallotType> = profile
        .patterns()
        .map(|(sig, count)| ballot_type(profile, sig, count))
        .collect();
    // Patterns come in signature order; the sort is stable.
    res.sort_by(|a, b| b.count.cmp(&a.count));
    res
}

fn pairwise_matrices(
    profile: &PreferenceProfile,
) -> (
    Vec<(String, Vec<(String, i64)>)>,
    Vec<(String, Vec<(String, PairSupport)>)>,
) {
    let mut margins = Vec::new();
    let mut supports = Vec::new();
    for a in profile.candidates() {
        let mut margin_row = Vec::new();
        let mut support_row = Vec::new();
        for b in profile.candidates() {
            let ps = if a == b {
                PairSupport::default()
            } else {
                PairSupport {
                    support: profile.support(*a, *b),
                    opposed: profile.support(*b, *a),
                    margin: profile.margin(*a, *b),
                }
            };
            margin_row.push((profile.name(*b).to_string(), ps.margin));
            support_row.push((profile.name(*b).to_string(), ps));
        }
        margins.push((profile.name(*a).to_string(), margin_row));
        supports.push((profile.name(*a).to_string(), support_row));
    }
    (margins, supports)
}

fn pairwise_comparisons(profile: &PreferenceProfile) -> Vec<PairwiseComparison> {
    let cands = profile.candidates();
    let mut res = Vec::new();
    for (i, a) in cands.iter().enumerate() {
        for b in cands[i + 1..].iter() {
            res.push(PairwiseComparison {
                candidate_a: profile.name(*a).to_string(),
                candidate_b: profile.name(*b).to_string(),
                a_beats_b: profile.support(*a, *b),
                b_beats_a: profile.support(*b, *a),
                ties: profile.tie_weight(*a, *b),
                margin: profile.margin(*a, *b),
            });
        }
    }
    res
}

fn candidate_records(profile: &PreferenceProfile) -> Vec<CandidateRecord> {
    let copeland = copeland_scores(profile);
    let minimax = minimax_scores(profile);
    let mut records: Vec<CandidateRecord> = profile
        .candidates()
        .iter()
        .zip(copeland.iter().zip(minimax.iter()))
        .map(|(c, ((_, copeland_score), (_, minimax_score)))| {
            let opponents: Vec<OpponentResult> = profile
                .candidates()
                .iter()
                .filter(|x| *x != c)
                .map(|x| {
                    let margin = profile.margin(*c, *x);
                    let result = match margin {
                        m if m > 0 => PairwiseOutcome::Win,
                        m if m < 0 => PairwiseOutcome::Loss,
                        _ => PairwiseOutcome::Tie,
                    };
                    OpponentResult {
                        opponent: profile.name(*x).to_string(),
                        result,
                        margin,
                    }
                })
                .collect();
            let count = |o: PairwiseOutcome| opponents.iter().filter(|r| r.result == o).count() as u32;
            let worst_loss_margin = opponents
                .iter()
                .filter(|r| r.margin < 0)
                .map(|r| r.margin.unsigned_abs())
                .max()
                .unwrap_or(0);
            CandidateRecord {
                candidate: profile.name(*c).to_string(),
                wins: count(PairwiseOutcome::Win),
                losses: count(PairwiseOutcome::Loss),
                ties: count(PairwiseOutcome::Tie),
                copeland_score: *copeland_score,
                minimax_score: *minimax_score,
                opponents,
                worst_loss_margin,
            }
        })
        .collect();
    records.sort_by(|a, b| b.copeland_score.cmp(&a.copeland_score));
    records
}

fn method_result(
    profile: &PreferenceProfile,
    method: VotingMethod,
    winners: &[CandidateId],
    scores: Option<Vec<(CandidateId, i64)>>,
) -> VotingMethodResult {
    VotingMethodResult {
        method,
        winners: profile.names(winners),
        is_tie: winners.len() > 1,
        scores: scores.map(|s| {
            s.into_iter()
                .map(|(c, score)| (profile.name(c).to_string(), score))
                .collect()
        }),
    }
}

fn voting_results(profile: &PreferenceProfile) -> Vec<VotingMethodResult> {
    let condorcet: Vec<CandidateId> = condorcet_winner(profile).into_iter().collect();
    vec![
        method_result(profile, VotingMethod::Condorcet, &condorcet, None),
        method_result(
            profile,
            VotingMethod::Copeland,
            &copeland_winners(profile),
            Some(copeland_scores(profile)),
        ),
        method_result(
            profile,
            VotingMethod::Minimax,
            &minimax_winners(profile),
            Some(minimax_scores(profile)),
        ),
        method_result(
            profile,
            VotingMethod::CopelandGlobalMinimax,
            &copeland_global_minimax(profile),
            None,
        ),
    ]
}

/// For every ordered pair, the ballot types that prefer the first candidate.
///
/// The weight of these ballot types must add up to the pairwise support:
/// any difference is reported as an error.
fn head_to_head(profile: &PreferenceProfile) -> TabulationResult<Vec<HeadToHead>> {
    let mut res = Vec::new();
    for a in profile.candidates() {
        for b in profile.candidates() {
            if a == b {
                continue;
            }
            let ballot_types: Vec<BallotType> = profile
                .patterns()
                .filter(|(sig, _)| sig.prefers(*a, *b))
                .map(|(sig, count)| ballot_type(profile, sig, count))
                .collect();
            let total_count: u64 = ballot_types.iter().map(|bt| bt.count).sum();
            ensure!(
                total_count == profile.support(*a, *b),
                ComputationSnafu {
                    message: format!(
                        "head-to-head count {} for {} over {} does not match support {}",
                        total_count,
                        profile.name(*a),
                        profile.name(*b),
                        profile.support(*a, *b)
                    )
                }
            );
            if !ballot_types.is_empty() {
                res.push(HeadToHead {
                    candidate_a: profile.name(*a).to_string(),
                    candidate_b: profile.name(*b).to_string(),
                    ballot_types,
                    total_count,
                });
            }
        }
    }
    Ok(res)
}

fn check_margins(profile: &PreferenceProfile) -> TabulationResult<()> {
    for a in profile.candidates() {
        for b in profile.candidates() {
            ensure!(
                profile.margin(*a, *b) == -profile.margin(*b, *a),
                ComputationSnafu {
                    message: format!(
                        "margins of {} and {} are not antisymmetric",
                        profile.name(*a),
                        profile.name(*b)
                    )
                }
            );
        }
    }
    Ok(())
}

/// Assembles the complete results of a tabulation.
pub(crate) fn assemble_results(
    profile: &PreferenceProfile,
    num_records: usize,
) -> TabulationResult<DetailedResults> {
    check_margins(profile)?;

    let resolution = resolve_winner(profile);
    let (pairwise_matrix, pairwise_support_matrix) = pairwise_matrices(profile);
    let head_to_head = head_to_head(profile)?;
    debug!(
        "assemble_results: {} head-to-head entries",
        head_to_head.len()
    );

    let res = DetailedResults {
        poll_id: None,
        total_voters: profile.total_weight(),
        total_test_votes: profile.test_weight(),
        total_ballots: num_records,
        num_candidates: profile.num_candidates(),
        candidates: profile.names(profile.candidates()),
        ballot_types: ballot_types(profile),
        num_bullet_votes: profile.num_bullet_votes(),
        num_complete_rankings: profile.num_complete_rankings(),
        num_linear_orders: profile.num_linear_orders(),
        pairwise_matrix,
        pairwise_support_matrix,
        pairwise_comparisons: pairwise_comparisons(profile),
        condorcet_winner: condorcet_winner(profile).map(|c| profile.name(c).to_string()),
        weak_condorcet_winners: profile.names(&weak_condorcet_winners(profile)),
        winner_type: resolution.winner_type,
        determined_winner: resolution.winner.map(|c| profile.name(c).to_string()),
        tied_winners: profile.names(&resolution.tied),
        is_tie: resolution.is_tie(),
        candidate_records: candidate_records(profile),
        voting_results: voting_results(profile),
        head_to_head,
    };
    info!(
        "assemble_results: {} voters, {} candidates, outcome {} {:?}",
        res.total_voters, res.num_candidates, res.winner_type, res.determined_winner
    );
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::tests::*;
    use crate::resolve::{Stage, WinnerType};
    use proptest::prelude::*;

    fn results(names: &[&str], votes: &[(&str, u64)]) -> DetailedResults {
        let p = profile(names, votes);
        assemble_results(&p, votes.len()).unwrap()
    }

    fn row<T: Copy>(m: &[(String, Vec<(String, T)>)], a: &str, b: &str) -> T {
        let (_, r) = m.iter().find(|(n, _)| n == a).unwrap();
        r.iter().find(|(n, _)| n == b).unwrap().1
    }

    #[test]
    fn clear_condorcet_winner() {
        let r = results(&["A", "B", "C"], &[("A>B>C", 6), ("B>A>C", 4)]);
        assert_eq!(r.total_voters, 10);
        assert_eq!(r.total_ballots, 2);
        assert_eq!(r.candidates, vec!["A", "B", "C"]);
        assert_eq!(r.condorcet_winner.as_deref(), Some("A"));
        assert_eq!(r.weak_condorcet_winners, vec!["A"]);
        assert_eq!(r.winner_type, WinnerType::Decided(Stage::Condorcet));
        assert_eq!(r.determined_winner.as_deref(), Some("A"));
        assert!(!r.is_tie);
        assert!(r.tied_winners.is_empty());

        assert_eq!(row(&r.pairwise_matrix, "A", "B"), 2);
        assert_eq!(row(&r.pairwise_matrix, "B", "A"), -2);
        assert_eq!(row(&r.pairwise_matrix, "A", "A"), 0);
        let ps = row(&r.pairwise_support_matrix, "A", "C");
        assert_eq!(
            ps,
            PairSupport {
                support: 10,
                opposed: 0,
                margin: 10
            }
        );

        assert_eq!(r.ballot_types.len(), 2);
        assert_eq!(r.ballot_types[0].ranking_string(), "A > B > C");
        assert_eq!(r.ballot_types[0].count, 6);
        assert!((r.ballot_types[0].percentage - 60.0).abs() < 1e-9);

        assert_eq!(r.pairwise_comparisons.len(), 3);
        assert_eq!(r.pairwise_comparisons[0].winner(), Some("A"));

        let names: Vec<&str> = r.candidate_records.iter().map(|c| c.candidate.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        let a = &r.candidate_records[0];
        assert_eq!((a.wins, a.losses, a.ties), (2, 0, 0));
        assert_eq!(a.worst_loss_margin, 0);
        assert_eq!(r.candidate_records[2].worst_loss_margin, 10);
        assert_eq!(r.candidate_records[2].net_wins(), -2);

        let methods: Vec<&str> = r.voting_results.iter().map(|m| m.method.as_str()).collect();
        assert_eq!(
            methods,
            vec!["condorcet", "copeland", "minimax", "copeland_global_minimax"]
        );
        assert!(r.voting_results[0].scores.is_none());
        assert_eq!(
            r.method(VotingMethod::Copeland).unwrap().scores,
            Some(vec![
                ("A".to_string(), 2),
                ("B".to_string(), 0),
                ("C".to_string(), -2)
            ])
        );
    }

    #[test]
    fn head_to_head_reconciles_with_support() {
        let r = results(
            &["A", "B", "C"],
            &[("A>B>C", 3), ("B>A", 2), ("C", 1), ("A~B>C", 1)],
        );
        for h in r.head_to_head.iter() {
            let ps = row(&r.pairwise_support_matrix, &h.candidate_a, &h.candidate_b);
            assert_eq!(h.total_count, ps.support);
            assert!(!h.ballot_types.is_empty());
        }
        let ab = r
            .head_to_head
            .iter()
            .find(|h| h.candidate_a == "A" && h.candidate_b == "B")
            .unwrap();
        assert_eq!(ab.total_count, 3);
        assert_eq!(ab.ballot_types.len(), 1);
        // The bullet vote for C beats both A and B.
        let ca = r
            .head_to_head
            .iter()
            .find(|h| h.candidate_a == "C" && h.candidate_b == "A")
            .unwrap();
        assert_eq!(ca.total_count, 1);
        assert_eq!(ca.ballot_types[0].ranking, vec![vec!["C".to_string()]]);
    }

    #[test]
    fn tied_ballot_types_keep_signature_order() {
        let r = results(&["A", "B", "C"], &[("C>A", 2), ("A>B", 2), ("B", 5)]);
        let order: Vec<String> = r.ballot_types.iter().map(|b| b.ranking_string()).collect();
        assert_eq!(order, vec!["B", "A > B", "C > A"]);
        assert_eq!(r.num_bullet_votes, 5);
        assert_eq!(r.summary().most_common_ranking.unwrap().count, 5);
    }

    #[test]
    fn symmetric_tie() {
        let r = results(
            &["A", "B", "C", "D"],
            &[
                ("A>B>C>D", 2),
                ("B>C>D>A", 2),
                ("C>D>A>B", 2),
                ("D>A>B>C", 2),
            ],
        );
        assert_eq!(r.winner_type.tag(), "tie_minimax");
        assert!(r.is_tie);
        assert_eq!(r.determined_winner, None);
        assert_eq!(r.tied_winners, vec!["A", "B", "C", "D"]);
        let s = r.summary();
        assert!(s.is_tie);
        assert_eq!(s.copeland_winners.len(), 4);
        assert_eq!(s.minimax_winners.len(), 4);
        assert!(r.method(VotingMethod::Minimax).unwrap().is_tie);
    }

    #[test]
    fn zero_ballots() {
        let p = profile_with(&["A", "B", "C"], &[], CandidateScope::AllOptions);
        let r = assemble_results(&p, 0).unwrap();
        assert_eq!(r.total_voters, 0);
        assert_eq!(r.num_candidates, 3);
        assert_eq!(r.winner_type, WinnerType::None);
        assert_eq!(r.determined_winner, None);
        assert!(r.ballot_types.is_empty());
        assert!(r.head_to_head.is_empty());
        assert_eq!(r.pairwise_matrix.len(), 3);
        assert_eq!(row(&r.pairwise_matrix, "A", "C"), 0);
        assert_eq!(r.pairwise_comparisons.len(), 3);
        assert_eq!(r.pairwise_comparisons[0].ties, 0);
        for m in r.voting_results.iter() {
            assert!(m.winners.is_empty());
            assert!(!m.is_tie);
        }
        let s = r.summary();
        assert_eq!(s.most_common_ranking, None);
        assert_eq!(s.winner_type.tag(), "none");
    }

    #[test]
    fn minimax_decides() {
        let r = results(
            &["A", "B", "C"],
            &[("A>B>C", 4), ("B>C>A", 3), ("C>A>B", 2)],
        );
        assert_eq!(r.winner_type.tag(), "minimax");
        assert_eq!(r.determined_winner.as_deref(), Some("A"));
        assert_eq!(r.condorcet_winner, None);
        assert!(r.weak_condorcet_winners.is_empty());
        let a = r.candidate_records.iter().find(|c| c.candidate == "A").unwrap();
        assert_eq!(a.minimax_score, -1);
        assert_eq!(a.worst_loss_margin, 1);
        assert_eq!(a.opponents[1].result, PairwiseOutcome::Loss);
        assert_eq!(a.opponents[1].result.as_str(), "loss");
    }

    // Ballots written as "B>A~D", over the options A to D.
    fn arb_votes() -> impl Strategy<Value = Vec<(String, u64)>> {
        let ballot = (
            proptest::sample::subsequence(vec!["A", "B", "C", "D"], 1..=4).prop_shuffle(),
            proptest::collection::vec(proptest::bool::ANY, 4),
            1u64..6,
        )
            .prop_map(|(names, ties, count)| {
                let mut s = names[0].to_string();
                for (name, tied) in names[1..].iter().zip(ties) {
                    s.push(if tied { '~' } else { '>' });
                    s.push_str(name);
                }
                (s, count)
            });
        proptest::collection::vec(ballot, 0..12)
    }

    proptest! {
        #[test]
        fn head_to_head_adds_up_to_support(votes in arb_votes()) {
            let votes: Vec<(&str, u64)> = votes.iter().map(|(s, c)| (s.as_str(), *c)).collect();
            let p = profile(&["A", "B", "C", "D"], &votes);
            let r = assemble_results(&p, votes.len()).unwrap();
            for a in p.candidates() {
                for b in p.candidates() {
                    if a == b {
                        continue;
                    }
                    let support = p.support(*a, *b);
                    let entry = r
                        .head_to_head
                        .iter()
                        .find(|h| h.candidate_a == p.name(*a) && h.candidate_b == p.name(*b));
                    match entry {
                        Some(h) => {
                            prop_assert!(support > 0);
                            prop_assert_eq!(h.total_count, support);
                            prop_assert_eq!(h.ballot_types.iter().map(|bt| bt.count).sum::<u64>(), support);
                        }
                        None => prop_assert_eq!(support, 0),
                    }
                }
            }
        }

        #[test]
        fn condorcet_winner_is_picked_first(votes in arb_votes()) {
            let votes: Vec<(&str, u64)> = votes.iter().map(|(s, c)| (s.as_str(), *c)).collect();
            let p = profile(&["A", "B", "C", "D"], &votes);
            if let Some(w) = condorcet_winner(&p) {
                let res = resolve_winner(&p);
                prop_assert_eq!(res.winner_type, WinnerType::Decided(Stage::Condorcet));
                prop_assert_eq!(res.winner, Some(w));
                let r = assemble_results(&p, votes.len()).unwrap();
                prop_assert_eq!(r.determined_winner.as_deref(), Some(p.name(w)));
            }
        }
    }
}
