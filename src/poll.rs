use log::{debug, info, warn};

use preference_tally::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::poll::config_reader::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_json;

#[derive(Debug, Snafu)]
pub enum AppError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}: {source}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the results"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Expected a number for a column or row index"))]
    ParsingJsonNumber {},
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("CSV line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("line {lineno}: {value:?} is not a number"))]
    ParsingNumber { lineno: usize, value: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Tabulation failed: {source}"))]
    Tabulation { source: TabulationError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AppResult<T> = Result<T, AppError>;

/// A ballot, as parsed by the readers.
/// The labels are option identifiers or names; they are checked later.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: Option<String>,
    pub count: u64,
    pub is_test: bool,
    pub ranks: Vec<(String, i64)>,
}

const DEFAULT_POLL_ID: &str = "poll";

fn read_ballot_file(path: &str, cfs: &FileSource) -> AppResult<Vec<ParsedBallot>> {
    info!("Attempting to read ballot file {:?}", path);
    match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_ranking(path, cfs),
        "csv_likert" => io_csv::read_csv_likert(path, cfs),
        "json" => io_json::read_json_ballots(path),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

// Matches a label against the identifiers first, then the names.
// Unknown labels are kept: the import reports them.
fn option_id_for(options: &[PollOption], label: &str) -> String {
    options
        .iter()
        .find(|o| o.id == label)
        .or_else(|| options.iter().find(|o| o.name == label))
        .map(|o| o.id.clone())
        .unwrap_or_else(|| label.to_string())
}

fn infer_options(parsed: &[ParsedBallot]) -> Vec<PollOption> {
    let mut res: Vec<PollOption> = Vec::new();
    for (label, _) in parsed.iter().flat_map(|pb| pb.ranks.iter()) {
        if !res.iter().any(|o| o.id == *label) {
            res.push(PollOption::new(label, label));
        }
    }
    res
}

fn to_record(pb: &ParsedBallot, options: &[PollOption]) -> BallotRecord {
    let provenance = if pb.is_test {
        Provenance::Test
    } else if pb.count == 1 {
        Provenance::Individual
    } else {
        Provenance::Aggregated
    };
    BallotRecord {
        id: pb.id.clone(),
        rankings: pb
            .ranks
            .iter()
            .map(|(label, rank)| RankingEntry::new(&option_id_for(options, label), *rank))
            .collect(),
        count: pb.count,
        provenance,
    }
}

// Two decimals are enough for a report, and they read back to the same value.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn ballot_type_to_json(bt: &BallotType) -> JSValue {
    json!({
        "ranking": bt.ranking,
        "count": bt.count,
        "percentage": round2(bt.percentage),
    })
}

fn matrix_to_json<T, F: Fn(&T) -> JSValue>(m: &[(String, Vec<(String, T)>)], f: F) -> JSValue {
    let mut rows: JSMap<String, JSValue> = JSMap::new();
    for (name, row) in m.iter() {
        let mut cols: JSMap<String, JSValue> = JSMap::new();
        for (other, v) in row.iter() {
            cols.insert(other.clone(), f(v));
        }
        rows.insert(name.clone(), JSValue::Object(cols));
    }
    JSValue::Object(rows)
}

fn results_to_json(r: &DetailedResults) -> JSValue {
    let comparisons: Vec<JSValue> = r
        .pairwise_comparisons
        .iter()
        .map(|pc| {
            json!({
                "candidate_a": pc.candidate_a,
                "candidate_b": pc.candidate_b,
                "a_beats_b": pc.a_beats_b,
                "b_beats_a": pc.b_beats_a,
                "ties": pc.ties,
                "margin": pc.margin,
            })
        })
        .collect();
    let records: Vec<JSValue> = r
        .candidate_records
        .iter()
        .map(|cr| {
            let opponents: Vec<JSValue> = cr
                .opponents
                .iter()
                .map(|o| json!({"opponent": o.opponent, "result": o.result.as_str(), "margin": o.margin}))
                .collect();
            json!({
                "candidate": cr.candidate,
                "wins": cr.wins,
                "losses": cr.losses,
                "ties": cr.ties,
                "copeland_score": cr.copeland_score,
                "minimax_score": cr.minimax_score,
                "opponents": opponents,
                "worst_loss_margin": cr.worst_loss_margin,
            })
        })
        .collect();
    let methods: Vec<JSValue> = r
        .voting_results
        .iter()
        .map(|vm| {
            let scores: Option<JSMap<String, JSValue>> = vm
                .scores
                .as_ref()
                .map(|s| s.iter().map(|(n, v)| (n.clone(), json!(v))).collect());
            json!({
                "method": vm.method.as_str(),
                "winners": vm.winners,
                "is_tie": vm.is_tie,
                "scores": scores,
            })
        })
        .collect();
    let head_to_head: Vec<JSValue> = r
        .head_to_head
        .iter()
        .map(|h| {
            json!({
                "candidate_a": h.candidate_a,
                "candidate_b": h.candidate_b,
                "ballot_types": h.ballot_types.iter().map(ballot_type_to_json).collect::<Vec<JSValue>>(),
                "total_count": h.total_count,
            })
        })
        .collect();

    json!({
        "poll_id": r.poll_id,
        "total_voters": r.total_voters,
        "total_test_votes": r.total_test_votes,
        "total_ballots": r.total_ballots,
        "num_candidates": r.num_candidates,
        "candidates": r.candidates,
        "ballot_types": r.ballot_types.iter().map(ballot_type_to_json).collect::<Vec<JSValue>>(),
        "num_bullet_votes": r.num_bullet_votes,
        "num_complete_rankings": r.num_complete_rankings,
        "num_linear_orders": r.num_linear_orders,
        "pairwise_matrix": matrix_to_json(&r.pairwise_matrix, |m| json!(m)),
        "pairwise_support_matrix": matrix_to_json(&r.pairwise_support_matrix, |ps| {
            json!({"support": ps.support, "opposed": ps.opposed, "margin": ps.margin})
        }),
        "pairwise_comparisons": comparisons,
        "condorcet_winner": r.condorcet_winner,
        "weak_condorcet_winners": r.weak_condorcet_winners,
        "winner_type": r.winner_type.tag(),
        "determined_winner": r.determined_winner,
        "tied_winners": r.tied_winners,
        "is_tie": r.is_tie,
        "candidate_records": records,
        "voting_results": methods,
        "head_to_head": head_to_head,
    })
}

fn build_summary_js(
    config: &PollConfig,
    summary: &BallotSummary,
    import: &ImportReport,
    results: &DetailedResults,
) -> JSValue {
    let c = OutputConfig {
        poll_id: results.poll_id.clone(),
        title: config.output_settings.title.clone(),
    };
    json!({
        "config": c,
        "ballot_summary": {
            "total_votes": summary.total_votes,
            "total_ballot_records": summary.total_ballot_records,
            "avg_votes_per_record": round2(summary.avg_votes_per_record),
            "max_count": summary.max_count,
            "individual_ballots": summary.individual_ballots,
            "aggregated_ballots": summary.aggregated_ballots,
        },
        "import": {
            "imported_count": import.imported_count,
            "failed_count": import.failed_count,
            "message": import.message,
        },
        "results": results_to_json(results),
    })
}

/// Reads the poll and its ballots, and tabulates it.
///
/// Returns the JSON report and the output location found in the configuration, if any.
pub fn tabulate_files(args: &Args) -> AppResult<(JSValue, Option<String>)> {
    let (config, root_p): (PollConfig, PathBuf) = match args.config.as_deref() {
        Some(config_path) => {
            let config = read_config(config_path)?;
            info!("config: {:?}", config);
            let root_p = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root_p)
        }
        None => (
            PollConfig {
                output_settings: OutputSettings::default(),
                options: vec![],
                ballot_sources: vec![],
                rules: RulesConfig::default(),
            },
            PathBuf::new(),
        ),
    };

    // The paths of the sources in the configuration are relative to the configuration file.
    let sources: Vec<(String, FileSource)> = match args.input.as_deref() {
        Some(input) => {
            let provider = args.input_type.as_deref().unwrap_or("csv");
            vec![(input.to_string(), FileSource::from_input(provider, input))]
        }
        None => config
            .ballot_sources
            .iter()
            .map(|cfs| {
                let p: PathBuf = root_p.join(&cfs.file_path);
                (p.display().to_string(), cfs.clone())
            })
            .collect(),
    };
    ensure_whatever!(
        !sources.is_empty(),
        "No ballot source: use --input or list ballotSources in the configuration"
    );

    let mut parsed: Vec<ParsedBallot> = Vec::new();
    for (path, cfs) in sources.iter() {
        let mut file_data = read_ballot_file(path, cfs)?;
        parsed.append(&mut file_data);
    }
    debug!("parsed ballots: {:?}", parsed);

    let options: Vec<PollOption> = match &args.options {
        Some(names) => names.iter().map(|n| PollOption::new(n, n)).collect(),
        None if !config.options.is_empty() => config.poll_options(),
        None => infer_options(&parsed),
    };
    info!("options: {:?}", options);

    let rules = TabulationRules {
        include_test: args.include_test || config.rules.include_test.unwrap_or(false),
        candidate_scope: config.rules.candidate_scope()?,
    };

    // Test ballots that are not counted are not checked either.
    let submissions: Vec<BallotRecord> = parsed
        .iter()
        .filter(|pb| rules.include_test || !pb.is_test)
        .map(|pb| to_record(pb, &options))
        .collect();
    let import = import_ballots(&options, submissions).context(TabulationSnafu {})?;
    if import.failed_count > 0 {
        warn!("{}", import.message);
    }

    let poll_id = config
        .output_settings
        .poll_id
        .clone()
        .unwrap_or_else(|| DEFAULT_POLL_ID.to_string());
    let mut store = MemoryPollStore::new();
    store.insert_poll(PollDefinition {
        poll_id: poll_id.clone(),
        title: config.output_settings.title.clone().unwrap_or_default(),
        options,
        is_closed: true,
    });
    store.add_ballots(&poll_id, import.records.clone());

    let summary = ballot_summary(&import.records, rules.include_test);
    let results = tabulate_poll(&store, &poll_id, &rules).context(TabulationSnafu {})?;
    info!(
        "Outcome: {} {:?} {:?}",
        results.winner_type, results.determined_winner, results.tied_winners
    );

    let output_path = config
        .output_settings
        .output_path
        .as_ref()
        .map(|p| root_p.join(p).display().to_string());
    Ok((
        build_summary_js(&config, &summary, &import, &results),
        output_path,
    ))
}

pub fn run_poll(args: &Args) -> AppResult<()> {
    let (result_js, config_out) = tabulate_files(args)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(SerializingJsonSnafu {})?;

    match args.out.clone().or(config_out).as_deref() {
        None | Some("stdout") => println!("{}", pretty_js_stats),
        Some(out_path) => {
            info!("Writing results to {}", out_path);
            fs::write(out_path, &pretty_js_stats).context(WritingFileSnafu { path: out_path })?;
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = args.reference.as_deref() {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}
