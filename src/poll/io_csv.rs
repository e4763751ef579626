// Primitives for reading CSV files.

use std::fs::File;

use crate::poll::{
    io_common::{make_default_id, parse_count, parse_flag, split_tier},
    *,
};

/// Ballots with one column per rank. Each cell names the option(s) at that rank.
pub fn read_csv_ranking(path: &str, cfs: &FileSource) -> AppResult<Vec<ParsedBallot>> {
    let choices_start_col = cfs.first_vote_column_index()?;
    let delimiter = cfs.tie_delimiter();

    let mut res: Vec<ParsedBallot> = Vec::new();
    let (records, row_offset) = get_records(path, cfs)?;
    let meta = RowMeta::new(path, cfs)?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let mut pb = meta.read(&line, lineno)?;

        for (rank_idx, cell) in line.iter().skip(choices_start_col).enumerate() {
            for label in split_tier(cell, &delimiter) {
                pb.ranks.push((label, rank_idx as i64 + 1));
            }
        }
        debug!("read_csv_ranking: lineno: {:?} ballot: {:?}", lineno, &pb);
        res.push(pb);
    }
    Ok(res)
}

/// Ballots with one column per option, holding the rank given to that option.
///
/// The labels of the options are read from the line just before the first vote.
pub fn read_csv_likert(path: &str, cfs: &FileSource) -> AppResult<Vec<ParsedBallot>> {
    let choices_start_col = cfs.first_vote_column_index()?;
    let first_row = cfs.first_vote_row_index()?;
    ensure_whatever!(
        first_row >= 2,
        "{}: the csv_likert format needs a header line before the votes",
        path
    );

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.records();
    let mut header: Option<csv::StringRecord> = None;
    for lineno in 1..first_row {
        let line = records
            .next()
            .context(CsvLineTooShortSnafu { lineno })?
            .context(CsvLineParseSnafu { lineno })?;
        header = Some(line);
    }
    let header = header.context(CsvLineTooShortSnafu { lineno: 1usize })?;
    let labels: Vec<String> = header
        .iter()
        .skip(choices_start_col)
        .map(|s| s.trim().to_string())
        .collect();
    debug!("read_csv_likert: labels: {:?}", labels);

    let meta = RowMeta::new(path, cfs)?;
    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + first_row;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let mut pb = meta.read(&line, lineno)?;
        for (label, cell) in labels.iter().zip(line.iter().skip(choices_start_col)) {
            let s = cell.trim();
            if s.is_empty() {
                continue;
            }
            let rank = s.parse::<i64>().ok().context(ParsingNumberSnafu {
                lineno,
                value: s.to_string(),
            })?;
            pb.ranks.push((label.clone(), rank));
        }
        debug!("read_csv_likert: lineno: {:?} ballot: {:?}", lineno, &pb);
        res.push(pb);
    }
    Ok(res)
}

// The id, count and test columns of a line.
struct RowMeta {
    default_id: Box<dyn Fn(usize) -> String>,
    id_idx: Option<usize>,
    count_idx: Option<usize>,
    test_idx: Option<usize>,
}

impl RowMeta {
    fn new(path: &str, cfs: &FileSource) -> AppResult<RowMeta> {
        Ok(RowMeta {
            default_id: Box::new(make_default_id(path)),
            id_idx: cfs.id_column_index_int()?,
            count_idx: cfs.count_column_index_int()?,
            test_idx: cfs.test_column_index_int()?,
        })
    }

    fn cell<'a>(line: &'a csv::StringRecord, idx: usize, lineno: usize) -> AppResult<&'a str> {
        line.get(idx).context(CsvLineTooShortSnafu { lineno })
    }

    fn read(&self, line: &csv::StringRecord, lineno: usize) -> AppResult<ParsedBallot> {
        let id = match self.id_idx {
            Some(idx) => RowMeta::cell(line, idx, lineno)?.to_string(),
            None => (self.default_id)(lineno),
        };
        let count = match self.count_idx {
            Some(idx) => parse_count(RowMeta::cell(line, idx, lineno)?, lineno)?,
            None => 1,
        };
        let is_test = match self.test_idx {
            Some(idx) => parse_flag(RowMeta::cell(line, idx, lineno)?),
            None => false,
        };
        Ok(ParsedBallot {
            id: Some(id),
            count,
            is_test,
            ranks: Vec::new(),
        })
    }
}

fn get_records(path: &str, cfs: &FileSource) -> AppResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = cfs.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();
    // The index starts at 1 to respect most conventions in the spreadsheet world
    for _ in 1..first_row {
        _ = records.next();
    }
    Ok((records, first_row))
}
