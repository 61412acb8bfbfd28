// Reading and writing profiles as CSV files.

use std::collections::HashSet;
use std::io;

use electorate::{Ballot, PreferenceProfile, Rank};
use log::debug;
use num_traits::One;
use snafu::prelude::*;

use crate::sim::io_common::*;

/// Where the voter identifiers and the weights are found in a CSV file.
///
/// Every other column is a position of the ranking, in order.
#[derive(Debug, Clone, Default)]
pub struct CsvOptions {
    /// 0-based index of the voter id column. Without one, the voters are
    /// named after the file and the line.
    pub id_col: Option<usize>,
    /// 0-based index of the weight column. Without one, every line counts
    /// once.
    pub weight_col: Option<usize>,
}

pub fn load_csv(path: &str, opts: &CsvOptions) -> LoadResult<PreferenceProfile> {
    check_exists(path)?;
    let default_id = make_default_id(path);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let num_cols = rdr.headers().context(CsvLineSnafu { lineno: 1_usize })?.len();
    ensure!(num_cols > 0, EmptySourceSnafu { path });
    for col in opts.id_col.iter().chain(opts.weight_col.iter()) {
        ensure!(*col < num_cols, MissingHeaderSnafu { path });
    }

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut ballots: Vec<Ballot> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineSnafu { lineno })?;
        debug!("load_csv: lineno: {:?} row: {:?}", lineno, line);

        let id = match opts.id_col {
            Some(id_idx) => {
                let id = line.get(id_idx).unwrap_or("").trim().to_string();
                ensure!(!id.is_empty(), MissingIdentifierSnafu { lineno });
                id
            }
            None => default_id(lineno),
        };
        ensure!(
            seen_ids.insert(id.clone()),
            DuplicateIdentifierSnafu { id, lineno }
        );

        let weight = match opts.weight_col {
            Some(w_idx) => parse_weight(line.get(w_idx).unwrap_or(""), lineno)?,
            None => One::one(),
        };

        let ranking: Vec<Rank> = line
            .iter()
            .enumerate()
            .filter(|(col, _)| Some(*col) != opts.id_col && Some(*col) != opts.weight_col)
            .map(|(_, cell)| parse_position(cell))
            .collect();
        ballots.push(Ballot::new(ranking, weight).with_voters(&[id]));
    }
    ensure!(!ballots.is_empty(), EmptySourceSnafu { path });
    debug!("load_csv: {} lines read from {}", ballots.len(), path);
    Ok(PreferenceProfile::new(ballots))
}

/// Writes a profile with an `id` column, a `weight` column and one column
/// per rank.
///
/// Rows are not padded: a ballot only has as many cells as positions.
pub fn write_csv<W: io::Write>(profile: &PreferenceProfile, writer: W) -> csv::Result<()> {
    let max_len = profile
        .ballots()
        .iter()
        .map(|b| b.ranking.len())
        .max()
        .unwrap_or(0);
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(writer);

    let mut header: Vec<String> = vec!["id".to_string(), "weight".to_string()];
    header.extend((1..=max_len).map(|r| format!("rank {}", r)));
    wtr.write_record(&header)?;

    for (idx, b) in profile.ballots().iter().enumerate() {
        let id = b.id.clone().unwrap_or_else(|| format!("b{}", idx + 1));
        let mut row: Vec<String> = vec![id, b.weight.to_string()];
        row.extend(b.ranking.iter().map(format_position));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}
