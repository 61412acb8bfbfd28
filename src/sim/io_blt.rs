// Reading profiles from BLT files.
//
// A BLT file starts with `<candidates> <seats>`, then one ballot per line:
// a weight, the numbers of the candidates (starting at 1) and a closing 0.
// A lone 0 ends the ballots. The names of the candidates follow, one quoted
// name per line, and finally the quoted title of the election.

use std::fs;

use electorate::{undervote, Ballot, Choice, PreferenceProfile, Rank};
use log::debug;
use snafu::prelude::*;

use crate::sim::io_common::*;

/// Reads a BLT file. Returns the profile and the number of seats.
pub fn load_blt(path: &str) -> LoadResult<(PreferenceProfile, u32)> {
    check_exists(path)?;
    let content = fs::read_to_string(path).context(IoSnafu { path })?;
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(idx, l)| (idx + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let (lineno, header) = lines.next().context(EmptySourceSnafu { path })?;
    let (num_cands, seats) = parse_header(path, lineno, header)?;
    debug!("load_blt: {} candidates, {} seats", num_cands, seats);

    let mut raw_ballots: Vec<(usize, Vec<Vec<usize>>, String)> = Vec::new();
    let mut terminated = false;
    for (lineno, line) in lines.by_ref() {
        if line == "0" {
            terminated = true;
            break;
        }
        let (weight, positions) = parse_ballot_line(path, lineno, line)?;
        raw_ballots.push((lineno, positions, weight));
    }
    ensure!(
        terminated,
        MalformedMetadataSnafu {
            path,
            lineno: content.lines().count(),
            message: "the list of ballots is not closed by a 0"
        }
    );

    let names: Vec<String> = lines
        .map(|(lineno, l)| parse_quoted(path, lineno, l))
        .collect::<LoadResult<Vec<String>>>()?;
    // The title is optional.
    ensure!(
        names.len() == num_cands || names.len() == num_cands + 1,
        CandidateMetadataConflictSnafu {
            path,
            declared: num_cands,
            found: names.len(),
        }
    );
    let candidates: Vec<String> = names.into_iter().take(num_cands).collect();

    let mut ballots: Vec<Ballot> = Vec::with_capacity(raw_ballots.len());
    for (lineno, positions, weight) in raw_ballots {
        let weight = parse_weight(&weight, lineno)?;
        let ranking = positions
            .iter()
            .map(|idxs| resolve(idxs, &candidates, lineno))
            .collect::<LoadResult<Vec<Rank>>>()?;
        ballots.push(Ballot::new(ranking, weight));
    }
    ensure!(!ballots.is_empty(), EmptySourceSnafu { path });

    let profile = PreferenceProfile::with_candidates(ballots, &candidates)
        .context(InvalidProfileSnafu { path })?;
    Ok((profile, seats))
}

fn parse_header(path: &str, lineno: usize, line: &str) -> LoadResult<(usize, u32)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let malformed = || MalformedMetadataSnafu {
        path,
        lineno,
        message: format!("expected `<candidates> <seats>`, found {:?}", line),
    };
    ensure!(fields.len() == 2, malformed());
    let num_cands: usize = fields[0].parse().ok().with_context(malformed)?;
    let seats: u32 = fields[1].parse().ok().with_context(malformed)?;
    Ok((num_cands, seats))
}

// Index 0 stands for an undervote.
fn parse_ballot_line(
    path: &str,
    lineno: usize,
    line: &str,
) -> LoadResult<(String, Vec<Vec<usize>>)> {
    let mut fields = line.split_whitespace();
    let weight = fields.next().unwrap_or("").to_string();
    let mut positions: Vec<Vec<usize>> = Vec::new();
    let mut closed = false;
    for field in fields {
        ensure!(
            !closed,
            MalformedMetadataSnafu {
                path,
                lineno,
                message: "data after the closing 0 of a ballot"
            }
        );
        if field == "0" {
            closed = true;
            continue;
        }
        let idxs = field
            .split('=')
            .map(|f| match f {
                "-" => Ok(0),
                _ => f.parse::<usize>().ok().context(UnresolvableCandidateSnafu {
                    reference: f,
                    lineno,
                }),
            })
            .collect::<LoadResult<Vec<usize>>>()?;
        positions.push(idxs);
    }
    ensure!(
        closed,
        MalformedMetadataSnafu {
            path,
            lineno,
            message: "a ballot must end with 0"
        }
    );
    Ok((weight, positions))
}

fn parse_quoted(path: &str, lineno: usize, line: &str) -> LoadResult<String> {
    let inner = line
        .strip_prefix('"')
        .and_then(|l| l.strip_suffix('"'))
        .context(MalformedMetadataSnafu {
            path,
            lineno,
            message: format!("expected a quoted name, found {:?}", line),
        })?;
    Ok(inner.to_string())
}

fn resolve(idxs: &[usize], candidates: &[String], lineno: usize) -> LoadResult<Rank> {
    if idxs.iter().all(|idx| *idx == 0) {
        return Ok(undervote());
    }
    idxs.iter()
        .map(|idx| {
            idx.checked_sub(1)
                .and_then(|i| candidates.get(i))
                .map(|name| Choice::from(name.as_str()))
                .context(UnresolvableCandidateSnafu {
                    reference: idx.to_string(),
                    lineno,
                })
        })
        .collect()
}
