// Shared pieces of the profile loaders.

use num_rational::BigRational;
use num_traits::Signed;
use snafu::prelude::*;

use std::collections::BTreeSet;
use std::path::Path;

use electorate::{undervote, Choice, Rank};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LoadError {
    #[snafu(display("File not found: {path}"))]
    NotFound { path: String },

    #[snafu(display("No ballot data in {path}"))]
    EmptySource { path: String },

    #[snafu(display("Missing header in {path}"))]
    MissingHeader { path: String },

    #[snafu(display("Malformed metadata in {path}, line {lineno}: {message}"))]
    MalformedMetadata {
        path: String,
        lineno: usize,
        message: String,
    },

    #[snafu(display("Invalid weight {value:?} on line {lineno}"))]
    InvalidWeight { value: String, lineno: usize },

    #[snafu(display("Voter id {id:?} appears more than once (line {lineno})"))]
    DuplicateIdentifier { id: String, lineno: usize },

    #[snafu(display("Missing voter id on line {lineno}"))]
    MissingIdentifier { lineno: usize },

    #[snafu(display("Cannot resolve candidate {reference:?} on line {lineno}"))]
    UnresolvableCandidate { reference: String, lineno: usize },

    #[snafu(display("{declared} candidates are declared in {path} but {found} names are given"))]
    CandidateMetadataConflict {
        path: String,
        declared: usize,
        found: usize,
    },

    #[snafu(display("The ballots of {path} do not form a valid profile"))]
    InvalidProfile {
        source: electorate::GeneratorError,
        path: String,
    },

    #[snafu(display("Error reading {path}"))]
    Io {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("Error reading CSV line {lineno}"))]
    CsvLine { source: csv::Error, lineno: usize },

    #[snafu(display("Error opening CSV {path}"))]
    CsvOpen { source: csv::Error, path: String },
}

/// What went wrong when loading a profile, for callers that branch on it.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum LoadCause {
    NotFound,
    /// No ballot could be read.
    Empty,
    /// The file does not follow the format.
    Malformed,
    /// The file is well-formed but contradicts itself.
    Inconsistent,
    Io,
}

impl LoadError {
    pub fn cause(&self) -> LoadCause {
        match self {
            LoadError::NotFound { .. } => LoadCause::NotFound,
            LoadError::EmptySource { .. } => LoadCause::Empty,
            LoadError::MissingHeader { .. }
            | LoadError::MalformedMetadata { .. }
            | LoadError::InvalidWeight { .. }
            | LoadError::CsvLine { .. } => LoadCause::Malformed,
            LoadError::DuplicateIdentifier { .. }
            | LoadError::MissingIdentifier { .. }
            | LoadError::UnresolvableCandidate { .. }
            | LoadError::CandidateMetadataConflict { .. }
            | LoadError::InvalidProfile { .. } => LoadCause::Inconsistent,
            LoadError::Io { .. } | LoadError::CsvOpen { .. } => LoadCause::Io,
        }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;

/// The name of the file, without its directory.
pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn check_exists(path: &str) -> LoadResult<()> {
    ensure!(
        Path::new(path).is_file(),
        NotFoundSnafu {
            path: path.to_string()
        }
    );
    Ok(())
}

/// Parses a non-negative weight, either an integer or a fraction like `3/4`.
pub fn parse_weight(value: &str, lineno: usize) -> LoadResult<BigRational> {
    let w: BigRational = value.trim().parse().ok().context(InvalidWeightSnafu {
        value: value.to_string(),
        lineno,
    })?;
    ensure!(
        !w.is_negative(),
        InvalidWeightSnafu {
            value: value.to_string(),
            lineno
        }
    );
    Ok(w)
}

/// Turns a cell into a ranking position. An empty cell is an undervote and
/// tied candidates are joined with `=`.
pub fn parse_position(cell: &str) -> Rank {
    let cell = cell.trim();
    if cell.is_empty() {
        return undervote();
    }
    let res: BTreeSet<Choice> = cell
        .split('=')
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(Choice::from)
        .collect();
    if res.is_empty() {
        undervote()
    } else {
        res
    }
}

/// Formats a ranking position for a CSV cell, the reverse of `parse_position`.
pub fn format_position(rank: &Rank) -> String {
    rank.iter()
        .filter_map(|c| c.candidate())
        .collect::<Vec<&str>>()
        .join("=")
}
