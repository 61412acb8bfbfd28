// ********* Parameter data structures ***********

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::collections::BTreeMap;

/// The support of one bloc for each candidate. Values are non-negative and,
/// once validated, sum to 1.
pub type PrefInterval = BTreeMap<String, f64>;

/// One preference interval per bloc.
pub type PrefIntervalByBloc = BTreeMap<String, PrefInterval>;

/// The share of the electorate belonging to each bloc.
pub type BlocVoterProp = BTreeMap<String, f64>;

/// The partition of the candidates into slates, keyed by bloc.
pub type SlateToCandidates = BTreeMap<String, Vec<String>>;

/// For each bloc, the probability that one of its voters crosses over to an
/// opposing bloc.
pub type CrossoverRates = BTreeMap<String, BTreeMap<String, f64>>;

/// Absolute tolerance used when checking that proportions sum to one.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// The high-level parameters from which preference intervals are derived.
///
/// - `cohesion[B]` is the share of bloc B's support that goes to its own slate.
/// - `alphas[B][S]` is the Dirichlet concentration used by bloc B over the
/// candidates of slate S. Small values concentrate the support on a few
/// candidates, large values spread it evenly.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlocParams {
    pub slate_to_candidates: SlateToCandidates,
    pub bloc_voter_prop: BlocVoterProp,
    pub cohesion: BTreeMap<String, f64>,
    pub alphas: BTreeMap<String, BTreeMap<String, f64>>,
}

// ********* Errors **********

/// The broad cause of a generator failure.
///
/// Parameter errors are raised by constructors before any random draw.
/// Data errors come from externally supplied tables or from sampling.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ErrorKind {
    Parameter,
    Data,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GeneratorError {
    #[snafu(display("The list of candidates is empty"))]
    EmptyCandidates {},

    #[snafu(display("Candidate {name:?} appears more than once"))]
    DuplicateCandidate { name: String },

    #[snafu(display("Ballot length {length} must be between 1 and {num_candidates}"))]
    InvalidBallotLength {
        length: usize,
        num_candidates: usize,
    },

    #[snafu(display("Candidate {name:?} is not part of the declared candidates"))]
    UnknownCandidate { name: String },

    #[snafu(display("Bloc voter proportions sum to {total}, they must sum to 1"))]
    BlocProportionSum { total: f64 },

    #[snafu(display("Inconsistent blocs: {message}"))]
    InconsistentBlocs { message: String },

    #[snafu(display("Invalid parameter: {message}"))]
    InvalidParameter { message: String },

    #[snafu(display("Could not read the ballot type table {path}"))]
    ReadingBallotTypes {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("Could not parse the ballot type table {path}"))]
    ParsingBallotTypes {
        source: serde_json::Error,
        path: String,
    },

    #[snafu(display("Malformed ballot type table: {message}"))]
    MalformedBallotTypes { message: String },

    #[snafu(display("Sampling failed: {message}"))]
    Sampling { message: String },
}

impl GeneratorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeneratorError::EmptyCandidates {}
            | GeneratorError::DuplicateCandidate { .. }
            | GeneratorError::InvalidBallotLength { .. }
            | GeneratorError::UnknownCandidate { .. }
            | GeneratorError::BlocProportionSum { .. }
            | GeneratorError::InconsistentBlocs { .. }
            | GeneratorError::InvalidParameter { .. } => ErrorKind::Parameter,
            GeneratorError::ReadingBallotTypes { .. }
            | GeneratorError::ParsingBallotTypes { .. }
            | GeneratorError::MalformedBallotTypes { .. }
            | GeneratorError::Sampling { .. } => ErrorKind::Data,
        }
    }

    pub fn is_parameter_error(&self) -> bool {
        self.kind() == ErrorKind::Parameter
    }

    pub fn is_data_error(&self) -> bool {
        self.kind() == ErrorKind::Data
    }
}

pub type GenResult<T> = Result<T, GeneratorError>;
