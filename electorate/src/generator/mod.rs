//! The ballot generators.
//!
//! Every generator validates its parameters when it is constructed and then
//! only draws ballots: `generate_profile` never fails on a parameter error.

use log::{debug, info};
use rand::Rng;
use snafu::ensure;

use std::collections::{HashMap, HashSet};

use crate::apportion::Apportionment;
use crate::ballot::{single, weight_of, Ballot};
use crate::config::*;
use crate::interval::{check_bloc_voter_prop, check_pref_intervals};
use crate::profile::PreferenceProfile;
use crate::sampling::permutations;

pub mod bradley_terry;
pub mod cambridge;
pub mod crossover;
pub mod impartial;
pub mod plackett_luce;
pub mod simplex;
pub mod spatial;

pub use bradley_terry::{calculate_ranking_probs, BradleyTerry};
pub use cambridge::{BallotTypeTable, CambridgeSampler};
pub use crossover::AlternatingCrossover;
pub use impartial::{ImpartialAnonymousCulture, ImpartialCulture};
pub use plackett_luce::PlackettLuce;
pub use simplex::BallotSimplex;
pub use spatial::OneDimSpatial;

/// The shared contract of all the generators.
pub trait BallotGenerator {
    /// Draws `number_of_ballots` ballots and folds them into a profile.
    fn generate_profile<R: Rng + ?Sized>(
        &self,
        number_of_ballots: u64,
        rng: &mut R,
    ) -> GenResult<PreferenceProfile>;
}

/// Fails if the list of candidates is empty or has duplicates.
pub fn check_candidates(candidates: &[String]) -> GenResult<()> {
    ensure!(!candidates.is_empty(), EmptyCandidatesSnafu {});
    let mut seen: HashSet<&str> = HashSet::new();
    for c in candidates.iter() {
        ensure!(seen.insert(c.as_str()), DuplicateCandidateSnafu { name: c });
    }
    Ok(())
}

/// Resolves an optional ballot length. `None` means full rankings.
pub fn check_ballot_length(ballot_length: Option<usize>, num_candidates: usize) -> GenResult<usize> {
    match ballot_length {
        None => Ok(num_candidates),
        Some(length) => {
            ensure!(
                length >= 1 && length <= num_candidates,
                InvalidBallotLengthSnafu {
                    length,
                    num_candidates
                }
            );
            Ok(length)
        }
    }
}

/// The candidates and the length of the ballots of a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallotSpace {
    candidates: Vec<String>,
    ballot_length: usize,
}

impl BallotSpace {
    pub fn new(candidates: &[String], ballot_length: Option<usize>) -> GenResult<BallotSpace> {
        check_candidates(candidates)?;
        let ballot_length = check_ballot_length(ballot_length, candidates.len())?;
        Ok(BallotSpace {
            candidates: candidates.to_vec(),
            ballot_length,
        })
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn ballot_length(&self) -> usize {
        self.ballot_length
    }

    /// Every possible ballot, in lexicographic order of candidate positions.
    pub fn rankings(&self) -> Vec<Vec<String>> {
        permutations(&self.candidates, self.ballot_length)
    }
}

/// Preference intervals and proportions of a set of blocs, validated against
/// the candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct BlocIntervals {
    pref_interval_by_bloc: PrefIntervalByBloc,
    bloc_voter_prop: BlocVoterProp,
}

impl BlocIntervals {
    pub fn new(
        candidates: &[String],
        pref_interval_by_bloc: &PrefIntervalByBloc,
        bloc_voter_prop: &BlocVoterProp,
    ) -> GenResult<BlocIntervals> {
        check_bloc_voter_prop(bloc_voter_prop)?;
        let pref_interval_by_bloc =
            check_pref_intervals(pref_interval_by_bloc, candidates, bloc_voter_prop)?;
        Ok(BlocIntervals {
            pref_interval_by_bloc,
            bloc_voter_prop: bloc_voter_prop.clone(),
        })
    }

    pub fn pref_interval_by_bloc(&self) -> &PrefIntervalByBloc {
        &self.pref_interval_by_bloc
    }

    pub fn bloc_voter_prop(&self) -> &BlocVoterProp {
        &self.bloc_voter_prop
    }

    /// The normalised interval of a bloc.
    pub fn interval(&self, bloc: &str) -> Option<&PrefInterval> {
        self.pref_interval_by_bloc.get(bloc)
    }

    /// The supports of a bloc for the given candidates, in their order.
    pub(crate) fn weights(&self, bloc: &str, candidates: &[String]) -> Vec<f64> {
        let interval = self.interval(bloc);
        candidates
            .iter()
            .map(|c| interval.and_then(|i| i.get(c)).cloned().unwrap_or(0.0))
            .collect()
    }

    /// The number of ballots cast by each bloc, blocs in key order.
    pub fn bloc_counts(&self, total: u64, apportionment: &Apportionment) -> Vec<(String, u64)> {
        let shares: Vec<f64> = self.bloc_voter_prop.values().cloned().collect();
        let counts = apportionment.apportion(total, &shares);
        let res: Vec<(String, u64)> = self
            .bloc_voter_prop
            .keys()
            .cloned()
            .zip(counts.into_iter())
            .collect();
        debug!("bloc_counts: {:?}", res);
        res
    }
}

/// Folds a pool of generated rankings into a profile with unit weights.
///
/// Rankings keep the order of their first appearance in the pool.
pub fn ballot_pool_to_profile(pool: Vec<Vec<String>>, candidates: &[String]) -> PreferenceProfile {
    let mut counts: HashMap<Vec<String>, u64> = HashMap::new();
    let mut order: Vec<Vec<String>> = Vec::new();
    for ranking in pool.into_iter() {
        let count = counts.entry(ranking.clone()).or_insert(0);
        if *count == 0 {
            order.push(ranking);
        }
        *count += 1;
    }
    let ballots: Vec<Ballot> = order
        .into_iter()
        .map(|ranking| {
            let weight = weight_of(counts[&ranking]);
            Ballot::new(ranking.iter().map(|c| single(c)).collect(), weight)
        })
        .collect();
    PreferenceProfile::from_checked(ballots, Some(candidates.to_vec()))
}

/// All the generators, for callers that pick one at run time.
#[derive(Debug, Clone)]
pub enum Generator {
    ImpartialCulture(ImpartialCulture),
    ImpartialAnonymousCulture(ImpartialAnonymousCulture),
    BallotSimplex(BallotSimplex),
    PlackettLuce(PlackettLuce),
    BradleyTerry(BradleyTerry),
    AlternatingCrossover(AlternatingCrossover),
    Cambridge(CambridgeSampler),
    OneDimSpatial(OneDimSpatial),
}

impl Generator {
    pub fn name(&self) -> &'static str {
        match self {
            Generator::ImpartialCulture(_) => "ic",
            Generator::ImpartialAnonymousCulture(_) => "iac",
            Generator::BallotSimplex(_) => "simplex",
            Generator::PlackettLuce(_) => "plackett_luce",
            Generator::BradleyTerry(_) => "bradley_terry",
            Generator::AlternatingCrossover(_) => "alternating_crossover",
            Generator::Cambridge(_) => "cambridge",
            Generator::OneDimSpatial(_) => "one_dim_spatial",
        }
    }

    /// The preference intervals of the bloc models.
    pub fn pref_interval_by_bloc(&self) -> Option<&PrefIntervalByBloc> {
        match self {
            Generator::PlackettLuce(g) => Some(g.pref_interval_by_bloc()),
            Generator::BradleyTerry(g) => Some(g.pref_interval_by_bloc()),
            Generator::AlternatingCrossover(g) => Some(g.pref_interval_by_bloc()),
            Generator::Cambridge(g) => Some(g.pref_interval_by_bloc()),
            _ => None,
        }
    }
}

impl BallotGenerator for Generator {
    fn generate_profile<R: Rng + ?Sized>(
        &self,
        number_of_ballots: u64,
        rng: &mut R,
    ) -> GenResult<PreferenceProfile> {
        info!(
            "Generating {} ballots with the {} model",
            number_of_ballots,
            self.name()
        );
        match self {
            Generator::ImpartialCulture(g) => g.generate_profile(number_of_ballots, rng),
            Generator::ImpartialAnonymousCulture(g) => g.generate_profile(number_of_ballots, rng),
            Generator::BallotSimplex(g) => g.generate_profile(number_of_ballots, rng),
            Generator::PlackettLuce(g) => g.generate_profile(number_of_ballots, rng),
            Generator::BradleyTerry(g) => g.generate_profile(number_of_ballots, rng),
            Generator::AlternatingCrossover(g) => g.generate_profile(number_of_ballots, rng),
            Generator::Cambridge(g) => g.generate_profile(number_of_ballots, rng),
            Generator::OneDimSpatial(g) => g.generate_profile(number_of_ballots, rng),
        }
    }
}

macro_rules! generator_from {
    ($variant:ident, $t:ty) => {
        impl From<$t> for Generator {
            fn from(g: $t) -> Generator {
                Generator::$variant(g)
            }
        }
    };
}

generator_from!(ImpartialCulture, ImpartialCulture);
generator_from!(ImpartialAnonymousCulture, ImpartialAnonymousCulture);
generator_from!(BallotSimplex, BallotSimplex);
generator_from!(PlackettLuce, PlackettLuce);
generator_from!(BradleyTerry, BradleyTerry);
generator_from!(AlternatingCrossover, AlternatingCrossover);
generator_from!(Cambridge, CambridgeSampler);
generator_from!(OneDimSpatial, OneDimSpatial);
