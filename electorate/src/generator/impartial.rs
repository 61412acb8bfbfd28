use log::info;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::*;
use crate::generator::simplex::BallotSimplex;
use crate::generator::{ballot_pool_to_profile, BallotGenerator, BallotSpace};
use crate::profile::PreferenceProfile;

/// Impartial Culture: every ballot is an independent, uniform draw among all
/// the possible ballots.
#[derive(Debug, Clone)]
pub struct ImpartialCulture {
    space: BallotSpace,
}

impl ImpartialCulture {
    pub fn new(candidates: &[String], ballot_length: Option<usize>) -> GenResult<ImpartialCulture> {
        let space = BallotSpace::new(candidates, ballot_length)?;
        info!(
            "ImpartialCulture: {} candidates, ballots of length {}",
            candidates.len(),
            space.ballot_length()
        );
        Ok(ImpartialCulture { space })
    }
}

impl BallotGenerator for ImpartialCulture {
    fn generate_profile<R: Rng + ?Sized>(
        &self,
        number_of_ballots: u64,
        rng: &mut R,
    ) -> GenResult<PreferenceProfile> {
        let length = self.space.ballot_length();
        let mut cands = self.space.candidates().to_vec();
        let mut pool: Vec<Vec<String>> = Vec::new();
        for _ in 0..number_of_ballots {
            let (chosen, _) = cands.partial_shuffle(rng, length);
            pool.push(chosen.to_vec());
        }
        Ok(ballot_pool_to_profile(pool, self.space.candidates()))
    }
}

/// Impartial Anonymous Culture: a distribution over all the possible ballots
/// is drawn uniformly from the simplex, then all the ballots are drawn from
/// it.
///
/// Unlike Impartial Culture, two profiles of the same size usually look very
/// different: every call draws a new distribution.
#[derive(Debug, Clone)]
pub struct ImpartialAnonymousCulture {
    simplex: BallotSimplex,
}

impl ImpartialAnonymousCulture {
    pub fn new(
        candidates: &[String],
        ballot_length: Option<usize>,
    ) -> GenResult<ImpartialAnonymousCulture> {
        Ok(ImpartialAnonymousCulture {
            simplex: BallotSimplex::from_alpha(1.0, candidates, ballot_length)?,
        })
    }
}

impl BallotGenerator for ImpartialAnonymousCulture {
    fn generate_profile<R: Rng + ?Sized>(
        &self,
        number_of_ballots: u64,
        rng: &mut R,
    ) -> GenResult<PreferenceProfile> {
        self.simplex.generate_profile(number_of_ballots, rng)
    }
}
