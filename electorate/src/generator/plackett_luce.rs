use log::{debug, info};
use rand::Rng;

use crate::apportion::Apportionment;
use crate::config::*;
use crate::generator::{ballot_pool_to_profile, BallotGenerator, BallotSpace, BlocIntervals};
use crate::interval::derive_pref_intervals;
use crate::profile::PreferenceProfile;
use crate::sampling::plackett_luce_order;

/// Plackett-Luce: a voter of bloc B fills their ballot one position at a time,
/// each time picking among the candidates left with a probability
/// proportional to their support in B's preference interval.
#[derive(Debug, Clone)]
pub struct PlackettLuce {
    space: BallotSpace,
    blocs: BlocIntervals,
    apportionment: Apportionment,
}

impl PlackettLuce {
    pub fn new(
        candidates: &[String],
        ballot_length: Option<usize>,
        pref_interval_by_bloc: &PrefIntervalByBloc,
        bloc_voter_prop: &BlocVoterProp,
    ) -> GenResult<PlackettLuce> {
        let space = BallotSpace::new(candidates, ballot_length)?;
        let blocs = BlocIntervals::new(candidates, pref_interval_by_bloc, bloc_voter_prop)?;
        info!(
            "PlackettLuce: {} candidates, {} blocs",
            candidates.len(),
            bloc_voter_prop.len()
        );
        Ok(PlackettLuce {
            space,
            blocs,
            apportionment: Apportionment::default(),
        })
    }

    /// Builds the generator from cohesion parameters. The candidates are the
    /// ones of the slates, slate after slate.
    pub fn from_params<R: Rng + ?Sized>(
        params: &BlocParams,
        ballot_length: Option<usize>,
        rng: &mut R,
    ) -> GenResult<PlackettLuce> {
        let intervals = derive_pref_intervals(params, rng)?;
        let candidates = crate::interval::slate_candidates(&params.slate_to_candidates);
        PlackettLuce::new(
            &candidates,
            ballot_length,
            &intervals,
            &params.bloc_voter_prop,
        )
    }

    pub fn with_apportionment(self, apportionment: Apportionment) -> PlackettLuce {
        PlackettLuce {
            apportionment,
            ..self
        }
    }

    pub fn pref_interval_by_bloc(&self) -> &PrefIntervalByBloc {
        self.blocs.pref_interval_by_bloc()
    }

    pub fn bloc_voter_prop(&self) -> &BlocVoterProp {
        self.blocs.bloc_voter_prop()
    }
}

impl BallotGenerator for PlackettLuce {
    fn generate_profile<R: Rng + ?Sized>(
        &self,
        number_of_ballots: u64,
        rng: &mut R,
    ) -> GenResult<PreferenceProfile> {
        let cands = self.space.candidates();
        let mut pool: Vec<Vec<String>> = Vec::new();
        for (bloc, count) in self.blocs.bloc_counts(number_of_ballots, &self.apportionment) {
            let weights = self.blocs.weights(&bloc, cands);
            debug!("PlackettLuce: bloc {} casts {} ballots", bloc, count);
            for _ in 0..count {
                pool.push(plackett_luce_order(
                    cands,
                    &weights,
                    self.space.ballot_length(),
                    rng,
                )?);
            }
        }
        Ok(ballot_pool_to_profile(pool, cands))
    }
}
