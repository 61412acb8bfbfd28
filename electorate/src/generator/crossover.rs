use log::{debug, info};
use rand::Rng;
use snafu::ensure;

use crate::apportion::Apportionment;
use crate::config::*;
use crate::generator::{ballot_pool_to_profile, BallotGenerator, BallotSpace, BlocIntervals};
use crate::interval::{check_slates, derive_pref_intervals, slate_candidates};
use crate::profile::PreferenceProfile;
use crate::sampling::plackett_luce_order;

/// Checks the crossover rates of the blocs.
///
/// A bloc missing from the outer map never crosses over.
pub(crate) fn check_crossover_rates(
    bloc_crossover_rate: &CrossoverRates,
    bloc_voter_prop: &BlocVoterProp,
) -> GenResult<()> {
    for (bloc, rates) in bloc_crossover_rate.iter() {
        ensure!(
            bloc_voter_prop.contains_key(bloc),
            InconsistentBlocsSnafu {
                message: format!("crossover rates are given for unknown bloc {}", bloc)
            }
        );
        for (other, rate) in rates.iter() {
            ensure!(
                bloc_voter_prop.contains_key(other) && other != bloc,
                InconsistentBlocsSnafu {
                    message: format!("bloc {} cannot cross over to {}", bloc, other)
                }
            );
            ensure!(
                rate.is_finite() && (0.0..=1.0).contains(rate),
                InvalidParameterSnafu {
                    message: format!("crossover rate {} from {} to {} is outside [0, 1]", rate, bloc, other)
                }
            );
        }
        let total: f64 = rates.values().sum();
        ensure!(
            total <= 1.0 + SUM_TOLERANCE,
            InvalidParameterSnafu {
                message: format!("crossover rates of bloc {} sum to {}", bloc, total)
            }
        );
    }
    Ok(())
}

/// Ranks the candidates of one slate with Plackett-Luce, using the interval of
/// a bloc restricted to that slate.
pub(crate) fn order_slate<R: Rng + ?Sized>(
    blocs: &BlocIntervals,
    bloc: &str,
    slate: &[String],
    rng: &mut R,
) -> GenResult<Vec<String>> {
    let weights = blocs.weights(bloc, slate);
    plackett_luce_order(slate, &weights, slate.len(), rng)
}

/// Alternates the candidates of two orderings, starting with `first`. When
/// one runs out, the rest of the other follows.
fn interleave(first: Vec<String>, second: Vec<String>) -> Vec<String> {
    let mut res: Vec<String> = Vec::with_capacity(first.len() + second.len());
    let mut a = first.into_iter();
    let mut b = second.into_iter();
    loop {
        match (a.next(), b.next()) {
            (None, None) => break,
            (x, y) => res.extend(x.into_iter().chain(y)),
        }
    }
    res
}

/// Alternating Crossover: most voters of a bloc rank their own slate first,
/// a fraction of them "cross over" and alternate between the slate of another
/// bloc and their own.
#[derive(Debug, Clone)]
pub struct AlternatingCrossover {
    space: BallotSpace,
    blocs: BlocIntervals,
    slate_to_candidates: SlateToCandidates,
    bloc_crossover_rate: CrossoverRates,
    apportionment: Apportionment,
}

impl AlternatingCrossover {
    pub fn new(
        candidates: &[String],
        ballot_length: Option<usize>,
        slate_to_candidates: &SlateToCandidates,
        pref_interval_by_bloc: &PrefIntervalByBloc,
        bloc_voter_prop: &BlocVoterProp,
        bloc_crossover_rate: &CrossoverRates,
    ) -> GenResult<AlternatingCrossover> {
        let space = BallotSpace::new(candidates, ballot_length)?;
        let blocs = BlocIntervals::new(candidates, pref_interval_by_bloc, bloc_voter_prop)?;
        check_slates(slate_to_candidates, candidates, bloc_voter_prop)?;
        check_crossover_rates(bloc_crossover_rate, bloc_voter_prop)?;
        info!(
            "AlternatingCrossover: {} candidates in {} slates",
            candidates.len(),
            slate_to_candidates.len()
        );
        Ok(AlternatingCrossover {
            space,
            blocs,
            slate_to_candidates: slate_to_candidates.clone(),
            bloc_crossover_rate: bloc_crossover_rate.clone(),
            apportionment: Apportionment::default(),
        })
    }

    pub fn from_params<R: Rng + ?Sized>(
        params: &BlocParams,
        bloc_crossover_rate: &CrossoverRates,
        ballot_length: Option<usize>,
        rng: &mut R,
    ) -> GenResult<AlternatingCrossover> {
        let intervals = derive_pref_intervals(params, rng)?;
        AlternatingCrossover::new(
            &slate_candidates(&params.slate_to_candidates),
            ballot_length,
            &params.slate_to_candidates,
            &intervals,
            &params.bloc_voter_prop,
            bloc_crossover_rate,
        )
    }

    pub fn with_apportionment(self, apportionment: Apportionment) -> AlternatingCrossover {
        AlternatingCrossover {
            apportionment,
            ..self
        }
    }

    pub fn pref_interval_by_bloc(&self) -> &PrefIntervalByBloc {
        self.blocs.pref_interval_by_bloc()
    }

    fn slate(&self, bloc: &str) -> &[String] {
        self.slate_to_candidates
            .get(bloc)
            .map(|s| s.as_slice())
            .unwrap_or(&[])
    }

    fn crossover_ballot<R: Rng + ?Sized>(
        &self,
        bloc: &str,
        opposing: &str,
        rng: &mut R,
    ) -> GenResult<Vec<String>> {
        let own = order_slate(&self.blocs, bloc, self.slate(bloc), rng)?;
        let other = order_slate(&self.blocs, bloc, self.slate(opposing), rng)?;
        Ok(interleave(other, own))
    }

    fn loyal_ballot<R: Rng + ?Sized>(&self, bloc: &str, rng: &mut R) -> GenResult<Vec<String>> {
        let mut res = order_slate(&self.blocs, bloc, self.slate(bloc), rng)?;
        for (slate, cands) in self.slate_to_candidates.iter() {
            if slate != bloc {
                res.extend(order_slate(&self.blocs, bloc, cands, rng)?);
            }
        }
        Ok(res)
    }
}

impl BallotGenerator for AlternatingCrossover {
    fn generate_profile<R: Rng + ?Sized>(
        &self,
        number_of_ballots: u64,
        rng: &mut R,
    ) -> GenResult<PreferenceProfile> {
        let length = self.space.ballot_length();
        let mut pool: Vec<Vec<String>> = Vec::new();
        for (bloc, count) in self.blocs.bloc_counts(number_of_ballots, &self.apportionment) {
            let rates: Vec<(&String, f64)> = self
                .bloc_crossover_rate
                .get(&bloc)
                .map(|r| r.iter().map(|(o, v)| (o, *v)).collect())
                .unwrap_or_default();
            let shares: Vec<f64> = rates.iter().map(|(_, v)| *v).collect();
            let (crossing, loyal) = self.apportionment.split(count, &shares);
            debug!(
                "AlternatingCrossover: bloc {}: {} loyal ballots, crossover {:?}",
                bloc, loyal, crossing
            );
            for ((opposing, _), n) in rates.iter().zip(crossing) {
                for _ in 0..n {
                    let mut ballot = self.crossover_ballot(&bloc, opposing, rng)?;
                    ballot.truncate(length);
                    pool.push(ballot);
                }
            }
            for _ in 0..loyal {
                let mut ballot = self.loyal_ballot(&bloc, rng)?;
                ballot.truncate(length);
                pool.push(ballot);
            }
        }
        Ok(ballot_pool_to_profile(pool, self.space.candidates()))
    }
}
