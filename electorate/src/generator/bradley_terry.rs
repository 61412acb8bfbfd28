use log::{debug, info};
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};
use rand::distributions::Distribution;
use rand::Rng;
use snafu::OptionExt;

use std::collections::HashMap;

use crate::apportion::Apportionment;
use crate::config::*;
use crate::generator::{ballot_pool_to_profile, BallotGenerator, BallotSpace, BlocIntervals};
use crate::interval::{derive_pref_intervals, slate_candidates};
use crate::profile::PreferenceProfile;
use crate::sampling::categorical;

fn exact_support(cand_support: &PrefInterval) -> GenResult<HashMap<&str, BigRational>> {
    let mut res: HashMap<&str, BigRational> = HashMap::new();
    for (c, v) in cand_support.iter() {
        let exact = BigRational::from_float(*v).context(InvalidParameterSnafu {
            message: format!("support {} of {} is not a finite number", v, c),
        })?;
        res.insert(c.as_str(), exact);
    }
    Ok(res)
}

/// The unnormalised Bradley-Terry weight of each ranking: the product, over
/// all the pairs of ranked candidates, of `s_i / (s_i + s_j)` where `i` is
/// ranked above `j`.
///
/// The computation is exact: the supports are converted to rationals without
/// rounding. A pair in which both candidates have no support weighs 1/2.
pub fn calculate_ranking_probs(
    permutations: &[Vec<String>],
    cand_support: &PrefInterval,
) -> GenResult<HashMap<Vec<String>, BigRational>> {
    let support = exact_support(cand_support)?;
    let half = BigRational::new(1.into(), 2.into());
    let mut res: HashMap<Vec<String>, BigRational> = HashMap::with_capacity(permutations.len());
    for perm in permutations.iter() {
        let mut values: Vec<&BigRational> = Vec::with_capacity(perm.len());
        for c in perm.iter() {
            values.push(
                support
                    .get(c.as_str())
                    .context(UnknownCandidateSnafu { name: c })?,
            );
        }
        let mut prob = BigRational::one();
        for (i, si) in values.iter().enumerate() {
            for sj in values[i + 1..].iter() {
                let total = (*si).clone() + (*sj).clone();
                prob = if total.is_zero() {
                    prob * half.clone()
                } else {
                    prob * ((*si).clone() / total)
                };
            }
        }
        res.insert(perm.clone(), prob);
    }
    Ok(res)
}

/// Bradley-Terry: the probability of a ranking is proportional to the product
/// of the pairwise preferences it contains.
///
/// All the rankings are enumerated when the generator is built, so this model
/// is limited to small numbers of candidates.
#[derive(Debug, Clone)]
pub struct BradleyTerry {
    space: BallotSpace,
    blocs: BlocIntervals,
    apportionment: Apportionment,
    rankings: Vec<Vec<String>>,
    /// The normalised probability of every ranking, for each bloc.
    tables: HashMap<String, Vec<f64>>,
}

impl BradleyTerry {
    pub fn new(
        candidates: &[String],
        ballot_length: Option<usize>,
        pref_interval_by_bloc: &PrefIntervalByBloc,
        bloc_voter_prop: &BlocVoterProp,
    ) -> GenResult<BradleyTerry> {
        let space = BallotSpace::new(candidates, ballot_length)?;
        let blocs = BlocIntervals::new(candidates, pref_interval_by_bloc, bloc_voter_prop)?;
        let rankings = space.rankings();
        info!(
            "BradleyTerry: enumerating {} rankings for {} blocs",
            rankings.len(),
            bloc_voter_prop.len()
        );
        let mut tables: HashMap<String, Vec<f64>> = HashMap::new();
        for (bloc, interval) in blocs.pref_interval_by_bloc().iter() {
            let probs = calculate_ranking_probs(&rankings, interval)?;
            let total = probs
                .values()
                .fold(BigRational::zero(), |acc, p| acc + p.clone());
            let weights: Vec<f64> = rankings
                .iter()
                .map(|r| {
                    if total.is_zero() {
                        0.0
                    } else {
                        (probs[r].clone() / total.clone()).to_f64().unwrap_or(0.0)
                    }
                })
                .collect();
            tables.insert(bloc.clone(), weights);
        }
        Ok(BradleyTerry {
            space,
            blocs,
            apportionment: Apportionment::default(),
            rankings,
            tables,
        })
    }

    pub fn from_params<R: Rng + ?Sized>(
        params: &BlocParams,
        ballot_length: Option<usize>,
        rng: &mut R,
    ) -> GenResult<BradleyTerry> {
        let intervals = derive_pref_intervals(params, rng)?;
        BradleyTerry::new(
            &slate_candidates(&params.slate_to_candidates),
            ballot_length,
            &intervals,
            &params.bloc_voter_prop,
        )
    }

    pub fn with_apportionment(self, apportionment: Apportionment) -> BradleyTerry {
        BradleyTerry {
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

impl BallotGenerator for BradleyTerry {
    fn generate_profile<R: Rng + ?Sized>(
        &self,
        number_of_ballots: u64,
        rng: &mut R,
    ) -> GenResult<PreferenceProfile> {
        let mut pool: Vec<Vec<String>> = Vec::new();
        for (bloc, count) in self.blocs.bloc_counts(number_of_ballots, &self.apportionment) {
            if count == 0 {
                continue;
            }
            let weights = self.tables.get(&bloc).context(SamplingSnafu {
                message: format!("no ranking table for bloc {}", bloc),
            })?;
            let dist = categorical(weights)?;
            debug!("BradleyTerry: bloc {} casts {} ballots", bloc, count);
            for _ in 0..count {
                pool.push(self.rankings[dist.sample(rng)].clone());
            }
        }
        Ok(ballot_pool_to_profile(pool, self.space.candidates()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::{single, weight_of, Ballot};
    use crate::distance::linf_dist;
    use crate::generator::tests::{check_reproducible, names};
    use crate::interval::tests::{map, rd_params};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn exact(x: f64) -> BigRational {
        BigRational::from_float(x).unwrap()
    }

    fn support() -> PrefInterval {
        map(&[("W1", 0.4), ("W2", 0.3), ("C1", 0.2), ("C2", 0.1)])
    }

    // Supports are read as the exact value of their binary float, so 0.4 is
    // not 2/5 here.
    #[test]
    fn full_ranking_probability_is_exact() {
        let perm = names(&["W1", "W2", "C2"]);
        let probs = calculate_ranking_probs(&[perm.clone()], &support()).unwrap();
        let (w1, w2, c2) = (exact(0.4), exact(0.3), exact(0.1));
        let expected = (w1.clone() / (w1.clone() + w2.clone()))
            * (w1.clone() / (w1 + c2.clone()))
            * (w2.clone() / (w2 + c2));
        assert_eq!(probs[&perm], expected);
    }

    #[test]
    fn dyadic_supports_give_the_hand_computed_fraction() {
        let interval = map(&[("a", 0.5), ("b", 0.25), ("c", 0.125), ("d", 0.125)]);
        let perm = names(&["a", "b", "c", "d"]);
        let probs = calculate_ranking_probs(&[perm.clone()], &interval).unwrap();
        // 2/3 * 4/5 * 4/5 * 2/3 * 2/3 * 1/2
        assert_eq!(probs[&perm], BigRational::new(64.into(), 225.into()));
    }

    #[test]
    fn pairs_only_involve_ranked_candidates() {
        let interval = map(&[("W1", 0.4), ("W2", 0.3), ("C1", 0.2), ("C2", 0.1)]);
        let perm = names(&["W1", "W2"]);
        let probs = calculate_ranking_probs(&[perm.clone()], &interval).unwrap();
        let (w1, w2) = (exact(0.4), exact(0.3));
        assert_eq!(probs[&perm], w1.clone() / (w1 + w2));
    }

    #[test]
    fn unsupported_pairs_are_even() {
        let interval = map(&[("a", 0.0), ("b", 0.0), ("c", 1.0)]);
        let perm = names(&["a", "b"]);
        let probs = calculate_ranking_probs(&[perm.clone()], &interval).unwrap();
        assert_eq!(probs[&perm], BigRational::new(1.into(), 2.into()));
        let missing = calculate_ranking_probs(&[names(&["a", "z"])], &interval);
        assert!(missing.unwrap_err().is_parameter_error());
    }

    #[test]
    fn generated_profile_matches_the_model() {
        let cands = names(&["W1", "W2", "C1", "C2"]);
        let intervals = map(&[("W", support())]);
        let props = map(&[("W", 1.0)]);
        let g = BradleyTerry::new(&cands, Some(3), &intervals, &props).unwrap();
        let n = 30_000;
        let p = check_reproducible(&g, n);

        let perms = crate::sampling::permutations(&cands, 3);
        let probs = calculate_ranking_probs(&perms, &support()).unwrap();
        let theory = PreferenceProfile::new(
            perms
                .iter()
                .map(|r| Ballot::from_names(r).with_weight(probs[r].clone()))
                .collect(),
        );
        assert!(linf_dist(&p, &theory) < 0.02);
        // C2 has the weakest support and rarely comes first.
        let c2_first = p
            .ballots()
            .iter()
            .filter(|b| b.ranking[0] == single("C2"))
            .fold(BigRational::zero(), |acc, b| acc + b.weight.clone());
        assert!(c2_first < weight_of(n) / weight_of(10));
    }

    #[test]
    fn from_params_counts() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let g = BradleyTerry::from_params(&rd_params(&[("R", 0.5), ("D", 0.5)]), Some(2), &mut rng)
            .unwrap();
        let p = g.generate_profile(99, &mut rng).unwrap();
        assert_eq!(p.num_ballots(), weight_of(99));
    }
}
