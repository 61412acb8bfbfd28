use log::{debug, info};
use rand::distributions::Distribution;
use rand::Rng;
use snafu::ensure;

use std::collections::HashSet;

use crate::config::*;
use crate::generator::{ballot_pool_to_profile, BallotGenerator, BallotSpace};
use crate::profile::PreferenceProfile;
use crate::sampling::{categorical, plackett_luce_prob, sample_dirichlet};

#[derive(Debug, Clone, PartialEq)]
enum SimplexLaw {
    /// A fresh symmetric Dirichlet draw over the ballots at every call.
    Alpha(f64),
    /// The Plackett-Luce law of a single preference vector.
    Point(PrefInterval),
}

/// The ballot simplex: each profile is drawn from a distribution over all the
/// possible ballots.
#[derive(Debug, Clone)]
pub struct BallotSimplex {
    space: BallotSpace,
    law: SimplexLaw,
}

impl BallotSimplex {
    /// The distribution over ballots is drawn from a symmetric Dirichlet with
    /// concentration `alpha`.
    ///
    /// Small values concentrate the electorate on a few ballots. With
    /// `alpha = 0`, every profile contains a single ballot, picked uniformly.
    pub fn from_alpha(
        alpha: f64,
        candidates: &[String],
        ballot_length: Option<usize>,
    ) -> GenResult<BallotSimplex> {
        let space = BallotSpace::new(candidates, ballot_length)?;
        ensure!(
            alpha.is_finite() && alpha >= 0.0,
            InvalidParameterSnafu {
                message: format!("the simplex concentration must be non-negative, got {}", alpha)
            }
        );
        info!("BallotSimplex: alpha {}", alpha);
        Ok(BallotSimplex {
            space,
            law: SimplexLaw::Alpha(alpha),
        })
    }

    /// The distribution over ballots is the one of Plackett-Luce sampling
    /// with the preference vector `point`.
    pub fn from_point(
        point: &PrefInterval,
        ballot_length: Option<usize>,
        candidates: &[String],
    ) -> GenResult<BallotSimplex> {
        let space = BallotSpace::new(candidates, ballot_length)?;
        let expected: HashSet<&str> = candidates.iter().map(|c| c.as_str()).collect();
        let keys: HashSet<&str> = point.keys().map(|c| c.as_str()).collect();
        ensure!(
            expected == keys,
            InvalidParameterSnafu {
                message: "the point must give a value to every candidate, and only to them"
            }
        );
        for (c, v) in point.iter() {
            ensure!(
                v.is_finite() && *v >= 0.0,
                InvalidParameterSnafu {
                    message: format!("the point gives an invalid value {} to {}", v, c)
                }
            );
        }
        let total: f64 = point.values().sum();
        ensure!(
            (total - 1.0).abs() <= SUM_TOLERANCE,
            InvalidParameterSnafu {
                message: format!("the point sums to {}, it must sum to 1", total)
            }
        );
        info!("BallotSimplex: point {:?}", point);
        Ok(BallotSimplex {
            space,
            law: SimplexLaw::Point(point.clone()),
        })
    }
}

impl BallotGenerator for BallotSimplex {
    fn generate_profile<R: Rng + ?Sized>(
        &self,
        number_of_ballots: u64,
        rng: &mut R,
    ) -> GenResult<PreferenceProfile> {
        let rankings = self.space.rankings();
        let probs: Vec<f64> = match &self.law {
            SimplexLaw::Alpha(alpha) => sample_dirichlet(&vec![*alpha; rankings.len()], rng)?,
            SimplexLaw::Point(point) => rankings
                .iter()
                .map(|r| plackett_luce_prob(r, point))
                .collect(),
        };
        debug!(
            "BallotSimplex: {} ballots with positive mass",
            probs.iter().filter(|p| **p > 0.0).count()
        );
        let dist = categorical(&probs)?;
        let pool: Vec<Vec<String>> = (0..number_of_ballots)
            .map(|_| rankings[dist.sample(rng)].clone())
            .collect();
        Ok(ballot_pool_to_profile(pool, self.space.candidates()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::{weight_of, Ballot};
    use crate::distance::{linf_dist, lp_dist};
    use crate::generator::tests::{check_reproducible, names};
    use crate::interval::tests::map;
    use crate::sampling::permutations;
    use num_rational::BigRational;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn zero_alpha_gives_a_single_ballot() {
        let cands = names(&["A", "B", "C", "D"]);
        let g = BallotSimplex::from_alpha(0.0, &cands, None).unwrap();
        for seed in 0..5 {
            let p = g
                .generate_profile(100, &mut ChaCha8Rng::seed_from_u64(seed))
                .unwrap();
            assert_eq!(p.ballots().len(), 1);
            assert_eq!(p.num_ballots(), weight_of(100));
        }
    }

    #[test]
    fn alpha_profiles_are_reproducible() {
        let cands = names(&["A", "B", "C"]);
        let g = BallotSimplex::from_alpha(2.0, &cands, Some(2)).unwrap();
        let p = check_reproducible(&g, 300);
        assert!(p.ballots().iter().all(|b| b.ranking.len() == 2));
    }

    #[test]
    fn point_follows_plackett_luce() {
        let cands = names(&["A", "B", "C"]);
        let point = map(&[("A", 0.6), ("B", 0.3), ("C", 0.1)]);
        let g = BallotSimplex::from_point(&point, None, &cands).unwrap();
        let n = 20_000;
        let p = g
            .generate_profile(n, &mut ChaCha8Rng::seed_from_u64(5))
            .unwrap();

        // The theoretical profile, with exact weights from the PL law.
        let theory = PreferenceProfile::new(
            permutations(&cands, 3)
                .iter()
                .map(|r| {
                    let w = BigRational::from_float(plackett_luce_prob(r, &point)).unwrap();
                    Ballot::from_names(r).with_weight(w)
                })
                .collect(),
        );
        assert!(linf_dist(&p, &theory) < 0.02);
        assert!(lp_dist(&p, &theory, 1).unwrap() < 0.05);
    }

    #[test]
    fn invalid_parameters() {
        let cands = names(&["A", "B"]);
        assert!(BallotSimplex::from_alpha(-1.0, &cands, None)
            .unwrap_err()
            .is_parameter_error());
        assert!(BallotSimplex::from_alpha(f64::NAN, &cands, None).is_err());
        let partial = map(&[("A", 1.0)]);
        assert!(BallotSimplex::from_point(&partial, None, &cands).is_err());
        let unnormalized = map(&[("A", 1.0), ("B", 1.0)]);
        assert!(BallotSimplex::from_point(&unnormalized, None, &cands)
            .unwrap_err()
            .is_parameter_error());
    }
}
