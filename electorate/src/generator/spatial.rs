use log::debug;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::config::*;
use crate::generator::{ballot_pool_to_profile, BallotGenerator, BallotSpace};
use crate::profile::PreferenceProfile;

/// One-dimensional spatial model: candidates and voters sit on a line, and
/// voters rank the candidates from the closest to the farthest.
///
/// Positions are standard normal draws. The candidates are placed once per
/// profile.
#[derive(Debug, Clone)]
pub struct OneDimSpatial {
    space: BallotSpace,
}

impl OneDimSpatial {
    pub fn new(candidates: &[String], ballot_length: Option<usize>) -> GenResult<OneDimSpatial> {
        Ok(OneDimSpatial {
            space: BallotSpace::new(candidates, ballot_length)?,
        })
    }
}

impl BallotGenerator for OneDimSpatial {
    fn generate_profile<R: Rng + ?Sized>(
        &self,
        number_of_ballots: u64,
        rng: &mut R,
    ) -> GenResult<PreferenceProfile> {
        let cands = self.space.candidates();
        let positions: Vec<f64> = cands
            .iter()
            .map(|_| -> f64 { StandardNormal.sample(rng) })
            .collect();
        debug!("OneDimSpatial: candidate positions {:?}", positions);
        let mut pool: Vec<Vec<String>> = Vec::new();
        for _ in 0..number_of_ballots {
            let voter: f64 = StandardNormal.sample(rng);
            let mut order: Vec<usize> = (0..cands.len()).collect();
            order.sort_by(|&i, &j| {
                let di = (positions[i] - voter).abs();
                let dj = (positions[j] - voter).abs();
                di.partial_cmp(&dj)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(i.cmp(&j))
            });
            pool.push(
                order
                    .into_iter()
                    .take(self.space.ballot_length())
                    .map(|i| cands[i].clone())
                    .collect(),
            );
        }
        Ok(ballot_pool_to_profile(pool, cands))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::tests::{check_reproducible, names};

    #[test]
    fn ballots_are_single_peaked() {
        let g = OneDimSpatial::new(&names(&["a", "b", "c", "d"]), None).unwrap();
        let p = check_reproducible(&g, 500);
        // With candidates on a line, at most C(4, 2) + 1 orders can appear.
        assert!(p.ballots().len() <= 7);
        assert!(p.ballots().iter().all(|b| b.ranking.len() == 4));
    }

    #[test]
    fn truncated_ballots() {
        let g = OneDimSpatial::new(&names(&["a", "b", "c"]), Some(1)).unwrap();
        let p = check_reproducible(&g, 50);
        assert!(p.ballots().iter().all(|b| b.ranking.len() == 1));
    }
}
