//! Sampling primitives shared by the generators.

use itertools::Itertools;
use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::{Distribution, Gamma};
use snafu::OptionExt;

use crate::config::*;

/// A draw from a Dirichlet distribution with the given concentrations.
///
/// A concentration of 0 is the degenerate limit: that component is always 0.
/// When every component ends up at 0 (all concentrations 0, or numerical
/// underflow for very small ones), all the mass goes to a single component,
/// chosen uniformly among those with a positive concentration (or among all of
/// them if there is none).
pub fn sample_dirichlet<R: Rng + ?Sized>(alphas: &[f64], rng: &mut R) -> GenResult<Vec<f64>> {
    let mut draws: Vec<f64> = Vec::with_capacity(alphas.len());
    for &alpha in alphas {
        if alpha > 0.0 {
            let gamma = Gamma::new(alpha, 1.0).ok().context(InvalidParameterSnafu {
                message: format!("invalid Dirichlet concentration {}", alpha),
            })?;
            draws.push(gamma.sample(rng));
        } else {
            draws.push(0.0);
        }
    }
    let total: f64 = draws.iter().sum();
    if total > 0.0 && total.is_finite() {
        return Ok(draws.iter().map(|d| d / total).collect());
    }
    if alphas.is_empty() {
        return Ok(vec![]);
    }
    let eligible: Vec<usize> = {
        let positive: Vec<usize> = (0..alphas.len()).filter(|&i| alphas[i] > 0.0).collect();
        if positive.is_empty() {
            (0..alphas.len()).collect()
        } else {
            positive
        }
    };
    let winner = eligible[rng.gen_range(0..eligible.len())];
    Ok((0..alphas.len())
        .map(|i| if i == winner { 1.0 } else { 0.0 })
        .collect())
}

/// All the ordered selections of `length` candidates.
pub fn permutations(candidates: &[String], length: usize) -> Vec<Vec<String>> {
    candidates.iter().cloned().permutations(length).collect()
}

/// A categorical distribution over the indices of `weights`.
pub fn categorical(weights: &[f64]) -> GenResult<WeightedIndex<f64>> {
    WeightedIndex::new(weights)
        .ok()
        .context(SamplingSnafu {
            message: format!("cannot sample from weights {:?}", weights),
        })
}

/// Draws `length` candidates without replacement, each with probability
/// proportional to its weight among the candidates not drawn yet.
///
/// When all the remaining weights are zero, the remaining candidates are drawn
/// uniformly.
pub fn plackett_luce_order<R: Rng + ?Sized>(
    candidates: &[String],
    weights: &[f64],
    length: usize,
    rng: &mut R,
) -> GenResult<Vec<String>> {
    let mut pool: Vec<(String, f64)> = candidates
        .iter()
        .cloned()
        .zip(weights.iter().cloned())
        .collect();
    let mut res: Vec<String> = Vec::with_capacity(length);
    while res.len() < length && !pool.is_empty() {
        let total: f64 = pool.iter().map(|(_, w)| *w).sum();
        let idx = if total > 0.0 {
            let dist = categorical(&pool.iter().map(|(_, w)| *w).collect::<Vec<f64>>())?;
            dist.sample(rng)
        } else {
            rng.gen_range(0..pool.len())
        };
        res.push(pool.remove(idx).0);
    }
    Ok(res)
}

/// The probability that Plackett-Luce sampling with `interval` starts with
/// exactly `prefix`.
///
/// Candidates missing from the interval have no support.
pub fn plackett_luce_prob(prefix: &[String], interval: &PrefInterval) -> f64 {
    let mut remaining: Vec<(&String, f64)> = interval.iter().map(|(c, v)| (c, *v)).collect();
    let mut prob = 1.0;
    for cand in prefix {
        let total: f64 = remaining.iter().map(|(_, v)| *v).sum();
        let pos = remaining.iter().position(|(c, _)| *c == cand);
        let support = pos.map(|p| remaining[p].1).unwrap_or(0.0);
        prob *= if total > 0.0 {
            support / total
        } else if pos.is_some() {
            1.0 / remaining.len() as f64
        } else {
            0.0
        };
        if let Some(p) = pos {
            remaining.remove(p);
        }
    }
    prob
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dirichlet_is_on_the_simplex() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            let p = sample_dirichlet(&[0.5, 1.0, 2.0, 10.0], &mut rng).unwrap();
            assert_eq!(p.len(), 4);
            assert!(p.iter().all(|x| *x >= 0.0));
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn dirichlet_zero_concentration_is_one_hot() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let p = sample_dirichlet(&[0.0; 6], &mut rng).unwrap();
        assert_eq!(p.iter().filter(|x| **x == 1.0).count(), 1);
        assert_eq!(p.iter().filter(|x| **x == 0.0).count(), 5);
        let q = sample_dirichlet(&[0.0, 3.0, 0.0], &mut rng).unwrap();
        assert_eq!(q, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn permutation_counts() {
        let c = names(&["a", "b", "c", "d"]);
        assert_eq!(permutations(&c, 4).len(), 24);
        assert_eq!(permutations(&c, 2).len(), 12);
        assert_eq!(permutations(&c, 1).len(), 4);
    }

    #[test]
    fn plackett_luce_skips_unsupported_candidates_until_the_end() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let c = names(&["a", "b", "c"]);
        for _ in 0..100 {
            let order = plackett_luce_order(&c, &[0.0, 1.0, 0.0], 3, &mut rng).unwrap();
            assert_eq!(order[0], "b");
            assert_eq!(order.len(), 3);
        }
        let truncated = plackett_luce_order(&c, &[1.0, 1.0, 1.0], 2, &mut rng).unwrap();
        assert_eq!(truncated.len(), 2);
    }

    #[test]
    fn plackett_luce_probabilities() {
        let interval: PrefInterval = [("a", 0.5), ("b", 0.3), ("c", 0.2)]
            .iter()
            .map(|(c, v)| (c.to_string(), *v))
            .collect();
        let p = plackett_luce_prob(&names(&["b", "c"]), &interval);
        assert!((p - 0.3 * (0.2 / 0.7)).abs() < 1e-12);
        let total: f64 = permutations(&names(&["a", "b", "c"]), 3)
            .iter()
            .map(|perm| plackett_luce_prob(perm, &interval))
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
}
