//! Validation of bloc structures and derivation of preference intervals from
//! cohesion parameters.

use log::{debug, info};
use rand::Rng;
use snafu::ensure;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::config::*;
use crate::sampling::sample_dirichlet;

fn key_set<V>(m: &BTreeMap<String, V>) -> BTreeSet<&str> {
    m.keys().map(|k| k.as_str()).collect()
}

/// Fails unless both maps are keyed by the same blocs.
pub(crate) fn check_same_blocs<A, B>(
    what: &str,
    reference: &BTreeMap<String, A>,
    other: &BTreeMap<String, B>,
) -> GenResult<()> {
    ensure!(
        key_set(reference) == key_set(other),
        InconsistentBlocsSnafu {
            message: format!(
                "{} is keyed by {:?}, expected {:?}",
                what,
                key_set(other),
                key_set(reference)
            )
        }
    );
    Ok(())
}

/// Checks that the bloc proportions are non-negative and sum to 1.
pub fn check_bloc_voter_prop(bloc_voter_prop: &BlocVoterProp) -> GenResult<()> {
    ensure!(
        !bloc_voter_prop.is_empty(),
        InconsistentBlocsSnafu {
            message: "no bloc was declared"
        }
    );
    for (bloc, p) in bloc_voter_prop.iter() {
        ensure!(
            p.is_finite() && *p >= 0.0,
            InvalidParameterSnafu {
                message: format!("bloc {} has an invalid proportion {}", bloc, p)
            }
        );
    }
    let total: f64 = bloc_voter_prop.values().sum();
    ensure!(
        (total - 1.0).abs() <= SUM_TOLERANCE,
        BlocProportionSumSnafu { total }
    );
    Ok(())
}

/// Rescales an interval so that its values sum to 1.
///
/// Fails if a value is negative or not finite, or if all values are zero.
pub fn normalize_interval(bloc: &str, interval: &PrefInterval) -> GenResult<PrefInterval> {
    for (cand, v) in interval.iter() {
        ensure!(
            v.is_finite() && *v >= 0.0,
            InvalidParameterSnafu {
                message: format!("bloc {} gives an invalid support {} to {}", bloc, v, cand)
            }
        );
    }
    let total: f64 = interval.values().sum();
    ensure!(
        total > 0.0,
        InvalidParameterSnafu {
            message: format!("bloc {} gives no support to any candidate", bloc)
        }
    );
    Ok(interval
        .iter()
        .map(|(c, v)| (c.clone(), v / total))
        .collect())
}

/// Validates the intervals against the candidates and the blocs, and returns
/// them normalised. Candidates missing from an interval get no support.
pub fn check_pref_intervals(
    pref_interval_by_bloc: &PrefIntervalByBloc,
    candidates: &[String],
    bloc_voter_prop: &BlocVoterProp,
) -> GenResult<PrefIntervalByBloc> {
    check_same_blocs("pref_interval_by_bloc", bloc_voter_prop, pref_interval_by_bloc)?;
    let known: HashSet<&str> = candidates.iter().map(|c| c.as_str()).collect();
    let mut res = PrefIntervalByBloc::new();
    for (bloc, interval) in pref_interval_by_bloc.iter() {
        if let Some(name) = interval.keys().find(|c| !known.contains(c.as_str())) {
            return UnknownCandidateSnafu { name }.fail();
        }
        let mut full: PrefInterval = candidates.iter().map(|c| (c.clone(), 0.0)).collect();
        full.extend(interval.iter().map(|(c, v)| (c.clone(), *v)));
        res.insert(bloc.clone(), normalize_interval(bloc, &full)?);
    }
    Ok(res)
}

/// Checks that the slates partition the candidates and match the blocs.
pub fn check_slates(
    slate_to_candidates: &SlateToCandidates,
    candidates: &[String],
    bloc_voter_prop: &BlocVoterProp,
) -> GenResult<()> {
    check_same_blocs("slate_to_candidates", bloc_voter_prop, slate_to_candidates)?;
    let known: HashSet<&str> = candidates.iter().map(|c| c.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    for (slate, cands) in slate_to_candidates.iter() {
        for c in cands.iter() {
            ensure!(
                known.contains(c.as_str()),
                UnknownCandidateSnafu { name: c.as_str() }
            );
            ensure!(
                seen.insert(c.as_str()),
                InconsistentBlocsSnafu {
                    message: format!("candidate {} of slate {} is in another slate", c, slate)
                }
            );
        }
    }
    ensure!(
        seen.len() == known.len(),
        InconsistentBlocsSnafu {
            message: "some candidates do not belong to any slate"
        }
    );
    Ok(())
}

/// The candidates of all the slates, slate after slate.
pub fn slate_candidates(slate_to_candidates: &SlateToCandidates) -> Vec<String> {
    slate_to_candidates.values().flatten().cloned().collect()
}

/// Checks the cohesion parameters and returns the candidates they describe.
pub fn check_bloc_params(params: &BlocParams) -> GenResult<Vec<String>> {
    check_bloc_voter_prop(&params.bloc_voter_prop)?;
    let candidates = slate_candidates(&params.slate_to_candidates);
    crate::generator::check_candidates(&candidates)?;
    check_slates(
        &params.slate_to_candidates,
        &candidates,
        &params.bloc_voter_prop,
    )?;
    check_same_blocs("cohesion", &params.bloc_voter_prop, &params.cohesion)?;
    check_same_blocs("alphas", &params.bloc_voter_prop, &params.alphas)?;
    for (bloc, c) in params.cohesion.iter() {
        ensure!(
            (0.0..=1.0).contains(c),
            InvalidParameterSnafu {
                message: format!("cohesion {} of bloc {} is outside [0, 1]", c, bloc)
            }
        );
    }
    for (bloc, alphas) in params.alphas.iter() {
        check_same_blocs(
            &format!("alphas[{}]", bloc),
            &params.slate_to_candidates,
            alphas,
        )?;
        for (slate, a) in alphas.iter() {
            ensure!(
                a.is_finite() && *a >= 0.0,
                InvalidParameterSnafu {
                    message: format!("alpha {} of bloc {} for slate {} is invalid", a, bloc, slate)
                }
            );
        }
    }
    Ok(candidates)
}

/// Derives one preference interval per bloc.
///
/// Bloc B puts a total mass of `cohesion[B]` on its own slate. The other
/// slates share the rest in proportion to `alphas[B][S]` (evenly if these are
/// all zero). Within slate S, the mass is split by a draw from a symmetric
/// Dirichlet distribution with concentration `alphas[B][S]`.
pub fn derive_pref_intervals<R: Rng + ?Sized>(
    params: &BlocParams,
    rng: &mut R,
) -> GenResult<PrefIntervalByBloc> {
    check_bloc_params(params)?;
    let mut res = PrefIntervalByBloc::new();
    for bloc in params.bloc_voter_prop.keys() {
        let cohesion = params.cohesion[bloc];
        let alphas = &params.alphas[bloc];
        let opposing: Vec<&String> = params
            .slate_to_candidates
            .keys()
            .filter(|s| *s != bloc)
            .collect();
        let opposing_alpha: f64 = opposing.iter().map(|s| alphas[*s]).sum();

        let mut interval = PrefInterval::new();
        for (slate, cands) in params.slate_to_candidates.iter() {
            let mass = if slate == bloc {
                cohesion
            } else if opposing_alpha > 0.0 {
                (1.0 - cohesion) * alphas[slate] / opposing_alpha
            } else {
                (1.0 - cohesion) / opposing.len() as f64
            };
            let shares = sample_dirichlet(&vec![alphas[slate]; cands.len()], rng)?;
            for (c, share) in cands.iter().zip(shares) {
                interval.insert(c.clone(), mass * share);
            }
        }
        let interval = normalize_interval(bloc, &interval)?;
        debug!("derive_pref_intervals: bloc {}: {:?}", bloc, interval);
        res.insert(bloc.clone(), interval);
    }
    info!(
        "Derived preference intervals for {} blocs over {} candidates",
        res.len(),
        params.slate_to_candidates.values().map(|c| c.len()).sum::<usize>()
    );
    Ok(res)
}
