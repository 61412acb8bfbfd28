//! Distances between profiles, seen as probability distributions over
//! rankings.

use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};
use snafu::ensure;

use std::collections::HashMap;

use crate::ballot::Rank;
use crate::config::*;
use crate::profile::PreferenceProfile;

/// The absolute difference of mass for every ranking observed in either
/// profile. A ranking missing from one side counts with its full mass.
fn mass_differences(a: &PreferenceProfile, b: &PreferenceProfile) -> Vec<f64> {
    let da = a.to_distribution();
    let mut db: HashMap<Vec<Rank>, BigRational> = b.to_distribution();
    let mut res: Vec<f64> = Vec::with_capacity(da.len() + db.len());
    for (ranking, pa) in da.into_iter() {
        let pb = db.remove(&ranking).unwrap_or_else(BigRational::zero);
        res.push((pa - pb).abs().to_f64().unwrap_or(f64::NAN));
    }
    for (_, pb) in db.into_iter() {
        res.push(pb.to_f64().unwrap_or(f64::NAN));
    }
    res
}

/// The L-p distance between the ranking distributions of two profiles.
///
/// Each profile is normalised by its number of ballots. Profiles with the same
/// ballots in the same proportions are at distance exactly 0.
pub fn lp_dist(a: &PreferenceProfile, b: &PreferenceProfile, p: u32) -> GenResult<f64> {
    ensure!(
        p >= 1,
        InvalidParameterSnafu {
            message: "the order of an L-p distance must be at least 1"
        }
    );
    let diffs = mass_differences(a, b);
    // Scaled by the largest difference so that high orders do not underflow.
    let largest = diffs.iter().cloned().fold(0.0, f64::max);
    if largest == 0.0 {
        return Ok(0.0);
    }
    let total: f64 = diffs.iter().map(|d| (d / largest).powf(p as f64)).sum();
    Ok(largest * total.powf(1.0 / p as f64))
}

/// The largest difference of mass over all the rankings.
pub fn linf_dist(a: &PreferenceProfile, b: &PreferenceProfile) -> f64 {
    mass_differences(a, b).into_iter().fold(0.0, f64::max)
}
