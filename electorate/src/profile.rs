use log::debug;
use num_rational::BigRational;
use num_traits::Zero;

use std::collections::{HashMap, HashSet};

use crate::ballot::{Ballot, Rank};
use crate::config::*;

/// A deduplicated, weighted collection of ballots.
///
/// A profile is a value: it is never modified after construction. All the
/// ballots have distinct rankings, and the total weight is the number of
/// ballots cast (`num_ballots`).
///
/// Two profiles are equal when they declare the same candidates and hold the
/// same ballots with the same weights, in any order.
#[derive(Debug, Clone, Default)]
pub struct PreferenceProfile {
    ballots: Vec<Ballot>,
    candidates: Option<Vec<String>>,
}

/// Merges the ballots sharing a ranking. Distinct rankings are kept in the
/// order of their first appearance.
pub(crate) fn aggregate<I: IntoIterator<Item = Ballot>>(ballots: I) -> Vec<Ballot> {
    let mut index: HashMap<Vec<Rank>, usize> = HashMap::new();
    let mut res: Vec<Ballot> = Vec::new();
    for b in ballots {
        match index.get(&b.ranking) {
            Some(idx) => res[*idx].absorb(&b),
            None => {
                index.insert(b.ranking.clone(), res.len());
                res.push(b);
            }
        }
    }
    res
}

impl PreferenceProfile {
    /// Builds a profile, inferring the candidates from the ballots.
    pub fn new(ballots: Vec<Ballot>) -> PreferenceProfile {
        let ballots = aggregate(ballots);
        debug!("PreferenceProfile::new: {} distinct ballots", ballots.len());
        PreferenceProfile {
            ballots,
            candidates: None,
        }
    }

    /// Builds a profile over an explicit set of candidates.
    ///
    /// Fails if a ballot mentions a candidate outside of this set.
    pub fn with_candidates(
        ballots: Vec<Ballot>,
        candidates: &[String],
    ) -> GenResult<PreferenceProfile> {
        let known: HashSet<&str> = candidates.iter().map(|c| c.as_str()).collect();
        for b in ballots.iter() {
            if let Some(name) = b.candidates().find(|c| !known.contains(c)) {
                return UnknownCandidateSnafu { name }.fail();
            }
        }
        Ok(PreferenceProfile {
            ballots: aggregate(ballots),
            candidates: Some(candidates.to_vec()),
        })
    }

    pub(crate) fn from_checked(
        ballots: Vec<Ballot>,
        candidates: Option<Vec<String>>,
    ) -> PreferenceProfile {
        PreferenceProfile {
            ballots: aggregate(ballots),
            candidates,
        }
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    pub fn is_empty(&self) -> bool {
        self.ballots.is_empty()
    }

    /// The total weight of the ballots, as an exact number.
    pub fn num_ballots(&self) -> BigRational {
        self.ballots
            .iter()
            .fold(BigRational::zero(), |acc, b| acc + b.weight.clone())
    }

    /// The declared candidates or, if none were declared, the candidates in
    /// the order in which they first appear in the ballots.
    pub fn candidates(&self) -> Vec<String> {
        if let Some(cands) = &self.candidates {
            return cands.clone();
        }
        let mut seen: HashSet<&str> = HashSet::new();
        let mut res: Vec<String> = Vec::new();
        for b in self.ballots.iter() {
            for c in b.candidates() {
                if seen.insert(c) {
                    res.push(c.to_string());
                }
            }
        }
        res
    }

    /// The share of the total weight carried by each ranking.
    ///
    /// An empty profile (or a profile with zero total weight) has an empty
    /// distribution.
    pub fn to_distribution(&self) -> HashMap<Vec<Rank>, BigRational> {
        let total = self.num_ballots();
        if total.is_zero() {
            return HashMap::new();
        }
        self.ballots
            .iter()
            .map(|b| (b.ranking.clone(), b.weight.clone() / total.clone()))
            .collect()
    }

    /// The `k` heaviest ballots. Ties keep the order of the profile.
    pub fn head(&self, k: usize) -> Vec<&Ballot> {
        let mut sorted: Vec<&Ballot> = self.ballots.iter().collect();
        // Stable sort: equal weights stay in order of first appearance.
        sorted.sort_by(|a, b| b.weight.cmp(&a.weight));
        sorted.truncate(k);
        sorted
    }

    /// A new profile in which ballots of weight zero are dropped and equal
    /// rankings are merged.
    pub fn condense(&self) -> PreferenceProfile {
        PreferenceProfile {
            ballots: aggregate(
                self.ballots
                    .iter()
                    .filter(|b| b.has_positive_weight())
                    .cloned(),
            ),
            candidates: self.candidates.clone(),
        }
    }

    /// True if both profiles hold the same rankings with the same weights, in
    /// any order.
    pub fn same_ballots(&self, other: &PreferenceProfile) -> bool {
        let theirs: HashMap<&[Rank], &BigRational> = other
            .ballots
            .iter()
            .map(|b| (b.ranking.as_slice(), &b.weight))
            .collect();
        self.ballots.len() == other.ballots.len()
            && self
                .ballots
                .iter()
                .all(|b| theirs.get(b.ranking.as_slice()) == Some(&&b.weight))
    }
}

impl PartialEq for PreferenceProfile {
    fn eq(&self, other: &PreferenceProfile) -> bool {
        self.candidates == other.candidates && self.same_ballots(other)
    }
}

impl Eq for PreferenceProfile {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::{single, undervote, weight_of};
    use std::collections::BTreeSet;

    fn ballot(ranking: Vec<Rank>, voter: &str) -> Ballot {
        Ballot::new(ranking, weight_of(1)).with_voters(&[voter])
    }

    #[test]
    fn identical_rankings_are_merged() {
        let p = PreferenceProfile::new(vec![
            ballot(vec![single("c"), undervote(), undervote()], "abe"),
            ballot(vec![undervote(), single("a"), undervote()], "dave"),
            ballot(vec![single("c"), undervote(), undervote()], "ben"),
            ballot(vec![single("c"), undervote(), undervote()], "carl"),
        ]);
        assert_eq!(p.ballots().len(), 2);
        assert_eq!(p.num_ballots(), weight_of(4));
        let first = &p.ballots()[0];
        assert_eq!(first.weight, weight_of(3));
        assert_eq!(
            first.voters,
            Some(BTreeSet::from([
                "abe".to_string(),
                "ben".to_string(),
                "carl".to_string()
            ]))
        );
    }

    #[test]
    fn empty_and_blank_ballots_are_kept() {
        let p = PreferenceProfile::new(vec![
            Ballot::new(vec![], weight_of(1)),
            Ballot::new(vec![undervote(), undervote()], weight_of(2)),
        ]);
        assert_eq!(p.ballots().len(), 2);
        assert_eq!(p.num_ballots(), weight_of(3));
        assert!(p.candidates().is_empty());
    }

    #[test]
    fn fractional_weights_stay_exact() {
        let third = BigRational::new(1.into(), 3.into());
        let p = PreferenceProfile::new(vec![
            Ballot::from_names(&["a"]).with_weight(third.clone()),
            Ballot::from_names(&["a"]).with_weight(third.clone()),
            Ballot::from_names(&["b"]).with_weight(third),
        ]);
        assert_eq!(p.num_ballots(), weight_of(1));
        assert_eq!(p.ballots()[0].weight, BigRational::new(2.into(), 3.into()));
    }

    #[test]
    fn candidates_are_inferred_in_order() {
        let p = PreferenceProfile::new(vec![
            Ballot::from_names(&["b", "a"]),
            Ballot::from_names(&["c", "b"]),
        ]);
        assert_eq!(p.candidates(), vec!["b", "a", "c"]);
    }

    #[test]
    fn unknown_candidates_are_rejected() {
        let cands = vec!["a".to_string(), "b".to_string()];
        let err = PreferenceProfile::with_candidates(vec![Ballot::from_names(&["a", "z"])], &cands)
            .unwrap_err();
        assert!(err.is_parameter_error());
        let ok = PreferenceProfile::with_candidates(
            vec![Ballot::new(vec![single("a"), undervote()], weight_of(1))],
            &cands,
        )
        .unwrap();
        assert_eq!(ok.candidates(), cands);
    }

    #[test]
    fn head_and_condense() {
        let p = PreferenceProfile::new(vec![
            Ballot::from_names(&["a"]).with_weight(weight_of(1)),
            Ballot::from_names(&["b"]).with_weight(weight_of(5)),
            Ballot::from_names(&["c"]).with_weight(weight_of(0)),
            Ballot::from_names(&["d"]).with_weight(weight_of(1)),
        ]);
        let top: Vec<String> = p.head(2).iter().map(|b| b.to_string()).collect();
        assert_eq!(top, vec!["b (5)", "a (1)"]);
        let condensed = p.condense();
        assert_eq!(condensed.ballots().len(), 3);
        assert_eq!(condensed.num_ballots(), p.num_ballots());
    }

    #[test]
    fn same_ballots_compares_weights_in_any_order() {
        let a = PreferenceProfile::new(vec![
            Ballot::from_names(&["a", "b"]).with_weight(weight_of(2)),
            Ballot::from_names(&["b"]),
        ]);
        let b = PreferenceProfile::new(vec![
            Ballot::from_names(&["b"]).with_voters(&["v"]),
            Ballot::from_names(&["a", "b"]),
            Ballot::from_names(&["a", "b"]),
        ]);
        assert!(a.same_ballots(&b));
        assert_eq!(a, b);

        let lighter = PreferenceProfile::new(vec![
            Ballot::from_names(&["a", "b"]),
            Ballot::from_names(&["b"]),
        ]);
        assert!(!a.same_ballots(&lighter));
        assert_ne!(a, lighter);

        let declared = PreferenceProfile::with_candidates(
            a.ballots().to_vec(),
            &["a".to_string(), "b".to_string()],
        )
        .unwrap();
        assert!(declared.same_ballots(&a));
        assert_ne!(declared, a);
    }

    #[test]
    fn distribution_is_normalized() {
        let p = PreferenceProfile::new(vec![
            Ballot::from_names(&["a"]).with_weight(weight_of(3)),
            Ballot::from_names(&["b"]),
        ]);
        let d = p.to_distribution();
        assert_eq!(
            d.get(&vec![single("a")]),
            Some(&BigRational::new(3.into(), 4.into()))
        );
        assert!(PreferenceProfile::default().to_distribution().is_empty());
    }
}
