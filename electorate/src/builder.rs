use num_rational::BigRational;
use num_traits::Zero;
use snafu::ensure;

use std::collections::BTreeSet;

use crate::ballot::{weight_of, Ballot, Choice, Rank};
use crate::config::*;
use crate::profile::PreferenceProfile;

/// A builder for assembling a profile from raw rankings.
///
/// Rankings are added one by one (possibly with a weight and a voter id) and
/// merged when the profile is built.
///
/// ```
/// use electorate::ProfileBuilder;
/// # use electorate::GeneratorError;
///
/// let mut builder = ProfileBuilder::new()
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_ranking_simple(&["Anna".to_string(), "".to_string()])?;
/// builder.add_ranking_simple(&["Anna".to_string(), "".to_string()])?;
///
/// let profile = builder.build();
/// assert_eq!(profile.ballots().len(), 1);
///
/// # Ok::<(), GeneratorError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProfileBuilder {
    _candidates: Option<Vec<String>>,
    _ballots: Vec<Ballot>,
}

impl ProfileBuilder {
    pub fn new() -> ProfileBuilder {
        ProfileBuilder::default()
    }

    /// Declares the candidates. Rankings mentioning other names are rejected,
    /// including the ones added before this call.
    pub fn candidates(self, cands: &[String]) -> GenResult<ProfileBuilder> {
        crate::generator::check_candidates(cands)?;
        for b in self._ballots.iter() {
            check_known(b, cands)?;
        }
        Ok(ProfileBuilder {
            _candidates: Some(cands.to_vec()),
            _ballots: self._ballots,
        })
    }

    /// Adds a ranking of weight one, with one name per position.
    ///
    /// An empty name is an undervote.
    pub fn add_ranking_simple(&mut self, names: &[String]) -> GenResult<()> {
        let positions: Vec<Vec<String>> = names
            .iter()
            .map(|n| {
                if n.is_empty() {
                    vec![]
                } else {
                    vec![n.clone()]
                }
            })
            .collect();
        self.add_ranking(&positions, weight_of(1), None)
    }

    /// Adds a ranking with a weight and an optional voter identifier.
    ///
    /// positions: the names at each position, in order. An empty position is
    /// an undervote, more than one name is a tie.
    pub fn add_ranking(
        &mut self,
        positions: &[Vec<String>],
        weight: BigRational,
        voter: Option<&str>,
    ) -> GenResult<()> {
        ensure!(
            weight >= BigRational::zero(),
            InvalidParameterSnafu {
                message: format!("negative ballot weight {}", weight)
            }
        );
        let mut ranking: Vec<Rank> = Vec::new();
        for names in positions {
            let rank: Rank = if names.is_empty() {
                BTreeSet::from([Choice::Undervote])
            } else {
                names.iter().map(|n| Choice::from(n.as_str())).collect()
            };
            ranking.push(rank);
        }
        let mut ballot = Ballot::new(ranking, weight);
        if let Some(v) = voter {
            ballot = ballot.with_voters(&[v]);
        }
        self.add_ballot(ballot)
    }

    pub fn add_ballot(&mut self, ballot: Ballot) -> GenResult<()> {
        if let Some(cands) = self._candidates.as_deref() {
            check_known(&ballot, cands)?;
        }
        self._ballots.push(ballot);
        Ok(())
    }

    pub fn build(self) -> PreferenceProfile {
        // Every ballot was checked against the declared candidates.
        PreferenceProfile::from_checked(self._ballots, self._candidates)
    }
}

fn check_known(ballot: &Ballot, cands: &[String]) -> GenResult<()> {
    match ballot
        .candidates()
        .find(|name| !cands.iter().any(|c| c.as_str() == *name))
    {
        Some(name) => UnknownCandidateSnafu { name }.fail(),
        None => Ok(()),
    }
}
