use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

use std::collections::BTreeSet;
use std::fmt::Display;
use std::hash::{Hash, Hasher};

/// One entry in a position of a ranking.
///
/// A position that was left blank by the voter is kept as an explicit
/// `Undervote` rather than removed, so that the ranks after it keep their
/// index.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub enum Choice {
    Undervote,
    Candidate(String),
}

impl Choice {
    pub fn candidate(&self) -> Option<&str> {
        match self {
            Choice::Candidate(name) => Some(name.as_str()),
            Choice::Undervote => None,
        }
    }
}

impl From<&str> for Choice {
    fn from(name: &str) -> Choice {
        Choice::Candidate(name.to_string())
    }
}

impl From<String> for Choice {
    fn from(name: String) -> Choice {
        Choice::Candidate(name)
    }
}

impl Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Choice::Candidate(name) => write!(f, "{}", name),
            Choice::Undervote => write!(f, "~"),
        }
    }
}

/// A position in a ranking. More than one choice means a tie.
pub type Rank = BTreeSet<Choice>;

/// Builds a position holding a single candidate.
pub fn single(name: &str) -> Rank {
    BTreeSet::from([Choice::from(name)])
}

/// Builds a position left blank by the voter.
pub fn undervote() -> Rank {
    BTreeSet::from([Choice::Undervote])
}

/// An exact integer weight.
pub fn weight_of(count: u64) -> BigRational {
    BigRational::from_integer(BigInt::from(count))
}

/// A ranked vote, together with the number of voters who cast it.
///
/// The weight is an exact rational number. Two ballots with the same ranking
/// describe the same vote and are merged when they end up in the same profile:
/// equality and hashing only look at the ranking.
#[derive(Debug, Clone)]
pub struct Ballot {
    pub ranking: Vec<Rank>,
    pub weight: BigRational,
    pub voters: Option<BTreeSet<String>>,
    pub id: Option<String>,
}

impl Ballot {
    pub fn new(ranking: Vec<Rank>, weight: BigRational) -> Ballot {
        Ballot {
            ranking,
            weight,
            voters: None,
            id: None,
        }
    }

    /// A ballot of weight one with a single candidate at each position.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Ballot {
        Ballot::new(
            names.iter().map(|n| single(n.as_ref())).collect(),
            BigRational::one(),
        )
    }

    pub fn with_weight(self, weight: BigRational) -> Ballot {
        Ballot { weight, ..self }
    }

    pub fn with_voters<S: AsRef<str>>(self, voters: &[S]) -> Ballot {
        Ballot {
            voters: Some(voters.iter().map(|v| v.as_ref().to_string()).collect()),
            ..self
        }
    }

    pub fn with_id(self, id: &str) -> Ballot {
        Ballot {
            id: Some(id.to_string()),
            ..self
        }
    }

    /// True if both ballots rank the same choices at every position. Same as
    /// `==`.
    pub fn same_ranking(&self, other: &Ballot) -> bool {
        self.ranking == other.ranking
    }

    /// The candidates mentioned by this ballot, in ranking order.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.ranking
            .iter()
            .flat_map(|rank| rank.iter().filter_map(|c| c.candidate()))
    }

    /// True if no position holds an actual candidate.
    pub fn is_blank(&self) -> bool {
        self.candidates().next().is_none()
    }

    /// Folds another ballot with the same ranking into this one.
    pub(crate) fn absorb(&mut self, other: &Ballot) {
        debug_assert!(self.same_ranking(other));
        self.weight += other.weight.clone();
        self.voters = match (self.voters.take(), &other.voters) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend(theirs.iter().cloned());
                Some(mine)
            }
            (Some(mine), None) => Some(mine),
            (None, Some(theirs)) => Some(theirs.clone()),
            (None, None) => None,
        };
        // The identifier of a merged ballot is ambiguous.
        if self.id != other.id {
            self.id = None;
        }
    }

    pub(crate) fn has_positive_weight(&self) -> bool {
        self.weight > BigRational::zero()
    }
}

impl PartialEq for Ballot {
    fn eq(&self, other: &Ballot) -> bool {
        self.same_ranking(other)
    }
}

impl Eq for Ballot {}

impl Hash for Ballot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ranking.hash(state);
    }
}

/// Formats a position as `a`, `a=b` for ties or `~` for an undervote.
pub fn rank_label(rank: &Rank) -> String {
    rank.iter()
        .map(|c| c.to_string())
        .collect::<Vec<String>>()
        .join("=")
}

impl Display for Ballot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ranks: Vec<String> = self.ranking.iter().map(rank_label).collect();
        write!(f, "{} ({})", ranks.join(">"), self.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undervotes_sort_before_candidates() {
        let mut rank = single("b");
        rank.insert(Choice::Undervote);
        rank.insert(Choice::from("a"));
        let labels: Vec<String> = rank.iter().map(|c| c.to_string()).collect();
        assert_eq!(labels, vec!["~", "a", "b"]);
    }

    #[test]
    fn absorb_sums_weights_and_unions_voters() {
        let mut a = Ballot::from_names(&["c", "a"]).with_voters(&["abe"]);
        let b = Ballot::from_names(&["c", "a"])
            .with_voters(&["ben", "abe"])
            .with_weight(BigRational::new(3.into(), 2.into()));
        a.absorb(&b);
        assert_eq!(a.weight, BigRational::new(5.into(), 2.into()));
        assert_eq!(
            a.voters,
            Some(BTreeSet::from(["abe".to_string(), "ben".to_string()]))
        );
    }

    #[test]
    fn equality_ignores_weight_and_voters() {
        let plain = Ballot::from_names(&["a", "b"]);
        let heavy = Ballot::from_names(&["a", "b"])
            .with_weight(weight_of(2))
            .with_voters(&["v"])
            .with_id("x");
        assert!(plain.same_ranking(&heavy));
        assert_eq!(plain, heavy);
        assert_ne!(plain, Ballot::from_names(&["b", "a"]));

        let mut tie_ab = single("a");
        tie_ab.insert(Choice::from("b"));
        let mut tie_ba = single("b");
        tie_ba.insert(Choice::from("a"));
        assert_eq!(
            Ballot::new(vec![tie_ab], weight_of(1)),
            Ballot::new(vec![tie_ba], weight_of(3))
        );

        let set: std::collections::HashSet<Ballot> = [plain, heavy].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn blank_ballot() {
        let b = Ballot::new(vec![undervote(), undervote()], weight_of(1));
        assert!(b.is_blank());
        assert_eq!(b.to_string(), "~>~ (1)");
        assert!(!Ballot::from_names(&["x"]).is_blank());
    }
}
