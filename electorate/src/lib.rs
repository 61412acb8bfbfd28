/*!
Synthetic electorates for ranked-choice elections.

This crate draws ranked ballots from the statistical voter models that are
common in computational social choice, and stores them as weighted,
deduplicated [`PreferenceProfile`]s.

```
use electorate::*;
use rand::SeedableRng;

let candidates: Vec<String> = vec!["Alice".into(), "Bob".into(), "Charlie".into()];
let ic = ImpartialCulture::new(&candidates, None)?;
let mut rng = rand::rngs::StdRng::seed_from_u64(42);
let profile = ic.generate_profile(100, &mut rng)?;
assert_eq!(profile.num_ballots(), weight_of(100));
# Ok::<(), GeneratorError>(())
```

The models and the formats of their inputs are described in the [manual].
*/

mod apportion;
mod ballot;
mod builder;
mod config;
mod distance;
pub mod generator;
mod interval;
pub mod manual;
mod profile;
mod sampling;

pub use crate::apportion::{round_num, Apportionment};
pub use crate::ballot::{rank_label, single, undervote, weight_of, Ballot, Choice, Rank};
pub use crate::builder::ProfileBuilder;
pub use crate::config::*;
pub use crate::distance::{linf_dist, lp_dist};
pub use crate::generator::*;
pub use crate::interval::{
    check_bloc_params, check_bloc_voter_prop, check_pref_intervals, check_slates,
    derive_pref_intervals, normalize_interval, slate_candidates,
};
pub use crate::profile::PreferenceProfile;
pub use crate::sampling::{
    categorical, permutations, plackett_luce_order, plackett_luce_prob, sample_dirichlet,
};
