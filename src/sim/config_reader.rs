use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use electorate::*;
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::sim::*;

/// The JSON description of a generation run.
///
/// Which keys are needed depends on the generator. The bloc models take
/// either `prefIntervalByBloc` or the cohesion parameters (`slateToCandidates`,
/// `cohesion` and `alphas`).
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub generator: String,
    pub candidates: Option<Vec<String>>,
    #[serde(rename = "ballotLength")]
    pub ballot_length: Option<usize>,
    #[serde(rename = "numberOfBallots")]
    pub number_of_ballots: u64,
    pub seed: Option<u64>,
    #[serde(rename = "prefIntervalByBloc")]
    pub pref_interval_by_bloc: Option<PrefIntervalByBloc>,
    #[serde(rename = "blocVoterProp")]
    pub bloc_voter_prop: Option<BlocVoterProp>,
    #[serde(rename = "slateToCandidates")]
    pub slate_to_candidates: Option<SlateToCandidates>,
    pub cohesion: Option<BTreeMap<String, f64>>,
    pub alphas: Option<BTreeMap<String, BTreeMap<String, f64>>>,
    #[serde(rename = "blocCrossoverRate")]
    pub bloc_crossover_rate: Option<CrossoverRates>,
    pub alpha: Option<f64>,
    pub point: Option<PrefInterval>,
    #[serde(rename = "ballotTypesPath")]
    pub ballot_types_path: Option<String>,
    #[serde(rename = "labelMap")]
    pub label_map: Option<BTreeMap<String, String>>,
    pub apportionment: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

fn required<'a, T>(field: &'a Option<T>, key: &str) -> SimResult<&'a T> {
    match field {
        Some(x) => Ok(x),
        None => whatever!("the configuration needs the key `{}`", key),
    }
}

impl GenerationConfig {
    pub fn apportionment(&self) -> SimResult<Apportionment> {
        match self.apportionment.as_deref() {
            None | Some("largestRemainder") => Ok(Apportionment::LargestRemainder),
            Some("roundHalfUp") => Ok(Apportionment::round_half_up()),
            Some(x) => whatever!("unknown apportionment: {}", x),
        }
    }

    /// The declared candidates or, failing that, the candidates of the slates.
    pub fn candidates(&self) -> SimResult<Vec<String>> {
        match (&self.candidates, &self.slate_to_candidates) {
            (Some(cands), _) => Ok(cands.clone()),
            (None, Some(slates)) => Ok(slate_candidates(slates)),
            (None, None) => whatever!("the configuration needs `candidates` or `slateToCandidates`"),
        }
    }

    pub fn bloc_params(&self) -> SimResult<BlocParams> {
        Ok(BlocParams {
            slate_to_candidates: required(&self.slate_to_candidates, "slateToCandidates")?.clone(),
            bloc_voter_prop: required(&self.bloc_voter_prop, "blocVoterProp")?.clone(),
            cohesion: required(&self.cohesion, "cohesion")?.clone(),
            alphas: required(&self.alphas, "alphas")?.clone(),
        })
    }

    fn crossover_rates(&self) -> CrossoverRates {
        self.bloc_crossover_rate.clone().unwrap_or_default()
    }
}

pub fn read_config(path: &str) -> SimResult<GenerationConfig> {
    let config_str = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: GenerationConfig =
        serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    Ok(config)
}

/// Builds the generator described by the configuration.
///
/// Relative paths in the configuration are resolved against `root_dir`. The
/// random generator is only used when preference intervals are derived from
/// cohesion parameters.
pub fn build_generator<R: Rng + ?Sized>(
    config: &GenerationConfig,
    root_dir: &Path,
    rng: &mut R,
) -> SimResult<Generator> {
    let len = config.ballot_length;
    let apportionment = config.apportionment()?;
    let res: Generator = match config.generator.as_str() {
        "ic" => ImpartialCulture::new(&config.candidates()?, len)
            .context(GeneratingSnafu {})?
            .into(),
        "iac" => ImpartialAnonymousCulture::new(&config.candidates()?, len)
            .context(GeneratingSnafu {})?
            .into(),
        "simplex" => {
            let cands = config.candidates()?;
            let simplex = match (&config.point, config.alpha) {
                (Some(point), _) => BallotSimplex::from_point(point, len, &cands),
                (None, Some(alpha)) => BallotSimplex::from_alpha(alpha, &cands, len),
                (None, None) => whatever!("the simplex model needs `alpha` or `point`"),
            };
            simplex.context(GeneratingSnafu {})?.into()
        }
        "plackett_luce" => {
            let pl = match &config.pref_interval_by_bloc {
                Some(intervals) => PlackettLuce::new(
                    &config.candidates()?,
                    len,
                    intervals,
                    required(&config.bloc_voter_prop, "blocVoterProp")?,
                ),
                None => PlackettLuce::from_params(&config.bloc_params()?, len, rng),
            };
            pl.context(GeneratingSnafu {})?
                .with_apportionment(apportionment)
                .into()
        }
        "bradley_terry" => {
            let bt = match &config.pref_interval_by_bloc {
                Some(intervals) => BradleyTerry::new(
                    &config.candidates()?,
                    len,
                    intervals,
                    required(&config.bloc_voter_prop, "blocVoterProp")?,
                ),
                None => BradleyTerry::from_params(&config.bloc_params()?, len, rng),
            };
            bt.context(GeneratingSnafu {})?
                .with_apportionment(apportionment)
                .into()
        }
        "alternating_crossover" => {
            let rates = config.crossover_rates();
            let ac = match &config.pref_interval_by_bloc {
                Some(intervals) => AlternatingCrossover::new(
                    &config.candidates()?,
                    len,
                    required(&config.slate_to_candidates, "slateToCandidates")?,
                    intervals,
                    required(&config.bloc_voter_prop, "blocVoterProp")?,
                    &rates,
                ),
                None => AlternatingCrossover::from_params(&config.bloc_params()?, &rates, len, rng),
            };
            ac.context(GeneratingSnafu {})?
                .with_apportionment(apportionment)
                .into()
        }
        "cambridge" => {
            let rates = config.crossover_rates();
            let types_path = root_dir.join(required(&config.ballot_types_path, "ballotTypesPath")?);
            info!("Attempting to read ballot types {:?}", types_path);
            let table = BallotTypeTable::from_path(&types_path, config.label_map.as_ref())
                .context(GeneratingSnafu {})?;
            let cambridge = match &config.pref_interval_by_bloc {
                Some(intervals) => CambridgeSampler::new(
                    &config.candidates()?,
                    len,
                    required(&config.slate_to_candidates, "slateToCandidates")?,
                    intervals,
                    required(&config.bloc_voter_prop, "blocVoterProp")?,
                    &rates,
                    table,
                ),
                None => {
                    CambridgeSampler::from_params(&config.bloc_params()?, &rates, table, len, rng)
                }
            };
            cambridge.context(GeneratingSnafu {})?
                .with_apportionment(apportionment)
                .into()
        }
        "one_dim_spatial" => OneDimSpatial::new(&config.candidates()?, len)
            .context(GeneratingSnafu {})?
            .into(),
        x => whatever!("unknown generator: {}", x),
    };
    debug!("build_generator: {} model ready", res.name());
    Ok(res)
}

pub fn read_summary(path: &str) -> SimResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config_dir() -> String {
        format!("{}/testdata/configs", env!("CARGO_MANIFEST_DIR"))
    }

    fn build(name: &str, seed: u64) -> SimResult<Generator> {
        let config = read_config(&format!("{}/{}", config_dir(), name))?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        build_generator(&config, Path::new(&config_dir()), &mut rng)
    }

    #[test]
    fn configs_are_read() {
        let config = read_config(&format!("{}/plackett_luce.json", config_dir())).unwrap();
        assert_eq!(config.generator, "plackett_luce");
        assert_eq!(config.number_of_ballots, 500);
        assert_eq!(config.ballot_length, Some(3));
        assert_eq!(
            config.candidates().unwrap(),
            vec!["A2", "B2", "A1", "B1", "C1"]
        );
        assert_eq!(config.bloc_params().unwrap().cohesion["D"], 0.8);
        assert!(matches!(
            config.apportionment().unwrap(),
            Apportionment::LargestRemainder
        ));
    }

    #[test]
    fn every_fixture_builds() {
        assert_eq!(build("plackett_luce.json", 1).unwrap().name(), "plackett_luce");
        assert_eq!(build("bradley_terry.json", 1).unwrap().name(), "bradley_terry");
        assert_eq!(build("cambridge.json", 1).unwrap().name(), "cambridge");
        assert_eq!(build("simplex.json", 1).unwrap().name(), "simplex");
    }

    #[test]
    fn derived_intervals_follow_the_seed() {
        let a = build("plackett_luce.json", 4).unwrap();
        let b = build("plackett_luce.json", 4).unwrap();
        assert_eq!(a.pref_interval_by_bloc(), b.pref_interval_by_bloc());
        let intervals = a.pref_interval_by_bloc().unwrap();
        let total: f64 = intervals["R"].values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bad_configs() {
        let err = build("unknown_generator.json", 1).unwrap_err();
        assert!(err.to_string().contains("borda_culture"));
        let err = build("missing_cohesion.json", 1).unwrap_err();
        assert!(err.to_string().contains("cohesion"));
        assert!(matches!(
            read_config("no_such_config.json"),
            Err(SimError::OpeningJson { .. })
        ));
    }
}
