use log::{debug, info, warn};

use electorate::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::io;
use std::path::Path;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::sim::config_reader::*;
use crate::sim::io_blt::load_blt;
use crate::sim::io_common::LoadError;
use crate::sim::io_csv::{load_csv, write_csv, CsvOptions};

pub mod config_reader;
pub mod io_blt;
pub mod io_common;
pub mod io_csv;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SimError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing the profile: {source}"))]
    WritingCsv { source: csv::Error },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("{source}"))]
    Generating { source: GeneratorError },
    #[snafu(display("Error loading {path}: {source}"))]
    Loading { source: LoadError, path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SimResult<T> = Result<T, SimError>;

/// What to do with a generated profile, on top of what the configuration
/// says.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Where to write the profile: a path or `stdout`. Overrides the
    /// `outputPath` of the configuration.
    pub out: Option<String>,
    /// Where to write the JSON summary: a path or `stdout`.
    pub summary: Option<String>,
    /// A reference summary. The run fails if the summary differs.
    pub reference: Option<String>,
    /// A CSV or BLT profile to measure the distance to.
    pub compare: Option<String>,
    /// Overrides the seed of the configuration.
    pub seed: Option<u64>,
}

const STDOUT: &str = "stdout";

const NUM_TOP_BALLOTS: usize = 10;

fn write_output(path: &str, contents: &[u8]) -> SimResult<()> {
    if path == STDOUT {
        let mut out = io::stdout();
        io::Write::write_all(&mut out, contents).context(WritingOutputSnafu { path })?;
    } else {
        fs::write(path, contents).context(WritingOutputSnafu { path })?;
    }
    Ok(())
}

/// Reads a profile written by `synthvote` (CSV) or a BLT file.
pub fn load_profile(path: &str) -> SimResult<PreferenceProfile> {
    let res = if path.ends_with(".blt") {
        load_blt(path).map(|(p, _)| p)
    } else {
        let opts = CsvOptions {
            id_col: Some(0),
            weight_col: Some(1),
        };
        load_csv(path, &opts)
    };
    res.context(LoadingSnafu { path })
}

fn compare_profiles(
    path: &str,
    profile: &PreferenceProfile,
    other: &PreferenceProfile,
) -> SimResult<JSValue> {
    let l1 = lp_dist(profile, other, 1).context(GeneratingSnafu {})?;
    let linf = linf_dist(profile, other);
    info!(
        "Distance to {}: L1 {:.6}, L-infinity {:.6}",
        path, l1, linf
    );
    Ok(json!({ "path": path, "l1": l1, "linf": linf }))
}

fn build_summary_js(
    generator: &Generator,
    seed: u64,
    profile: &PreferenceProfile,
    comparison: Option<JSValue>,
) -> JSValue {
    let top: Vec<JSValue> = profile
        .head(NUM_TOP_BALLOTS)
        .iter()
        .map(|b| {
            let ranking: Vec<String> = b.ranking.iter().map(rank_label).collect();
            json!({"ranking": ranking, "weight": b.weight.to_string()})
        })
        .collect();
    let mut js = json!({
        "generator": generator.name(),
        "seed": seed,
        "numberOfBallots": profile.num_ballots().to_string(),
        "candidates": profile.candidates(),
        "distinctBallots": profile.ballots().len(),
        "topBallots": top,
    });
    if let Some(intervals) = generator.pref_interval_by_bloc() {
        js["prefIntervalByBloc"] = json!(intervals);
    }
    if let Some(c) = comparison {
        js["comparison"] = c;
    }
    js
}

/// Runs the generation described by a configuration file.
pub fn run_generation(config_path: &str, opts: &RunOptions) -> SimResult<()> {
    let config_p = Path::new(config_path);
    let config = read_config(config_path)?;
    info!("config: {:?}", config);
    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;

    let seed = match opts.seed.or(config.seed) {
        Some(s) => s,
        None => {
            let s: u64 = rand::random();
            info!("No seed provided, using seed {}", s);
            s
        }
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let generator = build_generator(&config, root_p, &mut rng)?;
    let profile = generator
        .generate_profile(config.number_of_ballots, &mut rng)
        .context(GeneratingSnafu {})?;
    info!(
        "Generated {} ballots, {} distinct",
        profile.num_ballots(),
        profile.ballots().len()
    );

    let out_path: Option<String> = match (&opts.out, &config.output_path) {
        (Some(p), _) => Some(p.clone()),
        (None, Some(p)) if p == STDOUT => Some(p.clone()),
        (None, Some(p)) => Some(root_p.join(p).display().to_string()),
        (None, None) => None,
    };
    if let Some(p) = out_path {
        info!("Writing profile to {}", p);
        let mut buffer: Vec<u8> = Vec::new();
        write_csv(&profile, &mut buffer).context(WritingCsvSnafu {})?;
        write_output(&p, &buffer)?;
    } else {
        debug!("No output path, the profile is not written");
    }

    let comparison = match &opts.compare {
        Some(p) => {
            let other = load_profile(p)?;
            Some(compare_profiles(p, &profile, &other)?)
        }
        None => None,
    };

    let summary_js = build_summary_js(&generator, seed, &profile, comparison);
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    if let Some(p) = &opts.summary {
        write_output(p, format!("{}\n", pretty_js_stats).as_bytes())?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &opts.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between the generated summary and the reference summary")
        }
    }

    Ok(())
}
