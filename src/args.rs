use clap::Parser;

/// This program generates synthetic ranked-choice electorates.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the generation: the model, its parameters and the number of ballots.
    /// For more information about the file format, read the documentation of the electorate crate.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path, 'stdout' or empty) If specified, the profile will be written in CSV format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, 'stdout' or empty) If specified, a summary of the profile will be written in JSON format to the
    /// given location.
    #[clap(short, long, value_parser)]
    pub summary: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, synthvote will check that the summary of the
    /// generated profile matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path) A profile in CSV (as written by synthvote) or BLT format. If provided, the distance between
    /// the generated profile and this profile is reported in the summary.
    #[clap(long, value_parser)]
    pub compare: Option<String>,

    /// (integer) The seed of the random generator. Overrides the seed of the configuration.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
