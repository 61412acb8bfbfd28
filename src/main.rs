mod args;
mod sim;

use clap::Parser;
use log::{debug, LevelFilter};
use snafu::ErrorCompat;

use crate::sim::RunOptions;

fn main() {
    let args = args::Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
    debug!("args: {:?}", args);

    let opts = RunOptions {
        out: args.out.clone(),
        summary: args.summary.clone(),
        reference: args.reference.clone(),
        compare: args.compare.clone(),
        seed: args.seed,
    };

    let res = sim::run_generation(&args.config, &opts);
    if let Err(e) = res {
        eprintln!("An error occurred: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
