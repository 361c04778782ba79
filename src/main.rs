use clap::Parser;
use env_logger::Env;
use log::{error, info};
use std::path::Path;
use std::process::ExitCode;

use rastermask::{Config, IntersectionProcessor, utils};

mod cli;
use cli::Args;

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match run(&args.config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("Loading configuration from {}", config_path.display());
    let config = Config::from_file(config_path)?;

    let processor = IntersectionProcessor::new(config);
    info!("{}", processor);

    let report = processor.process()?;
    info!("{}", report);

    utils::log_raster_summary(&report.primary_output)?;
    utils::log_raster_summary(&report.secondary_output)?;

    info!("Cropping and masking complete");
    Ok(())
}
