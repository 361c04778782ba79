use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rastermask")]
#[command(about = "Crop two rasters to their intersection and mask both by the secondary's valid pixels")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(value_name = "CONFIG", default_value = "./data/config/intersection.json")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
