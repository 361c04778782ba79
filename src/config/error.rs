use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} must not be empty")]
    EmptyPath(&'static str),

    #[error("primary_output_path and secondary_output_path must differ")]
    DuplicateOutput,

    #[error("Output {0} would overwrite an input raster")]
    OutputOverwritesInput(PathBuf),
}
