use std::path::PathBuf;
use thiserror::Error;

use crate::bbox::Bbox;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Cannot open raster source {path}: {source}")]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: gdal::errors::GdalError,
    },

    #[error("Rasters do not overlap: intersection {0} is empty")]
    InvalidIntersection(Bbox),

    #[error(
        "CRS mismatch between primary ({primary}) and secondary ({secondary}) with no reprojection configured"
    )]
    CrsMismatch { primary: String, secondary: String },

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("Cannot write output {path}: {reason}")]
    OutputWrite { path: PathBuf, reason: String },

    #[error("Unsupported sample type {data_type} in {path}")]
    UnsupportedDataType { path: PathBuf, data_type: String },

    #[error("Rotated geotransforms are not supported: {0:?}")]
    RotatedTransform([f64; 6]),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T, E = ProcessError> = std::result::Result<T, E>;
