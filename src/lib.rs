//! Crop two georeferenced rasters to their common footprint, align the
//! secondary onto the primary's pixel grid and zero both wherever the
//! secondary has no valid (positive) data.

pub mod bbox;
pub mod config;
pub mod crs;
pub mod error;
pub mod geotransform;
pub mod intersection;
pub mod mask;
pub mod raster;
pub mod resample;
pub mod utils;
pub mod window;

pub use config::Config;
pub use error::{ProcessError, Result};
pub use intersection::{IntersectionProcessor, IntersectionReport};
