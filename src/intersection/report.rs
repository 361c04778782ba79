use std::fmt::Display;
use std::path::PathBuf;

use crate::bbox::Bbox;
use crate::geotransform::GeoTransform;

/// Outcome of one intersection run.
#[derive(Debug, Clone)]
pub struct IntersectionReport {
    pub intersection: Bbox,
    pub width: usize,
    pub height: usize,
    pub geo_transform: GeoTransform,
    pub resampled: bool,
    pub valid_pixels: usize,
    pub primary_output: PathBuf,
    pub secondary_output: PathBuf,
}

impl IntersectionReport {
    pub fn total_pixels(&self) -> usize {
        self.width * self.height
    }

    pub fn valid_fraction(&self) -> f64 {
        if self.total_pixels() == 0 {
            0.0
        } else {
            self.valid_pixels as f64 / self.total_pixels() as f64
        }
    }
}

impl Display for IntersectionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IntersectionReport {{ bounds: {}, dimensions: {}x{}, resampled: {}, valid pixels: {} / {} ({:.1}%) }}",
            self.intersection,
            self.width,
            self.height,
            self.resampled,
            self.valid_pixels,
            self.total_pixels(),
            100.0 * self.valid_fraction()
        )
    }
}
