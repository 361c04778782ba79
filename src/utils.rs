use gdal::Dataset;
use log::info;
use std::path::Path;

use crate::error::Result;

/// Summary of the first band of a written raster, ignoring masked (zero) and
/// NaN samples.
#[derive(Debug, Clone, PartialEq)]
pub struct BandStatistics {
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub valid: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

pub fn band_statistics<P: AsRef<Path>>(path: P) -> Result<BandStatistics> {
    let dataset = Dataset::open(path.as_ref())?;
    let (width, height) = dataset.raster_size();
    let band = dataset.rasterband(1)?;
    let buffer = band.read_as::<f64>((0, 0), (width, height), (width, height), None)?;

    let valid_values: Vec<f64> = buffer
        .data()
        .iter()
        .filter(|&&v| !v.is_nan() && v != 0.0)
        .cloned()
        .collect();

    let mean = if valid_values.is_empty() {
        f64::NAN
    } else {
        valid_values.iter().sum::<f64>() / valid_values.len() as f64
    };

    Ok(BandStatistics {
        width,
        height,
        band_count: dataset.raster_count(),
        valid: valid_values.len(),
        min: valid_values.iter().fold(f64::INFINITY, |a, &b| a.min(b)),
        max: valid_values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)),
        mean,
    })
}

pub fn log_raster_summary<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let stats = band_statistics(path)?;
    let total = stats.width * stats.height;

    info!(
        "{}: {}x{}, {} band(s)",
        path.display(),
        stats.width,
        stats.height,
        stats.band_count
    );
    info!(
        "  Band 1 valid pixels: {} / {} ({:.1}%)",
        stats.valid,
        total,
        if total == 0 {
            0.0
        } else {
            100.0 * stats.valid as f64 / total as f64
        }
    );
    if stats.valid > 0 {
        info!(
            "  Band 1 min: {:.2}, max: {:.2}, mean: {:.2}",
            stats.min, stats.max, stats.mean
        );
    }

    Ok(())
}
