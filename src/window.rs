use std::fmt;

use crate::bbox::Bbox;
use crate::error::{ProcessError, Result};
use crate::geotransform::GeoTransform;

/// Integer pixel rectangle inside a raster grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub col_off: usize,
    pub row_off: usize,
    pub width: usize,
    pub height: usize,
}

impl Window {
    /// Pixel window covering `bbox` on a `raster_size` (width, height) grid.
    ///
    /// Bounds are mapped to fractional pixel edges through the inverse
    /// geotransform. Each edge is rounded to the nearest pixel boundary (half
    /// away from zero), then clamped to the grid. The window is the span
    /// between the rounded edges, so a box that is narrower than one pixel
    /// collapses and is rejected as an empty intersection.
    pub fn from_bounds(
        bbox: &Bbox,
        transform: &GeoTransform,
        raster_size: (usize, usize),
    ) -> Result<Window> {
        let edges = pixel_edges(bbox, transform)?;
        Self::from_edges(bbox, edges, raster_size, f64::round, f64::round)
    }

    /// Smallest window holding every pixel that `bbox` touches: the start
    /// edges are floored and the end edges ceiled before clamping. Used for
    /// the source of a resampling, where a box narrower than one source pixel
    /// still needs that pixel.
    pub fn covering_bounds(
        bbox: &Bbox,
        transform: &GeoTransform,
        raster_size: (usize, usize),
    ) -> Result<Window> {
        let edges = pixel_edges(bbox, transform)?;
        Self::from_edges(bbox, edges, raster_size, f64::floor, f64::ceil)
    }

    fn from_edges(
        bbox: &Bbox,
        (c0, r0, c1, r1): (f64, f64, f64, f64),
        (width, height): (usize, usize),
        start: fn(f64) -> f64,
        end: fn(f64) -> f64,
    ) -> Result<Window> {
        let col_start = clamp(start(c0), width);
        let col_end = clamp(end(c1), width);
        let row_start = clamp(start(r0), height);
        let row_end = clamp(end(r1), height);

        if col_end <= col_start || row_end <= row_start {
            return Err(ProcessError::InvalidIntersection(*bbox));
        }

        Ok(Window {
            col_off: col_start,
            row_off: row_start,
            width: col_end - col_start,
            height: row_end - row_start,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Grow by `pixels` on every side, staying inside a `raster_size` grid.
    pub fn padded(&self, pixels: usize, raster_size: (usize, usize)) -> Window {
        let col_off = self.col_off.saturating_sub(pixels);
        let row_off = self.row_off.saturating_sub(pixels);
        let col_end = (self.col_off + self.width + pixels).min(raster_size.0);
        let row_end = (self.row_off + self.height + pixels).min(raster_size.1);

        Window {
            col_off,
            row_off,
            width: col_end - col_off,
            height: row_end - row_off,
        }
    }
}

/// Fractional (col_start, row_start, col_end, row_end) of `bbox`.
fn pixel_edges(bbox: &Bbox, transform: &GeoTransform) -> Result<(f64, f64, f64, f64)> {
    if transform.is_rotated() {
        return Err(ProcessError::RotatedTransform(*transform.coefficients()));
    }

    let inverse = transform.inverse().ok_or_else(|| {
        ProcessError::Resample(format!("Geotransform is not invertible: {}", transform))
    })?;

    let (c0, r0) = inverse.apply(bbox.left, bbox.top);
    let (c1, r1) = inverse.apply(bbox.right, bbox.bottom);

    Ok((c0.min(c1), r0.min(r1), c0.max(c1), r0.max(r1)))
}

fn clamp(edge: f64, limit: usize) -> usize {
    if edge <= 0.0 {
        0
    } else if edge >= limit as f64 {
        limit
    } else {
        edge as usize
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cols {}..{}, rows {}..{} ({}x{})",
            self.col_off,
            self.col_off + self.width,
            self.row_off,
            self.row_off + self.height,
            self.width,
            self.height
        )
    }
}
