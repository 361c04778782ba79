use std::fmt;

use crate::bbox::Bbox;
use crate::window::Window;

/// Relative tolerance, in pixels, under which two grids are considered the same.
const GRID_TOLERANCE: f64 = 1e-6;

/// GDAL affine geotransform:
/// `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
///
/// `x = gt[0] + col * gt[1] + row * gt[2]`
/// `y = gt[3] + col * gt[4] + row * gt[5]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform([f64; 6]);

impl GeoTransform {
    pub fn new(coefficients: [f64; 6]) -> Self {
        Self(coefficients)
    }

    /// North-up grid with its top-left corner at `(x, y)`.
    pub fn from_origin(x: f64, y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self([x, pixel_width, 0.0, y, 0.0, -pixel_height])
    }

    pub fn coefficients(&self) -> &[f64; 6] {
        &self.0
    }

    pub fn is_rotated(&self) -> bool {
        self.0[2] != 0.0 || self.0[4] != 0.0
    }

    /// Apply the affine mapping to `(col, row)`.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let gt = &self.0;
        (
            gt[0] + col * gt[1] + row * gt[2],
            gt[3] + col * gt[4] + row * gt[5],
        )
    }

    /// Geographic → pixel mapping, `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<GeoTransform> {
        let gt = &self.0;
        let det = gt[1] * gt[5] - gt[2] * gt[4];
        if det.abs() < f64::EPSILON * (gt[1].abs() + gt[5].abs()).max(f64::MIN_POSITIVE) {
            return None;
        }

        Some(GeoTransform([
            (gt[2] * gt[3] - gt[0] * gt[5]) / det,
            gt[5] / det,
            -gt[2] / det,
            (gt[0] * gt[4] - gt[1] * gt[3]) / det,
            -gt[4] / det,
            gt[1] / det,
        ]))
    }

    /// Footprint of a `width` x `height` grid, from its four corners.
    pub fn bounds(&self, width: usize, height: usize) -> Bbox {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(0.0, h),
            self.apply(w, h),
        ];

        let xs = corners.iter().map(|c| c.0);
        let ys = corners.iter().map(|c| c.1);

        Bbox {
            left: xs.clone().fold(f64::INFINITY, f64::min),
            right: xs.fold(f64::NEG_INFINITY, f64::max),
            bottom: ys.clone().fold(f64::INFINITY, f64::min),
            top: ys.fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// Transform of the sub-grid starting at the window's top-left pixel.
    pub fn window_transform(&self, window: &Window) -> GeoTransform {
        let (x, y) = self.apply(window.col_off as f64, window.row_off as f64);
        let gt = &self.0;
        GeoTransform([x, gt[1], gt[2], y, gt[4], gt[5]])
    }

    /// True when both transforms describe the same pixel lattice, up to a
    /// millionth of a pixel.
    pub fn same_grid(&self, other: &GeoTransform) -> bool {
        let scale = self.0[1]
            .abs()
            .min(self.0[5].abs())
            .max(f64::MIN_POSITIVE);
        let tolerance = GRID_TOLERANCE * scale;

        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl fmt::Display for GeoTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gt = &self.0;
        write!(
            f,
            "origin=({}, {}) pixel=({}, {}) rotation=({}, {})",
            gt[0], gt[3], gt[1], gt[5], gt[2], gt[4]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_of_north_up_grid() {
        let gt = GeoTransform::from_origin(100.0, 50.0, 0.5, 0.25);

        let bounds = gt.bounds(20, 40);

        assert_eq!(bounds, Bbox::new(100.0, 40.0, 110.0, 50.0).unwrap());
    }

    #[test]
    fn test_inverse_maps_back_to_pixel_space() {
        let gt = GeoTransform::from_origin(-67.2, 73.3, 0.04, 0.04);
        let inverse = gt.inverse().unwrap();

        let (x, y) = gt.apply(12.0, 7.5);
        let (col, row) = inverse.apply(x, y);

        assert!((col - 12.0).abs() < 1e-9);
        assert!((row - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_singular_transform_has_no_inverse() {
        let gt = GeoTransform::new([0.0, 0.0, 0.0, 0.0, 0.0, -1.0]);
        assert!(gt.inverse().is_none());
    }

    #[test]
    fn test_window_transform_shifts_origin() {
        let gt = GeoTransform::from_origin(0.0, 0.0, 2.0, 2.0);
        let window = Window {
            col_off: 3,
            row_off: 5,
            width: 4,
            height: 4,
        };

        let wt = gt.window_transform(&window);

        assert_eq!(wt, GeoTransform::from_origin(6.0, -10.0, 2.0, 2.0));
    }

    #[test]
    fn test_same_grid_tolerates_rounding_noise_only() {
        let a = GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0);
        let noisy = GeoTransform::from_origin(1e-10, -1e-10, 1.0, 1.0);
        let shifted = GeoTransform::from_origin(0.5, 0.0, 1.0, 1.0);
        let coarser = GeoTransform::from_origin(0.0, 0.0, 2.0, 2.0);

        assert!(a.same_grid(&noisy));
        assert!(!a.same_grid(&shifted));
        assert!(!a.same_grid(&coarser));
    }
}
