use std::fmt;

use crate::error::{ProcessError, Result};

/// Geographic rectangle in the order rasterio and GDAL report bounds:
/// left, bottom, right, top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Bbox {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Result<Self, String> {
        if [left, bottom, right, top].iter().any(|v| !v.is_finite()) {
            return Err("Bounding box coordinates must be finite".to_string());
        }

        if left > right || bottom > top {
            return Err("Min values must be <= max values".to_string());
        }

        Ok(Bbox {
            left,
            bottom,
            right,
            top,
        })
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// A box without area, including the "inverted" boxes produced by
    /// intersecting disjoint extents.
    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.bottom >= self.top
    }

    pub fn contains(&self, other: &Bbox) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.bottom >= self.bottom
            && other.top <= self.top
    }

    /// Common footprint of two boxes. Disjoint or edge-touching boxes have no
    /// area in common and are rejected here, before any window is requested.
    pub fn intersection(&self, other: &Bbox) -> Result<Bbox> {
        let candidate = Bbox {
            left: self.left.max(other.left),
            bottom: self.bottom.max(other.bottom),
            right: self.right.min(other.right),
            top: self.top.min(other.top),
        };

        if candidate.is_empty() {
            return Err(ProcessError::InvalidIntersection(candidate));
        }

        Ok(candidate)
    }
}

impl fmt::Display for Bbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[left={}, bottom={}, right={}, top={}]",
            self.left, self.bottom, self.right, self.top
        )
    }
}
