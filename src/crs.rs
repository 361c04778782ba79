use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use log::{debug, warn};
use std::fmt;

use crate::bbox::Bbox;
use crate::error::{ProcessError, Result};
use crate::resample::PointMapper;

/// Points sampled along each edge when reprojecting a bounding box.
const DENSIFY_POINTS: i32 = 21;

/// Coordinate reference system as stored in the dataset (WKT, possibly empty).
#[derive(Debug, Clone, PartialEq)]
pub struct Crs {
    wkt: String,
}

impl Crs {
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self { wkt: wkt.into() }
    }

    pub fn wkt(&self) -> &str {
        &self.wkt
    }

    pub fn is_defined(&self) -> bool {
        !self.wkt.trim().is_empty()
    }

    /// Two rasters share a CRS when both lack one, carry the same WKT, or
    /// GDAL considers their spatial references equivalent.
    pub fn is_same(&self, other: &Crs) -> bool {
        match (self.is_defined(), other.is_defined()) {
            (false, false) => true,
            (true, true) => {
                if self.wkt == other.wkt {
                    return true;
                }
                match (self.spatial_ref(), other.spatial_ref()) {
                    (Ok(a), Ok(b)) => a == b,
                    (Err(e), _) | (_, Err(e)) => {
                        warn!("Failed to parse projection WKT, comparing as text: {}", e);
                        false
                    }
                }
            }
            _ => false,
        }
    }

    /// Spatial reference with x/y in easting/northing (longitude/latitude)
    /// order, matching the geotransform axes.
    fn spatial_ref(&self) -> Result<SpatialRef> {
        let mut srs = SpatialRef::from_wkt(&self.wkt)?;
        srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        Ok(srs)
    }
}

impl fmt::Display for Crs {
    /// Short name taken from the WKT root node, e.g. `WGS 84 / UTM zone 46N`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_defined() {
            return write!(f, "undefined");
        }
        match self.wkt.split('"').nth(1) {
            Some(name) if !name.is_empty() => write!(f, "{}", name),
            _ => write!(f, "{}", self.wkt),
        }
    }
}

/// Coordinate transformation between two defined CRSs.
pub struct Reprojection {
    transform: CoordTransform,
}

impl Reprojection {
    pub fn new(from: &Crs, to: &Crs) -> Result<Self> {
        if !from.is_defined() || !to.is_defined() {
            return Err(ProcessError::CrsMismatch {
                primary: from.to_string(),
                secondary: to.to_string(),
            });
        }

        let transform = CoordTransform::new(&from.spatial_ref()?, &to.spatial_ref()?)?;
        debug!("Created coordinate transform {} -> {}", from, to);

        Ok(Self { transform })
    }

    /// Enclosing box of `bbox` in the target CRS, densified along the edges.
    pub fn transform_bbox(&self, bbox: &Bbox) -> Result<Bbox> {
        let [xmin, ymin, xmax, ymax] = self
            .transform
            .transform_bounds(&[bbox.left, bbox.bottom, bbox.right, bbox.top], DENSIFY_POINTS)?;

        Bbox::new(xmin, ymin, xmax, ymax).map_err(|e| {
            ProcessError::Resample(format!("Reprojected bounds of {} are invalid: {}", bbox, e))
        })
    }
}

impl PointMapper for Reprojection {
    fn map_points(&self, xs: &mut [f64], ys: &mut [f64]) -> Result<()> {
        let mut zs = vec![0.0; xs.len()];
        self.transform
            .transform_coords(xs, ys, &mut zs)
            .map_err(|e| ProcessError::Resample(format!("Coordinate transformation failed: {}", e)))
    }
}
