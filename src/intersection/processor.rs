use log::{debug, info, warn};
use std::fmt::Display;

use super::report::IntersectionReport;
use crate::bbox::Bbox;
use crate::config::{Config, CrsPolicy};
use crate::crs::{Crs, Reprojection};
use crate::error::{ProcessError, Result};
use crate::geotransform::GeoTransform;
use crate::mask::ValidityMask;
use crate::raster::{self, PixelArray, RasterSource};
use crate::resample::{PointMapper, SameCrs};

/// How the secondary raster's coordinates relate to the primary's.
enum CrsAlignment {
    Same,
    Reprojected {
        to_primary: Reprojection,
        to_secondary: Reprojection,
    },
}

/// Both rasters cropped to the common footprint, on the primary's grid.
struct AlignedPair {
    intersection: Bbox,
    geo_transform: GeoTransform,
    primary: PixelArray,
    primary_crs: Crs,
    secondary: PixelArray,
    secondary_crs: Crs,
    resampled: bool,
}

#[derive(Debug)]
pub struct IntersectionProcessor {
    config: Config,
}

impl IntersectionProcessor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Crop both rasters to their common footprint, align the secondary onto
    /// the primary's grid, mask both by the secondary's valid pixels and write
    /// the two outputs.
    ///
    /// Nothing is written unless every step succeeds; both outputs are moved
    /// into place only after both have been fully written.
    pub fn process(&self) -> Result<IntersectionReport> {
        let aligned = {
            let primary = RasterSource::open(self.config.primary_path())?;
            let secondary = RasterSource::open(self.config.secondary_path())?;
            self.align(&primary, &secondary)?
        };

        let mask = ValidityMask::from_pixels(&aligned.secondary);
        let valid_pixels = mask.valid_count();
        if valid_pixels == 0 {
            warn!("Secondary raster has no valid pixels in the intersection; outputs will be all zero");
        }

        let primary_masked = mask.apply(aligned.primary)?;
        let secondary_masked = mask.apply(aligned.secondary)?;

        let staged_primary = raster::stage(
            self.config.primary_output_path(),
            &primary_masked,
            &aligned.geo_transform,
            &aligned.primary_crs,
        )?;
        let staged_secondary = raster::stage(
            self.config.secondary_output_path(),
            &secondary_masked,
            &aligned.geo_transform,
            &aligned.secondary_crs,
        )?;

        let mut outputs = raster::commit_all(vec![staged_primary, staged_secondary])?.into_iter();
        let (Some(primary_output), Some(secondary_output)) = (outputs.next(), outputs.next()) else {
            return Err(ProcessError::OutputWrite {
                path: self.config.primary_output_path().to_path_buf(),
                reason: "outputs were not committed".to_string(),
            });
        };

        let (height, width) = primary_masked.shape();

        Ok(IntersectionReport {
            intersection: aligned.intersection,
            width,
            height,
            geo_transform: aligned.geo_transform,
            resampled: aligned.resampled,
            valid_pixels,
            primary_output,
            secondary_output,
        })
    }

    fn reconcile_crs(
        &self,
        primary: &RasterSource,
        secondary: &RasterSource,
    ) -> Result<CrsAlignment> {
        if primary.crs().is_same(secondary.crs()) {
            return Ok(CrsAlignment::Same);
        }

        match self.config.crs_policy() {
            CrsPolicy::Reject => Err(ProcessError::CrsMismatch {
                primary: primary.crs().to_string(),
                secondary: secondary.crs().to_string(),
            }),
            CrsPolicy::Reproject => {
                info!(
                    "Reprojecting secondary from {} to {}",
                    secondary.crs(),
                    primary.crs()
                );
                Ok(CrsAlignment::Reprojected {
                    to_primary: Reprojection::new(secondary.crs(), primary.crs())?,
                    to_secondary: Reprojection::new(primary.crs(), secondary.crs())?,
                })
            }
        }
    }

    fn align(&self, primary: &RasterSource, secondary: &RasterSource) -> Result<AlignedPair> {
        let alignment = self.reconcile_crs(primary, secondary)?;

        let secondary_bounds = match &alignment {
            CrsAlignment::Same => secondary.bounds(),
            CrsAlignment::Reprojected { to_primary, .. } => {
                to_primary.transform_bbox(&secondary.bounds())?
            }
        };

        let intersection = primary.bounds().intersection(&secondary_bounds)?;
        info!("Intersection bounds: {}", intersection);
        debug!(
            "Intersection size: {} x {}",
            intersection.width(),
            intersection.height()
        );

        let primary_window = primary.window_for(&intersection)?;
        let geo_transform = primary.geo_transform().window_transform(&primary_window);
        let shape = primary_window.shape();
        debug!(
            "Primary window: {} at {} ({} band(s) from {})",
            primary_window,
            geo_transform,
            primary.band_count(),
            primary.path().display()
        );

        let primary_pixels = primary.read_window(&primary_window)?;

        let secondary_box = match &alignment {
            CrsAlignment::Same => intersection,
            CrsAlignment::Reprojected { to_secondary, .. } => {
                to_secondary.transform_bbox(&intersection)?
            }
        };

        // The nearest-edge window is only kept when it lands exactly on the
        // primary grid. A box narrower than one secondary pixel has none.
        let snapped = match secondary.window_for(&secondary_box) {
            Ok(window) => Some(window),
            Err(ProcessError::InvalidIntersection(_)) => None,
            Err(e) => return Err(e),
        };
        let resampled = match (&alignment, snapped) {
            (CrsAlignment::Same, Some(window)) => {
                window.shape() != shape
                    || !secondary
                        .geo_transform()
                        .window_transform(&window)
                        .same_grid(&geo_transform)
            }
            _ => true,
        };

        // Resampling reads every secondary pixel the box touches plus one more
        // around it, so edge pixels of the primary grid stay covered.
        let secondary_window = match snapped {
            Some(window) if !resampled => window,
            _ => secondary
                .covering_window_for(&secondary_box)?
                .padded(1, secondary.size()),
        };
        let secondary_transform = secondary.geo_transform().window_transform(&secondary_window);
        debug!(
            "Secondary window: {} at {} ({} band(s) from {})",
            secondary_window,
            secondary_transform,
            secondary.band_count(),
            secondary.path().display()
        );

        let secondary_pixels = secondary.read_window(&secondary_window)?;

        let secondary_pixels = if resampled {
            info!(
                "Grids differ, resampling secondary ({}) onto primary grid with nearest neighbour",
                secondary_pixels
            );
            let mapper: &dyn PointMapper = match &alignment {
                CrsAlignment::Same => &SameCrs,
                CrsAlignment::Reprojected { to_secondary, .. } => to_secondary,
            };
            secondary_pixels.resample_nearest(&secondary_transform, &geo_transform, shape, mapper)?
        } else {
            info!("Secondary is already on the primary grid, no resampling needed");
            secondary_pixels
        };

        let secondary_crs = match alignment {
            CrsAlignment::Same => secondary.crs().clone(),
            CrsAlignment::Reprojected { .. } => primary.crs().clone(),
        };

        Ok(AlignedPair {
            intersection,
            geo_transform,
            primary: primary_pixels,
            primary_crs: primary.crs().clone(),
            secondary: secondary_pixels,
            secondary_crs,
            resampled,
        })
    }
}

impl Display for IntersectionProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IntersectionProcessor {{ primary: {}, secondary: {}, crs_policy: {} }}",
            self.config.primary_path().display(),
            self.config.secondary_path().display(),
            self.config.crs_policy()
        )
    }
}
