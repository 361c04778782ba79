use gdal::Dataset;
use gdal::raster::GdalDataType;
use log::{debug, info};
use ndarray::Array3;
use std::path::{Path, PathBuf};

use super::{PixelArray, Sample};
use crate::bbox::Bbox;
use crate::crs::Crs;
use crate::error::{ProcessError, Result};
use crate::geotransform::GeoTransform;
use crate::window::Window;

/// An opened input raster. The dataset is closed when the source is dropped.
pub struct RasterSource {
    path: PathBuf,
    dataset: Dataset,
    width: usize,
    height: usize,
    band_count: usize,
    data_type: GdalDataType,
    geo_transform: GeoTransform,
    crs: Crs,
}

impl RasterSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        info!("Opening raster source: {}", path.display());

        let dataset = Dataset::open(&path).map_err(|source| ProcessError::SourceOpen {
            path: path.clone(),
            source,
        })?;

        let (width, height) = dataset.raster_size();
        let band_count = dataset.raster_count();
        if band_count == 0 {
            return Err(ProcessError::UnsupportedDataType {
                path,
                data_type: "no raster bands".to_string(),
            });
        }

        let data_type = dataset.rasterband(1)?.band_type();
        let geo_transform = GeoTransform::new(dataset.geo_transform()?);
        let crs = Crs::from_wkt(dataset.projection());

        debug!(
            "{}: {}x{}, {} band(s) of {:?}, {}, CRS {}",
            path.display(),
            width,
            height,
            band_count,
            data_type,
            geo_transform,
            crs
        );

        Ok(Self {
            path,
            dataset,
            width,
            height,
            band_count,
            data_type,
            geo_transform,
            crs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn band_count(&self) -> usize {
        self.band_count
    }

    pub fn geo_transform(&self) -> &GeoTransform {
        &self.geo_transform
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn bounds(&self) -> Bbox {
        self.geo_transform.bounds(self.width, self.height)
    }

    /// Window of this raster's grid covering `bbox`.
    pub fn window_for(&self, bbox: &Bbox) -> Result<Window> {
        Window::from_bounds(bbox, &self.geo_transform, self.size())
    }

    /// Window holding every pixel of this raster that `bbox` touches.
    pub fn covering_window_for(&self, bbox: &Bbox) -> Result<Window> {
        Window::covering_bounds(bbox, &self.geo_transform, self.size())
    }

    /// Read every band inside `window`, in the type of the first band.
    pub fn read_window(&self, window: &Window) -> Result<PixelArray> {
        debug!("Reading {} from {}", window, self.path.display());

        let pixels = match self.data_type {
            GdalDataType::UInt8 => PixelArray::U8(self.read_bands(window)?),
            GdalDataType::UInt16 => PixelArray::U16(self.read_bands(window)?),
            GdalDataType::Int16 => PixelArray::I16(self.read_bands(window)?),
            GdalDataType::UInt32 => PixelArray::U32(self.read_bands(window)?),
            GdalDataType::Int32 => PixelArray::I32(self.read_bands(window)?),
            GdalDataType::Float32 => PixelArray::F32(self.read_bands(window)?),
            GdalDataType::Float64 => PixelArray::F64(self.read_bands(window)?),
            other => {
                return Err(ProcessError::UnsupportedDataType {
                    path: self.path.clone(),
                    data_type: format!("{:?}", other),
                });
            }
        };

        Ok(pixels)
    }

    fn read_bands<T: Sample>(&self, window: &Window) -> Result<Array3<T>> {
        let offset = (window.col_off as isize, window.row_off as isize);
        let size = (window.width, window.height);

        let mut samples = Vec::with_capacity(self.band_count * window.width * window.height);
        for index in 1..=self.band_count {
            let band = self.dataset.rasterband(index)?;
            let buffer = band.read_as::<T>(offset, size, size, None)?;
            samples.extend_from_slice(buffer.data());
        }

        Ok(Array3::from_shape_vec(
            (self.band_count, window.height, window.width),
            samples,
        )?)
    }
}
