use gdal::DriverManager;
use gdal::raster::Buffer;
use log::{debug, info, warn};
use ndarray::{Array3, Axis};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempPath};

use super::{PixelArray, Sample, with_array};
use crate::crs::Crs;
use crate::error::{ProcessError, Result};
use crate::geotransform::GeoTransform;

/// A fully written raster waiting next to its destination under a temporary
/// name. Dropping it without committing removes the temporary file.
#[derive(Debug)]
pub struct StagedRaster {
    temp: TempPath,
    destination: PathBuf,
}

/// A staged raster moved into place. Whatever it replaced is kept aside until
/// `finish`, so the commit can still be undone.
#[derive(Debug)]
struct CommittedRaster {
    destination: PathBuf,
    previous: Option<TempPath>,
}

impl StagedRaster {
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Rename the temporary file onto the destination path.
    pub fn commit(self) -> Result<PathBuf> {
        Ok(self.replace()?.finish())
    }

    fn output_error(&self, reason: String) -> ProcessError {
        ProcessError::OutputWrite {
            path: self.destination.clone(),
            reason,
        }
    }

    fn replace(self) -> Result<CommittedRaster> {
        if self.destination.is_dir() {
            return Err(self.output_error("destination is a directory".to_string()));
        }

        let previous = if self.destination.exists() {
            let backup = Builder::new()
                .prefix(".rastermask-previous-")
                .suffix(".tif")
                .tempfile_in(parent_directory(&self.destination))
                .map_err(|e| self.output_error(e.to_string()))?
                .into_temp_path();
            fs::rename(&self.destination, &backup).map_err(|e| self.output_error(e.to_string()))?;
            Some(backup)
        } else {
            None
        };

        if let Err(e) = self.temp.persist(&self.destination) {
            let committed = CommittedRaster {
                destination: self.destination,
                previous,
            };
            let error = ProcessError::OutputWrite {
                path: committed.destination.clone(),
                reason: e.to_string(),
            };
            committed.restore_previous();
            return Err(error);
        }

        Ok(CommittedRaster {
            destination: self.destination,
            previous,
        })
    }
}

impl CommittedRaster {
    fn finish(self) -> PathBuf {
        info!("Saved raster to: {}", self.destination.display());
        self.destination
    }

    fn roll_back(self) {
        if self.previous.is_none() {
            if let Err(e) = fs::remove_file(&self.destination) {
                warn!("Could not remove {}: {}", self.destination.display(), e);
            }
        }
        self.restore_previous();
    }

    fn restore_previous(self) {
        if let Some(previous) = self.previous {
            if let Err(e) = previous.persist(&self.destination) {
                warn!("Could not restore {}: {}", self.destination.display(), e);
            }
        }
    }
}

/// Move every staged raster into place, or none of them. Destinations that
/// are directories are refused up front; if a rename still fails, the rasters
/// already committed are rolled back, restoring the files they replaced.
pub fn commit_all(staged: Vec<StagedRaster>) -> Result<Vec<PathBuf>> {
    if let Some(raster) = staged.iter().find(|r| r.destination().is_dir()) {
        return Err(raster.output_error("destination is a directory".to_string()));
    }

    let mut committed: Vec<CommittedRaster> = Vec::with_capacity(staged.len());
    for raster in staged {
        match raster.replace() {
            Ok(done) => committed.push(done),
            Err(e) => {
                for done in committed.into_iter().rev() {
                    done.roll_back();
                }
                return Err(e);
            }
        }
    }

    Ok(committed.into_iter().map(CommittedRaster::finish).collect())
}

fn parent_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Write `pixels` as a GeoTIFF into a temporary file in the destination's
/// directory.
pub fn stage<P: AsRef<Path>>(
    destination: P,
    pixels: &PixelArray,
    geo_transform: &GeoTransform,
    crs: &Crs,
) -> Result<StagedRaster> {
    let destination = destination.as_ref().to_path_buf();
    let output_error = |reason: String| ProcessError::OutputWrite {
        path: destination.clone(),
        reason,
    };

    let temp = Builder::new()
        .prefix(".rastermask-")
        .suffix(".tif")
        .tempfile_in(parent_directory(&destination))
        .map_err(|e| output_error(e.to_string()))?
        .into_temp_path();

    debug!(
        "Writing {} for {} to {}",
        pixels,
        destination.display(),
        temp.display()
    );

    let written = with_array!(pixels, array => write_geotiff(&temp, array, geo_transform, crs));
    written.map_err(|e| output_error(e.to_string()))?;

    Ok(StagedRaster { temp, destination })
}

/// Create a GeoTIFF holding every band of `array`.
pub fn write_geotiff<T: Sample>(
    path: &Path,
    array: &Array3<T>,
    geo_transform: &GeoTransform,
    crs: &Crs,
) -> gdal::errors::Result<()> {
    let (bands, rows, cols) = array.dim();

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dataset = driver.create_with_band_type::<T, _>(path, cols, rows, bands)?;

    dataset.set_geo_transform(geo_transform.coefficients())?;
    if crs.is_defined() {
        dataset.set_projection(crs.wkt())?;
    }

    for (i, band_data) in array.axis_iter(Axis(0)).enumerate() {
        let mut raster_band = dataset.rasterband(i + 1)?;

        // GDAL expects row-major samples, which is the iteration order of the view
        let mut buffer = Buffer::new((cols, rows), band_data.iter().copied().collect());
        raster_band.write((0, 0), (cols, rows), &mut buffer)?;
    }

    dataset.flush_cache()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdal::Dataset;
    use std::fs::File;
    use std::io::BufReader;
    use tempfile::tempdir;
    use tiff::decoder::{Decoder, DecodingResult};

    fn sample_pixels() -> PixelArray {
        PixelArray::U8(Array3::from_shape_fn((1, 3, 4), |(_, r, c)| (r * 4 + c) as u8))
    }

    #[test]
    fn test_commit_moves_raster_into_place() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("out.tif");
        let gt = GeoTransform::from_origin(10.0, 20.0, 0.5, 0.5);

        let staged = stage(&destination, &sample_pixels(), &gt, &Crs::from_wkt("")).unwrap();
        assert!(!destination.exists());

        staged.commit().unwrap();

        let dataset = Dataset::open(&destination).unwrap();
        assert_eq!(dataset.raster_size(), (4, 3));
        assert_eq!(dataset.geo_transform().unwrap(), *gt.coefficients());

        // only the committed file is left in the directory
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_dropping_staged_raster_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("out.tif");
        let gt = GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0);

        let staged = stage(&destination, &sample_pixels(), &gt, &Crs::from_wkt("")).unwrap();
        drop(staged);

        assert!(!destination.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_directory_is_an_output_error() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("missing").join("out.tif");
        let gt = GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0);

        let result = stage(&destination, &sample_pixels(), &gt, &Crs::from_wkt(""));

        assert!(matches!(result, Err(ProcessError::OutputWrite { .. })));
    }

    #[test]
    fn test_directory_destination_commits_nothing() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.tif");
        let taken = dir.path().join("taken");
        std::fs::create_dir(&taken).unwrap();
        let gt = GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0);

        let staged = vec![
            stage(&first, &sample_pixels(), &gt, &Crs::from_wkt("")).unwrap(),
            stage(&taken, &sample_pixels(), &gt, &Crs::from_wkt("")).unwrap(),
        ];
        let result = commit_all(staged);

        match result {
            Err(ProcessError::OutputWrite { path, .. }) => assert_eq!(path, taken),
            other => panic!("expected OutputWrite, got {:?}", other),
        }
        assert!(!first.exists());
        assert!(taken.is_dir());
        // the directory itself plus nothing else
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_commit_restores_replaced_output() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.tif");
        std::fs::write(&first, b"previous run").unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        let gt = GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0);

        let staged = vec![
            stage(&first, &sample_pixels(), &gt, &Crs::from_wkt("")).unwrap(),
            stage(nested.join("second.tif"), &sample_pixels(), &gt, &Crs::from_wkt("")).unwrap(),
        ];
        // the second temporary file disappears before it can be renamed
        std::fs::remove_dir_all(&nested).unwrap();

        let result = commit_all(staged);

        assert!(matches!(result, Err(ProcessError::OutputWrite { .. })));
        assert_eq!(std::fs::read(&first).unwrap(), b"previous run");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_commit_all_replaces_existing_outputs() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.tif");
        let second = dir.path().join("second.tif");
        std::fs::write(&first, b"previous run").unwrap();
        let gt = GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0);

        let staged = vec![
            stage(&first, &sample_pixels(), &gt, &Crs::from_wkt("")).unwrap(),
            stage(&second, &sample_pixels(), &gt, &Crs::from_wkt("")).unwrap(),
        ];
        assert_eq!(staged[1].destination(), second.as_path());

        let outputs = commit_all(staged).unwrap();

        assert_eq!(outputs, vec![first.clone(), second.clone()]);
        assert_eq!(Dataset::open(&first).unwrap().raster_size(), (4, 3));
        assert_eq!(Dataset::open(&second).unwrap().raster_size(), (4, 3));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_written_samples_decode_with_plain_tiff_reader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.tif");
        let gt = GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0);
        let array = Array3::from_shape_fn((1, 3, 4), |(_, r, c)| (r * 4 + c) as u8);

        write_geotiff(&path, &array, &gt, &Crs::from_wkt("")).unwrap();

        let reader = BufReader::new(File::open(&path).unwrap());
        let mut decoder = Decoder::new(reader).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (4, 3));

        match decoder.read_image().unwrap() {
            DecodingResult::U8(data) => assert_eq!(data, (0..12).collect::<Vec<u8>>()),
            _ => panic!("expected 8-bit samples"),
        }
    }
}
