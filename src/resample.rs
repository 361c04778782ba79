use log::debug;
use ndarray::Array3;

use crate::error::{ProcessError, Result};
use crate::geotransform::GeoTransform;
use crate::raster::{PixelArray, Sample, map_array};

/// Maps points from the destination CRS into the source CRS, in place.
pub trait PointMapper {
    fn map_points(&self, xs: &mut [f64], ys: &mut [f64]) -> Result<()>;
}

/// Destination and source share a CRS.
pub struct SameCrs;

impl PointMapper for SameCrs {
    fn map_points(&self, _xs: &mut [f64], _ys: &mut [f64]) -> Result<()> {
        Ok(())
    }
}

/// Nearest-neighbour resampling of `src` onto a `(rows, cols)` grid described
/// by `dst_transform`.
///
/// Each destination pixel centre is taken to geographic space, through
/// `mapper` into the source CRS, then into source pixel space; the source pixel
/// containing that point supplies the value for every band. Destination pixels
/// that land outside the source stay zero.
pub fn nearest<T: Sample>(
    src: &Array3<T>,
    src_transform: &GeoTransform,
    dst_transform: &GeoTransform,
    dst_shape: (usize, usize),
    mapper: &dyn PointMapper,
) -> Result<Array3<T>> {
    let (bands, src_rows, src_cols) = src.dim();
    let (rows, cols) = dst_shape;

    let to_src_pixel = src_transform.inverse().ok_or_else(|| {
        ProcessError::Resample(format!(
            "Source geotransform is not invertible: {}",
            src_transform
        ))
    })?;

    let mut dst = Array3::<T>::default((bands, rows, cols));
    let mut xs = vec![0.0; cols];
    let mut ys = vec![0.0; cols];

    for row in 0..rows {
        for (col, (x, y)) in xs.iter_mut().zip(ys.iter_mut()).enumerate() {
            (*x, *y) = dst_transform.apply(col as f64 + 0.5, row as f64 + 0.5);
        }

        mapper.map_points(&mut xs, &mut ys)?;

        for (col, (&x, &y)) in xs.iter().zip(ys.iter()).enumerate() {
            let (src_col, src_row) = to_src_pixel.apply(x, y);
            if !(src_col.is_finite() && src_row.is_finite()) || src_col < 0.0 || src_row < 0.0 {
                continue;
            }

            let (c, r) = (src_col.floor() as usize, src_row.floor() as usize);
            if c >= src_cols || r >= src_rows {
                continue;
            }

            for band in 0..bands {
                dst[[band, row, col]] = src[[band, r, c]];
            }
        }
    }

    Ok(dst)
}

impl PixelArray {
    /// Resample every band onto the destination grid, keeping the sample type.
    pub fn resample_nearest(
        &self,
        src_transform: &GeoTransform,
        dst_transform: &GeoTransform,
        dst_shape: (usize, usize),
        mapper: &dyn PointMapper,
    ) -> Result<PixelArray> {
        debug!(
            "Resampling {} from {} onto {}x{} at {}",
            self, src_transform, dst_shape.1, dst_shape.0, dst_transform
        );

        Ok(map_array!(self, array => nearest(
            array,
            src_transform,
            dst_transform,
            dst_shape,
            mapper
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    #[test]
    fn test_identical_grid_is_a_copy() {
        let gt = GeoTransform::from_origin(10.0, 20.0, 0.5, 0.5);
        let src = Array3::from_shape_fn((2, 4, 6), |(b, r, c)| (b * 100 + r * 10 + c) as u16);

        let dst = nearest(&src, &gt, &gt, (4, 6), &SameCrs).unwrap();

        assert_eq!(dst, src);
    }

    #[test]
    fn test_upsampling_replicates_coarse_pixels() {
        let src_gt = GeoTransform::from_origin(0.0, 0.0, 2.0, 2.0);
        let dst_gt = GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0);
        let mut src = Array3::from_elem((1, 5, 5), 3u8);
        src.slice_mut(s![.., 0..2, 0..2]).fill(0);

        let dst = nearest(&src, &src_gt, &dst_gt, (10, 10), &SameCrs).unwrap();

        assert_eq!(dst.dim(), (1, 10, 10));
        assert!(dst.slice(s![0, 0..4, 0..4]).iter().all(|&v| v == 0));
        assert_eq!(dst.iter().filter(|&&v| v == 0).count(), 16);
        assert_eq!(dst[[0, 4, 4]], 3);
    }

    #[test]
    fn test_half_pixel_shift_picks_containing_pixel() {
        let src_gt = GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0);
        let dst_gt = GeoTransform::from_origin(0.6, 0.0, 1.0, 1.0);
        let src = Array3::from_shape_fn((1, 1, 4), |(_, _, c)| c as i32 + 1);

        let dst = nearest(&src, &src_gt, &dst_gt, (1, 4), &SameCrs).unwrap();

        // centres at 1.1, 2.1, 3.1 and 4.1 -> last one falls outside the source
        assert_eq!(dst.as_slice().unwrap(), &[2, 3, 4, 0]);
    }

    #[test]
    fn test_pixels_outside_source_stay_zero() {
        let src_gt = GeoTransform::from_origin(5.0, -5.0, 1.0, 1.0);
        let dst_gt = GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0);
        let src = Array3::from_elem((1, 5, 5), 7.0f32);

        let dst = nearest(&src, &src_gt, &dst_gt, (10, 10), &SameCrs).unwrap();

        assert_eq!(dst.iter().filter(|&&v| v == 7.0).count(), 25);
        assert_eq!(dst[[0, 0, 0]], 0.0);
        assert_eq!(dst[[0, 5, 5]], 7.0);
    }

    #[test]
    fn test_singular_source_transform_fails() {
        let src_gt = GeoTransform::new([0.0; 6]);
        let dst_gt = GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0);
        let src = Array3::from_elem((1, 2, 2), 1u8);

        let result = nearest(&src, &src_gt, &dst_gt, (2, 2), &SameCrs);

        assert!(matches!(result, Err(ProcessError::Resample(_))));
    }

    #[test]
    fn test_pixel_array_resample_keeps_type_and_bands() {
        let src_gt = GeoTransform::from_origin(0.0, 0.0, 2.0, 2.0);
        let dst_gt = GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0);
        let pixels = PixelArray::F64(Array3::from_elem((3, 2, 2), 1.25));

        let resampled = pixels
            .resample_nearest(&src_gt, &dst_gt, (4, 4), &SameCrs)
            .unwrap();

        assert_eq!(resampled, PixelArray::F64(Array3::from_elem((3, 4, 4), 1.25)));
    }
}
