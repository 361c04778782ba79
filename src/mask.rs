use ndarray::{Array2, Array3, Axis, Zip};

use crate::error::{ProcessError, Result};
use crate::raster::{PixelArray, Sample, with_array};

/// Binary footprint of the reference raster: 1 where it carries data.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityMask {
    values: Array2<u8>,
}

impl ValidityMask {
    /// 1 where every band is strictly positive, 0 elsewhere. NaN is invalid.
    pub fn from_array<T: Sample>(array: &Array3<T>) -> Self {
        let zero = T::default();
        let (_, rows, cols) = array.dim();
        let mut values = Array2::<u8>::ones((rows, cols));

        for band in array.axis_iter(Axis(0)) {
            Zip::from(&mut values).and(&band).for_each(|m, &v| {
                if !(v > zero) {
                    *m = 0;
                }
            });
        }

        Self { values }
    }

    pub fn from_pixels(pixels: &PixelArray) -> Self {
        with_array!(pixels, array => Self::from_array(array))
    }

    pub fn values(&self) -> &Array2<u8> {
        &self.values
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|&&m| m == 1).count()
    }

    /// Zero every sample, in every band, where the mask is 0. Same result as
    /// multiplying by the 0/1 mask, except that NaN is zeroed too.
    pub fn apply_to<T: Sample>(&self, array: &mut Array3<T>) -> Result<()> {
        let (_, rows, cols) = array.dim();
        if (rows, cols) != self.shape() {
            return Err(ProcessError::Resample(format!(
                "Mask shape {:?} does not match array shape {:?}",
                self.shape(),
                (rows, cols)
            )));
        }

        let zero = T::default();
        for mut band in array.axis_iter_mut(Axis(0)) {
            band.zip_mut_with(&self.values, |v, &m| {
                if m == 0 {
                    *v = zero;
                }
            });
        }

        Ok(())
    }

    pub fn apply(&self, mut pixels: PixelArray) -> Result<PixelArray> {
        with_array!(&mut pixels, array => self.apply_to(array)?);
        Ok(pixels)
    }
}
