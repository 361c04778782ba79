use gdal::raster::{GdalDataType, GdalType};
use ndarray::Array3;
use std::fmt;

/// Sample types the processor reads and writes. `Default` is the zero used
/// for masked-out and uncovered pixels.
pub trait Sample: GdalType + Copy + Default + PartialOrd + fmt::Debug + 'static {}

impl Sample for u8 {}
impl Sample for u16 {}
impl Sample for i16 {}
impl Sample for u32 {}
impl Sample for i32 {}
impl Sample for f32 {}
impl Sample for f64 {}

/// Band × row × column samples, keeping the source's sample type.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelArray {
    U8(Array3<u8>),
    U16(Array3<u16>),
    I16(Array3<i16>),
    U32(Array3<u32>),
    I32(Array3<i32>),
    F32(Array3<f32>),
    F64(Array3<f64>),
}

/// Run `$body` with `$array` bound to the inner array of any variant.
macro_rules! with_array {
    ($pixels:expr, $array:ident => $body:expr) => {
        match $pixels {
            $crate::raster::PixelArray::U8($array) => $body,
            $crate::raster::PixelArray::U16($array) => $body,
            $crate::raster::PixelArray::I16($array) => $body,
            $crate::raster::PixelArray::U32($array) => $body,
            $crate::raster::PixelArray::I32($array) => $body,
            $crate::raster::PixelArray::F32($array) => $body,
            $crate::raster::PixelArray::F64($array) => $body,
        }
    };
}

/// Like `with_array!`, rewrapping the resulting array in the same variant.
macro_rules! map_array {
    ($pixels:expr, $array:ident => $body:expr) => {
        match $pixels {
            $crate::raster::PixelArray::U8($array) => $crate::raster::PixelArray::U8($body),
            $crate::raster::PixelArray::U16($array) => $crate::raster::PixelArray::U16($body),
            $crate::raster::PixelArray::I16($array) => $crate::raster::PixelArray::I16($body),
            $crate::raster::PixelArray::U32($array) => $crate::raster::PixelArray::U32($body),
            $crate::raster::PixelArray::I32($array) => $crate::raster::PixelArray::I32($body),
            $crate::raster::PixelArray::F32($array) => $crate::raster::PixelArray::F32($body),
            $crate::raster::PixelArray::F64($array) => $crate::raster::PixelArray::F64($body),
        }
    };
}

pub(crate) use map_array;
pub(crate) use with_array;

impl PixelArray {
    /// (bands, rows, cols)
    pub fn dim(&self) -> (usize, usize, usize) {
        with_array!(self, array => array.dim())
    }

    pub fn band_count(&self) -> usize {
        self.dim().0
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.dim();
        (rows, cols)
    }

    pub fn data_type(&self) -> GdalDataType {
        match self {
            PixelArray::U8(_) => GdalDataType::UInt8,
            PixelArray::U16(_) => GdalDataType::UInt16,
            PixelArray::I16(_) => GdalDataType::Int16,
            PixelArray::U32(_) => GdalDataType::UInt32,
            PixelArray::I32(_) => GdalDataType::Int32,
            PixelArray::F32(_) => GdalDataType::Float32,
            PixelArray::F64(_) => GdalDataType::Float64,
        }
    }
}

impl fmt::Display for PixelArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (bands, rows, cols) = self.dim();
        write!(
            f,
            "{} band(s) of {}x{} {:?}",
            bands,
            cols,
            rows,
            self.data_type()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    #[test]
    fn test_dim_and_type_follow_variant() {
        let pixels = PixelArray::I16(Array3::zeros((3, 4, 5)));

        assert_eq!(pixels.dim(), (3, 4, 5));
        assert_eq!(pixels.band_count(), 3);
        assert_eq!(pixels.shape(), (4, 5));
        assert_eq!(pixels.data_type(), GdalDataType::Int16);
    }

    #[test]
    fn test_map_array_keeps_variant() {
        let pixels = PixelArray::F32(Array3::from_elem((1, 2, 2), 1.5));

        let first_row = map_array!(pixels, array => array.slice_move(s![.., 0..1, ..]));

        assert_eq!(first_row, PixelArray::F32(Array3::from_elem((1, 1, 2), 1.5)));
    }
}
