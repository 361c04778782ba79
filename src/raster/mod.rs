pub mod pixels;
pub mod source;
pub mod writer;

pub(crate) use pixels::{map_array, with_array};
pub use pixels::{PixelArray, Sample};
pub use source::RasterSource;
pub use writer::{StagedRaster, commit_all, stage};
