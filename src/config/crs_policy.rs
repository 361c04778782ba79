use serde::Deserialize;
use std::fmt;

/// What to do when the primary and secondary rasters use different CRSs.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrsPolicy {
    /// Fail before reading any pixels.
    #[default]
    #[serde(rename(deserialize = "reject"))]
    Reject,
    /// Reproject the secondary raster into the primary's CRS and grid.
    #[serde(rename(deserialize = "reproject"))]
    Reproject,
}

impl fmt::Display for CrsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CrsPolicy::Reject => write!(f, "reject"),
            CrsPolicy::Reproject => write!(f, "reproject"),
        }
    }
}
