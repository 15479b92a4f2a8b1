//! The terrain height oracle: a deterministic height function over unit
//! sphere directions, plus the default fractal-noise implementation.

mod height_source;

pub use height_source::{FbmHeightSource, FbmParams, HeightSource};
