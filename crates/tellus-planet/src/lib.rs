//! Planet assembly: the six cube-face terrain roots plus planet-level
//! clipping-plane accumulation and ground-height queries.

mod planet;
mod terrain;

pub use planet::{ClippingRange, GROUND_QUERY_LEVEL, Planet};
pub use terrain::Terrain;
