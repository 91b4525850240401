//! Shaded relief from raster DEM tiles.
//!
//! A [`RenderHillshadeLayer`] turns each tile's DEM into a slope texture once
//! (the prepare pass) and shades that texture onto the map every frame (the
//! composite pass). Buckets live in a [`RasterDemSource`];
//! [`HillshadeRenderer`] drives both through a frame.

pub mod bucket;
pub mod dem;
pub mod error;
pub mod layer;
pub mod renderer;
pub mod source;
pub mod tile;

#[cfg(test)]
mod testing;

pub use bucket::HillshadeBucket;
pub use dem::{DemData, DemEncoding, encode_terrarium};
pub use error::{DemError, HillshadeError};
pub use layer::{HillshadeLayerProperties, RenderHillshadeLayer, prepare_matrix};
pub use renderer::{FRAME_PASSES, HillshadeRenderer};
pub use source::RasterDemSource;
pub use tile::{LayerPrepareParameters, RenderSource, RenderTile};
