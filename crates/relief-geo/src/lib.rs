//! Tile pyramid geometry: tile identifiers, tile-edge latitudes, tile masks and
//! the camera transform that places tiles on screen.

pub mod latlng;
pub mod tile_id;
pub mod tile_mask;
pub mod transform;

pub use latlng::{LatLng, MAX_LATITUDE, tile_row_latitude};
pub use tile_id::{CanonicalTileId, EXTENT, UnwrappedTileId};
pub use tile_mask::{MaskedRenderable, TileMask, full_tile_mask, update_tile_masks};
pub use transform::TransformState;
