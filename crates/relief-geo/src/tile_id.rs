//! Tile identifiers for the web-mercator tile pyramid.

/// Number of tile units along one edge of a tile, independent of zoom.
pub const EXTENT: i32 = 8192;

/// A tile in the canonical (non-wrapped) pyramid.
///
/// - `z`: zoom level. At zoom `z` the world is split into `2^z × 2^z` tiles.
/// - `x`, `y`: column and row, with row 0 at the northern edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalTileId {
    /// Zoom level.
    pub z: u8,
    /// Column, `0..2^z`.
    pub x: u32,
    /// Row, `0..2^z`.
    pub y: u32,
}

impl CanonicalTileId {
    /// Deepest zoom level that still fits tile coordinates in a `u32`.
    pub const MAX_ZOOM: u8 = 30;

    /// Number of tiles along one axis at the given zoom.
    ///
    /// # Panics
    ///
    /// Panics if `z` exceeds [`Self::MAX_ZOOM`].
    #[must_use]
    pub fn dim(z: u8) -> u32 {
        assert!(
            z <= Self::MAX_ZOOM,
            "zoom {z} exceeds MAX_ZOOM {}",
            Self::MAX_ZOOM
        );
        1 << z
    }

    /// Construct a tile id, validating `x` and `y` against the zoom level.
    ///
    /// # Panics
    ///
    /// Panics if `z` exceeds [`Self::MAX_ZOOM`] or if `x`/`y` are out of range.
    #[must_use]
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        let dim = Self::dim(z);
        assert!(x < dim, "x={x} out of range for zoom {z} (max {dim})");
        assert!(y < dim, "y={y} out of range for zoom {z} (max {dim})");
        Self { z, x, y }
    }

    /// True if `self` lies strictly inside `parent` at a deeper zoom.
    #[must_use]
    pub fn is_child_of(&self, parent: &CanonicalTileId) -> bool {
        if self.z <= parent.z {
            return false;
        }
        let dz = self.z - parent.z;
        (self.x >> dz) == parent.x && (self.y >> dz) == parent.y
    }

    /// The tile one zoom level up that contains this one.
    ///
    /// Returns `None` at zoom 0.
    #[must_use]
    pub fn parent(&self) -> Option<CanonicalTileId> {
        if self.z == 0 {
            return None;
        }
        Some(CanonicalTileId {
            z: self.z - 1,
            x: self.x / 2,
            y: self.y / 2,
        })
    }

    /// The four tiles one zoom level down, in row-major order.
    #[must_use]
    pub fn children(&self) -> [CanonicalTileId; 4] {
        let z = self.z + 1;
        let x = self.x * 2;
        let y = self.y * 2;
        [
            CanonicalTileId::new(z, x, y),
            CanonicalTileId::new(z, x + 1, y),
            CanonicalTileId::new(z, x, y + 1),
            CanonicalTileId::new(z, x + 1, y + 1),
        ]
    }
}

impl std::fmt::Display for CanonicalTileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// A canonical tile plus the world copy it is drawn in.
///
/// `wrap` is 0 for the primary world, -1 for the copy to the west, 1 for the
/// copy to the east and so on. Ordering is by wrap first, then by canonical id,
/// so that within one world copy parents sort before their children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnwrappedTileId {
    /// World copy index.
    pub wrap: i16,
    /// The canonical tile.
    pub canonical: CanonicalTileId,
}

impl UnwrappedTileId {
    /// Build an id from an unbounded column.
    ///
    /// `x` outside `0..2^z` selects a neighbouring world copy; `y` is clamped
    /// to the valid row range.
    #[must_use]
    pub fn new(z: u8, x: i64, y: i64) -> Self {
        let dim = i64::from(CanonicalTileId::dim(z));
        let wrap = x.div_euclid(dim);
        let x = x.rem_euclid(dim);
        let y = y.clamp(0, dim - 1);
        Self {
            wrap: wrap as i16,
            canonical: CanonicalTileId::new(z, x as u32, y as u32),
        }
    }

    /// Place a canonical tile in the given world copy.
    #[must_use]
    pub fn from_canonical(canonical: CanonicalTileId, wrap: i16) -> Self {
        Self { wrap, canonical }
    }

    /// Column including the world copy offset.
    #[must_use]
    pub fn unwrapped_x(&self) -> i64 {
        i64::from(self.canonical.x)
            + i64::from(self.wrap) * i64::from(CanonicalTileId::dim(self.canonical.z))
    }

    /// True if `self` is a descendant of `parent` within the same world copy.
    #[must_use]
    pub fn is_child_of(&self, parent: &UnwrappedTileId) -> bool {
        self.wrap == parent.wrap && self.canonical.is_child_of(&parent.canonical)
    }

    /// The four children within the same world copy.
    #[must_use]
    pub fn children(&self) -> [UnwrappedTileId; 4] {
        self.canonical
            .children()
            .map(|canonical| UnwrappedTileId::from_canonical(canonical, self.wrap))
    }
}

impl std::fmt::Display for UnwrappedTileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (wrap {})", self.canonical, self.wrap)
    }
}
