//! Tile masks: which parts of a tile are not already drawn by a deeper tile.
//!
//! When a parent tile and some of its descendants are rendered in the same
//! frame, the parent only needs to cover the area its descendants leave open.
//! A [`TileMask`] lists those open regions as tile ids *relative* to the tile
//! they belong to, so `{0/0/0}` means "the whole tile" and `{1/1/0}` means
//! "only the north-east quarter".

use std::collections::BTreeSet;

use crate::tile_id::{CanonicalTileId, UnwrappedTileId};

/// Set of relative sub-tiles that a tile is responsible for drawing.
pub type TileMask = BTreeSet<CanonicalTileId>;

/// The mask covering an entire tile.
#[must_use]
pub fn full_tile_mask() -> TileMask {
    TileMask::from([CanonicalTileId::new(0, 0, 0)])
}

/// Something placed in the render set that can receive a mask.
pub trait MaskedRenderable {
    /// The tile this renderable draws.
    fn id(&self) -> UnwrappedTileId;
    /// Unused renderables neither receive masks nor cover other tiles.
    fn is_used(&self) -> bool;
    /// Store the computed mask.
    fn set_mask(&mut self, mask: TileMask);
}

impl<R: MaskedRenderable + ?Sized> MaskedRenderable for &mut R {
    fn id(&self) -> UnwrappedTileId {
        (**self).id()
    }

    fn is_used(&self) -> bool {
        (**self).is_used()
    }

    fn set_mask(&mut self, mask: TileMask) {
        (**self).set_mask(mask);
    }
}

/// Compute masks for every used renderable.
///
/// The slice is sorted by tile id first, which puts parents ahead of their
/// children within each world copy.
pub fn update_tile_masks<R: MaskedRenderable>(renderables: &mut [R]) {
    renderables.sort_by_key(|r| r.id());

    for i in 0..renderables.len() {
        if !renderables[i].is_used() {
            continue;
        }
        let id = renderables[i].id();
        let mut mask = TileMask::new();
        compute_tile_masks(&id.canonical, &id, &renderables[i + 1..], &mut mask);
        renderables[i].set_mask(mask);
    }
}

/// Recursively collect the parts of `reference` that none of `rest` cover.
fn compute_tile_masks<R: MaskedRenderable>(
    root: &CanonicalTileId,
    reference: &UnwrappedTileId,
    rest: &[R],
    mask: &mut TileMask,
) {
    for (offset, renderable) in rest.iter().enumerate() {
        if !renderable.is_used() {
            continue;
        }
        let id = renderable.id();
        if id == *reference {
            // Covered exactly by another tile.
            return;
        }
        if id.is_child_of(reference) {
            for child in reference.children() {
                compute_tile_masks(root, &child, &rest[offset..], mask);
            }
            return;
        }
    }

    let dz = reference.canonical.z - root.z;
    mask.insert(CanonicalTileId::new(
        dz,
        reference.canonical.x - (root.x << dz),
        reference.canonical.y - (root.y << dz),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Renderable {
        id: UnwrappedTileId,
        used: bool,
        mask: Option<TileMask>,
    }

    impl Renderable {
        fn new(z: u8, x: i64, y: i64) -> Self {
            Self {
                id: UnwrappedTileId::new(z, x, y),
                used: true,
                mask: None,
            }
        }
    }

    impl MaskedRenderable for Renderable {
        fn id(&self) -> UnwrappedTileId {
            self.id
        }

        fn is_used(&self) -> bool {
            self.used
        }

        fn set_mask(&mut self, mask: TileMask) {
            self.mask = Some(mask);
        }
    }

    fn mask_of(items: &[Renderable], z: u8, x: i64, y: i64) -> TileMask {
        let id = UnwrappedTileId::new(z, x, y);
        items
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| r.mask.clone())
            .unwrap()
    }

    #[test]
    fn test_single_tile_gets_full_mask() {
        let mut items = vec![Renderable::new(3, 2, 2)];
        update_tile_masks(&mut items);
        assert_eq!(items[0].mask, Some(full_tile_mask()));
    }

    #[test]
    fn test_parent_masks_out_child_quadrant() {
        let mut items = vec![Renderable::new(2, 0, 0), Renderable::new(1, 0, 0)];
        update_tile_masks(&mut items);

        let parent = mask_of(&items, 1, 0, 0);
        let expected = TileMask::from([
            CanonicalTileId::new(1, 1, 0),
            CanonicalTileId::new(1, 0, 1),
            CanonicalTileId::new(1, 1, 1),
        ]);
        assert_eq!(parent, expected);
        assert_eq!(mask_of(&items, 2, 0, 0), full_tile_mask());
    }

    #[test]
    fn test_grandchild_splits_recursively() {
        let mut items = vec![Renderable::new(0, 0, 0), Renderable::new(2, 0, 0)];
        update_tile_masks(&mut items);

        let root = mask_of(&items, 0, 0, 0);
        assert_eq!(root.len(), 6);
        assert!(root.contains(&CanonicalTileId::new(1, 1, 1)));
        assert!(root.contains(&CanonicalTileId::new(2, 1, 0)));
        assert!(!root.contains(&CanonicalTileId::new(2, 0, 0)));
    }

    #[test]
    fn test_unused_tiles_do_not_cover() {
        let mut child = Renderable::new(2, 0, 0);
        child.used = false;
        let mut items = vec![Renderable::new(1, 0, 0), child];
        update_tile_masks(&mut items);

        assert_eq!(mask_of(&items, 1, 0, 0), full_tile_mask());
        let child = items.iter().find(|r| !r.used).unwrap();
        assert!(child.mask.is_none());
    }

    #[test]
    fn test_other_world_copy_does_not_cover() {
        let mut items = vec![Renderable::new(1, 0, 0), Renderable::new(2, 4, 0)];
        update_tile_masks(&mut items);
        assert_eq!(mask_of(&items, 1, 0, 0), full_tile_mask());
    }

    #[test]
    fn test_mutable_references_can_be_masked() {
        let mut a = Renderable::new(1, 0, 0);
        let mut b = Renderable::new(2, 1, 1);
        {
            let mut refs = vec![&mut b, &mut a];
            update_tile_masks(&mut refs);
        }
        assert_eq!(a.mask.as_ref().map(|m| m.len()), Some(3));
        assert_eq!(b.mask, Some(full_tile_mask()));
    }
}
