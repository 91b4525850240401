//! Render passes a layer can take part in.

/// One pass of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// No pass. Used as the "inactive" marker.
    None,
    Opaque,
    Translucent,
    /// Offscreen work done before the main passes.
    Pass3D,
}

/// A set of [`RenderPass`] values.
///
/// The empty set stands for [`RenderPass::None`]: `contains(RenderPass::None)`
/// is true exactly when no real pass is present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RenderPasses {
    opaque: bool,
    translucent: bool,
    pass_3d: bool,
}

impl RenderPasses {
    pub const NONE: RenderPasses = RenderPasses {
        opaque: false,
        translucent: false,
        pass_3d: false,
    };

    pub fn of(passes: &[RenderPass]) -> Self {
        passes.iter().fold(Self::NONE, |mut set, pass| {
            set.insert(*pass);
            set
        })
    }

    pub fn insert(&mut self, pass: RenderPass) {
        match pass {
            RenderPass::None => {}
            RenderPass::Opaque => self.opaque = true,
            RenderPass::Translucent => self.translucent = true,
            RenderPass::Pass3D => self.pass_3d = true,
        }
    }

    pub fn contains(&self, pass: RenderPass) -> bool {
        match pass {
            RenderPass::None => self.is_empty(),
            RenderPass::Opaque => self.opaque,
            RenderPass::Translucent => self.translucent,
            RenderPass::Pass3D => self.pass_3d,
        }
    }

    #[must_use]
    pub fn union(self, other: RenderPasses) -> RenderPasses {
        RenderPasses {
            opaque: self.opaque || other.opaque,
            translucent: self.translucent || other.translucent,
            pass_3d: self.pass_3d || other.pass_3d,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.opaque || self.translucent || self.pass_3d)
    }

    /// Contained passes in frame order: 3D, opaque, translucent.
    pub fn iter(&self) -> impl Iterator<Item = RenderPass> + '_ {
        [RenderPass::Pass3D, RenderPass::Opaque, RenderPass::Translucent]
            .into_iter()
            .filter(|pass| self.contains(*pass))
    }
}
