//! Presence: the tag partitioning entities into spatial culling categories
//! (spec.md §3, GLOSSARY).
//!
//! 3D elements carry this tag inside the `Element` value (spec.md §3); 2D
//! carries it externally, only at the call boundary of `add`/`remove`/
//! `update`, so the 2D tree never stores it.

use crate::flags::ElementFlags;
use crate::geometry::{Aabb, Frustum};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Inside the (possibly occluded) view region.
    Enclosed,
    /// Outside the enclosed region but still visible.
    Exposed,
    /// Billboard-like proxy, tested against a looser frustum.
    Imposter,
    /// Opts out of culling entirely.
    Omnipresent,
}

impl Presence {
    pub fn is_imposter_type(self) -> bool {
        matches!(self, Presence::Imposter)
    }

    pub fn is_omnipresent_type(self) -> bool {
        matches!(self, Presence::Omnipresent)
    }

    pub fn is_ubiquitous(self) -> bool {
        self.is_imposter_type() || self.is_omnipresent_type()
    }

    /// 2D dispatch rule (spec.md §4.5, 2D column): the quadtree has no
    /// imposter concept, so only `Omnipresent` bypasses spatial
    /// placement. `Imposter` is treated as ordinary spatial presence.
    pub fn is_ubiquitous_2d(self) -> bool {
        self.is_omnipresent_type()
    }

    /// Combine presence + flags + frustums into a single visibility
    /// decision, for callers composing their own queries instead of
    /// using `Tree::in_view`/`Tree::in_play` (spec.md §6).
    #[allow(clippy::too_many_arguments)]
    pub fn intersects3d(
        self,
        flags: ElementFlags,
        bounds: &Aabb,
        enclosed_frustum: &Frustum,
        exposed_frustum: &Frustum,
        require_visible: bool,
    ) -> bool {
        if require_visible && !flags.contains(ElementFlags::VISIBLE) {
            return false;
        }
        match self {
            Presence::Omnipresent => true,
            Presence::Imposter => enclosed_frustum.intersects_aabb(bounds) || exposed_frustum.intersects_aabb(bounds),
            Presence::Enclosed => enclosed_frustum.intersects_aabb(bounds),
            Presence::Exposed => exposed_frustum.intersects_aabb(bounds),
        }
    }
}
