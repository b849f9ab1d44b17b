//! Octree element (spec.md §3): an immutable value bundling a cached
//! handle hash, flag bits, presence, and the element's own AABB.
//!
//! Grounded in the teacher's `scene/render_instance.rs`, generalized
//! from a GPU-specific `RenderInstance` (keyed by a `slotmap` key) to an
//! arbitrary caller-supplied handle type.

use crate::flags::ElementFlags;
use crate::geometry::Aabb;
use crate::presence::Presence;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// One indexed entity. Equality and hashing depend solely on `handle`
/// (spec.md §3) so that `add`-then-`add` with a fresh flags/bounds value
/// refreshes the stored element without duplicating it in a leaf's set.
#[derive(Debug, Clone)]
pub struct Element<H> {
    hash: u64,
    flags: ElementFlags,
    presence: Presence,
    bounds: Aabb,
    handle: H,
}

impl<H: Hash> Element<H> {
    pub fn new(handle: H, flags: ElementFlags, presence: Presence, bounds: Aabb) -> Self {
        let mut hasher = FxHasher::default();
        handle.hash(&mut hasher);
        Self {
            hash: hasher.finish(),
            flags,
            presence,
            bounds,
            handle,
        }
    }
}

impl<H> Element<H> {
    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn flags(&self) -> ElementFlags {
        self.flags
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }
}

impl<H: Eq> PartialEq for Element<H> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<H: Eq> Eq for Element<H> {}

impl<H> Hash for Element<H> {
    fn hash<Hsh: Hasher>(&self, state: &mut Hsh) {
        state.write_u64(self.hash);
    }
}
