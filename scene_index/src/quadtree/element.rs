//! Quadtree element (spec.md §3, 2D column): an immutable value bundling
//! a cached handle hash and flag bits.
//!
//! Simpler sibling of [`crate::octree::Element`]: 2D elements carry no
//! `Presence` (the tag only ever appears at the `add`/`remove`/`update`
//! call boundary for 2D, per spec.md §3) and no `bounds` — spec.md §3 is
//! explicit that "the 2D element does not carry bounds; its node
//! membership alone implies the intersection."

use crate::flags::ElementFlags;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub struct Element<H> {
    hash: u64,
    flags: ElementFlags,
    handle: H,
}

impl<H: Hash> Element<H> {
    pub fn new(handle: H, flags: ElementFlags) -> Self {
        let mut hasher = FxHasher::default();
        handle.hash(&mut hasher);
        Self {
            hash: hasher.finish(),
            flags,
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
