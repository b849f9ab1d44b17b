//! Octree node (spec.md §3): a tagged union — interior nodes carry a
//! fixed 8-wide child array, leaves (depth 1) carry an element set.
//!
//! Stored in a flat arena (`Tree::nodes: Vec<Node<H>>`) addressed by
//! `usize`, the same layout as the teacher's
//! `scene/octree_scene_index.rs::OctreeNode` flat array — not a boxed
//! recursive tree — so the leaf directory can hold plain `Copy` indices
//! instead of borrows into an owned tree.

use super::element::Element;
use crate::geometry::Aabb;
use rustc_hash::FxHashSet;

pub(crate) enum NodeBody<H> {
    Interior { children: [usize; 8] },
    Leaf { elements: FxHashSet<Element<H>> },
}

pub(crate) struct Node<H> {
    pub id: u64,
    pub depth: u32,
    pub bounds: Aabb,
    pub body: NodeBody<H>,
}
