//! Quadtree node (spec.md §3, 2D column): same tagged-union flat-arena
//! layout as [`crate::octree::node::Node`], 4-wide instead of 8-wide.

use super::element::Element;
use crate::geometry::Rect;
use rustc_hash::FxHashSet;

pub(crate) enum NodeBody<H> {
    Interior { children: [usize; 4] },
    Leaf { elements: FxHashSet<Element<H>> },
}

pub(crate) struct Node<H> {
    pub id: u64,
    pub depth: u32,
    pub bounds: Rect,
    pub body: NodeBody<H>,
}
