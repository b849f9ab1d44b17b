//! Quadtree over axis-aligned rects in 2D space (spec.md §4 for 2D).
//!
//! Simpler sibling of [`crate::octree::tree::Tree`]: no `Presence` stored
//! on the element, a single ubiquitous bucket (only `Omnipresent` ever
//! bypasses spatial placement, spec.md §4.5's 2D column), and a query
//! surface of `in_view`/`in_play`/`in_bounds` that spec.md §9 resolves to
//! three names sharing one kernel.

use super::element::Element;
use super::node::{Node, NodeBody};
use crate::enumeration::Enumeration;
use crate::error::ConfigError;
use crate::geometry::Rect;
use crate::node_id::next_node_id;
use crate::presence::Presence;
use crate::tree_warn;
use glam::DVec2;
use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

const ROOT: usize = 0;

/// Fixed-depth, uniformly subdivided quadtree.
pub struct Tree<H: Eq + Hash + Clone> {
    nodes: Vec<Node<H>>,
    leaf_directory: FxHashMap<(i64, i64), usize>,
    leaf_size: DVec2,
    depth: u32,
    bounds: Rect,
    omnipresent: FxHashSet<Element<H>>,
    elements_modified: bool,
}

impl<H: Eq + Hash + Clone> Tree<H> {
    /// Build a fixed quadtree of the given `depth` (`depth >= 1`)
    /// covering `size` (each axis a power of two), centred at the world
    /// origin and shifted by half a leaf size (spec.md §4.1).
    ///
    /// # Panics
    ///
    /// Panics if `depth == 0` or any `size` component is not a power of
    /// two (spec.md §7.1).
    pub fn new(depth: u32, size: DVec2) -> Self {
        if depth < 1 {
            panic!("{}", ConfigError::DepthTooSmall { depth });
        }
        for (axis, value) in [("x", size.x), ("y", size.y)] {
            if !is_power_of_two(value) {
                panic!("{}", ConfigError::SizeNotPowerOfTwo { axis, value });
            }
        }

        let leaf_size = size / 2f64.powi(depth as i32 - 1);
        let half = size * 0.5;
        let min = -half + leaf_size * 0.5;
        let bounds = Rect::new(min, min + size);

        let mut nodes = Vec::new();
        let mut leaf_directory = FxHashMap::default();
        build_recursive(&mut nodes, &mut leaf_directory, bounds, depth, min, leaf_size);

        Self {
            nodes,
            leaf_directory,
            leaf_size,
            depth,
            bounds,
            omnipresent: FxHashSet::default(),
            elements_modified: false,
        }
    }

    pub fn leaf_size(&self) -> DVec2 {
        self.leaf_size
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    fn find_node(&self, bounds: &Rect) -> usize {
        let key = grid_key(bounds.min, self.bounds.min, self.leaf_size);
        if let Some(&leaf_idx) = self.leaf_directory.get(&key)
            && self.nodes[leaf_idx].bounds.contains(bounds)
        {
            return leaf_idx;
        }
        ROOT
    }

    fn upsert_ubiquitous(&mut self, element: Element<H>) {
        self.omnipresent.remove(&element);
        self.omnipresent.insert(element);
    }

    // ===== public mutation dispatch (spec.md §4.5, 2D column) =====

    pub fn add(&mut self, presence: Presence, bounds: Rect, element: Element<H>) {
        self.elements_modified = true;
        if presence.is_ubiquitous_2d() {
            self.upsert_ubiquitous(element);
            return;
        }
        if !self.bounds.intersects(&bounds) {
            tree_warn!(
                "scene_index::quadtree",
                "element bounds {:?} lie outside tree bounds {:?}; storing in omnipresent bucket",
                bounds,
                self.bounds
            );
            self.upsert_ubiquitous(element);
            return;
        }
        let start = self.find_node(&bounds);
        self.add_recursive(start, &bounds, &element);
    }

    pub fn remove(&mut self, presence: Presence, bounds: Rect, element: &Element<H>) {
        self.elements_modified = true;
        if presence.is_ubiquitous_2d() || !self.bounds.intersects(&bounds) {
            self.omnipresent.remove(element);
            return;
        }
        let start = self.find_node(&bounds);
        self.remove_recursive(start, &bounds, element);
    }

    pub fn update(
        &mut self,
        old_presence: Presence,
        old_bounds: Rect,
        new_presence: Presence,
        new_bounds: Rect,
        element: Element<H>,
    ) {
        self.elements_modified = true;
        let was_spatial = !old_presence.is_ubiquitous_2d() && self.bounds.intersects(&old_bounds);
        let is_spatial = !new_presence.is_ubiquitous_2d() && self.bounds.intersects(&new_bounds);

        match (was_spatial, is_spatial) {
            (true, true) => {
                let old_node = self.find_node(&old_bounds);
                let new_node = self.find_node(&new_bounds);
                if self.nodes[old_node].id == self.nodes[new_node].id {
                    self.update_recursive(new_node, &old_bounds, &new_bounds, &element);
                } else {
                    self.remove_recursive(old_node, &old_bounds, &element);
                    self.add_recursive(new_node, &new_bounds, &element);
                }
            }
            (true, false) => {
                let old_node = self.find_node(&old_bounds);
                self.remove_recursive(old_node, &old_bounds, &element);
                self.upsert_ubiquitous(element);
            }
            (false, true) => {
                self.omnipresent.remove(&element);
                let new_node = self.find_node(&new_bounds);
                self.add_recursive(new_node, &new_bounds, &element);
            }
            (false, false) => {
                self.omnipresent.remove(&element);
                self.upsert_ubiquitous(element);
            }
        }
    }

    // ===== mutation kernels (spec.md §4.3) =====

    fn add_recursive(&mut self, idx: usize, bounds: &Rect, element: &Element<H>) {
        if !self.nodes[idx].bounds.intersects(bounds) {
            return;
        }
        match &self.nodes[idx].body {
            NodeBody::Interior { children } => {
                let children = *children;
                for child in children {
                    self.add_recursive(child, bounds, element);
                }
            }
            NodeBody::Leaf { .. } => {
                let NodeBody::Leaf { elements } = &mut self.nodes[idx].body else {
                    unreachable!("leaf reached at depth {}", self.nodes[idx].depth);
                };
                elements.remove(element);
                elements.insert(element.clone());
            }
        }
    }

    fn remove_recursive(&mut self, idx: usize, bounds: &Rect, element: &Element<H>) {
        if !self.nodes[idx].bounds.intersects(bounds) {
            return;
        }
        match &self.nodes[idx].body {
            NodeBody::Interior { children } => {
                let children = *children;
                for child in children {
                    self.remove_recursive(child, bounds, element);
                }
            }
            NodeBody::Leaf { .. } => {
                let NodeBody::Leaf { elements } = &mut self.nodes[idx].body else {
                    unreachable!("leaf reached at depth {}", self.nodes[idx].depth);
                };
                elements.remove(element);
            }
        }
    }

    fn update_recursive(&mut self, idx: usize, old_bounds: &Rect, new_bounds: &Rect, element: &Element<H>) {
        let node_bounds = self.nodes[idx].bounds;
        if !node_bounds.intersects(old_bounds) && !node_bounds.intersects(new_bounds) {
            return;
        }
        match &self.nodes[idx].body {
            NodeBody::Interior { children } => {
                let children = *children;
                for child in children {
                    self.update_recursive(child, old_bounds, new_bounds, element);
                }
            }
            NodeBody::Leaf { .. } => {
                let NodeBody::Leaf { elements } = &mut self.nodes[idx].body else {
                    unreachable!("leaf reached at depth {}", self.nodes[idx].depth);
                };
                if node_bounds.intersects(new_bounds) {
                    elements.remove(element);
                    elements.insert(element.clone());
                } else if node_bounds.intersects(old_bounds) {
                    elements.remove(element);
                }
            }
        }
    }

    // ===== query kernels (spec.md §4.4) =====

    fn at_point_recursive(&self, idx: usize, point: DVec2, accumulator: &mut FxHashSet<Element<H>>) {
        let node = &self.nodes[idx];
        if !node.bounds.contains_point(point) {
            return;
        }
        match &node.body {
            NodeBody::Interior { children } => {
                for &child in children {
                    self.at_point_recursive(child, point, accumulator);
                }
            }
            NodeBody::Leaf { elements } => {
                for element in elements {
                    accumulator.insert(element.clone());
                }
            }
        }
    }

    fn in_bounds_recursive(&self, idx: usize, region: &Rect, accumulator: &mut FxHashSet<Element<H>>) {
        let node = &self.nodes[idx];
        if !node.bounds.intersects(region) {
            return;
        }
        match &node.body {
            NodeBody::Interior { children } => {
                for &child in children {
                    self.in_bounds_recursive(child, region, accumulator);
                }
            }
            NodeBody::Leaf { elements } => {
                for element in elements {
                    accumulator.insert(element.clone());
                }
            }
        }
    }

    fn collect_all(&self, idx: usize, accumulator: &mut FxHashSet<Element<H>>) {
        match &self.nodes[idx].body {
            NodeBody::Leaf { elements } => {
                for element in elements {
                    accumulator.insert(element.clone());
                }
            }
            NodeBody::Interior { children } => {
                for &child in children {
                    self.collect_all(child, accumulator);
                }
            }
        }
    }

    // ===== public queries (spec.md §4.4, §4.6) =====

    pub fn at_point<'a>(
        &'a self,
        point: DVec2,
        accumulator: &'a mut FxHashSet<Element<H>>,
    ) -> Enumeration<'a, Element<H>> {
        if self.elements_modified {
            self.at_point_recursive(ROOT, point, accumulator);
        }
        Enumeration::new(&self.omnipresent, accumulator)
    }

    pub fn in_bounds<'a>(
        &'a self,
        region: &Rect,
        accumulator: &'a mut FxHashSet<Element<H>>,
    ) -> Enumeration<'a, Element<H>> {
        if self.elements_modified {
            self.in_bounds_recursive(ROOT, region, accumulator);
        }
        Enumeration::new(&self.omnipresent, accumulator)
    }

    /// Same kernel as [`Tree::in_bounds`] under a second public name
    /// (spec.md §9: both are named entry points callers rely on).
    pub fn in_view<'a>(
        &'a self,
        region: &Rect,
        accumulator: &'a mut FxHashSet<Element<H>>,
    ) -> Enumeration<'a, Element<H>> {
        self.in_bounds(region, accumulator)
    }

    /// Same kernel as [`Tree::in_bounds`] under a third public name
    /// (spec.md §9: both are named entry points callers rely on).
    pub fn in_play<'a>(
        &'a self,
        region: &Rect,
        accumulator: &'a mut FxHashSet<Element<H>>,
    ) -> Enumeration<'a, Element<H>> {
        self.in_bounds(region, accumulator)
    }

    pub fn elements<'a>(&'a self, accumulator: &'a mut FxHashSet<Element<H>>) -> Enumeration<'a, Element<H>> {
        if self.elements_modified {
            self.collect_all(ROOT, accumulator);
        }
        Enumeration::new(&self.omnipresent, accumulator)
    }
}

fn is_power_of_two(value: f64) -> bool {
    value > 0.0 && value.log2().fract().abs() < 1e-9
}

fn floor_to_i64(value: f64) -> i64 {
    let i = value as i64;
    if (i as f64) > value {
        i - 1
    } else {
        i
    }
}

fn grid_key(point: DVec2, root_min: DVec2, leaf_size: DVec2) -> (i64, i64) {
    (
        floor_to_i64((point.x - root_min.x) / leaf_size.x),
        floor_to_i64((point.y - root_min.y) / leaf_size.y),
    )
}

/// Bounds of quadrant `quadrant` (bit0=X, bit1=Y; 0=low half, 1=high
/// half), matching spec.md §3's "j*2+i" bit layout.
fn quadrant_bounds(parent: &Rect, center: &DVec2, quadrant: u8) -> Rect {
    Rect::new(
        DVec2::new(
            if quadrant & 1 == 0 { parent.min.x } else { center.x },
            if quadrant & 2 == 0 { parent.min.y } else { center.y },
        ),
        DVec2::new(
            if quadrant & 1 == 0 { center.x } else { parent.max.x },
            if quadrant & 2 == 0 { center.y } else { parent.max.y },
        ),
    )
}

fn build_recursive<H: Eq + Hash + Clone>(
    nodes: &mut Vec<Node<H>>,
    leaf_directory: &mut FxHashMap<(i64, i64), usize>,
    bounds: Rect,
    depth: u32,
    root_min: DVec2,
    leaf_size: DVec2,
) -> usize {
    let idx = nodes.len();

    if depth == 1 {
        nodes.push(Node {
            id: next_node_id(),
            depth,
            bounds,
            body: NodeBody::Leaf {
                elements: FxHashSet::default(),
            },
        });
        leaf_directory.insert(grid_key(bounds.min, root_min, leaf_size), idx);
        return idx;
    }

    nodes.push(Node {
        id: next_node_id(),
        depth,
        bounds,
        body: NodeBody::Interior { children: [0; 4] },
    });

    let center = bounds.center();
    let mut children = [0usize; 4];
    for (quadrant, child_slot) in children.iter_mut().enumerate() {
        let child_bounds = quadrant_bounds(&bounds, &center, quadrant as u8);
        *child_slot = build_recursive(nodes, leaf_directory, child_bounds, depth - 1, root_min, leaf_size);
    }
    nodes[idx].body = NodeBody::Interior { children };
    idx
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
