//! Octree over axis-aligned boxes in 3D space (spec.md §4 for 3D).
//!
//! Construction, leaf lookup, mutation and query kernels are grounded in
//! the teacher's `scene/octree_scene_index.rs`, generalized from its
//! single-node-placement scheme (each object lives in exactly one node)
//! to spec.md §3 invariant 2: a non-ubiquitous element lives in *every*
//! leaf its bounds intersect, so leaves hold sets rather than a single
//! owning node per object.

use super::element::Element;
use super::node::{Node, NodeBody};
use crate::enumeration::Enumeration;
use crate::error::ConfigError;
use crate::flags::ElementFlags;
use crate::geometry::{Aabb, Frustum, FrustumTest};
use crate::node_id::next_node_id;
use crate::presence::Presence;
use crate::tree_warn;
use glam::DVec3;
use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

const ROOT: usize = 0;

/// Fixed-depth, uniformly subdivided octree.
///
/// `H` is the caller's opaque entity handle; it only needs `Eq + Hash +
/// Clone` (spec.md §6: "a handle type supporting equality and hashing").
pub struct Tree<H: Eq + Hash + Clone> {
    nodes: Vec<Node<H>>,
    leaf_directory: FxHashMap<(i64, i64, i64), usize>,
    leaf_size: DVec3,
    depth: u32,
    bounds: Aabb,
    imposter: FxHashSet<Element<H>>,
    omnipresent: FxHashSet<Element<H>>,
    elements_modified: bool,
}

impl<H: Eq + Hash + Clone> Tree<H> {
    /// Build a fixed octree of the given `depth` (`depth >= 1`) covering
    /// `size` (each axis a power of two), centred at the world origin
    /// and shifted by half a leaf size (spec.md §4.1).
    ///
    /// # Panics
    ///
    /// Panics if `depth == 0` or any `size` component is not a power of
    /// two — misconfiguration is fatal, not a recoverable error
    /// (spec.md §7.1).
    pub fn new(depth: u32, size: DVec3) -> Self {
        if depth < 1 {
            panic!("{}", ConfigError::DepthTooSmall { depth });
        }
        for (axis, value) in [("x", size.x), ("y", size.y), ("z", size.z)] {
            if !is_power_of_two(value) {
                panic!("{}", ConfigError::SizeNotPowerOfTwo { axis, value });
            }
        }

        let leaf_size = size / 2f64.powi(depth as i32 - 1);
        let half = size * 0.5;
        let min = -half + leaf_size * 0.5;
        let bounds = Aabb::new(min, min + size);

        let mut nodes = Vec::new();
        let mut leaf_directory = FxHashMap::default();
        build_recursive(&mut nodes, &mut leaf_directory, bounds, depth, min, leaf_size);

        Self {
            nodes,
            leaf_directory,
            leaf_size,
            depth,
            bounds,
            imposter: FxHashSet::default(),
            omnipresent: FxHashSet::default(),
            elements_modified: false,
        }
    }

    pub fn leaf_size(&self) -> DVec3 {
        self.leaf_size
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    // ===== leaf lookup (spec.md §4.2) =====

    fn find_node(&self, bounds: &Aabb) -> usize {
        let key = grid_key(bounds.min, self.bounds.min, self.leaf_size);
        if let Some(&leaf_idx) = self.leaf_directory.get(&key)
            && self.nodes[leaf_idx].bounds.contains(bounds)
        {
            return leaf_idx;
        }
        ROOT
    }

    // ===== ubiquitous buckets =====

    fn ubiquitous_bucket_mut(&mut self, presence: Presence) -> &mut FxHashSet<Element<H>> {
        if presence.is_imposter_type() {
            &mut self.imposter
        } else {
            &mut self.omnipresent
        }
    }

    fn upsert_ubiquitous(&mut self, presence: Presence, element: Element<H>) {
        let bucket = self.ubiquitous_bucket_mut(presence);
        bucket.remove(&element);
        bucket.insert(element);
    }

    fn remove_from_ubiquitous(&mut self, presence: Presence, element: &Element<H>) {
        self.ubiquitous_bucket_mut(presence).remove(element);
    }

    // ===== public mutation dispatch (spec.md §4.5) =====

    pub fn add(&mut self, presence: Presence, bounds: Aabb, element: Element<H>) {
        self.elements_modified = true;
        if presence.is_ubiquitous() {
            self.upsert_ubiquitous(presence, element);
            return;
        }
        if !self.bounds.intersects(&bounds) {
            tree_warn!(
                "scene_index::octree",
                "element bounds {:?} lie outside tree bounds {:?}; storing in omnipresent bucket",
                bounds,
                self.bounds
            );
            self.upsert_ubiquitous(presence, element);
            return;
        }
        let start = self.find_node(&bounds);
        self.add_recursive(start, &bounds, &element);
    }

    pub fn remove(&mut self, presence: Presence, bounds: Aabb, element: &Element<H>) {
        self.elements_modified = true;
        if presence.is_ubiquitous() || !self.bounds.intersects(&bounds) {
            self.remove_from_ubiquitous(presence, element);
            return;
        }
        let start = self.find_node(&bounds);
        self.remove_recursive(start, &bounds, element);
    }

    pub fn update(
        &mut self,
        old_presence: Presence,
        old_bounds: Aabb,
        new_presence: Presence,
        new_bounds: Aabb,
        element: Element<H>,
    ) {
        self.elements_modified = true;
        let was_spatial = !old_presence.is_ubiquitous() && self.bounds.intersects(&old_bounds);
        let is_spatial = !new_presence.is_ubiquitous() && self.bounds.intersects(&new_bounds);

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
                self.upsert_ubiquitous(new_presence, element);
            }
            (false, true) => {
                self.remove_from_ubiquitous(old_presence, &element);
                let new_node = self.find_node(&new_bounds);
                self.add_recursive(new_node, &new_bounds, &element);
            }
            (false, false) => {
                self.remove_from_ubiquitous(old_presence, &element);
                self.upsert_ubiquitous(new_presence, element);
            }
        }
    }

    // ===== mutation kernels (spec.md §4.3) =====

    fn add_recursive(&mut self, idx: usize, bounds: &Aabb, element: &Element<H>) {
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

    fn remove_recursive(&mut self, idx: usize, bounds: &Aabb, element: &Element<H>) {
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

    fn update_recursive(&mut self, idx: usize, old_bounds: &Aabb, new_bounds: &Aabb, element: &Element<H>) {
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

    fn at_point_recursive(&self, idx: usize, point: DVec3, accumulator: &mut FxHashSet<Element<H>>) {
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
                    if element.bounds().contains_point(point) {
                        accumulator.insert(element.clone());
                    }
                }
            }
        }
    }

    fn in_bounds_recursive(
        &self,
        idx: usize,
        region: &Aabb,
        predicate: &dyn Fn(&Element<H>) -> bool,
        accumulator: &mut FxHashSet<Element<H>>,
    ) {
        let node = &self.nodes[idx];
        if !node.bounds.intersects(region) {
            return;
        }
        match &node.body {
            NodeBody::Interior { children } => {
                for &child in children {
                    self.in_bounds_recursive(child, region, predicate, accumulator);
                }
            }
            NodeBody::Leaf { elements } => {
                for element in elements {
                    if element.bounds().intersects(region) && predicate(element) {
                        accumulator.insert(element.clone());
                    }
                }
            }
        }
    }

    fn in_frustum_recursive(
        &self,
        idx: usize,
        frustum: &Frustum,
        classification: FrustumTest,
        predicate: &dyn Fn(&Element<H>) -> bool,
        accumulator: &mut FxHashSet<Element<H>>,
    ) {
        match classification {
            FrustumTest::Outside => {}
            FrustumTest::Inside => self.collect_filtered(idx, predicate, accumulator),
            FrustumTest::Partial => match &self.nodes[idx].body {
                NodeBody::Leaf { elements } => {
                    for element in elements {
                        if predicate(element) && frustum.intersects_aabb(element.bounds()) {
                            accumulator.insert(element.clone());
                        }
                    }
                }
                NodeBody::Interior { children } => {
                    for &child in children {
                        let child_class = frustum.classify_aabb(&self.nodes[child].bounds);
                        self.in_frustum_recursive(child, frustum, child_class, predicate, accumulator);
                    }
                }
            },
        }
    }

    fn collect_filtered(
        &self,
        idx: usize,
        predicate: &dyn Fn(&Element<H>) -> bool,
        accumulator: &mut FxHashSet<Element<H>>,
    ) {
        match &self.nodes[idx].body {
            NodeBody::Leaf { elements } => {
                for element in elements {
                    if predicate(element) {
                        accumulator.insert(element.clone());
                    }
                }
            }
            NodeBody::Interior { children } => {
                for &child in children {
                    self.collect_filtered(child, predicate, accumulator);
                }
            }
        }
    }

    fn in_view_frustum_recursive(
        &self,
        idx: usize,
        frustum: &Frustum,
        accept_enclosed: bool,
        accumulator: &mut FxHashSet<Element<H>>,
    ) {
        let node = &self.nodes[idx];
        if !frustum.intersects_aabb(&node.bounds) {
            return;
        }
        match &node.body {
            NodeBody::Interior { children } => {
                for &child in children {
                    self.in_view_frustum_recursive(child, frustum, accept_enclosed, accumulator);
                }
            }
            NodeBody::Leaf { elements } => {
                for element in elements {
                    let accepted_presence = if accept_enclosed {
                        element.presence() == Presence::Enclosed
                    } else {
                        element.presence() == Presence::Exposed
                    };
                    if accepted_presence && frustum.intersects_aabb(element.bounds()) {
                        accumulator.insert(element.clone());
                    }
                }
            }
        }
    }

    fn filter_imposters_into(&self, accumulator: &mut FxHashSet<Element<H>>, predicate: impl Fn(&Element<H>) -> bool) {
        for element in &self.imposter {
            if predicate(element) {
                accumulator.insert(element.clone());
            }
        }
    }

    // ===== public queries (spec.md §4.4, §4.6) =====

    pub fn at_point<'a>(
        &'a self,
        point: DVec3,
        accumulator: &'a mut FxHashSet<Element<H>>,
    ) -> Enumeration<'a, Element<H>> {
        if self.elements_modified {
            self.at_point_recursive(ROOT, point, accumulator);
            self.filter_imposters_into(accumulator, |e| e.bounds().contains_point(point));
        }
        Enumeration::new(&self.omnipresent, accumulator)
    }

    pub fn in_bounds<'a>(
        &'a self,
        region: &Aabb,
        accumulator: &'a mut FxHashSet<Element<H>>,
    ) -> Enumeration<'a, Element<H>> {
        if self.elements_modified {
            self.in_bounds_recursive(ROOT, region, &|_| true, accumulator);
            self.filter_imposters_into(accumulator, |e| e.bounds().intersects(region));
        }
        Enumeration::new(&self.omnipresent, accumulator)
    }

    pub fn in_frustum<'a>(
        &'a self,
        frustum: &Frustum,
        accumulator: &'a mut FxHashSet<Element<H>>,
    ) -> Enumeration<'a, Element<H>> {
        if self.elements_modified {
            let root_class = frustum.classify_aabb(&self.nodes[ROOT].bounds);
            self.in_frustum_recursive(ROOT, frustum, root_class, &|_| true, accumulator);
            self.filter_imposters_into(accumulator, |e| frustum.intersects_aabb(e.bounds()));
        }
        Enumeration::new(&self.omnipresent, accumulator)
    }

    pub fn in_play_box<'a>(
        &'a self,
        region: &Aabb,
        accumulator: &'a mut FxHashSet<Element<H>>,
    ) -> Enumeration<'a, Element<H>> {
        if self.elements_modified {
            self.in_bounds_recursive(ROOT, region, &not_static, accumulator);
            self.filter_imposters_into(accumulator, |e| {
                !e.flags().contains(ElementFlags::STATIC) && e.bounds().intersects(region)
            });
        }
        Enumeration::new(&self.omnipresent, accumulator)
    }

    pub fn in_play_frustum<'a>(
        &'a self,
        frustum: &Frustum,
        accumulator: &'a mut FxHashSet<Element<H>>,
    ) -> Enumeration<'a, Element<H>> {
        if self.elements_modified {
            let root_class = frustum.classify_aabb(&self.nodes[ROOT].bounds);
            self.in_frustum_recursive(ROOT, frustum, root_class, &not_static, accumulator);
            self.filter_imposters_into(accumulator, |e| {
                !e.flags().contains(ElementFlags::STATIC) && frustum.intersects_aabb(e.bounds())
            });
        }
        Enumeration::new(&self.omnipresent, accumulator)
    }

    pub fn light_probes_in_play<'a>(
        &'a self,
        region: &Aabb,
        accumulator: &'a mut FxHashSet<Element<H>>,
    ) -> Enumeration<'a, Element<H>> {
        if self.elements_modified {
            self.in_bounds_recursive(ROOT, region, &has_light_probe, accumulator);
            self.filter_imposters_into(accumulator, |e| {
                e.flags().contains(ElementFlags::LIGHT_PROBE) && e.bounds().intersects(region)
            });
        }
        Enumeration::new(&self.omnipresent, accumulator)
    }

    pub fn lights_in_play<'a>(
        &'a self,
        region: &Aabb,
        accumulator: &'a mut FxHashSet<Element<H>>,
    ) -> Enumeration<'a, Element<H>> {
        if self.elements_modified {
            self.in_bounds_recursive(ROOT, region, &has_light, accumulator);
            self.filter_imposters_into(accumulator, |e| {
                e.flags().contains(ElementFlags::LIGHT) && e.bounds().intersects(region)
            });
        }
        Enumeration::new(&self.omnipresent, accumulator)
    }

    pub fn in_view<'a>(
        &'a self,
        enclosed_frustum: &Frustum,
        exposed_frustum: &Frustum,
        imposter_frustum: &Frustum,
        light_box: &Aabb,
        accumulator: &'a mut FxHashSet<Element<H>>,
    ) -> Enumeration<'a, Element<H>> {
        if self.elements_modified {
            self.in_view_frustum_recursive(ROOT, enclosed_frustum, true, accumulator);
            self.in_view_frustum_recursive(ROOT, exposed_frustum, false, accumulator);
            self.in_bounds_recursive(ROOT, light_box, &has_light, accumulator);
            self.filter_imposters_into(accumulator, |e| imposter_frustum.intersects_aabb(e.bounds()));
        }
        Enumeration::new(&self.omnipresent, accumulator)
    }

    pub fn in_play<'a>(
        &'a self,
        play_box: &Aabb,
        play_frustum: &Frustum,
        accumulator: &'a mut FxHashSet<Element<H>>,
    ) -> Enumeration<'a, Element<H>> {
        if self.elements_modified {
            self.in_bounds_recursive(ROOT, play_box, &not_static, accumulator);
            let root_class = play_frustum.classify_aabb(&self.nodes[ROOT].bounds);
            self.in_frustum_recursive(ROOT, play_frustum, root_class, &not_static, accumulator);
            self.filter_imposters_into(accumulator, |e| {
                !e.flags().contains(ElementFlags::STATIC)
                    && (e.bounds().intersects(play_box) || play_frustum.intersects_aabb(e.bounds()))
            });
        }
        Enumeration::new(&self.omnipresent, accumulator)
    }

    pub fn elements<'a>(&'a self, accumulator: &'a mut FxHashSet<Element<H>>) -> Enumeration<'a, Element<H>> {
        if self.elements_modified {
            self.collect_filtered(ROOT, &|_| true, accumulator);
            self.filter_imposters_into(accumulator, |_| true);
        }
        Enumeration::new(&self.omnipresent, accumulator)
    }
}

fn not_static<H>(element: &Element<H>) -> bool {
    !element.flags().contains(ElementFlags::STATIC)
}

fn has_light<H>(element: &Element<H>) -> bool {
    element.flags().contains(ElementFlags::LIGHT)
}

fn has_light_probe<H>(element: &Element<H>) -> bool {
    element.flags().contains(ElementFlags::LIGHT_PROBE)
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

/// Integer grid cell containing `point`, grounded in
/// `understory_index::backends::grid::GridF64::key_for`'s floor-division
/// keying scheme.
fn grid_key(point: DVec3, root_min: DVec3, leaf_size: DVec3) -> (i64, i64, i64) {
    (
        floor_to_i64((point.x - root_min.x) / leaf_size.x),
        floor_to_i64((point.y - root_min.y) / leaf_size.y),
        floor_to_i64((point.z - root_min.z) / leaf_size.z),
    )
}

/// Bounds of octant `octant` (bit0=X, bit1=Y, bit2=Z; 0=low half,
/// 1=high half), matching the teacher's `octant_aabb` bit layout
/// (spec.md §3: "k*4+j*2+i").
fn octant_bounds(parent: &Aabb, center: &DVec3, octant: u8) -> Aabb {
    Aabb::new(
        DVec3::new(
            if octant & 1 == 0 { parent.min.x } else { center.x },
            if octant & 2 == 0 { parent.min.y } else { center.y },
            if octant & 4 == 0 { parent.min.z } else { center.z },
        ),
        DVec3::new(
            if octant & 1 == 0 { center.x } else { parent.max.x },
            if octant & 2 == 0 { center.y } else { parent.max.y },
            if octant & 4 == 0 { center.z } else { parent.max.z },
        ),
    )
}

fn build_recursive<H: Eq + Hash + Clone>(
    nodes: &mut Vec<Node<H>>,
    leaf_directory: &mut FxHashMap<(i64, i64, i64), usize>,
    bounds: Aabb,
    depth: u32,
    root_min: DVec3,
    leaf_size: DVec3,
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
        body: NodeBody::Interior { children: [0; 8] },
    });

    let center = bounds.center();
    let mut children = [0usize; 8];
    for (octant, child_slot) in children.iter_mut().enumerate() {
        let child_bounds = octant_bounds(&bounds, &center, octant as u8);
        *child_slot = build_recursive(nodes, leaf_directory, child_bounds, depth - 1, root_min, leaf_size);
    }
    nodes[idx].body = NodeBody::Interior { children };
    idx
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
