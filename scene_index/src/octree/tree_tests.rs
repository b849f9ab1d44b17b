use super::*;
use crate::flags::ElementFlags;
use crate::geometry::Aabb;
use crate::presence::Presence;
use glam::{DVec3, Mat4, Vec3};
use rustc_hash::FxHashSet;

fn handles<H: Eq + Hash + Clone + Ord>(accumulator: &FxHashSet<Element<H>>) -> Vec<H> {
    let mut v: Vec<H> = accumulator.iter().map(|e| e.handle().clone()).collect();
    v.sort();
    v
}

fn enclosed_frustum_for(center: DVec3) -> Frustum {
    let eye = center + DVec3::new(0.0, 0.0, 10.0);
    let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 1000.0);
    let view = Mat4::look_at_rh(eye.as_vec3(), center.as_vec3(), Vec3::Y);
    Frustum::from_view_projection(&(proj * view))
}

// S1: make(depth=3, size=(8,8,8)) -> leaf size (2,2,2), root min (-3,-3,-3).
#[test]
fn s1_construction_and_at_point() {
    let tree: Tree<u32> = Tree::new(3, DVec3::splat(8.0));
    assert_eq!(tree.leaf_size(), DVec3::splat(2.0));
    assert_eq!(tree.bounds().min, DVec3::splat(-3.0));

    let mut tree = tree;
    let bounds_a = Aabb::new(DVec3::splat(0.0), DVec3::splat(1.0));
    tree.add(
        Presence::Enclosed,
        bounds_a,
        Element::new(1u32, ElementFlags::VISIBLE, Presence::Enclosed, bounds_a),
    );

    let mut acc = FxHashSet::default();
    let found = tree.at_point(DVec3::splat(0.5), &mut acc).next().is_some();
    assert!(found);

    acc.clear();
    let found = tree.at_point(DVec3::splat(5.0), &mut acc).next().is_some();
    assert!(!found);
}

// S2: Omnipresent element is always returned by inFrustum and elements().
#[test]
fn s2_omnipresent_always_returned() {
    let mut tree: Tree<u32> = Tree::new(3, DVec3::splat(8.0));
    let bounds_a = Aabb::new(DVec3::splat(0.0), DVec3::splat(1.0));
    tree.add(
        Presence::Enclosed,
        bounds_a,
        Element::new(1u32, ElementFlags::VISIBLE, Presence::Enclosed, bounds_a),
    );
    let bounds_b = Aabb::new(DVec3::splat(100.0), DVec3::splat(101.0));
    tree.add(
        Presence::Omnipresent,
        bounds_b,
        Element::new(2u32, ElementFlags::VISIBLE, Presence::Omnipresent, bounds_b),
    );

    let far_frustum = enclosed_frustum_for(DVec3::splat(1000.0));
    let mut acc = FxHashSet::default();
    assert_eq!(handles(&tree.in_frustum(&far_frustum, &mut acc).cloned_handles()), vec![2]);

    acc.clear();
    assert_eq!(handles(&tree.elements(&mut acc).cloned_handles()), vec![1, 2]);
}

// S3: update relocates an element from one leaf to another.
#[test]
fn s3_update_relocates_element() {
    let mut tree: Tree<u32> = Tree::new(3, DVec3::splat(8.0));
    let old_bounds = Aabb::new(DVec3::splat(0.0), DVec3::splat(1.0));
    let element = Element::new(1u32, ElementFlags::VISIBLE, Presence::Enclosed, old_bounds);
    tree.add(Presence::Enclosed, old_bounds, element.clone());

    let new_bounds = Aabb::new(DVec3::splat(4.0), DVec3::splat(5.0));
    let updated = Element::new(1u32, ElementFlags::VISIBLE, Presence::Enclosed, new_bounds);
    tree.update(Presence::Enclosed, old_bounds, Presence::Enclosed, new_bounds, updated);

    let mut acc = FxHashSet::default();
    assert!(tree.at_point(DVec3::splat(0.5), &mut acc).next().is_none());
    acc.clear();
    assert!(tree.at_point(DVec3::splat(4.5), &mut acc).next().is_some());
}

// S4: Static exclusion for inPlay; lightsInPlay ignores Static.
#[test]
fn s4_static_exclusion_and_light_filters() {
    let mut tree: Tree<u32> = Tree::new(3, DVec3::splat(8.0));
    let bounds_b = Aabb::new(DVec3::splat(100.0), DVec3::splat(101.0));
    tree.add(
        Presence::Omnipresent,
        bounds_b,
        Element::new(2u32, ElementFlags::VISIBLE, Presence::Omnipresent, bounds_b),
    );
    let bounds_c = Aabb::new(DVec3::splat(0.0), DVec3::splat(1.0));
    tree.add(
        Presence::Enclosed,
        bounds_c,
        Element::new(
            3u32,
            ElementFlags::VISIBLE | ElementFlags::LIGHT | ElementFlags::STATIC,
            Presence::Enclosed,
            bounds_c,
        ),
    );

    let region = Aabb::new(DVec3::splat(-1.0), DVec3::splat(2.0));
    let mut acc = FxHashSet::default();
    assert_eq!(handles(&tree.in_bounds(&region, &mut acc).cloned_handles()), vec![2, 3]);

    acc.clear();
    let play_frustum = enclosed_frustum_for(DVec3::splat(1000.0));
    assert_eq!(
        handles(&tree.in_play_box(&region, &mut acc).cloned_handles()),
        vec![2]
    );
    acc.clear();
    assert_eq!(
        handles(&tree.in_play_frustum(&play_frustum, &mut acc).cloned_handles()),
        vec![2]
    );

    // B is Omnipresent, which §4.6 concatenates unconditionally even
    // against a light-role filter; only C qualifies through the filter
    // itself.
    acc.clear();
    let light_box = Aabb::new(DVec3::splat(-1.0), DVec3::splat(2.0));
    assert_eq!(
        handles(&tree.lights_in_play(&light_box, &mut acc).cloned_handles()),
        vec![2, 3]
    );
}

// S5: freshly constructed tree short-circuits to empty; post add+remove
// stays sticky-dirty but resolves back to only the ubiquitous buckets.
#[test]
fn s5_short_circuit_on_fresh_tree() {
    let tree: Tree<u32> = Tree::new(3, DVec3::splat(8.0));
    let mut acc = FxHashSet::default();
    assert!(tree.elements(&mut acc).next().is_none());

    let mut tree = tree;
    let bounds = Aabb::new(DVec3::splat(0.0), DVec3::splat(1.0));
    let element = Element::new(1u32, ElementFlags::VISIBLE, Presence::Enclosed, bounds);
    tree.add(Presence::Enclosed, bounds, element.clone());
    tree.remove(Presence::Enclosed, bounds, &element);

    acc.clear();
    assert!(tree.elements(&mut acc).next().is_none());
}

// S6: out-of-bounds add spills into the omnipresent bucket.
#[test]
fn s6_out_of_bounds_add_spills_to_omnipresent() {
    let mut tree: Tree<u32> = Tree::new(3, DVec3::splat(8.0));
    let bounds = Aabb::new(DVec3::splat(1000.0), DVec3::splat(1001.0));
    tree.add(
        Presence::Enclosed,
        bounds,
        Element::new(1u32, ElementFlags::VISIBLE, Presence::Enclosed, bounds),
    );

    let mut acc = FxHashSet::default();
    assert_eq!(handles(&tree.elements(&mut acc).cloned_handles()), vec![1]);
}

#[test]
#[should_panic(expected = "depth = 0 must be >= 1")]
fn construction_rejects_zero_depth() {
    let _: Tree<u32> = Tree::new(0, DVec3::splat(8.0));
}

#[test]
#[should_panic(expected = "size.x = 3 is not a power of two")]
fn construction_rejects_non_power_of_two_size() {
    let _: Tree<u32> = Tree::new(2, DVec3::new(3.0, 8.0, 8.0));
}

#[test]
fn idempotent_add_and_remove() {
    let mut tree: Tree<u32> = Tree::new(2, DVec3::splat(4.0));
    let bounds = Aabb::new(DVec3::splat(0.0), DVec3::splat(1.0));
    let element = Element::new(1u32, ElementFlags::VISIBLE, Presence::Enclosed, bounds);
    tree.add(Presence::Enclosed, bounds, element.clone());
    tree.add(Presence::Enclosed, bounds, element.clone());

    let mut acc = FxHashSet::default();
    assert_eq!(handles(&tree.elements(&mut acc).cloned_handles()), vec![1]);

    tree.remove(Presence::Enclosed, bounds, &element);
    tree.remove(Presence::Enclosed, bounds, &element);
    acc.clear();
    assert!(tree.elements(&mut acc).next().is_none());
}

#[test]
fn imposter_is_refiltered_against_query_region() {
    let mut tree: Tree<u32> = Tree::new(3, DVec3::splat(8.0));
    let bounds = Aabb::new(DVec3::splat(0.0), DVec3::splat(1.0));
    tree.add(
        Presence::Imposter,
        bounds,
        Element::new(1u32, ElementFlags::VISIBLE, Presence::Imposter, bounds),
    );

    let region_hit = Aabb::new(DVec3::splat(-1.0), DVec3::splat(2.0));
    let mut acc = FxHashSet::default();
    assert_eq!(handles(&tree.in_bounds(&region_hit, &mut acc).cloned_handles()), vec![1]);

    let region_miss = Aabb::new(DVec3::splat(50.0), DVec3::splat(51.0));
    acc.clear();
    assert!(tree.in_bounds(&region_miss, &mut acc).next().is_none());
}

trait ClonedHandles<H: Eq + Hash + Clone> {
    fn cloned_handles(self) -> FxHashSet<Element<H>>;
}

impl<'a, H: Eq + Hash + Clone + 'a> ClonedHandles<H> for Enumeration<'a, Element<H>> {
    fn cloned_handles(self) -> FxHashSet<Element<H>> {
        self.cloned().collect()
    }
}
