use super::*;
use crate::flags::ElementFlags;
use crate::geometry::Rect;
use crate::presence::Presence;
use rustc_hash::FxHashSet;

fn handles<H: Eq + Hash + Clone + Ord>(accumulator: &FxHashSet<Element<H>>) -> Vec<H> {
    let mut v: Vec<H> = accumulator.iter().map(|e| e.handle().clone()).collect();
    v.sort();
    v
}

#[test]
fn construction_matches_power_of_two_layout() {
    let tree: Tree<u32> = Tree::new(3, DVec2::splat(8.0));
    assert_eq!(tree.leaf_size(), DVec2::splat(2.0));
    assert_eq!(tree.bounds().min, DVec2::splat(-3.0));
}

#[test]
fn add_then_at_point_finds_element() {
    let mut tree: Tree<u32> = Tree::new(3, DVec2::splat(8.0));
    let bounds = Rect::new(DVec2::splat(0.0), DVec2::splat(1.0));
    tree.add(Presence::Enclosed, bounds, Element::new(1u32, ElementFlags::VISIBLE));

    let mut acc = FxHashSet::default();
    assert!(tree.at_point(DVec2::splat(0.5), &mut acc).next().is_some());
    acc.clear();
    assert!(tree.at_point(DVec2::splat(5.0), &mut acc).next().is_none());
}

#[test]
fn omnipresent_element_always_returned() {
    let mut tree: Tree<u32> = Tree::new(3, DVec2::splat(8.0));
    let bounds = Rect::new(DVec2::splat(0.0), DVec2::splat(1.0));
    tree.add(Presence::Omnipresent, bounds, Element::new(2u32, ElementFlags::VISIBLE));

    let mut acc = FxHashSet::default();
    let far = Rect::new(DVec2::splat(1000.0), DVec2::splat(1001.0));
    assert_eq!(handles(&tree.in_bounds(&far, &mut acc).cloned().collect()), vec![2]);
}

#[test]
fn update_relocates_element() {
    let mut tree: Tree<u32> = Tree::new(3, DVec2::splat(8.0));
    let old_bounds = Rect::new(DVec2::splat(0.0), DVec2::splat(1.0));
    let element = Element::new(1u32, ElementFlags::VISIBLE);
    tree.add(Presence::Enclosed, old_bounds, element.clone());

    let new_bounds = Rect::new(DVec2::splat(4.0), DVec2::splat(5.0));
    let updated = Element::new(1u32, ElementFlags::VISIBLE);
    tree.update(Presence::Enclosed, old_bounds, Presence::Enclosed, new_bounds, updated);

    let mut acc = FxHashSet::default();
    assert!(tree.at_point(DVec2::splat(0.5), &mut acc).next().is_none());
    acc.clear();
    assert!(tree.at_point(DVec2::splat(4.5), &mut acc).next().is_some());
}

#[test]
fn in_view_in_play_in_bounds_share_results() {
    let mut tree: Tree<u32> = Tree::new(3, DVec2::splat(8.0));
    let bounds = Rect::new(DVec2::splat(0.0), DVec2::splat(1.0));
    tree.add(Presence::Enclosed, bounds, Element::new(1u32, ElementFlags::VISIBLE));

    let region = Rect::new(DVec2::splat(-1.0), DVec2::splat(2.0));
    let mut acc = FxHashSet::default();
    let via_bounds = handles(&tree.in_bounds(&region, &mut acc).cloned().collect());
    acc.clear();
    let via_view = handles(&tree.in_view(&region, &mut acc).cloned().collect());
    acc.clear();
    let via_play = handles(&tree.in_play(&region, &mut acc).cloned().collect());

    assert_eq!(via_bounds, vec![1]);
    assert_eq!(via_bounds, via_view);
    assert_eq!(via_bounds, via_play);
}

#[test]
fn short_circuit_on_fresh_tree() {
    let tree: Tree<u32> = Tree::new(3, DVec2::splat(8.0));
    let mut acc = FxHashSet::default();
    assert!(tree.elements(&mut acc).next().is_none());
}

#[test]
fn out_of_bounds_add_spills_to_omnipresent() {
    let mut tree: Tree<u32> = Tree::new(3, DVec2::splat(8.0));
    let bounds = Rect::new(DVec2::splat(1000.0), DVec2::splat(1001.0));
    tree.add(Presence::Enclosed, bounds, Element::new(1u32, ElementFlags::VISIBLE));

    let mut acc = FxHashSet::default();
    assert_eq!(handles(&tree.elements(&mut acc).cloned().collect()), vec![1]);
}

#[test]
#[should_panic(expected = "depth = 0 must be >= 1")]
fn construction_rejects_zero_depth() {
    let _: Tree<u32> = Tree::new(0, DVec2::splat(8.0));
}

#[test]
#[should_panic(expected = "size.x = 3 is not a power of two")]
fn construction_rejects_non_power_of_two_size() {
    let _: Tree<u32> = Tree::new(2, DVec2::new(3.0, 8.0));
}

#[test]
fn idempotent_add_and_remove() {
    let mut tree: Tree<u32> = Tree::new(2, DVec2::splat(4.0));
    let bounds = Rect::new(DVec2::splat(0.0), DVec2::splat(1.0));
    let element = Element::new(1u32, ElementFlags::VISIBLE);
    tree.add(Presence::Enclosed, bounds, element.clone());
    tree.add(Presence::Enclosed, bounds, element.clone());

    let mut acc = FxHashSet::default();
    assert_eq!(handles(&tree.elements(&mut acc).cloned().collect()), vec![1]);

    tree.remove(Presence::Enclosed, bounds, &element);
    tree.remove(Presence::Enclosed, bounds, &element);
    acc.clear();
    assert!(tree.elements(&mut acc).next().is_none());
}

// spec.md §8 Testable Property 5 ("Containment law"): for 2D, a query
// box fully contained in a single leaf must return every element whose
// *leaf membership* intersects it, not elements whose own rect happens
// to intersect it — the 2D element carries no rect to re-test.
//
// depth=2, size=(4,4) -> leaf size (2,2), root min (-1,-1), so the leaf
// directory holds [-1,1]x[-1,1] and [1,3]x[-1,1] (among others). An
// element whose bounds straddle x=1 lives in both leaves by invariant 2;
// querying a box disjoint from the element's own rect but inside the
// second leaf must still return it.
#[test]
fn in_bounds_returns_elements_by_leaf_membership_not_own_rect() {
    let mut tree: Tree<u32> = Tree::new(2, DVec2::splat(4.0));
    let straddling = Rect::new(DVec2::new(0.5, 0.0), DVec2::new(1.5, 0.5));
    tree.add(Presence::Enclosed, straddling, Element::new(1u32, ElementFlags::VISIBLE));

    let disjoint_query = Rect::new(DVec2::new(2.0, 0.6), DVec2::new(2.5, 0.8));
    let mut acc = FxHashSet::default();
    assert_eq!(
        handles(&tree.in_bounds(&disjoint_query, &mut acc).cloned().collect()),
        vec![1]
    );
}
