//! Fixed-depth quadtree over 2D axis-aligned rects (spec.md §3, §4 2D
//! column).

mod element;
mod node;
mod tree;

pub use element::Element;
pub use tree::Tree;
