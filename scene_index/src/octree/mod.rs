//! Fixed-depth octree over 3D axis-aligned boxes (spec.md §3, §4 3D
//! column).

mod element;
mod node;
mod tree;

pub use element::Element;
pub use tree::Tree;
