/*!
# Scene Index

Fixed-depth quadtree (2D) and octree (3D) spatial indices for
visibility, picking, and simulation-region queries.

## Architecture

- **geometry**: `Rect`/`Aabb`/`Frustum`, the intersection oracle both
  trees query against.
- **presence**: the `Presence` tag deciding whether an element is placed
  by spatial subdivision or opts out into an always-returned ubiquitous
  bucket.
- **quadtree** / **octree**: the two fixed-depth trees, each a flat node
  arena plus an integer-keyed leaf directory.
- **enumeration**: the lazy ubiquitous-then-accumulator iterator every
  query returns.

An element is added under a [`presence::Presence`] tag. Queries never
allocate their own result storage: callers pass a reusable accumulator
set and get back an [`enumeration::Enumeration`] borrowing from it and
from the tree.
*/

pub mod enumeration;
pub mod error;
pub mod flags;
pub mod geometry;
pub mod log;
mod node_id;
pub mod octree;
pub mod presence;
pub mod quadtree;

pub use enumeration::Enumeration;
pub use error::ConfigError;
pub use flags::ElementFlags;
pub use geometry::{Aabb, Frustum, FrustumTest, Rect};
pub use presence::Presence;

// Re-export math library, matching the teacher's own `pub use glam;`.
pub use glam;
