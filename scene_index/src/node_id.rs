//! Process-wide monotonic node id counter (spec.md §4.1: "Node ids are
//! drawn from a monotonically increasing process-wide counter").
//!
//! Shared by both the quadtree and the octree so that node identity
//! comparisons (`findNode(old).id == findNode(new).id`, spec.md §4.5)
//! never collide across tree instances or tree kinds.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

pub fn next_node_id() -> u64 {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}
