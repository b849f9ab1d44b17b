//! Element classification flags (spec.md §3).
//!
//! A packed bit bag, grounded in the teacher's own flag-bits convention
//! (`scene/render_instance.rs`'s `FLAG_VISIBLE`/`FLAG_CAST_SHADOW`/
//! `FLAG_RECEIVE_SHADOW` consts) but expressed with `bitflags` rather than
//! raw `u64` consts, matching the dependency the teacher already carries
//! for this purpose.

use bitflags::bitflags;

bitflags! {
    /// `Static`/`LightProbe`/`Light` are meaningful only for 3D elements;
    /// the 2D quadtree only ever sets/reads `VISIBLE`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ElementFlags: u8 {
        const VISIBLE     = 1 << 0;
        const STATIC      = 1 << 1;
        const LIGHT_PROBE = 1 << 2;
        const LIGHT       = 1 << 3;
    }
}
