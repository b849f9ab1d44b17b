//! Geometric oracle: AABB/rect/frustum intersection, containment, and
//! frustum classification.
//!
//! These are the "intersection oracle" spec.md §6 says the index depends
//! on. They are plain value types with no relation to node storage; the
//! trees only ever call `intersects`/`contains`/`contains_point`/
//! `classify_aabb` on them.

use glam::{DVec2, DVec3, DVec4, Mat4};

/// Axis-aligned rectangle in the 2D plane, used by the quadtree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}

impl Rect {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Does `self` fully contain `other`?
    pub fn contains(&self, other: &Rect) -> bool {
        self.min.x <= other.min.x
            && self.max.x >= other.max.x
            && self.min.y <= other.min.y
            && self.max.y >= other.max.y
    }

    pub fn contains_point(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Do `self` and `other` overlap or touch?
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// Axis-aligned box in 3D space, used by the octree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Does `self` fully contain `other`?
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x
            && self.max.x >= other.max.x
            && self.min.y <= other.min.y
            && self.max.y >= other.max.y
            && self.min.z <= other.min.z
            && self.max.z >= other.max.z
    }

    pub fn contains_point(&self, p: DVec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Do `self` and `other` overlap or touch?
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// Result of testing a box against a frustum: whether the box can be
/// trusted whole, rejected whole, or needs per-element re-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    Outside,
    Inside,
    Partial,
}

/// Six clipping planes for visibility culling, in the convention used by
/// `camera::Frustum`: each plane is `(A, B, C, D)` with an inward-pointing
/// normal `(A, B, C)`; a point is inside when `dot(plane, point) + D >= 0`.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    pub planes: [DVec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix (Gribb &
    /// Hartmann method). Works for perspective and orthographic matrices.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.as_dmat4().to_cols_array_2d();
        let mut planes = [
            DVec4::new(
                m[0][3] + m[0][0],
                m[1][3] + m[1][0],
                m[2][3] + m[2][0],
                m[3][3] + m[3][0],
            ),
            DVec4::new(
                m[0][3] - m[0][0],
                m[1][3] - m[1][0],
                m[2][3] - m[2][0],
                m[3][3] - m[3][0],
            ),
            DVec4::new(
                m[0][3] + m[0][1],
                m[1][3] + m[1][1],
                m[2][3] + m[2][1],
                m[3][3] + m[3][1],
            ),
            DVec4::new(
                m[0][3] - m[0][1],
                m[1][3] - m[1][1],
                m[2][3] - m[2][1],
                m[3][3] - m[3][1],
            ),
            DVec4::new(
                m[0][3] + m[0][2],
                m[1][3] + m[1][2],
                m[2][3] + m[2][2],
                m[3][3] + m[3][2],
            ),
            DVec4::new(
                m[0][3] - m[0][2],
                m[1][3] - m[1][2],
                m[2][3] - m[2][2],
                m[3][3] - m[3][2],
            ),
        ];
        for plane in &mut planes {
            let normal_len = DVec3::new(plane.x, plane.y, plane.z).length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }
        Self { planes }
    }

    /// Conservative box/frustum test: "positive vertex" trick. Never a
    /// false negative, may be a false positive for sheared corners.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            let normal = DVec3::new(plane.x, plane.y, plane.z);
            let positive = DVec3::new(
                if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if normal.dot(positive) + plane.w < 0.0 {
                return false;
            }
        }
        true
    }

    /// Three-way classification used to short-circuit whole subtrees:
    /// `Outside` when the positive vertex fails a plane (same test as
    /// `intersects_aabb`), `Inside` when the negative vertex (the corner
    /// furthest from the plane) still passes every plane, `Partial`
    /// otherwise.
    pub fn classify_aabb(&self, aabb: &Aabb) -> FrustumTest {
        let mut result = FrustumTest::Inside;
        for plane in &self.planes {
            let normal = DVec3::new(plane.x, plane.y, plane.z);
            let positive = DVec3::new(
                if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if normal.dot(positive) + plane.w < 0.0 {
                return FrustumTest::Outside;
            }
            let negative = DVec3::new(
                if normal.x >= 0.0 { aabb.min.x } else { aabb.max.x },
                if normal.y >= 0.0 { aabb.min.y } else { aabb.max.y },
                if normal.z >= 0.0 { aabb.min.z } else { aabb.max.z },
            );
            if normal.dot(negative) + plane.w < 0.0 {
                result = FrustumTest::Partial;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_and_intersects() {
        let big = Rect::new(DVec2::splat(-10.0), DVec2::splat(10.0));
        let small = Rect::new(DVec2::splat(-1.0), DVec2::splat(1.0));
        let straddling = Rect::new(DVec2::new(5.0, 5.0), DVec2::new(15.0, 15.0));
        assert!(big.contains(&small));
        assert!(!small.contains(&big));
        assert!(!big.contains(&straddling));
        assert!(big.intersects(&straddling));
    }

    #[test]
    fn aabb_contains_and_intersects() {
        let a = Aabb::new(DVec3::splat(-2.0), DVec3::splat(2.0));
        let b = Aabb::new(DVec3::splat(1.0), DVec3::splat(3.0));
        let c = Aabb::new(DVec3::splat(5.0), DVec3::splat(7.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    fn all_visible_frustum() -> Frustum {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 1000.0);
        let view = Mat4::look_at_rh(glam::Vec3::ZERO, glam::Vec3::new(0.0, 0.0, -1.0), glam::Vec3::Y);
        Frustum::from_view_projection(&(proj * view))
    }

    #[test]
    fn frustum_classifies_contained_box_as_inside() {
        let frustum = all_visible_frustum();
        let aabb = Aabb::new(DVec3::new(-1.0, -1.0, -10.0), DVec3::new(1.0, 1.0, -8.0));
        assert_eq!(frustum.classify_aabb(&aabb), FrustumTest::Inside);
    }

    #[test]
    fn frustum_classifies_far_behind_box_as_outside() {
        let frustum = all_visible_frustum();
        let aabb = Aabb::new(DVec3::new(-1.0, -1.0, 10.0), DVec3::new(1.0, 1.0, 12.0));
        assert_eq!(frustum.classify_aabb(&aabb), FrustumTest::Outside);
    }
}
