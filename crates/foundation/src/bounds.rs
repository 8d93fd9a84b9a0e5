use crate::math::Vec3;

/// Axis-aligned bounding boxes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min[0] && x <= self.max[0] && y >= self.min[1] && y <= self.max[1]
    }
}

impl Aabb3 {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Aabb3 { min, max }
    }

    /// Bounding box of a sphere, used to pick against scene nodes.
    pub fn around_sphere(center: Vec3, radius: f64) -> Self {
        Aabb3 {
            min: [center.x - radius, center.y - radius, center.z - radius],
            max: [center.x + radius, center.y + radius, center.z + radius],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Aabb2, Aabb3};
    use crate::math::Vec3;

    #[test]
    fn aabb2_contains_is_inclusive() {
        let b = Aabb2::new([0.0, 0.0], [2.0, 2.0]);
        assert!(b.contains(0.0, 0.0));
        assert!(b.contains(2.0, 2.0));
        assert!(!b.contains(2.1, 1.0));
    }

    #[test]
    fn sphere_bounds_are_symmetric() {
        let b = Aabb3::around_sphere(Vec3::new(1.0, 2.0, 3.0), 0.5);
        assert_eq!(b.min, [0.5, 1.5, 2.5]);
        assert_eq!(b.max, [1.5, 2.5, 3.5]);
    }
}
