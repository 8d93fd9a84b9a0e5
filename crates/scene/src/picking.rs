use foundation::bounds::Aabb3;
use foundation::ids::BinId;
use foundation::math::Vec3;
use foundation::math::precision::stable_total_cmp_f64;

use crate::world::{NODE_RADIUS, SceneWorld};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub bin: BinId,
    pub distance: f64,
    pub point: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0e30,
        }
    }
}

/// Deterministic ray picking against the scene's spheres.
///
/// Ordering contract:
/// - The closest hit along the (normalized) ray wins.
/// - Hits at the same distance break ties toward the lower bin id.
///
/// Intersection uses each sphere's axis-aligned bounds; at the scene's node
/// radius the difference from exact sphere intersection is below pick
/// tolerance, and the slab test stays branch-predictable.
pub fn pick_ray(world: &SceneWorld, ray: Ray, opts: PickOptions) -> Option<PickHit> {
    let dir = normalize(ray.dir)?;
    let origin = [ray.origin.x, ray.origin.y, ray.origin.z];
    let dir_a = [dir.x, dir.y, dir.z];

    let mut best: Option<(f64, BinId)> = None;
    for node in world.nodes() {
        let bounds = Aabb3::around_sphere(node.position, NODE_RADIUS);
        let Some(t) = ray_aabb_hit_t(origin, dir_a, bounds, 0.0, opts.max_distance) else {
            continue;
        };

        best = match best {
            None => Some((t, node.bin)),
            Some((bt, bb)) => {
                let ord = stable_total_cmp_f64(t, bt).then_with(|| node.bin.cmp(&bb));
                if ord.is_lt() { Some((t, node.bin)) } else { Some((bt, bb)) }
            }
        };
    }

    let (t, bin) = best?;
    Some(PickHit {
        bin,
        distance: t,
        point: Vec3::new(
            ray.origin.x + dir.x * t,
            ray.origin.y + dir.y * t,
            ray.origin.z + dir.z * t,
        ),
    })
}

/// Screen picking wrapper.
///
/// The caller supplies a deterministic screen->ray mapping via `make_ray`.
pub fn pick_screen<F>(
    world: &SceneWorld,
    x_px: f64,
    y_px: f64,
    mut make_ray: F,
    opts: PickOptions,
) -> Option<PickHit>
where
    F: FnMut(f64, f64) -> Option<Ray>,
{
    let ray = make_ray(x_px, y_px)?;
    pick_ray(world, ray, opts)
}

fn normalize(v: Vec3) -> Option<Vec3> {
    let l2 = v.dot(v);
    if l2 <= 0.0 {
        return None;
    }
    let inv = 1.0 / l2.sqrt();
    Some(Vec3::new(v.x * inv, v.y * inv, v.z * inv))
}

fn ray_aabb_hit_t(
    origin: [f64; 3],
    dir: [f64; 3],
    bounds: Aabb3,
    mut t_min: f64,
    mut t_max: f64,
) -> Option<f64> {
    // Slabs intersection; returns entry distance.
    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        let (min, max) = (bounds.min[axis], bounds.max[axis]);

        if d.abs() < 1e-12 {
            if o < min || o > max {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t1 = (min - o) * inv;
        let mut t2 = (max - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }

        t_min = t_min.max(t1);
        t_max = t_max.min(t2);
        if t_max < t_min {
            return None;
        }
    }

    Some(t_min.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::{PickOptions, Ray, pick_ray, pick_screen};
    use crate::world::SceneWorld;
    use formats::Node3D;
    use foundation::ids::BinId;
    use foundation::math::Vec3;

    fn node(id: &str, x: f64, y: f64, z: f64) -> Node3D {
        Node3D {
            id: id.to_string(),
            ch_id: "1".to_string(),
            // Dataset coordinates are divided by 10 on build; pre-multiply
            // so scene positions land where the test expects.
            x: x * 10.0,
            y: y * 10.0,
            z: z * 10.0,
        }
    }

    #[test]
    fn ray_picks_nearest_node() {
        let mut world = SceneWorld::new();
        world.build_nodes(&[node("Node1", 5.0, 0.0, 0.0), node("Node2", 10.0, 0.0, 0.0)]);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let hit = pick_ray(&world, ray, PickOptions::default()).expect("hit");
        assert_eq!(hit.bin, BinId(1));
        assert!(hit.distance > 4.0 && hit.distance < 6.0);
    }

    #[test]
    fn tie_breaks_toward_lower_bin_id() {
        let mut world = SceneWorld::new();
        // Two bins at the same position; deliberately inserted out of order.
        world.build_nodes(&[node("Node9", 5.0, 0.0, 0.0), node("Node4", 5.0, 0.0, 0.0)]);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let hit = pick_ray(&world, ray, PickOptions::default()).expect("hit");
        assert_eq!(hit.bin, BinId(4));
    }

    #[test]
    fn missing_the_scene_returns_none() {
        let mut world = SceneWorld::new();
        world.build_nodes(&[node("Node1", 5.0, 0.0, 0.0)]);

        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(pick_ray(&world, ray, PickOptions::default()).is_none());

        // A degenerate direction cannot hit anything either.
        let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0));
        assert!(pick_ray(&world, ray, PickOptions::default()).is_none());
    }

    #[test]
    fn screen_picking_delegates_through_the_ray_mapping() {
        let mut world = SceneWorld::new();
        world.build_nodes(&[node("Node1", 5.0, 0.0, 0.0)]);

        let hit = pick_screen(
            &world,
            120.0,
            80.0,
            |_x, _y| Some(Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0))),
            PickOptions::default(),
        );
        assert_eq!(hit.map(|h| h.bin), Some(BinId(1)));

        let none = pick_screen(&world, 0.0, 0.0, |_x, _y| None, PickOptions::default());
        assert!(none.is_none());
    }
}
