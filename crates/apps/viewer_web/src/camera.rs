use foundation::math::Vec3;
use scene::picking::Ray;

/// Orbit camera around the scene origin.
///
/// The projection is the only 3D math the app owns; everything else ships
/// deterministic scene data. Kept target-independent so it is testable
/// natively.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitCamera {
    pub yaw_rad: f64,
    pub pitch_rad: f64,
    pub distance: f64,
    pub fov_y_rad: f64,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw_rad: 0.0,
            pitch_rad: 0.0,
            distance: 100.0,
            fov_y_rad: 45f64.to_radians(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
    /// Camera-space depth; larger is further away.
    pub depth: f64,
    /// Pixels per scene unit at this depth, for sizing spheres.
    pub scale: f64,
}

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw_rad.sin_cos();
        let (sp, cp) = self.pitch_rad.sin_cos();
        Vec3::new(cp * sy, sp, cp * cy).scale(self.distance)
    }

    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let eye = self.eye();
        let forward = normalize(Vec3::new(-eye.x, -eye.y, -eye.z));
        let right = normalize(forward.cross(Vec3::new(0.0, 1.0, 0.0)));
        let up = right.cross(forward);
        (forward, right, up)
    }

    fn focal_px(&self, height_px: f64) -> f64 {
        (height_px / 2.0) / (self.fov_y_rad / 2.0).tan()
    }

    /// Projects a scene point into pixel space; `None` behind the camera.
    pub fn project(&self, p: Vec3, width_px: f64, height_px: f64) -> Option<Projected> {
        let (forward, right, up) = self.basis();
        let eye = self.eye();
        let v = p - eye;
        let depth = v.dot(forward);
        if depth <= 1e-6 {
            return None;
        }
        let f = self.focal_px(height_px);
        let scale = f / depth;
        Some(Projected {
            x: width_px / 2.0 + v.dot(right) * scale,
            y: height_px / 2.0 - v.dot(up) * scale,
            depth,
            scale,
        })
    }

    /// The pick ray through a pixel; inverse of `project`.
    pub fn screen_ray(&self, x_px: f64, y_px: f64, width_px: f64, height_px: f64) -> Ray {
        let (forward, right, up) = self.basis();
        let f = self.focal_px(height_px);
        let dx = (x_px - width_px / 2.0) / f;
        let dy = -(y_px - height_px / 2.0) / f;
        let dir = Vec3::new(
            forward.x + right.x * dx + up.x * dy,
            forward.y + right.y * dx + up.y * dy,
            forward.z + right.z * dx + up.z * dy,
        );
        Ray::new(self.eye(), dir)
    }

    /// Orbit by pointer deltas; pitch clamps short of the poles so the
    /// camera basis never degenerates.
    pub fn rotate(&mut self, d_yaw_rad: f64, d_pitch_rad: f64) {
        self.yaw_rad += d_yaw_rad;
        self.pitch_rad = (self.pitch_rad + d_pitch_rad).clamp(-1.55, 1.55);
    }

    pub fn zoom(&mut self, factor: f64) {
        self.distance = (self.distance * factor).clamp(5.0, 1000.0);
    }
}

fn normalize(v: Vec3) -> Vec3 {
    let len = v.dot(v).sqrt();
    if len <= 0.0 {
        return Vec3::new(0.0, 0.0, 1.0);
    }
    v.scale(1.0 / len)
}

#[cfg(test)]
mod tests {
    use super::OrbitCamera;
    use foundation::math::Vec3;
    use scene::picking::{PickOptions, pick_ray};
    use scene::world::SceneWorld;

    #[test]
    fn origin_projects_to_canvas_center() {
        let cam = OrbitCamera::default();
        let p = cam.project(Vec3::new(0.0, 0.0, 0.0), 800.0, 600.0).unwrap();
        assert!((p.x - 400.0).abs() < 1e-9);
        assert!((p.y - 300.0).abs() < 1e-9);
        assert!((p.depth - 100.0).abs() < 1e-9);
    }

    #[test]
    fn points_behind_the_camera_are_rejected() {
        let cam = OrbitCamera::default();
        assert!(cam.project(Vec3::new(0.0, 0.0, 200.0), 800.0, 600.0).is_none());
    }

    #[test]
    fn screen_ray_through_a_projected_node_picks_it() {
        let mut world = SceneWorld::new();
        world.build_nodes(&[formats::Node3D {
            id: "Node1".to_string(),
            ch_id: "1".to_string(),
            x: 12.0,
            y: -8.0,
            z: 30.0,
        }]);
        let position = world.node(foundation::ids::BinId(1)).unwrap().position;

        let cam = OrbitCamera::default();
        let projected = cam.project(position, 800.0, 600.0).unwrap();
        let ray = cam.screen_ray(projected.x, projected.y, 800.0, 600.0);

        let hit = pick_ray(&world, ray, PickOptions::default()).expect("hit");
        assert_eq!(hit.bin, foundation::ids::BinId(1));
    }

    #[test]
    fn pitch_clamps_short_of_the_poles() {
        let mut cam = OrbitCamera::default();
        cam.rotate(0.0, 10.0);
        assert!(cam.pitch_rad <= 1.55);
        cam.rotate(0.0, -20.0);
        assert!(cam.pitch_rad >= -1.55);
    }
}
