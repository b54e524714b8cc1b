use super::math::{Ray, Vec2, Vec3};

pub const CAMERA_FOV_DEFAULT_RADIANS: f32 = std::f32::consts::FRAC_PI_3;
pub const CAMERA_EYE_OFFSET_DEFAULT: Vec3 = Vec3::new(0.0, 9.0, 9.0);
const NEAR_EPSILON: f32 = 1.0e-3;

/// Perspective camera that always looks at its anchor (`root`) from a fixed
/// eye offset. Moving the anchor moves the whole rig.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera3D {
    pub root: Vec3,
    pub eye_offset: Vec3,
    pub vertical_fov_radians: f32,
}

impl Default for Camera3D {
    fn default() -> Self {
        Self {
            root: Vec3::ZERO,
            eye_offset: CAMERA_EYE_OFFSET_DEFAULT,
            vertical_fov_radians: CAMERA_FOV_DEFAULT_RADIANS,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CameraBasis {
    eye: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    tan_half_fov: f32,
}

impl Camera3D {
    pub fn eye(&self) -> Vec3 {
        self.root + self.eye_offset
    }

    fn basis(&self) -> CameraBasis {
        let forward = (-self.eye_offset).normalize_or_zero();
        let mut right = forward.cross(Vec3::UP).normalize_or_zero();
        if right.is_zero() {
            right = Vec3::X;
        }
        let up = right.cross(forward).normalize_or_zero();
        CameraBasis {
            eye: self.eye(),
            forward,
            right,
            up,
            tan_half_fov: (self.vertical_fov_radians * 0.5).tan(),
        }
    }

    pub fn screen_point_to_ray(&self, screen_px: Vec2, window_size: (u32, u32)) -> Ray {
        let basis = self.basis();
        let (width, height) = (window_size.0.max(1) as f32, window_size.1.max(1) as f32);
        let aspect = width / height;
        let ndc_x = 2.0 * screen_px.x / width - 1.0;
        let ndc_y = 1.0 - 2.0 * screen_px.y / height;
        let direction = basis.forward
            + basis.right * (ndc_x * basis.tan_half_fov * aspect)
            + basis.up * (ndc_y * basis.tan_half_fov);
        Ray::new(basis.eye, direction)
    }

    /// Projects a world point into pixel coordinates; `None` behind the eye.
    pub fn world_to_screen(&self, world: Vec3, window_size: (u32, u32)) -> Option<Vec2> {
        let basis = self.basis();
        let (width, height) = (window_size.0.max(1) as f32, window_size.1.max(1) as f32);
        let aspect = width / height;
        let view = world - basis.eye;
        let depth = view.dot(basis.forward);
        if depth <= NEAR_EPSILON {
            return None;
        }
        let ndc_x = view.dot(basis.right) / (depth * basis.tan_half_fov * aspect);
        let ndc_y = view.dot(basis.up) / (depth * basis.tan_half_fov);
        Some(Vec2 {
            x: (ndc_x + 1.0) * 0.5 * width,
            y: (1.0 - ndc_y) * 0.5 * height,
        })
    }

    /// Distance from the eye along the view axis, used for size attenuation.
    pub fn view_depth(&self, world: Vec3) -> f32 {
        let basis = self.basis();
        (world - basis.eye).dot(basis.forward)
    }

    pub fn pixels_per_world_at(&self, world: Vec3, window_height: u32) -> f32 {
        let depth = self.view_depth(world).max(NEAR_EPSILON);
        let tan_half_fov = (self.vertical_fov_radians * 0.5).tan();
        window_height.max(1) as f32 * 0.5 / (depth * tan_half_fov)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::math::Plane;

    #[test]
    fn screen_center_ray_hits_camera_anchor_on_ground() {
        let camera = Camera3D {
            root: Vec3::new(4.0, 0.0, -2.0),
            ..Camera3D::default()
        };
        let ray = camera.screen_point_to_ray(Vec2 { x: 640.0, y: 360.0 }, (1280, 720));
        let enter = Plane::ground().raycast(&ray).expect("ground hit");
        let point = ray.point_at(enter);
        assert!((point.x - 4.0).abs() < 1.0e-3);
        assert!((point.z + 2.0).abs() < 1.0e-3);
    }

    #[test]
    fn world_to_screen_inverts_screen_point_to_ray() {
        let camera = Camera3D::default();
        let window = (800, 600);
        let cursor = Vec2 { x: 200.0, y: 450.0 };
        let ray = camera.screen_point_to_ray(cursor, window);
        let enter = Plane::ground().raycast(&ray).expect("ground hit");
        let projected = camera
            .world_to_screen(ray.point_at(enter), window)
            .expect("in front");
        assert!((projected.x - cursor.x).abs() < 0.05);
        assert!((projected.y - cursor.y).abs() < 0.05);
    }

    #[test]
    fn points_behind_eye_do_not_project() {
        let camera = Camera3D::default();
        let behind = camera.eye() + camera.eye_offset;
        assert_eq!(camera.world_to_screen(behind, (800, 600)), None);
    }

    #[test]
    fn top_down_offset_uses_fallback_right_axis() {
        let camera = Camera3D {
            eye_offset: Vec3::new(0.0, 10.0, 0.0),
            ..Camera3D::default()
        };
        let ray = camera.screen_point_to_ray(Vec2 { x: 400.0, y: 300.0 }, (800, 600));
        assert!((ray.direction.y + 1.0).abs() < 1.0e-4);
    }
}
