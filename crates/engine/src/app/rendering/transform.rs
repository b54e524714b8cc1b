use crate::app::{Camera3D, Vec3};

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// On-screen half size of an object of `half_extent_world` at `world`.
pub fn projected_half_size_px(
    camera: &Camera3D,
    viewport: Viewport,
    world: Vec3,
    half_extent_world: f32,
) -> i32 {
    let pixels_per_world = camera.pixels_per_world_at(world, viewport.height);
    (half_extent_world * pixels_per_world).round().max(1.0) as i32
}

/// Brightness multiplier for a pixel: 1 in the centre, darkening towards the
/// corners in proportion to `intensity`.
pub fn vignette_attenuation(x: u32, y: u32, viewport: Viewport, intensity: f32) -> f32 {
    let intensity = if intensity.is_finite() {
        intensity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    if intensity == 0.0 || viewport.width == 0 || viewport.height == 0 {
        return 1.0;
    }
    let half_w = viewport.width as f32 * 0.5;
    let half_h = viewport.height as f32 * 0.5;
    let dx = (x as f32 + 0.5 - half_w) / half_w;
    let dy = (y as f32 + 0.5 - half_h) / half_h;
    let radius = ((dx * dx + dy * dy) * 0.5).sqrt().min(1.0);
    let falloff = radius * radius * (3.0 - 2.0 * radius);
    1.0 - intensity * falloff
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 800,
        height: 600,
    };

    #[test]
    fn vignette_leaves_centre_untouched() {
        let centre = vignette_attenuation(399, 299, VIEWPORT, 0.8);
        assert!(centre > 0.99);
    }

    #[test]
    fn vignette_darkens_corners_by_intensity() {
        let corner = vignette_attenuation(0, 0, VIEWPORT, 0.8);
        assert!(corner < 0.25, "corner={corner}");
        assert_eq!(vignette_attenuation(0, 0, VIEWPORT, 0.0), 1.0);
    }

    #[test]
    fn closer_objects_project_larger() {
        let camera = Camera3D::default();
        let near = projected_half_size_px(&camera, VIEWPORT, Vec3::new(0.0, 0.0, 4.0), 0.5);
        let far = projected_half_size_px(&camera, VIEWPORT, Vec3::new(0.0, 0.0, -6.0), 0.5);
        assert!(near > far, "near={near} far={far}");
    }
}
