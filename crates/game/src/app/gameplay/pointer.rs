use engine::{Camera3D, Ray, RaycastHit, SceneQuery, Vec2};

use super::registry::{InteractableHandle, InteractableRegistry};

/// What lies under a screen point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PointerTarget {
    pub(crate) ray: Ray,
    pub(crate) hit: Option<RaycastHit>,
    /// Set when the hit collider carries an interaction capability.
    pub(crate) interactable: Option<InteractableHandle>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PointerResolver {
    max_distance: f32,
}

impl Default for PointerResolver {
    fn default() -> Self {
        Self {
            max_distance: f32::INFINITY,
        }
    }
}

impl PointerResolver {
    pub(crate) fn resolve(
        &self,
        screen_px: Vec2,
        window_size: (u32, u32),
        camera: &Camera3D,
        scene: &dyn SceneQuery,
        registry: &InteractableRegistry,
    ) -> PointerTarget {
        let ray = camera.screen_point_to_ray(screen_px, window_size);
        let hit = scene.raycast(&ray, self.max_distance);
        let interactable = hit.and_then(|hit| registry.handle_for(hit.entity));
        PointerTarget {
            ray,
            hit,
            interactable,
        }
    }
}
