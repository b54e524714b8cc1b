use engine::{Plane, Ray, RaycastHit, Vec3};
use thiserror::Error;

/// Navigable-surface sampler.
pub(crate) trait NavSurface {
    /// Nearest point on the surface within `max_distance` of `point`.
    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3>;
}

/// Executes movement toward a destination. Rotation and the vertical axis are
/// its own business.
pub(crate) trait PathfindingAgent {
    fn set_destination(&mut self, destination: Vec3);
    fn position(&self) -> Vec3;
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub(crate) enum MoveError {
    #[error("pointer ray never reaches the ground plane")]
    GroundPlaneMissed,
    #[error("no navigable point within {max_distance} of {candidate:?}")]
    NoNavigableSurface { candidate: Vec3, max_distance: f32 },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct NavigationAgent {
    sample_radius: f32,
    ground: Plane,
}

impl NavigationAgent {
    pub(crate) fn new(sample_radius: f32) -> Self {
        Self {
            sample_radius,
            ground: Plane::ground(),
        }
    }

    /// Issues a move toward the navigable point nearest to what the pointer
    /// resolved to. A collider hit wins; otherwise the ray falls back to the
    /// ground plane through the origin. Returns the destination handed to the
    /// agent.
    pub(crate) fn request_move(
        &self,
        ray: &Ray,
        hit: Option<&RaycastHit>,
        surface: &dyn NavSurface,
        agent: &mut dyn PathfindingAgent,
    ) -> Result<Vec3, MoveError> {
        let candidate = match hit {
            Some(hit) => hit.point,
            None => {
                let enter = self
                    .ground
                    .raycast(ray)
                    .ok_or(MoveError::GroundPlaneMissed)?;
                ray.point_at(enter)
            }
        };

        let destination = surface
            .sample_position(candidate, self.sample_radius)
            .ok_or(MoveError::NoNavigableSurface {
                candidate,
                max_distance: self.sample_radius,
            })?;
        agent.set_destination(destination);
        Ok(destination)
    }
}

/// Straight-line walker standing in for a navmesh agent.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SteeringAgent {
    position: Vec3,
    destination: Option<Vec3>,
    speed: f32,
    arrival_threshold: f32,
}

impl SteeringAgent {
    pub(crate) fn new(position: Vec3, speed: f32, arrival_threshold: f32) -> Self {
        Self {
            position,
            destination: None,
            speed,
            arrival_threshold,
        }
    }

    #[cfg(test)]
    pub(crate) fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    pub(crate) fn tick(&mut self, dt_seconds: f32) {
        let Some(destination) = self.destination else {
            return;
        };
        let mut delta = destination - self.position;
        delta.y = 0.0;
        let remaining = delta.length();
        let step = self.speed * dt_seconds.max(0.0);
        if remaining <= self.arrival_threshold || step >= remaining {
            self.position = destination;
            self.destination = None;
            return;
        }
        self.position = self.position + delta * (step / remaining);
        self.position.y = destination.y;
    }
}

impl PathfindingAgent for SteeringAgent {
    fn set_destination(&mut self, destination: Vec3) {
        self.destination = Some(destination);
    }

    fn position(&self) -> Vec3 {
        self.position
    }
}
