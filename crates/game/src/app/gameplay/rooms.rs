use engine::{EntityId, NavRect, SceneWorld, Vec3};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::camera_transition::CameraTransition;
use super::nav::NavSurface;
use super::player::PlayerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct RoomId(pub(crate) u32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum RoomError {
    #[error("unknown room id {0:?}")]
    UnknownRoom(RoomId),
    #[error("unknown room '{0}'")]
    UnknownRoomName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RoomChange {
    /// Target was already the current room.
    Unchanged,
    /// `exited` is set only when the previous room's exit hook ran.
    Changed {
        exited: Option<RoomId>,
        entered: RoomId,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Room {
    id: RoomId,
    name: String,
    anchor: Vec3,
    nav_bounds: NavRect,
    members: Vec<EntityId>,
    active: bool,
}

impl Room {
    pub(crate) fn id(&self) -> RoomId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn anchor(&self) -> Vec3 {
        self.anchor
    }

    #[cfg(test)]
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    /// Activates the room's navigation bounds and members. Returns false when
    /// the room was already active.
    fn enter(&mut self, world: &mut SceneWorld) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.set_members_active(world, true);
        info!(room = %self.name, "room_entered");
        true
    }

    fn exit(&mut self, world: &mut SceneWorld) -> bool {
        if !self.active {
            return false;
        }
        self.force_exit(world);
        true
    }

    /// Deactivates members whatever the room's flag says. Freshly spawned
    /// entities are active even though their room is not.
    fn force_exit(&mut self, world: &mut SceneWorld) {
        self.active = false;
        self.set_members_active(world, false);
        info!(room = %self.name, "room_exited");
    }

    fn set_members_active(&self, world: &mut SceneWorld, active: bool) {
        for &member in &self.members {
            if !world.set_entity_active(member, active) {
                warn!(room = %self.name, entity = member.0, "room_member_missing");
            }
        }
    }
}

/// Owns the rooms and the camera transition between them. The current room
/// itself lives on `PlayerState`.
#[derive(Debug)]
pub(crate) struct RoomManager {
    rooms: Vec<Room>,
    transition: CameraTransition,
}

impl RoomManager {
    pub(crate) fn new(transition: CameraTransition) -> Self {
        Self {
            rooms: Vec::new(),
            transition,
        }
    }

    pub(crate) fn add_room(
        &mut self,
        name: impl Into<String>,
        anchor: Vec3,
        nav_bounds: NavRect,
    ) -> RoomId {
        let id = RoomId(self.rooms.len() as u32);
        self.rooms.push(Room {
            id,
            name: name.into(),
            anchor,
            nav_bounds,
            members: Vec::new(),
            active: false,
        });
        id
    }

    pub(crate) fn add_member(&mut self, room: RoomId, entity: EntityId) -> Result<(), RoomError> {
        self.room_mut(room)?.members.push(entity);
        Ok(())
    }

    pub(crate) fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.0 as usize)
    }

    pub(crate) fn room_by_name(&self, name: &str) -> Result<RoomId, RoomError> {
        self.rooms
            .iter()
            .find(|room| room.name == name)
            .map(Room::id)
            .ok_or_else(|| RoomError::UnknownRoomName(name.to_string()))
    }

    #[cfg(test)]
    pub(crate) fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    #[cfg(test)]
    pub(crate) fn transition(&self) -> &CameraTransition {
        &self.transition
    }

    /// Level start: every room is exited, then `starting` is entered with the
    /// camera snapped onto its anchor.
    pub(crate) fn start(
        &mut self,
        starting: RoomId,
        player: &mut PlayerState,
        world: &mut SceneWorld,
    ) -> Result<(), RoomError> {
        self.room_mut(starting)?;
        for room in &mut self.rooms {
            room.force_exit(world);
        }
        let room = self.room_mut(starting)?;
        room.enter(world);
        let anchor = room.anchor;
        player.set_current_room(starting);
        self.transition.snap(world, anchor);
        Ok(())
    }

    /// Room-change entry point. Entering the current room is a no-op;
    /// otherwise the current room exits before the target enters, and a new
    /// camera transition supersedes any running one.
    pub(crate) fn enter_room(
        &mut self,
        target: RoomId,
        player: &mut PlayerState,
        world: &mut SceneWorld,
    ) -> Result<RoomChange, RoomError> {
        self.room_mut(target)?;
        let previous = player.current_room();
        if previous == Some(target) {
            debug!(room = target.0, "room_enter_ignored_already_current");
            return Ok(RoomChange::Unchanged);
        }

        let exited = match previous {
            Some(previous) if self.room_mut(previous)?.exit(world) => Some(previous),
            _ => None,
        };
        player.set_current_room(target);
        let room = self.room_mut(target)?;
        if !room.enter(world) {
            debug!(room = target.0, "room_enter_hook_skipped_already_active");
        }
        let anchor = room.anchor;
        let from = world.camera().root;
        self.transition.start(from, anchor);

        Ok(RoomChange::Changed {
            exited,
            entered: target,
        })
    }

    pub(crate) fn advance_transition(&mut self, dt_seconds: f32, world: &mut SceneWorld) {
        self.transition.advance(dt_seconds, world);
    }

    fn room_mut(&mut self, id: RoomId) -> Result<&mut Room, RoomError> {
        self.rooms
            .get_mut(id.0 as usize)
            .ok_or(RoomError::UnknownRoom(id))
    }
}

impl NavSurface for RoomManager {
    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3> {
        self.rooms
            .iter()
            .filter(|room| room.active)
            .map(|room| room.nav_bounds.closest_point(point, room.anchor.y))
            .map(|sampled| (sampled.distance(point), sampled))
            .filter(|(distance, _)| *distance <= max_distance)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, sampled)| sampled)
    }
}
