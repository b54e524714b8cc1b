use std::sync::Arc;

use engine::{
    EntityId, InputSnapshot, ItemData, NavRect, RenderableDesc, RenderableKind, Scene, SceneWorld,
    Vec3,
};
use tracing::{debug, info, warn};

use super::camera_transition::CameraTransition;
use super::controller::{DispatchOutcome, InteractionContext, InteractionController};
use super::interactable::CommitOutcome;
use super::interactable::Interactable;
use super::mood::{Gradient, GradientKey, MoodBar, MoodModel};
use super::nav::{NavigationAgent, PathfindingAgent, SteeringAgent};
use super::player::PlayerState;
use super::registry::{InteractableHandle, InteractableRegistry};
use super::rooms::{RoomId, RoomManager};
use crate::app::config::GameplayConfig;

const GARDEN_ANCHOR: Vec3 = Vec3::new(0.0, 0.0, 0.0);
const GARDEN_SIZE: (f32, f32) = (10.0, 8.0);
const KITCHEN_ANCHOR: Vec3 = Vec3::new(14.0, 0.0, 0.0);
const KITCHEN_SIZE: (f32, f32) = (8.0, 8.0);
const FLOOR_HALF_THICKNESS: f32 = 0.01;
const DOOR_HALF_EXTENTS: Vec3 = Vec3::new(0.5, 1.0, 0.1);
const SLOT_HALF_EXTENTS: Vec3 = Vec3::new(0.3, 0.3, 0.3);
const PLAYER_SPAWN_OFFSET: Vec3 = Vec3::new(0.0, 0.0, 2.0);

const FLOOR_TINTS: [[u8; 4]; 2] = [[88, 128, 72, 255], [150, 130, 110, 255]];
const DOOR_TINT: [u8; 4] = [120, 78, 44, 255];
const SLOT_TINT: [u8; 4] = [230, 230, 210, 255];
const BASKET_TINT: [u8; 4] = [196, 160, 96, 255];
const PLAYER_TINT: [u8; 4] = [240, 232, 200, 255];

/// Item definitions placed in each room, by def name. `None` is an empty slot.
const GARDEN_SLOTS: [(&str, Option<&str>, Vec3); 2] = [
    ("garden_watering_can", Some("item.watering_can"), Vec3::new(-3.0, 0.3, -2.0)),
    ("garden_pietree", Some("plant.pietree"), Vec3::new(2.5, 0.3, -1.5)),
];
const KITCHEN_SLOTS: [(&str, Option<&str>, Vec3); 2] = [
    ("kitchen_pie_dish", Some("item.pie_dish"), Vec3::new(12.0, 0.3, -2.0)),
    ("kitchen_counter", None, Vec3::new(16.0, 0.3, -2.0)),
];

/// Per-level state. Rebuilt on every load.
#[derive(Debug)]
pub(crate) struct Level {
    pub(crate) player: PlayerState,
    pub(crate) player_entity: EntityId,
    pub(crate) rooms: RoomManager,
    pub(crate) interactables: InteractableRegistry,
    pub(crate) controller: InteractionController,
    pub(crate) agent: SteeringAgent,
}

impl Level {
    fn build(config: &GameplayConfig, world: &mut SceneWorld) -> Self {
        let mut rooms = RoomManager::new(CameraTransition::new(config.room_transition));
        let mut interactables = InteractableRegistry::default();
        let garden = rooms.add_room(
            "garden",
            GARDEN_ANCHOR,
            NavRect::from_center_size(GARDEN_ANCHOR, GARDEN_SIZE.0, GARDEN_SIZE.1),
        );
        let kitchen = rooms.add_room(
            "kitchen",
            KITCHEN_ANCHOR,
            NavRect::from_center_size(KITCHEN_ANCHOR, KITCHEN_SIZE.0, KITCHEN_SIZE.1),
        );

        let mut layout = LevelLayout {
            config,
            world: &mut *world,
            rooms: &mut rooms,
            interactables: &mut interactables,
        };
        layout.floor(garden, "garden_floor", GARDEN_SIZE, FLOOR_TINTS[0]);
        layout.floor(kitchen, "kitchen_floor", KITCHEN_SIZE, FLOOR_TINTS[1]);
        layout.door(garden, "garden_door", Vec3::new(4.5, 1.0, -3.9), kitchen);
        layout.door(kitchen, "kitchen_door", Vec3::new(10.5, 1.0, -3.9), garden);
        for (name, def_name, position) in GARDEN_SLOTS {
            layout.item_slot(garden, name, def_name, position);
        }
        for (name, def_name, position) in KITCHEN_SLOTS {
            layout.item_slot(kitchen, name, def_name, position);
        }
        layout.drop_off(garden, "garden_basket", Vec3::new(-3.5, 0.3, 2.5));

        let starting = rooms.room_by_name(&config.starting_room).unwrap_or_else(|error| {
            warn!(error = %error, fallback = "garden", "starting_room_unknown");
            garden
        });
        let spawn = room_anchor(&rooms, starting) + PLAYER_SPAWN_OFFSET;
        let player_entity = world.spawn(spawn, RenderableDesc::placeholder("player", PLAYER_TINT));
        world.apply_pending();

        let mut player = PlayerState::new(spawn, build_mood(config));
        if let Err(error) = rooms.start(starting, &mut player, world) {
            warn!(error = %error, "room_start_failed");
        }
        player.apply_interaction_stress(0.0);

        Self {
            player,
            player_entity,
            rooms,
            interactables,
            controller: InteractionController::new(
                config.mood.stress_gain_moving,
                NavigationAgent::new(config.navigation.sample_radius),
            ),
            agent: SteeringAgent::new(
                spawn,
                config.navigation.move_speed,
                config.navigation.arrival_threshold,
            ),
        }
    }

    fn report(&self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::NoTarget => {}
            DispatchOutcome::Rejected(handle) => {
                debug!(interactable = self.name_of(*handle), "press_rejected");
            }
            DispatchOutcome::Pressed(handle) => {
                debug!(interactable = self.name_of(*handle), "interactable_pressed");
            }
            DispatchOutcome::Released(handle) => {
                debug!(interactable = self.name_of(*handle), "release_without_press");
            }
            DispatchOutcome::Committed(handle, commit) => {
                let interactable = self.name_of(*handle);
                match commit {
                    CommitOutcome::Delivered(item) => {
                        debug!(interactable, item = %item.def_name, "item_picked_up");
                    }
                    CommitOutcome::Received(item) => {
                        info!(interactable, item = %item.def_name, "payload_received");
                    }
                    CommitOutcome::RoomChangeRequested(room) => {
                        debug!(interactable, room = room.0, "door_used");
                    }
                    CommitOutcome::Blocked | CommitOutcome::Nothing => {
                        debug!(interactable, "commit_without_action");
                    }
                }
            }
            DispatchOutcome::MoveRequested(destination) => {
                debug!(x = destination.x, z = destination.z, "move_requested");
            }
            DispatchOutcome::MoveIgnored(error) => {
                warn!(error = %error, "move_request_ignored");
            }
        }
    }

    fn name_of(&self, handle: InteractableHandle) -> &str {
        self.interactables
            .get(handle)
            .map_or("?", Interactable::name)
    }

    /// Mirrors gameplay state onto the world for the renderer.
    fn sync_presentation(&self, world: &mut SceneWorld) {
        for (_, interactable) in self.interactables.iter() {
            let Some(entity) = world.find_entity_mut(interactable.entity()) else {
                continue;
            };
            entity.visible = interactable.is_visible();
            if let Some(sprite) = interactable.display_sprite() {
                entity.renderable.kind = RenderableKind::Sprite(sprite.to_string());
            }
        }

        let hovered = self
            .controller
            .hovered()
            .and_then(|handle| self.interactables.get(handle))
            .map(Interactable::entity);
        world.set_hovered_entity_visual(hovered);
        world.hud_mut().mood_bar = self.player.mood().indicator().and_then(MoodBar::visual);
    }
}

struct LevelLayout<'a> {
    config: &'a GameplayConfig,
    world: &'a mut SceneWorld,
    rooms: &'a mut RoomManager,
    interactables: &'a mut InteractableRegistry,
}

impl LevelLayout<'_> {
    fn floor(&mut self, room: RoomId, name: &str, size: (f32, f32), tint: [u8; 4]) {
        let anchor = room_anchor(self.rooms, room);
        let entity = self.world.spawn_with_collider(
            anchor,
            Vec3::new(size.0 * 0.5, FLOOR_HALF_THICKNESS, size.1 * 0.5),
            RenderableDesc {
                kind: RenderableKind::Floor {
                    width: size.0,
                    depth: size.1,
                },
                tint,
                debug_name: name.to_string(),
            },
        );
        self.add_member(room, entity);
    }

    fn door(&mut self, room: RoomId, name: &str, position: Vec3, target: RoomId) {
        let entity = self.world.spawn_with_collider(
            position,
            DOOR_HALF_EXTENTS,
            RenderableDesc::placeholder(name, DOOR_TINT),
        );
        self.add_member(room, entity);
        self.register(
            Interactable::door(entity, name, target)
                .with_interaction_stress(self.config.interaction.door_stress),
        );
    }

    fn item_slot(&mut self, room: RoomId, name: &str, def_name: Option<&str>, position: Vec3) {
        let entity = self.world.spawn_with_collider(
            position,
            SLOT_HALF_EXTENTS,
            RenderableDesc::placeholder(name, SLOT_TINT),
        );
        self.add_member(room, entity);

        let mut slot = Interactable::item(entity, name)
            .with_interaction_stress(self.config.interaction.pickup_stress);
        if let Some(payload) = def_name.and_then(|def_name| self.lookup_item(def_name)) {
            if let Err(error) = slot.set_payload(payload) {
                warn!(error = %error, "item_payload_rejected");
            }
        }
        self.register(slot);
    }

    fn drop_off(&mut self, room: RoomId, name: &str, position: Vec3) {
        let entity = self.world.spawn_with_collider(
            position,
            SLOT_HALF_EXTENTS,
            RenderableDesc::placeholder(name, BASKET_TINT),
        );
        self.add_member(room, entity);
        self.register(
            Interactable::drop_off(entity, name)
                .with_interaction_stress(self.config.interaction.delivery_stress),
        );
    }

    fn lookup_item(&self, def_name: &str) -> Option<Arc<ItemData>> {
        let item = self
            .world
            .def_database()
            .and_then(|db| db.item_by_name(def_name));
        if item.is_none() {
            warn!(def_name, "item_def_missing");
        }
        item
    }

    fn add_member(&mut self, room: RoomId, entity: EntityId) {
        if let Err(error) = self.rooms.add_member(room, entity) {
            warn!(error = %error, entity = entity.0, "room_member_rejected");
        }
    }

    fn register(&mut self, interactable: Interactable) {
        if let Err(error) = self.interactables.register(interactable) {
            warn!(error = %error, "interactable_register_failed");
        }
    }
}

fn room_anchor(rooms: &RoomManager, room: RoomId) -> Vec3 {
    rooms.room(room).map(|room| room.anchor()).unwrap_or(Vec3::ZERO)
}

fn build_mood(config: &GameplayConfig) -> MoodModel {
    let gradient = Gradient::new(
        config
            .mood
            .gradient
            .iter()
            .map(|key| GradientKey {
                position: key.position,
                color: key.color,
            })
            .collect(),
    );
    let mood = MoodModel::new(config.mood.initial, gradient);
    if config.mood.show_indicator {
        mood.with_indicator(MoodBar::default())
    } else {
        mood
    }
}

pub(crate) struct AdventureScene {
    config: GameplayConfig,
    level: Option<Level>,
}

impl AdventureScene {
    pub(crate) fn new(config: GameplayConfig) -> Self {
        Self {
            config,
            level: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }
}

impl Scene for AdventureScene {
    fn load(&mut self, world: &mut SceneWorld) {
        let level = Level::build(&self.config, world);
        level.sync_presentation(world);
        info!(
            entity_count = world.entity_count(),
            interactables = level.interactables.len(),
            room = ?level.player.current_room(),
            "scene_loaded"
        );
        self.level = Some(level);
    }

    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot, world: &mut SceneWorld) {
        let Some(level) = self.level.as_mut() else {
            return;
        };

        level.agent.tick(fixed_dt_seconds);
        if let Some(entity) = world.find_entity_mut(level.player_entity) {
            entity.position = level.agent.position();
        }

        let mut ctx = InteractionContext {
            world: &mut *world,
            player: &mut level.player,
            rooms: &mut level.rooms,
            interactables: &mut level.interactables,
            agent: &mut level.agent,
        };
        let outcomes = level.controller.tick(fixed_dt_seconds, input, &mut ctx);
        for outcome in &outcomes {
            level.report(outcome);
        }

        level.rooms.advance_transition(fixed_dt_seconds, world);
        level.sync_presentation(world);
    }

    fn render(&mut self, _world: &SceneWorld) {}

    fn unload(&mut self, world: &mut SceneWorld) {
        info!(entity_count = world.entity_count(), "scene_unload");
        self.level = None;
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        let level = self.level.as_ref()?;
        let room = level
            .player
            .current_room()
            .and_then(|id| level.rooms.room(id))
            .map_or("-", |room| room.name());
        let holding = level
            .player
            .held_item()
            .map_or("nothing", |item| item.label.as_str());
        Some(format!(
            "Mummy Pietree | Room {} | Mood {:.2} | Holding {} | Cue {}",
            room,
            level.player.mood().value(),
            holding,
            level.controller.animation_cue().clip_name()
        ))
    }
}
