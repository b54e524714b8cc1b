use engine::{InputEvent, InputSnapshot, SceneWorld, Vec2, Vec3};
use tracing::{debug, warn};

use super::interactable::{CommitOutcome, PressOutcome};
use super::nav::{MoveError, NavigationAgent, PathfindingAgent};
use super::player::PlayerState;
use super::pointer::{PointerResolver, PointerTarget};
use super::registry::{InteractableHandle, InteractableRegistry};
use super::rooms::{RoomChange, RoomManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum AnimationCue {
    #[default]
    Idle,
    Walk,
}

impl AnimationCue {
    pub(crate) fn clip_name(self) -> &'static str {
        match self {
            AnimationCue::Idle => "Player_Idle",
            AnimationCue::Walk => "Player_Walk",
        }
    }
}

/// Result of dispatching one input event.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DispatchOutcome {
    /// Nothing interactable under the pointer.
    NoTarget,
    /// Target present but gated.
    Rejected(InteractableHandle),
    Pressed(InteractableHandle),
    Committed(InteractableHandle, CommitOutcome),
    /// Released without a matching press; no action fired.
    Released(InteractableHandle),
    MoveRequested(Vec3),
    MoveIgnored(MoveError),
}

/// Everything a tick touches, borrowed for the duration of the tick.
pub(crate) struct InteractionContext<'a> {
    pub(crate) world: &'a mut SceneWorld,
    pub(crate) player: &'a mut PlayerState,
    pub(crate) rooms: &'a mut RoomManager,
    pub(crate) interactables: &'a mut InteractableRegistry,
    pub(crate) agent: &'a mut dyn PathfindingAgent,
}

/// Top-level orchestrator: owns hover and press tracking and dispatches the
/// buffered input of a tick.
#[derive(Debug)]
pub(crate) struct InteractionController {
    hovered: Option<InteractableHandle>,
    pressed: Option<InteractableHandle>,
    last_position: Option<Vec3>,
    animation_cue: AnimationCue,
    stress_gain_moving: f32,
    pointer: PointerResolver,
    navigation: NavigationAgent,
}

impl InteractionController {
    pub(crate) fn new(stress_gain_moving: f32, navigation: NavigationAgent) -> Self {
        Self {
            hovered: None,
            pressed: None,
            last_position: None,
            animation_cue: AnimationCue::Idle,
            stress_gain_moving,
            pointer: PointerResolver::default(),
            navigation,
        }
    }

    pub(crate) fn hovered(&self) -> Option<InteractableHandle> {
        self.hovered
    }

    #[cfg(test)]
    pub(crate) fn pressed(&self) -> Option<InteractableHandle> {
        self.pressed
    }

    pub(crate) fn animation_cue(&self) -> AnimationCue {
        self.animation_cue
    }

    /// One tick, in fixed order: movement direction and mood, then every
    /// buffered event in arrival order, then hover resolution.
    pub(crate) fn tick(
        &mut self,
        dt_seconds: f32,
        input: &InputSnapshot,
        ctx: &mut InteractionContext<'_>,
    ) -> Vec<DispatchOutcome> {
        self.update_movement(dt_seconds, ctx);

        let window_size = input.window_size();
        let outcomes = input
            .events()
            .iter()
            .map(|event| self.dispatch(*event, window_size, ctx))
            .collect();

        self.update_hover(input.cursor_position_px(), window_size, ctx);
        outcomes
    }

    fn update_movement(&mut self, dt_seconds: f32, ctx: &mut InteractionContext<'_>) {
        let position = ctx.agent.position();
        let direction = match self.last_position.replace(position) {
            Some(last) => (position - last).normalize_or_zero(),
            None => Vec3::ZERO,
        };
        ctx.player.position = position;
        ctx.player.direction = direction;

        let cue = if direction.is_zero() {
            AnimationCue::Idle
        } else {
            ctx.player
                .apply_interaction_stress(self.stress_gain_moving * dt_seconds);
            AnimationCue::Walk
        };
        if cue != self.animation_cue {
            debug!(clip = cue.clip_name(), "animation_cue_changed");
            self.animation_cue = cue;
        }
    }

    fn dispatch(
        &mut self,
        event: InputEvent,
        window_size: (u32, u32),
        ctx: &mut InteractionContext<'_>,
    ) -> DispatchOutcome {
        match event {
            InputEvent::PrimaryPress { position_px } => {
                self.press_at(position_px, window_size, ctx)
            }
            InputEvent::PrimaryRelease { position_px } => {
                self.release_at(position_px, window_size, ctx)
            }
            InputEvent::SecondaryPress { position_px } => {
                self.move_to(position_px, window_size, ctx)
            }
        }
    }

    fn resolve(
        &self,
        screen_px: Vec2,
        window_size: (u32, u32),
        ctx: &InteractionContext<'_>,
    ) -> PointerTarget {
        self.pointer.resolve(
            screen_px,
            window_size,
            ctx.world.camera(),
            &*ctx.world,
            &*ctx.interactables,
        )
    }

    fn press_at(
        &mut self,
        screen_px: Vec2,
        window_size: (u32, u32),
        ctx: &mut InteractionContext<'_>,
    ) -> DispatchOutcome {
        let Some(handle) = self.resolve(screen_px, window_size, ctx).interactable else {
            return DispatchOutcome::NoTarget;
        };
        self.clear_hover(ctx.interactables);

        let Some(interactable) = ctx.interactables.get_mut(handle) else {
            return DispatchOutcome::NoTarget;
        };
        match interactable.press(ctx.player) {
            PressOutcome::Rejected => DispatchOutcome::Rejected(handle),
            PressOutcome::Pressed => {
                if let Some(previous) = self.pressed.replace(handle) {
                    if previous != handle {
                        cancel_press(ctx.interactables, previous);
                    }
                }
                DispatchOutcome::Pressed(handle)
            }
        }
    }

    fn release_at(
        &mut self,
        screen_px: Vec2,
        window_size: (u32, u32),
        ctx: &mut InteractionContext<'_>,
    ) -> DispatchOutcome {
        let target = self.resolve(screen_px, window_size, ctx).interactable;
        // A press never completes on anything but the object it started on.
        if let Some(pressed) = self.pressed.take() {
            if target != Some(pressed) {
                cancel_press(ctx.interactables, pressed);
            }
        }
        let Some(handle) = target else {
            return DispatchOutcome::NoTarget;
        };
        self.clear_hover(ctx.interactables);

        let Some(interactable) = ctx.interactables.get_mut(handle) else {
            return DispatchOutcome::NoTarget;
        };
        if !interactable.release() {
            return DispatchOutcome::Released(handle);
        }
        let outcome = interactable.commit(ctx.player);
        apply_commit(&outcome, ctx);
        DispatchOutcome::Committed(handle, outcome)
    }

    fn move_to(
        &mut self,
        screen_px: Vec2,
        window_size: (u32, u32),
        ctx: &mut InteractionContext<'_>,
    ) -> DispatchOutcome {
        let target = self.resolve(screen_px, window_size, ctx);
        match self.navigation.request_move(
            &target.ray,
            target.hit.as_ref(),
            &*ctx.rooms,
            &mut *ctx.agent,
        ) {
            Ok(destination) => DispatchOutcome::MoveRequested(destination),
            Err(error) => DispatchOutcome::MoveIgnored(error),
        }
    }

    fn update_hover(
        &mut self,
        cursor_px: Option<Vec2>,
        window_size: (u32, u32),
        ctx: &mut InteractionContext<'_>,
    ) {
        let target = cursor_px
            .and_then(|cursor| self.resolve(cursor, window_size, ctx).interactable);
        let Some(handle) = target else {
            self.clear_hover(ctx.interactables);
            return;
        };

        if self.hovered == Some(handle) {
            let still_valid = ctx
                .interactables
                .get(handle)
                .is_some_and(|interactable| interactable.is_interactable(&*ctx.player));
            if !still_valid {
                self.clear_hover(ctx.interactables);
            }
            return;
        }

        self.clear_hover(ctx.interactables);
        if let Some(interactable) = ctx.interactables.get_mut(handle) {
            if interactable.hover(ctx.player) {
                debug!(interactable = %interactable.name(), "hover_changed");
                self.hovered = Some(handle);
            }
        }
    }

    fn clear_hover(&mut self, interactables: &mut InteractableRegistry) {
        if let Some(previous) = self.hovered.take() {
            if let Some(interactable) = interactables.get_mut(previous) {
                interactable.unhover();
            }
        }
    }
}

fn cancel_press(interactables: &mut InteractableRegistry, handle: InteractableHandle) {
    if let Some(interactable) = interactables.get_mut(handle) {
        interactable.cancel_press();
    }
}

fn apply_commit(outcome: &CommitOutcome, ctx: &mut InteractionContext<'_>) {
    match outcome {
        CommitOutcome::RoomChangeRequested(room) => {
            match ctx.rooms.enter_room(*room, ctx.player, ctx.world) {
                Ok(RoomChange::Changed { exited, entered }) => {
                    debug!(exited = ?exited, entered = entered.0, "room_changed");
                }
                Ok(RoomChange::Unchanged) => {}
                Err(error) => warn!(error = %error, "room_change_failed"),
            }
        }
        CommitOutcome::Delivered(_)
        | CommitOutcome::Received(_)
        | CommitOutcome::Blocked
        | CommitOutcome::Nothing => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engine::{EntityId, ItemData, ItemDefId, NavRect, RenderableDesc};

    use super::super::camera_transition::CameraTransition;
    use super::super::interactable::Interactable;
    use super::super::mood::{Gradient, MoodModel};
    use super::super::nav::SteeringAgent;
    use super::*;
    use crate::app::config::RoomTransitionConfig;

    const WINDOW: (u32, u32) = (1280, 720);
    const DT: f32 = 1.0 / 60.0;

    struct Fixture {
        world: SceneWorld,
        player: PlayerState,
        rooms: RoomManager,
        interactables: InteractableRegistry,
        agent: SteeringAgent,
        controller: InteractionController,
        empty_slot: (InteractableHandle, EntityId),
        filled_slot: (InteractableHandle, EntityId),
    }

    impl Fixture {
        fn tick(&mut self, cursor: Vec2, events: &[InputEvent]) -> Vec<DispatchOutcome> {
            let input = events.iter().fold(
                InputSnapshot::empty()
                    .with_cursor_position_px(Some(cursor))
                    .with_window_size(WINDOW),
                |snapshot, event| snapshot.with_event(*event),
            );
            let mut ctx = InteractionContext {
                world: &mut self.world,
                player: &mut self.player,
                rooms: &mut self.rooms,
                interactables: &mut self.interactables,
                agent: &mut self.agent,
            };
            self.controller.tick(DT, &input, &mut ctx)
        }

        fn screen_of(&self, entity: EntityId) -> Vec2 {
            let position = self.world.find_entity(entity).expect("entity").position;
            self.world
                .camera()
                .world_to_screen(position, WINDOW)
                .expect("on screen")
        }
    }

    fn watering_can() -> Arc<ItemData> {
        Arc::new(ItemData {
            id: ItemDefId(0),
            def_name: "item.watering_can".to_string(),
            label: "Watering can".to_string(),
            sprite: "items/watering_can".to_string(),
            plant: None,
        })
    }

    fn fixture() -> Fixture {
        let mut world = SceneWorld::default();
        let mut rooms = RoomManager::new(CameraTransition::new(RoomTransitionConfig::default()));
        let garden = rooms.add_room(
            "garden",
            Vec3::ZERO,
            NavRect::from_center_size(Vec3::ZERO, 10.0, 8.0),
        );
        let half_extents = Vec3::new(0.3, 0.3, 0.3);
        let empty_entity = world.spawn_with_collider(
            Vec3::new(0.0, 0.3, 0.0),
            half_extents,
            RenderableDesc::placeholder("empty_slot", [200, 200, 200, 255]),
        );
        let filled_entity = world.spawn_with_collider(
            Vec3::new(3.0, 0.3, 0.0),
            half_extents,
            RenderableDesc::placeholder("filled_slot", [200, 200, 200, 255]),
        );
        world.apply_pending();

        let mut interactables = InteractableRegistry::default();
        let empty = interactables
            .register(Interactable::item(empty_entity, "empty_slot"))
            .expect("register empty");
        let mut filled = Interactable::item(filled_entity, "filled_slot");
        filled.set_payload(watering_can()).expect("payload");
        let filled = interactables.register(filled).expect("register filled");

        let mut player = PlayerState::new(Vec3::ZERO, MoodModel::new(0.5, Gradient::new(Vec::new())));
        rooms.start(garden, &mut player, &mut world).expect("start");

        Fixture {
            world,
            player,
            rooms,
            interactables,
            agent: SteeringAgent::new(Vec3::ZERO, 4.0, 0.01),
            controller: InteractionController::new(0.1, NavigationAgent::new(10_000.0)),
            empty_slot: (empty, empty_entity),
            filled_slot: (filled, filled_entity),
        }
    }

    fn sky() -> Vec2 {
        Vec2 { x: 2.0, y: 2.0 }
    }

    #[test]
    fn gated_target_is_rejected_and_empty_space_has_no_target() {
        let mut f = fixture();
        let (empty, empty_entity) = f.empty_slot;
        let at = f.screen_of(empty_entity);

        let outcomes = f.tick(
            sky(),
            &[
                InputEvent::PrimaryPress { position_px: at },
                InputEvent::PrimaryPress { position_px: sky() },
            ],
        );

        assert_eq!(
            outcomes,
            vec![DispatchOutcome::Rejected(empty), DispatchOutcome::NoTarget]
        );
        assert_eq!(f.controller.pressed(), None);
    }

    #[test]
    fn press_and_release_on_same_item_commits_delivery() {
        let mut f = fixture();
        let (filled, filled_entity) = f.filled_slot;
        let at = f.screen_of(filled_entity);

        let outcomes = f.tick(
            at,
            &[
                InputEvent::PrimaryPress { position_px: at },
                InputEvent::PrimaryRelease { position_px: at },
            ],
        );

        assert_eq!(
            outcomes,
            vec![
                DispatchOutcome::Pressed(filled),
                DispatchOutcome::Committed(filled, CommitOutcome::Delivered(watering_can())),
            ]
        );
        assert_eq!(f.player.held_item(), Some(&watering_can()));
        assert_eq!(f.controller.pressed(), None);
    }

    #[test]
    fn release_without_press_fires_nothing() {
        let mut f = fixture();
        let (filled, filled_entity) = f.filled_slot;
        let at = f.screen_of(filled_entity);

        let outcomes = f.tick(at, &[InputEvent::PrimaryRelease { position_px: at }]);

        assert_eq!(outcomes, vec![DispatchOutcome::Released(filled)]);
        assert!(!f.player.has_item());
    }

    #[test]
    fn secondary_click_on_floor_requests_move() {
        let mut f = fixture();
        let at = f
            .world
            .camera()
            .world_to_screen(Vec3::new(2.0, 0.0, 2.0), WINDOW)
            .expect("on screen");

        let outcomes = f.tick(at, &[InputEvent::SecondaryPress { position_px: at }]);

        let [DispatchOutcome::MoveRequested(destination)] = outcomes.as_slice() else {
            panic!("unexpected outcomes {outcomes:?}");
        };
        assert!((destination.x - 2.0).abs() < 1.0e-3, "{destination:?}");
        assert!((destination.z - 2.0).abs() < 1.0e-3, "{destination:?}");
        assert_eq!(f.agent.destination(), Some(*destination));
    }

    #[test]
    fn secondary_click_above_horizon_is_ignored() {
        let mut f = fixture();
        // Shallow eye so the top of the screen looks above the horizon.
        f.world.camera_mut().eye_offset = Vec3::new(0.0, 2.0, 9.0);
        let at = Vec2 { x: 640.0, y: 2.0 };

        let outcomes = f.tick(at, &[InputEvent::SecondaryPress { position_px: at }]);

        assert_eq!(
            outcomes,
            vec![DispatchOutcome::MoveIgnored(MoveError::GroundPlaneMissed)]
        );
        assert_eq!(f.agent.destination(), None);
    }
}
