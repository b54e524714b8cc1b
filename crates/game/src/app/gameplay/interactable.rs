use std::sync::Arc;

use engine::{EntityId, ItemData};
use thiserror::Error;
use tracing::warn;

use super::player::PlayerState;
use super::rooms::RoomId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum InteractionState {
    #[default]
    Idle,
    Hovered,
    Pressed,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum InteractableKind {
    /// Pickup slot. Visible exactly when it carries a payload.
    Item { payload: Option<Arc<ItemData>> },
    Door { target_room: RoomId },
    /// Receiving end of the hand-off: takes whatever the player holds.
    DropOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PressOutcome {
    Pressed,
    /// Target exists but is gated; state is unchanged.
    Rejected,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CommitOutcome {
    Delivered(Arc<ItemData>),
    RoomChangeRequested(RoomId),
    Received(Arc<ItemData>),
    /// The hand-off target refused the payload; the item keeps it.
    Blocked,
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum InteractableError {
    #[error("interactable '{name}' is not an item slot")]
    NotAnItem { name: String },
    #[error("entity {entity:?} already has an interactable")]
    AlreadyRegistered { entity: EntityId },
}

#[derive(Debug, Clone)]
pub(crate) struct Interactable {
    entity: EntityId,
    name: String,
    kind: InteractableKind,
    enabled: bool,
    visible: bool,
    display_sprite: Option<String>,
    state: InteractionState,
    interaction_stress: f32,
}

impl Interactable {
    fn new(entity: EntityId, name: impl Into<String>, kind: InteractableKind) -> Self {
        Self {
            entity,
            name: name.into(),
            kind,
            enabled: true,
            visible: true,
            display_sprite: None,
            state: InteractionState::Idle,
            interaction_stress: 0.0,
        }
    }

    /// An empty item slot. Hidden until a payload is set.
    pub(crate) fn item(entity: EntityId, name: impl Into<String>) -> Self {
        let mut interactable = Self::new(entity, name, InteractableKind::Item { payload: None });
        interactable.visible = false;
        interactable
    }

    pub(crate) fn door(entity: EntityId, name: impl Into<String>, target_room: RoomId) -> Self {
        Self::new(entity, name, InteractableKind::Door { target_room })
    }

    pub(crate) fn drop_off(entity: EntityId, name: impl Into<String>) -> Self {
        Self::new(entity, name, InteractableKind::DropOff)
    }

    pub(crate) fn with_interaction_stress(mut self, delta: f32) -> Self {
        self.interaction_stress = delta;
        self
    }

    pub(crate) fn entity(&self) -> EntityId {
        self.entity
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> InteractionState {
        self.state
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn display_sprite(&self) -> Option<&str> {
        self.display_sprite.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[cfg(test)]
    pub(crate) fn payload(&self) -> Option<&Arc<ItemData>> {
        match &self.kind {
            InteractableKind::Item { payload } => payload.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn is_interactable(&self, player: &PlayerState) -> bool {
        if !self.enabled || !self.visible {
            return false;
        }
        match &self.kind {
            InteractableKind::Item { payload } => payload.is_some() && !player.has_item(),
            InteractableKind::Door { .. } => true,
            InteractableKind::DropOff => player.has_item(),
        }
    }

    /// Returns true when the object is hovered afterwards.
    pub(crate) fn hover(&mut self, player: &PlayerState) -> bool {
        if !self.is_interactable(player) {
            return false;
        }
        match self.state {
            InteractionState::Idle | InteractionState::Hovered => {
                self.state = InteractionState::Hovered;
                true
            }
            InteractionState::Pressed => false,
        }
    }

    pub(crate) fn unhover(&mut self) {
        if self.state == InteractionState::Hovered {
            self.state = InteractionState::Idle;
        }
    }

    /// Hover is not a precondition; any interactable state may be pressed.
    pub(crate) fn press(&mut self, player: &PlayerState) -> PressOutcome {
        if !self.is_interactable(player) {
            return PressOutcome::Rejected;
        }
        self.state = InteractionState::Pressed;
        PressOutcome::Pressed
    }

    /// Pressed to Idle. Returns false when there was no press to release.
    pub(crate) fn release(&mut self) -> bool {
        if self.state != InteractionState::Pressed {
            return false;
        }
        self.state = InteractionState::Idle;
        true
    }

    pub(crate) fn cancel_press(&mut self) {
        if self.state == InteractionState::Pressed {
            self.state = InteractionState::Idle;
        }
    }

    /// Runs the variant action. Only called right after a successful release.
    pub(crate) fn commit(&mut self, player: &mut PlayerState) -> CommitOutcome {
        let outcome = match self.kind.clone() {
            InteractableKind::Item { payload: None } => CommitOutcome::Nothing,
            InteractableKind::Item {
                payload: Some(payload),
            } => match player.deliver_payload(payload) {
                Ok(()) => match self.remove_payload() {
                    Ok(Some(delivered)) => CommitOutcome::Delivered(delivered),
                    Ok(None) | Err(_) => CommitOutcome::Nothing,
                },
                Err(error) => {
                    warn!(interactable = %self.name, error = %error, "item_commit_blocked");
                    CommitOutcome::Blocked
                }
            },
            InteractableKind::Door { target_room } => {
                CommitOutcome::RoomChangeRequested(target_room)
            }
            InteractableKind::DropOff => match player.take_held_item() {
                Some(item) => CommitOutcome::Received(item),
                None => CommitOutcome::Nothing,
            },
        };
        let acted = matches!(
            outcome,
            CommitOutcome::Delivered(_)
                | CommitOutcome::RoomChangeRequested(_)
                | CommitOutcome::Received(_)
        );
        if acted && self.interaction_stress != 0.0 {
            player.apply_interaction_stress(self.interaction_stress);
        }
        outcome
    }

    /// Overwrites any existing payload and shows the item.
    pub(crate) fn set_payload(&mut self, payload: Arc<ItemData>) -> Result<(), InteractableError> {
        let InteractableKind::Item { payload: slot } = &mut self.kind else {
            return Err(InteractableError::NotAnItem {
                name: self.name.clone(),
            });
        };
        self.display_sprite = Some(payload.sprite.clone());
        *slot = Some(payload);
        self.visible = true;
        Ok(())
    }

    /// Clears and returns the payload; `Ok(None)` when already empty.
    pub(crate) fn remove_payload(&mut self) -> Result<Option<Arc<ItemData>>, InteractableError> {
        let InteractableKind::Item { payload } = &mut self.kind else {
            return Err(InteractableError::NotAnItem {
                name: self.name.clone(),
            });
        };
        let taken = payload.take();
        self.visible = false;
        Ok(taken)
    }
}

#[cfg(test)]
mod tests {
    use engine::{ItemDefId, Vec3};

    use super::super::mood::{Gradient, MoodModel};
    use super::*;

    fn item_data(def_name: &str) -> Arc<ItemData> {
        Arc::new(ItemData {
            id: ItemDefId(0),
            def_name: def_name.to_string(),
            label: def_name.to_string(),
            sprite: format!("items/{def_name}"),
            plant: None,
        })
    }

    fn filled(entity: EntityId, name: &str) -> Interactable {
        let mut slot = Interactable::item(entity, name);
        slot.set_payload(item_data("can")).expect("item slot");
        slot
    }

    fn player() -> PlayerState {
        PlayerState::new(Vec3::ZERO, MoodModel::new(0.5, Gradient::new(Vec::new())))
    }

    #[test]
    fn set_then_remove_payload_returns_it_and_hides_item() {
        let mut slot = Interactable::item(EntityId(1), "slot");
        assert!(!slot.is_visible());

        let can = item_data("can");
        slot.set_payload(Arc::clone(&can)).expect("item");
        assert!(slot.is_visible());
        assert_eq!(slot.display_sprite(), Some("items/can"));

        let removed = slot.remove_payload().expect("item").expect("payload");
        assert!(Arc::ptr_eq(&removed, &can));
        assert!(slot.payload().is_none());
        assert!(!slot.is_visible());
        assert_eq!(slot.remove_payload(), Ok(None));
    }

    #[test]
    fn payload_operations_reject_non_items() {
        let mut door = Interactable::door(EntityId(2), "door", RoomId(1));
        assert!(matches!(
            door.set_payload(item_data("can")),
            Err(InteractableError::NotAnItem { .. })
        ));
        assert!(door.remove_payload().is_err());
    }

    #[test]
    fn press_while_not_interactable_is_rejected_without_side_effects() {
        let mut player = player();
        player.deliver_payload(item_data("held")).expect("hold");
        let mut slot = filled(EntityId(1), "slot");

        assert_eq!(slot.press(&player), PressOutcome::Rejected);
        assert_eq!(slot.state(), InteractionState::Idle);
        assert!(!slot.release());
        assert!(slot.payload().is_some());
    }

    #[test]
    fn press_without_hover_is_allowed() {
        let player = player();
        let mut slot = filled(EntityId(1), "slot");
        assert_eq!(slot.press(&player), PressOutcome::Pressed);
        assert_eq!(slot.state(), InteractionState::Pressed);
    }

    #[test]
    fn hover_unhover_cycle_respects_gating() {
        let player = player();
        let mut empty = Interactable::item(EntityId(1), "empty");
        assert!(!empty.hover(&player));
        assert_eq!(empty.state(), InteractionState::Idle);

        let mut slot = filled(EntityId(2), "slot");
        assert!(slot.hover(&player));
        assert!(slot.hover(&player));
        assert_eq!(slot.state(), InteractionState::Hovered);
        slot.unhover();
        assert_eq!(slot.state(), InteractionState::Idle);

        slot.set_enabled(false);
        assert!(!slot.hover(&player));
    }

    #[test]
    fn item_commit_hands_payload_to_player_and_clears_slot() {
        let mut player = player();
        let mut slot = filled(EntityId(1), "slot")
            .with_interaction_stress(0.2);
        assert_eq!(slot.press(&player), PressOutcome::Pressed);
        assert!(slot.release());

        let outcome = slot.commit(&mut player);
        assert!(matches!(outcome, CommitOutcome::Delivered(ref item) if item.def_name == "can"));
        assert_eq!(player.held_item().expect("held").def_name, "can");
        assert!(slot.payload().is_none());
        assert!(!slot.is_visible());
        assert!((player.mood().value() - 0.7).abs() < 1.0e-6);
    }

    #[test]
    fn blocked_commit_keeps_payload() {
        let mut player = player();
        let mut slot = filled(EntityId(1), "slot");
        assert_eq!(slot.press(&player), PressOutcome::Pressed);
        player.deliver_payload(item_data("other")).expect("hold");
        assert!(slot.release());

        assert_eq!(slot.commit(&mut player), CommitOutcome::Blocked);
        assert!(slot.payload().is_some());
        assert_eq!(player.held_item().expect("held").def_name, "other");
    }

    #[test]
    fn drop_off_only_interactable_while_holding() {
        let mut player = player();
        let mut basket = Interactable::drop_off(EntityId(3), "basket");
        assert_eq!(basket.press(&player), PressOutcome::Rejected);

        player.deliver_payload(item_data("can")).expect("hold");
        assert_eq!(basket.press(&player), PressOutcome::Pressed);
        assert!(basket.release());
        assert!(matches!(basket.commit(&mut player), CommitOutcome::Received(_)));
        assert!(!player.has_item());
    }

    #[test]
    fn door_commit_requests_room_change() {
        let mut player = player();
        let mut door = Interactable::door(EntityId(4), "door", RoomId(7));
        assert_eq!(door.press(&player), PressOutcome::Pressed);
        assert!(door.release());
        assert_eq!(
            door.commit(&mut player),
            CommitOutcome::RoomChangeRequested(RoomId(7))
        );
    }
}
