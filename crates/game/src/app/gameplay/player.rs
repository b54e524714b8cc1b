use std::sync::Arc;

use engine::{ItemData, Vec3};
use thiserror::Error;
use tracing::info;

use super::mood::MoodModel;
use super::rooms::RoomId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum DeliveryError {
    #[error("player already holds '{held}'")]
    HandsFull { held: String },
}

/// The per-level player context. Components borrow it explicitly instead of
/// reaching for a global.
#[derive(Debug)]
pub(crate) struct PlayerState {
    current_room: Option<RoomId>,
    held_item: Option<Arc<ItemData>>,
    pub(crate) position: Vec3,
    pub(crate) direction: Vec3,
    mood: MoodModel,
}

impl PlayerState {
    pub(crate) fn new(position: Vec3, mood: MoodModel) -> Self {
        Self {
            current_room: None,
            held_item: None,
            position,
            direction: Vec3::ZERO,
            mood,
        }
    }

    pub(crate) fn current_room(&self) -> Option<RoomId> {
        self.current_room
    }

    pub(super) fn set_current_room(&mut self, room: RoomId) {
        self.current_room = Some(room);
    }

    pub(crate) fn has_item(&self) -> bool {
        self.held_item.is_some()
    }

    pub(crate) fn held_item(&self) -> Option<&Arc<ItemData>> {
        self.held_item.as_ref()
    }

    /// Hand-off target for an item's payload. The slot is exclusive.
    pub(crate) fn deliver_payload(&mut self, item: Arc<ItemData>) -> Result<(), DeliveryError> {
        if let Some(held) = &self.held_item {
            return Err(DeliveryError::HandsFull {
                held: held.def_name.clone(),
            });
        }
        info!(item = %item.def_name, label = %item.label, "payload_delivered");
        self.held_item = Some(item);
        Ok(())
    }

    pub(crate) fn take_held_item(&mut self) -> Option<Arc<ItemData>> {
        self.held_item.take()
    }

    pub(crate) fn apply_interaction_stress(&mut self, delta: f32) -> f32 {
        self.mood.apply_stress(delta)
    }

    pub(crate) fn mood(&self) -> &MoodModel {
        &self.mood
    }
}

#[cfg(test)]
mod tests {
    use engine::ItemDefId;

    use super::super::mood::{Gradient, MoodBar};
    use super::*;

    fn item(def_name: &str) -> Arc<ItemData> {
        Arc::new(ItemData {
            id: ItemDefId(0),
            def_name: def_name.to_string(),
            label: def_name.to_string(),
            sprite: "items/test".to_string(),
            plant: None,
        })
    }

    fn player() -> PlayerState {
        PlayerState::new(
            Vec3::ZERO,
            MoodModel::new(0.5, Gradient::new(Vec::new())).with_indicator(MoodBar::default()),
        )
    }

    #[test]
    fn held_slot_is_exclusive() {
        let mut player = player();
        player.deliver_payload(item("item.a")).expect("first");
        let err = player.deliver_payload(item("item.b")).expect_err("full");
        assert_eq!(
            err,
            DeliveryError::HandsFull {
                held: "item.a".to_string()
            }
        );
        assert_eq!(player.held_item().expect("held").def_name, "item.a");

        let taken = player.take_held_item().expect("taken");
        assert_eq!(taken.def_name, "item.a");
        assert!(!player.has_item());
        player.deliver_payload(item("item.b")).expect("free again");
    }

    #[test]
    fn interaction_stress_is_clamped() {
        let mut player = player();
        assert_eq!(player.apply_interaction_stress(-1.2), 0.0);
        assert_eq!(player.apply_interaction_stress(3.0), 1.0);
        assert_eq!(player.mood().value(), 1.0);
    }
}
