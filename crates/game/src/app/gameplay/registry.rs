use std::collections::HashMap;

use engine::EntityId;

use super::interactable::{Interactable, InteractableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct InteractableHandle(usize);

/// Maps collider entities to their interaction capability. A scene-query hit
/// is resolved here once instead of every consumer probing the entity.
#[derive(Debug, Default)]
pub(crate) struct InteractableRegistry {
    interactables: Vec<Interactable>,
    by_entity: HashMap<EntityId, InteractableHandle>,
}

impl InteractableRegistry {
    pub(crate) fn register(
        &mut self,
        interactable: Interactable,
    ) -> Result<InteractableHandle, InteractableError> {
        let entity = interactable.entity();
        if self.by_entity.contains_key(&entity) {
            return Err(InteractableError::AlreadyRegistered { entity });
        }
        let handle = InteractableHandle(self.interactables.len());
        self.interactables.push(interactable);
        self.by_entity.insert(entity, handle);
        Ok(handle)
    }

    pub(crate) fn handle_for(&self, entity: EntityId) -> Option<InteractableHandle> {
        self.by_entity.get(&entity).copied()
    }

    pub(crate) fn get(&self, handle: InteractableHandle) -> Option<&Interactable> {
        self.interactables.get(handle.0)
    }

    pub(crate) fn get_mut(&mut self, handle: InteractableHandle) -> Option<&mut Interactable> {
        self.interactables.get_mut(handle.0)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (InteractableHandle, &Interactable)> {
        self.interactables
            .iter()
            .enumerate()
            .map(|(index, interactable)| (InteractableHandle(index), interactable))
    }

    pub(crate) fn len(&self) -> usize {
        self.interactables.len()
    }
}
