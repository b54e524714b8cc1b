use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemDefId(pub u32);

/// Immutable description of something the player can carry.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemData {
    pub id: ItemDefId,
    pub def_name: String,
    pub label: String,
    pub sprite: String,
    /// Present for plants only.
    pub plant: Option<PlantData>,
}

impl ItemData {
    pub fn is_plant(&self) -> bool {
        self.plant.is_some()
    }
}

/// Growth data carried by plant items. Both stage lists always have the same
/// length; the compiler rejects content where they differ.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantData {
    pub growth_duration_seconds: f32,
    pub growing_state_meshes: Vec<String>,
    pub growing_state_materials: Vec<String>,
}

impl PlantData {
    pub fn stage_count(&self) -> usize {
        self.growing_state_meshes.len()
    }
}

#[derive(Debug, Default, Clone)]
pub struct DefDatabase {
    items: Vec<Arc<ItemData>>,
    item_ids_by_name: HashMap<String, ItemDefId>,
}

impl DefDatabase {
    /// Ids follow the order of `items`, which callers sort by `def_name`.
    pub(crate) fn from_items(items: Vec<ItemData>) -> Self {
        let mut item_ids_by_name = HashMap::with_capacity(items.len());
        let items = items
            .into_iter()
            .enumerate()
            .map(|(idx, mut item)| {
                let id = ItemDefId(idx as u32);
                item.id = id;
                item_ids_by_name.insert(item.def_name.clone(), id);
                Arc::new(item)
            })
            .collect();
        Self {
            items,
            item_ids_by_name,
        }
    }

    pub fn item_id_by_name(&self, name: &str) -> Option<ItemDefId> {
        self.item_ids_by_name.get(name).copied()
    }

    pub fn item(&self, id: ItemDefId) -> Option<&Arc<ItemData>> {
        self.items.get(id.0 as usize)
    }

    /// Shared handle to the named item; cloning it is cheap.
    pub fn item_by_name(&self, name: &str) -> Option<Arc<ItemData>> {
        self.item_id_by_name(name)
            .and_then(|id| self.item(id))
            .map(Arc::clone)
    }

    pub fn items(&self) -> &[Arc<ItemData>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(def_name: &str) -> ItemData {
        ItemData {
            id: ItemDefId(99),
            def_name: def_name.to_string(),
            label: def_name.to_uppercase(),
            sprite: "items/placeholder".to_string(),
            plant: None,
        }
    }

    #[test]
    fn ids_follow_input_order_and_lookup_shares_records() {
        let db = DefDatabase::from_items(vec![item("item.a"), item("item.b")]);
        assert_eq!(db.item_id_by_name("item.a"), Some(ItemDefId(0)));
        assert_eq!(db.item_id_by_name("item.b"), Some(ItemDefId(1)));

        let first = db.item_by_name("item.b").expect("item");
        let second = db.item_by_name("item.b").expect("item");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.id, ItemDefId(1));
        assert!(db.item_by_name("item.missing").is_none());
    }
}
