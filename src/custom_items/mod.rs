//! User-defined checklist items and their persistence in local storage.

pub mod model;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::{build_catalog, StepCatalog};
use crate::errors::Result;
use crate::storage::KeyValueStore;

pub use model::{CustomFollowUp, CustomItem, CustomItemId, CustomItemKind, DEFAULT_ICON};

/// Fixed storage key holding the JSON-encoded ordered item list.
pub const CUSTOM_ITEMS_KEY: &str = "customChecklistItems";

/// CRUD over the ordered custom item list. Every mutation rewrites the whole
/// list; index-based operations on a stale index are no-ops. Stored entries
/// that cannot be read are kept verbatim and written back after the items.
pub struct CustomItemStore {
    backend: Arc<dyn KeyValueStore>,
    items: Vec<CustomItem>,
    unreadable: Vec<serde_json::Value>,
}

#[derive(Default)]
struct ParsedItems {
    items: Vec<CustomItem>,
    unreadable: Vec<serde_json::Value>,
    /// Ids were assigned or de-duplicated.
    repaired: bool,
}

impl CustomItemStore {
    /// Reads the stored list. Items saved without an id (or with a duplicated
    /// one) are given a fresh id and the list is written back immediately.
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Result<Self> {
        let parsed = match backend.get(CUSTOM_ITEMS_KEY)? {
            Some(raw) if !raw.trim().is_empty() => parse_items(&raw)?,
            _ => ParsedItems::default(),
        };
        let store = Self {
            backend,
            items: parsed.items,
            unreadable: parsed.unreadable,
        };
        if parsed.repaired {
            info!(count = store.items.len(), "assigned ids to stored custom items");
            store.persist()?;
        }
        Ok(store)
    }

    pub fn reload(&mut self) -> Result<()> {
        let fresh = Self::load(Arc::clone(&self.backend))?;
        self.items = fresh.items;
        self.unreadable = fresh.unreadable;
        Ok(())
    }

    pub fn items(&self) -> &[CustomItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CustomItem> {
        self.items.get(index)
    }

    pub fn position(&self, id: CustomItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Step catalog for the current list.
    pub fn catalog(&self) -> StepCatalog {
        build_catalog(&self.items)
    }

    pub fn add(&mut self, item: CustomItem) -> Result<CustomItemId> {
        let mut item = item.normalized();
        item.validate()?;
        if self.position(item.id).is_some() {
            item.id = CustomItemId::new();
        }
        let id = item.id;
        info!(%id, name = %item.name, "custom item added");
        self.items.push(item);
        self.persist()?;
        Ok(id)
    }

    /// Replaces the item at `index`, keeping its id. Returns `false` without
    /// touching storage when the index no longer exists.
    pub fn update(&mut self, index: usize, item: CustomItem) -> Result<bool> {
        let Some(existing_id) = self.items.get(index).map(|existing| existing.id) else {
            debug!(index, "update ignored for stale custom item index");
            return Ok(false);
        };
        let mut item = item.normalized();
        item.validate()?;
        item.id = existing_id;
        info!(id = %existing_id, name = %item.name, "custom item updated");
        self.items[index] = item;
        self.persist()?;
        Ok(true)
    }

    /// Removes the item at `index`. Returns `None` when the index is stale.
    pub fn remove(&mut self, index: usize) -> Result<Option<CustomItem>> {
        if index >= self.items.len() {
            debug!(index, "remove ignored for stale custom item index");
            return Ok(None);
        }
        let removed = self.items.remove(index);
        info!(id = %removed.id, name = %removed.name, "custom item removed");
        self.persist()?;
        Ok(Some(removed))
    }

    fn persist(&self) -> Result<()> {
        let mut values = self
            .items
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        values.extend(self.unreadable.iter().cloned());
        let json = serde_json::to_string(&values)?;
        self.backend.set(CUSTOM_ITEMS_KEY, &json)
    }
}

fn parse_items(raw: &str) -> Result<ParsedItems> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let mut parsed = ParsedItems::default();
    let mut seen = HashSet::new();
    for value in values {
        let missing_id = value.get("id").is_none();
        let mut item: CustomItem = match serde_json::from_value(value.clone()) {
            Ok(item) => item,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable custom item");
                parsed.unreadable.push(value);
                continue;
            }
        };
        if missing_id {
            parsed.repaired = true;
        }
        if !seen.insert(item.id) {
            item.id = CustomItemId::new();
            seen.insert(item.id);
            parsed.repaired = true;
        }
        parsed.items.push(item);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FollowUpKind;
    use crate::storage::MemoryStore;

    fn store() -> (Arc<MemoryStore>, CustomItemStore) {
        let backend = Arc::new(MemoryStore::new());
        let store = CustomItemStore::load(backend.clone()).unwrap();
        (backend, store)
    }

    #[test]
    fn add_persists_full_list() {
        let (backend, mut store) = store();
        store
            .add(CustomItem::new("Water", "💧", CustomItemKind::Rating))
            .unwrap();
        store
            .add(CustomItem::new("Journal", "📓", CustomItemKind::Text))
            .unwrap();

        let raw = backend.get(CUSTOM_ITEMS_KEY).unwrap().unwrap();
        let stored: Vec<CustomItem> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, store.items());
    }

    #[test]
    fn stale_index_operations_are_noops() {
        let (backend, mut store) = store();
        store
            .add(CustomItem::new("Water", "💧", CustomItemKind::Rating))
            .unwrap();
        let before = backend.get(CUSTOM_ITEMS_KEY).unwrap();

        assert!(!store
            .update(3, CustomItem::new("Other", "x", CustomItemKind::Text))
            .unwrap());
        assert!(store.remove(1).unwrap().is_none());
        assert_eq!(backend.get(CUSTOM_ITEMS_KEY).unwrap(), before);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_keeps_identity() {
        let (_, mut store) = store();
        let id = store
            .add(CustomItem::new("Water", "💧", CustomItemKind::Rating))
            .unwrap();
        assert!(store
            .update(0, CustomItem::new("Hydration", "💧", CustomItemKind::Rating))
            .unwrap());
        assert_eq!(store.get(0).unwrap().id, id);
        assert_eq!(store.get(0).unwrap().name, "Hydration");
    }

    #[test]
    fn removing_an_earlier_item_keeps_later_ids_and_catalog_unique() {
        let (_, mut store) = store();
        store
            .add(CustomItem::new("Walk", "🚶", CustomItemKind::YesNo))
            .unwrap();
        let supplements = store
            .add(
                CustomItem::new("Supplements", "💊", CustomItemKind::YesNo).with_follow_up(
                    CustomFollowUp::new(
                        "Which ones?",
                        FollowUpKind::MultiSelect,
                        vec!["Vitamin D".into(), "Omega 3".into()],
                    ),
                ),
            )
            .unwrap();
        let key_before = store.get(1).unwrap().step_key();

        store.remove(0).unwrap();

        let item = store.get(0).unwrap();
        assert_eq!(item.id, supplements);
        assert_eq!(item.step_key(), key_before);

        let catalog = store.catalog();
        let mut ids: Vec<&str> = catalog.steps().iter().map(|step| step.id.as_str()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert!(catalog.step(&key_before).is_some());
    }

    #[test]
    fn legacy_list_without_ids_is_repaired_once() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set(
                CUSTOM_ITEMS_KEY,
                r#"[{"name":"Bedtime","type":"time","icon":"🌙","options":["22:00","23:00"]},
                    {"name":"Mood","type":"rating","icon":"🙂","options":[]}]"#,
            )
            .unwrap();

        let first = CustomItemStore::load(backend.clone()).unwrap();
        let second = CustomItemStore::load(backend.clone()).unwrap();
        assert_eq!(first.items(), second.items());
        assert_ne!(first.get(0).unwrap().id, first.get(1).unwrap().id);
    }

    #[test]
    fn unreadable_items_are_kept_in_storage() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set(
                CUSTOM_ITEMS_KEY,
                r#"[{"name":"Water","type":"rating","icon":"💧","options":[]},
                    {"name":"Bedtime","type":"time","options":null}]"#,
            )
            .unwrap();

        let mut store = CustomItemStore::load(backend.clone()).unwrap();
        assert_eq!(store.len(), 1);
        let stored = backend.get(CUSTOM_ITEMS_KEY).unwrap().unwrap();
        assert!(stored.contains("Bedtime"));

        store
            .add(CustomItem::new("Journal", "📓", CustomItemKind::Text))
            .unwrap();
        store.remove(0).unwrap();
        let stored: Vec<serde_json::Value> =
            serde_json::from_str(&backend.get(CUSTOM_ITEMS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0]["name"], "Journal");
        assert_eq!(stored[1]["name"], "Bedtime");
        assert!(stored[1]["options"].is_null());
        assert_eq!(CustomItemStore::load(backend).unwrap().len(), 1);
    }

    #[test]
    fn invalid_item_is_rejected_without_persisting() {
        let (backend, mut store) = store();
        let result = store.add(CustomItem::new("   ", "x", CustomItemKind::Text));
        assert!(result.is_err());
        assert!(backend.get(CUSTOM_ITEMS_KEY).unwrap().is_none());
    }
}
