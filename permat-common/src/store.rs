//! Generic ordered entity store
//!
//! Backing collection for the CRUD surfaces: an ordered list of entities
//! with unique integer ids. Ids are handed out by `next_id` (max existing
//! id + 1, or 1 when empty); uniqueness after that is the calling surface's
//! responsibility, not a runtime-checked invariant.

pub trait Entity: Clone {
    /// Collection-unique integer id.
    fn id(&self) -> i64;

    /// Refresh the updated-at audit fields.
    fn touch(&mut self);
}

/// Ordered list of entities addressed by id.
#[derive(Debug, Clone)]
pub struct EntityStore<T: Entity> {
    items: Vec<T>,
}

impl<T: Entity> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn from_items(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Entities in insertion order.
    pub fn list(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.get(id).is_some()
    }

    /// Append an entity. The caller obtains fresh ids from `next_id`.
    pub fn add(&mut self, entity: T) {
        self.items.push(entity);
    }

    /// Full-record replace by id. The replacement may carry a different id
    /// (an id edit); mapping rekeying is the caller's concern.
    ///
    /// Returns false when no entity with `id` exists.
    pub fn replace(&mut self, id: i64, entity: T) -> bool {
        match self.items.iter_mut().find(|item| item.id() == id) {
            Some(slot) => {
                *slot = entity;
                true
            }
            None => false,
        }
    }

    /// Remove by id, returning the removed entity when present.
    pub fn remove(&mut self, id: i64) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Next free id: max existing id + 1, or 1 when the store is empty.
    pub fn next_id(&self) -> i64 {
        self.items.iter().map(Entity::id).max().map_or(1, |max| max + 1)
    }

    pub fn ids(&self) -> Vec<i64> {
        self.items.iter().map(Entity::id).collect()
    }

    /// Ids in the string form used as mapping keys.
    pub fn id_keys(&self) -> Vec<String> {
        self.items.iter().map(|item| item.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Wholesale replacement (import paths).
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
    }
}
