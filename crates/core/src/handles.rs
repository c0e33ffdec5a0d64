//! Per-adapter table of open presentations.

use crate::error::{Error, Result};
use std::collections::HashMap;
use uuid::Uuid;

/// Maps opaque presentation handles to backend objects.
///
/// Handles are random UUIDs minted by [`HandleTable::insert`], so a handle
/// from another adapter instance is never found here.
#[derive(Debug)]
pub struct HandleTable<T> {
    entries: HashMap<String, T>,
    order: Vec<String>,
}

impl<T> HandleTable<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Store an object under a freshly minted handle.
    pub fn insert(&mut self, value: T) -> String {
        let id = Uuid::new_v4().to_string();
        self.entries.insert(id.clone(), value);
        self.order.push(id.clone());
        log::debug!("Minted handle {} ({} open)", id, self.order.len());
        id
    }

    pub fn get(&self, id: &str) -> Result<&T> {
        self.entries
            .get(id)
            .ok_or_else(|| Error::PresentationNotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut T> {
        self.entries
            .get_mut(id)
            .ok_or_else(|| Error::PresentationNotFound(id.to_string()))
    }

    pub fn remove(&mut self, id: &str) -> Result<T> {
        let value = self
            .entries
            .remove(id)
            .ok_or_else(|| Error::PresentationNotFound(id.to_string()))?;
        self.order.retain(|known| known != id);
        log::debug!("Released handle {}", id);
        Ok(value)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Handle of the first entry matching `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&str> {
        self.iter()
            .find(|(_, value)| predicate(value))
            .map(|(id, _)| id)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|value| (id.as_str(), value)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
