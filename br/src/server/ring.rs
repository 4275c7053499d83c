//! Ordered ring of live screens
//!
//! Position is insertion order. Neighbors wrap around, so in a ring of one
//! the screen is its own predecessor and successor.

use super::error::ServerError;
use crate::domain::{Screen, ScreenId};

#[derive(Debug, Clone, Default)]
pub struct Ring {
    screens: Vec<Screen>,
}

impl Ring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Append a screen at the end of the ring
    pub fn insert(&mut self, screen: Screen) -> Result<(), ServerError> {
        if self.contains(screen.id()) {
            return Err(ServerError::DuplicateScreen(screen.id()));
        }
        self.screens.push(screen);
        Ok(())
    }

    pub fn remove(&mut self, id: ScreenId) -> Option<Screen> {
        let index = self.position(id)?;
        Some(self.screens.remove(index))
    }

    pub fn contains(&self, id: ScreenId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: ScreenId) -> Option<&Screen> {
        self.screens.iter().find(|s| s.id() == id)
    }

    pub fn at(&self, index: usize) -> Option<&Screen> {
        self.screens.get(index)
    }

    pub fn position(&self, id: ScreenId) -> Option<usize> {
        self.screens.iter().position(|s| s.id() == id)
    }

    /// Screen after `id`, wrapping to the front; `None` if `id` is not in the ring
    pub fn successor(&self, id: ScreenId) -> Option<&Screen> {
        let index = self.position(id)?;
        self.screens.get((index + 1) % self.screens.len())
    }

    /// Screen before `id`, wrapping to the back; `None` if `id` is not in the ring
    pub fn predecessor(&self, id: ScreenId) -> Option<&Screen> {
        let index = self.position(id)?;
        let len = self.screens.len();
        self.screens.get((index + len - 1) % len)
    }

    pub fn ids(&self) -> Vec<ScreenId> {
        self.screens.iter().map(Screen::id).collect()
    }
}
