// src/mux/slots.rs
// =============================================================================
// Pre-allocated result storage for one batch.
//
// - slot `i` belongs to the worker fetching URL `i`
// - each slot is written at most once
// - the bodies come back out in slot order, not completion order
//
// Rust concepts:
// - OnceLock: a cell that can be set once through a shared reference,
//   so workers never need `&mut` access to the vector
// =============================================================================

use std::sync::{Arc, OnceLock};

#[derive(Debug)]
pub struct ResultSlots {
    slots: Vec<OnceLock<String>>,
}

impl ResultSlots {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceLock::new()).collect(),
        }
    }

    /// Stores the body for slot `index`. Returns `false` if the slot is out
    /// of range or already filled.
    pub fn fill(&self, index: usize, body: String) -> bool {
        self.slots
            .get(index)
            .map(|slot| slot.set(body).is_ok())
            .unwrap_or(false)
    }

    #[cfg(test)]
    pub fn is_filled(&self, index: usize) -> bool {
        self.slots.get(index).and_then(OnceLock::get).is_some()
    }

    /// Takes the bodies out in slot order. `Err(i)` names the first empty
    /// slot.
    ///
    /// Moves the strings out when this is the last handle, copies them
    /// otherwise.
    pub fn into_bodies(slots: Arc<Self>) -> Result<Vec<String>, usize> {
        match Arc::try_unwrap(slots) {
            Ok(owned) => owned
                .slots
                .into_iter()
                .enumerate()
                .map(|(i, slot)| slot.into_inner().ok_or(i))
                .collect(),
            Err(shared) => shared
                .slots
                .iter()
                .enumerate()
                .map(|(i, slot)| slot.get().cloned().ok_or(i))
                .collect(),
        }
    }
}
