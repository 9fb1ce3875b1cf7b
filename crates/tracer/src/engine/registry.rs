use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::pinger::Pinger;

/// Traced endpoints keyed by their id.
///
/// Written by `trace`/`untrace`, read by the scheduler when it launches a
/// batch. Readers only ever get a snapshot, the lock is never held while
/// probing.
#[derive(Default)]
pub(crate) struct Registry {
    conns: RwLock<HashMap<String, Arc<dyn Pinger>>>,
}

impl Registry {
    /// Insert `pinger`, returning the entry it replaced
    pub(crate) fn insert(&self, pinger: Arc<dyn Pinger>) -> Option<Arc<dyn Pinger>> {
        let id = pinger.id();
        self.conns.write().unwrap_or_else(PoisonError::into_inner).insert(id, pinger)
    }

    pub(crate) fn remove(&self, id: &str) -> Option<Arc<dyn Pinger>> {
        self.conns.write().unwrap_or_else(PoisonError::into_inner).remove(id)
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn Pinger>> {
        self.conns.read().unwrap_or_else(PoisonError::into_inner).values().cloned().collect()
    }

    /// Sorted ids of every traced endpoint
    pub(crate) fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> =
            self.conns.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect();
        ids.sort();
        ids
    }
}
