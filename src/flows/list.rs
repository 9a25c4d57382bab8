use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::InFlight;
use crate::models::{Class, Subject};

/// Items addressed by a backend id
pub trait Keyed {
    fn key(&self) -> i64;
}

impl Keyed for Class {
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for Subject {
    fn key(&self) -> i64 {
        self.id
    }
}

/// Overlapping fetches of one list. Every fetch takes a ticket and only the
/// newest ticket may write its result.
#[derive(Debug, Default)]
pub(crate) struct Loads {
    latest: AtomicU64,
    active: AtomicUsize,
}

impl Loads {
    pub fn begin(&self) -> LoadTicket<'_> {
        self.active.fetch_add(1, Ordering::AcqRel);
        let id = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        LoadTicket { loads: self, id }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire) > 0
    }
}

#[must_use = "the load counts as running until the ticket drops"]
#[derive(Debug)]
pub(crate) struct LoadTicket<'a> {
    loads: &'a Loads,
    id: u64,
}

impl LoadTicket<'_> {
    /// No fetch of this list started after this one
    pub fn is_current(&self) -> bool {
        self.loads.latest.load(Ordering::Acquire) == self.id
    }
}

impl Drop for LoadTicket<'_> {
    fn drop(&mut self) {
        self.loads.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Local copy of a server-owned list, with the flags a CRUD view needs.
#[derive(Debug)]
pub(crate) struct ListState<T> {
    items: Mutex<Vec<T>>,
    pending_delete: Mutex<Option<i64>>,
    pub loads: Loads,
    pub submitting: InFlight,
}

impl<T: Keyed + Clone> ListState<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            pending_delete: Mutex::new(None),
            loads: Loads::default(),
            submitting: InFlight::new(),
        }
    }

    pub fn items(&self) -> Vec<T> {
        self.items.lock().clone()
    }

    /// Replace unless a newer fetch has started since `ticket` was taken
    pub fn replace_if_current(&self, ticket: &LoadTicket<'_>, items: Vec<T>) -> bool {
        let mut current = self.items.lock();
        if !ticket.is_current() {
            return false;
        }
        *current = items;
        true
    }

    /// Drop the item with `id`; false if it was not there
    pub fn remove(&self, id: i64) -> bool {
        let mut items = self.items.lock();
        let before = items.len();
        items.retain(|item| item.key() != id);
        items.len() != before
    }

    pub fn request_delete(&self, id: i64) {
        *self.pending_delete.lock() = Some(id);
    }

    pub fn cancel_delete(&self) {
        *self.pending_delete.lock() = None;
    }

    pub fn pending_delete(&self) -> Option<i64> {
        *self.pending_delete.lock()
    }

    pub fn take_pending(&self) -> Option<i64> {
        self.pending_delete.lock().take()
    }
}
