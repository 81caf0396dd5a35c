// src/advisory/tracker.rs

use crate::library::Track;

/// Identity of a (current, next) selection.
pub fn pair_key(current: &Track, next: &Track) -> String {
    format!("{}->{}", current.id, next.id)
}

/// Ticket handed to an in-flight request. Only the newest ticket for the
/// current selection is honoured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    generation: u64,
    key: String,
}

impl RequestTag {
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    generation: u64,
    selection: Option<String>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request for `key`. Makes `key` the current selection and
    /// retires every earlier tag.
    pub fn begin(&mut self, key: impl Into<String>) -> RequestTag {
        self.generation += 1;
        let key = key.into();
        self.selection = Some(key.clone());
        RequestTag { generation: self.generation, key }
    }

    /// The selection changed without a new request (or was cleared).
    pub fn select(&mut self, key: Option<String>) {
        if self.selection != key {
            self.generation += 1;
            self.selection = key;
        }
    }

    pub fn accept(&self, tag: &RequestTag) -> bool {
        tag.generation == self.generation && self.selection.as_deref() == Some(tag.key.as_str())
    }
}

/// One UI slot holding the latest accepted advisory value.
#[derive(Debug)]
pub struct AdvisorySlot<T> {
    tracker: RequestTracker,
    value: Option<T>,
}

impl<T> Default for AdvisorySlot<T> {
    fn default() -> Self {
        Self { tracker: RequestTracker::new(), value: None }
    }
}

impl<T> AdvisorySlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, key: impl Into<String>) -> RequestTag {
        let tag = self.tracker.begin(key);
        self.value = None;
        tag
    }

    pub fn select(&mut self, key: Option<String>) {
        if self.tracker.selection != key {
            self.tracker.select(key);
            self.value = None;
        }
    }

    /// Store `value` if `tag` is still current. Returns whether it was kept.
    pub fn offer(&mut self, tag: &RequestTag, value: T) -> bool {
        if self.tracker.accept(tag) {
            self.value = Some(value);
            true
        } else {
            log::debug!("Discarding stale advisory response for {}", tag.key);
            false
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }
}
