use std::collections::BTreeMap;

use crate::runner::ds::value::JsValue;

/// The host's real listener registry. A listener is held at most once per event.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: BTreeMap<String, Vec<JsValue>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        ListenerRegistry {
            listeners: BTreeMap::new(),
        }
    }

    /// Returns false when `listener` was already registered for `event`.
    pub fn add(&mut self, event: &str, listener: JsValue) -> bool {
        let entries = self.listeners.entry(event.to_string()).or_insert_with(Vec::new);
        if entries.contains(&listener) {
            false
        } else {
            entries.push(listener);
            true
        }
    }

    pub fn remove(&mut self, event: &str, listener: &JsValue) -> bool {
        let removed = match self.listeners.get_mut(event) {
            Some(entries) => match entries.iter().position(|l| l == listener) {
                Some(i) => {
                    entries.remove(i);
                    true
                }
                None => false,
            },
            None => false,
        };
        if self.listeners.get(event).map_or(false, |e| e.is_empty()) {
            self.listeners.remove(event);
        }
        removed
    }

    pub fn contains(&self, event: &str, listener: &JsValue) -> bool {
        self.listeners
            .get(event)
            .map_or(false, |entries| entries.contains(listener))
    }

    /// Copy of the listeners for `event`, in registration order.
    pub fn snapshot(&self, event: &str) -> Vec<JsValue> {
        self.listeners.get(event).cloned().unwrap_or_default()
    }

    pub fn count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, |e| e.len())
    }

    pub fn total(&self) -> usize {
        self.listeners.values().map(|e| e.len()).sum()
    }
}
