use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::models::Event;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    /// When `data` was written. `None` until the first write.
    pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Some(Utc::now()),
        }
    }

    pub fn age_minutes(&self) -> Option<i64> {
        self.cached_at.map(|at| (Utc::now() - at).num_minutes())
    }

    pub fn age_display(&self) -> String {
        let Some(minutes) = self.age_minutes() else {
            return "never".to_string();
        };
        if minutes < 1 {
            // Negative ages come from clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

impl<T: Default> Default for CachedData<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            cached_at: None,
        }
    }
}

pub type EventSnapshot = Arc<CachedData<Vec<Event>>>;

/// Observable list of events. Clones share the same underlying list.
#[derive(Clone)]
pub struct EventStore {
    tx: Arc<watch::Sender<EventSnapshot>>,
}

impl EventStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(CachedData::default()));
        Self { tx: Arc::new(tx) }
    }

    /// Current list together with the time it was written.
    pub fn snapshot(&self) -> EventSnapshot {
        self.tx.borrow().clone()
    }

    /// Owned copy of the current list.
    pub fn events(&self) -> Vec<Event> {
        self.tx.borrow().data.clone()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receiver notified on every replacement, including resets to empty.
    pub fn subscribe(&self) -> watch::Receiver<EventSnapshot> {
        self.tx.subscribe()
    }

    pub(crate) fn replace(&self, events: Vec<Event>) {
        debug!(count = events.len(), "Replacing cached events");
        self.tx.send_replace(Arc::new(CachedData::new(events)));
    }

    pub(crate) fn clear(&self) {
        debug!("Clearing cached events");
        self.tx.send_replace(Arc::new(CachedData::new(Vec::new())));
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn named(name: &str) -> Event {
        serde_json::from_value(json!({ "name": name })).unwrap()
    }

    #[test]
    fn test_cached_data_age_display() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Some(Utc::now() - Duration::minutes(95));
        assert_eq!(old.age_display(), "2h ago");

        let never: CachedData<Vec<i32>> = CachedData::default();
        assert_eq!(never.age_display(), "never");
    }

    #[test]
    fn test_store_starts_empty_and_unwritten() {
        let store = EventStore::new();
        assert!(store.is_empty());
        assert!(store.snapshot().cached_at.is_none());
    }

    #[test]
    fn test_replace_is_shared_between_clones() {
        let store = EventStore::new();
        let other = store.clone();
        store.replace(vec![named("A"), named("B")]);

        let names: Vec<_> = other.events().iter().map(|e| e.display_name().to_string()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(other.snapshot().cached_at.is_some());
    }

    #[test]
    fn test_subscribers_see_clear() {
        let store = EventStore::new();
        store.replace(vec![named("A")]);

        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.clear();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().data.is_empty());
        assert!(store.snapshot().cached_at.is_some());
    }
}
