use std::{collections::HashMap, fmt::Debug, hash::Hash};

pub trait Keyed {
    type Key: Eq + Hash + Clone + Debug + Send + Sync + 'static;

    fn key(&self) -> Self::Key;
}

/// Ordered, id-keyed collection state.
///
/// Items keep the position of their first arrival; a second `upsert` with the same key
/// merges in place. With a `limit`, the oldest entries are evicted once it is exceeded.
#[derive(Debug, Clone)]
pub struct EventLog<T: Keyed> {
    order: Vec<T::Key>,
    items: HashMap<T::Key, T>,
    limit: Option<usize>,
}

impl<T: Keyed> Default for EventLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed> EventLog<T> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            items: HashMap::new(),
            limit: None,
        }
    }

    pub fn bounded(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new()
        }
    }

    /// Returns `true` when the item was appended rather than merged.
    pub fn upsert(&mut self, item: T) -> bool {
        let key = item.key();
        if let Some(existing) = self.items.get_mut(&key) {
            *existing = item;
            return false;
        }

        self.order.push(key.clone());
        self.items.insert(key, item);
        self.evict_overflow();
        true
    }

    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        let removed = self.items.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    pub fn replace_all(&mut self, items: impl IntoIterator<Item = T>) {
        self.order.clear();
        self.items.clear();
        for item in items {
            self.upsert(item);
        }
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.items.get(key)
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.items.contains_key(key)
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|key| self.items.get(key))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn evict_overflow(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        while self.order.len() > limit {
            let oldest = self.order.remove(0);
            self.items.remove(&oldest);
        }
    }
}

impl<T: Keyed + Clone> EventLog<T> {
    pub fn snapshot(&self) -> Vec<T> {
        self.items().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        body: &'static str,
    }

    impl Keyed for Row {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }
    }

    fn row(id: u32, body: &'static str) -> Row {
        Row { id, body }
    }

    fn bodies(log: &EventLog<Row>) -> Vec<&'static str> {
        log.items().map(|r| r.body).collect()
    }

    #[test]
    fn duplicate_notifications_merge_in_place() {
        let mut log = EventLog::new();
        assert!(log.upsert(row(1, "a")));
        assert!(log.upsert(row(2, "b")));
        assert!(!log.upsert(row(1, "a-edited")));

        assert_eq!(bodies(&log), vec!["a-edited", "b"]);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut log = EventLog::new();
        log.upsert(row(1, "a"));

        assert!(log.remove(&1).is_some());
        assert!(log.remove(&1).is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn replace_all_resets_order() {
        let mut log = EventLog::new();
        log.upsert(row(1, "a"));
        log.replace_all(vec![row(3, "c"), row(2, "b"), row(3, "c2")]);

        assert_eq!(bodies(&log), vec!["c2", "b"]);
    }

    #[test]
    fn bounded_log_evicts_the_oldest() {
        let mut log = EventLog::bounded(2);
        log.upsert(row(1, "a"));
        log.upsert(row(2, "b"));
        log.upsert(row(3, "c"));

        assert_eq!(bodies(&log), vec!["b", "c"]);
        assert!(!log.contains(&1));
    }
}
