//! LRU List Module
//!
//! Keyed table of cache entries threaded onto a recency list.

use std::collections::HashMap;
use std::hash::Hash;

use generational_arena::{Arena, Index};

use crate::cache::CacheEntry;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    entry: CacheEntry<V>,
    prev: Option<Index>,
    next: Option<Index>,
}

// == LRU List ==
/// Entries keyed by `K`, ordered by access recency.
///
/// Nodes live in an arena and link to each other by index:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// The lookup map and the list always hold the same keys.
#[derive(Debug)]
pub struct LruList<K, V> {
    nodes: Arena<Node<K, V>>,
    lookup: HashMap<K, Index>,
    head: Option<Index>,
    tail: Option<Index>,
}

impl<K, V> Default for LruList<K, V> {
    fn default() -> Self {
        Self {
            nodes: Arena::new(),
            lookup: HashMap::new(),
            head: None,
            tail: None,
        }
    }
}

impl<K: Eq + Hash + Clone, V> LruList<K, V> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self::default()
    }

    fn unlink(&mut self, index: Index) {
        let (prev, next) = {
            let node = &self.nodes[index];
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }
    }

    fn link_front(&mut self, index: Index) {
        let old_head = self.head;
        {
            let node = &mut self.nodes[index];
            node.prev = None;
            node.next = old_head;
        }
        if let Some(old_head) = old_head {
            self.nodes[old_head].prev = Some(index);
        }
        self.head = Some(index);
        if self.tail.is_none() {
            self.tail = Some(index);
        }
    }

    // == Peek ==
    /// Returns the entry for `key` without changing its position.
    pub fn peek(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.lookup.get(key).map(|&index| &self.nodes[index].entry)
    }

    // == Touch ==
    /// Moves `key` to the front and returns its entry.
    pub fn touch(&mut self, key: &K) -> Option<&CacheEntry<V>> {
        let index = *self.lookup.get(key)?;
        if self.head != Some(index) {
            self.unlink(index);
            self.link_front(index);
        }
        Some(&self.nodes[index].entry)
    }

    // == Insert ==
    /// Inserts or replaces the entry for `key` at the front.
    ///
    /// Returns the replaced entry, if any.
    pub fn insert(&mut self, key: K, entry: CacheEntry<V>) -> Option<CacheEntry<V>> {
        if let Some(&index) = self.lookup.get(&key) {
            let previous = std::mem::replace(&mut self.nodes[index].entry, entry);
            if self.head != Some(index) {
                self.unlink(index);
                self.link_front(index);
            }
            return Some(previous);
        }

        let index = self.nodes.insert(Node {
            key: key.clone(),
            entry,
            prev: None,
            next: None,
        });
        self.lookup.insert(key, index);
        self.link_front(index);
        None
    }

    // == Remove ==
    /// Removes `key` from both the table and the list.
    pub fn remove(&mut self, key: &K) -> Option<CacheEntry<V>> {
        let index = self.lookup.remove(key)?;
        self.unlink(index);
        self.nodes.remove(index).map(|node| node.entry)
    }

    // == Pop Oldest ==
    /// Removes and returns the least recently used entry.
    pub fn pop_oldest(&mut self) -> Option<(K, CacheEntry<V>)> {
        let index = self.tail?;
        self.unlink(index);
        let node = self.nodes.remove(index)?;
        self.lookup.remove(&node.key);
        Some((node.key, node.entry))
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.tail.map(|index| &self.nodes[index].key)
    }

    /// Iterates from least to most recently used.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = (&K, &CacheEntry<V>)> + '_ {
        let mut cursor = self.tail;
        std::iter::from_fn(move || {
            let index = cursor?;
            let node = &self.nodes[index];
            cursor = node.prev;
            Some((&node.key, &node.entry))
        })
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.lookup.clear();
        self.head = None;
        self.tail = None;
    }

    // == Length ==
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lookup.contains_key(key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn cached(n: u32) -> CacheEntry<u32> {
        CacheEntry::cached(Arc::new(n), u64::from(n))
    }

    fn order(lru: &LruList<&'static str, u32>) -> Vec<&'static str> {
        lru.iter_oldest_first().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_lru_new() {
        let lru: LruList<&str, u32> = LruList::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert!(lru.peek_oldest().is_none());
    }

    #[test]
    fn test_lru_insert_new_keys() {
        let mut lru = LruList::new();

        lru.insert("key1", cached(1));
        lru.insert("key2", cached(2));
        lru.insert("key3", cached(3));

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some(&"key1"));
        assert_eq!(order(&lru), vec!["key1", "key2", "key3"]);
    }

    #[test]
    fn test_lru_touch_moves_to_front() {
        let mut lru = LruList::new();

        lru.insert("a", cached(1));
        lru.insert("b", cached(2));
        lru.insert("c", cached(3));

        let entry = lru.touch(&"a").unwrap();
        assert_eq!(entry.size(), 1);

        assert_eq!(lru.peek_oldest(), Some(&"b"));
        assert_eq!(order(&lru), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_lru_touch_missing_key() {
        let mut lru = LruList::new();
        lru.insert("a", cached(1));

        assert!(lru.touch(&"missing").is_none());
        assert_eq!(order(&lru), vec!["a"]);
    }

    #[test]
    fn test_lru_peek_does_not_reorder() {
        let mut lru = LruList::new();
        lru.insert("a", cached(1));
        lru.insert("b", cached(2));

        assert!(lru.peek(&"a").is_some());
        assert_eq!(lru.peek_oldest(), Some(&"a"));
    }

    #[test]
    fn test_lru_replace_returns_previous() {
        let mut lru = LruList::new();
        lru.insert("a", cached(1));
        lru.insert("b", cached(2));

        let previous = lru.insert("a", CacheEntry::Deleted).unwrap();
        assert_eq!(previous.size(), 1);
        assert!(lru.peek(&"a").unwrap().is_deleted());
        assert_eq!(lru.len(), 2);
        assert_eq!(order(&lru), vec!["b", "a"]);
    }

    #[test]
    fn test_lru_pop_oldest() {
        let mut lru = LruList::new();

        lru.insert("key1", cached(1));
        lru.insert("key2", cached(2));
        lru.insert("key3", cached(3));

        let (key, entry) = lru.pop_oldest().unwrap();
        assert_eq!(key, "key1");
        assert_eq!(entry.size(), 1);
        assert!(!lru.contains(&"key1"));

        let (key, _) = lru.pop_oldest().unwrap();
        assert_eq!(key, "key2");
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_lru_pop_empty() {
        let mut lru: LruList<&str, u32> = LruList::new();
        assert!(lru.pop_oldest().is_none());
    }

    #[test]
    fn test_lru_remove_middle() {
        let mut lru = LruList::new();

        lru.insert("key1", cached(1));
        lru.insert("key2", cached(2));
        lru.insert("key3", cached(3));

        assert!(lru.remove(&"key2").is_some());
        assert!(lru.remove(&"key2").is_none());

        assert_eq!(lru.len(), 2);
        assert_eq!(order(&lru), vec!["key1", "key3"]);
    }

    #[test]
    fn test_lru_remove_only_entry_resets_ends() {
        let mut lru = LruList::new();
        lru.insert("solo", cached(1));
        lru.remove(&"solo");

        assert!(lru.is_empty());
        assert!(lru.peek_oldest().is_none());

        lru.insert("next", cached(2));
        assert_eq!(order(&lru), vec!["next"]);
    }

    #[test]
    fn test_lru_order_after_multiple_touches() {
        let mut lru = LruList::new();

        lru.insert("a", cached(1));
        lru.insert("b", cached(2));
        lru.insert("c", cached(3));

        lru.touch(&"a");
        lru.touch(&"c");
        lru.touch(&"b");

        // front=[b, c, a]=back
        assert_eq!(lru.pop_oldest().map(|(k, _)| k), Some("a"));
        assert_eq!(lru.pop_oldest().map(|(k, _)| k), Some("c"));
        assert_eq!(lru.pop_oldest().map(|(k, _)| k), Some("b"));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = LruList::new();
        lru.insert("a", cached(1));
        lru.insert("b", cached(2));

        lru.clear();

        assert!(lru.is_empty());
        assert!(lru.peek_oldest().is_none());
        assert_eq!(order(&lru), Vec::<&str>::new());
    }
}
