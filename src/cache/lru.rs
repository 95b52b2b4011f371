//! Eviction List Module
//!
//! Fixed-capacity circular doubly linked list tracking recency order.
//!
//! Nodes live in a generational arena and are addressed by [`NodeRef`]
//! handles. Removing a node frees its slot, so a handle kept by a cache entry
//! after its node was evicted can never be relinked.

use generational_arena::{Arena, Index};

use crate::error::{CacheError, Result};

// == Node Handle ==
/// Non-owning handle to a node of an [`EvictionList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(Index);

#[derive(Debug)]
struct Node {
    key: String,
    prev: Option<Index>,
    next: Option<Index>,
}

// == Eviction List ==
/// Tracks access order for LRU eviction.
///
/// - `head` = most recently used
/// - `head.prev` = tail = least recently used
#[derive(Debug)]
pub struct EvictionList {
    nodes: Arena<Node>,
    head: Option<Index>,
    capacity: usize,
}

impl EvictionList {
    // == Constructor ==
    /// Creates an empty list holding at most `capacity` nodes.
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            head: None,
            capacity,
        }
    }

    // == Insert Head ==
    /// Inserts `key` as the most recently used node.
    ///
    /// Fails with `CapacityExceeded` when the list is full; callers make room
    /// with [`remove_tail`](Self::remove_tail) first.
    pub fn insert_head(&mut self, key: String) -> Result<NodeRef> {
        if self.is_full() {
            return Err(CacheError::CapacityExceeded(self.capacity));
        }
        let index = self.nodes.insert(Node {
            key,
            prev: None,
            next: None,
        });
        self.link_at_head(index);
        Ok(NodeRef(index))
    }

    // == Move To Head ==
    /// Marks a node as most recently used.
    ///
    /// Returns false if the handle is stale (its node was already removed).
    pub fn move_to_head(&mut self, node: NodeRef) -> bool {
        let index = node.0;
        if !self.nodes.contains(index) {
            return false;
        }
        if self.head != Some(index) {
            self.unlink(index);
            self.link_at_head(index);
        }
        true
    }

    // == Remove Tail ==
    /// Removes the least recently used node and returns its key.
    ///
    /// With one node or fewer this is equivalent to [`clear`](Self::clear).
    pub fn remove_tail(&mut self) -> Option<String> {
        let head = self.head?;
        if self.len() <= 1 {
            let key = self.nodes.get(head).map(|node| node.key.clone());
            self.clear();
            return key;
        }
        let tail = self.nodes[head].prev?;
        self.remove_node(NodeRef(tail))
    }

    // == Remove Node ==
    /// Unlinks and frees an arbitrary node, returning its key.
    ///
    /// Stale handles are ignored.
    pub fn remove_node(&mut self, node: NodeRef) -> Option<String> {
        if !self.nodes.contains(node.0) {
            return None;
        }
        self.unlink(node.0);
        self.nodes.remove(node.0).map(|node| node.key)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
    }

    /// Returns the key a handle points at, if the node is still alive.
    pub fn key(&self, node: NodeRef) -> Option<&str> {
        self.nodes.get(node.0).map(|node| node.key.as_str())
    }

    /// Keys ordered from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        for _ in 0..self.len() {
            let Some(index) = cursor else { break };
            let node = &self.nodes[index];
            keys.push(node.key.clone());
            cursor = node.next;
        }
        keys
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Approximate heap footprint of the live nodes in bytes.
    pub fn memory_usage(&self) -> usize {
        self.nodes
            .iter()
            .map(|(_, node)| std::mem::size_of::<Node>() + node.key.len())
            .sum()
    }

    // Assumes `index` is allocated and currently unlinked.
    fn link_at_head(&mut self, index: Index) {
        match self.head {
            None => {
                let node = &mut self.nodes[index];
                node.prev = Some(index);
                node.next = Some(index);
            }
            Some(head) => {
                let tail = self.nodes[head].prev.unwrap_or(head);
                self.nodes[tail].next = Some(index);
                self.nodes[head].prev = Some(index);
                let node = &mut self.nodes[index];
                node.prev = Some(tail);
                node.next = Some(head);
            }
        }
        self.head = Some(index);
    }

    // Repairs the neighbours and clears the node's own links.
    fn unlink(&mut self, index: Index) {
        let (prev, next) = {
            let node = &self.nodes[index];
            (node.prev, node.next)
        };
        let (Some(prev), Some(next)) = (prev, next) else {
            return;
        };

        if next == index {
            self.head = None;
        } else {
            self.nodes[prev].next = Some(next);
            self.nodes[next].prev = Some(prev);
            if self.head == Some(index) {
                self.head = Some(next);
            }
        }

        let node = &mut self.nodes[index];
        node.prev = None;
        node.next = None;
    }

    /// Walks the ring in both directions and checks it closes on `head`
    /// after exactly `len()` steps.
    pub fn is_consistent(&self) -> bool {
        let Some(head) = self.head else {
            return self.nodes.is_empty();
        };
        let walk = |forward: bool| {
            let mut cursor = head;
            for _ in 0..self.len() {
                let node = &self.nodes[cursor];
                let step = if forward { node.next } else { node.prev };
                match step {
                    Some(index) => cursor = index,
                    None => return false,
                }
            }
            cursor == head
        };
        self.len() <= self.capacity && walk(true) && walk(false)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, keys: &[&str]) -> (EvictionList, Vec<NodeRef>) {
        let mut list = EvictionList::new(capacity);
        let refs = keys
            .iter()
            .map(|k| list.insert_head(k.to_string()).unwrap())
            .collect();
        (list, refs)
    }

    #[test]
    fn test_list_new() {
        let list = EvictionList::new(4);
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.capacity(), 4);
        assert!(list.is_consistent());
    }

    #[test]
    fn test_insert_head_orders_most_recent_first() {
        let (list, _) = filled(4, &["a", "b", "c"]);

        assert_eq!(list.keys(), vec!["c", "b", "a"]);
        assert!(list.is_consistent());
    }

    #[test]
    fn test_insert_head_when_full() {
        let (mut list, _) = filled(2, &["a", "b"]);

        let result = list.insert_head("c".to_string());
        assert!(matches!(result, Err(CacheError::CapacityExceeded(2))));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_move_to_head() {
        let (mut list, refs) = filled(4, &["a", "b", "c"]);

        assert!(list.move_to_head(refs[0]));
        assert_eq!(list.keys(), vec!["a", "c", "b"]);

        // Already at head
        assert!(list.move_to_head(refs[0]));
        assert_eq!(list.keys(), vec!["a", "c", "b"]);
        assert!(list.is_consistent());
    }

    #[test]
    fn test_remove_tail_evicts_lru() {
        let (mut list, refs) = filled(4, &["a", "b", "c"]);
        list.move_to_head(refs[0]);

        assert_eq!(list.remove_tail(), Some("b".to_string()));
        assert_eq!(list.remove_tail(), Some("c".to_string()));
        assert_eq!(list.remove_tail(), Some("a".to_string()));
        assert!(list.is_empty());
        assert!(list.is_consistent());
    }

    #[test]
    fn test_remove_tail_empty_is_noop() {
        let mut list = EvictionList::new(2);
        assert_eq!(list.remove_tail(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_remove_node_middle_and_head() {
        let (mut list, refs) = filled(4, &["a", "b", "c", "d"]);

        assert_eq!(list.remove_node(refs[1]), Some("b".to_string()));
        assert_eq!(list.keys(), vec!["d", "c", "a"]);

        assert_eq!(list.remove_node(refs[3]), Some("d".to_string()));
        assert_eq!(list.keys(), vec!["c", "a"]);
        assert!(list.is_consistent());
    }

    #[test]
    fn test_stale_handle_is_ignored() {
        let (mut list, refs) = filled(2, &["a", "b"]);
        list.remove_node(refs[0]);

        // Reuse the freed slot; the old handle must not alias the new node
        let fresh = list.insert_head("c".to_string()).unwrap();
        assert_ne!(fresh, refs[0]);
        assert_eq!(list.remove_node(refs[0]), None);
        assert!(!list.move_to_head(refs[0]));
        assert_eq!(list.key(refs[0]), None);
        assert_eq!(list.keys(), vec!["c", "b"]);
    }

    #[test]
    fn test_single_node_ring() {
        let (mut list, refs) = filled(1, &["only"]);
        assert!(list.is_consistent());

        assert!(list.move_to_head(refs[0]));
        assert_eq!(list.remove_node(refs[0]), Some("only".to_string()));
        assert!(list.is_empty());
        assert!(list.is_consistent());
    }

    #[test]
    fn test_clear() {
        let (mut list, refs) = filled(3, &["a", "b", "c"]);
        list.clear();

        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.key(refs[2]), None);
        assert!(list.insert_head("d".to_string()).is_ok());
    }

    #[test]
    fn test_window_of_two_keeps_latest() {
        let mut list = EvictionList::new(2);
        for key in ["k1", "k2", "k3"] {
            if list.is_full() {
                list.remove_tail();
            }
            list.insert_head(key.to_string()).unwrap();
        }
        assert_eq!(list.keys(), vec!["k3", "k2"]);
    }
}
