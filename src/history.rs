//! Most-recently-viewed history for fetched items.
//!
//! A doubly linked list threaded through a `HashMap` keyed by item id:
//! each node carries the ids of its neighbours, so `record`, move-to-tail
//! and `remove` are all O(1). Order is access order, oldest at the head,
//! the freshest view at the tail. At most one entry exists per id; viewing
//! an item again replaces its snapshot and moves it to the tail.
//!
//! Two eviction policies share the type: `new()` is unbounded (entries
//! live until `remove`, which the manager calls on deletion), while
//! `with_capacity(n)` evicts the least-recently-viewed entry once `n`
//! distinct ids are present.

use std::collections::HashMap;

use crate::task::Item;

#[derive(Debug, Clone)]
struct Node {
    prev: Option<u32>,
    next: Option<u32>,
    item: Item,
}

#[derive(Debug, Clone, Default)]
pub struct ViewHistory {
    nodes: HashMap<u32, Node>,
    head: Option<u32>,
    tail: Option<u32>,
    capacity: Option<usize>,
}

impl ViewHistory {
    /// Unbounded history; entries persist until explicitly removed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounded LRU history holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Record a view of `item`, inserting it at the tail. Re-recording an
    /// existing id moves it without growing the history or evicting.
    pub fn record(&mut self, item: Item) {
        let id = item.id();
        if self.nodes.contains_key(&id) {
            self.unlink(id);
            if let Some(node) = self.nodes.get_mut(&id) {
                node.item = item;
            }
            self.link_tail(id);
            return;
        }

        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return;
            }
            while self.nodes.len() >= capacity {
                let Some(oldest) = self.head else { break };
                self.unlink(oldest);
                self.nodes.remove(&oldest);
            }
        }

        self.nodes.insert(
            id,
            Node {
                prev: None,
                next: None,
                item,
            },
        );
        self.link_tail(id);
    }

    /// Drop the entry for `id` if present; no-op otherwise.
    pub fn remove(&mut self, id: u32) {
        if self.nodes.contains_key(&id) {
            self.unlink(id);
            self.nodes.remove(&id);
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    /// Snapshot of the history, oldest first.
    pub fn list(&self) -> Vec<Item> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let Some(node) = self.nodes.get(&id) else { break };
            out.push(node.item.clone());
            cursor = node.next;
        }
        out
    }

    /// Ids in history order, oldest first.
    pub fn ids(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.head;
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.nodes.get(&id).and_then(|node| node.next);
        }
        out
    }

    // Detach `id` from the list without removing its node from the map.
    fn unlink(&mut self, id: u32) {
        let (prev, next) = match self.nodes.get(&id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_id) => {
                if let Some(prev_node) = self.nodes.get_mut(&prev_id) {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_id) => {
                if let Some(next_node) = self.nodes.get_mut(&next_id) {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(node) = self.nodes.get_mut(&id) {
            node.prev = None;
            node.next = None;
        }
    }

    // Attach a detached node at the tail.
    fn link_tail(&mut self, id: u32) {
        let old_tail = self.tail;
        if let Some(node) = self.nodes.get_mut(&id) {
            node.prev = old_tail;
            node.next = None;
        }
        if let Some(tail_id) = old_tail {
            if let Some(tail_node) = self.nodes.get_mut(&tail_id) {
                tail_node.next = Some(id);
            }
        }
        self.tail = Some(id);
        if self.head.is_none() {
            self.head = Some(id);
        }
    }
}
