//! Slot arena holding the recency list.
//!
//! Entries live in a `Vec` of slots and are linked through slot indices, so a
//! [`Handle`] stays valid until its entry is removed. Freed slots are threaded
//! onto a free list and reused by later insertions.

/// Stable position of an entry in the recency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Handle(usize);

#[derive(Debug)]
struct Slot<K, V> {
    prev: Option<Handle>,
    // Doubles as the free-list link while the slot is vacant.
    next: Option<Handle>,
    entry: Option<(K, V)>,
}

impl<K, V> Slot<K, V> {
    fn entry(&self) -> &(K, V) {
        match &self.entry {
            Some(entry) => entry,
            None => unreachable!("Attempted to access a free slot"),
        }
    }

    fn entry_mut(&mut self) -> &mut (K, V) {
        match &mut self.entry {
            Some(entry) => entry,
            None => unreachable!("Attempted to access a free slot"),
        }
    }
}

/// Doubly-linked list ordered from most recently used (front) to least
/// recently used (back).
#[derive(Debug)]
pub(crate) struct RecencyList<K, V> {
    slots: Vec<Slot<K, V>>,
    head: Option<Handle>,
    tail: Option<Handle>,
    free_head: Option<Handle>,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_head: None,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub(crate) fn key(&self, handle: Handle) -> &K {
        &self.slots[handle.0].entry().0
    }

    pub(crate) fn value(&self, handle: Handle) -> &V {
        &self.slots[handle.0].entry().1
    }

    pub(crate) fn value_mut(&mut self, handle: Handle) -> &mut V {
        &mut self.slots[handle.0].entry_mut().1
    }

    /// Inserts a new entry as most recently used.
    pub(crate) fn push_front(&mut self, key: K, value: V) -> Handle {
        let handle = self.alloc(key, value);
        self.link_front(handle);
        self.len += 1;
        handle
    }

    /// Marks an existing entry as most recently used.
    pub(crate) fn move_to_front(&mut self, handle: Handle) {
        if self.head == Some(handle) {
            return;
        }
        self.unlink(handle);
        self.link_front(handle);
    }

    /// Removes the least recently used entry.
    pub(crate) fn pop_back(&mut self) -> Option<(K, V)> {
        let tail = self.tail?;
        Some(self.remove(tail))
    }

    /// Removes an entry and returns its slot to the free list.
    pub(crate) fn remove(&mut self, handle: Handle) -> (K, V) {
        self.unlink(handle);

        let slot = &mut self.slots[handle.0];
        let entry = slot.entry.take();
        slot.next = self.free_head;
        self.free_head = Some(handle);
        self.len -= 1;

        match entry {
            Some(entry) => entry,
            None => unreachable!("Attempted to remove a free slot"),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
        self.free_head = None;
        self.len = 0;
    }

    /// Iterates from most to least recently used.
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    #[cfg(test)]
    pub(crate) fn allocated_slots(&self) -> usize {
        self.slots.len()
    }

    fn alloc(&mut self, key: K, value: V) -> Handle {
        match self.free_head {
            Some(handle) => {
                let slot = &mut self.slots[handle.0];
                self.free_head = slot.next;
                slot.prev = None;
                slot.next = None;
                slot.entry = Some((key, value));
                handle
            }
            None => {
                self.slots.push(Slot {
                    prev: None,
                    next: None,
                    entry: Some((key, value)),
                });
                Handle(self.slots.len() - 1)
            }
        }
    }

    fn link_front(&mut self, handle: Handle) {
        let old_head = self.head;
        {
            let slot = &mut self.slots[handle.0];
            slot.prev = None;
            slot.next = old_head;
        }
        match old_head {
            Some(old) => self.slots[old.0].prev = Some(handle),
            None => self.tail = Some(handle),
        }
        self.head = Some(handle);
    }

    fn unlink(&mut self, handle: Handle) {
        let (prev, next) = {
            let slot = &self.slots[handle.0];
            (slot.prev, slot.next)
        };
        match prev {
            Some(p) => self.slots[p.0].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n.0].prev = prev,
            None => self.tail = prev,
        }
        let slot = &mut self.slots[handle.0];
        slot.prev = None;
        slot.next = None;
    }
}

pub(crate) struct Iter<'a, K, V> {
    list: &'a RecencyList<K, V>,
    cursor: Option<Handle>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Handle, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        let slot = &self.list.slots[handle.0];
        self.cursor = slot.next;
        let (key, value) = slot.entry();
        Some((handle, key, value))
    }
}
