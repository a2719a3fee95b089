//! Arena-backed doubly linked list with stable node handles.
//!
//! Nodes live in a `Vec` slot arena and link to each other by index, so a
//! [`NodeId`] stays valid until that node is removed. Freed slots are reused
//! by later pushes.

/// Handle to a node in a [`DoubleLinkedList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
pub struct DoubleLinkedList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for DoubleLinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DoubleLinkedList<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push_front(&mut self, value: T) -> NodeId {
        let index = self.allocate(value);
        self.link_front(index);
        NodeId(index)
    }

    pub fn push_back(&mut self, value: T) -> NodeId {
        let index = self.allocate(value);
        match self.tail {
            Some(tail) => {
                self.node_mut(tail).next = Some(index);
                self.node_mut(index).prev = Some(tail);
            }
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
        NodeId(index)
    }

    /// Unlinks and returns the node's value.
    ///
    /// # Panics
    /// If `id` refers to a node that was already removed.
    pub fn remove(&mut self, id: NodeId) -> T {
        self.unlink(id.0);
        let node = self.slots[id.0]
            .take()
            .unwrap_or_else(|| panic!("linked list node {} was already removed", id.0));
        self.free.push(id.0);
        node.value
    }

    /// # Panics
    /// If `id` refers to a node that was already removed.
    pub fn move_to_front(&mut self, id: NodeId) {
        self.node(id.0);
        if self.head == Some(id.0) {
            return;
        }
        self.unlink(id.0);
        self.link_front(id.0);
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.tail?;
        Some(self.remove(NodeId(tail)))
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        Some(self.remove(NodeId(head)))
    }

    pub fn front(&self) -> Option<&T> {
        self.head.map(|i| &self.node(i).value)
    }

    pub fn back(&self) -> Option<&T> {
        self.tail.map(|i| &self.node(i).value)
    }

    pub fn back_id(&self) -> Option<NodeId> {
        self.tail.map(NodeId)
    }

    /// # Panics
    /// If `id` refers to a node that was already removed.
    pub fn get(&self, id: NodeId) -> &T {
        &self.node(id.0).value
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Front to back
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: self.head,
        }
    }

    fn allocate(&mut self, value: T) -> usize {
        let node = Node {
            value,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                index
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn link_front(&mut self, index: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(index);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(head) => self.node_mut(head).prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
        self.len += 1;
    }

    fn unlink(&mut self, index: usize) {
        let (prev, next) = {
            let node = self.node(index);
            (node.prev, node.next)
        };
        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
    }

    fn node(&self, index: usize) -> &Node<T> {
        self.slots
            .get(index)
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("linked list node {index} was already removed"))
    }

    fn node_mut(&mut self, index: usize) -> &mut Node<T> {
        self.slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("linked list node {index} was already removed"))
    }
}

pub struct Iter<'a, T> {
    list: &'a DoubleLinkedList<T>,
    next: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.list.node(self.next?);
        self.next = node.next;
        Some(&node.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &DoubleLinkedList<i32>) -> Vec<i32> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_push_and_pop() {
        let mut list = DoubleLinkedList::new();
        list.push_back(2);
        list.push_front(1);
        list.push_back(3);
        assert_eq!(collect(&list), vec![1, 2, 3]);
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&3));

        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_back(), Some(2));
        assert!(list.is_empty());
        assert_eq!(list.pop_back(), None);
    }

    #[test]
    fn test_move_to_front_and_remove_middle() {
        let mut list = DoubleLinkedList::new();
        let a = list.push_back(1);
        let b = list.push_back(2);
        let c = list.push_back(3);

        list.move_to_front(c);
        assert_eq!(collect(&list), vec![3, 1, 2]);
        list.move_to_front(c);
        assert_eq!(collect(&list), vec![3, 1, 2]);

        assert_eq!(list.remove(a), 1);
        assert_eq!(collect(&list), vec![3, 2]);
        assert_eq!(list.back_id(), Some(b));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut list = DoubleLinkedList::new();
        let a = list.push_back(1);
        list.remove(a);
        let b = list.push_front(2);
        assert_eq!(a, b);
        assert_eq!(*list.get(b), 2);
    }

    #[test]
    #[should_panic(expected = "already removed")]
    fn test_remove_twice_panics() {
        let mut list = DoubleLinkedList::new();
        let a = list.push_back(1);
        list.push_back(2);
        list.remove(a);
        list.remove(a);
    }
}
