use super::*;
use std::ops::{Index, IndexMut};

const PREV: usize = 0;
const NEXT: usize = 1;

#[derive(Debug, Clone)]
pub struct Node<T> {
    data: Option<T>,
    links: [Ptr; 2],
}

impl<T> Node<T> {
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }
}

/// # Description
/// An order-preserving doubly linked list that lives inside a single `Vec`
/// ## Comments
/// - nodes are addressed by `Ptr`, so an entry can be unlinked in O(1) while walking the list
/// - freed nodes are pooled and recycled by later pushes
#[derive(Debug, Clone)]
pub struct LinkedList<T> {
    memory: Vec<Node<T>>,
    front: Ptr,
    rear: Ptr,
    pool: Ptr,
    len: u32,
}

impl<T> LinkedList<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            memory: Vec::with_capacity(capacity),
            front: NULL,
            rear: NULL,
            pool: NULL,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn front(&self) -> Ptr {
        self.front
    }

    pub fn rear(&self) -> Ptr {
        self.rear
    }

    /// node following `node`, `NULL` at the end of the list
    pub fn next(&self, node: Ptr) -> Ptr {
        self[node].links[NEXT]
    }

    pub fn get(&self, node: Ptr) -> Option<&T> {
        self.memory.get(node.as_usize()).and_then(|n| n.data())
    }

    /// appends `data` and returns the node holding it
    pub fn push_rear(&mut self, data: T) -> Ptr {
        let new_node = self.allocate(data);
        let old_rear = self.rear;
        self[new_node].links = [old_rear, NULL];

        if old_rear.is_null() {
            self.front = new_node;
        } else {
            self[old_rear].links[NEXT] = new_node;
        }

        self.rear = new_node;
        self.len += 1;
        new_node
    }

    /// unlinks `node`, handing its data back
    /// ## Comments
    /// the node's successor is not touched, so `next()` should be read before removing
    pub fn remove_at(&mut self, node: Ptr) -> Option<T> {
        if self.is_empty() || node.is_null() {
            return None;
        }

        let [prev, next] = self[node].links;

        if prev.is_null() {
            self.front = next;
        } else {
            self[prev].links[NEXT] = next;
        }

        if next.is_null() {
            self.rear = prev;
        } else {
            self[next].links[PREV] = prev;
        }

        self.len -= 1;
        self.free(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        LinkedListIterator::new(self).filter_map(move |node| self[node].data())
    }

    fn allocate(&mut self, item: T) -> Ptr {
        if self.pool.is_null() {
            self.memory.push(Node {
                data: Some(item),
                links: [NULL; 2],
            });
            Ptr::from(self.memory.len() - 1)
        } else {
            let reused_node = self.pool;
            self.pool = self[reused_node].links[NEXT];
            self[reused_node] = Node {
                data: Some(item),
                links: [NULL; 2],
            };
            reused_node
        }
    }

    fn free(&mut self, node: Ptr) -> Option<T> {
        let pool = self.pool;
        self[node].links = [NULL, pool];
        self.pool = node;
        self[node].data.take()
    }
}

impl<T> Default for LinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Ptr> for LinkedList<T> {
    type Output = Node<T>;
    fn index(&self, index: Ptr) -> &Self::Output {
        &self.memory[index.as_usize()]
    }
}

impl<T> IndexMut<Ptr> for LinkedList<T> {
    fn index_mut(&mut self, index: Ptr) -> &mut Self::Output {
        &mut self.memory[index.as_usize()]
    }
}

pub struct LinkedListIterator<'a, T> {
    ll: &'a LinkedList<T>,
    ptr: Ptr,
}

impl<'a, T> LinkedListIterator<'a, T> {
    pub fn new(ll: &'a LinkedList<T>) -> Self {
        Self { ll, ptr: ll.front }
    }
}

impl<'a, T> std::iter::Iterator for LinkedListIterator<'a, T> {
    type Item = Ptr;
    fn next(&mut self) -> Option<Self::Item> {
        (!self.ptr.is_null()).then(|| {
            let cur_node = self.ptr;
            self.ptr = self.ll.next(cur_node);
            cur_node
        })
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[test]
    fn sanity_test() {
        let mut ll = LinkedList::<i32>::new();
        ll.push_rear(1);
        ll.push_rear(2);
        let three = ll.push_rear(3);
        ll.push_rear(99);

        assert_eq!(ll.remove_at(three), Some(3));
        assert_eq!(ll.remove_at(ll.front()), Some(1));
        ll.push_rear(-99);

        assert_eq!(ll.iter().copied().collect::<Vec<_>>(), vec![2, 99, -99]);
        assert_eq!(ll.get(ll.front()), Some(&2));
        assert_eq!(ll.get(ll.rear()), Some(&-99));
        assert_eq!(ll.len(), 3);
    }

    #[test]
    fn remove_while_walking() {
        let mut ll = LinkedList::<usize>::new();
        (0..10).for_each(|k| {
            ll.push_rear(k);
        });

        let mut cur = ll.front();
        while !cur.is_null() {
            let value = *ll.get(cur).unwrap();
            // items pushed mid-walk are visited by the same walk
            if value == 4 {
                ll.push_rear(100);
            }
            let next = ll.next(cur);
            if value % 2 == 0 {
                ll.remove_at(cur);
            }
            cur = next;
        }

        assert_eq!(
            ll.iter().copied().collect::<Vec<_>>(),
            vec![1, 3, 5, 7, 9]
        );
    }

    #[test]
    fn nodes_are_recycled() {
        let mut ll = LinkedList::<u8>::new();
        let a = ll.push_rear(1);
        ll.remove_at(a);
        assert!(ll.is_empty());
        assert_eq!(ll.front(), NULL);
        assert_eq!(ll.rear(), NULL);

        let b = ll.push_rear(2);
        assert_eq!(a, b);
        assert_eq!(ll.iter().copied().collect::<Vec<_>>(), vec![2]);

        ll.remove_at(b);
        assert_eq!(ll.remove_at(ll.front()), None);
    }
}
