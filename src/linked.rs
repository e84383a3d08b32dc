//! A mutable, parent-linked BST storing a set of ordered values. Child links own
//! their subtrees; every node also carries a non-owning pointer back to its
//! parent so that deletion can splice a node out in O(1) once it has been found.
//!
//! Equal values are rejected on insertion, so the tree behaves as a set.
//! Removal of an absent value is a no-op. Both are silent by design.
//!
//! # Examples
//!
//! ```
//! use bst_set::linked::Tree;
//!
//! let mut tree = Tree::new();
//!
//! // Nothing in here yet.
//! assert!(!tree.contains(&2));
//!
//! tree.insert(2);
//! tree.insert(1);
//! tree.insert(3);
//! assert!(tree.contains(&2));
//!
//! // Inserting an equal value a second time leaves the set unchanged.
//! tree.insert(2);
//! assert_eq!(tree.len(), 3);
//!
//! // Values come back out in ascending order.
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
//!
//! tree.remove(&2);
//! assert!(!tree.contains(&2));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ptr::NonNull;

/// An ordered set of values backed by a Binary Search Tree whose nodes link
/// back to their parents. This can be used for inserting, finding, and
/// removing values and for iterating over them in ascending order.
pub struct Tree<T> {
    // This is a `Link` instead of an `Option<Node>` so that it can be moved around with the `Tree`
    // without the children's parent pointers breaking.
    root: Link<T>,
    len: usize,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Tree<T> {
    fn drop(&mut self) {
        if let Some(mut root) = self.root.take().0 {
            // SAFETY: We own the root we're dropping so this won't be called twice. The root was
            // initially allocated using `Box::new` (in `Node::new_boxed`) so this should be well
            // aligned, etc.
            unsafe { drop(Box::from_raw(root.as_mut())) };
        }
    }
}

impl<T> Clone for Tree<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        let root = self.root().map(|root| {
            let new_root = Box::leak(Box::new(root.clone()));
            new_root.fix_left_child_parent();
            new_root.fix_right_child_parent();
            NonNull::from(new_root)
        });
        Self {
            root: Link(root),
            len: self.len,
        }
    }
}

impl<T> fmt::Debug for Tree<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree").field("root", &self.root()).finish()
    }
}

impl<T> Tree<T> {
    /// Generate a new, empty `Tree`.
    pub fn new() -> Self {
        Self {
            root: Link(None),
            len: 0,
        }
    }

    /// The number of values currently in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no values at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Checks whether the tree holds a value equal to the given one.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_set::linked::Tree;
    ///
    /// let mut tree = Tree::new();
    /// tree.insert(1);
    ///
    /// assert!(tree.contains(&1));
    /// assert!(!tree.contains(&42));
    /// ```
    pub fn contains(&self, value: &T) -> bool
    where
        T: Ord,
    {
        self.find_node(value).is_some()
    }

    /// Inserts the given value into the tree. If an equal value is already
    /// present the tree is left unchanged and the new value is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_set::linked::Tree;
    ///
    /// let mut tree = Tree::new();
    ///
    /// tree.insert(1);
    /// assert!(tree.contains(&1));
    ///
    /// tree.insert(1);
    /// assert_eq!(tree.len(), 1);
    /// ```
    pub fn insert(&mut self, value: T)
    where
        T: Ord,
    {
        // Iterative descent, tracking the node we fell off of and which side
        // we fell off on. Iteration keeps the stack flat even when the tree
        // has degenerated into a list.
        let mut parent: Option<(NonNull<Node<T>>, bool)> = None;
        let mut current = self.root.0;
        while let Some(node) = current {
            // SAFETY: Any node reachable from the root is valid and we hold `&mut self`, so no
            // other reference to it can exist right now.
            let node_ref = unsafe { node.as_ref() };
            match value.cmp(&node_ref.value) {
                Ordering::Less => {
                    parent = Some((node, true));
                    current = node_ref.left.0;
                }
                // Equal values are rejected, not stored.
                Ordering::Equal => return,
                Ordering::Greater => {
                    parent = Some((node, false));
                    current = node_ref.right.0;
                }
            }
        }

        let mut new_node = Node::new_boxed(value);
        new_node.parent = Link(parent.map(|(node, _)| node));
        let new_node = NonNull::from(Box::leak(new_node));

        match parent {
            None => self.root = Link(Some(new_node)),
            Some((mut node, went_left)) => {
                // SAFETY: Same as the descent above; additionally `new_node` is a fresh
                // allocation so the two references cannot alias.
                let node_ref = unsafe { node.as_mut() };
                if went_left {
                    node_ref.left = Link(Some(new_node));
                } else {
                    node_ref.right = Link(Some(new_node));
                }

                if cfg!(debug_assertions) {
                    // SAFETY: Fresh allocation, distinct from `node_ref`.
                    let new_ref = unsafe { new_node.as_ref() };
                    if went_left {
                        assert!(new_ref.value < node_ref.value);
                    } else {
                        assert!(new_ref.value > node_ref.value);
                    }
                }
            }
        }
        self.len += 1;
    }

    /// Removes the node holding a value equal to the given one, if any. If
    /// the tree does not contain such a value, nothing happens.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_set::linked::Tree;
    ///
    /// let mut tree = Tree::new();
    /// tree.insert(1);
    ///
    /// tree.remove(&1);
    /// assert!(!tree.contains(&1));
    ///
    /// // Removing an absent value is a no-op, not an error.
    /// tree.remove(&42);
    /// ```
    pub fn remove(&mut self, value: &T)
    where
        T: Ord,
    {
        let node = match self.find_node(value) {
            Some(node) => node,
            None => return,
        };
        self.unlink(node);
        self.len -= 1;
    }

    /// Returns an iterator over the values in the tree in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_set::linked::Tree;
    ///
    /// let mut tree = Tree::new();
    /// for value in [2, 3, 1] {
    ///     tree.insert(value);
    /// }
    ///
    /// let mut values = tree.iter();
    /// assert_eq!(values.next(), Some(&1));
    /// assert_eq!(values.next(), Some(&2));
    /// assert_eq!(values.next(), Some(&3));
    /// assert_eq!(values.next(), None);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            node: self.root().map(Node::leftmost),
            len: self.len,
        }
    }

    /// Finds the node holding a value equal to the query by iterative descent
    /// from the root.
    fn find_node(&self, value: &T) -> Option<NonNull<Node<T>>>
    where
        T: Ord,
    {
        let mut current = self.root.0;
        while let Some(node) = current {
            // SAFETY: Any node reachable from the root is valid and, because we hold `&self`,
            // nothing can be mutating it right now.
            let node_ref = unsafe { node.as_ref() };
            current = match value.cmp(&node_ref.value) {
                Ordering::Less => node_ref.left.0,
                Ordering::Equal => return Some(node),
                Ordering::Greater => node_ref.right.0,
            };
        }
        None
    }

    /// Removes `node` from the tree and frees it. The caller must have found
    /// `node` in this tree and must adjust `self.len` afterwards.
    fn unlink(&mut self, mut node: NonNull<Node<T>>) {
        // A node with two children is never unlinked directly. Its value is
        // replaced with its in-order predecessor's (the rightmost node of the
        // left subtree) and the removal is retargeted onto the predecessor,
        // which has no right child by construction.
        //
        // SAFETY: Throughout this function we hold `&mut self` and only ever create one node
        // reference at a time (the `mem::swap` pair points at two distinct nodes), so none of the
        // dereferences alias.
        unsafe {
            let has_two_children = {
                let node_ref = node.as_ref();
                node_ref.left.0.is_some() && node_ref.right.0.is_some()
            };
            if has_two_children {
                let mut predecessor = node
                    .as_ref()
                    .left
                    .0
                    .expect("node with two children has a left child");
                while let Some(right) = predecessor.as_ref().right.0 {
                    predecessor = right;
                }
                // Move the value, don't relink the nodes.
                mem::swap(&mut node.as_mut().value, &mut predecessor.as_mut().value);
                node = predecessor;
            }

            // `node` now has at most one child. Detaching the child links here
            // means dropping the box below frees only this node.
            let node_ref = node.as_mut();
            let child = node_ref.left.0.take().or_else(|| node_ref.right.0.take());
            let parent = node_ref.parent;

            if let Some(mut child) = child {
                child.as_mut().parent = parent;
            }

            match parent.0 {
                None => self.root = Link(child),
                Some(mut parent) => {
                    let parent_ref = parent.as_mut();
                    if parent_ref.left.0 == Some(node) {
                        parent_ref.left = Link(child);
                    } else {
                        parent_ref.right = Link(child);
                    }
                }
            }

            drop(Box::from_raw(node.as_ptr()));
        }
    }

    fn root(&self) -> Option<&Node<T>> {
        self.root.node()
    }
}

impl<'a, T> IntoIterator for &'a Tree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the values of a [`Tree`] in ascending order.
///
/// Created by [`Tree::iter`].
pub struct Iter<'a, T> {
    node: Option<&'a Node<T>>,
    len: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.node?;
        debug_assert!(self.len > 0);
        self.len -= 1;
        // In-order successor: leftmost of the right subtree if there is one,
        // otherwise the nearest ancestor reached from a left child.
        self.node = match node.right() {
            Some(right) => Some(right.leftmost()),
            None => node.next_ancestor(),
        };
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {
    fn len(&self) -> usize {
        self.len
    }
}

impl<'a, T> std::iter::FusedIterator for Iter<'a, T> {}

struct Link<T>(Option<NonNull<Node<T>>>);

impl<T> Clone for Link<T> {
    fn clone(&self) -> Self {
        Self(self.0)
    }
}
impl<T> Copy for Link<T> {}

impl<T> Link<T> {
    fn node(&self) -> Option<&Node<T>> {
        // SAFETY: If the pointer is not `None` then it is a valid `Node`. Because we take `&self`
        // here, there can be no aliasing with `self.node_mut()`. There can only be aliasing with
        // `self.0.unwrap().as_mut()`. This code would be unsafe so it'd be the caller's
        // responsibility to ensure there is no existing borrow of the inner pointer.
        unsafe { self.0.as_ref().map(|ptr| ptr.as_ref()) }
    }

    fn node_mut(&mut self) -> Option<&mut Node<T>> {
        // SAFETY: As in `Link::node` but the `&mut self` additionally rules out aliasing with
        // `self.node()`.
        unsafe { self.0.as_mut().map(|ptr| ptr.as_mut()) }
    }

    fn take(&mut self) -> Self {
        Link(self.0.take())
    }
}

struct Node<T> {
    value: T,
    // The left and right links own their subtrees. The parent link never owns
    // anything - it exists so that deletion can find its splice target
    // without descending from the root again.
    left: Link<T>,
    right: Link<T>,
    parent: Link<T>,
}

impl<T> Drop for Node<T> {
    fn drop(&mut self) {
        // SAFETY: Dropping a node doesn't drop its parent and we are the only owners of these
        // children so we won't drop them twice. They were initially allocated using `Box::new` (in
        // `Node::new_boxed`) so they should be well aligned, etc.
        unsafe {
            if let Some(mut left) = self.left.0.take() {
                drop(Box::from_raw(left.as_mut()));
            }
            if let Some(mut right) = self.right.0.take() {
                drop(Box::from_raw(right.as_mut()));
            }
        }
    }
}

impl<T> Clone for Node<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        let left = self.left().map(|left| {
            let new_left = Box::leak(Box::new(left.clone()));
            new_left.fix_left_child_parent();
            new_left.fix_right_child_parent();
            NonNull::from(new_left)
        });
        let right = self.right().map(|right| {
            let new_right = Box::leak(Box::new(right.clone()));
            new_right.fix_left_child_parent();
            new_right.fix_right_child_parent();
            NonNull::from(new_right)
        });
        Self {
            value: self.value.clone(),
            left: Link(left),
            right: Link(right),
            parent: self.parent,
        }
    }
}

impl<T> fmt::Debug for Node<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("value", &self.value)
            .field("left", &self.left())
            .field("right", &self.right())
            .finish()
    }
}

impl<T> Node<T> {
    fn new_boxed(value: T) -> Box<Self> {
        Box::new(Node {
            value,
            left: Link(None),
            right: Link(None),
            parent: Link(None),
        })
    }

    fn left(&self) -> Option<&Self> {
        self.left.node()
    }

    fn right(&self) -> Option<&Self> {
        self.right.node()
    }

    fn left_mut(&mut self) -> Option<&mut Self> {
        self.left.node_mut()
    }

    fn right_mut(&mut self) -> Option<&mut Self> {
        self.right.node_mut()
    }

    fn fix_left_child_parent(&mut self) {
        let self_ptr = NonNull::from(&*self);
        if let Some(left) = self.left_mut() {
            left.parent = Link(Some(self_ptr));
        }
    }

    fn fix_right_child_parent(&mut self) {
        let self_ptr = NonNull::from(&*self);
        if let Some(right) = self.right_mut() {
            right.parent = Link(Some(self_ptr));
        }
    }

    /// The smallest node in the subtree rooted at this node.
    fn leftmost(&self) -> &Self {
        let mut node = self;
        while let Some(left) = node.left() {
            node = left;
        }
        node
    }

    /// Walks the parent links up to the first ancestor whose left subtree
    /// holds this node. That ancestor is the in-order successor of a node
    /// with no right child.
    fn next_ancestor(&self) -> Option<&Self> {
        let mut node = self;
        while let Some(parent) = node.parent.node() {
            if parent.left.0 == Some(NonNull::from(node)) {
                return Some(parent);
            }
            node = parent;
        }
        None
    }
}

#[cfg(test)]
impl<T> Tree<T> {
    /// Walks the whole tree asserting the BST ordering invariant, the mutual
    /// consistency of parent/child links, and that `len` matches the number
    /// of reachable nodes.
    fn check_invariants(&self)
    where
        T: Ord,
    {
        fn check<T: Ord>(node: &Node<T>, lower: Option<&T>, upper: Option<&T>) -> usize {
            if let Some(lower) = lower {
                assert!(*lower < node.value);
            }
            if let Some(upper) = upper {
                assert!(node.value < *upper);
            }

            let mut count = 1;
            if let Some(left) = node.left() {
                let left_parent = left.parent.node().expect("left child has a parent");
                assert!(std::ptr::eq(left_parent, node));
                count += check(left, lower, Some(&node.value));
            }
            if let Some(right) = node.right() {
                let right_parent = right.parent.node().expect("right child has a parent");
                assert!(std::ptr::eq(right_parent, node));
                count += check(right, Some(&node.value), upper);
            }
            count
        }

        let count = self.root().map_or(0, |root| {
            assert!(root.parent.0.is_none());
            check(root, None, None)
        });
        assert_eq!(count, self.len);
    }
}
