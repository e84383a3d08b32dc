//! This crate exposes an ordered set backed by a Binary Search Tree (BST)
//! with parent-linked nodes.
//!
//! ## Binary Search Tree
//!
//! A Binary Search Tree is a data structure supporting operations to
//! insert, find, and delete stored records. BSTs are typically defined
//! recursively using the notion of a `Node`. A `Node` will typically store
//! some sort of value (the value that was inserted, for example) and will
//! sometimes have child `Node`s. The most important invariants of a BST are:
//!
//! 1. For every `Node` in a BST, all the `Node`s in its left subtree have a
//!    value less than its own value.
//! 2. For every `Node` in a BST, all the `Node`s in its right subtree have a
//!    value greater than its own value.
//!
//! > Note that some `Node`s have no children. These `Node`s are called "leaf nodes".
//!
//! The benefits of these invariants are many. For instance, searching for
//! values in the tree takes `O(height)` (where `height` is defined as the longest
//! path from the root `Node` to a leaf `Node`). BSTs also naturally support
//! sorted iteration by visiting the left subtree, then the subtree root, then
//! the right subtree.
//!
//! The tree here additionally gives every node a non-owning link back to its
//! parent. Parent links buy O(1) splicing during deletion - once the node
//! holding a value has been found it can be unlinked in place, without
//! searching down from the root again - and let sorted iteration walk the
//! tree lazily without an auxiliary stack.

#![deny(missing_docs, clippy::clone_on_ref_ptr)]

pub mod linked;

#[cfg(test)]
mod test;
