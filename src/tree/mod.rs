//! Tree reconstruction from flattened line streams.
//!
//! Both builders treat the newest sibling of a level as its head: lookups and descents go
//! through the newest node first. Siblings are appended, so each `Vec` already holds stream
//! order when the stream ends and no reordering pass is needed.

pub mod directory;
pub mod thread;

pub use directory::{DirectoryTreeBuilder, build_directory_tree, reduce};
pub use thread::{MessageThreadTreeBuilder, build_thread_tree, decode_depth};

use crate::{DirectoryNode, MessageNode};

/// A node owning an ordered list of children of its own type.
pub trait TreeNode: Sized {
    fn children(&self) -> &[Self];
    fn children_mut(&mut self) -> &mut Vec<Self>;
}

impl TreeNode for DirectoryNode {
    fn children(&self) -> &[Self] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Self> {
        &mut self.children
    }
}

impl TreeNode for MessageNode {
    fn children(&self) -> &[Self] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Self> {
        &mut self.children
    }
}

/// Tear down a subtree without recursing once per level.
fn drop_children<T: TreeNode>(node: &mut T) {
    let mut stack = std::mem::take(node.children_mut());
    while let Some(mut child) = stack.pop() {
        stack.append(child.children_mut());
    }
}

impl Drop for DirectoryNode {
    fn drop(&mut self) {
        drop_children(self);
    }
}

impl Drop for MessageNode {
    fn drop(&mut self) {
        drop_children(self);
    }
}

/// Pre-order walk with depth (roots are depth 0), iterative.
pub fn walk<T, F>(roots: &[T], mut visit: F)
where
    T: TreeNode,
    F: FnMut(usize, &T),
{
    let mut stack: Vec<(usize, &T)> = roots.iter().rev().map(|n| (0, n)).collect();
    while let Some((depth, node)) = stack.pop() {
        visit(depth, node);
        stack.extend(node.children().iter().rev().map(|c| (depth + 1, c)));
    }
}

/// Mutable visit of every node (order unspecified), iterative.
pub fn walk_mut<T, F>(roots: &mut [T], mut visit: F)
where
    T: TreeNode,
    F: FnMut(&mut T),
{
    let mut stack: Vec<&mut T> = roots.iter_mut().collect();
    while let Some(node) = stack.pop() {
        visit(node);
        stack.extend(node.children_mut().iter_mut());
    }
}
