// MIT License
//
// Copyright (c) 2024 Erik Holum
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Rooted, ordered n-ary tree storing one value per node.
//!
//! Nodes live in an arena owned by the [Tree] and are addressed by [`NodeId`]
//! handles. A node owns its children through the tree: removing a child
//! destroys its whole subtree and returns the slots to a free list. Parent
//! links are plain handles and never keep a node alive.
use crate::error::TreeError;

/// Handle to a node of a [Tree].
///
/// Made of a slot index and the generation of that slot. A slot's generation
/// is bumped every time it is reused, so a handle to a removed node never
/// aliases whatever is stored in the slot later.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    const fn new(index: usize, generation: u32) -> Self {
        NodeId { index, generation }
    }
}

/// Basic node element for the tree.
///
/// Must be used with [Tree] since children are referenced by handle into the [Tree]'s slots.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Node<T> {
    // The value of this node.
    value: T,

    // Generation of the slot when this node was created.
    generation: u32,

    // Handle of the nodes parent, if available
    parent: Option<NodeId>,

    // Using a vector to maintain order for tree traversals.
    children: Vec<NodeId>,
}

impl<T> Node<T> {
    fn new(value: T, generation: u32, parent: Option<NodeId>) -> Self {
        Node {
            value,
            generation,
            parent,
            children: Vec::new(),
        }
    }
}

/// DFS Iterator for a [Tree]
///
/// Visits nodes in pre-order, left-most children first.
#[derive(Debug)]
pub struct DepthFirstIterator<'a, T> {
    tree: &'a Tree<T>,
    stack: Vec<NodeId>,
}

impl<'a, T> DepthFirstIterator<'a, T> {
    fn new(tree: &'a Tree<T>) -> Self {
        DepthFirstIterator {
            tree,
            stack: vec![tree.root],
        }
    }
}

impl<'a, T> Iterator for DepthFirstIterator<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id).ok()?;
        // Children should be pushed onto the stack in reverse order to ensure left-most
        // are processed first
        self.stack.extend(node.children.iter().rev());
        Some((id, &node.value))
    }
}

/// Walks from a node up to the root, yielding the starting node first.
#[derive(Debug)]
pub struct Ancestors<'a, T> {
    tree: &'a Tree<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parent(current).ok().flatten();
        Some(current)
    }
}

/// Rooted tree with ordered children.
///
/// The tree always has a root. Everything else hangs off of it through
/// [`Tree::add_child`], [`Tree::insert_child`] or [`Tree::graft`], and leaves
/// through one of the removal methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree<T> {
    // Node slots, `None` once freed.
    nodes: Vec<Option<Node<T>>>,

    // Last generation handed out per slot, kept across frees.
    generations: Vec<u32>,

    // Freed slots available for reuse.
    free_list: Vec<usize>,

    root: NodeId,

    // Number of live nodes.
    size: usize,
}

impl<T> Tree<T> {
    /// Construct a new tree with the specified value as the root node.
    ///
    /// The node will take ownership of the provided value.
    pub fn new(val: T) -> Self {
        Tree {
            nodes: vec![Some(Node::new(val, 1, None))],
            generations: vec![1],
            free_list: Vec::new(),
            root: NodeId::new(0, 1),
            size: 1,
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Return the number of live nodes in the tree, root included.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether `id` still refers to a node of this tree.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Returns the value stored at `id`.
    ///
    /// # Errors
    ///
    /// If `id` is not alive.
    pub fn value(&self, id: NodeId) -> Result<&T, TreeError> {
        Ok(&self.node(id)?.value)
    }

    /// Mutable access to the value stored at `id`.
    ///
    /// # Errors
    ///
    /// If `id` is not alive.
    pub fn value_mut(&mut self, id: NodeId) -> Result<&mut T, TreeError> {
        Ok(&mut self.node_mut(id)?.value)
    }

    /// Returns the parent of `id`, `None` for the root.
    ///
    /// # Errors
    ///
    /// If `id` is not alive.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        Ok(self.node(id)?.parent)
    }

    /// # Errors
    ///
    /// If `id` is not alive.
    pub fn is_root(&self, id: NodeId) -> Result<bool, TreeError> {
        Ok(self.node(id)?.parent.is_none())
    }

    /// True if the node has no children.
    ///
    /// # Errors
    ///
    /// If `id` is not alive.
    pub fn is_leaf(&self, id: NodeId) -> Result<bool, TreeError> {
        Ok(self.node(id)?.children.is_empty())
    }

    /// # Errors
    ///
    /// If `id` is not alive.
    pub fn child_count(&self, id: NodeId) -> Result<usize, TreeError> {
        Ok(self.node(id)?.children.len())
    }

    /// # Errors
    ///
    /// If `id` is not alive.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], TreeError> {
        Ok(&self.node(id)?.children)
    }

    /// Returns the child of `id` at position `index`.
    ///
    /// # Errors
    ///
    /// If `id` is not alive or `index` is not below its child count.
    pub fn child(&self, id: NodeId, index: usize) -> Result<NodeId, TreeError> {
        let children = &self.node(id)?.children;
        children
            .get(index)
            .copied()
            .ok_or(TreeError::ChildIndexOutOfRange {
                index,
                count: children.len(),
            })
    }

    /// Appends a new leaf holding `value` to the children of `parent`.
    ///
    /// # Errors
    ///
    /// If the parent is not alive.
    pub fn add_child(&mut self, parent: NodeId, value: T) -> Result<NodeId, TreeError> {
        let count = self.child_count(parent)?;
        self.insert_child(parent, count, value)
    }

    /// Inserts a new leaf holding `value` at position `index` of the children
    /// of `parent`, shifting later children to the right.
    ///
    /// # Errors
    ///
    /// If the parent is not alive or `index` is greater than its child count.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        value: T,
    ) -> Result<NodeId, TreeError> {
        let count = self.child_count(parent)?;
        if index > count {
            return Err(TreeError::ChildIndexOutOfRange { index, count });
        }

        let child = self.allocate(value, Some(parent));
        self.node_mut(parent)?.children.insert(index, child);
        Ok(child)
    }

    /// Moves every node of `subtree` under `parent`, appended as its last child.
    ///
    /// Returns the handle of the former subtree root in this tree. Handles
    /// into `subtree` are meaningless afterwards.
    ///
    /// # Errors
    ///
    /// If the parent is not alive.
    pub fn graft(&mut self, parent: NodeId, subtree: Tree<T>) -> Result<NodeId, TreeError> {
        self.node(parent)?;

        let mut slots = subtree.nodes;
        let mut grafted_root = None;
        let mut stack = vec![(subtree.root, parent)];
        while let Some((source, target)) = stack.pop() {
            let Some(node) = slots.get_mut(source.index).and_then(Option::take) else {
                continue;
            };
            let id = self.allocate(node.value, Some(target));
            self.node_mut(target)?.children.push(id);
            grafted_root.get_or_insert(id);

            // Reversed so siblings are popped, and therefore appended, in order.
            stack.extend(node.children.iter().rev().map(|&child| (child, id)));
        }

        grafted_root.ok_or(TreeError::StaleNode(subtree.root))
    }

    /// Removes the child at `index` by swapping it with the last child.
    ///
    /// Fast, but does not preserve the order of the remaining children. The
    /// removed node and its whole subtree are destroyed.
    ///
    /// # Errors
    ///
    /// If the parent is not alive or `index` is out of range.
    pub fn swap_remove_child(&mut self, parent: NodeId, index: usize) -> Result<(), TreeError> {
        let children = &mut self.node_mut(parent)?.children;
        let count = children.len();
        if index >= count {
            return Err(TreeError::ChildIndexOutOfRange { index, count });
        }
        let child = children.swap_remove(index);
        self.release(child);
        Ok(())
    }

    /// Like [`Tree::swap_remove_child`], addressing the child by handle.
    ///
    /// # Errors
    ///
    /// If the parent is not alive or `child` is not one of its children.
    pub fn swap_remove_child_node(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> Result<(), TreeError> {
        let index = self
            .find_child_index(parent, child)?
            .ok_or(TreeError::NotAChild { parent, child })?;
        self.swap_remove_child(parent, index)
    }

    /// Removes the child at `index`, keeping the order of the remaining children.
    ///
    /// The removed node and its whole subtree are destroyed.
    ///
    /// # Errors
    ///
    /// If the parent is not alive or `index` is out of range.
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> Result<(), TreeError> {
        let children = &mut self.node_mut(parent)?.children;
        let count = children.len();
        if index >= count {
            return Err(TreeError::ChildIndexOutOfRange { index, count });
        }
        let child = children.remove(index);
        self.release(child);
        Ok(())
    }

    /// Like [`Tree::remove_child`], addressing the child by handle.
    ///
    /// # Errors
    ///
    /// If the parent is not alive or `child` is not one of its children.
    pub fn remove_child_node(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let index = self
            .find_child_index(parent, child)?
            .ok_or(TreeError::NotAChild { parent, child })?;
        self.remove_child(parent, index)
    }

    /// Destroys every child subtree of `parent`.
    ///
    /// # Errors
    ///
    /// If the parent is not alive.
    pub fn clear_children(&mut self, parent: NodeId) -> Result<(), TreeError> {
        let children = std::mem::take(&mut self.node_mut(parent)?.children);
        for child in children {
            self.release(child);
        }
        Ok(())
    }

    /// Position of `child` among the children of `parent`, `None` if it is not one.
    ///
    /// # Errors
    ///
    /// If the parent is not alive.
    pub fn find_child_index(
        &self,
        parent: NodeId,
        child: NodeId,
    ) -> Result<Option<usize>, TreeError> {
        Ok(self.node(parent)?.children.iter().position(|&c| c == child))
    }

    /// Returns an iterator from `id` up to and including the root.
    ///
    /// # Errors
    ///
    /// If `id` is not alive.
    pub fn ancestors(&self, id: NodeId) -> Result<Ancestors<'_, T>, TreeError> {
        self.node(id)?;
        Ok(Ancestors {
            tree: self,
            next: Some(id),
        })
    }

    /// Returns a [`DepthFirstIterator`] for the tree
    #[must_use]
    pub fn iter_depth_first(&self) -> DepthFirstIterator<'_, T> {
        DepthFirstIterator::new(self)
    }

    /// Every parent to child link as `(parent value, child value)`, in depth first order.
    pub fn edges(&self) -> impl Iterator<Item = (&T, &T)> + '_ {
        self.iter_depth_first().filter_map(|(id, value)| {
            let parent = self.parent(id).ok().flatten()?;
            Some((self.value(parent).ok()?, value))
        })
    }

    fn node(&self, id: NodeId) -> Result<&Node<T>, TreeError> {
        self.nodes
            .get(id.index)
            .and_then(Option::as_ref)
            .filter(|node| node.generation == id.generation)
            .ok_or(TreeError::StaleNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node<T>, TreeError> {
        self.nodes
            .get_mut(id.index)
            .and_then(Option::as_mut)
            .filter(|node| node.generation == id.generation)
            .ok_or(TreeError::StaleNode(id))
    }

    // Stores a detached node, reusing a freed slot if there is one.
    fn allocate(&mut self, value: T, parent: Option<NodeId>) -> NodeId {
        self.size += 1;
        if let Some(index) = self.free_list.pop() {
            let generation = self.generations[index].saturating_add(1);
            self.generations[index] = generation;
            self.nodes[index] = Some(Node::new(value, generation, parent));
            NodeId::new(index, generation)
        } else {
            self.nodes.push(Some(Node::new(value, 1, parent)));
            self.generations.push(1);
            NodeId::new(self.nodes.len() - 1, 1)
        }
    }

    // Frees `id` and its descendants. The caller unlinks `id` from its parent.
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.index).and_then(Option::take) {
                stack.extend(node.children);
                self.free_list.push(current.index);
                self.size -= 1;
            }
        }
    }
}

impl<T: Clone> Tree<T> {
    /// Deep copies the subtree rooted at `id` into a new tree.
    ///
    /// The copy of `id` becomes the new root, its parent link is not carried over.
    ///
    /// # Errors
    ///
    /// If `id` is not alive.
    pub fn subtree(&self, id: NodeId) -> Result<Tree<T>, TreeError> {
        let mut copy = Tree::new(self.value(id)?.clone());
        let mut stack = vec![(id, copy.root())];
        while let Some((source, target)) = stack.pop() {
            for &child in &self.node(source)?.children {
                let copied = copy.add_child(target, self.value(child)?.clone())?;
                stack.push((child, copied));
            }
        }
        Ok(copy)
    }
}

//
// Unit tests
//

#[cfg(test)]
mod tests {
    use super::*;

    fn values(tree: &Tree<i32>, parent: NodeId) -> Vec<i32> {
        tree.children(parent)
            .unwrap()
            .iter()
            .map(|&c| *tree.value(c).unwrap())
            .collect()
    }

    #[test]
    fn test_tree_children() {
        // Construct tree with a single node
        let mut tree: Tree<i32> = Tree::new(1);
        let root = tree.root();
        assert_eq!(tree.size(), 1);
        assert_eq!(*tree.value(root).unwrap(), 1);
        assert!(tree.is_root(root).unwrap());
        assert!(tree.is_leaf(root).unwrap());

        // Add a child and make sure everything is ok
        let two = tree.add_child(root, 2).unwrap();
        assert_eq!(tree.size(), 2);
        assert_eq!(tree.parent(two).unwrap(), Some(root));
        assert!(!tree.is_root(two).unwrap());
        assert!(!tree.is_leaf(root).unwrap());

        // Make the tree bigger
        tree.add_child(root, 3).unwrap();
        tree.add_child(two, 4).unwrap();
        assert_eq!(tree.size(), 4);
        assert_eq!(tree.child_count(root).unwrap(), 2);
        assert_eq!(tree.child(root, 1).map(|c| *tree.value(c).unwrap()), Ok(3));

        // Reading past the last child is not ok
        assert_eq!(
            tree.child(root, 2),
            Err(TreeError::ChildIndexOutOfRange { index: 2, count: 2 })
        );
    }

    #[test]
    fn test_tree_insert_child() {
        let mut tree = Tree::new(0);
        let root = tree.root();
        tree.add_child(root, 1).unwrap();
        tree.add_child(root, 3).unwrap();
        tree.insert_child(root, 1, 2).unwrap();
        tree.insert_child(root, 3, 4).unwrap();
        assert_eq!(values(&tree, root), vec![1, 2, 3, 4]);

        assert!(tree.insert_child(root, 9, 5).is_err());
        assert_eq!(tree.size(), 5);
    }

    #[test]
    fn test_tree_dfs() {
        // Construct tree with many nodes
        let mut tree: Tree<i32> = Tree::new(1);
        let root = tree.root();

        let two = tree.add_child(root, 2).unwrap();
        let three = tree.add_child(root, 3).unwrap();
        tree.add_child(two, 4).unwrap();
        tree.add_child(two, 5).unwrap();
        tree.add_child(three, 6).unwrap();

        // Expected order
        let expected_dfs_order = vec![1, 2, 4, 5, 3, 6];
        let dfs_order: Vec<i32> = tree.iter_depth_first().map(|(_, v)| *v).collect();

        // Compare
        assert_eq!(dfs_order, expected_dfs_order);

        let edges: Vec<(i32, i32)> = tree.edges().map(|(p, c)| (*p, *c)).collect();
        assert_eq!(edges, vec![(1, 2), (2, 4), (2, 5), (1, 3), (3, 6)]);
    }

    #[test]
    fn test_tree_ancestors() {
        let mut tree: Tree<i32> = Tree::new(1);
        let root = tree.root();

        let two = tree.add_child(root, 2).unwrap();
        let three = tree.add_child(root, 3).unwrap();
        tree.add_child(two, 4).unwrap();
        let five = tree.add_child(two, 5).unwrap();
        let seven = tree.add_child(three, 7).unwrap();
        let six = tree.add_child(five, 6).unwrap();

        let chain = |id| -> Vec<i32> {
            tree.ancestors(id)
                .unwrap()
                .map(|a| *tree.value(a).unwrap())
                .collect()
        };
        assert_eq!(chain(six), vec![6, 5, 2, 1]);
        assert_eq!(chain(seven), vec![7, 3, 1]);
        assert_eq!(chain(root), vec![1]);
    }

    #[test]
    fn test_swap_remove_breaks_order() {
        let mut tree = Tree::new(0);
        let root = tree.root();
        for v in 1..=4 {
            tree.add_child(root, v).unwrap();
        }

        tree.swap_remove_child(root, 0).unwrap();
        assert_eq!(values(&tree, root), vec![4, 2, 3]);

        let three = tree.child(root, 2).unwrap();
        tree.swap_remove_child_node(root, three).unwrap();
        assert_eq!(values(&tree, root), vec![4, 2]);
        assert_eq!(tree.size(), 3);
    }

    #[test]
    fn test_ordered_remove_keeps_order() {
        let mut tree = Tree::new(0);
        let root = tree.root();
        for v in 1..=4 {
            tree.add_child(root, v).unwrap();
        }

        tree.remove_child(root, 0).unwrap();
        assert_eq!(values(&tree, root), vec![2, 3, 4]);

        let three = tree.child(root, 1).unwrap();
        tree.remove_child_node(root, three).unwrap();
        assert_eq!(values(&tree, root), vec![2, 4]);

        assert_eq!(
            tree.remove_child(root, 2),
            Err(TreeError::ChildIndexOutOfRange { index: 2, count: 2 })
        );
    }

    #[test]
    fn test_remove_destroys_subtree() {
        let mut tree = Tree::new(0);
        let root = tree.root();
        let one = tree.add_child(root, 1).unwrap();
        let two = tree.add_child(one, 2).unwrap();
        let three = tree.add_child(two, 3).unwrap();
        let four = tree.add_child(root, 4).unwrap();

        tree.remove_child_node(root, one).unwrap();
        assert_eq!(tree.size(), 2);
        for gone in [one, two, three] {
            assert!(!tree.is_alive(gone));
            assert_eq!(tree.value(gone), Err(TreeError::StaleNode(gone)));
        }
        assert!(tree.is_alive(four));
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut tree = Tree::new(0);
        let root = tree.root();
        let old = tree.add_child(root, 1).unwrap();
        tree.remove_child(root, 0).unwrap();

        let new = tree.add_child(root, 2).unwrap();
        assert_eq!(old.index, new.index);
        assert!(new.generation > old.generation);
        assert!(!tree.is_alive(old));
        assert_eq!(*tree.value(new).unwrap(), 2);
    }

    #[test]
    fn test_find_child_index() {
        let mut tree = Tree::new(0);
        let root = tree.root();
        let one = tree.add_child(root, 1).unwrap();
        let two = tree.add_child(root, 2).unwrap();
        let nested = tree.add_child(one, 3).unwrap();

        assert_eq!(tree.find_child_index(root, two), Ok(Some(1)));
        assert_eq!(tree.find_child_index(root, nested), Ok(None));
        assert_eq!(
            tree.remove_child_node(root, nested),
            Err(TreeError::NotAChild {
                parent: root,
                child: nested
            })
        );
        assert_eq!(tree.size(), 4);
    }

    #[test]
    fn test_clear_children() {
        let mut tree = Tree::new(0);
        let root = tree.root();
        let one = tree.add_child(root, 1).unwrap();
        tree.add_child(one, 2).unwrap();
        tree.add_child(root, 3).unwrap();

        tree.clear_children(root).unwrap();
        assert!(tree.is_leaf(root).unwrap());
        assert_eq!(tree.size(), 1);
    }

    #[test]
    fn test_graft_moves_subtree() {
        let mut branch = Tree::new(10);
        let b_root = branch.root();
        let eleven = branch.add_child(b_root, 11).unwrap();
        branch.add_child(eleven, 12).unwrap();
        branch.add_child(b_root, 13).unwrap();

        let mut tree = Tree::new(0);
        let root = tree.root();
        tree.add_child(root, 1).unwrap();
        let grafted = tree.graft(root, branch).unwrap();

        assert_eq!(tree.size(), 6);
        assert_eq!(tree.parent(grafted).unwrap(), Some(root));
        assert_eq!(values(&tree, root), vec![1, 10]);
        assert_eq!(values(&tree, grafted), vec![11, 13]);
        let dfs: Vec<i32> = tree.iter_depth_first().map(|(_, v)| *v).collect();
        assert_eq!(dfs, vec![0, 1, 10, 11, 12, 13]);
    }

    #[test]
    fn test_subtree_copy_is_new_root() {
        let mut tree = Tree::new(0);
        let root = tree.root();
        let one = tree.add_child(root, 1).unwrap();
        tree.add_child(one, 2).unwrap();
        tree.add_child(one, 3).unwrap();

        let copy = tree.subtree(one).unwrap();
        assert_eq!(copy.size(), 3);
        assert!(copy.is_root(copy.root()).unwrap());
        assert_eq!(*copy.value(copy.root()).unwrap(), 1);
        assert_eq!(values(&copy, copy.root()), vec![2, 3]);

        // The source is untouched
        assert_eq!(tree.size(), 4);
    }
}
