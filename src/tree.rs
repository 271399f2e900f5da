//! The ordered index behind the dictionary: a Red-Black tree whose nodes live in an arena.
//!
//! Nodes are stored in a `Vec` and refer to each other by index. Edges to children are owning in
//! the sense that every node is reachable from the root through them exactly once, while the
//! `parent` index is only ever read to rebalance. Every leaf edge points at one shared sentinel,
//! which keeps the rotation code free of special cases.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::iter::{Flatten, FusedIterator};
use std::mem;

use tracing::trace;

/// Index of the sentinel leaf. No arena slot ever has this index.
const NIL: usize = usize::MAX;

/// The sentinel. It is black, has no children and is never written to.
static SENTINEL: Links = Links {
    colour: Colour::Black,
    parent: NIL,
    child: [NIL, NIL],
};

/// A Red-Black tree for use as an ordered map.
///
/// ```rust
/// use rbdict::RbTree;
///
/// let mut map = RbTree::new();
///
/// map.insert("cat", 1);
/// map.insert("car", 2);
/// map.insert("cart", 3);
///
/// let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
/// assert_eq!(keys, ["car", "cart", "cat"]);
/// ```
#[derive(Clone)]
pub struct RbTree<K: Ord, V> {
    /// Every node of the tree. Nodes are never removed, so the arena length is the tree length.
    nodes: Vec<RbNode<K, V>>,
    /// Index of the root node, or `NIL` when the tree is empty.
    root: usize,
}

impl<K: Ord, V> RbTree<K, V> {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the amount of elements stored in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn links(&self, node: usize) -> &Links {
        if node == NIL {
            &SENTINEL
        } else {
            &self.nodes[node].links
        }
    }

    fn links_mut(&mut self, node: usize) -> &mut Links {
        debug_assert!(node != NIL, "the sentinel is never written to");
        &mut self.nodes[node].links
    }

    fn colour(&self, node: usize) -> Colour {
        self.links(node).colour
    }

    fn set_colour(&mut self, node: usize, colour: Colour) {
        self.links_mut(node).colour = colour;
    }

    fn parent(&self, node: usize) -> usize {
        self.links(node).parent
    }

    /// The side of its parent that a non-root node hangs from.
    fn side_of(&self, node: usize) -> Direction {
        match self.links(self.parent(node))[Direction::Left] == node {
            true => Direction::Left,
            false => Direction::Right,
        }
    }

    /// Rotate a subtree of the tree in a direction, returning the node that took the place of
    /// `root`.
    ///
    /// The child of `root` opposite to `dir` must not be the sentinel.
    fn rotate_dir_root(&mut self, root: usize, dir: Direction) -> usize {
        let parent = self.links(root).parent;
        let opposite = self.links(root)[dir.opposite()];
        debug_assert!(opposite != NIL);
        let middle = self.links(opposite)[dir];

        self.links_mut(root)[dir.opposite()] = middle;
        if middle != NIL {
            self.links_mut(middle).parent = root;
        }
        self.links_mut(opposite)[dir] = root;
        self.links_mut(root).parent = opposite;
        self.links_mut(opposite).parent = parent;
        if parent == NIL {
            self.root = opposite;
        } else {
            // `root` still hangs from `parent` at this point, only its own back-link changed.
            let parent_dir = match self.links(parent)[Direction::Left] == root {
                true => Direction::Left,
                false => Direction::Right,
            };
            self.links_mut(parent)[parent_dir] = opposite;
        }

        opposite
    }

    /// Find the arena index holding `key`, or `NIL`.
    fn find<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root;
        while cur != NIL {
            let node = &self.nodes[cur];
            match key.cmp(node.key.borrow()) {
                Ordering::Less => cur = node.links[Direction::Left],
                Ordering::Equal => break,
                Ordering::Greater => cur = node.links[Direction::Right],
            }
        }
        cur
    }

    /// Get a value if it exists.
    ///
    /// ```rust
    /// use rbdict::RbTree;
    ///
    /// let mut map = RbTree::default();
    ///
    /// map.insert(4, 6);
    /// map.insert(5, 7);
    /// map.insert(6, 8);
    ///
    /// assert!(map.get(&4) == Some(&6));
    /// assert!(map.get(&5) == Some(&7));
    /// assert!(map.get(&6) == Some(&8));
    /// assert!(map.get(&7).is_none());
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.find(key) {
            NIL => None,
            node => Some(&self.nodes[node].val),
        }
    }

    /// Get a mutable reference to a value if it exists.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.find(key) {
            NIL => None,
            node => Some(&mut self.nodes[node].val),
        }
    }

    /// Returns whether the tree holds `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key) != NIL
    }

    /// Insert a key value pair into the map, returning the value it replaced if the key was
    /// already present.
    ///
    /// ```rust
    /// use rbdict::RbTree;
    ///
    /// let mut map = RbTree::default();
    ///
    /// map.insert(4, 6);
    /// map.insert(5, 7);
    /// assert_eq!(map.insert(4, 8), Some(6));
    ///
    /// assert!(map.get(&5) == Some(&7));
    /// assert!(map.get(&4) == Some(&8));
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn insert(&mut self, key: K, val: V) -> Option<V> {
        let mut parent = NIL;
        let mut cur = self.root;
        let mut dir = Direction::Left;
        // Walk down to the leaf edge our key belongs on, remembering the parent and the side of
        // the parent we left from. An equal key means no structural change at all.
        while cur != NIL {
            let node = &mut self.nodes[cur];
            match key.cmp(&node.key) {
                Ordering::Less => {
                    parent = cur;
                    cur = node.links[Direction::Left];
                    dir = Direction::Left;
                }
                Ordering::Equal => return Some(mem::replace(&mut node.val, val)),
                Ordering::Greater => {
                    parent = cur;
                    cur = node.links[Direction::Right];
                    dir = Direction::Right;
                }
            }
        }

        let node = self.nodes.len();
        self.nodes.push(RbNode {
            key,
            val,
            links: Links {
                colour: Colour::Red,
                parent,
                child: [NIL, NIL],
            },
        });

        if parent == NIL {
            trace!("rbtree: new root");
            self.root = node;
            self.set_colour(node, Colour::Black);
            return None;
        }
        self.links_mut(parent)[dir] = node;

        // A red child of the (black) root cannot break anything.
        if self.parent(parent) == NIL {
            return None;
        }
        self.fix_insert(node);
        None
    }

    /// Restore the Red-Black properties after `node` was linked in as a red leaf.
    fn fix_insert(&mut self, mut node: usize) {
        loop {
            let parent = self.parent(node);
            if parent == NIL || self.colour(parent) == Colour::Black {
                break;
            }
            debug_assert!(self.colour(node) == Colour::Red);
            // The parent is red, so it is not the root and the grandparent exists.
            let grandparent = self.parent(parent);
            debug_assert!(grandparent != NIL);
            let parent_dir = self.side_of(parent);
            let uncle = self.links(grandparent)[parent_dir.opposite()];

            if self.colour(uncle) == Colour::Red {
                // Push the red up: parent and uncle go black, grandparent red, and the grandparent
                // may now clash with its own parent.
                self.set_colour(uncle, Colour::Black);
                self.set_colour(parent, Colour::Black);
                self.set_colour(grandparent, Colour::Red);
                node = grandparent;
            } else {
                if node == self.links(parent)[parent_dir.opposite()] {
                    // Zig-zag. Straighten it into a zig-zig so a single rotation at the
                    // grandparent finishes the job.
                    node = parent;
                    self.rotate_dir_root(node, parent_dir);
                }
                let parent = self.parent(node);
                self.set_colour(parent, Colour::Black);
                self.set_colour(grandparent, Colour::Red);
                self.rotate_dir_root(grandparent, parent_dir.opposite());
            }

            if node == self.root {
                break;
            }
        }
        let root = self.root;
        self.set_colour(root, Colour::Black);
    }

    /// Number of nodes on the longest path from the root to a leaf.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = Vec::new();
        if self.root != NIL {
            stack.push((self.root, 1));
        }
        while let Some((node, depth)) = stack.pop() {
            height = height.max(depth);
            for child in self.links(node).child {
                if child != NIL {
                    stack.push((child, depth + 1));
                }
            }
        }
        height
    }

    /// For every arena slot, its position in key order.
    fn ranks(&self) -> Vec<usize> {
        let mut ranks = vec![0; self.nodes.len()];
        let mut stack = Vec::new();
        let mut cur = self.root;
        let mut rank = 0;
        loop {
            while cur != NIL {
                stack.push(cur);
                cur = self.links(cur)[Direction::Left];
            }
            let Some(node) = stack.pop() else {
                break;
            };
            ranks[node] = rank;
            rank += 1;
            cur = self.links(node)[Direction::Right];
        }
        ranks
    }

    /// Return a borrowing iterator over the key value pairs in the tree, in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: self,
            stack: Vec::new(),
            cur: self.root,
            len: self.len(),
        }
    }

    /// Return an iterator over pairs of keys and mutable references to values in the tree, in
    /// ascending key order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let ranks = self.ranks();
        let len = self.len();
        let slots = scatter(
            &ranks,
            self.nodes.iter_mut().map(|n| (&n.key, &mut n.val)),
        );
        IterMut {
            inner: slots.into_iter().flatten(),
            len,
        }
    }
}

/// Place `items[i]` at position `ranks[i]`.
fn scatter<T>(ranks: &[usize], items: impl Iterator<Item = T>) -> Vec<Option<T>> {
    let mut slots: Vec<Option<T>> = ranks.iter().map(|_| None).collect();
    for (&rank, item) in ranks.iter().zip(items) {
        slots[rank] = Some(item);
    }
    slots
}

impl<K: Ord, V> Default for RbTree<K, V> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            root: NIL,
        }
    }
}

impl<K: Ord + Debug, V: Debug> Debug for RbTree<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self).finish()
    }
}

impl<K: Ord + PartialEq, V: PartialEq> PartialEq for RbTree<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other)
    }
}

impl<K: Ord + Eq, V: Eq> Eq for RbTree<K, V> {}

impl<K: Ord, V> FromIterator<(K, V)> for RbTree<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tree = RbTree::default();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord, V> Extend<(K, V)> for RbTree<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a RbTree<K, V> {
    type Item = (&'a K, &'a V);

    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a mut RbTree<K, V> {
    type Item = (&'a K, &'a mut V);

    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K: Ord, V> IntoIterator for RbTree<K, V> {
    type Item = (K, V);

    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let ranks = self.ranks();
        let len = self.len();
        let slots = scatter(&ranks, self.nodes.into_iter().map(|n| (n.key, n.val)));
        IntoIter {
            inner: slots.into_iter().flatten(),
            len,
        }
    }
}

/// A borrowing iterator over the elements of an `RbTree`, in ascending key order.
pub struct Iter<'a, K: Ord, V> {
    tree: &'a RbTree<K, V>,
    /// Nodes whose left subtree is being visited.
    stack: Vec<usize>,
    /// Root of the subtree to descend into next.
    cur: usize,
    len: usize,
}

impl<'a, K: Ord + 'a, V: 'a> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.cur != NIL {
            self.stack.push(self.cur);
            self.cur = self.tree.links(self.cur)[Direction::Left];
        }
        let node = self.stack.pop()?;
        self.cur = self.tree.links(node)[Direction::Right];

        self.len -= 1;

        let node = &self.tree.nodes[node];
        Some((&node.key, &node.val))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, K: Ord + 'a, V: 'a> ExactSizeIterator for Iter<'a, K, V> {
    fn len(&self) -> usize {
        self.len
    }
}

impl<'a, K: Ord + 'a, V: 'a> FusedIterator for Iter<'a, K, V> {}

/// An iterator over mutable references of the elements of an `RbTree`, in ascending key order.
pub struct IterMut<'a, K: Ord, V> {
    inner: Flatten<std::vec::IntoIter<Option<(&'a K, &'a mut V)>>>,
    len: usize,
}

impl<'a, K: Ord + 'a, V: 'a> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        self.len -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, K: Ord + 'a, V: 'a> ExactSizeIterator for IterMut<'a, K, V> {
    fn len(&self) -> usize {
        self.len
    }
}

impl<'a, K: Ord + 'a, V: 'a> FusedIterator for IterMut<'a, K, V> {}

/// An owning iterator over the elements in an `RbTree`, in ascending key order.
pub struct IntoIter<K: Ord, V> {
    inner: Flatten<std::vec::IntoIter<Option<(K, V)>>>,
    len: usize,
}

impl<K: Ord, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        self.len -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K: Ord, V> ExactSizeIterator for IntoIter<K, V> {
    fn len(&self) -> usize {
        self.len
    }
}

impl<K: Ord, V> FusedIterator for IntoIter<K, V> {}

/// A direction for a node to be in, in a binary tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Get the opposite of a direction.
    fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// The colour of an RbNode. See `RbNode` for more info.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    Red,
    Black,
}

/// The structural part of a node: colour and the indices of its neighbours.
#[derive(Debug, Clone)]
struct Links {
    /// The colour of this node. Every node has a colour for balancing purposes.
    colour: Colour,
    /// Index of the parent of this node. This is `NIL` iff the node is the root node. Only read
    /// while rebalancing.
    parent: usize,
    /// Our two child nodes, `NIL` standing for the sentinel leaf.
    child: [usize; 2],
}

impl std::ops::Index<Direction> for Links {
    type Output = usize;

    fn index(&self, index: Direction) -> &Self::Output {
        match index {
            Direction::Left => &self.child[0],
            Direction::Right => &self.child[1],
        }
    }
}

impl std::ops::IndexMut<Direction> for Links {
    fn index_mut(&mut self, index: Direction) -> &mut Self::Output {
        match index {
            Direction::Left => &mut self.child[0],
            Direction::Right => &mut self.child[1],
        }
    }
}

/// An RbNode. Each node has a key value pair, and links used for balancing.
#[derive(Clone)]
struct RbNode<K, V> {
    key: K,
    val: V,
    links: Links,
}
