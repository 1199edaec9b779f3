//! Sorted map over `i64` keys, backed by an iterative red/black tree.
//!
//! Nodes live in a growable slab indexed by position rather than linked by
//! raw pointers (the same "offsets instead of pointers" substitution
//! [`crate::mempool::Arena`] makes for its free list) — a freed node's slot
//! is pushed onto a free list and reused by the next insert, so the slab
//! never shrinks but also never leaks slots.
//!
//! The delete path supplies the full iterative CLRS delete-fixup, including
//! every double-black rebalancing case.
//!
//! Concurrency is a single [`crate::sync::RwLock`] per map: [`get`](RbTreeMap::get)
//! acquires it as a reader, [`put`](RbTreeMap::put)/[`delete`](RbTreeMap::delete)
//! as a writer — [`crate::sync::RwLock`] protects data it does not itself
//! own, and here that data is the tree.

use std::cell::UnsafeCell;

use crate::error::Result;
use crate::sync::RwLock;

type NodeId = usize;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Color {
    Red,
    Black,
}

struct Node {
    color: Color,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    key: i64,
    value: i64,
}

struct Tree {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    len: usize,
}

impl Tree {
    fn new() -> Self {
        Tree {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id].as_ref().expect("dangling node id")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id].as_mut().expect("dangling node id")
    }

    fn color_of(&self, id: Option<NodeId>) -> Color {
        // A nil child is conventionally black.
        id.map_or(Color::Black, |i| self.node(i).color)
    }

    fn alloc(&mut self, color: Color, parent: Option<NodeId>, key: i64, value: i64) -> NodeId {
        let node = Node {
            color,
            parent,
            left: None,
            right: None,
            key,
            value,
        };
        if let Some(id) = self.free.pop() {
            self.nodes[id] = Some(node);
            id
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id] = None;
        self.free.push(id);
    }

    fn rotate_left(&mut self, x: NodeId) {
        let y = self.node(x).right.expect("rotate_left requires a right child");
        let y_left = self.node(y).left;
        self.node_mut(x).right = y_left;
        if let Some(yl) = y_left {
            self.node_mut(yl).parent = Some(x);
        }
        let x_parent = self.node(x).parent;
        self.node_mut(y).parent = x_parent;
        match x_parent {
            None => self.root = Some(y),
            Some(p) if self.node(p).left == Some(x) => self.node_mut(p).left = Some(y),
            Some(p) => self.node_mut(p).right = Some(y),
        }
        self.node_mut(y).left = Some(x);
        self.node_mut(x).parent = Some(y);
    }

    fn rotate_right(&mut self, x: NodeId) {
        let y = self.node(x).left.expect("rotate_right requires a left child");
        let y_right = self.node(y).right;
        self.node_mut(x).left = y_right;
        if let Some(yr) = y_right {
            self.node_mut(yr).parent = Some(x);
        }
        let x_parent = self.node(x).parent;
        self.node_mut(y).parent = x_parent;
        match x_parent {
            None => self.root = Some(y),
            Some(p) if self.node(p).right == Some(x) => self.node_mut(p).right = Some(y),
            Some(p) => self.node_mut(p).left = Some(y),
        }
        self.node_mut(y).right = Some(x);
        self.node_mut(x).parent = Some(y);
    }

    fn find(&self, key: i64) -> Option<NodeId> {
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = self.node(id);
            if key == node.key {
                return Some(id);
            }
            cur = if key < node.key { node.left } else { node.right };
        }
        None
    }

    fn put(&mut self, key: i64, value: i64) {
        let mut parent = None;
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = self.node(id);
            if key == node.key {
                self.node_mut(id).value = value;
                return;
            }
            parent = Some(id);
            cur = if key < node.key {
                node.left
            } else {
                node.right
            };
        }

        let new_id = self.alloc(Color::Red, parent, key, value);
        match parent {
            None => self.root = Some(new_id),
            Some(p) if key < self.node(p).key => self.node_mut(p).left = Some(new_id),
            Some(p) => self.node_mut(p).right = Some(new_id),
        }
        self.len += 1;
        self.insert_fixup(new_id);
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        while let Some(p) = self.node(z).parent {
            if self.node(p).color == Color::Black {
                break;
            }
            // A red parent always has a black-rooted grandparent (the root
            // is black), so this unwrap is load-bearing on that invariant.
            let gp = self.node(p).parent.expect("red node must have a grandparent");
            let parent_is_left = self.node(gp).left == Some(p);
            let uncle = if parent_is_left {
                self.node(gp).right
            } else {
                self.node(gp).left
            };

            if self.color_of(uncle) == Color::Red {
                self.node_mut(p).color = Color::Black;
                self.node_mut(uncle.unwrap()).color = Color::Black;
                self.node_mut(gp).color = Color::Red;
                z = gp;
                continue;
            }

            if parent_is_left {
                if self.node(p).right == Some(z) {
                    z = p;
                    self.rotate_left(z);
                }
                let p = self.node(z).parent.unwrap();
                let gp = self.node(p).parent.unwrap();
                self.node_mut(p).color = Color::Black;
                self.node_mut(gp).color = Color::Red;
                self.rotate_right(gp);
            } else {
                if self.node(p).left == Some(z) {
                    z = p;
                    self.rotate_right(z);
                }
                let p = self.node(z).parent.unwrap();
                let gp = self.node(p).parent.unwrap();
                self.node_mut(p).color = Color::Black;
                self.node_mut(gp).color = Color::Red;
                self.rotate_left(gp);
            }
            break;
        }
        self.node_mut(self.root.unwrap()).color = Color::Black;
    }

    fn minimum(&self, mut id: NodeId) -> NodeId {
        while let Some(l) = self.node(id).left {
            id = l;
        }
        id
    }

    /// Replaces the subtree rooted at `u` with the subtree rooted at `v`
    /// (CLRS `RB-TRANSPLANT`). `v` may be a sentinel (`None`).
    fn transplant(&mut self, u: NodeId, v: Option<NodeId>) {
        let u_parent = self.node(u).parent;
        match u_parent {
            None => self.root = v,
            Some(p) if self.node(p).left == Some(u) => self.node_mut(p).left = v,
            Some(p) => self.node_mut(p).right = v,
        }
        if let Some(v) = v {
            self.node_mut(v).parent = u_parent;
        }
    }

    fn delete(&mut self, key: i64) -> bool {
        let Some(z) = self.find(key) else {
            return false;
        };

        let mut y = z;
        let mut y_original_color = self.node(y).color;
        // Tracked explicitly rather than re-derived from `parent.left == x`:
        // when `x` is a nil sentinel (`None`) and the parent's other child
        // is also absent, that pointer comparison cannot tell which side
        // `x` occupies.
        let x_and_parent: (Option<NodeId>, Option<NodeId>, bool);

        if self.node(z).left.is_none() {
            let x = self.node(z).right;
            let z_parent = self.node(z).parent;
            let z_is_left = z_parent.is_some_and(|p| self.node(p).left == Some(z));
            x_and_parent = (x, z_parent, z_is_left);
            self.transplant(z, x);
        } else if self.node(z).right.is_none() {
            let x = self.node(z).left;
            let z_parent = self.node(z).parent;
            let z_is_left = z_parent.is_some_and(|p| self.node(p).left == Some(z));
            x_and_parent = (x, z_parent, z_is_left);
            self.transplant(z, x);
        } else {
            y = self.minimum(self.node(z).right.unwrap());
            y_original_color = self.node(y).color;
            let x = self.node(y).right;
            let x_parent;
            let x_is_left;
            if self.node(y).parent == Some(z) {
                x_parent = Some(y);
                // `x` is always `y.right` here, so it sits in the right slot.
                x_is_left = false;
            } else {
                x_parent = self.node(y).parent;
                // `y` is the leftmost node of `z.right`'s subtree, so unless
                // `y` is itself `z.right` (the case above), `y` — and thus
                // `x` in its place — is always a left child.
                x_is_left = true;
                self.transplant(y, x);
                let z_right = self.node(z).right;
                self.node_mut(y).right = z_right;
                if let Some(zr) = z_right {
                    self.node_mut(zr).parent = Some(y);
                }
            }
            self.transplant(z, Some(y));
            let z_left = self.node(z).left;
            self.node_mut(y).left = z_left;
            if let Some(zl) = z_left {
                self.node_mut(zl).parent = Some(y);
            }
            self.node_mut(y).color = self.node(z).color;
            x_and_parent = (x, x_parent, x_is_left);
        }

        self.release(z);
        self.len -= 1;

        if y_original_color == Color::Black {
            self.delete_fixup(x_and_parent.0, x_and_parent.1, x_and_parent.2);
        }
        true
    }

    /// Iterative double-black rebalancing (CLRS `RB-DELETE-FIXUP`). `x` is
    /// the node that inherited the deficit (possibly a nil sentinel, in
    /// which case `x_parent`/`x_is_left` locate it since a nil node has no
    /// own pointer identity).
    fn delete_fixup(&mut self, mut x: Option<NodeId>, mut x_parent: Option<NodeId>, x_is_left: bool) {
        while x != self.root && self.color_of(x) == Color::Black {
            let Some(p) = x_parent else { break };
            let is_left = match x {
                Some(id) => self.node(p).left == Some(id),
                None => x_is_left,
            };
            let mut w = if is_left {
                self.node(p).right
            } else {
                self.node(p).left
            };

            if self.color_of(w) == Color::Red {
                self.node_mut(w.unwrap()).color = Color::Black;
                self.node_mut(p).color = Color::Red;
                if is_left {
                    self.rotate_left(p);
                } else {
                    self.rotate_right(p);
                }
                w = if is_left {
                    self.node(p).right
                } else {
                    self.node(p).left
                };
            }

            let w_id = w.expect("sibling of a double-black node cannot be nil");
            let w_left = self.node(w_id).left;
            let w_right = self.node(w_id).right;
            let (near, far) = if is_left {
                (w_left, w_right)
            } else {
                (w_right, w_left)
            };

            if self.color_of(near) == Color::Black && self.color_of(far) == Color::Black {
                self.node_mut(w_id).color = Color::Red;
                x = Some(p);
                x_parent = self.node(p).parent;
                continue;
            }

            if self.color_of(far) == Color::Black {
                if let Some(near_id) = near {
                    self.node_mut(near_id).color = Color::Black;
                }
                self.node_mut(w_id).color = Color::Red;
                if is_left {
                    self.rotate_right(w_id);
                } else {
                    self.rotate_left(w_id);
                }
                w = if is_left {
                    self.node(p).right
                } else {
                    self.node(p).left
                };
            }

            let w_id = w.expect("sibling must still exist after the near-case rotation");
            self.node_mut(w_id).color = self.node(p).color;
            self.node_mut(p).color = Color::Black;
            let far = if is_left {
                self.node(w_id).right
            } else {
                self.node(w_id).left
            };
            if let Some(far_id) = far {
                self.node_mut(far_id).color = Color::Black;
            }
            if is_left {
                self.rotate_left(p);
            } else {
                self.rotate_right(p);
            }
            x = self.root;
            x_parent = None;
        }
        if let Some(id) = x {
            self.node_mut(id).color = Color::Black;
        }
    }
}

/// A sorted map from `i64` keys to `i64` values, safe for concurrent use.
pub struct RbTreeMap {
    lock: RwLock,
    tree: UnsafeCell<Tree>,
}

// SAFETY: every access to `tree` happens only while `lock` is held as a
// reader (for lookups) or a writer (for mutation), so `&RbTreeMap` shared
// across threads never permits concurrent unsynchronized access to the
// `UnsafeCell`.
unsafe impl Send for RbTreeMap {}
unsafe impl Sync for RbTreeMap {}

struct ReadGuard<'a>(&'a RwLock);
impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        let _ = self.0.release_reader();
    }
}

struct WriteGuard<'a>(&'a RwLock);
impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        let _ = self.0.release_writer();
    }
}

impl Default for RbTreeMap {
    fn default() -> Self {
        Self::new()
    }
}

impl RbTreeMap {
    /// Starts empty.
    pub fn new() -> Self {
        RbTreeMap {
            lock: RwLock::new(),
            tree: UnsafeCell::new(Tree::new()),
        }
    }

    /// Inserts, or replaces the value of an existing key (keys are
    /// unique).
    pub fn put(&self, key: i64, value: i64) -> Result<()> {
        self.lock.acquire_writer()?;
        let _guard = WriteGuard(&self.lock);
        // SAFETY: the writer lock excludes every other reader and writer.
        unsafe { (*self.tree.get()).put(key, value) };
        Ok(())
    }

    /// Looks up `key`, returning its value if present.
    pub fn get(&self, key: i64) -> Result<Option<i64>> {
        self.lock.acquire_reader()?;
        let _guard = ReadGuard(&self.lock);
        // SAFETY: the reader lock only excludes concurrent writers; other
        // readers only ever read `Tree`, never mutate it.
        let tree = unsafe { &*self.tree.get() };
        Ok(tree.find(key).map(|id| tree.node(id).value))
    }

    /// Removes `key`, returning whether it was present.
    pub fn delete(&self, key: i64) -> Result<bool> {
        self.lock.acquire_writer()?;
        let _guard = WriteGuard(&self.lock);
        // SAFETY: see `put`.
        Ok(unsafe { (*self.tree.get()).delete(key) })
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> Result<usize> {
        self.lock.acquire_reader()?;
        let _guard = ReadGuard(&self.lock);
        Ok(unsafe { (*self.tree.get()).len })
    }

    /// `true` iff the map has no entries.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Walks the tree and confirms the invariants: the root is black, no
    /// red node has a red child, every root-to-nil path has the same
    /// black-node count, and an in-order walk yields strictly ascending
    /// keys.
    #[cfg(any(test, feature = "invariant-checks"))]
    pub fn check_invariants(&self) -> Result<bool> {
        self.lock.acquire_reader()?;
        let _guard = ReadGuard(&self.lock);
        let tree = unsafe { &*self.tree.get() };
        Ok(check_invariants_impl(tree))
    }
}

#[cfg(any(test, feature = "invariant-checks"))]
fn check_invariants_impl(tree: &Tree) -> bool {
    let Some(root) = tree.root else { return true };
    if tree.color_of(Some(root)) != Color::Black {
        return false;
    }

    // Iterative in-order walk: strictly ascending keys, and no red node
    // with a red child.
    let mut stack = Vec::new();
    let mut cur = Some(root);
    let mut last_key: Option<i64> = None;
    while cur.is_some() || !stack.is_empty() {
        while let Some(id) = cur {
            let node = tree.node(id);
            if node.color == Color::Red {
                if tree.color_of(node.left) == Color::Red || tree.color_of(node.right) == Color::Red {
                    return false;
                }
            }
            stack.push(id);
            cur = node.left;
        }
        let id = stack.pop().unwrap();
        let key = tree.node(id).key;
        if let Some(last) = last_key {
            if key <= last {
                return false;
            }
        }
        last_key = Some(key);
        cur = tree.node(id).right;
    }

    // Iterative black-height check via an explicit post-order-ish stack:
    // for each leaf (nil) path, count black nodes from root.
    fn black_height(tree: &Tree, id: Option<NodeId>) -> Option<i64> {
        let mut stack = vec![(id, 0i64)];
        let mut expected: Option<i64> = None;
        while let Some((cur, depth)) = stack.pop() {
            match cur {
                None => {
                    let d = depth + 1; // nil counts as black
                    match expected {
                        None => expected = Some(d),
                        Some(e) if e != d => return None,
                        _ => {}
                    }
                }
                Some(n) => {
                    let node = tree.node(n);
                    let d = depth + if node.color == Color::Black { 1 } else { 0 };
                    stack.push((node.left, d));
                    stack.push((node.right, d));
                }
            }
        }
        expected
    }
    black_height(tree, Some(root)).is_some()
}
