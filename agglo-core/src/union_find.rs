//! Union-find over dendrogram nodes.
//!
//! Drivers that record merges between original point indices rely on this
//! structure to translate each point into the node currently representing
//! its cluster. Every union creates a fresh node numbered after the points,
//! so roots are always dendrogram node labels.

/// Disjoint sets over the `2n - 1` nodes of a dendrogram on `n` points.
///
/// # Examples
/// ```
/// use agglo_core::UnionFind;
///
/// let mut sets = UnionFind::new(3);
/// assert_eq!(sets.union(0, 2), 3);
/// assert_eq!(sets.find(2), 3);
/// let root = sets.find(0);
/// assert_eq!(sets.union(root, 1), 4);
/// assert_eq!(sets.find(0), 4);
/// ```
#[derive(Clone, Debug)]
pub struct UnionFind {
    parent: Vec<usize>,
    next_node: usize,
}

impl UnionFind {
    /// Creates singleton sets for the points `0..n`.
    #[must_use]
    pub fn new(n: usize) -> Self {
        // Node 0 can never be a parent, so zero marks a root.
        Self {
            parent: vec![0; (2 * n).saturating_sub(1)],
            next_node: n,
        }
    }

    /// Returns the node representing the set containing `node`.
    pub fn find(&mut self, mut node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != 0 {
            root = self.parent[root];
        }

        while node != root {
            let parent = self.parent[node];
            self.parent[node] = root;
            node = parent;
        }

        root
    }

    /// Joins the sets rooted at `left` and `right` under a new node and
    /// returns its label.
    ///
    /// Both arguments must be roots.
    pub fn union(&mut self, left: usize, right: usize) -> usize {
        debug_assert!(left != right, "cannot join node {left} with itself");
        debug_assert!(
            self.parent[left] == 0 && self.parent[right] == 0,
            "union arguments must be roots"
        );
        let node = self.next_node;
        self.parent[left] = node;
        self.parent[right] = node;
        self.next_node += 1;
        node
    }
}
