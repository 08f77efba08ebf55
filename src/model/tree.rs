//! Arena-based rooted tree with named vertices and per-vertex traits.
//!
//! - [PhyloTree]: the tree, storing all [Vertex] values in one vector
//! - [VertexIndex]: index of a vertex in that vector

use crate::model::vertex::{BranchLength, Vertex};
use std::collections::HashMap;

/// Index of a vertex in a tree (arena).
pub type VertexIndex = usize;

/// *During construction only*, index for unset root.
const NO_ROOT_SET_INDEX: VertexIndex = usize::MAX;

// =#========================================================================#=
// TREE
// =#========================================================================$=
/// A rooted phylogenetic tree represented using the arena pattern on [Vertex].
///
/// # Structure
/// - All vertices are stored in the arena and referenced by [VertexIndex]
/// - Vertices may have any number of children; their order is the drawing
///   order and can be changed with [sort_branches](Self::sort_branches)
/// - Any vertex may have a name; leaves are usually named
/// - Branch lengths are optional, but if provided must be non-negative
///
/// # Construction
/// Add leaves first, then internal vertices referring to already added
/// children, and finally mark the root with [set_root](Self::set_root).
/// Usually done by a [PhyloTreeBuilder](crate::model::PhyloTreeBuilder).
///
/// # Example
/// ```
/// use phylotraits::model::{BranchLength, PhyloTree};
///
/// // ((A:0.2,B:0.2)7:0.2,C:0.4);
/// let mut tree = PhyloTree::new();
/// let a = tree.add_leaf(Some("A".into()), Some(BranchLength::new(0.2)));
/// let b = tree.add_leaf(Some("B".into()), Some(BranchLength::new(0.2)));
/// let c = tree.add_leaf(Some("C".into()), Some(BranchLength::new(0.4)));
/// let ab = tree.add_internal(vec![a, b], Some("7".into()), Some(BranchLength::new(0.2)));
/// let root = tree.add_internal(vec![ab, c], None, None);
/// tree.set_root(root);
///
/// assert!(tree.is_valid());
/// assert_eq!(tree.num_leaves(), 3);
/// assert_eq!(tree.find_by_name("7"), Some(ab));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PhyloTree {
    vertices: Vec<Vertex>,
    root_index: Option<VertexIndex>,
    name: Option<String>,
}

// ============================================================================
// Construction, Getters (pub)
// ============================================================================
impl PhyloTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty tree with room for `num_vertices` vertices.
    pub fn with_capacity(num_vertices: usize) -> Self {
        PhyloTree {
            vertices: Vec::with_capacity(num_vertices),
            root_index: None,
            name: None,
        }
    }

    /// Adds a leaf and returns its index.
    pub fn add_leaf(
        &mut self,
        name: Option<String>,
        branch_length: Option<BranchLength>,
    ) -> VertexIndex {
        let index = self.vertices.len();
        self.vertices.push(Vertex::new(index, name, branch_length));
        index
    }

    /// Adds a vertex with the given (already added) children and returns
    /// its index. The children get their parent set accordingly.
    ///
    /// # Panics
    /// Panics if a child index is out of bounds.
    pub fn add_internal(
        &mut self,
        children: Vec<VertexIndex>,
        name: Option<String>,
        branch_length: Option<BranchLength>,
    ) -> VertexIndex {
        let index = self.vertices.len();
        for &child in &children {
            self.vertices[child].set_parent(index);
        }
        let mut vertex = Vertex::new(index, name, branch_length);
        *vertex.children_mut() = children;
        self.vertices.push(vertex);
        index
    }

    /// Marks the vertex at `index` as root.
    pub fn set_root(&mut self, index: VertexIndex) {
        self.root_index = Some(index);
    }

    /// Returns the name of this tree, e.g. `TREE1` when read from NEXUS.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    /// Returns whether the root has been set.
    pub fn is_root_set(&self) -> bool {
        self.root_index.is_some()
    }

    /// Returns the index of the root.
    ///
    /// # Panics
    /// Panics if the tree has not been fully constructed.
    pub fn root_index(&self) -> VertexIndex {
        self.root_index.unwrap_or(NO_ROOT_SET_INDEX)
    }

    /// Returns the root vertex.
    ///
    /// # Panics
    /// Panics if the tree has not been fully constructed.
    pub fn root(&self) -> &Vertex {
        &self[self.root_index()]
    }

    pub fn vertex(&self, index: VertexIndex) -> &Vertex {
        &self.vertices[index]
    }

    /// Returns all vertices in arena order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_leaf()).count()
    }

    /// Returns the leaf indices in pre-order, i.e. top to bottom as drawn.
    pub fn leaf_indices(&self) -> Vec<VertexIndex> {
        self.pre_order_iter()
            .filter(|v| v.is_leaf())
            .map(Vertex::index)
            .collect()
    }

    /// Returns the indices of all non-leaf vertices (root included) in pre-order.
    pub fn internal_indices(&self) -> Vec<VertexIndex> {
        self.pre_order_iter()
            .filter(|v| !v.is_leaf())
            .map(Vertex::index)
            .collect()
    }

    /// Returns the leaves in the subtree rooted at `index`, in pre-order.
    pub fn leaves_under(&self, index: VertexIndex) -> Vec<VertexIndex> {
        PreOrderIter::from(self, index)
            .filter(|v| v.is_leaf())
            .map(Vertex::index)
            .collect()
    }

    /// Returns the first vertex (in arena order) named `name`.
    pub fn find_by_name(&self, name: &str) -> Option<VertexIndex> {
        self.vertices
            .iter()
            .find(|v| v.name() == Some(name))
            .map(Vertex::index)
    }
}

impl std::ops::Index<VertexIndex> for PhyloTree {
    type Output = Vertex;

    fn index(&self, index: VertexIndex) -> &Self::Output {
        &self.vertices[index]
    }
}

impl std::ops::IndexMut<VertexIndex> for PhyloTree {
    fn index_mut(&mut self, index: VertexIndex) -> &mut Self::Output {
        &mut self.vertices[index]
    }
}

// ============================================================================
// Distances, Renaming, Sorting (pub)
// ============================================================================
impl PhyloTree {
    /// Returns the distance from the root for every vertex, indexed by
    /// [VertexIndex]. Missing branch lengths count as zero.
    pub fn heights(&self) -> Vec<f64> {
        let mut heights = vec![0.0; self.num_vertices()];
        for vertex in self.pre_order_iter() {
            if let Some(parent) = vertex.parent() {
                let length = vertex.branch_length().map_or(0.0, |bl| *bl);
                heights[vertex.index()] = heights[parent] + length;
            }
        }
        heights
    }

    /// Returns the distance from the root to the vertex at `index`.
    pub fn height_of(&self, index: VertexIndex) -> f64 {
        let mut height = 0.0;
        let mut current = &self[index];
        while let Some(parent) = current.parent() {
            height += current.branch_length().map_or(0.0, |bl| *bl);
            current = &self[parent];
        }
        height
    }

    /// Returns the largest root-to-leaf distance.
    pub fn tree_height(&self) -> f64 {
        let heights = self.heights();
        self.vertices
            .iter()
            .filter(|v| v.is_leaf())
            .map(|v| heights[v.index()])
            .fold(0.0, f64::max)
    }

    /// Sum of all branch lengths.
    pub fn total_branch_length(&self) -> f64 {
        self.vertices
            .iter()
            .filter_map(Vertex::branch_length)
            .map(|bl| *bl)
            .sum()
    }

    /// Renames leaves whose current name is a key of `map`.
    ///
    /// # Returns
    /// Number of renamed leaves
    pub fn rename_leaves(&mut self, map: &HashMap<String, String>) -> usize {
        let mut renamed = 0;
        for vertex in self.vertices.iter_mut().filter(|v| v.is_leaf()) {
            let new_name = vertex.name().and_then(|name| map.get(name)).cloned();
            if let Some(new_name) = new_name {
                vertex.set_name(new_name);
                renamed += 1;
            }
        }
        renamed
    }

    /// Reorders the children of every vertex by the number of leaves below
    /// them (ladderizing), largest first if `descending`.
    /// Children with equal counts keep their relative order.
    pub fn sort_branches(&mut self, descending: bool) {
        let mut leaf_counts = vec![0usize; self.num_vertices()];
        let order: Vec<VertexIndex> = self.post_order_iter().map(Vertex::index).collect();
        for index in order {
            let vertex = &self.vertices[index];
            leaf_counts[index] = if vertex.is_leaf() {
                1
            } else {
                vertex.children().iter().map(|&c| leaf_counts[c]).sum()
            };

            let children = self.vertices[index].children_mut();
            if descending {
                children.sort_by(|a, b| leaf_counts[*b].cmp(&leaf_counts[*a]));
            } else {
                children.sort_by_key(|c| leaf_counts[*c]);
            }
        }
    }

    /// Validates the tree structure and all index references.
    ///
    /// Checks:
    /// - Root is set, in bounds and without parent
    /// - All vertex indices match their position in the arena
    /// - All children point back to their parent, and vice versa
    /// - Every vertex is reachable from the root
    pub fn is_valid(&self) -> bool {
        let Some(root) = self.root_index else {
            return false;
        };
        if root >= self.vertices.len() || !self.vertices[root].is_root() {
            return false;
        }

        for (index, vertex) in self.vertices.iter().enumerate() {
            if vertex.index() != index {
                return false;
            }

            for &child in vertex.children() {
                if child >= self.vertices.len() || self.vertices[child].parent() != Some(index) {
                    return false;
                }
            }

            match vertex.parent() {
                None if index != root => return false,
                Some(parent) => {
                    if parent >= self.vertices.len()
                        || !self.vertices[parent].children().contains(&index)
                    {
                        return false;
                    }
                }
                None => {}
            }
        }

        self.pre_order_iter().count() == self.vertices.len()
    }
}

// ============================================================================
// Traversal (pub)
// ============================================================================
impl PhyloTree {
    /// Returns an iterator in post-order (children before parents).
    ///
    /// ```
    /// use phylotraits::newick::parse_str;
    ///
    /// let tree = parse_str("((A,B)x,C)r;").unwrap();
    /// let names: Vec<_> = tree.post_order_iter().filter_map(|v| v.name()).collect();
    /// assert_eq!(names, vec!["A", "B", "x", "C", "r"]);
    /// ```
    pub fn post_order_iter(&self) -> PostOrderIter<'_> {
        PostOrderIter::new(self)
    }

    /// Returns an iterator in pre-order (parents before children).
    ///
    /// ```
    /// use phylotraits::newick::parse_str;
    ///
    /// let tree = parse_str("((A,B)x,C)r;").unwrap();
    /// let names: Vec<_> = tree.pre_order_iter().filter_map(|v| v.name()).collect();
    /// assert_eq!(names, vec!["r", "x", "A", "B", "C"]);
    /// ```
    pub fn pre_order_iter(&self) -> PreOrderIter<'_> {
        match self.root_index {
            Some(root) => PreOrderIter::from(self, root),
            None => PreOrderIter {
                tree: self,
                stack: Vec::new(),
            },
        }
    }
}

/// Stack-based post-order iterator, created by [PhyloTree::post_order_iter].
pub struct PostOrderIter<'a> {
    tree: &'a PhyloTree,
    stack: Vec<(VertexIndex, bool)>, // (index, children_visited)
}

impl<'a> PostOrderIter<'a> {
    fn new(tree: &'a PhyloTree) -> Self {
        let stack = tree.root_index.map(|root| vec![(root, false)]).unwrap_or_default();
        PostOrderIter { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = &'a Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, children_visited)) = self.stack.pop() {
            let vertex = &self.tree[index];
            if children_visited || vertex.is_leaf() {
                return Some(vertex);
            }

            self.stack.push((index, true));
            // Reversed, so the first child is visited first
            for &child in vertex.children().iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}

/// Stack-based pre-order iterator, created by [PhyloTree::pre_order_iter].
pub struct PreOrderIter<'a> {
    tree: &'a PhyloTree,
    stack: Vec<VertexIndex>,
}

impl<'a> PreOrderIter<'a> {
    fn from(tree: &'a PhyloTree, start: VertexIndex) -> Self {
        PreOrderIter {
            tree,
            stack: vec![start],
        }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = &'a Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let vertex = &self.tree[index];
        for &child in vertex.children().iter().rev() {
            self.stack.push(child);
        }
        Some(vertex)
    }
}
