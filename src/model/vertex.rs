//! Vertex and branch length types of a [PhyloTree](crate::model::PhyloTree).

use crate::model::tree::VertexIndex;
use std::collections::BTreeMap;
use std::ops::Deref;

/// Named metadata values attached to a vertex.
pub type Traits = BTreeMap<String, String>;

// =#========================================================================#=
// BRANCH TYPE
// =#========================================================================$=
/// Whether a vertex is an inner node or a leaf (tip).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchType {
    Node,
    Leaf,
}

// =#========================================================================#=
// VERTEX
// =#========================================================================$=
/// A vertex of a phylogenetic tree.
///
/// # Invariants
/// - `index` is the position of the vertex in the tree arena
/// - the root is the only vertex without `parent`
/// - a vertex without children is a leaf
/// - `branch_length`, if set, is non-negative and finite
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    index: VertexIndex,
    parent: Option<VertexIndex>,
    children: Vec<VertexIndex>,
    name: Option<String>,
    branch_length: Option<BranchLength>,
    traits: Traits,
}

impl Vertex {
    /// Creates a vertex without parent, children or traits.
    pub(crate) fn new(
        index: VertexIndex,
        name: Option<String>,
        branch_length: Option<BranchLength>,
    ) -> Self {
        Self {
            index,
            parent: None,
            children: Vec::new(),
            name,
            branch_length,
            traits: Traits::new(),
        }
    }

    pub fn index(&self) -> VertexIndex {
        self.index
    }

    pub fn parent(&self) -> Option<VertexIndex> {
        self.parent
    }

    /// Returns the children in drawing order.
    pub fn children(&self) -> &[VertexIndex] {
        &self.children
    }

    /// Returns the leaf label or internal label, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn branch_length(&self) -> Option<BranchLength> {
        self.branch_length
    }

    pub fn branch_type(&self) -> BranchType {
        if self.children.is_empty() {
            BranchType::Leaf
        } else {
            BranchType::Node
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns the traits of this vertex.
    pub fn traits(&self) -> &Traits {
        &self.traits
    }

    /// Returns the traits of this vertex for modification.
    pub fn traits_mut(&mut self) -> &mut Traits {
        &mut self.traits
    }

    /// Returns the value of trait `key`, if set.
    pub fn trait_value(&self, key: &str) -> Option<&str> {
        self.traits.get(key).map(String::as_str)
    }

    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub(crate) fn set_parent(&mut self, parent: VertexIndex) {
        self.parent = Some(parent);
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<VertexIndex> {
        &mut self.children
    }
}

// =#========================================================================#=
// BRANCH LENGTH
// =#========================================================================$=
/// Length of the branch between a vertex and its parent; non-negative and
/// finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchLength(f64);

impl BranchLength {
    /// Creates a new branch length.
    ///
    /// # Panics
    /// Panics if `length` is negative or not finite;
    /// use [try_new](Self::try_new) for unchecked input.
    pub fn new(length: f64) -> Self {
        Self::try_new(length)
            .unwrap_or_else(|| panic!("Branch length must be non-negative and finite, got {length}"))
    }

    /// Creates a new branch length, or `None` if `length` is negative or not finite.
    pub fn try_new(length: f64) -> Option<Self> {
        (length >= 0.0 && length.is_finite()).then_some(BranchLength(length))
    }
}

impl Deref for BranchLength {
    type Target = f64;
    fn deref(&self) -> &f64 {
        &self.0
    }
}
