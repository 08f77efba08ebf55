//! Trait for constructing trees during parsing.
//!
//! The [TreeBuilder] trait decouples the [Newick parser](crate::newick::NewickParser)
//! from the tree representation. The parser calls builder methods as it reads
//! vertices bottom-up, and the builder assembles its tree.
//!
//! # Builder lifecycle
//! ```text
//! Empty ──→ init_next() ──→ Building ──→ add_*/set_name ──→ finish_tree() ──→ Empty
//!   ↑                                                                           │
//!   └───────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::model::tree::{PhyloTree, VertexIndex};
use crate::model::vertex::BranchLength;
use crate::parser::{ParsingError, ParsingErrorType};

// =#========================================================================#=
// TREE BUILDER (trait)
// =#========================================================================#=
/// Abstraction for constructing trees during parsing.
///
/// The parser drives the lifecycle:
/// 1. [`init_next`](Self::init_next) - prepare for a new tree
/// 2. [`add_leaf`](Self::add_leaf), [`add_internal`](Self::add_internal),
///    [`add_annotation`](Self::add_annotation) - build structure bottom-up
/// 3. [`add_root`](Self::add_root) - attach the root
/// 4. [`set_name`](Self::set_name) - optionally name the tree
/// 5. [`finish_tree`](Self::finish_tree) - return the tree
pub trait TreeBuilder {
    /// The type used to identify vertices during construction.
    type VertexIdx: Copy;

    /// The tree type produced by this builder.
    type Tree;

    /// Prepares the builder for a new tree; `num_vertices` is an allocation hint.
    fn init_next(&mut self, num_vertices: usize);

    /// Adds a leaf with optional label and branch length.
    fn add_leaf(&mut self, name: Option<String>, branch_len: Option<f64>) -> Result<Self::VertexIdx, ParsingError>;

    /// Adds a non-root vertex with the given children.
    fn add_internal(
        &mut self,
        children: Vec<Self::VertexIdx>,
        name: Option<String>,
        branch_len: Option<f64>,
    ) -> Result<Self::VertexIdx, ParsingError>;

    /// Adds the root vertex, completing the structure.
    fn add_root(
        &mut self,
        children: Vec<Self::VertexIdx>,
        name: Option<String>,
        branch_len: Option<f64>,
    ) -> Result<Self::VertexIdx, ParsingError>;

    /// Attaches an annotation (`key=value` from a `[&...]` block) to a vertex.
    fn add_annotation(&mut self, vertex: Self::VertexIdx, key: String, value: String);

    /// Names the tree under construction.
    fn set_name(&mut self, tree_name: String);

    /// Returns the finished tree and resets the builder.
    ///
    /// # Errors
    /// `InvalidTreeStructure` if no root was added.
    fn finish_tree(&mut self) -> Result<Self::Tree, ParsingError>;
}

// =#========================================================================#=
// PHYLO TREE BUILDER
// =#========================================================================$=
/// [TreeBuilder] producing [PhyloTree]s; annotations become vertex traits.
#[derive(Debug, Default)]
pub struct PhyloTreeBuilder {
    tree: Option<PhyloTree>,
}

impl PhyloTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn tree_mut(&mut self) -> Result<&mut PhyloTree, ParsingError> {
        self.tree.as_mut().ok_or_else(|| {
            ParsingErrorType::InvalidTreeStructure(String::from("builder not initialized")).into()
        })
    }
}

/// Converts a parsed branch length, rejecting negative and non-finite values.
fn to_branch_length(branch_len: Option<f64>) -> Result<Option<BranchLength>, ParsingError> {
    match branch_len {
        None => Ok(None),
        Some(value) => BranchLength::try_new(value).map(Some).ok_or_else(|| {
            ParsingErrorType::InvalidNewickString(format!("Invalid branch length: {value}")).into()
        }),
    }
}

impl TreeBuilder for PhyloTreeBuilder {
    type VertexIdx = VertexIndex;
    type Tree = PhyloTree;

    fn init_next(&mut self, num_vertices: usize) {
        self.tree = Some(PhyloTree::with_capacity(num_vertices));
    }

    fn add_leaf(&mut self, name: Option<String>, branch_len: Option<f64>) -> Result<VertexIndex, ParsingError> {
        let branch_length = to_branch_length(branch_len)?;
        Ok(self.tree_mut()?.add_leaf(name, branch_length))
    }

    fn add_internal(
        &mut self,
        children: Vec<VertexIndex>,
        name: Option<String>,
        branch_len: Option<f64>,
    ) -> Result<VertexIndex, ParsingError> {
        let branch_length = to_branch_length(branch_len)?;
        Ok(self.tree_mut()?.add_internal(children, name, branch_length))
    }

    fn add_root(
        &mut self,
        children: Vec<VertexIndex>,
        name: Option<String>,
        branch_len: Option<f64>,
    ) -> Result<VertexIndex, ParsingError> {
        let index = self.add_internal(children, name, branch_len)?;
        self.tree_mut()?.set_root(index);
        Ok(index)
    }

    fn add_annotation(&mut self, vertex: VertexIndex, key: String, value: String) {
        if let Some(tree) = self.tree.as_mut() {
            tree[vertex].traits_mut().insert(key, value);
        }
    }

    fn set_name(&mut self, tree_name: String) {
        if let Some(tree) = self.tree.as_mut() {
            tree.set_name(tree_name);
        }
    }

    fn finish_tree(&mut self) -> Result<PhyloTree, ParsingError> {
        match self.tree.take() {
            Some(tree) if tree.is_root_set() => Ok(tree),
            _ => Err(ParsingErrorType::InvalidTreeStructure(String::from("no root added")).into()),
        }
    }
}
