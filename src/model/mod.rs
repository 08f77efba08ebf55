//! Data model for rooted phylogenetic trees with per-vertex traits.
//!
//! # Tree representation
//! A [PhyloTree] stores its [Vertex] values in an arena and refers to them
//! by [VertexIndex]. Vertices may have any number of children, and both
//! leaves and internal vertices may carry a name (internal names are, for
//! example, the node identifiers left behind by
//! [treesub normalization](crate::treesub)).
//!
//! Every vertex owns its [Traits], a string-to-string map filled by the
//! functions in [crate::traits] or by annotation parsing. Nothing else
//! mutates them.
//!
//! # Building trees
//! Parsers drive a [TreeBuilder]; [PhyloTreeBuilder] is the implementation
//! producing [PhyloTree]s.

pub mod tree;
pub mod tree_builder;
pub mod vertex;

pub use tree::{PhyloTree, VertexIndex};
pub use tree_builder::{PhyloTreeBuilder, TreeBuilder};
pub use vertex::{BranchLength, BranchType, Traits, Vertex};
