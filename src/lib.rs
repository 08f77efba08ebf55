//! Phylotraits normalizes substitution-annotated NEXUS trees and carries
//! them through trait assignment, dating and drawing.
//!
//! Core functionality provided:
//! - Treesub: rewrite a NEXUS tree whose branches carry
//!   `[&NUMBER="12",NONSYNSUBS="[A123T]"]` annotations into a plain tree with
//!   bare node identifiers, plus a side table of the substitutions per node.
//!   See [crate::treesub].
//! - Newick: parse n-ary Newick strings with internal labels and optional
//!   annotations, and write them back. See [crate::newick].
//! - Nexus: load the first tree of a NEXUS file with its tip dates, and write
//!   minimal NEXUS files. See [crate::nexus].
//! - Traits: join a CSV table onto the leaves and propagate shared values to
//!   internal vertices. See [crate::traits].
//! - Dates: decimal-year conversion. See [crate::dates].
//! - Drawing: rectangular layout and SVG/PNG figures with coloured tips.
//!   See [crate::layout] and [crate::render].
//! - Tree model: an arena tree whose vertices own their trait maps, see
//!   [crate::model].
//!
//! # Usage patterns
//! Quick functions cover the common path; builders such as
//! [TreesubNormalizer](crate::treesub::TreesubNormalizer) and
//! [NexusLoader](crate::nexus::NexusLoader) expose the configuration.
//!
//! ## Example
//!
//! Normalize a treesub file, read the cleaned tree back and attach the
//! substitutions to it:
//! ```no_run
//! use phylotraits::{normalize_treesub, load_nexus};
//!
//! let side_table = normalize_treesub("substitutions.tree", "clean.trees")?;
//! let mut dated = load_nexus("clean.trees")?;
//! let joined = side_table.assign_to_tree(&mut dated.tree);
//! println!("{joined} of {} nodes carry substitutions", side_table.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Colour the tips of a tree by a trait from a table:
//! ```no_run
//! use phylotraits::newick::read_tree;
//! use phylotraits::render::{quick_draw_tree, DrawOptions};
//! use phylotraits::traits::{assign_leaf_trait, TraitTable};
//!
//! let mut tree = read_tree("tree.nwk")?;
//! let table = TraitTable::from_path("samples.csv")?;
//! assign_leaf_trait(&mut tree, &table, "strain", "host", None)?;
//!
//! let options = DrawOptions::default().with_colour_by("host");
//! quick_draw_tree(&tree, &options)?.save("tree.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod dates;
pub mod layout;
pub mod model;
pub mod newick;
pub mod nexus;
pub mod parser;
pub mod render;
pub mod traits;
pub mod treesub;

use crate::model::PhyloTree;
use crate::nexus::{DatedTree, LoadError};
use crate::parser::ParsingError;
use crate::treesub::{NormalizeError, SideTable};
use std::path::Path;

// ============================================================================
// Quick API
// ============================================================================
/// Normalizes a treesub NEXUS file with default settings, writing the cleaned
/// NEXUS file to `output` and returning the side table.
///
/// See [`treesub::normalize`] for full documentation.
pub fn normalize_treesub<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<SideTable, NormalizeError> {
    treesub::normalize(input, output)
}

/// Loads the first tree of a NEXUS file with tip dates taken from
/// `|yyyy-mm-dd` name suffixes.
///
/// See [`nexus::load_nexus`] for full documentation.
pub fn load_nexus<P: AsRef<Path>>(path: P) -> Result<DatedTree, LoadError> {
    nexus::load_nexus(path)
}

/// Parses a single Newick string using default settings.
///
/// See [`newick::parse_str`] for full documentation.
pub fn parse_newick_str<S: AsRef<str>>(newick: S) -> Result<PhyloTree, ParsingError> {
    newick::parse_str(newick)
}
