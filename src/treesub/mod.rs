//! Normalizer for trees annotated by treesub.
//!
//! treesub maps substitutions onto the branches of a tree and writes a NEXUS
//! file whose tree string carries a `[&KEY="VALUE",...]` block before every
//! branch length. Standard Newick readers do not accept these blocks. The
//! [TreesubNormalizer] replaces each block by its `NUMBER`, writes a minimal
//! NEXUS file around the cleaned tree, and returns the extracted
//! `NONSYNSUBS` lists as a [SideTable] keyed by that number.
//!
//! ```text
//! in:   ((A:0.1,B:0.2)[&REALNAME="x",NUMBER="12",NONSYNSUBS="[A123T,G456C]"]:0.05,C:0.3);
//! out:  ((A:0.1,B:0.2)12:0.05,C:0.3);
//! row:  node_num=12  nonsynsubs=A123T,G456C
//! ```
//!
//! After reading the cleaned tree, e.g. with [load_nexus](crate::nexus::load_nexus),
//! [SideTable::assign_to_tree] joins the rows back onto the vertices.
//!
//! # Quick API
//! - [`normalize`] - default settings, returns the side table

pub mod annotation;
mod error;
mod normalizer;
mod side_table;

pub use self::error::{AnnotationWarning, MissingKey, NormalizeError};
pub use self::normalizer::{DuplicateBlocks, LeafBlocks, Normalized, TreePrefix, TreesubNormalizer};
pub use self::side_table::{NONSYN_COUNT_TRAIT, NONSYNSUBS_TRAIT, NodeRecord, SideTable};

use std::path::Path;

/// Normalizes the treesub NEXUS file `input` into `output` with default
/// settings and returns the side table.
///
/// # Errors
/// * [NormalizeError::MalformedInput] - no single `begin trees;` line with a
///   tree line after it, or no closed `taxlabels` block; `output` is not touched
/// * [NormalizeError::Io] - `input` unreadable or `output` unwritable
pub fn normalize<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<SideTable, NormalizeError> {
    let normalized = TreesubNormalizer::new().normalize_file(input, output)?;
    Ok(normalized.side_table)
}
