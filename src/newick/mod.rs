//! Newick format reader and writer.
//!
//! # Quick API
//! * [`parse_str`] - parses a single Newick string, skipping annotations
//! * [`parse_str_with_annotations`] - same, but `[&key=value]` blocks become
//!   vertex traits
//! * [`read_tree`] - reads the first tree of a Newick file and sorts its
//!   branches (smaller clades first)
//! * [`read_trees`] - reads every tree of a Newick file
//! * [`to_newick`] / [`write_newick_file`] - serialization
//!
//! # Full API
//! Configure a [NewickParser] and feed it a [ByteParser].
//!
//! Normalized treesub output carries node identifiers as internal labels,
//! e.g. `((A:0.1,B:0.2)12:0.05,C:0.3);`, which this reader keeps as vertex
//! names so that [SideTable](crate::treesub::SideTable) rows can be joined
//! back onto the tree.

mod defs;
pub mod parser;
pub mod writer;

pub use parser::NewickParser;
pub use writer::{NewickStyle, to_newick, write_newick_file};

use crate::model::PhyloTree;
use crate::parser::byte_parser::ByteParser;
use crate::parser::{ParsingError, ParsingErrorType};
use std::path::Path;

/// Parses a single Newick string; comments and annotations are skipped.
///
/// # Example
/// ```
/// use phylotraits::newick::parse_str;
///
/// let tree = parse_str("((A:0.1,B:0.2)7:0.3,C:0.4);").unwrap();
/// assert_eq!(tree.num_leaves(), 3);
/// assert!(tree.find_by_name("7").is_some());
/// ```
pub fn parse_str<S: AsRef<str>>(newick: S) -> Result<PhyloTree, ParsingError> {
    let mut byte_parser = ByteParser::for_str(newick.as_ref());
    NewickParser::new_defaults().parse_str(&mut byte_parser)
}

/// Parses a single Newick string, storing `[&key=value,...]` annotations as
/// vertex traits.
pub fn parse_str_with_annotations<S: AsRef<str>>(newick: S) -> Result<PhyloTree, ParsingError> {
    let mut byte_parser = ByteParser::for_str(newick.as_ref());
    NewickParser::new_defaults()
        .with_annotations()
        .parse_str(&mut byte_parser)
}

/// Reads all trees of a Newick file.
pub fn read_trees<P: AsRef<Path>>(path: P) -> Result<Vec<PhyloTree>, ParsingError> {
    let mut byte_parser = ByteParser::for_file(path)?;
    NewickParser::new_defaults().parse_all(&mut byte_parser)
}

/// Reads the first tree of a Newick file and sorts its branches ascending
/// (see [PhyloTree::sort_branches]).
///
/// # Errors
/// IO errors, malformed Newick, or `MissingTree` if the file holds no tree.
pub fn read_tree<P: AsRef<Path>>(path: P) -> Result<PhyloTree, ParsingError> {
    let mut byte_parser = ByteParser::for_file(path)?;
    byte_parser.skip_comment_and_whitespace()?;
    if byte_parser.is_eof() {
        return Err(ParsingErrorType::MissingTree.into());
    }

    let mut tree = NewickParser::new_defaults().parse_str(&mut byte_parser)?;
    tree.sort_branches(false);
    log::debug!("Read tree with {} leaves", tree.num_leaves());
    Ok(tree)
}
