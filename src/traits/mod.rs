//! Trait values for tree vertices.
//!
//! Leaf traits come from a [TraitTable], one row per sample, looked up by
//! leaf name ([assign_leaf_trait]). Internal vertices then inherit the value
//! shared by all their leaves ([assign_inode_traits]), which is what clade
//! colouring uses.

mod assign;
mod table;

pub use self::assign::{AssignmentReport, UNDEF, assign_inode_traits, assign_leaf_trait};
pub use self::table::TraitTable;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraitError {
    #[error("Cannot open trait table '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed trait table: {0}")]
    Csv(#[from] csv::Error),
    #[error("No column '{0}' in trait table")]
    UnknownColumn(String),
}
