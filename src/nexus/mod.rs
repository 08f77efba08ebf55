//! NEXUS reading and writing.
//!
//! This module provides:
//! - [NexusLoader] - loads the first tree of a NEXUS file, with tip names
//!   resolved through `translate` and tip dates as decimal years
//! - [NexusWriter] - writes minimal NEXUS documents (taxa block + one tree),
//!   the output format of the [treesub](crate::treesub) normalizer
//!
//! # Quick API
//! - [`load_nexus`] - dates read from tip names like `name|2020-07-01`
//! - [`read_dated_nexus`] - dates read as the last `delimiter` separated
//!   field of tip names, e.g. `name_2020-07-01`
//!
//! # Format
//! ```text
//! #NEXUS
//! begin taxa;
//!     dimensions ntax=2;
//!     taxlabels A_2020-01-01 B_2021-03-01;
//! end;
//! begin trees;
//!     translate 1 A_2020-01-01, 2 B_2021-03-01;
//!     tree TREE1 = [&R] (1:0.5,2:1.5);
//! end;
//! ```
//! ## Assumptions
//! * Keywords are case-insensitive, blocks other than `taxa` and `trees`
//!   are skipped, as are unknown commands
//! * Labels containing spaces or punctuation are single-quoted, `''` escaping `'`
//! * Only the first tree of the `trees` block is read

mod defs;
mod loader;
mod writer;

pub use self::defs::NexusBlock;
pub use self::loader::{DatedTree, LoadError, NexusLoader, TipDates};
pub use self::writer::NexusWriter;

use std::path::Path;

// ============================================================================
// QUICK LOADING API (public)
// ============================================================================
/// Loads a NEXUS file with default settings: tip dates matched by
/// `\|([0-9]+\-[0-9]+\-[0-9]+)`, branches sorted descending.
///
/// # Arguments
/// * `path` - Path to the file (accepting `&str`, `String`, `Path`, or `PathBuf`)
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or a matched
/// tip date cannot be converted.
pub fn load_nexus<P: AsRef<Path>>(path: P) -> Result<DatedTree, LoadError> {
    NexusLoader::for_file(path)?.load()
}

/// Loads a NEXUS file whose tip names end in a date after `delimiter`,
/// e.g. `'Kea_2020-07-01'`; branches are sorted ascending.
///
/// # Errors
/// As [load_nexus]; additionally every tip must carry a readable date.
pub fn read_dated_nexus<P: AsRef<Path>>(path: P, delimiter: &str) -> Result<DatedTree, LoadError> {
    NexusLoader::for_file(path)?
        .with_tip_dates(TipDates::Delimited(delimiter.to_string()))
        .with_sort_descending(false)
        .load()
}
