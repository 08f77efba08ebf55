//! Constants for Newick parsing.

/// Newick label delimiters: brackets, comma, colon, semicolon, whitespace
pub(crate) const NEWICK_LABEL_DELIMITERS: &[u8] = b"([,:; \n\t\r)]";

/// Delimiters of a bare annotation value within `[&...]`
pub(crate) const ANNOTATION_VALUE_DELIMITERS: &[u8] = b",]";

/// Allocation hint for the number of vertices, when unknown
pub(crate) const DEFAULT_NUM_VERTICES_GUESS: usize = 32;
