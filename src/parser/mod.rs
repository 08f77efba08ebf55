//! Low-level byte parsing shared by the Newick and NEXUS readers.
//!
//! * [ByteParser] walks over a [ByteSource](byte_source::ByteSource) with
//!   case-insensitive matching, comment skipping and label parsing.
//! * [ParsingError] reports what went wrong, where, and the bytes that follow.
//! * [utils] escapes and unescapes labels for writing.

pub mod byte_parser;
pub(crate) mod byte_source;
pub(crate) mod in_memory_byte_source;
pub mod parsing_error;
pub mod utils;

pub use byte_parser::ByteParser;
pub use parsing_error::{ParsingError, ParsingErrorType};
