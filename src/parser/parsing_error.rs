//! Error type for Newick and NEXUS parsing.
//!
//! A [ParsingError] pairs a [ParsingErrorType] with the byte offset where it
//! occurred and a snippet of the input that follows.

use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_source::ByteSource;
use thiserror::Error;

/// Number of upcoming bytes attached to an error as context.
const DEFAULT_CONTEXT_LENGTH: usize = 50;

// =#========================================================================#=
// PARSING ERROR TYPE
// =#========================================================================$=
/// What went wrong while parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingErrorType {
    #[error("IO error - {0}")]
    IoError(String),
    #[error("Unexpected end of file")]
    UnexpectedEOF,
    #[error("File does not start with #NEXUS header")]
    MissingNexusHeader,
    #[error("Invalid TAXA block - {0}")]
    InvalidTaxaBlock(String),
    #[error("Invalid TREES block - {0}")]
    InvalidTreesBlock(String),
    #[error("No tree statement found")]
    MissingTree,
    #[error("Unclosed comment")]
    UnclosedComment,
    #[error("Invalid newick string: {0}")]
    InvalidNewickString(String),
    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),
    #[error("Invalid formatting")]
    InvalidFormatting,
    #[error("Invalid tree structure - {0}")]
    InvalidTreeStructure(String),
}

// =#========================================================================#=
// PARSING ERROR
// =#========================================================================$=
/// Parsing error with position and the upcoming bytes as context.
#[derive(Error, Debug)]
#[error("{kind} at position {position}{}", format_context(.context))]
pub struct ParsingError {
    kind: ParsingErrorType,
    position: usize,
    context: String,
}

fn format_context(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!("\n  Context (next {} bytes): {}", context.len(), context)
    }
}

impl ParsingError {
    /// Creates an error of the given kind at the parser's current position.
    pub fn from_parser<S: ByteSource>(kind: ParsingErrorType, parser: &ByteParser<S>) -> Self {
        Self {
            kind,
            position: parser.position(),
            context: parser.get_context_as_string(DEFAULT_CONTEXT_LENGTH),
        }
    }

    /// Creates an error that is not tied to a parser position.
    pub fn without_context(kind: ParsingErrorType) -> Self {
        Self {
            kind,
            position: 0,
            context: String::new(),
        }
    }

    pub fn unexpected_eof<S: ByteSource>(parser: &ByteParser<S>) -> Self {
        Self::from_parser(ParsingErrorType::UnexpectedEOF, parser)
    }

    pub fn missing_nexus_header<S: ByteSource>(parser: &ByteParser<S>) -> Self {
        Self::from_parser(ParsingErrorType::MissingNexusHeader, parser)
    }

    pub fn invalid_taxa_block<S: ByteSource>(parser: &ByteParser<S>, msg: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidTaxaBlock(msg), parser)
    }

    pub fn invalid_trees_block<S: ByteSource>(parser: &ByteParser<S>, msg: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidTreesBlock(msg), parser)
    }

    pub fn unclosed_comment<S: ByteSource>(parser: &ByteParser<S>) -> Self {
        Self::from_parser(ParsingErrorType::UnclosedComment, parser)
    }

    pub fn invalid_newick_string<S: ByteSource>(parser: &ByteParser<S>, msg: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidNewickString(msg), parser)
    }

    pub fn invalid_annotation<S: ByteSource>(parser: &ByteParser<S>, msg: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidAnnotation(msg), parser)
    }

    pub fn invalid_formatting<S: ByteSource>(parser: &ByteParser<S>) -> Self {
        Self::from_parser(ParsingErrorType::InvalidFormatting, parser)
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &ParsingErrorType {
        &self.kind
    }

    /// Returns the byte offset at which the error occurred.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl From<std::io::Error> for ParsingError {
    fn from(err: std::io::Error) -> Self {
        ParsingError::without_context(ParsingErrorType::IoError(err.to_string()))
    }
}

impl From<ParsingErrorType> for ParsingError {
    fn from(kind: ParsingErrorType) -> Self {
        ParsingError::without_context(kind)
    }
}
