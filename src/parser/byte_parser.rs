//! Byte-by-byte parser for the ASCII tree formats.
//!
//! [ByteParser] offers peeking, consuming and skipping with case-insensitive
//! keyword matching, bracket comment handling and quote-aware label parsing.
//! Both the Newick and the NEXUS readers are built on top of it.

use crate::parser::byte_source::ByteSource;
use crate::parser::in_memory_byte_source::InMemoryByteSource;
use crate::parser::parsing_error::ParsingError;
use std::path::Path;

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================$=
/// A byte-by-byte parser over a [ByteSource].
///
/// Keyword matching ([peek_is_sequence](Self::peek_is_sequence),
/// [consume_if_sequence](Self::consume_if_sequence)) ignores ASCII case, as
/// NEXUS keywords do. Comments are square-bracketed and may nest, which is
/// needed for annotation values such as `NONSYNSUBS="[A12T,G40C]"`.
///
/// # Example
/// ```
/// use phylotraits::parser::ByteParser;
///
/// let mut parser = ByteParser::for_str("  [&R] (A:1,B:2);");
/// parser.skip_comment_and_whitespace().unwrap();
/// assert_eq!(parser.peek(), Some(b'('));
/// ```
pub struct ByteParser<S: ByteSource> {
    source: S,
}

impl ByteParser<InMemoryByteSource> {
    /// Creates a parser over a copy of the given string.
    pub fn for_str(input: &str) -> Self {
        Self::new(InMemoryByteSource::from_vec(input.as_bytes().to_vec()))
    }

    /// Creates a parser over the full content of the file at `path`.
    pub fn for_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Ok(Self::new(InMemoryByteSource::from_file(path)?))
    }
}

// ============================================================================
// Peeking & consuming (pub)
// ============================================================================
impl<S: ByteSource> ByteParser<S> {
    /// Creates a new parser reading from `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Returns the current byte without consuming it.
    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.source.peek()
    }

    /// Consumes and returns the current byte.
    #[inline(always)]
    pub fn next_byte(&mut self) -> Option<u8> {
        self.source.next_byte()
    }

    /// Returns whether the current byte equals `ch`, ignoring ASCII case.
    pub fn peek_is(&self, ch: u8) -> bool {
        self.peek().is_some_and(|b| b.eq_ignore_ascii_case(&ch))
    }

    /// Returns whether the upcoming bytes equal `sequence`, ignoring ASCII case.
    ///
    /// Nothing is consumed.
    #[inline]
    pub fn peek_is_sequence(&self, sequence: &[u8]) -> bool {
        let upcoming = self.source.peek_slice(sequence.len());
        upcoming.len() == sequence.len() && upcoming.eq_ignore_ascii_case(sequence)
    }

    /// Consumes the current byte if it equals `ch` (ASCII case ignored).
    ///
    /// # Returns
    /// `true` if the byte matched and was consumed
    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek_is(ch) {
            self.next_byte();
            true
        } else {
            false
        }
    }

    /// Consumes the upcoming bytes if they equal `sequence` (ASCII case ignored).
    ///
    /// # Returns
    /// `true` if the sequence matched and was consumed
    pub fn consume_if_sequence(&mut self, sequence: &[u8]) -> bool {
        if !self.peek_is_sequence(sequence) {
            return false;
        }
        self.source.set_position(self.position() + sequence.len());
        true
    }

    /// Consumes bytes until `target` is found.
    ///
    /// # Arguments
    /// * `target` - Byte to stop at
    /// * `mode` - Whether `target` itself is consumed as well
    ///
    /// # Returns
    /// `true` if `target` was found, `false` if EOF was reached first
    pub fn consume_until(&mut self, target: u8, mode: ConsumeMode) -> bool {
        while let Some(b) = self.peek() {
            if b == target {
                if mode == ConsumeMode::Inclusive {
                    self.next_byte();
                }
                return true;
            }
            self.next_byte();
        }
        false
    }

    /// Consumes bytes until the upcoming bytes equal `sequence`
    /// (ASCII case ignored).
    ///
    /// # Returns
    /// `true` if `sequence` was found, `false` if EOF was reached first
    pub fn consume_until_sequence(&mut self, sequence: &[u8], mode: ConsumeMode) -> bool {
        while !self.is_eof() {
            if self.peek_is_sequence(sequence) {
                if mode == ConsumeMode::Inclusive {
                    self.consume_if_sequence(sequence);
                }
                return true;
            }
            self.next_byte();
        }
        false
    }

    /// Returns whether all input has been consumed.
    pub fn is_eof(&self) -> bool {
        self.source.is_eof()
    }

    /// Returns the current byte offset.
    pub fn position(&self) -> usize {
        self.source.position()
    }

    /// Returns up to `k` upcoming bytes as (lossy) string, used for error context.
    pub fn get_context_as_string(&self, k: usize) -> String {
        String::from_utf8_lossy(self.source.peek_slice(k)).into_owned()
    }
}

// ============================================================================
// Whitespace & comments (pub)
// ============================================================================
impl<S: ByteSource> ByteParser<S> {
    /// Consumes spaces, tabs, newlines and carriage returns.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.next_byte();
            } else {
                break;
            }
        }
    }

    /// Consumes a bracket comment `[...]` if one starts at the current position.
    ///
    /// Brackets inside a comment nest, and brackets within double-quoted
    /// text are ignored, so `[&S="[A1T]",N="2"]` is consumed as one comment.
    ///
    /// # Returns
    /// * `Ok(true)` - A comment was consumed
    /// * `Ok(false)` - No comment at the current position
    ///
    /// # Errors
    /// [ParsingError] of kind `UnclosedComment` if EOF is reached inside it.
    pub fn skip_comment(&mut self) -> Result<bool, ParsingError> {
        if self.peek() != Some(b'[') {
            return Ok(false);
        }
        let start = self.position();
        self.next_byte();

        let mut depth = 1;
        let mut in_quotes = false;
        while let Some(b) = self.next_byte() {
            match b {
                b'"' => in_quotes = !in_quotes,
                b'[' if !in_quotes => depth += 1,
                b']' if !in_quotes => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(true);
                    }
                }
                _ => {}
            }
        }

        self.source.set_position(start);
        Err(ParsingError::unclosed_comment(self))
    }

    /// Consumes any sequence of whitespace and bracket comments.
    ///
    /// # Errors
    /// Propagates an unclosed comment from [skip_comment](Self::skip_comment).
    pub fn skip_comment_and_whitespace(&mut self) -> Result<(), ParsingError> {
        self.skip_whitespace();
        while self.skip_comment()? {
            self.skip_whitespace();
        }
        Ok(())
    }
}

// ============================================================================
// Labels & values (pub)
// ============================================================================
impl<S: ByteSource> ByteParser<S> {
    /// Parses a quoted or unquoted label after skipping leading whitespace
    /// and comments.
    ///
    /// # Arguments
    /// * `delimiters` - Bytes that end an unquoted label
    ///
    /// # Errors
    /// Returns an error on an unclosed comment or quoted label.
    pub fn parse_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        self.skip_comment_and_whitespace()?;

        if self.peek() == Some(b'\'') {
            self.parse_quoted_label()
        } else {
            self.parse_unquoted_label(delimiters)
        }
    }

    /// Parses a label enclosed in single quotes, where `''` stands for `'`.
    ///
    /// Expects the parser at the opening quote.
    ///
    /// # Errors
    /// `UnexpectedEOF` if the closing quote is missing.
    pub fn parse_quoted_label(&mut self) -> Result<String, ParsingError> {
        self.next_byte(); // opening '

        let mut label = Vec::new();
        loop {
            match self.next_byte() {
                Some(b'\'') if self.peek() == Some(b'\'') => {
                    label.push(b'\'');
                    self.next_byte();
                }
                Some(b'\'') => break,
                Some(b) => label.push(b),
                None => return Err(ParsingError::unexpected_eof(self)),
            }
        }

        Ok(String::from_utf8_lossy(&label).into_owned())
    }

    /// Parses bytes up to (not including) the first delimiter or EOF.
    pub fn parse_unquoted_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        let mut label = Vec::new();
        while let Some(b) = self.peek() {
            if delimiters.contains(&b) {
                break;
            }
            label.push(b);
            self.next_byte();
        }

        Ok(String::from_utf8_lossy(&label).into_owned())
    }

    /// Parses an annotation value, which is either
    /// * double-quoted (`"[A1T,G2C]"`), returned without the quotes,
    /// * braced (`{0.1,0.4}`), returned with the braces,
    /// * or bare, ending at any of `delimiters`.
    ///
    /// # Errors
    /// `UnexpectedEOF` if a quote or brace is not closed.
    pub fn parse_annotation_value(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        match self.peek() {
            Some(b'"') => {
                self.next_byte();
                let start = self.position();
                if !self.consume_until(b'"', ConsumeMode::Exclusive) {
                    return Err(ParsingError::unexpected_eof(self));
                }
                let value = self.text_between(start, self.position());
                self.next_byte(); // closing "
                Ok(value)
            }
            Some(b'{') => {
                let start = self.position();
                if !self.consume_until(b'}', ConsumeMode::Inclusive) {
                    return Err(ParsingError::unexpected_eof(self));
                }
                Ok(self.text_between(start, self.position()))
            }
            _ => self.parse_unquoted_label(delimiters),
        }
    }

    /// Re-reads the bytes between two offsets, restoring the current position.
    fn text_between(&mut self, start: usize, end: usize) -> String {
        let current = self.position();
        self.source.set_position(start);
        let text = String::from_utf8_lossy(self.source.peek_slice(end - start)).into_owned();
        self.source.set_position(current);
        text
    }
}

/// Whether a `consume_until*` method also consumes its target.
///
/// ```
/// use phylotraits::parser::ByteParser;
/// use phylotraits::parser::byte_parser::ConsumeMode;
///
/// let mut parser = ByteParser::for_str("tree TREE1 = (A:1,B:1);");
/// parser.consume_until(b'=', ConsumeMode::Inclusive);
/// assert_eq!(parser.peek(), Some(b' '));
///
/// let mut parser = ByteParser::for_str("tree TREE1 = (A:1,B:1);");
/// parser.consume_until(b'=', ConsumeMode::Exclusive);
/// assert_eq!(parser.peek(), Some(b'='));
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConsumeMode {
    /// Consume the target as well; the parser ends up right after it.
    Inclusive,
    /// Stop in front of the target.
    Exclusive,
}
