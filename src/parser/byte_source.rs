//! Byte source abstraction used by [ByteParser](crate::parser::ByteParser).

// =#========================================================================#=
// BYTE SOURCE (Trait)
// =#========================================================================#=
/// Random-access view on the bytes a [ByteParser](crate::parser::ByteParser)
/// consumes.
///
/// The readers in this crate only ever handle single tree files, which are
/// loaded into memory as a whole
/// (see [InMemoryByteSource](crate::parser::in_memory_byte_source::InMemoryByteSource)).
/// The trait keeps the parser independent of that choice.
pub trait ByteSource {
    /// Returns the current byte without consuming it, `None` at EOF.
    fn peek(&self) -> Option<u8>;

    /// Returns the current byte and advances past it, `None` at EOF.
    fn next_byte(&mut self) -> Option<u8>;

    /// Returns up to `k` bytes starting at the current position.
    fn peek_slice(&self, k: usize) -> &[u8];

    /// Returns the current byte offset.
    fn position(&self) -> usize;

    /// Moves to the given byte offset.
    fn set_position(&mut self, pos: usize);

    /// Returns `true` once all bytes have been consumed.
    fn is_eof(&self) -> bool;
}
