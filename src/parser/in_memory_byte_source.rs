//! In-memory implementation of [ByteSource].

use crate::parser::byte_source::ByteSource;
use std::fs;
use std::path::Path;

// =#========================================================================#=
// IN MEMORY BYTE SOURCE
// =#========================================================================$=
/// A byte source owning the complete input.
pub struct InMemoryByteSource {
    input: Vec<u8>,
    pos: usize,
}

impl InMemoryByteSource {
    /// Wraps the given bytes, starting at offset 0.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            input: bytes,
            pos: 0,
        }
    }

    /// Reads the whole file at `path` into memory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Ok(Self::from_vec(fs::read(path)?))
    }
}

impl ByteSource for InMemoryByteSource {
    #[inline(always)]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline(always)]
    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    #[inline]
    fn peek_slice(&self, k: usize) -> &[u8] {
        let start = self.pos.min(self.input.len());
        let end = (start + k).min(self.input.len());
        &self.input[start..end]
    }

    #[inline]
    fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }
}
