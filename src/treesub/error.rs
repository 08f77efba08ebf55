//! Errors and warnings of the treesub normalizer.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal failure of a normalization run; no output file is written.
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// Required structure (`begin trees;`, tree line, `taxlabels` ... `;`/`end;`)
    /// is missing or not as expected.
    #[error("Malformed treesub input: {0}")]
    MalformedInput(String),
    /// Reading the input or writing the output failed.
    #[error("I/O failure on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Reading or writing a side table CSV failed.
    #[error("Side table CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl NormalizeError {
    pub(crate) fn io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        NormalizeError::Io {
            path: path.into(),
            source,
        }
    }

    /// Kind of the underlying I/O failure, e.g. `NotFound` or
    /// `PermissionDenied`, if there is one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            NormalizeError::Io { source, .. } => Some(source.kind()),
            NormalizeError::Csv(error) => match error.kind() {
                csv::ErrorKind::Io(source) => Some(source.kind()),
                _ => None,
            },
            NormalizeError::MalformedInput(_) => None,
        }
    }
}

/// Key missing from an annotation block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingKey {
    Number,
}

/// Non-fatal problem with one annotation block. The block still yields a
/// side-table row, with the affected field left empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationWarning {
    /// Byte offset of the block's `[&` in the whitespace-free tree string
    pub position: usize,
    /// Full block text, `[&...]:`
    pub block: String,
    pub missing: MissingKey,
}

impl fmt::Display for AnnotationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.missing {
            MissingKey::Number => "NUMBER",
        };
        write!(f, "{key} not found for annotation block at {}: {}", self.position, self.block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_kind() {
        let error = NormalizeError::io("out/x.trees", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(error.io_kind(), Some(io::ErrorKind::PermissionDenied));
        assert!(error.to_string().contains("out/x.trees"));
        assert_eq!(NormalizeError::MalformedInput(String::from("x")).io_kind(), None);
    }
}
