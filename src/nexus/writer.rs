//! Writer for minimal NEXUS documents: a taxa block and one tree.

use crate::nexus::defs::{
    BLOCK_BEGIN, BLOCK_END, DEFAULT_TREE_NAME, DIMENSIONS, NEXUS_HEADER, NTAX, ROOTED_COMMENT, TAXA,
    TAXLABELS, TREE, TREES,
};
use std::io;
use std::io::{BufWriter, Write};

// =#========================================================================#=
// NEXUS WRITER
// =#========================================================================$=
/// Buffered writer producing minimal NEXUS documents.
///
/// # Format Structure
/// ```text
/// #NEXUS
/// begin taxa;
/// dimensions ntax=<N>;
/// taxlabels
/// <label_1>
/// ...
/// <label_N>
/// ;
/// end;
/// begin trees;
/// tree TREE1 = [&R] <newick>
/// end;
/// ```
/// Labels and the Newick string are written verbatim, one per line,
/// every line newline-terminated.
///
/// # Example
/// ```
/// use phylotraits::nexus::NexusWriter;
///
/// let mut writer = NexusWriter::new(Vec::new());
/// writer.write_minimal(&["A".to_string(), "B".to_string()], "(A:1,B:1);").unwrap();
/// let text = String::from_utf8(writer.finish().unwrap()).unwrap();
/// assert!(text.starts_with("#NEXUS\nbegin taxa;\ndimensions ntax=2;\n"));
/// assert!(text.ends_with("tree TREE1 = [&R] (A:1,B:1);\nend;\n"));
/// ```
pub struct NexusWriter<W: Write> {
    bw: BufWriter<W>,
}

// ============================================================================
// API (public)
// ============================================================================
impl<W: Write> NexusWriter<W> {
    /// Creates a new NEXUS writer around `inner`, e.g. a [File](std::fs::File).
    pub fn new(inner: W) -> NexusWriter<W> {
        NexusWriter {
            bw: BufWriter::new(inner),
        }
    }

    /// Writes header, taxa block and a trees block holding `newick` as
    /// single rooted tree `TREE1`.
    ///
    /// # Errors
    /// Returns an I/O error if writing fails
    pub fn write_minimal(&mut self, taxa: &[String], newick: &str) -> io::Result<()> {
        self.header()?.taxa_block(taxa)?.trees_block(newick)?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        self.bw.into_inner().map_err(|e| e.into_error())
    }
}

// ============================================================================
// Nexus Block & Command Writing (private)
// ============================================================================
impl<W: Write> NexusWriter<W> {
    /// Writes "#NEXUS", returning itself for chaining.
    fn header(&mut self) -> io::Result<&mut Self> {
        self.write_all(NEXUS_HEADER)?.newline()
    }

    /// Writes the taxa block with one label per line.
    fn taxa_block(&mut self, taxa: &[String]) -> io::Result<&mut Self> {
        // "begin taxa;"
        self.write_all(BLOCK_BEGIN)?.space()?.write_all(TAXA)?.semicolon_ln()?;

        // "dimensions ntax=n;"
        self.write_all(DIMENSIONS)?
            .space()?
            .write_all(NTAX)?
            .equals()?
            .write_all(taxa.len().to_string().as_bytes())?
            .semicolon_ln()?;

        // "taxlabels", labels, ";"
        self.write_all(TAXLABELS)?.newline()?;
        for label in taxa {
            self.write_all(label.as_bytes())?.newline()?;
        }
        self.semicolon_ln()?;

        // "end;"
        self.write_all(BLOCK_END)?.newline()
    }

    /// Writes the trees block holding a single tree command.
    fn trees_block(&mut self, newick: &str) -> io::Result<&mut Self> {
        // "begin trees;"
        self.write_all(BLOCK_BEGIN)?.space()?.write_all(TREES)?.semicolon_ln()?;

        // "tree TREE1 = [&R] <newick>"
        self.write_all(TREE)?
            .space()?
            .write_all(DEFAULT_TREE_NAME)?
            .space()?
            .equals()?
            .space()?
            .write_all(ROOTED_COMMENT)?
            .space()?
            .write_all(newick.as_bytes())?
            .newline()?;

        self.write_all(BLOCK_END)?.newline()?;
        self.bw.flush()?;
        Ok(self)
    }
}

// ============================================================================
// Little Helpers (private)
// ============================================================================
impl<W: Write> NexusWriter<W> {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<&mut Self> {
        self.bw.write_all(buf)?;
        Ok(self)
    }

    fn space(&mut self) -> io::Result<&mut Self> {
        self.write_all(b" ")
    }

    fn newline(&mut self) -> io::Result<&mut Self> {
        self.write_all(b"\n")
    }

    fn semicolon_ln(&mut self) -> io::Result<&mut Self> {
        self.write_all(b";\n")
    }

    fn equals(&mut self) -> io::Result<&mut Self> {
        self.write_all(b"=")
    }
}
