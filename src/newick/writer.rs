//! Newick serialization of [PhyloTree]s.

use crate::model::tree::{PhyloTree, VertexIndex};
use crate::model::vertex::Vertex;
use crate::parser::utils::escape_label;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Controls what gets written besides topology, labels and branch lengths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NewickStyle {
    /// Labels and branch lengths only
    #[default]
    Plain,
    /// Vertex traits are appended as `[&key="value",...]` blocks
    Annotated,
}

/// Returns the Newick representation of `tree`, terminated with `;`.
///
/// Labels are escaped where needed, internal labels are kept.
///
/// # Example
/// ```
/// use phylotraits::newick::{parse_str, to_newick, NewickStyle};
///
/// let tree = parse_str("((A:1,'B c':2)12:0.5,D:1.5);").unwrap();
/// assert_eq!(to_newick(&tree, NewickStyle::Plain), "((A:1,'B c':2)12:0.5,D:1.5);");
/// ```
pub fn to_newick(tree: &PhyloTree, style: NewickStyle) -> String {
    let mut newick = String::with_capacity(tree.num_vertices() * 12);
    if tree.is_root_set() {
        build_newick(tree, tree.root_index(), style, &mut newick);
    }
    newick.push(';');
    newick
}

/// Writes the given trees to `path`, one Newick string per line.
///
/// # Errors
/// Returns an I/O error if the file cannot be created or written.
pub fn write_newick_file<P: AsRef<Path>>(
    path: P,
    trees: &[PhyloTree],
    style: NewickStyle,
) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for tree in trees {
        writer.write_all(to_newick(tree, style).as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

fn build_newick(tree: &PhyloTree, index: VertexIndex, style: NewickStyle, newick: &mut String) {
    let vertex = &tree[index];

    if !vertex.is_leaf() {
        newick.push('(');
        for (i, &child) in vertex.children().iter().enumerate() {
            if i > 0 {
                newick.push(',');
            }
            build_newick(tree, child, style, newick);
        }
        newick.push(')');
    }

    if let Some(name) = vertex.name() {
        newick.push_str(&escape_label(name));
    }

    if style == NewickStyle::Annotated {
        push_annotations(vertex, newick);
    }

    if let Some(branch_length) = vertex.branch_length() {
        newick.push(':');
        newick.push_str(&(*branch_length).to_string());
    }
}

fn push_annotations(vertex: &Vertex, newick: &mut String) {
    if vertex.traits().is_empty() {
        return;
    }

    newick.push_str("[&");
    for (i, (key, value)) in vertex.traits().iter().enumerate() {
        if i > 0 {
            newick.push(',');
        }
        newick.push_str(key);
        newick.push_str("=\"");
        newick.push_str(&value.replace('"', "'"));
        newick.push('"');
    }
    newick.push(']');
}
