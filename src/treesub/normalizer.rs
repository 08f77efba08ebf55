//! Conversion of treesub NEXUS output into minimal NEXUS plus a side table.

use crate::nexus::NexusWriter;
use crate::treesub::annotation::{self, AnnotationBlock};
use crate::treesub::error::{AnnotationWarning, MissingKey, NormalizeError};
use crate::treesub::side_table::{NodeRecord, SideTable};
use std::collections::HashSet;
use std::fs;
use std::fs::File;
use std::path::Path;

/// Line opening the trees block; the tree statement follows on the next line.
const TREES_MARKER: &str = "begin trees;";
const TAXLABELS_MARKER: &str = "taxlabels";
const TAXA_CLOSE: &str = ";";
const BLOCK_CLOSE: &str = "end;";

/// Start of an annotation block, or of an annotation suffix on a taxon line
const ANNOTATION_START: &str = "[&";

const PREVIEW_LINES: usize = 10;
const PREVIEW_TREE_CHARS: usize = 50;

/// What precedes the Newick string on the tree line (after whitespace removal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreePrefix {
    /// Exact text to strip; the line must start with it.
    /// Whitespace in the prefix is ignored.
    Literal(String),
    /// Everything up to the first `=`, followed by an optional
    /// `[&R]`/`[&U]` rooting comment.
    Statement,
}

impl Default for TreePrefix {
    /// `treetree_1=[&R]`, i.e. `tree tree_1 = [&R]` as treesub writes it.
    fn default() -> Self {
        TreePrefix::Literal(String::from("treetree_1=[&R]"))
    }
}

/// Side-table rows for byte-identical annotation blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateBlocks {
    /// One row per distinct block text.
    #[default]
    Collapse,
    /// One row per block occurrence.
    PerOccurrence,
}

/// Replacement of blocks that directly follow a leaf label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LeafBlocks {
    /// Removed, leaving the taxon label untouched. Rows are still recorded.
    #[default]
    Strip,
    /// Replaced by their `NUMBER`, like blocks on internal branches. The
    /// number is glued onto the taxon label.
    Identifier,
}

/// Result of a normalization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Taxon labels in input order
    pub taxa: Vec<String>,
    /// Newick string without annotation blocks, including its `;`
    pub tree_string: String,
    pub side_table: SideTable,
    /// One entry per recorded row whose block lacked `NUMBER`
    pub warnings: Vec<AnnotationWarning>,
}

impl Normalized {
    /// The minimal NEXUS document as text.
    pub fn to_nexus_string(&self) -> String {
        let mut writer = NexusWriter::new(Vec::new());
        writer
            .write_minimal(&self.taxa, &self.tree_string)
            .and_then(|_| writer.finish())
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }

    /// The lines of the minimal NEXUS document, without line terminators.
    pub fn to_nexus_lines(&self) -> Vec<String> {
        self.to_nexus_string().lines().map(String::from).collect()
    }

    /// Writes the minimal NEXUS document to `path`, replacing existing content.
    ///
    /// # Errors
    /// [NormalizeError::Io] if the file cannot be created or written.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), NormalizeError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| NormalizeError::io(path, e))?;
        let mut writer = NexusWriter::new(file);
        writer
            .write_minimal(&self.taxa, &self.tree_string)
            .and_then(|_| writer.finish())
            .map_err(|e| NormalizeError::io(path, e))?;
        Ok(())
    }
}

// =#========================================================================#=
// TREESUB NORMALIZER
// =#========================================================================$=
/// Converts treesub output into a minimal NEXUS file and a [SideTable].
///
/// Each annotation block `[&...,NUMBER="12",NONSYNSUBS="[A123T]",...]:`
/// on an internal branch becomes `12:`, and yields a row `(12, A123T)`.
/// Blocks after leaf labels are removed by default (see [LeafBlocks]), so
/// the tree keeps the taxon labels of the taxa block.
///
/// # Input structure
/// * a line `taxlabels`, then one taxon per line (text before `[&`),
///   closed by a line `;` directly followed by a line `end;`
/// * exactly one line `begin trees;`, directly followed by the tree line
///
/// Lines are compared after trimming; markers are case-sensitive.
///
/// # Example
/// ```
/// use phylotraits::treesub::TreesubNormalizer;
///
/// let input = "#NEXUS\nbegin taxa;\ndimensions ntax=2;\ntaxlabels\nA[&NUMBER=\"1\"]\nB\n;\nend;\n\
///              begin trees;\n\
///              tree tree_1 = [&R] (A:0.1,B:0.2)[&NUMBER=\"3\",NONSYNSUBS=\"[G5T]\"]:0.0;\n\
///              end;\n";
/// let normalized = TreesubNormalizer::new().with_preview(false).normalize_str(input).unwrap();
/// assert_eq!(normalized.taxa, vec!["A", "B"]);
/// assert_eq!(normalized.tree_string, "(A:0.1,B:0.2)3:0.0;");
/// assert_eq!(normalized.side_table.get("3").unwrap().nonsynsubs, "G5T");
/// ```
#[derive(Debug, Clone)]
pub struct TreesubNormalizer {
    tree_prefix: TreePrefix,
    duplicates: DuplicateBlocks,
    leaf_blocks: LeafBlocks,
    preview: bool,
}

impl Default for TreesubNormalizer {
    fn default() -> Self {
        Self {
            tree_prefix: TreePrefix::default(),
            duplicates: DuplicateBlocks::default(),
            leaf_blocks: LeafBlocks::default(),
            preview: true,
        }
    }
}

// ============================================================================
// Construction & Configuration (pub)
// ============================================================================
impl TreesubNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tree_prefix(mut self, tree_prefix: TreePrefix) -> Self {
        self.tree_prefix = tree_prefix;
        self
    }

    pub fn with_duplicate_policy(mut self, duplicates: DuplicateBlocks) -> Self {
        self.duplicates = duplicates;
        self
    }

    pub fn with_leaf_blocks(mut self, leaf_blocks: LeafBlocks) -> Self {
        self.leaf_blocks = leaf_blocks;
        self
    }

    /// Whether [normalize_file](Self::normalize_file) logs a preview of the
    /// written document (default `true`).
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }
}

// ============================================================================
// Normalization (pub)
// ============================================================================
impl TreesubNormalizer {
    /// Normalizes the text of a treesub NEXUS file.
    ///
    /// # Errors
    /// [NormalizeError::MalformedInput] if the tree line or taxa block
    /// cannot be located.
    pub fn normalize_str(&self, input: &str) -> Result<Normalized, NormalizeError> {
        let lines: Vec<&str> = input.lines().map(str::trim).collect();

        let tree_line = find_tree_line(&lines)?;
        let tree = self.strip_tree_prefix(tree_line)?;
        let taxa = find_taxa(&lines)?;

        let blocks = annotation::find_blocks(&tree);
        log::debug!("Found {} annotation blocks", blocks.len());
        let (tree_string, side_table, warnings) = self.replace_blocks(&tree, &blocks);
        if let Some(position) = tree_string.find(ANNOTATION_START) {
            log::warn!("Unclosed annotation block left in tree string at {position}");
        }

        Ok(Normalized {
            taxa,
            tree_string,
            side_table,
            warnings,
        })
    }

    /// Reads `input`, writes the minimal NEXUS document to `output` and
    /// returns the result.
    ///
    /// Nothing is written if the input is malformed.
    ///
    /// # Errors
    /// * [NormalizeError::Io] - `input` unreadable or `output` unwritable
    /// * [NormalizeError::MalformedInput] - see [normalize_str](Self::normalize_str)
    pub fn normalize_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<Normalized, NormalizeError> {
        let input = input.as_ref();
        let output = output.as_ref();

        let text = fs::read_to_string(input).map_err(|e| NormalizeError::io(input, e))?;
        let normalized = self.normalize_str(&text)?;
        normalized.write_to(output)?;

        if self.preview {
            log_preview(&normalized, output);
        }
        Ok(normalized)
    }
}

// ============================================================================
// Helpers (private)
// ============================================================================
impl TreesubNormalizer {
    /// Removes all whitespace and the configured prefix from the tree line.
    fn strip_tree_prefix(&self, tree_line: &str) -> Result<String, NormalizeError> {
        let compact: String = tree_line.chars().filter(|c| !c.is_whitespace()).collect();

        let stripped = match &self.tree_prefix {
            TreePrefix::Literal(prefix) => {
                let prefix: String = prefix.chars().filter(|c| !c.is_whitespace()).collect();
                compact.strip_prefix(prefix.as_str()).ok_or_else(|| {
                    NormalizeError::MalformedInput(format!(
                        "tree line does not start with '{prefix}'"
                    ))
                })?
            }
            TreePrefix::Statement => {
                let (_, rest) = compact.split_once('=').ok_or_else(|| {
                    NormalizeError::MalformedInput(String::from("tree line has no '='"))
                })?;
                ["[&R]", "[&U]", "[&r]", "[&u]"]
                    .iter()
                    .find_map(|comment| rest.strip_prefix(comment))
                    .unwrap_or(rest)
            }
        };

        if stripped.is_empty() {
            return Err(NormalizeError::MalformedInput(String::from("tree string is empty")));
        }
        Ok(stripped.to_string())
    }

    /// Replaces every block by its `NUMBER` (or nothing, for stripped leaf
    /// blocks), keeping the `:`, and records the side-table rows.
    fn replace_blocks(
        &self,
        tree: &str,
        blocks: &[AnnotationBlock<'_>],
    ) -> (String, SideTable, Vec<AnnotationWarning>) {
        let mut cleaned = String::with_capacity(tree.len());
        let mut side_table = SideTable::new();
        let mut warnings = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        let mut last = 0;
        for block in blocks {
            cleaned.push_str(&tree[last..block.start]);
            let number = block.node_number();

            let record_row = match self.duplicates {
                DuplicateBlocks::Collapse => seen.insert(block.text),
                DuplicateBlocks::PerOccurrence => true,
            };
            if record_row {
                if number.is_none() {
                    let warning = AnnotationWarning {
                        position: block.start,
                        block: block.text.to_string(),
                        missing: MissingKey::Number,
                    };
                    log::warn!("{warning}");
                    warnings.push(warning);
                }
                side_table.push(NodeRecord {
                    node_num: number.unwrap_or_default().to_string(),
                    nonsynsubs: block.substitutions(),
                });
            }

            if !(block.on_leaf && self.leaf_blocks == LeafBlocks::Strip) {
                cleaned.push_str(number.unwrap_or_default());
            }
            cleaned.push(':');
            last = block.end;
        }
        cleaned.push_str(&tree[last..]);

        (cleaned, side_table, warnings)
    }
}

/// Returns the line after the only `begin trees;` line.
fn find_tree_line<'a>(lines: &[&'a str]) -> Result<&'a str, NormalizeError> {
    let markers: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| **line == TREES_MARKER)
        .map(|(i, _)| i)
        .collect();

    let marker = match markers.as_slice() {
        [] => {
            return Err(NormalizeError::MalformedInput(format!(
                "no '{TREES_MARKER}' line"
            )));
        }
        [marker] => *marker,
        _ => {
            return Err(NormalizeError::MalformedInput(format!(
                "{} '{TREES_MARKER}' lines, expected one",
                markers.len()
            )));
        }
    };

    match lines.get(marker + 1) {
        Some(line) if !line.is_empty() => Ok(*line),
        _ => Err(NormalizeError::MalformedInput(format!(
            "no tree statement on the line after '{TREES_MARKER}'"
        ))),
    }
}

/// Returns the taxon labels between `taxlabels` and the closing `;`/`end;` lines.
fn find_taxa(lines: &[&str]) -> Result<Vec<String>, NormalizeError> {
    let start = lines
        .iter()
        .position(|line| *line == TAXLABELS_MARKER)
        .ok_or_else(|| NormalizeError::MalformedInput(format!("no '{TAXLABELS_MARKER}' line")))?;

    let end = (start + 1..lines.len())
        .find(|&i| lines[i] == TAXA_CLOSE && lines.get(i + 1) == Some(&BLOCK_CLOSE))
        .ok_or_else(|| {
            NormalizeError::MalformedInput(format!(
                "taxa block not closed by '{TAXA_CLOSE}' and '{BLOCK_CLOSE}'"
            ))
        })?;

    Ok(lines[start + 1..end]
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| match line.find(ANNOTATION_START) {
            Some(i) => line[..i].to_string(),
            None => line.to_string(),
        })
        .collect())
}

/// Logs the head of the document, its trees block with the tree line
/// shortened, and the destination.
fn log_preview(normalized: &Normalized, output: &Path) {
    let lines = normalized.to_nexus_lines();
    for line in lines.iter().take(PREVIEW_LINES) {
        log::info!("{line}");
    }
    log::info!("...");

    // trees block: "begin trees;", tree line, "end;"
    let tree_block = lines.len().saturating_sub(3);
    for (i, line) in lines.iter().enumerate().skip(tree_block) {
        if i == tree_block + 1 {
            let shortened: String = line.chars().take(PREVIEW_TREE_CHARS).collect();
            log::info!("{shortened}...");
        } else {
            log::info!("{line}");
        }
    }
    log::info!("Written out to file {}", output.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(taxa: &[&str], tree_line: &str) -> String {
        let mut text = String::from("#NEXUS\n\nbegin taxa;\n\tdimensions ntax=3;\n\ttaxlabels\n");
        for taxon in taxa {
            text.push_str(&format!("\t\t{taxon}\n"));
        }
        text.push_str("\t;\nend;\n\nbegin trees;\n");
        text.push_str(tree_line);
        text.push_str("\nend;\n");
        text
    }

    fn normalizer() -> TreesubNormalizer {
        TreesubNormalizer::new().with_preview(false)
    }

    const TREE_LINE: &str = r#"  tree tree_1 = [&R] ((Kea:0.1,Kaka:0.2)[&REALNAME="n4",NUMBER="4",NONSYNSUBS="[A12T,G40C]",SYNSUBS="[C9T]"]:0.05,Kakapo:0.3)[&NUMBER="5"]:0.0;"#;

    #[test]
    fn test_basic() {
        let input = document(&["Kea[&NUMBER=\"1\"]", "Kaka", "Kakapo"], TREE_LINE);
        let normalized = normalizer().normalize_str(&input).unwrap();

        assert_eq!(normalized.taxa, vec!["Kea", "Kaka", "Kakapo"]);
        assert_eq!(normalized.tree_string, "((Kea:0.1,Kaka:0.2)4:0.05,Kakapo:0.3)5:0.0;");
        assert_eq!(normalized.side_table.len(), 2);
        assert_eq!(normalized.side_table.records()[0].node_num, "4");
        assert_eq!(normalized.side_table.records()[0].nonsynsubs, "A12T,G40C");
        assert_eq!(normalized.side_table.records()[1].nonsynsubs, "*");
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn test_missing_number_is_tolerated() {
        let line = r#"tree tree_1 = [&R] ((A:1,B:1)[&NONSYNSUBS="[A1T]"]:1,C:1)[&NUMBER="2"]:0;"#;
        let normalized = normalizer().normalize_str(&document(&["A", "B", "C"], line)).unwrap();

        assert_eq!(normalized.tree_string, "((A:1,B:1):1,C:1)2:0;");
        assert_eq!(normalized.warnings.len(), 1);
        assert_eq!(normalized.warnings[0].missing, MissingKey::Number);
        assert_eq!(normalized.side_table.degraded().len(), 1);
        assert_eq!(normalized.side_table.records()[0].nonsynsubs, "A1T");
    }

    #[test]
    fn test_empty_number_is_warned() {
        let line = r#"tree tree_1 = [&R] ((A:1,B:1)[&NUMBER="",NONSYNSUBS="[A1T]"]:1,C:1)[&NUMBER="2"]:0;"#;
        let normalized = normalizer().normalize_str(&document(&["A", "B", "C"], line)).unwrap();

        assert_eq!(normalized.tree_string, "((A:1,B:1):1,C:1)2:0;");
        assert_eq!(normalized.warnings.len(), 1);
        assert_eq!(normalized.side_table.degraded().len(), normalized.warnings.len());
    }

    #[test]
    fn test_unclosed_block_keeps_following_leaves() {
        let line = r#"tree tree_1 = [&R] (A[&NUMBER="1"],C[&NUMBER="2"]:1)[&NUMBER="3"]:0;"#;
        let normalized = normalizer().normalize_str(&document(&["A", "C"], line)).unwrap();

        assert_eq!(normalized.tree_string, r#"(A[&NUMBER="1"],C:1)3:0;"#);
        assert_eq!(normalized.side_table.len(), 2);
        assert!(normalized.side_table.get("1").is_none());
    }

    #[test]
    fn test_duplicate_blocks() {
        let line = r#"tree tree_1 = [&R] ((A:1,B:1)[&NUMBER="7"]:1,(C:1,D:1)[&NUMBER="7"]:1)[&NUMBER="8"]:0;"#;
        let input = document(&["A", "B", "C", "D"], line);

        let collapsed = normalizer().normalize_str(&input).unwrap();
        assert_eq!(collapsed.side_table.len(), 2);

        let per_occurrence = normalizer()
            .with_duplicate_policy(DuplicateBlocks::PerOccurrence)
            .normalize_str(&input)
            .unwrap();
        assert_eq!(per_occurrence.side_table.len(), 3);
        assert_eq!(per_occurrence.tree_string, collapsed.tree_string);
        assert_eq!(collapsed.tree_string, "((A:1,B:1)7:1,(C:1,D:1)7:1)8:0;");
    }

    #[test]
    fn test_leaf_blocks() {
        let line = r#"tree tree_1 = [&R] (A[&NUMBER="1"]:1,B[&NUMBER="2"]:1)[&NUMBER="3"]:0;"#;
        let input = document(&["A", "B"], line);

        let stripped = normalizer().normalize_str(&input).unwrap();
        assert_eq!(stripped.tree_string, "(A:1,B:1)3:0;");
        assert_eq!(stripped.side_table.len(), 3);

        let identifier = normalizer()
            .with_leaf_blocks(LeafBlocks::Identifier)
            .normalize_str(&input)
            .unwrap();
        assert_eq!(identifier.tree_string, "(A1:1,B2:1)3:0;");
        assert_eq!(identifier.side_table, stripped.side_table);
    }

    #[test]
    fn test_tree_prefix() {
        let line = r#"tree TREE1 = [&U] (A:1,B:1)[&NUMBER="3"]:0;"#;
        let input = document(&["A", "B"], line);

        let err = normalizer().normalize_str(&input).unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedInput(_)));

        let statement = normalizer()
            .with_tree_prefix(TreePrefix::Statement)
            .normalize_str(&input)
            .unwrap();
        assert_eq!(statement.tree_string, "(A:1,B:1)3:0;");

        let literal = normalizer()
            .with_tree_prefix(TreePrefix::Literal(String::from("tree TREE1 = [&U]")))
            .normalize_str(&input)
            .unwrap();
        assert_eq!(literal.tree_string, statement.tree_string);
    }

    #[test]
    fn test_malformed_structure() {
        let no_trees = "#NEXUS\ntaxlabels\nA\n;\nend;\n";
        let two_trees = document(&["A"], "tree tree_1 = [&R] (A:1);\nbegin trees;\n(A:1);");
        let empty_tree_line = document(&["A"], "");
        let unclosed_taxa = "taxlabels\nA\n;\nbegin trees;\ntree tree_1 = [&R] (A:1);\n";
        let no_taxlabels = "begin trees;\ntree tree_1 = [&R] (A:1);\nend;\n";

        for input in [no_trees, two_trees.as_str(), empty_tree_line.as_str(), unclosed_taxa, no_taxlabels] {
            let err = normalizer().normalize_str(input).unwrap_err();
            assert!(matches!(err, NormalizeError::MalformedInput(_)), "{input}");
        }
    }

    #[test]
    fn test_blank_taxon_lines_are_skipped() {
        let input = document(&["A", "", "B"], r#"tree tree_1 = [&R] (A:1,B:1)[&NUMBER="3"]:0;"#);
        let normalized = normalizer().normalize_str(&input).unwrap();
        assert_eq!(normalized.taxa, vec!["A", "B"]);
    }

    #[test]
    fn test_nexus_lines() {
        let input = document(&["A", "B"], r#"tree tree_1 = [&R] (A:1,B:1)[&NUMBER="3"]:0;"#);
        let lines = normalizer().normalize_str(&input).unwrap().to_nexus_lines();
        assert_eq!(
            lines,
            vec![
                "#NEXUS",
                "begin taxa;",
                "dimensions ntax=2;",
                "taxlabels",
                "A",
                "B",
                ";",
                "end;",
                "begin trees;",
                "tree TREE1 = [&R] (A:1,B:1)3:0;",
                "end;",
            ]
        );
    }
}
