//! Recursive-descent parser for Newick strings.

use crate::model::tree_builder::TreeBuilder;
use crate::model::PhyloTreeBuilder;
use crate::newick::defs::{
    ANNOTATION_VALUE_DELIMITERS, DEFAULT_NUM_VERTICES_GUESS, NEWICK_LABEL_DELIMITERS,
};
use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_source::ByteSource;
use crate::parser::parsing_error::ParsingError;

/// Key-value pairs of one or more `[&...]` blocks attached to a vertex.
type Annotations = Vec<(String, String)>;

/// Everything that may follow a vertex's children (or start a leaf):
/// label, annotations and branch length.
struct VertexSuffix {
    name: Option<String>,
    annotations: Annotations,
    branch_length: Option<f64>,
}

// =#========================================================================#=
// NEWICK PARSER
// =#========================================================================$=
/// Parser for Newick trees with any number of children per vertex.
///
/// Generic over the [TreeBuilder] constructing the trees.
///
/// # Format
/// * `tree ::= vertex ';'`
/// * `vertex ::= '(' vertex (',' vertex)* ')' suffix | suffix`
/// * `suffix ::= [label] [annotation]* [':' [annotation]* number]`
/// * `annotation ::= '[&' key ['=' value] (',' key ['=' value])* ']'`
///
/// Labels may be single-quoted. Internal vertices may be labelled too, as in
/// `((A:1,B:1)12:0.5,C:1.5);`. Comments `[...]` may appear between tokens.
/// Annotations are treated as comments unless configured with
/// [with_annotations](Self::with_annotations); values may be double-quoted
/// (`"[A1T,G2C]"`) or braced (`{1,2}`) and then contain commas.
///
/// # Example
/// ```
/// use phylotraits::newick::NewickParser;
/// use phylotraits::parser::ByteParser;
///
/// let mut byte_parser = ByteParser::for_str("((Kea:1,Kaka:1)[&host=\"forest\"]:0.5,Kakapo:1.5);");
/// let mut parser = NewickParser::new_defaults().with_annotations();
/// let tree = parser.parse_str(&mut byte_parser).unwrap();
///
/// assert_eq!(tree.num_leaves(), 3);
/// let clade = tree.root().children()[0];
/// assert_eq!(tree[clade].trait_value("host"), Some("forest"));
/// ```
pub struct NewickParser<T: TreeBuilder> {
    tree_builder: T,
    parse_annotations: bool,
    num_vertices: usize,
}

// ============================================================================
// Construction & Configuration (pub)
// ============================================================================
impl<T: TreeBuilder> NewickParser<T> {
    /// Creates a parser using the given tree builder.
    pub fn new(tree_builder: T) -> Self {
        Self {
            tree_builder,
            parse_annotations: false,
            num_vertices: DEFAULT_NUM_VERTICES_GUESS,
        }
    }

    /// Parses `[&key=value,...]` blocks into the builder instead of skipping them.
    pub fn with_annotations(mut self) -> Self {
        self.parse_annotations = true;
        self
    }
}

impl NewickParser<PhyloTreeBuilder> {
    /// Creates a parser producing [PhyloTree](crate::model::PhyloTree)s,
    /// skipping annotations.
    pub fn new_defaults() -> Self {
        Self::new(PhyloTreeBuilder::new())
    }
}

impl Default for NewickParser<PhyloTreeBuilder> {
    fn default() -> Self {
        Self::new_defaults()
    }
}

// ============================================================================
// API Parsing (pub)
// ============================================================================
impl<T: TreeBuilder> NewickParser<T> {
    /// Parses all trees until EOF.
    ///
    /// # Arguments
    /// * `byte_parser` - Source containing only Newick strings,
    ///   whitespace and comments
    pub fn parse_all<B: ByteSource>(
        &mut self,
        byte_parser: &mut ByteParser<B>,
    ) -> Result<Vec<T::Tree>, ParsingError> {
        let mut trees = Vec::new();
        loop {
            byte_parser.skip_comment_and_whitespace()?;
            if byte_parser.is_eof() {
                break;
            }
            trees.push(self.parse_str(byte_parser)?);
        }
        Ok(trees)
    }

    /// Parses a single tree, including its terminating `;`.
    ///
    /// # Errors
    /// Returns a [ParsingError] if the Newick string is malformed.
    pub fn parse_str<B: ByteSource>(
        &mut self,
        parser: &mut ByteParser<B>,
    ) -> Result<T::Tree, ParsingError> {
        self.parse_str_and_name(parser, None)
    }

    /// Parses a single tree and gives it the provided name.
    pub(crate) fn parse_str_and_name<B: ByteSource>(
        &mut self,
        parser: &mut ByteParser<B>,
        tree_name: Option<String>,
    ) -> Result<T::Tree, ParsingError> {
        self.tree_builder.init_next(self.num_vertices);
        if let Some(name) = tree_name {
            self.tree_builder.set_name(name);
        }

        self.parse_root(parser)?;
        let tree = self.tree_builder.finish_tree()?;
        Ok(tree)
    }
}

// ============================================================================
// Parsing (private)
// ============================================================================
impl<T: TreeBuilder> NewickParser<T> {
    /// Parses the root vertex and the terminating semicolon.
    fn parse_root<B: ByteSource>(&mut self, parser: &mut ByteParser<B>) -> Result<(), ParsingError> {
        parser.skip_comment_and_whitespace()?;

        let children = if parser.peek() == Some(b'(') {
            self.parse_children(parser)?
        } else {
            Vec::new()
        };
        let suffix = self.parse_suffix(parser)?;

        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b';') {
            let next_char = parser.peek().map(char::from);
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected ';' at end of tree but found {next_char:?}"),
            ));
        }

        let root = self
            .tree_builder
            .add_root(children, suffix.name, suffix.branch_length)?;
        self.add_annotations(root, suffix.annotations);
        Ok(())
    }

    /// Parses an internal vertex or a leaf and returns its index.
    fn parse_vertex<B: ByteSource>(
        &mut self,
        parser: &mut ByteParser<B>,
    ) -> Result<T::VertexIdx, ParsingError> {
        parser.skip_comment_and_whitespace()?;

        let index = if parser.peek() == Some(b'(') {
            let children = self.parse_children(parser)?;
            let suffix = self.parse_suffix(parser)?;
            let index = self
                .tree_builder
                .add_internal(children, suffix.name, suffix.branch_length)?;
            self.add_annotations(index, suffix.annotations);
            index
        } else {
            let suffix = self.parse_suffix(parser)?;
            let index = self.tree_builder.add_leaf(suffix.name, suffix.branch_length)?;
            self.add_annotations(index, suffix.annotations);
            index
        };

        Ok(index)
    }

    /// Parses `(vertex, vertex, ...)`; expects the parser at `(`.
    fn parse_children<B: ByteSource>(
        &mut self,
        parser: &mut ByteParser<B>,
    ) -> Result<Vec<T::VertexIdx>, ParsingError> {
        parser.next_byte(); // '('

        let mut children = Vec::with_capacity(2);
        loop {
            children.push(self.parse_vertex(parser)?);

            parser.skip_comment_and_whitespace()?;
            match parser.next_byte() {
                Some(b',') => continue,
                Some(b')') => break,
                Some(b) => {
                    return Err(ParsingError::invalid_newick_string(
                        parser,
                        format!("Expected ',' or ')' between children but found '{}'", b as char),
                    ));
                }
                None => return Err(ParsingError::unexpected_eof(parser)),
            }
        }

        Ok(children)
    }

    /// Parses optional label, annotations and branch length of a vertex.
    fn parse_suffix<B: ByteSource>(
        &mut self,
        parser: &mut ByteParser<B>,
    ) -> Result<VertexSuffix, ParsingError> {
        parser.skip_whitespace();
        let label = if parser.peek() == Some(b'\'') {
            parser.parse_quoted_label()?
        } else {
            parser.parse_unquoted_label(NEWICK_LABEL_DELIMITERS)?
        };
        let name = (!label.is_empty()).then_some(label);

        let mut annotations = Annotations::new();
        self.parse_annotations_and_comments(parser, &mut annotations)?;

        let branch_length = if parser.consume_if(b':') {
            // BEAST places some annotations after the colon
            self.parse_annotations_and_comments(parser, &mut annotations)?;
            Some(self.parse_branch_length(parser)?)
        } else {
            None
        };

        Ok(VertexSuffix {
            name,
            annotations,
            branch_length,
        })
    }

    /// Parses a number, supporting scientific notation (e.g., `1.5e-10`).
    fn parse_branch_length<B: ByteSource>(
        &mut self,
        parser: &mut ByteParser<B>,
    ) -> Result<f64, ParsingError> {
        let mut branch_length_str = String::new();
        while let Some(b) = parser.peek() {
            if b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E') {
                branch_length_str.push(b as char);
                parser.next_byte();
            } else {
                break;
            }
        }

        branch_length_str.parse().map_err(|_| {
            ParsingError::invalid_newick_string(
                parser,
                format!("Invalid branch length: '{branch_length_str}'"),
            )
        })
    }

    /// Skips whitespace and comments, collecting `[&...]` blocks into
    /// `annotations` if annotation parsing is enabled.
    fn parse_annotations_and_comments<B: ByteSource>(
        &mut self,
        parser: &mut ByteParser<B>,
        annotations: &mut Annotations,
    ) -> Result<(), ParsingError> {
        loop {
            parser.skip_whitespace();
            if self.parse_annotations && parser.peek_is_sequence(b"[&") {
                self.parse_annotation_block(parser, annotations)?;
            } else if !parser.skip_comment()? {
                return Ok(());
            }
        }
    }

    /// Parses one `[&key=value,...]` block; expects the parser at `[&`.
    fn parse_annotation_block<B: ByteSource>(
        &mut self,
        parser: &mut ByteParser<B>,
        annotations: &mut Annotations,
    ) -> Result<(), ParsingError> {
        parser.consume_if_sequence(b"[&");

        loop {
            parser.skip_whitespace();
            let key = parser.parse_unquoted_label(b"=,]")?.trim().to_string();
            if key.is_empty() {
                return Err(ParsingError::invalid_annotation(
                    parser,
                    String::from("Empty annotation key"),
                ));
            }

            let value = if parser.consume_if(b'=') {
                parser.parse_annotation_value(ANNOTATION_VALUE_DELIMITERS)?
            } else {
                String::new()
            };
            annotations.push((key, value));

            parser.skip_whitespace();
            match parser.next_byte() {
                Some(b',') => continue,
                Some(b']') => return Ok(()),
                Some(b) => {
                    return Err(ParsingError::invalid_annotation(
                        parser,
                        format!("Unexpected '{}' in annotation block", b as char),
                    ));
                }
                None => return Err(ParsingError::unexpected_eof(parser)),
            }
        }
    }

    fn add_annotations(&mut self, vertex: T::VertexIdx, annotations: Annotations) {
        for (key, value) in annotations {
            self.tree_builder.add_annotation(vertex, key, value);
        }
    }
}
