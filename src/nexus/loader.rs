//! Loading of a dated tree from a NEXUS file.

use crate::dates::{DateError, decimal_date};
use crate::model::{PhyloTree, VertexIndex};
use crate::newick::NewickParser;
use crate::nexus::defs::{
    BLOCK_BEGIN, BLOCK_END, BLOCK_END_ALT, DIMENSIONS, NEXUS_HEADER, NEXUS_LABEL_DELIMITERS,
    NEXUS_WORD_DELIMITERS, NTAX, NexusBlock, TAXLABELS, TRANSLATE, TREE,
};
use crate::parser::byte_parser::ConsumeMode::Inclusive;
use crate::parser::byte_parser::ByteParser;
use crate::parser::in_memory_byte_source::InMemoryByteSource;
use crate::parser::{ParsingError, ParsingErrorType};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

lazy_static! {
    static ref DEFAULT_TIP_DATE_RE: Regex = Regex::new(r"\|([0-9]+\-[0-9]+\-[0-9]+)").unwrap();
}

/// Error while loading a dated tree.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Parsing(#[from] ParsingError),
    #[error("Cannot read date of tip '{tip}'")]
    TipDate {
        tip: String,
        #[source]
        source: DateError,
    },
}

/// Where the sampling date of a tip is found in its name.
#[derive(Debug, Clone)]
pub enum TipDates {
    /// First capture group (or whole match) of the regex; tips that do not
    /// match carry no date.
    Pattern(Regex),
    /// Last field after splitting the name (single quotes stripped) at the
    /// delimiter; every tip must carry a date.
    Delimited(String),
    /// Tips are not dated.
    None,
}

impl Default for TipDates {
    /// Pattern `\|([0-9]+\-[0-9]+\-[0-9]+)`, e.g. `A/Wellington/1/2021|2021-03-04`.
    fn default() -> Self {
        TipDates::Pattern(DEFAULT_TIP_DATE_RE.clone())
    }
}

/// A tree with the tip translation of its file and the date of its
/// most recent tip.
#[derive(Debug, Clone)]
pub struct DatedTree {
    pub tree: PhyloTree,
    pub tip_map: HashMap<String, String>,
    pub highest_tip: Option<f64>,
}

impl DatedTree {
    /// Calendar time of a vertex, `highest_tip - tree_height + height`.
    ///
    /// # Returns
    /// `None` if no tip was dated
    pub fn absolute_time(&self, index: VertexIndex) -> Option<f64> {
        let highest_tip = self.highest_tip?;
        Some(highest_tip - self.tree.tree_height() + self.tree.height_of(index))
    }

    /// [absolute_time](Self::absolute_time) for every vertex, by index.
    pub fn absolute_times(&self) -> Option<Vec<f64>> {
        let highest_tip = self.highest_tip?;
        let offset = highest_tip - self.tree.tree_height();
        Some(self.tree.heights().into_iter().map(|height| offset + height).collect())
    }
}

// =#========================================================================#=
// NEXUS LOADER
// =#========================================================================$=
/// Loads the first tree of a NEXUS file, resolves its tip names and dates.
///
/// Reads `#NEXUS`, then blocks: `taxa` (`dimensions ntax`, `taxlabels`),
/// `trees` (`translate`, first `tree`); other blocks and commands are skipped.
/// Annotations in the tree become vertex traits.
///
/// # Example
/// ```
/// use phylotraits::nexus::{NexusLoader, TipDates};
///
/// let text = "#NEXUS\nbegin trees;\ntranslate\n1 'A_2020-01-01',\n2 'B_2021-01-01'\n;\n\
///             tree TREE1 = [&R] (1:1.0,2:2.0);\nend;\n";
/// let dated = NexusLoader::for_str(text)
///     .with_tip_dates(TipDates::Delimited("_".into()))
///     .load()
///     .unwrap();
/// assert_eq!(dated.highest_tip, Some(2021.0));
/// assert!(dated.tree.find_by_name("A_2020-01-01").is_some());
/// ```
pub struct NexusLoader {
    parser: ByteParser<InMemoryByteSource>,
    tip_dates: TipDates,
    date_format: String,
    variable_dates: bool,
    sort_descending: bool,
}

// ============================================================================
// Construction & Configuration (pub)
// ============================================================================
impl NexusLoader {
    /// Creates a loader reading the file at `path`.
    ///
    /// # Errors
    /// I/O error (as [ParsingError]) if the file cannot be read.
    pub fn for_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let parser = ByteParser::for_file(path).map_err(ParsingError::from)?;
        Ok(Self::new(parser))
    }

    /// Creates a loader reading `text`.
    pub fn for_str(text: &str) -> Self {
        Self::new(ByteParser::for_str(text))
    }

    fn new(parser: ByteParser<InMemoryByteSource>) -> Self {
        Self {
            parser,
            tip_dates: TipDates::default(),
            date_format: String::from("%Y-%m-%d"),
            variable_dates: true,
            sort_descending: true,
        }
    }

    pub fn with_tip_dates(mut self, tip_dates: TipDates) -> Self {
        self.tip_dates = tip_dates;
        self
    }

    /// `chrono` format of the tip dates, default `%Y-%m-%d`.
    pub fn with_date_format<S: Into<String>>(mut self, format: S) -> Self {
        self.date_format = format.into();
        self
    }

    /// Whether dates may lack trailing components (default `true`).
    pub fn with_variable_dates(mut self, variable: bool) -> Self {
        self.variable_dates = variable;
        self
    }

    /// Branch order after loading, see [PhyloTree::sort_branches] (default `true`).
    pub fn with_sort_descending(mut self, descending: bool) -> Self {
        self.sort_descending = descending;
        self
    }
}

// ============================================================================
// Loading (pub)
// ============================================================================
impl NexusLoader {
    /// Parses the input and returns its first tree.
    ///
    /// # Errors
    /// * [LoadError::Parsing] - missing header, malformed block, no tree
    /// * [LoadError::TipDate] - a tip date cannot be converted
    pub fn load(mut self) -> Result<DatedTree, LoadError> {
        self.parse_header()?;

        let mut num_taxa: Option<usize> = None;
        let mut taxa: Vec<String> = Vec::new();
        let (tip_map, mut tree) = loop {
            let Some(block) = self.detect_next_block()? else {
                return Err(ParsingError::without_context(ParsingErrorType::MissingTree).into());
            };
            match block {
                NexusBlock::Taxa => {
                    let (ntax, labels) = self.parse_taxa_block()?;
                    num_taxa = ntax;
                    taxa = labels;
                }
                NexusBlock::Trees => break self.parse_trees_block()?,
                other => {
                    log::debug!("Skipping NEXUS block {other:?}");
                    self.skip_to_block_end()?;
                }
            }
        };

        if let Some(ntax) = num_taxa {
            if !taxa.is_empty() && taxa.len() != ntax {
                log::warn!("ntax={ntax} but {} taxlabels found", taxa.len());
            }
            if !tip_map.is_empty() && tip_map.len() != ntax {
                log::warn!("ntax={ntax} but translate maps {} tips", tip_map.len());
            }
        }

        if !tip_map.is_empty() {
            let renamed = tree.rename_leaves(&tip_map);
            log::debug!("Renamed {renamed} of {} tips", tree.num_leaves());
        }
        tree.sort_branches(self.sort_descending);

        let highest_tip = self.highest_tip(&tree)?;
        match highest_tip {
            Some(date) => log::info!("Highest tip date: {date:.4}"),
            None => {
                if !matches!(self.tip_dates, TipDates::None) {
                    log::warn!("No tip dates found, absolute times unavailable");
                }
            }
        }

        Ok(DatedTree {
            tree,
            tip_map,
            highest_tip,
        })
    }
}

// ============================================================================
// Blocks (private)
// ============================================================================
impl NexusLoader {
    fn parse_header(&mut self) -> Result<(), ParsingError> {
        self.parser.skip_comment_and_whitespace()?;
        if !self.parser.consume_if_sequence(NEXUS_HEADER) {
            return Err(ParsingError::missing_nexus_header(&self.parser));
        }
        Ok(())
    }

    /// Consumes `begin <name>;` and returns the block kind, or `None` at EOF.
    fn detect_next_block(&mut self) -> Result<Option<NexusBlock>, ParsingError> {
        self.parser.skip_comment_and_whitespace()?;
        if self.parser.is_eof() {
            return Ok(None);
        }

        if !self.parser.consume_if_sequence(BLOCK_BEGIN) {
            return Err(ParsingError::invalid_formatting(&self.parser));
        }
        let name = self.parser.parse_label(b";")?;
        if !self.parser.consume_if(b';') {
            return Err(ParsingError::unexpected_eof(&self.parser));
        }

        Ok(Some(NexusBlock::from_name(&name)))
    }

    fn skip_to_block_end(&mut self) -> Result<(), ParsingError> {
        if !self.parser.consume_until_sequence(BLOCK_END, Inclusive) {
            return Err(ParsingError::unexpected_eof(&self.parser));
        }
        Ok(())
    }

    /// Consumes `end;` or `endblock;` if next.
    fn consume_block_end(&mut self) -> bool {
        self.parser.consume_if_sequence(BLOCK_END) || self.parser.consume_if_sequence(BLOCK_END_ALT)
    }

    /// Reads the next command word, lower-cased.
    fn next_command(&mut self) -> Result<String, ParsingError> {
        self.parser.skip_comment_and_whitespace()?;
        if self.parser.is_eof() {
            return Err(ParsingError::unexpected_eof(&self.parser));
        }
        Ok(self
            .parser
            .parse_unquoted_label(NEXUS_WORD_DELIMITERS)?
            .to_ascii_lowercase())
    }

    /// Skips the remainder of a command including its `;`.
    fn skip_command(&mut self) -> Result<(), ParsingError> {
        loop {
            self.parser.skip_comment_and_whitespace()?;
            match self.parser.peek() {
                None => return Err(ParsingError::unexpected_eof(&self.parser)),
                Some(b';') => {
                    self.parser.next_byte();
                    return Ok(());
                }
                Some(b'\'') => {
                    self.parser.parse_quoted_label()?;
                }
                Some(_) => {
                    self.parser.next_byte();
                }
            }
        }
    }

    /// Parses the taxa block up to and including its `end;`.
    ///
    /// Labels may carry annotation suffixes, which are skipped as comments.
    fn parse_taxa_block(&mut self) -> Result<(Option<usize>, Vec<String>), ParsingError> {
        let mut num_taxa = None;
        let mut labels = Vec::new();

        loop {
            self.parser.skip_comment_and_whitespace()?;
            if self.consume_block_end() {
                break;
            }

            let command = self.next_command()?;
            if command.as_bytes() == DIMENSIONS {
                num_taxa = self.parse_dimensions()?;
            } else if command.as_bytes() == TAXLABELS {
                labels = self.parse_taxlabels()?;
            } else {
                self.skip_command()?;
            }
        }

        Ok((num_taxa, labels))
    }

    /// Parses the arguments of `dimensions`, returning `ntax` if given.
    fn parse_dimensions(&mut self) -> Result<Option<usize>, ParsingError> {
        let arguments = self.parser.parse_unquoted_label(b";")?;
        if !self.parser.consume_if(b';') {
            return Err(ParsingError::unexpected_eof(&self.parser));
        }

        let compact: String = arguments
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let prefix = format!("{}=", String::from_utf8_lossy(NTAX));
        let Some(start) = compact.find(&prefix) else {
            return Ok(None);
        };
        let digits: String = compact[start + prefix.len()..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();

        digits.parse::<usize>().map(Some).map_err(|_| {
            ParsingError::invalid_taxa_block(
                &self.parser,
                format!("Cannot parse `ntax` value in: {arguments}"),
            )
        })
    }

    fn parse_taxlabels(&mut self) -> Result<Vec<String>, ParsingError> {
        let mut labels = Vec::new();
        loop {
            self.parser.skip_comment_and_whitespace()?;
            if self.parser.consume_if(b';') {
                return Ok(labels);
            }
            if self.parser.is_eof() {
                return Err(ParsingError::unexpected_eof(&self.parser));
            }

            let label = self.parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
            if label.is_empty() {
                return Err(ParsingError::invalid_taxa_block(
                    &self.parser,
                    String::from("Expected taxon label in 'taxlabels'."),
                ));
            }
            labels.push(label);
        }
    }

    /// Parses the trees block up to its first tree; the rest of the
    /// input is left unread.
    fn parse_trees_block(&mut self) -> Result<(HashMap<String, String>, PhyloTree), ParsingError> {
        let mut tip_map = HashMap::new();

        loop {
            self.parser.skip_comment_and_whitespace()?;
            if self.consume_block_end() {
                return Err(ParsingError::without_context(ParsingErrorType::MissingTree));
            }

            let command = self.next_command()?;
            if command.as_bytes() == TRANSLATE {
                tip_map = self.parse_translate()?;
            } else if command.as_bytes() == TREE {
                let tree = self.parse_tree_command()?;
                return Ok((tip_map, tree));
            } else {
                self.skip_command()?;
            }
        }
    }

    /// Parses the `key label` pairs of `translate` including its `;`.
    fn parse_translate(&mut self) -> Result<HashMap<String, String>, ParsingError> {
        let mut map = HashMap::new();
        loop {
            let key = self.parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
            let label = self.parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
            if key.is_empty() || label.is_empty() {
                return Err(ParsingError::invalid_trees_block(
                    &self.parser,
                    String::from("Expected '<key> <label>' pair in 'translate'."),
                ));
            }
            map.insert(key, label);

            self.parser.skip_comment_and_whitespace()?;
            if self.parser.consume_if(b',') {
                continue;
            }
            if self.parser.consume_if(b';') {
                return Ok(map);
            }
            let next_char = self.parser.peek().map(char::from);
            return Err(ParsingError::invalid_trees_block(
                &self.parser,
                format!("Unexpected {next_char:?} in 'translate'."),
            ));
        }
    }

    /// Parses `<name> = [&R] <newick>;` after the `tree` keyword.
    fn parse_tree_command(&mut self) -> Result<PhyloTree, ParsingError> {
        let name = self.parser.parse_label(NEXUS_WORD_DELIMITERS)?;
        self.parser.skip_comment_and_whitespace()?;
        if !self.parser.consume_if(b'=') {
            return Err(ParsingError::invalid_trees_block(
                &self.parser,
                String::from("Expected '=' in tree command."),
            ));
        }
        // "[&R]"/"[&U]" is skipped as comment
        self.parser.skip_comment_and_whitespace()?;

        let mut newick_parser = NewickParser::new_defaults().with_annotations();
        let tree_name = if name.is_empty() { None } else { Some(name) };
        newick_parser.parse_str_and_name(&mut self.parser, tree_name)
    }
}

// ============================================================================
// Tip dates (private)
// ============================================================================
impl NexusLoader {
    fn highest_tip(&self, tree: &PhyloTree) -> Result<Option<f64>, LoadError> {
        let mut highest: Option<f64> = None;
        for leaf in tree.leaf_indices() {
            let name = tree[leaf].name().unwrap_or_default();
            if let Some(date) = self.tip_date(name)? {
                highest = Some(highest.map_or(date, |h: f64| h.max(date)));
            }
        }
        Ok(highest)
    }

    fn tip_date(&self, name: &str) -> Result<Option<f64>, LoadError> {
        let date = match &self.tip_dates {
            TipDates::None => return Ok(None),
            TipDates::Pattern(regex) => {
                let Some(captures) = regex.captures(name) else {
                    return Ok(None);
                };
                match captures.get(1).or_else(|| captures.get(0)) {
                    Some(m) => m.as_str(),
                    None => return Ok(None),
                }
            }
            TipDates::Delimited(delimiter) => {
                let unquoted = name.trim_matches('\'');
                unquoted.rsplit(delimiter.as_str()).next().unwrap_or(unquoted)
            }
        };

        decimal_date(date, &self.date_format, self.variable_dates, "-")
            .map(Some)
            .map_err(|source| LoadError::TipDate {
                tip: name.to_string(),
                source,
            })
    }
}
