//! Annotation blocks of the treesub tree dialect.
//!
//! treesub attaches a block to every branch, directly before the branch length:
//!
//! ```text
//! block    ::= "[&" payload "]:"
//! payload  ::= pair ("," pair)*
//! pair     ::= KEY "=" "\"" VALUE "\""
//! ```
//!
//! e.g. `(A:0.1,B:0.2)[&REALNAME="x",NUMBER="12",NONSYNSUBS="[A123T,G456C]"]:0.05`.
//! Keys of interest are `NUMBER` (digits) and `NONSYNSUBS` (a bracketed,
//! comma separated list of substitutions).
//!
//! Blocks are matched non-greedily from `[&` to the first `]:`. Values may
//! contain `[`, `]`, `,` and `:` but never the sequence `]:`, which always
//! closes a block. Input violating this is split at the inner `]:`.
//! A `[&` without a closing `]:` before the next `[&` is not a block and is
//! left in place.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // payload never contains "[&"
    static ref BLOCK_RE: Regex = Regex::new(r"\[&((?:[^\[]|\[[^&])*?)\]:").unwrap();
    static ref NUMBER_RE: Regex = Regex::new(r#"(?:^|,)NUMBER="(\d*)""#).unwrap();
    static ref NONSYNSUBS_RE: Regex = Regex::new(r#"(?:^|,)NONSYNSUBS="([^"]*)""#).unwrap();
}

/// Side-table value of a block without `NONSYNSUBS`.
pub const MISSING_SUBSTITUTIONS: &str = "*";

/// One annotation block within a tree string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationBlock<'a> {
    /// Byte offset of `[&`
    pub start: usize,
    /// Byte offset just after the closing `]:`
    pub end: usize,
    /// Whole match, `[&...]:`
    pub text: &'a str,
    /// Text between `[&` and `]:`
    pub payload: &'a str,
    /// Whether the block follows a leaf label rather than a `)`
    pub on_leaf: bool,
}

impl<'a> AnnotationBlock<'a> {
    /// Value of `NUMBER`, if present.
    pub fn node_number(&self) -> Option<&'a str> {
        node_number(self.payload)
    }

    /// Value of `NONSYNSUBS` without brackets, [MISSING_SUBSTITUTIONS] if absent.
    pub fn substitutions(&self) -> String {
        substitutions(self.payload).unwrap_or_else(|| MISSING_SUBSTITUTIONS.to_string())
    }
}

/// Finds all annotation blocks of `tree`, in order of appearance.
///
/// # Example
/// ```
/// use phylotraits::treesub::annotation::find_blocks;
///
/// let tree = r#"(A[&NUMBER="1"]:0.1,B[&NUMBER="2"]:0.2)[&NUMBER="3"]:0.0;"#;
/// let blocks = find_blocks(tree);
/// assert_eq!(blocks.len(), 3);
/// assert_eq!(blocks[2].node_number(), Some("3"));
/// assert!(blocks[0].on_leaf && !blocks[2].on_leaf);
/// ```
pub fn find_blocks(tree: &str) -> Vec<AnnotationBlock<'_>> {
    BLOCK_RE
        .captures_iter(tree)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let payload = captures.get(1)?;
            Some(AnnotationBlock {
                start: whole.start(),
                end: whole.end(),
                text: whole.as_str(),
                payload: payload.as_str(),
                on_leaf: !tree[..whole.start()].ends_with(')'),
            })
        })
        .collect()
}

/// Extracts the digits of `NUMBER="..."` from a block payload.
/// An empty value counts as missing.
pub fn node_number(payload: &str) -> Option<&str> {
    NUMBER_RE
        .captures(payload)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .filter(|number| !number.is_empty())
}

/// Extracts the value of `NONSYNSUBS="..."` from a block payload,
/// with all `[` and `]` removed.
pub fn substitutions(payload: &str) -> Option<String> {
    NONSYNSUBS_RE
        .captures(payload)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().replace(['[', ']'], ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_and_substitutions() {
        let payload = r#"REALNAME="inode7",NUMBER="12",NONSYNSUBS="[A123T,G456C]",SYNSUBS="[C3T]""#;
        assert_eq!(node_number(payload), Some("12"));
        assert_eq!(substitutions(payload).as_deref(), Some("A123T,G456C"));
    }

    #[test]
    fn test_missing_keys() {
        let payload = r#"REALNAME="inode7",SYNSUBS="[C3T]""#;
        assert_eq!(node_number(payload), None);
        assert_eq!(substitutions(payload), None);
    }

    #[test]
    fn test_keys_are_whole_words() {
        let payload = r#"REALNUMBER="99",NUMBER="4""#;
        assert_eq!(node_number(payload), Some("4"));
        let payload = r#"XNONSYNSUBS="[A1T]""#;
        assert_eq!(substitutions(payload), None);
    }

    #[test]
    fn test_empty_number_is_missing() {
        assert_eq!(node_number(r#"NUMBER="",NONSYNSUBS="[A1T]""#), None);
    }

    #[test]
    fn test_unclosed_block_does_not_swallow_taxa() {
        let tree = r#"(A:1,B[&NUMBER="1"],C[&NUMBER="2"]:1)[&NUMBER="3"]:0;"#;
        let blocks = find_blocks(tree);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, r#"[&NUMBER="2"]:"#);
        assert_eq!(blocks[1].node_number(), Some("3"));
    }

    #[test]
    fn test_empty_substitution_list() {
        assert_eq!(substitutions(r#"NUMBER="1",NONSYNSUBS="[]""#).as_deref(), Some(""));
    }

    #[test]
    fn test_brackets_and_colons_inside_values() {
        let tree = r#"(A:1,B:1)[&NUMBER="5",NOTE="[x]:y"]:0.5;"#;
        let blocks = find_blocks(tree);
        // The first "]:" closes the block, even inside a quoted value
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].payload, r#"NUMBER="5",NOTE="[x"#);

        let tree = r#"(A:1,B:1)[&NUMBER="5",NONSYNSUBS="[A1:T]"]:0.5;"#;
        let blocks = find_blocks(tree);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].substitutions(), "A1:T");
    }

    #[test]
    fn test_block_positions() {
        let tree = r#"(A[&NUMBER="1"]:0.1,B:0.2)[&NUMBER="3"]:0.0;"#;
        let blocks = find_blocks(tree);
        assert_eq!(blocks.len(), 2);
        for block in &blocks {
            assert_eq!(&tree[block.start..block.end], block.text);
            assert!(block.text.starts_with("[&") && block.text.ends_with("]:"));
        }
        assert_eq!(blocks[1].substitutions(), MISSING_SUBSTITUTIONS);
    }

    #[test]
    fn test_block_without_branch_length_is_not_matched() {
        assert!(find_blocks(r#"(A:1,B:1)[&NUMBER="1"];"#).is_empty());
    }
}
