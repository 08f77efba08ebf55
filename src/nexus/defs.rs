//! Keywords and delimiters of the NEXUS format.
//!
//! Keywords are matched ignoring ASCII case when reading, and written in
//! lower case.

/// Delimiters of a label within `taxlabels` and `translate`
pub(crate) const NEXUS_LABEL_DELIMITERS: &[u8] = b" ,;\t\n\r[";

/// Delimiters of a command word or tree name
pub(crate) const NEXUS_WORD_DELIMITERS: &[u8] = b" =;\t\n\r[";

pub(crate) const NEXUS_HEADER: &[u8] = b"#NEXUS";

pub(crate) const BLOCK_BEGIN: &[u8] = b"begin";

pub(crate) const BLOCK_END: &[u8] = b"end;";

pub(crate) const BLOCK_END_ALT: &[u8] = b"endblock;";

// Taxa block
pub(crate) const TAXA: &[u8] = b"taxa";

pub(crate) const DIMENSIONS: &[u8] = b"dimensions";

pub(crate) const NTAX: &[u8] = b"ntax";

pub(crate) const TAXLABELS: &[u8] = b"taxlabels";

// Trees block
pub(crate) const TREES: &[u8] = b"trees";

pub(crate) const TRANSLATE: &[u8] = b"translate";

pub(crate) const TREE: &[u8] = b"tree";

/// Name given to the single tree of a normalized file
pub(crate) const DEFAULT_TREE_NAME: &[u8] = b"TREE1";

pub(crate) const ROOTED_COMMENT: &[u8] = b"[&R]";

/// Kind of a NEXUS block, identified by the name after `begin`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum NexusBlock {
    Taxa,
    Trees,
    Data,
    Characters,
    Distances,
    Sets,
    Assumptions,
    UnknownBlock(String),
}

impl NexusBlock {
    /// Parses a block name (case-insensitive) into a [NexusBlock].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "taxa" => NexusBlock::Taxa,
            "trees" => NexusBlock::Trees,
            "data" => NexusBlock::Data,
            "characters" => NexusBlock::Characters,
            "distances" => NexusBlock::Distances,
            "sets" => NexusBlock::Sets,
            "assumptions" => NexusBlock::Assumptions,
            _ => NexusBlock::UnknownBlock(name.trim().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_names() {
        assert_eq!(NexusBlock::from_name("TREES"), NexusBlock::Trees);
        assert_eq!(NexusBlock::from_name(" Taxa "), NexusBlock::Taxa);
        assert_eq!(
            NexusBlock::from_name("figtree"),
            NexusBlock::UnknownBlock(String::from("figtree"))
        );
    }
}
