//! Side table of node identifiers and their non-synonymous substitutions.

use crate::model::PhyloTree;
use crate::treesub::annotation::MISSING_SUBSTITUTIONS;
use crate::treesub::error::NormalizeError;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// Trait receiving [NodeRecord::nonsynsubs] in [SideTable::assign_to_tree]
pub const NONSYNSUBS_TRAIT: &str = "nonsynsubs";

/// Trait receiving the number of substitutions in [SideTable::assign_to_tree]
pub const NONSYN_COUNT_TRAIT: &str = "nonsyn_count";

const HEADER: [&str; 2] = ["node_num", "nonsynsubs"];

/// One annotation block: its `NUMBER` and its `NONSYNSUBS` without brackets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node identifier, empty if the block had no `NUMBER`
    pub node_num: String,
    /// Comma separated substitutions, or `*` if the block had none listed
    pub nonsynsubs: String,
}

impl NodeRecord {
    /// Whether the block lacked a `NUMBER`.
    pub fn is_degraded(&self) -> bool {
        self.node_num.is_empty()
    }

    /// The individual substitutions, e.g. `["A123T", "G456C"]`.
    pub fn substitutions(&self) -> Vec<&str> {
        if self.nonsynsubs == MISSING_SUBSTITUTIONS {
            return Vec::new();
        }
        self.nonsynsubs
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Rows in order of first appearance of their block in the tree string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideTable {
    records: Vec<NodeRecord>,
}

impl SideTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: NodeRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[NodeRecord] {
        &self.records
    }

    /// First row with the given `node_num`.
    pub fn get(&self, node_num: &str) -> Option<&NodeRecord> {
        self.records.iter().find(|r| r.node_num == node_num)
    }

    /// Rows whose block lacked a `NUMBER`.
    pub fn degraded(&self) -> Vec<&NodeRecord> {
        self.records.iter().filter(|r| r.is_degraded()).collect()
    }

    /// Writes the table as CSV with header `node_num,nonsynsubs`.
    ///
    /// # Errors
    /// [NormalizeError::Io] if the file cannot be created,
    /// [NormalizeError::Csv] if writing fails.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), NormalizeError> {
        let file = std::fs::File::create(path.as_ref())
            .map_err(|e| NormalizeError::io(path.as_ref(), e))?;
        self.to_writer(file)
    }

    /// Writes the table as CSV to any writer.
    pub fn to_writer<W: io::Write>(&self, writer: W) -> Result<(), NormalizeError> {
        let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        csv_writer.write_record(HEADER)?;
        for record in &self.records {
            csv_writer.serialize(record)?;
        }
        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Reads a table written by [write_csv](Self::write_csv).
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self, NormalizeError> {
        let file = std::fs::File::open(path.as_ref())
            .map_err(|e| NormalizeError::io(path.as_ref(), e))?;
        Self::from_reader(file)
    }

    /// Reads a CSV table with header `node_num,nonsynsubs`.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, NormalizeError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let records = csv_reader
            .deserialize::<NodeRecord>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }

    /// Joins the rows onto the vertices named by their `node_num`, setting
    /// traits `nonsynsubs` and `nonsyn_count`.
    ///
    /// Degraded rows are ignored.
    ///
    /// # Returns
    /// Number of vertices that received traits
    pub fn assign_to_tree(&self, tree: &mut PhyloTree) -> usize {
        let mut assigned = 0;
        for record in self.records.iter().filter(|r| !r.is_degraded()) {
            let Some(index) = tree.find_by_name(&record.node_num) else {
                log::debug!("No vertex named '{}' for side table row", record.node_num);
                continue;
            };
            let count = record.substitutions().len();
            let traits = tree[index].traits_mut();
            traits.insert(NONSYNSUBS_TRAIT.to_string(), record.nonsynsubs.clone());
            traits.insert(NONSYN_COUNT_TRAIT.to_string(), count.to_string());
            assigned += 1;
        }
        assigned
    }
}

impl<'a> IntoIterator for &'a SideTable {
    type Item = &'a NodeRecord;
    type IntoIter = std::slice::Iter<'a, NodeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<NodeRecord> for SideTable {
    fn from_iter<I: IntoIterator<Item = NodeRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick::parse_str;

    fn record(node_num: &str, nonsynsubs: &str) -> NodeRecord {
        NodeRecord {
            node_num: node_num.to_string(),
            nonsynsubs: nonsynsubs.to_string(),
        }
    }

    #[test]
    fn test_substitutions() {
        assert_eq!(record("1", "A123T,G456C").substitutions(), vec!["A123T", "G456C"]);
        assert!(record("1", "*").substitutions().is_empty());
        assert!(record("1", "").substitutions().is_empty());
    }

    #[test]
    fn test_csv_with_commas_in_values() {
        let table: SideTable = vec![record("12", "A123T,G456C"), record("", "*")]
            .into_iter()
            .collect();
        let mut buffer = Vec::new();
        table.to_writer(&mut buffer).unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert_eq!(text, "node_num,nonsynsubs\n12,\"A123T,G456C\"\n,*\n");

        let read = SideTable::from_reader(buffer.as_slice()).unwrap();
        assert_eq!(read, table);
        assert_eq!(read.degraded().len(), 1);
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let mut buffer = Vec::new();
        SideTable::new().to_writer(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "node_num,nonsynsubs\n");
    }

    #[test]
    fn test_assign_to_tree() {
        let mut tree = parse_str("((A:1,B:1)12:0.5,C:1)13;").unwrap();
        let table: SideTable = vec![record("12", "A123T,G456C"), record("13", "*"), record("99", "C1T")]
            .into_iter()
            .collect();

        assert_eq!(table.assign_to_tree(&mut tree), 2);
        let clade = tree.find_by_name("12").unwrap();
        assert_eq!(tree[clade].trait_value(NONSYNSUBS_TRAIT), Some("A123T,G456C"));
        assert_eq!(tree[clade].trait_value(NONSYN_COUNT_TRAIT), Some("2"));
        assert_eq!(tree.root().trait_value(NONSYN_COUNT_TRAIT), Some("0"));
    }
}
