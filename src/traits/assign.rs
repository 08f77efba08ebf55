//! Assigning trait values to leaves from a table and to internal vertices
//! from their leaves.

use crate::model::{PhyloTree, VertexIndex};
use crate::traits::{TraitError, TraitTable};
use std::collections::HashMap;

/// Value of a trait that is unknown or not shared.
pub const UNDEF: &str = "undef";

/// Outcome of [assign_leaf_trait].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentReport {
    /// Leaves that received a table value
    pub assigned: usize,
    /// Leaves without a matching row
    pub unmatched: Vec<String>,
    /// Leaves with several matching rows, and their number
    pub ambiguous: Vec<(String, usize)>,
}

impl AssignmentReport {
    /// Whether every leaf matched exactly one row.
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty() && self.ambiguous.is_empty()
    }
}

/// Sets trait `trait_name` of every leaf to the `target_col` value of the
/// table row whose `query_col` equals the leaf name.
///
/// Leaves matching no row or several rows receive [UNDEF] and are listed in
/// the report. `trait_name` defaults to `target_col`.
///
/// # Errors
/// [TraitError::UnknownColumn] if either column is missing; the tree is
/// left unchanged then.
///
/// # Example
/// ```
/// use phylotraits::newick::parse_str;
/// use phylotraits::traits::{assign_leaf_trait, TraitTable};
///
/// let table = TraitTable::from_reader("name,region\nA,north\nB,south\n".as_bytes()).unwrap();
/// let mut tree = parse_str("((A:1,B:1):1,C:2);").unwrap();
/// let report = assign_leaf_trait(&mut tree, &table, "name", "region", None).unwrap();
///
/// let a = tree.find_by_name("A").unwrap();
/// assert_eq!(tree[a].trait_value("region"), Some("north"));
/// assert_eq!(report.unmatched, vec!["C"]);
/// ```
pub fn assign_leaf_trait(
    tree: &mut PhyloTree,
    table: &TraitTable,
    query_col: &str,
    target_col: &str,
    trait_name: Option<&str>,
) -> Result<AssignmentReport, TraitError> {
    let trait_name = trait_name.filter(|n| !n.is_empty()).unwrap_or(target_col);
    let keys = table.column_values(query_col)?;
    let values = table.column_values(target_col)?;

    let mut rows_by_key: HashMap<&str, Vec<usize>> = HashMap::new();
    for (row, key) in keys.iter().enumerate() {
        rows_by_key.entry(*key).or_default().push(row);
    }

    let mut report = AssignmentReport::default();
    for leaf in tree.leaf_indices() {
        let name = tree[leaf].name().unwrap_or_default().to_string();
        let rows = rows_by_key.get(name.as_str()).map(Vec::as_slice).unwrap_or_default();

        let value = match rows {
            [row] => {
                report.assigned += 1;
                values[*row]
            }
            [] => {
                log::warn!("0 records found for leaf name {name}, assigning '{UNDEF}'");
                report.unmatched.push(name);
                UNDEF
            }
            _ => {
                log::warn!("{} records found for leaf name {name}, assigning '{UNDEF}'", rows.len());
                report.ambiguous.push((name, rows.len()));
                UNDEF
            }
        };
        tree[leaf]
            .traits_mut()
            .insert(trait_name.to_string(), value.to_string());
    }

    Ok(report)
}

/// Sets trait `trait_name` of every internal vertex to the value all leaves
/// below it share, or [UNDEF] if they differ.
///
/// Leaves without the trait count as [UNDEF].
///
/// # Returns
/// Number of internal vertices with a shared value other than [UNDEF]
pub fn assign_inode_traits(tree: &mut PhyloTree, trait_name: &str) -> usize {
    let order: Vec<VertexIndex> = tree.post_order_iter().map(|v| v.index()).collect();
    let mut shared: Vec<Option<String>> = vec![None; tree.num_vertices()];
    let mut num_shared = 0;

    for index in order {
        let vertex = &tree[index];
        let value = if vertex.is_leaf() {
            vertex.trait_value(trait_name).unwrap_or(UNDEF).to_string()
        } else {
            let mut child_values = vertex.children().iter().map(|&c| shared[c].as_deref());
            let first = child_values.next().flatten().unwrap_or(UNDEF);
            let value = if child_values.all(|v| v == Some(first)) {
                first.to_string()
            } else {
                String::from(UNDEF)
            };

            if value != UNDEF {
                num_shared += 1;
            }
            tree[index]
                .traits_mut()
                .insert(trait_name.to_string(), value.clone());
            value
        };
        shared[index] = Some(value);
    }

    num_shared
}
