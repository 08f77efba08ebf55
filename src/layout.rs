//! Rectangular plot coordinates for a [PhyloTree].
//!
//! `x` is the distance from the root, leaves are stacked at `y = 0, 1, 2, ...`
//! in pre-order, and each internal vertex sits at the mean `y` of its
//! children. Sort the branches beforehand ([PhyloTree::sort_branches]) for a
//! ladderized picture.

use crate::model::{PhyloTree, VertexIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Horizontal,
    Vertical,
}

/// A branch line.
///
/// Horizontal segments run from the parent's `x` to the child's `x` at the
/// child's `y`; vertical segments join the first and last child of `parent`.
#[derive(Debug, Clone, PartialEq)]
pub struct RectSegment {
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub parent: VertexIndex,
    pub child: Option<VertexIndex>,
    pub kind: SegmentKind,
}

#[derive(Debug, Clone)]
pub struct TreeLayout {
    /// `(x, y)` per vertex, by index
    pub positions: Vec<(f64, f64)>,
    pub segments: Vec<RectSegment>,
    /// Largest root-to-leaf distance
    pub tree_height: f64,
    /// Vertical extent of the leaves, at least 1
    pub y_span: f64,
    pub leaf_count: usize,
}

impl TreeLayout {
    /// Computes the layout, `None` if the tree has no root.
    ///
    /// # Example
    /// ```
    /// use phylotraits::layout::TreeLayout;
    /// use phylotraits::newick::parse_str;
    ///
    /// let tree = parse_str("((A:1,B:2)ab:1,C:1);").unwrap();
    /// let layout = TreeLayout::compute(&tree).unwrap();
    /// let ab = tree.find_by_name("ab").unwrap();
    /// assert_eq!(layout.position(ab), (1.0, 0.5));
    /// assert_eq!(layout.tree_height, 3.0);
    /// assert_eq!(layout.y_span, 2.0);
    /// ```
    pub fn compute(tree: &PhyloTree) -> Option<Self> {
        if !tree.is_root_set() {
            return None;
        }

        let heights = tree.heights();
        let mut positions = vec![(0.0, 0.0); tree.num_vertices()];

        let leaves = tree.leaf_indices();
        for (i, &leaf) in leaves.iter().enumerate() {
            positions[leaf] = (heights[leaf], i as f64);
        }

        for vertex in tree.post_order_iter() {
            let index = vertex.index();
            let children = vertex.children();
            if children.is_empty() {
                continue;
            }
            let mean_y = children.iter().map(|&c| positions[c].1).sum::<f64>() / children.len() as f64;
            positions[index] = (heights[index], mean_y);
        }

        let mut segments = Vec::with_capacity(tree.num_vertices() * 2);
        for vertex in tree.pre_order_iter() {
            let index = vertex.index();
            let (x, y) = positions[index];
            let parent_x = vertex.parent().map_or(x, |p| positions[p].0);
            segments.push(RectSegment {
                start: (parent_x, y),
                end: (x, y),
                parent: vertex.parent().unwrap_or(index),
                child: Some(index),
                kind: SegmentKind::Horizontal,
            });

            if let (Some(&first), Some(&last)) = (vertex.children().first(), vertex.children().last()) {
                segments.push(RectSegment {
                    start: (x, positions[first].1),
                    end: (x, positions[last].1),
                    parent: index,
                    child: None,
                    kind: SegmentKind::Vertical,
                });
            }
        }

        let leaf_count = leaves.len();
        let y_span = if leaf_count > 1 { (leaf_count - 1) as f64 } else { 1.0 };
        let tree_height = leaves.iter().map(|&l| heights[l]).fold(0.0, f64::max);

        Some(Self {
            positions,
            segments,
            tree_height,
            y_span,
            leaf_count,
        })
    }

    pub fn position(&self, index: VertexIndex) -> (f64, f64) {
        self.positions[index]
    }

    pub fn x(&self, index: VertexIndex) -> f64 {
        self.positions[index].0
    }

    pub fn y(&self, index: VertexIndex) -> f64 {
        self.positions[index].1
    }
}
