//! Centroid-edge decomposition of a tree's leaf set.
//!
//! The leaf set is cut at the edge that best balances the leaf counts on its two sides,
//! then each side is cut again until every part holds at most `max_size` leaves.

use super::Tree;
use crate::libs::phylo::error::TreeError;
use crate::libs::phylo::node::NodeId;

/// Split the leaves of `tree` into disjoint parts of at most `max_size` leaves.
///
/// The side below the cut edge is emitted before the side above it, so the order of the
/// parts only depends on the tree.
///
/// ```
/// use divmsa::libs::phylo::Tree;
///
/// let tree = Tree::from_newick("(((A,B),(C,D)),((E,F),(G,H)));").unwrap();
/// let parts = tree.centroid_decomposition(4).unwrap();
/// assert_eq!(parts, vec![vec!["A", "B", "C", "D"], vec!["E", "F", "G", "H"]]);
/// ```
pub fn centroid_decomposition(tree: &Tree, max_size: usize) -> Result<Vec<Vec<String>>, TreeError> {
    if max_size == 0 {
        return Err(TreeError::LogicError(
            "Decomposition size must be at least 1".to_string(),
        ));
    }

    let mut parts = Vec::new();
    if tree.get_root().is_some() {
        split(tree.clone(), max_size, &mut parts)?;
    }
    Ok(parts)
}

fn split(tree: Tree, max_size: usize, parts: &mut Vec<Vec<String>>) -> Result<(), TreeError> {
    let Some(root) = tree.get_root() else {
        return Ok(());
    };

    let counts = leaf_counts(&tree, root);
    let total = counts[root];
    if total <= max_size {
        let names = tree.leaf_names();
        if !names.is_empty() {
            parts.push(names);
        }
        return Ok(());
    }

    let centroid = tree
        .preorder(&root)
        .into_iter()
        .skip(1)
        .filter(|&id| counts[id] > 0 && counts[id] < total)
        .min_by_key(|&id| total.abs_diff(2 * counts[id]))
        .ok_or_else(|| TreeError::LogicError(format!("No edge splits the {} leaves", total)))?;

    let below = tree
        .extract_subtree(&centroid)
        .map_err(TreeError::LogicError)?;

    let mut above = tree;
    for leaf in super::query::get_leaves(&above, centroid) {
        super::ops::prune_leaf(&mut above, leaf).map_err(TreeError::LogicError)?;
    }

    split(below, max_size, parts)?;
    split(above, max_size, parts)
}

// Indexed by arena id; deleted nodes stay 0.
fn leaf_counts(tree: &Tree, root: NodeId) -> Vec<usize> {
    let mut counts = vec![0; tree.nodes.len()];
    for id in tree.postorder(&root) {
        if let Some(node) = tree.get_node(id) {
            counts[id] = if node.is_leaf() {
                1
            } else {
                node.children.iter().map(|&c| counts[c]).sum()
            };
        }
    }
    counts
}
