use crate::libs::alignment::Alignment;
use crate::libs::phylo::Tree;

/// Result of the long-branch filter.
#[derive(Debug, Clone)]
pub struct Filtered {
    pub tree: Tree,
    pub backbone: Alignment,
    /// Pruned taxa in tree preorder.
    pub filtered: Vec<String>,
    /// The pruned taxa, ungapped, ready for the fragment pool.
    pub demoted: Alignment,
}

/// Upper median of the leaf pendant edge lengths. `None` for a tree without named leaves.
pub fn median_pendant_length(tree: &Tree) -> Option<f64> {
    let mut lengths: Vec<f64> = tree.pendant_lengths().into_iter().map(|(_, l)| l).collect();
    if lengths.is_empty() {
        return None;
    }
    lengths.sort_by(|a, b| a.total_cmp(b));
    Some(lengths[lengths.len() / 2])
}

/// Prunes leaves whose pendant edge is longer than `threshold` times the median.
///
/// Pruned taxa leave the backbone alignment and come back ungapped in `demoted`.
/// Without a threshold everything passes through.
pub fn filter_long_branches(tree: Tree, backbone: Alignment, threshold: Option<f64>) -> Filtered {
    let pass = |tree, backbone| Filtered {
        tree,
        backbone,
        filtered: Vec::new(),
        demoted: Alignment::new(),
    };

    let Some(threshold) = threshold else {
        return pass(tree, backbone);
    };
    let Some(median) = median_pendant_length(&tree) else {
        return pass(tree, backbone);
    };
    let cutoff = threshold * median;

    let long: Vec<String> = tree
        .pendant_lengths()
        .into_iter()
        .filter(|(_, length)| *length > cutoff)
        .map(|(name, _)| name)
        .collect();
    if long.is_empty() {
        log::info!("No long branches above {:.4} (median {:.4})", cutoff, median);
        return pass(tree, backbone);
    }

    let mut tree = tree;
    let filtered = tree.prune_taxa(&long);
    let mut backbone = backbone;
    let demoted = backbone.split_off(&filtered).ungapped();

    log::info!(
        "Filtered {} long-branch taxa (pendant length > {:.4}): {}",
        filtered.len(),
        cutoff,
        filtered.join(", ")
    );

    Filtered {
        tree,
        backbone,
        filtered,
        demoted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn backbone(names: &[&str]) -> Alignment {
        Alignment::from_pairs(names.iter().map(|n| (*n, b"AC-GT".to_vec()))).unwrap()
    }

    #[test]
    fn test_median_pendant_length() {
        let tree = Tree::from_newick("((A:1,B:2):1,(C:3,D:10):1);").unwrap();
        assert_relative_eq!(median_pendant_length(&tree).unwrap(), 3.0);

        let tree = Tree::from_newick("(A:1,B:2,C:4);").unwrap();
        assert_relative_eq!(median_pendant_length(&tree).unwrap(), 2.0);

        assert!(median_pendant_length(&Tree::new()).is_none());
    }

    #[test]
    fn test_filter_prunes_and_demotes() {
        let tree = Tree::from_newick("((A:1,B:1):0.5,(C:1,D:9):0.5,E:1);").unwrap();
        let out = filter_long_branches(tree, backbone(&["A", "B", "C", "D", "E"]), Some(2.0));

        assert_eq!(out.filtered, vec!["D"]);
        assert_eq!(out.tree.leaf_names(), vec!["A", "B", "C", "E"]);
        assert_eq!(out.tree.to_newick(), "((A:1,B:1):0.5,C:1.5,E:1);");
        assert_eq!(out.backbone.num_taxa(), 4);
        assert!(!out.backbone.contains("D"));
        assert_eq!(out.demoted.get("D").unwrap(), b"ACGT");
    }

    #[test]
    fn test_filter_disabled() {
        let tree = Tree::from_newick("(A:1,B:100);").unwrap();
        let out = filter_long_branches(tree, backbone(&["A", "B"]), None);
        assert!(out.filtered.is_empty());
        assert!(out.demoted.is_empty());
        assert_eq!(out.backbone.num_taxa(), 2);
    }

    #[test]
    fn test_filter_equal_lengths_noop() {
        let tree = Tree::from_newick("((A:2,B:2):1,(C:2,D:2):1);").unwrap();
        for t in [1.0, 1.5, 4.0] {
            let out = filter_long_branches(
                tree.clone(),
                backbone(&["A", "B", "C", "D"]),
                Some(t),
            );
            assert!(out.filtered.is_empty());
            assert_eq!(out.tree.leaf_names().len(), 4);
        }
    }

    #[test]
    fn test_filter_order_is_preorder() {
        let tree = Tree::from_newick("((A:9,B:1):1,(C:1,D:8):1,E:1,F:1);").unwrap();
        let out = filter_long_branches(
            tree,
            backbone(&["F", "E", "D", "C", "B", "A"]),
            Some(3.0),
        );
        assert_eq!(out.filtered, vec!["A", "D"]);
        assert_eq!(out.demoted.names().collect::<Vec<_>>(), vec!["D", "A"]);
    }
}
