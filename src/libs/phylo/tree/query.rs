use super::Tree;
use crate::libs::phylo::node::NodeId;

/// First live node carrying `name`.
pub fn get_node_by_name(tree: &Tree, name: &str) -> Option<NodeId> {
    tree.nodes
        .iter()
        .find(|n| !n.deleted && n.name.as_deref() == Some(name))
        .map(|n| n.id)
}

/// IDs of all leaves under `id`, in preorder.
pub fn get_leaves(tree: &Tree, id: NodeId) -> Vec<NodeId> {
    super::traversal::preorder(tree, id)
        .into_iter()
        .filter(|&n| tree.get_node(n).is_some_and(|node| node.is_leaf()))
        .collect()
}

/// Names of the leaves under `id`, in preorder. Unnamed leaves are skipped.
pub fn get_leaf_names(tree: &Tree, id: NodeId) -> Vec<String> {
    get_leaves(tree, id)
        .into_iter()
        .filter_map(|leaf| tree.get_node(leaf).and_then(|n| n.name.clone()))
        .collect()
}

/// Named leaves with the length of their pendant edge, in preorder.
/// A missing length counts as 0.
pub fn pendant_lengths(tree: &Tree) -> Vec<(String, f64)> {
    let Some(root) = tree.get_root() else {
        return Vec::new();
    };
    get_leaves(tree, root)
        .into_iter()
        .filter_map(|leaf| tree.get_node(leaf))
        .filter_map(|n| {
            n.name
                .as_ref()
                .map(|name| (name.clone(), n.length.unwrap_or(0.0)))
        })
        .collect()
}
