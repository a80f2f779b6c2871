use super::Tree;
use crate::libs::phylo::node::NodeId;

/// Get node IDs in preorder traversal (Root -> Children)
pub fn preorder(tree: &Tree, start_node: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut stack = vec![start_node];

    while let Some(id) = stack.pop() {
        if let Some(node) = tree.get_node(id) {
            result.push(id);
            // Push children in reverse order so they are processed in order
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
    }

    result
}

/// Get node IDs in postorder traversal (Children -> Root)
pub fn postorder(tree: &Tree, start_node: NodeId) -> Vec<NodeId> {
    fn helper(tree: &Tree, id: NodeId, result: &mut Vec<NodeId>) {
        if let Some(node) = tree.get_node(id) {
            for &child in &node.children {
                helper(tree, child, result);
            }
            result.push(id);
        }
    }

    let mut result = Vec::new();
    helper(tree, start_node, &mut result);
    result
}

/// Copy the subtree rooted at `node_id` into a new, compact Tree.
/// The new root keeps its original edge length.
pub fn extract_subtree(tree: &Tree, node_id: NodeId) -> Result<Tree, String> {
    if tree.get_node(node_id).is_none() {
        return Err(format!("Node {} not found", node_id));
    }

    let mut new_tree = Tree::new();
    let mut stack = vec![(node_id, None::<NodeId>)]; // (old_id, new_parent_id)

    while let Some((old_id, new_parent)) = stack.pop() {
        let Some(old_node) = tree.get_node(old_id) else {
            continue;
        };

        let new_id = new_tree.add_node();
        if let Some(new_node) = new_tree.get_node_mut(new_id) {
            new_node.name = old_node.name.clone();
            new_node.length = old_node.length;
        }

        match new_parent {
            Some(p) => super::ops::add_child(&mut new_tree, p, new_id)?,
            None => new_tree.set_root(new_id),
        }

        for &child in old_node.children.iter().rev() {
            stack.push((child, Some(new_id)));
        }
    }

    Ok(new_tree)
}
