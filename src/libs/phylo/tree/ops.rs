use super::Tree;
use crate::libs::phylo::node::NodeId;

/// Add a child to a parent node.
/// Updates both parent's `children` list and child's `parent` field.
pub fn add_child(tree: &mut Tree, parent_id: NodeId, child_id: NodeId) -> Result<(), String> {
    if parent_id == child_id {
        return Err("Cannot add node as child of itself".to_string());
    }
    if tree.get_node(parent_id).is_none() {
        return Err(format!("Parent node {} not found or deleted", parent_id));
    }
    if tree.get_node(child_id).is_none() {
        return Err(format!("Child node {} not found or deleted", child_id));
    }
    if let Some(old_parent) = tree.nodes[child_id].parent {
        return Err(format!(
            "Node {} already has parent {}",
            child_id, old_parent
        ));
    }

    tree.nodes[child_id].parent = Some(parent_id);
    tree.nodes[parent_id].children.push(child_id);

    Ok(())
}

/// Soft remove a node and its descendants (optional recursive).
/// If recursive is false, children are orphaned (parent set to None).
pub fn remove_node(tree: &mut Tree, id: NodeId, recursive: bool) {
    if id >= tree.nodes.len() || tree.nodes[id].deleted {
        return;
    }

    if let Some(parent_id) = tree.nodes[id].parent {
        if let Some(parent) = tree.get_node_mut(parent_id) {
            parent.children.retain(|&child| child != id);
        }
    }

    let children = tree.nodes[id].children.clone();
    for child_id in children {
        if recursive {
            remove_node(tree, child_id, true);
        } else if let Some(child) = tree.get_node_mut(child_id) {
            child.parent = None;
        }
    }

    let node = &mut tree.nodes[id];
    node.deleted = true;
    node.children.clear();
    node.parent = None;

    if tree.root == Some(id) {
        tree.root = None;
    }
}

/// Collapse a node, removing it and connecting its children to its parent.
/// Edge lengths are summed (parent->node + node->child).
pub fn collapse_node(tree: &mut Tree, id: NodeId) -> Result<(), String> {
    let node = tree.get_node(id).ok_or(format!("Node {} not found", id))?;
    let parent_id = match node.parent {
        Some(p) if tree.root != Some(id) => p,
        _ => return Err("Cannot collapse root node".to_string()),
    };
    let parent_edge = node.length;
    let children = node.children.clone();

    for &child_id in &children {
        if let Some(child) = tree.get_node_mut(child_id) {
            child.parent = Some(parent_id);
            child.length = match (parent_edge, child.length) {
                (Some(p), Some(c)) => Some(p + c),
                (Some(p), None) => Some(p),
                (None, c) => c,
            };
        }
    }

    if let Some(parent) = tree.get_node_mut(parent_id) {
        if let Some(pos) = parent.children.iter().position(|&x| x == id) {
            parent.children.splice(pos..pos + 1, children);
        }
    }

    let node = &mut tree.nodes[id];
    node.deleted = true;
    node.children.clear();
    node.parent = None;

    Ok(())
}

/// Remove a leaf and restore a clean topology around it.
///
/// * A parent left without children is pruned in turn.
/// * A parent left with a single child is collapsed, its edge length added to the child's.
/// * A root left with a single child hands the root over to that child.
pub fn prune_leaf(tree: &mut Tree, id: NodeId) -> Result<(), String> {
    let node = tree.get_node(id).ok_or(format!("Node {} not found", id))?;
    if !node.is_leaf() {
        return Err(format!("Node {} is not a leaf", id));
    }
    let parent = node.parent;

    remove_node(tree, id, false);

    let Some(parent_id) = parent else {
        return Ok(());
    };
    let siblings = tree.nodes[parent_id].children.clone();
    match siblings.as_slice() {
        [] => prune_leaf(tree, parent_id),
        [only] if tree.root == Some(parent_id) => {
            let only = *only;
            let old_root = &mut tree.nodes[parent_id];
            old_root.deleted = true;
            old_root.children.clear();
            if let Some(child) = tree.get_node_mut(only) {
                child.parent = None;
                child.length = None;
            }
            tree.root = Some(only);
            Ok(())
        }
        [_] => collapse_node(tree, parent_id),
        _ => Ok(()),
    }
}

/// Prune every named leaf in `names`, in the given order.
/// Returns the names that were actually found and removed.
pub fn prune_taxa<S: AsRef<str>>(tree: &mut Tree, names: &[S]) -> Vec<String> {
    let mut removed = Vec::new();
    for name in names {
        let name = name.as_ref();
        let Some(id) = tree.get_node_by_name(name) else {
            continue;
        };
        if tree.get_node(id).is_some_and(|n| n.is_leaf()) && prune_leaf(tree, id).is_ok() {
            removed.push(name.to_string());
        }
    }
    removed
}
