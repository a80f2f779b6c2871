use super::Tree;
use crate::libs::phylo::node::NodeId;
use itertools::Itertools;
use std::io::Read;

/// Read a single Newick tree from a file ("stdin" for stdin, `.gz` accepted).
pub fn from_file(infile: &str) -> anyhow::Result<Tree> {
    let mut reader = crate::libs::io::reader(infile)?;
    let mut newick = String::new();
    reader
        .read_to_string(&mut newick)
        .map_err(|e| anyhow::anyhow!("Read error: {}", e))?;
    Ok(Tree::from_newick(newick.as_str())?)
}

/// Serialize tree to a single-line Newick string.
pub fn to_newick(tree: &Tree) -> String {
    match tree.get_root() {
        Some(root) => {
            let mut s = to_newick_recursive(tree, root);
            s.push(';');
            s
        }
        None => ";".to_string(),
    }
}

fn to_newick_recursive(tree: &Tree, node_id: NodeId) -> String {
    let Some(node) = tree.get_node(node_id) else {
        return String::new();
    };

    let mut node_info = String::new();
    if let Some(name) = &node.name {
        node_info.push_str(&quote_label(name));
    }
    if let Some(len) = node.length {
        node_info.push_str(&format!(":{}", len));
    }

    if node.children.is_empty() {
        node_info
    } else {
        let children = node
            .children
            .iter()
            .map(|&child| to_newick_recursive(tree, child))
            .join(",");
        format!("({}){}", children, node_info)
    }
}

fn quote_label(label: &str) -> String {
    let needs_quote = label
        .chars()
        .any(|c| "():;,[]'".contains(c) || c.is_whitespace());
    if needs_quote {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}
