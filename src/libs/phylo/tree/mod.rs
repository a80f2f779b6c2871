pub mod decompose;
pub mod io;
pub mod ops;
pub mod query;
pub mod traversal;

use super::node::{Node, NodeId};

#[derive(Debug, Default, Clone)]
pub struct Tree {
    /// Arena storage for all nodes
    pub(super) nodes: Vec<Node>,

    /// Optional root ID (a tree might be empty or in construction)
    pub(super) root: Option<NodeId>,
}

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new node to the tree. Returns the new node's ID.
    pub fn add_node(&mut self) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id));
        id
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| !n.deleted).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_root(&self) -> Option<NodeId> {
        self.root
    }

    /// Get a reference to a node by ID. Deleted nodes are invisible.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).filter(|n| !n.deleted)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).filter(|n| !n.deleted)
    }

    /// Set a node as the root of the tree.
    pub fn set_root(&mut self, id: NodeId) {
        if self.get_node(id).is_some() {
            self.root = Some(id);
        }
    }

    // --- Delegation to ops ---

    pub fn add_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<(), String> {
        ops::add_child(self, parent_id, child_id)
    }

    pub fn remove_node(&mut self, id: NodeId, recursive: bool) {
        ops::remove_node(self, id, recursive)
    }

    pub fn collapse_node(&mut self, id: NodeId) -> Result<(), String> {
        ops::collapse_node(self, id)
    }

    pub fn prune_leaf(&mut self, id: NodeId) -> Result<(), String> {
        ops::prune_leaf(self, id)
    }

    pub fn prune_taxa<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        ops::prune_taxa(self, names)
    }

    // --- Delegation to traversal ---

    pub fn preorder(&self, start_node: &NodeId) -> Vec<NodeId> {
        traversal::preorder(self, *start_node)
    }

    pub fn postorder(&self, start_node: &NodeId) -> Vec<NodeId> {
        traversal::postorder(self, *start_node)
    }

    pub fn extract_subtree(&self, root_id: &NodeId) -> Result<Tree, String> {
        traversal::extract_subtree(self, *root_id)
    }

    // --- Delegation to query ---

    pub fn get_node_by_name(&self, name: &str) -> Option<NodeId> {
        query::get_node_by_name(self, name)
    }

    pub fn get_leaves(&self) -> Vec<NodeId> {
        match self.root {
            Some(root) => query::get_leaves(self, root),
            None => Vec::new(),
        }
    }

    pub fn leaf_names(&self) -> Vec<String> {
        match self.root {
            Some(root) => query::get_leaf_names(self, root),
            None => Vec::new(),
        }
    }

    pub fn pendant_lengths(&self) -> Vec<(String, f64)> {
        query::pendant_lengths(self)
    }

    // --- Delegation to decompose ---

    pub fn centroid_decomposition(
        &self,
        max_size: usize,
    ) -> Result<Vec<Vec<String>>, crate::libs::phylo::TreeError> {
        decompose::centroid_decomposition(self, max_size)
    }

    // --- Delegation to io ---

    pub fn from_file(infile: &str) -> anyhow::Result<Tree> {
        io::from_file(infile)
    }

    pub fn to_newick(&self) -> String {
        io::to_newick(self)
    }
}
