/// NodeId is an index into the Tree's node vector.
pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct Node {
    /// Index in the arena
    pub id: NodeId,

    /// Parent node ID (None for root)
    pub parent: Option<NodeId>,

    pub children: Vec<NodeId>,

    /// Taxon label for leaves, optional support/clade label for internal nodes
    pub name: Option<String>,

    /// Length of the edge to the parent
    pub length: Option<f64>,

    /// Soft deletion flag. Deleted nodes stay in the arena and are skipped by every query.
    pub deleted: bool,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            name: None,
            length: None,
            deleted: false,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
