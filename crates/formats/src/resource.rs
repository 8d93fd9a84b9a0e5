use std::fmt;

/// The four sub-resources that make up one dataset.
///
/// A dataset is only usable once all four are present; the loader treats a
/// failure on any of them as a failure of the whole dataset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Nodes3D,
    Nodes2D,
    EdgesTopK,
    EdgesFull,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Nodes3D,
        ResourceKind::Nodes2D,
        ResourceKind::EdgesTopK,
        ResourceKind::EdgesFull,
    ];

    /// File-name suffix of this resource within a dataset family.
    pub fn suffix(self) -> &'static str {
        match self {
            ResourceKind::Nodes3D => "Node_3D",
            ResourceKind::Nodes2D => "Node_2D",
            ResourceKind::EdgesTopK => "Edge_top10_interactions",
            ResourceKind::EdgesFull => "Edge_processed_with_interaction",
        }
    }

    /// Store key of this resource inside the persistent dataset store.
    pub fn storage_key(self) -> &'static str {
        match self {
            ResourceKind::Nodes3D => "nodeData3D",
            ResourceKind::Nodes2D => "nodeData2D",
            ResourceKind::EdgesTopK => "edgeData",
            ResourceKind::EdgesFull => "heatmapData",
        }
    }

    /// Fetch path for this resource of `dataset`, e.g.
    /// `Bacillus_30C_Node_3D.json`.
    pub fn path(self, dataset: &str) -> String {
        format!("{}_{}.json", dataset, self.suffix())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}
