use foundation::ids::{BinId, numeric_id};
use serde::{Deserialize, Serialize};

/// A genomic bin positioned in 3D space.
///
/// Field names mirror the dataset JSON exactly; the derived numeric id is
/// computed on demand rather than stored, keeping deserialization a straight
/// mapping of the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node3D {
    pub id: String,
    #[serde(rename = "ChID")]
    pub ch_id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Node3D {
    pub fn bin_id(&self) -> Option<BinId> {
        numeric_id(&self.id)
    }
}

/// A genomic bin positioned in the 2D projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node2D {
    pub id: String,
    #[serde(rename = "ChID")]
    pub ch_id: String,
    pub x: f64,
    pub y: f64,
}

impl Node2D {
    pub fn bin_id(&self) -> Option<BinId> {
        numeric_id(&self.id)
    }
}

/// A weighted, typed interaction between two bins.
///
/// Multiple edges may share a `(Source, Target)` pair only when they carry
/// distinct interaction codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "Source")]
    pub source: u32,
    #[serde(rename = "Target")]
    pub target: u32,
    #[serde(rename = "Weight")]
    pub weight: f64,
    #[serde(rename = "Interaction")]
    pub interaction: i32,
}

/// Optional per-bin gene density track; absent for some organisms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneDensity {
    pub node: u32,
    pub density: f64,
}

/// Malformed JSON in a dataset resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed JSON in {}: {}", self.path, self.message)
    }
}

impl std::error::Error for ParseError {}

fn parse<T: for<'de> Deserialize<'de>>(path: &str, raw: &str) -> Result<Vec<T>, ParseError> {
    serde_json::from_str::<Vec<T>>(raw).map_err(|e| ParseError {
        path: path.to_string(),
        message: e.to_string(),
    })
}

pub fn parse_nodes_3d(path: &str, raw: &str) -> Result<Vec<Node3D>, ParseError> {
    parse(path, raw)
}

pub fn parse_nodes_2d(path: &str, raw: &str) -> Result<Vec<Node2D>, ParseError> {
    parse(path, raw)
}

pub fn parse_edges(path: &str, raw: &str) -> Result<Vec<Edge>, ParseError> {
    parse(path, raw)
}

pub fn parse_gene_density(path: &str, raw: &str) -> Result<Vec<GeneDensity>, ParseError> {
    parse(path, raw)
}

#[cfg(test)]
mod tests {
    use super::{parse_edges, parse_nodes_2d, parse_nodes_3d};
    use foundation::ids::BinId;
    use pretty_assertions::assert_eq;

    #[test]
    fn nodes_3d_round_trip_wire_names() {
        let raw = r#"[{"id":"Node7","ChID":"1","x":1.5,"y":-2.0,"z":0.25}]"#;
        let nodes = parse_nodes_3d("t.json", raw).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, "Node7");
        assert_eq!(nodes[0].ch_id, "1");
        assert_eq!(nodes[0].bin_id(), Some(BinId(7)));
    }

    #[test]
    fn nodes_2d_omit_z() {
        let raw = r#"[{"id":"Node3","ChID":"2","x":0.0,"y":4.0}]"#;
        let nodes = parse_nodes_2d("t.json", raw).unwrap();
        assert_eq!(nodes[0].bin_id(), Some(BinId(3)));
    }

    #[test]
    fn edges_use_capitalized_wire_names() {
        let raw = r#"[{"Source":1,"Target":2,"Weight":0.75,"Interaction":0}]"#;
        let edges = parse_edges("t.json", raw).unwrap();
        assert_eq!(edges[0].source, 1);
        assert_eq!(edges[0].target, 2);
        assert_eq!(edges[0].weight, 0.75);
        assert_eq!(edges[0].interaction, 0);
    }

    #[test]
    fn malformed_json_names_the_resource() {
        let err = parse_edges("Bacillus_30C_Edge.json", "not json").unwrap_err();
        assert_eq!(err.path, "Bacillus_30C_Edge.json");
        assert!(!err.message.is_empty());
    }
}
