use std::collections::BTreeMap;

use formats::{Edge, Node3D};
use foundation::color::{Color, WeightRamp};
use foundation::ids::BinId;
use foundation::math::Vec3;

/// Raw dataset coordinates are compressed into scene units.
pub const POSITION_SCALE: f64 = 0.1;
pub const NODE_RADIUS: f64 = 0.35;

pub const START_NODE_COLOR: Color = Color::from_hex(0x00FF00);
pub const END_NODE_COLOR: Color = Color::from_hex(0x0000FF);
pub const HIGHLIGHT_COLOR: Color = Color::from_hex(0xFFAA18);
pub const HOVER_EMISSIVE: Color = Color::from_hex(0xFFFF00);
pub const CLICK_EMISSIVE: Color = Color::from_hex(0xFF0000);

pub const EDGE_RAMP_LIGHT: Color = Color::from_hex(0xADD8E6);
pub const EDGE_RAMP_DARK: Color = Color::from_hex(0x00008B);

/// Bins that always carry a text label when present in the dataset.
pub const LABELED_BINS: [u32; 9] = [1, 50, 100, 150, 200, 250, 300, 350, 400];

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub bin: BinId,
    pub position: Vec3,
    /// Resting color: chromosome hash, or the fixed start/end colors.
    pub base_color: Color,
    /// Currently displayed color; diverges from base while highlighted.
    pub color: Color,
    pub emissive: Option<Color>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneLine {
    pub source: BinId,
    pub target: BinId,
    pub from: Vec3,
    pub to: Vec3,
    pub color: Color,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneLabel {
    pub bin: BinId,
    pub text: String,
    pub position: Vec3,
}

/// The 3D scene: one sphere per bin, one line per rendered edge.
///
/// Nodes are keyed by bin id in a `BTreeMap` so traversal (and therefore
/// emitted draw order) is deterministic.
#[derive(Debug, Default)]
pub struct SceneWorld {
    nodes: BTreeMap<BinId, SceneNode>,
    lines: Vec<SceneLine>,
    labels: Vec<SceneLabel>,
    hovered: Option<BinId>,
    clicked: Option<BinId>,
}

impl SceneWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.lines.clear();
        self.labels.clear();
        self.hovered = None;
        self.clicked = None;
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.values()
    }

    pub fn node(&self, bin: BinId) -> Option<&SceneNode> {
        self.nodes.get(&bin)
    }

    pub fn lines(&self) -> &[SceneLine] {
        &self.lines
    }

    pub fn labels(&self) -> &[SceneLabel] {
        &self.labels
    }

    pub fn hovered(&self) -> Option<BinId> {
        self.hovered
    }

    pub fn clicked(&self) -> Option<BinId> {
        self.clicked
    }

    /// Rebuilds all spheres from a dataset, clearing everything first.
    ///
    /// The numerically-first and numerically-last bins get the fixed start
    /// and end colors; every other bin is colored by chromosome hash. Nodes
    /// whose id carries no digits are skipped with a log line.
    pub fn build_nodes(&mut self, nodes: &[Node3D]) {
        self.clear();

        let bins: Vec<BinId> = nodes.iter().filter_map(|n| n.bin_id()).collect();
        let first = bins.iter().min().copied();
        let last = bins.iter().max().copied();

        for node in nodes {
            let Some(bin) = node.bin_id() else {
                log::warn!("node id '{}' has no numeric part; skipped", node.id);
                continue;
            };
            let base_color = if Some(bin) == first {
                START_NODE_COLOR
            } else if Some(bin) == last {
                END_NODE_COLOR
            } else {
                foundation::color::chromosome_color(&node.ch_id)
            };
            let position = Vec3::new(node.x, node.y, node.z).scale(POSITION_SCALE);
            self.nodes.insert(
                bin,
                SceneNode {
                    bin,
                    position,
                    base_color,
                    color: base_color,
                    emissive: None,
                },
            );
            if LABELED_BINS.contains(&bin.value()) {
                self.labels.push(SceneLabel {
                    bin,
                    text: format!("Bin {bin}"),
                    position,
                });
            }
        }
    }

    /// Draws one line per edge between instantiated endpoint spheres.
    ///
    /// Edges whose endpoints are not in the scene are logged and skipped,
    /// never aborting the batch; the skip count is returned. Line colors
    /// come from the weight ramp over this batch's extent, with the
    /// maximum-weight edge pinned to the dark end.
    pub fn build_edges(&mut self, edges: &[Edge], opacity: f64) -> usize {
        self.lines.clear();

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for edge in edges {
            min = min.min(edge.weight);
            max = max.max(edge.weight);
        }
        let ramp = WeightRamp::new(EDGE_RAMP_LIGHT, EDGE_RAMP_DARK, min, max);

        let mut skipped = 0usize;
        for edge in edges {
            let (Some(from), Some(to)) = (
                self.nodes.get(&BinId(edge.source)),
                self.nodes.get(&BinId(edge.target)),
            ) else {
                log::warn!(
                    "edge {} -> {} references a bin missing from the scene; skipped",
                    edge.source,
                    edge.target
                );
                skipped += 1;
                continue;
            };
            self.lines.push(SceneLine {
                source: BinId(edge.source),
                target: BinId(edge.target),
                from: from.position,
                to: to.position,
                color: ramp.color_for(edge.weight),
                opacity,
            });
        }
        skipped
    }

    pub fn clear_edges(&mut self) {
        self.lines.clear();
    }

    /// Applies the shared link-opacity slider to every line in place, with
    /// no geometry rebuild.
    pub fn set_line_opacity(&mut self, opacity: f64) {
        for line in &mut self.lines {
            line.opacity = opacity;
        }
    }

    /// Recolors the matched spheres to the highlight color and everything
    /// else back to its resting color. Idempotent: repeating the same id
    /// set changes nothing.
    pub fn highlight_nodes(&mut self, ids: &std::collections::BTreeSet<BinId>) {
        for node in self.nodes.values_mut() {
            node.color = if ids.contains(&node.bin) {
                HIGHLIGHT_COLOR
            } else {
                node.base_color
            };
        }
    }

    /// Moves the hover emissive to `bin` (or clears it), restoring the
    /// previous hover target. A clicked node keeps its click emissive.
    pub fn set_hovered(&mut self, bin: Option<BinId>) {
        if self.hovered == bin {
            return;
        }
        if let Some(previous) = self.hovered.take() {
            self.set_emissive(previous, None);
        }
        if let Some(bin) = bin {
            if let Some(node) = self.nodes.get_mut(&bin) {
                node.emissive = Some(HOVER_EMISSIVE);
                self.hovered = Some(bin);
            }
        }
        self.restore_click_emissive();
    }

    /// Mirrors the session's click selection into the scene.
    pub fn set_clicked(&mut self, bin: Option<BinId>) {
        if let Some(previous) = self.clicked.take() {
            if self.hovered != Some(previous) {
                self.set_emissive(previous, None);
            }
        }
        self.clicked = bin.filter(|b| self.nodes.contains_key(b));
        self.restore_click_emissive();
    }

    fn restore_click_emissive(&mut self) {
        if let Some(clicked) = self.clicked {
            if self.hovered != Some(clicked) {
                self.set_emissive(clicked, Some(CLICK_EMISSIVE));
            }
        }
    }

    fn set_emissive(&mut self, bin: BinId, emissive: Option<Color>) {
        if let Some(node) = self.nodes.get_mut(&bin) {
            node.emissive = emissive;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        END_NODE_COLOR, EDGE_RAMP_DARK, HIGHLIGHT_COLOR, HOVER_EMISSIVE, POSITION_SCALE,
        SceneWorld, START_NODE_COLOR,
    };
    use formats::{Edge, Node3D};
    use foundation::ids::BinId;
    use std::collections::BTreeSet;

    fn node(id: &str, ch: &str, x: f64) -> Node3D {
        Node3D {
            id: id.to_string(),
            ch_id: ch.to_string(),
            x,
            y: 0.0,
            z: 0.0,
        }
    }

    fn edge(source: u32, target: u32, weight: f64) -> Edge {
        Edge {
            source,
            target,
            weight,
            interaction: 0,
        }
    }

    fn three_node_world() -> SceneWorld {
        let mut world = SceneWorld::new();
        world.build_nodes(&[
            node("Node1", "1", 10.0),
            node("Node2", "1", 20.0),
            node("Node3", "2", 30.0),
        ]);
        world
    }

    #[test]
    fn first_and_last_bins_get_fixed_colors_and_scaled_positions() {
        let world = three_node_world();
        assert_eq!(world.node(BinId(1)).unwrap().base_color, START_NODE_COLOR);
        assert_eq!(world.node(BinId(3)).unwrap().base_color, END_NODE_COLOR);
        assert_eq!(world.node(BinId(2)).unwrap().position.x, 20.0 * POSITION_SCALE);
    }

    #[test]
    fn labels_cover_the_fixed_bin_subset_only() {
        let world = three_node_world();
        // Only bin 1 of the fixed label set is present here.
        assert_eq!(world.labels().len(), 1);
        assert_eq!(world.labels()[0].text, "Bin 1");
    }

    #[test]
    fn missing_endpoints_are_skipped_not_fatal() {
        let mut world = three_node_world();
        let skipped = world.build_edges(&[edge(1, 2, 0.5), edge(1, 99, 0.9)], 1.0);
        assert_eq!(skipped, 1);
        assert_eq!(world.lines().len(), 1);
    }

    #[test]
    fn max_weight_line_is_pinned_to_the_dark_end() {
        let mut world = three_node_world();
        world.build_edges(&[edge(1, 2, 0.1), edge(1, 3, 0.9)], 1.0);
        let heavy = world
            .lines()
            .iter()
            .find(|l| l.target == BinId(3))
            .unwrap();
        assert_eq!(heavy.color, EDGE_RAMP_DARK);
    }

    #[test]
    fn highlight_is_idempotent_and_restores_base_colors() {
        let mut world = three_node_world();
        let ids: BTreeSet<BinId> = [BinId(2)].into_iter().collect();

        world.highlight_nodes(&ids);
        let after_first: Vec<_> = world.nodes().cloned().collect();
        world.highlight_nodes(&ids);
        let after_second: Vec<_> = world.nodes().cloned().collect();
        assert_eq!(after_first, after_second);

        assert_eq!(world.node(BinId(2)).unwrap().color, HIGHLIGHT_COLOR);
        world.highlight_nodes(&BTreeSet::new());
        let n2 = world.node(BinId(2)).unwrap();
        assert_eq!(n2.color, n2.base_color);
    }

    #[test]
    fn hover_moves_the_emissive_between_nodes() {
        let mut world = three_node_world();
        world.set_hovered(Some(BinId(1)));
        assert_eq!(world.node(BinId(1)).unwrap().emissive, Some(HOVER_EMISSIVE));

        world.set_hovered(Some(BinId(2)));
        assert_eq!(world.node(BinId(1)).unwrap().emissive, None);
        assert_eq!(world.node(BinId(2)).unwrap().emissive, Some(HOVER_EMISSIVE));

        world.set_hovered(None);
        assert_eq!(world.node(BinId(2)).unwrap().emissive, None);
    }

    #[test]
    fn opacity_applies_in_place_without_rebuilding() {
        let mut world = three_node_world();
        world.build_edges(&[edge(1, 2, 0.5)], 1.0);
        let before = world.lines()[0].clone();

        world.set_line_opacity(0.25);
        let after = &world.lines()[0];
        assert_eq!(after.opacity, 0.25);
        assert_eq!(after.color, before.color);
        assert_eq!(after.from, before.from);
    }
}
