use std::collections::BTreeMap;

use formats::{Edge, Node2D};
use foundation::color::Color;
use foundation::ids::BinId;
use foundation::math::Vec2;

use crate::symbology::SequentialRamp;

pub const NODE_RADIUS: f64 = 5.0;
pub const CANVAS_PADDING: f64 = 20.0;
/// Extra shrink so the projected cloud sits clear of the canvas edges.
pub const FIT_FACTOR: f64 = 0.8;

pub const DEFAULT_NODE_COLOR: Color = Color::from_hex(0xFF0000);
pub const START_NODE_COLOR: Color = Color::from_hex(0x008000);
pub const END_NODE_COLOR: Color = Color::from_hex(0x0000FF);
pub const HOVER_NODE_COLOR: Color = Color::from_hex(0xFFFF00);

pub const EDGE_STROKE_LIGHT: Color = Color::from_hex(0xADD8E6);
pub const EDGE_STROKE_DARK: Color = Color::from_hex(0x00008B);

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleMark {
    pub bin: BinId,
    pub center: Vec2,
    pub radius: f64,
    pub fill: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentMark {
    pub source: BinId,
    pub target: BinId,
    pub from: Vec2,
    pub to: Vec2,
    pub color: Color,
    pub opacity: f64,
}

/// The 2D projection view.
///
/// Circles on a canvas have no persistent object identity, so the full node
/// set is re-emitted on every draw and every hover change. The node
/// position map is rebuilt wholesale each draw (never partially mutated)
/// and is the single source of endpoint positions for the 2D edge renderer
/// and the parallel-plot density overlay.
#[derive(Debug, Default)]
pub struct PlanarView {
    positions: BTreeMap<BinId, Vec2>,
    labels: BTreeMap<BinId, String>,
    first: Option<BinId>,
    last: Option<BinId>,
    hovered: Option<BinId>,
}

impl PlanarView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> &BTreeMap<BinId, Vec2> {
        &self.positions
    }

    /// The dataset's original node id for a bin, for tooltips.
    pub fn label(&self, bin: BinId) -> Option<&str> {
        self.labels.get(&bin).map(|s| s.as_str())
    }

    pub fn hovered(&self) -> Option<BinId> {
        self.hovered
    }

    /// Projects the node set into the viewport and rebuilds the position
    /// map. Returns the circle marks in ascending bin order.
    pub fn draw(&mut self, nodes: &[Node2D], viewport: Viewport) -> Vec<CircleMark> {
        self.positions.clear();
        self.labels.clear();
        self.hovered = None;

        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for node in nodes {
            min_x = min_x.min(node.x);
            max_x = max_x.max(node.x);
            min_y = min_y.min(node.y);
            max_y = max_y.max(node.y);
        }
        let range_x = if max_x > min_x { max_x - min_x } else { 1.0 };
        let range_y = if max_y > min_y { max_y - min_y } else { 1.0 };
        let scale_x = (viewport.width - 2.0 * CANVAS_PADDING) / range_x;
        let scale_y = (viewport.height - 2.0 * CANVAS_PADDING) / range_y;

        for node in nodes {
            let Some(bin) = node.bin_id() else {
                log::warn!("node id '{}' has no numeric part; skipped", node.id);
                continue;
            };
            let x = CANVAS_PADDING + (node.x - min_x) * scale_x * FIT_FACTOR;
            let y = CANVAS_PADDING + (node.y - min_y) * scale_y * FIT_FACTOR;
            self.positions.insert(bin, Vec2::new(x, y));
            self.labels.insert(bin, node.id.clone());
        }

        self.first = self.positions.keys().next().copied();
        self.last = self.positions.keys().next_back().copied();
        self.circles()
    }

    /// Emits the current circle marks, honoring the hover recolor.
    pub fn circles(&self) -> Vec<CircleMark> {
        self.positions
            .iter()
            .map(|(&bin, &center)| CircleMark {
                bin,
                center,
                radius: NODE_RADIUS,
                fill: self.fill_for(bin),
            })
            .collect()
    }

    fn fill_for(&self, bin: BinId) -> Color {
        if self.hovered == Some(bin) {
            HOVER_NODE_COLOR
        } else if self.first == Some(bin) {
            START_NODE_COLOR
        } else if self.last == Some(bin) {
            END_NODE_COLOR
        } else {
            DEFAULT_NODE_COLOR
        }
    }

    /// O(n) hit test: the first bin (ascending) whose circle covers the
    /// pointer.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<BinId> {
        let pointer = Vec2::new(x, y);
        self.positions
            .iter()
            .find(|&(_, &center)| center.distance(pointer) < NODE_RADIUS)
            .map(|(&bin, _)| bin)
    }

    /// Updates the hover target; returns `true` when a redraw is needed.
    pub fn set_hovered(&mut self, bin: Option<BinId>) -> bool {
        if self.hovered == bin {
            return false;
        }
        self.hovered = bin;
        true
    }

    /// Emits one segment per edge from the current position map, colored
    /// on a continuous weight scale.
    ///
    /// Contract: `draw` must have populated positions for the active
    /// dataset first. An empty map means the call orderings are wrong; the
    /// error is logged and no marks are produced. Individual missing
    /// endpoints are logged and skipped.
    pub fn draw_edges(&self, edges: &[Edge], opacity: f64) -> Vec<SegmentMark> {
        if self.positions.is_empty() {
            log::error!("draw_edges called before draw populated node positions");
            return Vec::new();
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for edge in edges {
            min = min.min(edge.weight);
            max = max.max(edge.weight);
        }
        let ramp = SequentialRamp::new(EDGE_STROKE_LIGHT, EDGE_STROKE_DARK, min, max);

        let mut out = Vec::with_capacity(edges.len());
        for edge in edges {
            let (source, target) = (BinId(edge.source), BinId(edge.target));
            let (Some(&from), Some(&to)) = (self.positions.get(&source), self.positions.get(&target))
            else {
                log::warn!(
                    "edge {} -> {} has no projected endpoint; skipped",
                    edge.source,
                    edge.target
                );
                continue;
            };
            out.push(SegmentMark {
                source,
                target,
                from,
                to,
                color: ramp.color_for(edge.weight),
                opacity,
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CANVAS_PADDING, DEFAULT_NODE_COLOR, END_NODE_COLOR, HOVER_NODE_COLOR, PlanarView,
        START_NODE_COLOR, Viewport,
    };
    use formats::{Edge, Node2D};
    use foundation::ids::BinId;

    fn node(id: &str, x: f64, y: f64) -> Node2D {
        Node2D {
            id: id.to_string(),
            ch_id: "1".to_string(),
            x,
            y,
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

    const VIEWPORT: Viewport = Viewport {
        width: 400.0,
        height: 300.0,
    };

    fn three_node_view() -> PlanarView {
        let mut view = PlanarView::new();
        view.draw(
            &[
                node("Node1", 0.0, 0.0),
                node("Node2", 5.0, 5.0),
                node("Node3", 10.0, 10.0),
            ],
            VIEWPORT,
        );
        view
    }

    #[test]
    fn draw_rebuilds_the_position_map_wholesale() {
        let mut view = three_node_view();
        assert_eq!(view.positions().len(), 3);
        let min = view.positions().get(&BinId(1)).copied().unwrap();
        assert_eq!(min.x, CANVAS_PADDING);
        assert_eq!(min.y, CANVAS_PADDING);

        // A redraw with a different dataset replaces everything.
        view.draw(&[node("Node9", 1.0, 1.0)], VIEWPORT);
        assert_eq!(view.positions().len(), 1);
        assert!(view.positions().contains_key(&BinId(9)));
    }

    #[test]
    fn first_and_last_bins_get_fixed_colors() {
        let view = three_node_view();
        let circles = view.circles();
        assert_eq!(circles[0].fill, START_NODE_COLOR);
        assert_eq!(circles[1].fill, DEFAULT_NODE_COLOR);
        assert_eq!(circles[2].fill, END_NODE_COLOR);
    }

    #[test]
    fn hover_recolors_only_the_hit_node() {
        let mut view = three_node_view();
        let target = view.positions().get(&BinId(2)).copied().unwrap();

        let hit = view.hit_test(target.x + 1.0, target.y);
        assert_eq!(hit, Some(BinId(2)));
        assert!(view.set_hovered(hit));
        // Re-hovering the same node needs no redraw.
        assert!(!view.set_hovered(hit));

        let circles = view.circles();
        assert_eq!(circles[1].fill, HOVER_NODE_COLOR);
        assert_eq!(circles[0].fill, START_NODE_COLOR);

        let miss = view.hit_test(0.0, VIEWPORT.height);
        assert_eq!(miss, None);
    }

    #[test]
    fn edges_use_projected_positions_and_skip_missing_endpoints() {
        let view = three_node_view();
        let marks = view.draw_edges(&[edge(1, 3, 0.5), edge(1, 99, 0.9)], 0.5);
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].from, *view.positions().get(&BinId(1)).unwrap());
        assert_eq!(marks[0].to, *view.positions().get(&BinId(3)).unwrap());
        assert_eq!(marks[0].opacity, 0.5);
    }

    #[test]
    fn edges_before_any_draw_produce_nothing() {
        let view = PlanarView::new();
        assert!(view.draw_edges(&[edge(1, 2, 0.5)], 1.0).is_empty());
    }
}
