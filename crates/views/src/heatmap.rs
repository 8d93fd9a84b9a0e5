use compute::analysis::Statistics;
use formats::{Edge, GeneDensity};
use foundation::color::Color;
use scene::Selection;

use crate::symbology::{AxisTick, BandScale, SequentialRamp};

/// Cell fill ramp endpoints. The light end starts slightly into the ramp so
/// near-zero weights remain visible against the background.
pub const CELL_RAMP_LIGHT: Color = Color::from_hex(0xFEE0D2);
pub const CELL_RAMP_DARK: Color = Color::from_hex(0x67000D);

pub const HIGHLIGHT_STROKE: Color = Color::from_hex(0xFF5722);
pub const HIGHLIGHT_STROKE_WIDTH: f64 = 2.0;

/// Axis tick cadence in bins.
pub const TICK_EVERY: u32 = 50;

/// Rotated bin ordering for both heatmap axes.
///
/// Bin `max/2 + 1` appears first, wrapping around to `max/2`, the circular
/// genomic coordinate convention of the source data. The brush and the
/// axes must share this ordering exactly or brushed ranges would not match
/// the cells under the rectangle.
pub fn contact_domain(max_bin: u32) -> Vec<u32> {
    if max_bin == 0 {
        return Vec::new();
    }
    let half = max_bin / 2;
    (half + 1..=max_bin).chain(1..=half).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellMark {
    pub source: u32,
    pub target: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Color,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HighlightStyle {
    /// Whole rows/columns at the two range endpoints, full opacity.
    RangeEndpoints,
    /// Every cell touching a selected node, dimmed.
    DiscreteTouch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightMark {
    pub source: u32,
    pub target: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub stroke: Color,
    pub stroke_width: f64,
    pub opacity: f64,
    pub style: HighlightStyle,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BrushRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// Live readout while the brush is dragged.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushSummary {
    pub source_min: u32,
    pub source_max: u32,
    pub target_min: u32,
    pub target_max: u32,
    pub mean_weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendGradient {
    pub min: f64,
    pub max: f64,
    pub light: Color,
    pub dark: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DensityMark {
    pub bin: u32,
    pub x: f64,
    pub width: f64,
    pub fill: Color,
    pub density: f64,
}

/// The N×N contact-frequency view.
///
/// Built from the mirrored symmetric edge list produced by the compute
/// task, never from the raw upper-triangular data.
#[derive(Debug, Default)]
pub struct HeatmapView {
    cells: Vec<Edge>,
    x_scale: Option<BandScale>,
    y_scale: Option<BandScale>,
    ramp: Option<SequentialRamp>,
    size: f64,
}

impl HeatmapView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_built(&self) -> bool {
        self.x_scale.is_some()
    }

    /// Side length the plot was built against.
    pub fn plot_size(&self) -> f64 {
        self.size
    }

    /// Rebuilds scales and cells from the mirrored edge list.
    pub fn build(&mut self, mirrored: &[Edge], size: f64) {
        let max_bin = mirrored
            .iter()
            .map(|e| e.source.max(e.target))
            .max()
            .unwrap_or(0);

        let domain_x = contact_domain(max_bin);
        let mut domain_y = domain_x.clone();
        domain_y.reverse();

        let (min_w, max_w) = Statistics::weight_extent(mirrored).unwrap_or((0.0, 1.0));

        self.cells = mirrored.to_vec();
        self.x_scale = Some(BandScale::new(domain_x, size));
        self.y_scale = Some(BandScale::new(domain_y, size));
        self.ramp = Some(SequentialRamp::new(CELL_RAMP_LIGHT, CELL_RAMP_DARK, min_w, max_w));
        self.size = size;
    }

    pub fn cells(&self) -> Vec<CellMark> {
        let (Some(xs), Some(ys), Some(ramp)) = (&self.x_scale, &self.y_scale, &self.ramp) else {
            return Vec::new();
        };
        let (w, h) = (xs.bandwidth(), ys.bandwidth());
        self.cells
            .iter()
            .filter_map(|cell| {
                let x = xs.position(cell.source)?;
                let y = ys.position(cell.target)?;
                Some(CellMark {
                    source: cell.source,
                    target: cell.target,
                    x,
                    y,
                    width: w,
                    height: h,
                    fill: ramp.color_for(cell.weight),
                })
            })
            .collect()
    }

    /// Ticks every `TICK_EVERY` bins, labeled `Bin <n>`, positioned on the
    /// rotated axis ordering.
    pub fn x_ticks(&self) -> Vec<AxisTick> {
        self.ticks(self.x_scale.as_ref())
    }

    pub fn y_ticks(&self) -> Vec<AxisTick> {
        self.ticks(self.y_scale.as_ref())
    }

    fn ticks(&self, scale: Option<&BandScale>) -> Vec<AxisTick> {
        let Some(scale) = scale else {
            return Vec::new();
        };
        let max_bin = scale.domain().iter().max().copied().unwrap_or(0);
        let mut out = Vec::new();
        let mut bin = TICK_EVERY;
        while bin <= max_bin {
            if let Some(offset) = scale.position(bin) {
                out.push(AxisTick {
                    bin,
                    offset,
                    label: format!("Bin {bin}"),
                });
            }
            bin += TICK_EVERY;
        }
        out
    }

    /// Cells whose band origin lies inside the brush rectangle on both
    /// axes; the same membership rule the live tooltip and the release
    /// range share.
    fn brushed(&self, rect: BrushRect) -> Vec<&Edge> {
        let (Some(xs), Some(ys)) = (&self.x_scale, &self.y_scale) else {
            return Vec::new();
        };
        self.cells
            .iter()
            .filter(|cell| {
                let Some(x) = xs.position(cell.source) else {
                    return false;
                };
                let Some(y) = ys.position(cell.target) else {
                    return false;
                };
                x >= rect.x0 && x <= rect.x1 && y >= rect.y0 && y <= rect.y1
            })
            .collect()
    }

    /// Live brush readout: the covered bin ranges on both axes and the
    /// mean weight of the covered sub-region.
    pub fn brush_update(&self, rect: BrushRect) -> Option<BrushSummary> {
        let covered = self.brushed(rect);
        if covered.is_empty() {
            return None;
        }
        let source_min = covered.iter().map(|c| c.source).min()?;
        let source_max = covered.iter().map(|c| c.source).max()?;
        let target_min = covered.iter().map(|c| c.target).min()?;
        let target_max = covered.iter().map(|c| c.target).max()?;
        let weights: Vec<f64> = covered.iter().map(|c| c.weight).collect();
        Some(BrushSummary {
            source_min,
            source_max,
            target_min,
            target_max,
            mean_weight: Statistics::mean(&weights)?,
        })
    }

    /// Brush release: the source-axis bin range to feed into the session's
    /// range selection. Brushing and manual range entry converge on the
    /// same visualize-range entry point from here.
    pub fn brush_release(&self, rect: BrushRect) -> Option<(u32, u32)> {
        let covered = self.brushed(rect);
        let min = covered.iter().map(|c| c.source).min()?;
        let max = covered.iter().map(|c| c.source).max()?;
        Some((min, max))
    }

    /// Selection highlights. Range mode and discrete mode are two distinct
    /// styles, not merely different inputs: range mode outlines the whole
    /// rows/columns at the two endpoints at full opacity, discrete mode
    /// dims every cell touching a selected node.
    pub fn highlights(&self, selection: &Selection) -> Vec<HighlightMark> {
        let (Some(xs), Some(ys)) = (&self.x_scale, &self.y_scale) else {
            return Vec::new();
        };
        let (w, h) = (xs.bandwidth(), ys.bandwidth());

        let mark = |cell: &Edge, opacity: f64, style: HighlightStyle| -> Option<HighlightMark> {
            Some(HighlightMark {
                source: cell.source,
                target: cell.target,
                x: xs.position(cell.source)?,
                y: ys.position(cell.target)?,
                width: w,
                height: h,
                stroke: HIGHLIGHT_STROKE,
                stroke_width: HIGHLIGHT_STROKE_WIDTH,
                opacity,
                style,
            })
        };

        match selection {
            Selection::None => Vec::new(),
            Selection::Range { from, to } => self
                .cells
                .iter()
                .filter(|c| {
                    c.source == *from || c.target == *from || c.source == *to || c.target == *to
                })
                .filter_map(|c| mark(c, 1.0, HighlightStyle::RangeEndpoints))
                .collect(),
            Selection::Checkbox(ids) => self
                .cells
                .iter()
                .filter(|c| {
                    ids.iter()
                        .any(|id| id.value() == c.source || id.value() == c.target)
                })
                .filter_map(|c| mark(c, 0.1, HighlightStyle::DiscreteTouch))
                .collect(),
        }
    }

    pub fn legend(&self) -> Option<LegendGradient> {
        let ramp = self.ramp.as_ref()?;
        let (min, max) = ramp.domain();
        let (light, dark) = ramp.endpoints();
        Some(LegendGradient {
            min,
            max,
            light,
            dark,
        })
    }

    /// Optional gene-density strip along the x axis. An absent or empty
    /// track yields no marks.
    pub fn density_strip(&self, track: &[GeneDensity]) -> Vec<DensityMark> {
        let Some(xs) = &self.x_scale else {
            return Vec::new();
        };
        let max_density = track.iter().fold(0.0_f64, |acc, d| acc.max(d.density));
        let ramp = SequentialRamp::new(CELL_RAMP_LIGHT, CELL_RAMP_DARK, 0.0, max_density.max(1e-12));
        track
            .iter()
            .filter_map(|d| {
                Some(DensityMark {
                    bin: d.node,
                    x: xs.position(d.node)?,
                    width: xs.bandwidth(),
                    fill: ramp.color_for(d.density),
                    density: d.density,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{BrushRect, HeatmapView, HighlightStyle, contact_domain};
    use compute::mirror_edges;
    use formats::Edge;
    use foundation::ids::BinId;
    use scene::Selection;

    fn edge(source: u32, target: u32, weight: f64) -> Edge {
        Edge {
            source,
            target,
            weight,
            interaction: 0,
        }
    }

    #[test]
    fn domain_is_rotated_at_the_halfway_bin() {
        assert_eq!(contact_domain(6), vec![4, 5, 6, 1, 2, 3]);
        assert_eq!(contact_domain(5), vec![3, 4, 5, 1, 2]);
        assert_eq!(contact_domain(1), vec![1]);
        assert!(contact_domain(0).is_empty());
    }

    fn built_view() -> HeatmapView {
        // Upper triangle over bins 1..=4, mirrored like the compute task
        // does before the heatmap ever sees it.
        let upper = vec![
            edge(1, 2, 0.2),
            edge(1, 3, 0.4),
            edge(2, 4, 0.6),
            edge(3, 3, 0.8),
        ];
        let mut view = HeatmapView::new();
        view.build(&mirror_edges(&upper), 400.0);
        view
    }

    #[test]
    fn cells_land_on_the_rotated_scales() {
        let view = built_view();
        let cells = view.cells();
        // 3 off-diagonals doubled + 1 diagonal.
        assert_eq!(cells.len(), 7);
        // Domain for max=4 is [3, 4, 1, 2]; source 3 sits at x = 0.
        let diag = cells.iter().find(|c| c.source == 3 && c.target == 3).unwrap();
        assert_eq!(diag.x, 0.0);
        assert_eq!(diag.width, 100.0);
    }

    #[test]
    fn brush_release_matches_covered_source_extent() {
        let view = built_view();
        // Cover the whole square: every cell's source is inside.
        let all = BrushRect {
            x0: 0.0,
            y0: 0.0,
            x1: 400.0,
            y1: 400.0,
        };
        assert_eq!(view.brush_release(all), Some((1, 4)));

        // Cover only x in [0, 100): source 3 exclusively.
        let left = BrushRect {
            x0: 0.0,
            y0: 0.0,
            x1: 99.0,
            y1: 400.0,
        };
        assert_eq!(view.brush_release(left), Some((3, 3)));

        // An empty rectangle selects nothing.
        let empty = BrushRect {
            x0: -50.0,
            y0: -50.0,
            x1: -1.0,
            y1: -1.0,
        };
        assert_eq!(view.brush_release(empty), None);
    }

    #[test]
    fn brush_update_averages_the_covered_cells() {
        let view = built_view();
        let all = BrushRect {
            x0: 0.0,
            y0: 0.0,
            x1: 400.0,
            y1: 400.0,
        };
        let summary = view.brush_update(all).unwrap();
        assert_eq!(summary.source_min, 1);
        assert_eq!(summary.source_max, 4);
        // (0.2*2 + 0.4*2 + 0.6*2 + 0.8) / 7
        assert!((summary.mean_weight - 3.2 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn range_and_discrete_highlights_are_distinct_styles() {
        let view = built_view();

        let range = view.highlights(&Selection::Range { from: 1, to: 2 });
        assert!(!range.is_empty());
        assert!(range
            .iter()
            .all(|m| m.style == HighlightStyle::RangeEndpoints && m.opacity == 1.0));

        let ids = [BinId(3)].into_iter().collect();
        let discrete = view.highlights(&Selection::Checkbox(ids));
        assert!(!discrete.is_empty());
        assert!(discrete
            .iter()
            .all(|m| m.style == HighlightStyle::DiscreteTouch && m.opacity == 0.1));
        // Every discrete mark touches bin 3.
        assert!(discrete.iter().all(|m| m.source == 3 || m.target == 3));

        assert!(view.highlights(&Selection::None).is_empty());
    }

    #[test]
    fn ticks_follow_the_rotated_ordering() {
        let upper: Vec<Edge> = (1..=120).map(|i| edge(i, i, 0.1)).collect();
        let mut view = HeatmapView::new();
        view.build(&mirror_edges(&upper), 600.0);

        let ticks = view.x_ticks();
        let bins: Vec<u32> = ticks.iter().map(|t| t.bin).collect();
        assert_eq!(bins, vec![50, 100]);
        assert_eq!(ticks[0].label, "Bin 50");
        // Domain for max=120 starts at 61, so bin 100 sits before bin 50.
        assert!(ticks[1].offset < ticks[0].offset);
    }

    #[test]
    fn legend_spans_the_weight_extent() {
        let view = built_view();
        let legend = view.legend().unwrap();
        assert_eq!(legend.min, 0.2);
        assert_eq!(legend.max, 0.8);
    }

    #[test]
    fn density_strip_is_empty_without_a_track() {
        let view = built_view();
        assert!(view.density_strip(&[]).is_empty());
    }
}
