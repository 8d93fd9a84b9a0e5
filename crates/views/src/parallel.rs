use formats::{Edge, GeneDensity};
use foundation::color::Color;

use crate::symbology::{AxisTick, CategoricalScale, PointScale, SequentialRamp};

/// Horizontal inset of both axes inside the plot area; links start and end
/// here rather than at the outer edges.
pub const AXIS_INSET: f64 = 20.0;
pub const LINK_STROKE_WIDTH: f64 = 2.0;

pub const WEIGHT_RAMP_LIGHT: Color = Color::from_hex(0xDEEBF7);
pub const WEIGHT_RAMP_DARK: Color = Color::from_hex(0x08306B);

/// Tick label cadence: every 10th domain value by position.
pub const TICK_EVERY_NTH: usize = 10;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Per-source categorical color; the legend is shown.
    #[default]
    Categorical,
    /// Sequential color by weight; the legend is hidden.
    Weight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkMark {
    pub source: u32,
    pub target: u32,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub color: Color,
    pub opacity: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub source: u32,
    pub color: Color,
    pub label: String,
}

/// Density strip cell along one parallel axis; the app draws the same
/// marks beside both axes.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisDensityMark {
    pub bin: u32,
    pub y: f64,
    pub height: f64,
    pub fill: Color,
    pub density: f64,
}

/// The source→target parallel-coordinates view.
///
/// Axis domains are fixed at setup from the FULL unfiltered dataset (the
/// union of every Source and Target value) and never change while
/// filtering, so re-filtering redraws links without rescaling the axes.
#[derive(Debug, Default)]
pub struct ParallelView {
    scale: Option<PointScale>,
    categorical: Option<CategoricalScale>,
    color_mode: ColorMode,
    width: f64,
    height: f64,
}

impl ParallelView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_built(&self) -> bool {
        self.scale.is_some()
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Legend visibility is welded to the color mode.
    pub fn legend_visible(&self) -> bool {
        self.is_built() && self.color_mode == ColorMode::Categorical
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        self.color_mode = mode;
    }

    pub fn domain(&self) -> &[u32] {
        self.scale.as_ref().map(|s| s.domain()).unwrap_or(&[])
    }

    /// Fixes both axis domains from the full dataset.
    pub fn setup(&mut self, all_edges: &[Edge], width: f64, height: f64) {
        let mut domain: Vec<u32> = all_edges
            .iter()
            .flat_map(|e| [e.source, e.target])
            .collect();
        domain.sort_unstable();
        domain.dedup();

        let sources: Vec<u32> = all_edges.iter().map(|e| e.source).collect();

        self.scale = Some(PointScale::new(domain, height));
        self.categorical = Some(CategoricalScale::new(sources));
        self.width = width;
        self.height = height;
    }

    /// Every `TICK_EVERY_NTH`-th domain value, by position.
    pub fn ticks(&self) -> Vec<AxisTick> {
        let Some(scale) = &self.scale else {
            return Vec::new();
        };
        scale
            .domain()
            .iter()
            .enumerate()
            .filter(|(i, _)| i % TICK_EVERY_NTH == 0)
            .filter_map(|(_, &bin)| {
                Some(AxisTick {
                    bin,
                    offset: scale.position(bin)?,
                    label: bin.to_string(),
                })
            })
            .collect()
    }

    /// One link per retained edge, left-axis source to right-axis target.
    ///
    /// Weight mode colors over the extent of the links being shown; an edge
    /// endpoint missing from the axis domain is logged and skipped.
    pub fn links(&self, edges: &[Edge], opacity: f64) -> Vec<LinkMark> {
        let Some(scale) = &self.scale else {
            log::error!("links requested before the parallel axes were set up");
            return Vec::new();
        };

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for edge in edges {
            min = min.min(edge.weight);
            max = max.max(edge.weight);
        }
        let weight_ramp = SequentialRamp::new(WEIGHT_RAMP_LIGHT, WEIGHT_RAMP_DARK, min, max);

        let mut out = Vec::with_capacity(edges.len());
        for edge in edges {
            let (Some(y1), Some(y2)) = (scale.position(edge.source), scale.position(edge.target))
            else {
                log::warn!(
                    "edge {} -> {} is outside the parallel axis domain; skipped",
                    edge.source,
                    edge.target
                );
                continue;
            };
            let color = match self.color_mode {
                ColorMode::Weight => weight_ramp.color_for(edge.weight),
                ColorMode::Categorical => self
                    .categorical
                    .as_ref()
                    .and_then(|c| c.color_for(edge.source))
                    .unwrap_or(WEIGHT_RAMP_DARK),
            };
            out.push(LinkMark {
                source: edge.source,
                target: edge.target,
                x1: AXIS_INSET,
                y1,
                x2: self.width - AXIS_INSET,
                y2,
                color,
                opacity,
                width: LINK_STROKE_WIDTH,
            });
        }
        out
    }

    /// Legend entries for the categorical mode; empty in weight mode.
    pub fn legend_entries(&self) -> Vec<LegendEntry> {
        if !self.legend_visible() {
            return Vec::new();
        }
        let Some(categorical) = &self.categorical else {
            return Vec::new();
        };
        categorical
            .domain()
            .iter()
            .filter_map(|&source| {
                Some(LegendEntry {
                    source,
                    color: categorical.color_for(source)?,
                    label: format!("Source: {source}"),
                })
            })
            .collect()
    }

    /// Optional gene-density strip along the axes.
    pub fn density_strip(&self, track: &[GeneDensity]) -> Vec<AxisDensityMark> {
        let Some(scale) = &self.scale else {
            return Vec::new();
        };
        let n = scale.domain().len().max(1) as f64;
        let cell_height = self.height / n;
        let max_density = track.iter().fold(0.0_f64, |acc, d| acc.max(d.density));
        let ramp = SequentialRamp::new(
            WEIGHT_RAMP_LIGHT,
            WEIGHT_RAMP_DARK,
            0.0,
            max_density.max(1e-12),
        );
        track
            .iter()
            .filter_map(|d| {
                Some(AxisDensityMark {
                    bin: d.node,
                    y: scale.position(d.node)?,
                    height: cell_height,
                    fill: ramp.color_for(d.density),
                    density: d.density,
                })
            })
            .collect()
    }
}
