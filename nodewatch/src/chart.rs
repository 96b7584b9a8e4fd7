//! Chart sink: retained chart models that are built once per surface and
//! then updated in place.
//!
//! The TUI redraws every frame from these models; the sink's job is to keep
//! one model per surface, swap data without rebuilding it, and let a theme
//! change touch only the styling.

use std::collections::{HashMap, HashSet};

use ratatui::style::Color;
use tracing::debug;

use crate::error::ChartError;
use crate::theme::{SeriesRole, StyleContext};

pub type ChartId = &'static str;

pub const AGENT_NET: ChartId = "agent-net";
pub const NODE_RESOURCES: ChartId = "node-resources";
pub const NODE_NET: ChartId = "node-net";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YScale {
    /// 0..=100
    Percent,
    /// kbit/s, upper bound follows the data.
    Kbps,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSpec {
    pub name: &'static str,
    pub role: SeriesRole,
    pub values: Vec<f64>,
}

/// New data for one surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSet {
    pub labels: Vec<String>,
    pub scale: YScale,
    pub datasets: Vec<DatasetSpec>,
}

/// Presentation of a chart, derived from a [`StyleContext`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub scale: YScale,
    pub axis: Color,
    pub grid: Color,
    pub legend: Color,
    pub series_colors: Vec<Color>,
}

impl ChartOptions {
    pub fn build(scale: YScale, roles: &[SeriesRole], style: &StyleContext) -> Self {
        Self {
            scale,
            axis: style.palette.axis,
            grid: style.palette.grid,
            legend: style.palette.legend,
            series_colors: roles.iter().map(|r| style.series_color(*r)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: &'static str,
    pub role: SeriesRole,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Chart {
    pub id: ChartId,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub options: ChartOptions,
    /// Incremental redraws since construction.
    pub revision: u64,
}

impl Chart {
    fn construct(id: ChartId, set: SeriesSet, style: &StyleContext) -> Self {
        let roles: Vec<SeriesRole> = set.datasets.iter().map(|d| d.role).collect();
        Self {
            id,
            labels: set.labels,
            options: ChartOptions::build(set.scale, &roles, style),
            datasets: set
                .datasets
                .into_iter()
                .map(|d| Dataset { name: d.name, role: d.role, data: d.values })
                .collect(),
            revision: 0,
        }
    }

    // Reuses the existing buffers; only a change in dataset count reshapes.
    fn update_data(&mut self, set: SeriesSet, style: &StyleContext) {
        self.labels.clear();
        self.labels.extend(set.labels);
        let reshaped = set.datasets.len() != self.datasets.len()
            || set.scale != self.options.scale
            || set.datasets.iter().zip(&self.datasets).any(|(a, b)| a.role != b.role);
        self.datasets.truncate(set.datasets.len());
        for (i, spec) in set.datasets.into_iter().enumerate() {
            match self.datasets.get_mut(i) {
                Some(ds) => {
                    ds.name = spec.name;
                    ds.role = spec.role;
                    ds.data.clear();
                    ds.data.extend_from_slice(&spec.values);
                }
                None => self.datasets.push(Dataset {
                    name: spec.name,
                    role: spec.role,
                    data: spec.values,
                }),
            }
        }
        if reshaped {
            self.restyle(set.scale, style);
        }
        self.revision += 1;
    }

    fn restyle(&mut self, scale: YScale, style: &StyleContext) {
        let roles: Vec<SeriesRole> = self.datasets.iter().map(|d| d.role).collect();
        self.options = ChartOptions::build(scale, &roles, style);
    }

    /// Y-axis range: fixed for percentages, 10% headroom over the peak otherwise.
    pub fn y_bounds(&self) -> [f64; 2] {
        match self.options.scale {
            YScale::Percent => [0.0, 100.0],
            YScale::Kbps => {
                let peak = self
                    .datasets
                    .iter()
                    .flat_map(|d| d.data.iter().copied())
                    .filter(|v| v.is_finite())
                    .fold(0.0_f64, f64::max);
                [0.0, if peak > 0.0 { peak * 1.1 } else { 1.0 }]
            }
        }
    }

    /// `(x, y)` pairs for one dataset, x being the sample index.
    pub fn points(&self, idx: usize) -> Vec<(f64, f64)> {
        self.datasets
            .get(idx)
            .map(|d| d.data.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Constructed,
    Updated,
}

/// The charts of one view session.
#[derive(Debug, Default)]
pub struct ChartSink {
    surfaces: HashSet<ChartId>,
    charts: HashMap<ChartId, Chart>,
    constructed: u64,
}

impl ChartSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_surfaces(ids: &[ChartId]) -> Self {
        let mut sink = Self::new();
        for id in ids {
            sink.declare_surface(id);
        }
        sink
    }

    /// Make `id` a valid render target in this view.
    pub fn declare_surface(&mut self, id: ChartId) {
        self.surfaces.insert(id);
    }

    pub fn render(
        &mut self,
        id: ChartId,
        set: SeriesSet,
        style: &StyleContext,
    ) -> Result<RenderOutcome, ChartError> {
        if !self.surfaces.contains(id) {
            return Err(ChartError::UnknownSurface(id.to_string()));
        }
        match self.charts.get_mut(id) {
            Some(chart) => {
                chart.update_data(set, style);
                Ok(RenderOutcome::Updated)
            }
            None => {
                debug!(chart = id, "constructing chart");
                self.charts.insert(id, Chart::construct(id, set, style));
                self.constructed += 1;
                Ok(RenderOutcome::Constructed)
            }
        }
    }

    /// Re-derive colors for every live chart. Data is left untouched.
    pub fn restyle(&mut self, style: &StyleContext) -> usize {
        for chart in self.charts.values_mut() {
            let scale = chart.options.scale;
            chart.restyle(scale, style);
        }
        self.charts.len()
    }

    /// Destroy a chart; the next render for `id` builds a fresh one.
    pub fn dispose(&mut self, id: ChartId) -> bool {
        self.charts.remove(id).is_some()
    }

    pub fn dispose_all(&mut self) -> usize {
        let n = self.charts.len();
        self.charts.clear();
        n
    }

    pub fn get(&self, id: ChartId) -> Option<&Chart> {
        self.charts.get(id)
    }

    pub fn live(&self) -> usize {
        self.charts.len()
    }

    /// Total constructions over the sink's lifetime.
    pub fn constructed(&self) -> u64 {
        self.constructed
    }
}
