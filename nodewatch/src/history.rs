//! Bounded history window per tracked entity, plus the derived series the
//! charts consume.
//!
//! The backend returns a capped window on every poll, so the window is
//! replaced wholesale instead of appended to.

use crate::format::format_clock;
use crate::rate::{rate, Rate};
use crate::types::Snapshot;

/// How axis labels are spelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelStyle {
    /// `-20s`, counted back from the newest point at a fixed cadence.
    SecondsAgo { cadence_secs: u64 },
    /// Local `HH:MM:SS` of the sample.
    Clock,
}

/// Show a label every `every` points (counted back from the newest) and
/// always on the newest; blank elsewhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPolicy {
    pub every: usize,
    pub style: LabelStyle,
}

impl LabelPolicy {
    pub fn seconds_ago(cadence_secs: u64, every: usize) -> Self {
        Self { every: every.max(1), style: LabelStyle::SecondsAgo { cadence_secs } }
    }

    pub fn clock(every: usize) -> Self {
        Self { every: every.max(1), style: LabelStyle::Clock }
    }

    /// Label for point `i` of `n`.
    fn label(&self, i: usize, n: usize, s: &Snapshot) -> String {
        let back = n - 1 - i;
        if back % self.every != 0 && back != 0 {
            return String::new();
        }
        match self.style {
            LabelStyle::SecondsAgo { cadence_secs } => format!("-{}s", back as u64 * cadence_secs),
            LabelStyle::Clock => format_clock(s.t),
        }
    }
}

/// One derived bandwidth point, labelled by the later sample of its pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RatePoint {
    pub label: String,
    pub rx_kbps: f64,
    pub tx_kbps: f64,
}

/// Column-oriented series ready for a chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSeries {
    pub labels: Vec<String>,
    pub rx: Vec<f64>,
    pub tx: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSeries {
    pub labels: Vec<String>,
    pub cpu: Vec<f64>,
    pub ram: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct HistoryWindow {
    points: Vec<Snapshot>,
    cap: usize,
}

impl HistoryWindow {
    pub fn new(cap: usize) -> Self {
        Self { points: Vec::with_capacity(cap), cap: cap.max(2) }
    }

    /// Swap in a fresh window from the backend.
    ///
    /// Fewer than two samples cannot produce a rate, so the previous window
    /// is kept and `false` is returned. Longer input keeps the newest `cap`.
    pub fn replace(&mut self, series: Vec<Snapshot>) -> bool {
        if series.len() < 2 {
            return false;
        }
        let skip = series.len().saturating_sub(self.cap);
        self.points.clear();
        self.points.extend(series.into_iter().skip(skip));
        true
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Snapshot] {
        &self.points
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.points.last()
    }

    /// Lazy pairwise rates, oldest first. Calling again restarts the walk.
    pub fn rates(&self) -> impl Iterator<Item = Rate> + Clone + '_ {
        self.points.windows(2).map(|w| rate(&w[0], &w[1]))
    }

    /// Rates zipped with thinned labels; yields `len() - 1` points.
    pub fn rate_points<'a>(
        &'a self,
        policy: &'a LabelPolicy,
    ) -> impl Iterator<Item = RatePoint> + 'a {
        let n = self.points.len();
        self.rates()
            .zip(self.points.iter().enumerate().skip(1))
            .map(move |(r, (i, s))| RatePoint {
                label: policy.label(i, n, s),
                rx_kbps: r.rx_kbps,
                tx_kbps: r.tx_kbps,
            })
    }

    pub fn rate_series(&self, policy: &LabelPolicy) -> RateSeries {
        let mut out = RateSeries::default();
        for p in self.rate_points(policy) {
            out.labels.push(p.label);
            out.rx.push(p.rx_kbps);
            out.tx.push(p.tx_kbps);
        }
        out
    }

    /// CPU/RAM percentages, one per sample.
    pub fn resource_series(&self, policy: &LabelPolicy) -> ResourceSeries {
        let n = self.points.len();
        ResourceSeries {
            labels: self.points.iter().enumerate().map(|(i, s)| policy.label(i, n, s)).collect(),
            cpu: self.points.iter().map(|s| s.cpu_percent).collect(),
            ram: self.points.iter().map(|s| s.ram_percent).collect(),
        }
    }
}
