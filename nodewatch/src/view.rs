//! View sessions: which loops and charts belong to which open view.
//!
//! Poll loops never touch view state. They fetch, tag the result with the
//! generation of the session that started them and send it down a channel;
//! the UI task feeds it back through [`ViewController::apply`], which drops
//! anything from a session that has since been closed or reopened.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::chart::{
    ChartId, ChartSink, DatasetSpec, RenderOutcome, SeriesSet, YScale, AGENT_NET, NODE_NET,
    NODE_RESOURCES,
};
use crate::client::Backend;
use crate::config::PollConfig;
use crate::error::{ChartError, FetchError};
use crate::history::{HistoryWindow, LabelPolicy};
use crate::scheduler::PollScheduler;
use crate::theme::{SeriesRole, StyleContext, Theme};
use crate::types::{AgentReport, NodeDetails, NodeRecord, Stats, Submission};

pub const GRID_LOOP: &str = "grid";
pub const AGENT_LOOP: &str = "agent";
pub const DETAIL_LOOP: &str = "detail";
pub const LOGS_LOOP: &str = "logs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Grid,
    Detail,
    Logs,
}

impl ViewKind {
    /// Overlays lock grid scrolling while open.
    pub fn is_overlay(self) -> bool {
        !matches!(self, ViewKind::Grid)
    }

    fn surfaces(self) -> &'static [ChartId] {
        match self {
            ViewKind::Grid => &[AGENT_NET],
            ViewKind::Detail => &[NODE_RESOURCES, NODE_NET],
            ViewKind::Logs => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewParams {
    Grid,
    Detail { token: String },
    Logs,
}

impl ViewParams {
    pub fn kind(&self) -> ViewKind {
        match self {
            ViewParams::Grid => ViewKind::Grid,
            ViewParams::Detail { .. } => ViewKind::Detail,
            ViewParams::Logs => ViewKind::Logs,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Payload {
    Nodes(Vec<NodeRecord>),
    Agent(AgentReport),
    Node(NodeDetails),
    Logs(Vec<String>),
}

/// One tick's result, addressed to the session that asked for it.
#[derive(Debug, Clone)]
pub struct ViewUpdate {
    pub kind: ViewKind,
    pub generation: u64,
    pub result: Result<Payload, FetchError>,
}

#[derive(Debug, Clone)]
pub enum Event {
    View(ViewUpdate),
    Submitted { action: Submission, result: Result<serde_json::Value, FetchError> },
}

/// What [`ViewController::apply`] did with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Rendered,
    /// Nothing to draw; the previous state stays on screen.
    Skipped,
    /// Stale generation or no such session.
    Discarded,
    /// The view was torn down; carries the reason.
    Closed(String),
    /// Tell the user once.
    Notice(String),
    Failed(FetchError),
}

#[derive(Debug, Clone, Default)]
pub struct GridState {
    pub nodes: Vec<NodeRecord>,
    pub selected: usize,
    pub agent: Option<Stats>,
}

#[derive(Debug, Clone)]
pub struct DetailState {
    pub token: String,
    pub details: Option<NodeDetails>,
}

#[derive(Debug, Clone, Default)]
pub struct LogsState {
    pub lines: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub enum ViewState {
    Grid(GridState),
    Detail(DetailState),
    Logs(LogsState),
}

/// Live state of one open view. Owns its charts and history exclusively.
#[derive(Debug)]
pub struct ViewSession {
    kind: ViewKind,
    generation: u64,
    loops: Vec<&'static str>,
    charts: ChartSink,
    history: HistoryWindow,
    state: ViewState,
    last_error: Option<FetchError>,
    access_denied: bool,
}

impl ViewSession {
    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn loops(&self) -> &[&'static str] {
        &self.loops
    }

    pub fn charts(&self) -> &ChartSink {
        &self.charts
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Most recent failed tick, cleared by the next successful one.
    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn access_denied(&self) -> bool {
        self.access_denied
    }

    fn render_chart(
        &mut self,
        id: ChartId,
        set: SeriesSet,
        style: &StyleContext,
    ) -> Result<(), ChartError> {
        match self.charts.render(id, set, style)? {
            RenderOutcome::Constructed => debug!(chart = id, generation = self.generation, "chart built"),
            RenderOutcome::Updated => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Fetch {
    Nodes,
    Agent,
    Node(Arc<str>),
    Logs,
}

impl Fetch {
    async fn run(&self, backend: &dyn Backend) -> Result<Payload, FetchError> {
        Ok(match self {
            Fetch::Nodes => Payload::Nodes(backend.nodes().await?),
            Fetch::Agent => Payload::Agent(backend.agent_stats().await?),
            Fetch::Node(token) => Payload::Node(backend.node_details(token).await?),
            Fetch::Logs => Payload::Logs(backend.logs().await?),
        })
    }
}

pub struct ViewController {
    backend: Arc<dyn Backend>,
    scheduler: PollScheduler,
    tx: UnboundedSender<Event>,
    sessions: HashMap<ViewKind, ViewSession>,
    next_generation: u64,
    config: PollConfig,
    style: StyleContext,
    /// Open overlays in opening order; non-empty means grid scrolling is locked.
    overlays: Vec<ViewKind>,
}

impl ViewController {
    pub fn new(
        backend: Arc<dyn Backend>,
        config: PollConfig,
        theme: Theme,
    ) -> (Self, UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ctl = Self {
            backend,
            scheduler: PollScheduler::new(),
            tx,
            sessions: HashMap::new(),
            next_generation: 0,
            config,
            style: StyleContext::new(theme),
            overlays: Vec::new(),
        };
        (ctl, rx)
    }

    /// Open a view, tearing down any session of the same kind first.
    ///
    /// Must be called from within a tokio runtime. Returns the new session's generation.
    pub fn open(&mut self, params: ViewParams) -> u64 {
        let kind = params.kind();
        if self.sessions.contains_key(&kind) {
            self.close(kind);
        }
        self.next_generation += 1;
        let generation = self.next_generation;

        let (state, history_cap) = match &params {
            ViewParams::Grid => (ViewState::Grid(GridState::default()), self.config.history_cap),
            ViewParams::Detail { token } => (
                ViewState::Detail(DetailState { token: token.clone(), details: None }),
                self.config.history_cap,
            ),
            ViewParams::Logs => (ViewState::Logs(LogsState::default()), 2),
        };

        let loops: Vec<(&'static str, Duration, Fetch)> = match &params {
            ViewParams::Grid => vec![
                (GRID_LOOP, self.config.grid_interval(), Fetch::Nodes),
                (AGENT_LOOP, self.config.agent_interval(), Fetch::Agent),
            ],
            ViewParams::Detail { token } => {
                vec![(DETAIL_LOOP, self.config.detail_interval(), Fetch::Node(Arc::from(token.as_str())))]
            }
            ViewParams::Logs => vec![(LOGS_LOOP, self.config.logs_interval(), Fetch::Logs)],
        };

        self.sessions.insert(
            kind,
            ViewSession {
                kind,
                generation,
                loops: loops.iter().map(|(name, _, _)| *name).collect(),
                charts: ChartSink::with_surfaces(kind.surfaces()),
                history: HistoryWindow::new(history_cap),
                state,
                last_error: None,
                access_denied: false,
            },
        );
        if kind.is_overlay() {
            self.overlays.push(kind);
        }
        for (name, interval, fetch) in loops {
            self.spawn_loop(name, interval, kind, generation, fetch);
        }
        info!(?kind, generation, "view opened");
        generation
    }

    fn spawn_loop(
        &mut self,
        name: &'static str,
        interval: Duration,
        kind: ViewKind,
        generation: u64,
        fetch: Fetch,
    ) {
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        self.scheduler.start(name, interval, move |_ctx| {
            let backend = backend.clone();
            let tx = tx.clone();
            let fetch = fetch.clone();
            async move {
                let result = fetch.run(backend.as_ref()).await;
                let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
                // Receiver gone means the app is shutting down.
                let _ = tx.send(Event::View(ViewUpdate { kind, generation, result }));
                outcome
            }
        });
    }

    /// Stop the view's loops, drop its charts and release the scroll lock.
    pub fn close(&mut self, kind: ViewKind) -> bool {
        let Some(mut session) = self.sessions.remove(&kind) else {
            return false;
        };
        for name in &session.loops {
            self.scheduler.stop(name);
        }
        let disposed = session.charts.dispose_all();
        self.overlays.retain(|k| *k != kind);
        info!(?kind, generation = session.generation, disposed, "view closed");
        true
    }

    pub fn close_all(&mut self) {
        for kind in [ViewKind::Logs, ViewKind::Detail, ViewKind::Grid] {
            self.close(kind);
        }
    }

    /// Fold one event into the owning session.
    pub fn apply(&mut self, event: Event) -> Applied {
        match event {
            Event::View(update) => self.apply_update(update),
            Event::Submitted { action, result } => self.apply_submitted(action, result),
        }
    }

    fn apply_update(&mut self, update: ViewUpdate) -> Applied {
        let ViewUpdate { kind, generation, result } = update;
        let Some(session) = self.sessions.get_mut(&kind) else {
            debug!(?kind, generation, "update for closed view dropped");
            return Applied::Discarded;
        };
        if session.generation != generation {
            debug!(?kind, generation, current = session.generation, "stale update dropped");
            return Applied::Discarded;
        }

        let payload = match result {
            Ok(p) => p,
            Err(FetchError::AccessDenied) => {
                if session.access_denied {
                    return Applied::Skipped;
                }
                session.access_denied = true;
                session.last_error = Some(FetchError::AccessDenied);
                return Applied::Notice("Access denied".into());
            }
            Err(FetchError::Api(msg)) if kind == ViewKind::Detail => {
                self.close(kind);
                return Applied::Closed(msg);
            }
            Err(e) => {
                session.last_error = Some(e.clone());
                return Applied::Failed(e);
            }
        };

        session.last_error = None;
        let style = self.style;
        let config = self.config;
        match payload {
            Payload::Nodes(nodes) => {
                let ViewState::Grid(grid) = &mut session.state else {
                    return mismatched(kind, "nodes");
                };
                grid.nodes = nodes;
                grid.selected = grid.selected.min(grid.nodes.len().saturating_sub(1));
                Applied::Rendered
            }
            Payload::Agent(report) => {
                let ViewState::Grid(grid) = &mut session.state else {
                    return mismatched(kind, "agent");
                };
                grid.agent = report.stats;
                if !session.history.replace(report.history) {
                    return Applied::Rendered;
                }
                let policy = LabelPolicy::seconds_ago(config.history_cadence_secs, config.label_every);
                let set = net_set(&session.history, &policy);
                sub_render(session.render_chart(AGENT_NET, set, &style))
            }
            Payload::Node(mut node) => {
                let ViewState::Detail(detail) = &mut session.state else {
                    return mismatched(kind, "node");
                };
                let history = std::mem::take(&mut node.history);
                detail.details = Some(node);
                if !session.history.replace(history) {
                    return Applied::Rendered;
                }
                let policy = LabelPolicy::clock(config.label_every);
                let resources = resource_set(&session.history, &policy);
                let net = net_set(&session.history, &policy);
                // Each surface fails on its own.
                let a = session.render_chart(NODE_RESOURCES, resources, &style);
                let b = session.render_chart(NODE_NET, net, &style);
                sub_render(a.and(b))
            }
            Payload::Logs(lines) => {
                let ViewState::Logs(logs) = &mut session.state else {
                    return mismatched(kind, "logs");
                };
                logs.lines = Some(lines);
                Applied::Rendered
            }
        }
    }

    fn apply_submitted(
        &mut self,
        action: Submission,
        result: Result<serde_json::Value, FetchError>,
    ) -> Applied {
        match (action, result) {
            (Submission::DeleteNode { token }, Ok(_)) => {
                self.remove_node(&token);
                if self.detail_token() == Some(token.as_str()) {
                    self.close(ViewKind::Detail);
                }
                Applied::Notice("Node deleted".into())
            }
            (Submission::NodeCommand { command, .. }, Ok(_)) => {
                Applied::Notice(format!("Command '{command}' sent"))
            }
            (Submission::AddNode { name }, Ok(v)) => match v.get("token").and_then(|t| t.as_str()) {
                Some(token) => Applied::Notice(format!("Node '{name}' added, token {token}")),
                None => Applied::Notice(format!("Node '{name}' added")),
            },
            (Submission::SaveNotifications(_), Ok(_)) => Applied::Notice("Settings saved".into()),
            (action, Err(e)) => {
                warn!(path = action.path(), error = %e, "submission failed");
                Applied::Notice(format!("Request failed: {e}"))
            }
        }
    }

    /// Run a settings/CRUD action; the outcome arrives as [`Event::Submitted`].
    pub fn submit(&self, action: Submission) {
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        debug!(path = action.path(), "submission queued");
        tokio::spawn(async move {
            let result = backend.submit(action.clone()).await;
            let _ = tx.send(Event::Submitted { action, result });
        });
    }

    /// Swap the style context and restyle every live chart in place.
    pub fn set_theme(&mut self, theme: Theme) -> usize {
        self.style = StyleContext::new(theme);
        let style = self.style;
        let n = self.sessions.values_mut().map(|s| s.charts.restyle(&style)).sum();
        debug!(?theme, charts = n, "theme applied");
        n
    }

    pub fn select_next(&mut self) {
        if self.scroll_locked() {
            return;
        }
        if let Some(grid) = self.grid_mut() {
            if grid.selected + 1 < grid.nodes.len() {
                grid.selected += 1;
            }
        }
    }

    pub fn select_prev(&mut self) {
        if self.scroll_locked() {
            return;
        }
        if let Some(grid) = self.grid_mut() {
            grid.selected = grid.selected.saturating_sub(1);
        }
    }

    pub fn selected_node(&self) -> Option<&NodeRecord> {
        self.grid().and_then(|g| g.nodes.get(g.selected))
    }

    /// Drop a row after the backend confirmed its deletion.
    pub fn remove_node(&mut self, token: &str) -> bool {
        let Some(grid) = self.grid_mut() else {
            return false;
        };
        let before = grid.nodes.len();
        grid.nodes.retain(|n| n.token != token);
        grid.selected = grid.selected.min(grid.nodes.len().saturating_sub(1));
        grid.nodes.len() != before
    }

    pub fn grid(&self) -> Option<&GridState> {
        match self.sessions.get(&ViewKind::Grid).map(|s| &s.state) {
            Some(ViewState::Grid(g)) => Some(g),
            _ => None,
        }
    }

    fn grid_mut(&mut self) -> Option<&mut GridState> {
        match self.sessions.get_mut(&ViewKind::Grid).map(|s| &mut s.state) {
            Some(ViewState::Grid(g)) => Some(g),
            _ => None,
        }
    }

    fn detail_token(&self) -> Option<&str> {
        match self.sessions.get(&ViewKind::Detail).map(|s| &s.state) {
            Some(ViewState::Detail(d)) => Some(d.token.as_str()),
            _ => None,
        }
    }

    pub fn session(&self, kind: ViewKind) -> Option<&ViewSession> {
        self.sessions.get(&kind)
    }

    pub fn is_open(&self, kind: ViewKind) -> bool {
        self.sessions.contains_key(&kind)
    }

    pub fn generation(&self, kind: ViewKind) -> Option<u64> {
        self.sessions.get(&kind).map(|s| s.generation)
    }

    pub fn scroll_locked(&self) -> bool {
        !self.overlays.is_empty()
    }

    /// Open overlays, oldest first.
    pub fn overlays(&self) -> &[ViewKind] {
        &self.overlays
    }

    /// The most recently opened overlay still open.
    pub fn top_overlay(&self) -> Option<ViewKind> {
        self.overlays.last().copied()
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn style(&self) -> &StyleContext {
        &self.style
    }
}

impl Drop for ViewController {
    fn drop(&mut self) {
        self.close_all();
    }
}

fn net_set(history: &HistoryWindow, policy: &LabelPolicy) -> SeriesSet {
    let s = history.rate_series(policy);
    SeriesSet {
        labels: s.labels,
        scale: YScale::Kbps,
        datasets: vec![
            DatasetSpec { name: "RX (In)", role: SeriesRole::Rx, values: s.rx },
            DatasetSpec { name: "TX (Out)", role: SeriesRole::Tx, values: s.tx },
        ],
    }
}

fn resource_set(history: &HistoryWindow, policy: &LabelPolicy) -> SeriesSet {
    let s = history.resource_series(policy);
    SeriesSet {
        labels: s.labels,
        scale: YScale::Percent,
        datasets: vec![
            DatasetSpec { name: "CPU %", role: SeriesRole::Cpu, values: s.cpu },
            DatasetSpec { name: "RAM %", role: SeriesRole::Ram, values: s.ram },
        ],
    }
}

fn sub_render(r: Result<(), ChartError>) -> Applied {
    match r {
        Ok(()) => Applied::Rendered,
        Err(e) => {
            warn!(error = %e, "chart render skipped");
            Applied::Failed(e.into())
        }
    }
}

fn mismatched(kind: ViewKind, payload: &'static str) -> Applied {
    warn!(?kind, payload, "payload does not belong to view");
    Applied::Skipped
}
