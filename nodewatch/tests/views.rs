//! View sessions driven by a fake backend under a paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc::UnboundedReceiver;

use nodewatch::chart::{AGENT_NET, NODE_NET, NODE_RESOURCES};
use nodewatch::client::Backend;
use nodewatch::config::PollConfig;
use nodewatch::error::FetchError;
use nodewatch::theme::Theme;
use nodewatch::types::{AgentReport, NodeDetails, NodeRecord, Snapshot, Stats, Submission};
use nodewatch::view::{
    Applied, Event, Payload, ViewController, ViewKind, ViewParams, ViewState, ViewUpdate,
};

const TICK: Duration = Duration::from_secs(1);

#[derive(Default)]
struct Calls {
    agent: AtomicUsize,
    details: AtomicUsize,
    nodes: AtomicUsize,
    logs: AtomicUsize,
}

struct FakeBackend {
    calls: Calls,
    details: Mutex<Result<NodeDetails, FetchError>>,
    nodes: Mutex<Vec<NodeRecord>>,
    logs: Mutex<Result<Vec<String>, FetchError>>,
    submitted: Mutex<Vec<Submission>>,
}

impl FakeBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Calls::default(),
            details: Mutex::new(Ok(details(3))),
            nodes: Mutex::new(vec![node("a"), node("b"), node("c")]),
            logs: Mutex::new(Ok(vec!["INFO started".into()])),
            submitted: Mutex::new(Vec::new()),
        })
    }

    fn set_details(&self, r: Result<NodeDetails, FetchError>) {
        *self.details.lock().unwrap() = r;
    }

    fn set_logs(&self, r: Result<Vec<String>, FetchError>) {
        *self.logs.lock().unwrap() = r;
    }
}

impl Backend for FakeBackend {
    fn agent_stats(&self) -> BoxFuture<'_, Result<AgentReport, FetchError>> {
        self.calls.agent.fetch_add(1, Ordering::SeqCst);
        let report = AgentReport {
            stats: Some(Stats { cpu: 12.0, ram: 40.0, disk: 70.0, ..Default::default() }),
            history: history(4),
        };
        async move { Ok(report) }.boxed()
    }

    fn node_details<'a>(&'a self, _token: &'a str) -> BoxFuture<'a, Result<NodeDetails, FetchError>> {
        self.calls.details.fetch_add(1, Ordering::SeqCst);
        let r = self.details.lock().unwrap().clone();
        async move { r }.boxed()
    }

    fn nodes(&self) -> BoxFuture<'_, Result<Vec<NodeRecord>, FetchError>> {
        self.calls.nodes.fetch_add(1, Ordering::SeqCst);
        let n = self.nodes.lock().unwrap().clone();
        async move { Ok(n) }.boxed()
    }

    fn logs(&self) -> BoxFuture<'_, Result<Vec<String>, FetchError>> {
        self.calls.logs.fetch_add(1, Ordering::SeqCst);
        let r = self.logs.lock().unwrap().clone();
        async move { r }.boxed()
    }

    fn submit(&self, action: Submission) -> BoxFuture<'_, Result<serde_json::Value, FetchError>> {
        self.submitted.lock().unwrap().push(action);
        async move { Ok(serde_json::json!({ "status": "ok" })) }.boxed()
    }
}

fn history(n: usize) -> Vec<Snapshot> {
    (0..n)
        .map(|i| Snapshot {
            t: 1_700_000_000.0 + i as f64 * 2.0,
            cpu_percent: 10.0 + i as f64,
            ram_percent: 50.0,
            rx_bytes: i as u64 * 4096,
            tx_bytes: i as u64 * 1024,
        })
        .collect()
}

fn details(n: usize) -> NodeDetails {
    NodeDetails {
        token: Some("tok-a".into()),
        name: Some("edge-1".into()),
        last_seen: 1_700_000_000.0,
        history: history(n),
        ..Default::default()
    }
}

fn node(token: &str) -> NodeRecord {
    NodeRecord {
        token: token.into(),
        name: format!("node-{token}"),
        ip: "10.0.0.1".into(),
        cpu_percent: 5.0,
        ram_percent: 20.0,
        last_seen: 0.0,
        is_restarting: false,
    }
}

fn config() -> PollConfig {
    PollConfig { grid_ms: 1000, agent_ms: 1000, detail_ms: 1000, logs_ms: 1000, ..Default::default() }
}

fn controller(backend: &Arc<FakeBackend>) -> (ViewController, UnboundedReceiver<Event>) {
    ViewController::new(backend.clone(), config(), Theme::Dark)
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Let loops run, then fold everything they sent.
async fn pump(ctl: &mut ViewController, rx: &mut UnboundedReceiver<Event>) -> Vec<Applied> {
    settle().await;
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ctl.apply(ev));
    }
    out
}

#[tokio::test(start_paused = true)]
async fn reopening_a_view_leaves_one_loop_and_one_chart_set() {
    let backend = FakeBackend::new();
    let (mut ctl, mut rx) = controller(&backend);

    let g1 = ctl.open(ViewParams::Detail { token: "tok-a".into() });
    pump(&mut ctl, &mut rx).await;
    let g2 = ctl.open(ViewParams::Detail { token: "tok-a".into() });
    assert_ne!(g1, g2);
    pump(&mut ctl, &mut rx).await;

    assert_eq!(ctl.scheduler().active(), 1);
    let session = ctl.session(ViewKind::Detail).unwrap();
    assert_eq!(session.generation(), g2);
    assert_eq!(session.charts().live(), 2);
    assert_eq!(session.charts().constructed(), 2);

    tokio::time::sleep(TICK * 3 + Duration::from_millis(500)).await;
    pump(&mut ctl, &mut rx).await;
    // one call from the first session, then 0s, 1s, 2s, 3s of the second
    assert_eq!(backend.calls.details.load(Ordering::SeqCst), 5);
    assert_eq!(ctl.session(ViewKind::Detail).unwrap().charts().constructed(), 2);
}

#[tokio::test(start_paused = true)]
async fn late_response_from_a_closed_session_is_discarded() {
    let backend = FakeBackend::new();
    let (mut ctl, mut rx) = controller(&backend);

    ctl.open(ViewParams::Detail { token: "tok-a".into() });
    settle().await;
    // The first session's result is queued but not yet applied
    ctl.open(ViewParams::Detail { token: "tok-a".into() });
    let first = rx.try_recv().expect("queued update");
    assert_eq!(ctl.apply(first), Applied::Discarded);
    assert_eq!(ctl.session(ViewKind::Detail).unwrap().charts().live(), 0);

    pump(&mut ctl, &mut rx).await;
    let before = ctl.session(ViewKind::Detail).unwrap().charts().get(NODE_NET).unwrap().clone();
    let stale = Event::View(ViewUpdate {
        kind: ViewKind::Detail,
        generation: 1,
        result: Ok(Payload::Node(details(10))),
    });
    assert_eq!(ctl.apply(stale), Applied::Discarded);
    let after = ctl.session(ViewKind::Detail).unwrap().charts().get(NODE_NET).unwrap();
    assert_eq!(after.datasets, before.datasets);
    assert_eq!(after.revision, before.revision);

    ctl.close(ViewKind::Detail);
    let closed = Event::View(ViewUpdate {
        kind: ViewKind::Detail,
        generation: 2,
        result: Ok(Payload::Node(details(3))),
    });
    assert_eq!(ctl.apply(closed), Applied::Discarded);
}

#[tokio::test(start_paused = true)]
async fn theme_change_restyles_without_touching_data() {
    let backend = FakeBackend::new();
    let (mut ctl, mut rx) = controller(&backend);
    ctl.open(ViewParams::Detail { token: "tok-a".into() });
    pump(&mut ctl, &mut rx).await;

    let calls = backend.calls.details.load(Ordering::SeqCst);
    let chart = ctl.session(ViewKind::Detail).unwrap().charts().get(NODE_RESOURCES).unwrap();
    let data_ptr = chart.datasets[0].data.as_ptr();
    let colors = chart.options.series_colors.clone();

    assert_eq!(ctl.set_theme(Theme::Light), 2);

    let chart = ctl.session(ViewKind::Detail).unwrap().charts().get(NODE_RESOURCES).unwrap();
    assert_eq!(chart.datasets[0].data.as_ptr(), data_ptr);
    assert_ne!(chart.options.series_colors, colors);
    assert_eq!(backend.calls.details.load(Ordering::SeqCst), calls, "restyle refetched");
}

#[tokio::test(start_paused = true)]
async fn detail_series_lengths_follow_history() {
    let backend = FakeBackend::new();
    let (mut ctl, mut rx) = controller(&backend);
    ctl.open(ViewParams::Detail { token: "tok-a".into() });
    let applied = pump(&mut ctl, &mut rx).await;
    assert_eq!(applied, vec![Applied::Rendered]);

    let charts = ctl.session(ViewKind::Detail).unwrap().charts();
    assert_eq!(charts.get(NODE_RESOURCES).unwrap().len(), 3);
    assert_eq!(charts.get(NODE_NET).unwrap().len(), 2);
    // 4096 bytes over 2s
    let rx_kbps = charts.get(NODE_NET).unwrap().datasets[0].data[0];
    assert!((rx_kbps - 16.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn short_history_keeps_previous_chart() {
    let backend = FakeBackend::new();
    let (mut ctl, mut rx) = controller(&backend);
    ctl.open(ViewParams::Detail { token: "tok-a".into() });
    pump(&mut ctl, &mut rx).await;
    let before = ctl.session(ViewKind::Detail).unwrap().charts().get(NODE_NET).unwrap().clone();

    backend.set_details(Ok(details(1)));
    tokio::time::sleep(TICK).await;
    assert_eq!(pump(&mut ctl, &mut rx).await, vec![Applied::Rendered]);

    let after = ctl.session(ViewKind::Detail).unwrap().charts().get(NODE_NET).unwrap();
    assert_eq!(after.datasets, before.datasets);
    assert_eq!(after.revision, before.revision);
}

#[tokio::test(start_paused = true)]
async fn transient_failure_keeps_last_state_and_loop() {
    let backend = FakeBackend::new();
    let (mut ctl, mut rx) = controller(&backend);
    ctl.open(ViewParams::Detail { token: "tok-a".into() });
    pump(&mut ctl, &mut rx).await;

    let err = FetchError::Transient("timed out".into());
    backend.set_details(Err(err.clone()));
    tokio::time::sleep(TICK).await;
    assert_eq!(pump(&mut ctl, &mut rx).await, vec![Applied::Failed(err.clone())]);

    let session = ctl.session(ViewKind::Detail).unwrap();
    assert_eq!(session.last_error(), Some(&err));
    assert!(session.charts().get(NODE_NET).is_some());
    let ViewState::Detail(d) = session.state() else { panic!("detail state") };
    assert!(d.details.is_some());
    assert!(ctl.scheduler().is_running("detail"));

    backend.set_details(Ok(details(3)));
    tokio::time::sleep(TICK).await;
    pump(&mut ctl, &mut rx).await;
    assert!(ctl.session(ViewKind::Detail).unwrap().last_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn malformed_tick_keeps_chart_and_loop() {
    let backend = FakeBackend::new();
    let (mut ctl, mut rx) = controller(&backend);
    ctl.open(ViewParams::Detail { token: "tok-a".into() });
    pump(&mut ctl, &mut rx).await;
    let revision = ctl.session(ViewKind::Detail).unwrap().charts().get(NODE_NET).unwrap().revision;

    let err = FetchError::DataShape("missing field `history`".into());
    backend.set_details(Err(err.clone()));
    tokio::time::sleep(TICK).await;
    assert_eq!(pump(&mut ctl, &mut rx).await, vec![Applied::Failed(err.clone())]);

    let session = ctl.session(ViewKind::Detail).unwrap();
    assert_eq!(session.last_error(), Some(&err));
    let chart = session.charts().get(NODE_NET).unwrap();
    assert_eq!(chart.revision, revision);
    assert_eq!(chart.datasets[0].data.len(), 2);
    assert!(ctl.is_open(ViewKind::Detail));
    assert!(ctl.scheduler().is_running("detail"));
}

#[tokio::test(start_paused = true)]
async fn log_fetch_errors_are_kept_on_the_session() {
    let backend = FakeBackend::new();
    backend.set_logs(Err(FetchError::Api("log file missing".into())));
    let (mut ctl, mut rx) = controller(&backend);

    ctl.open(ViewParams::Logs);
    let applied = pump(&mut ctl, &mut rx).await;
    assert_eq!(applied, vec![Applied::Failed(FetchError::Api("log file missing".into()))]);
    let session = ctl.session(ViewKind::Logs).unwrap();
    assert_eq!(session.last_error(), Some(&FetchError::Api("log file missing".into())));
    let ViewState::Logs(logs) = session.state() else { panic!("logs state") };
    assert!(logs.lines.is_none());
    // Logs stay open on a backend error, unlike a detail view
    assert!(ctl.is_open(ViewKind::Logs));

    backend.set_logs(Ok(vec!["INFO up".into()]));
    tokio::time::sleep(TICK).await;
    pump(&mut ctl, &mut rx).await;
    let transient = FetchError::Transient("connection refused".into());
    backend.set_logs(Err(transient.clone()));
    tokio::time::sleep(TICK).await;
    pump(&mut ctl, &mut rx).await;

    let session = ctl.session(ViewKind::Logs).unwrap();
    assert_eq!(session.last_error(), Some(&transient));
    let ViewState::Logs(logs) = session.state() else { panic!("logs state") };
    assert_eq!(logs.lines.as_deref(), Some(&["INFO up".to_string()][..]));
}

#[tokio::test(start_paused = true)]
async fn unknown_node_closes_detail_and_releases_lock() {
    let backend = FakeBackend::new();
    backend.set_details(Err(FetchError::Api("Node not found".into())));
    let (mut ctl, mut rx) = controller(&backend);

    ctl.open(ViewParams::Detail { token: "gone".into() });
    assert!(ctl.scroll_locked());
    let applied = pump(&mut ctl, &mut rx).await;

    assert_eq!(applied, vec![Applied::Closed("Node not found".into())]);
    assert!(!ctl.is_open(ViewKind::Detail));
    assert!(!ctl.scroll_locked());
    assert_eq!(ctl.scheduler().active(), 0);

    tokio::time::sleep(TICK * 3).await;
    assert_eq!(backend.calls.details.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn access_denied_is_notified_once_and_polling_continues() {
    let backend = FakeBackend::new();
    *backend.logs.lock().unwrap() = Err(FetchError::AccessDenied);
    let (mut ctl, mut rx) = controller(&backend);

    ctl.open(ViewParams::Logs);
    assert_eq!(pump(&mut ctl, &mut rx).await, vec![Applied::Notice("Access denied".into())]);
    tokio::time::sleep(TICK * 2).await;
    let again = pump(&mut ctl, &mut rx).await;
    assert!(again.iter().all(|a| *a == Applied::Skipped), "{again:?}");
    assert!(!again.is_empty());

    let session = ctl.session(ViewKind::Logs).unwrap();
    assert!(session.access_denied());
    assert!(ctl.scheduler().is_running("logs"));
}

#[tokio::test(start_paused = true)]
async fn grid_owns_nodes_and_agent_chart() {
    let backend = FakeBackend::new();
    let (mut ctl, mut rx) = controller(&backend);
    ctl.open(ViewParams::Grid);
    let applied = pump(&mut ctl, &mut rx).await;
    assert_eq!(applied.len(), 2);

    assert_eq!(ctl.scheduler().active(), 2);
    let grid = ctl.grid().unwrap();
    assert_eq!(grid.nodes.len(), 3);
    assert_eq!(grid.agent.as_ref().map(|s| s.disk), Some(70.0));

    let chart = ctl.session(ViewKind::Grid).unwrap().charts().get(AGENT_NET).unwrap();
    assert_eq!(chart.len(), 3);
    assert_eq!(chart.labels.last().map(String::as_str), Some("-0s"));

    ctl.close(ViewKind::Grid);
    assert_eq!(ctl.scheduler().active(), 0);
}

#[tokio::test(start_paused = true)]
async fn selection_is_locked_while_an_overlay_is_open() {
    let backend = FakeBackend::new();
    let (mut ctl, mut rx) = controller(&backend);
    ctl.open(ViewParams::Grid);
    pump(&mut ctl, &mut rx).await;

    ctl.select_next();
    assert_eq!(ctl.selected_node().map(|n| n.token.as_str()), Some("b"));

    ctl.open(ViewParams::Logs);
    ctl.select_next();
    assert_eq!(ctl.selected_node().map(|n| n.token.as_str()), Some("b"));
    assert_eq!(ctl.top_overlay(), Some(ViewKind::Logs));

    ctl.close(ViewKind::Logs);
    ctl.select_next();
    ctl.select_next();
    assert_eq!(ctl.selected_node().map(|n| n.token.as_str()), Some("c"));
    ctl.select_prev();
    assert_eq!(ctl.selected_node().map(|n| n.token.as_str()), Some("b"));
}

#[tokio::test(start_paused = true)]
async fn confirmed_delete_removes_the_row() {
    let backend = FakeBackend::new();
    let (mut ctl, mut rx) = controller(&backend);
    ctl.open(ViewParams::Grid);
    pump(&mut ctl, &mut rx).await;

    ctl.submit(Submission::DeleteNode { token: "a".into() });
    let applied = pump(&mut ctl, &mut rx).await;
    assert!(applied.contains(&Applied::Notice("Node deleted".into())), "{applied:?}");

    let tokens: Vec<&str> = ctl.grid().unwrap().nodes.iter().map(|n| n.token.as_str()).collect();
    assert_eq!(tokens, vec!["b", "c"]);
    assert_eq!(
        backend.submitted.lock().unwrap().as_slice(),
        &[Submission::DeleteNode { token: "a".into() }]
    );
}
