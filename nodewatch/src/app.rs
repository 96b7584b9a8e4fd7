//! App state and main loop: input handling, folding poll results into the
//! view sessions, and drawing.

use std::{
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::sleep;
use tracing::{debug, info};

use nodewatch::client::Backend;
use nodewatch::config::PollConfig;
use nodewatch::theme::Theme;
use nodewatch::types::Submission;
use nodewatch::view::{Applied, Event, ViewController, ViewKind, ViewParams, ViewState};

use crate::ui;

const NOTICE_TTL: Duration = Duration::from_secs(5);
const FRAME: Duration = Duration::from_millis(100);

pub struct App {
    controller: ViewController,
    updates: UnboundedReceiver<Event>,
    theme: Theme,
    notice: Option<(String, Instant)>,
    /// Token waiting for a `y` before it is deleted.
    pending_delete: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(backend: Arc<dyn Backend>, config: PollConfig, theme: Theme) -> Self {
        let (controller, updates) = ViewController::new(backend, config, theme);
        Self {
            controller,
            updates,
            theme,
            notice: None,
            pending_delete: None,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        self.controller.open(ViewParams::Grid);
        let res = self.event_loop(&mut terminal).await;
        self.controller.close_all();

        // Teardown
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> anyhow::Result<()> {
        loop {
            // Input (non-blocking)
            while event::poll(Duration::from_millis(10))? {
                if let TermEvent::Key(k) = event::read()? {
                    if k.kind == KeyEventKind::Press {
                        self.on_key(k);
                    }
                }
            }
            if self.should_quit {
                info!("quit requested");
                break;
            }

            while let Ok(ev) = self.updates.try_recv() {
                let applied = self.controller.apply(ev);
                self.on_applied(applied);
            }
            if self.notice.as_ref().is_some_and(|(_, at)| at.elapsed() > NOTICE_TTL) {
                self.notice = None;
            }

            let notice = self.notice.as_ref().map(|(n, _)| n.as_str());
            terminal.draw(|f| ui::draw(f, &self.controller, notice))?;

            // Yields to the poll loops on this thread
            sleep(FRAME).await;
        }
        Ok(())
    }

    fn on_key(&mut self, k: KeyEvent) {
        if let Some(token) = self.pending_delete.take() {
            if matches!(k.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                self.controller.submit(Submission::DeleteNode { token });
                self.set_notice("Deleting node...");
            } else {
                self.set_notice("Delete cancelled");
            }
            return;
        }
        match k.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Esc => match self.controller.top_overlay() {
                Some(kind) => {
                    self.controller.close(kind);
                }
                None => self.should_quit = true,
            },
            KeyCode::Down | KeyCode::Char('j') => self.controller.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.controller.select_prev(),
            KeyCode::Enter => {
                if let Some(n) = self.controller.selected_node() {
                    let token = n.token.clone();
                    self.controller.open(ViewParams::Detail { token });
                }
            }
            KeyCode::Char('l') => {
                self.controller.open(ViewParams::Logs);
            }
            KeyCode::Char('t') => {
                self.theme = self.theme.toggled();
                let n = self.controller.set_theme(self.theme);
                debug!(charts = n, "theme toggled");
            }
            KeyCode::Char('r') => {
                if let Some(token) = self.target_token() {
                    self.controller.submit(Submission::NodeCommand { token, command: "reboot".into() });
                    self.set_notice("Reboot requested...");
                }
            }
            KeyCode::Char('x') => {
                if let Some(token) = self.target_token() {
                    self.set_notice(&format!("Delete node {token}? press y to confirm"));
                    self.pending_delete = Some(token);
                }
            }
            _ => {}
        }
    }

    /// The open detail's node, else the selected row.
    fn target_token(&self) -> Option<String> {
        if let Some(ViewState::Detail(d)) =
            self.controller.session(ViewKind::Detail).map(|s| s.state())
        {
            return Some(d.token.clone());
        }
        self.controller.selected_node().map(|n| n.token.clone())
    }

    fn on_applied(&mut self, applied: Applied) {
        match applied {
            Applied::Notice(msg) => self.set_notice(&msg),
            Applied::Closed(reason) => self.set_notice(&format!("Detail closed: {reason}")),
            Applied::Rendered | Applied::Skipped | Applied::Discarded | Applied::Failed(_) => {}
        }
    }

    fn set_notice(&mut self, msg: &str) {
        self.notice = Some((msg.to_string(), Instant::now()));
    }
}
