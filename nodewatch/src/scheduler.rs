//! Named recurring poll loops.
//!
//! Each name maps to at most one running task. Starting a name that is
//! already running aborts the old task first. A tick that fails is logged
//! and the loop carries on; only [`PollScheduler::stop`] ends it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use crate::error::FetchError;

/// Passed to every invocation of a loop action.
#[derive(Debug, Clone)]
pub struct TickContext {
    pub name: Arc<str>,
    /// Bumped on every `start`, so a replaced loop is distinguishable.
    pub generation: u64,
    pub tick: u64,
}

struct LoopEntry {
    generation: u64,
    interval: Duration,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct PollScheduler {
    loops: HashMap<String, LoopEntry>,
    next_generation: u64,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` now and then every `interval` until stopped or replaced.
    ///
    /// Must be called from within a tokio runtime. Returns the loop's generation.
    pub fn start<F, Fut>(&mut self, name: &str, interval: Duration, action: F) -> u64
    where
        F: Fn(TickContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), FetchError>> + Send + 'static,
    {
        if let Some(prev) = self.loops.remove(name) {
            debug!(loop_name = name, generation = prev.generation, "replacing running loop");
            prev.handle.abort();
        }
        self.next_generation += 1;
        let generation = self.next_generation;
        let handle = tokio::spawn(run_loop(Arc::from(name), generation, interval, action));
        self.loops.insert(name.to_string(), LoopEntry { generation, interval, handle });
        debug!(loop_name = name, generation, ?interval, "loop started");
        generation
    }

    /// Cancel future ticks of `name`. Returns whether a loop was running.
    ///
    /// A request already in flight is dropped with the task; anything it
    /// already handed off is the receiver's to discard.
    pub fn stop(&mut self, name: &str) -> bool {
        match self.loops.remove(name) {
            Some(entry) => {
                entry.handle.abort();
                debug!(loop_name = name, generation = entry.generation, "loop stopped");
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self) {
        for (name, entry) in self.loops.drain() {
            entry.handle.abort();
            debug!(loop_name = %name, generation = entry.generation, "loop stopped");
        }
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.loops.get(name).is_some_and(|e| !e.handle.is_finished())
    }

    pub fn generation(&self, name: &str) -> Option<u64> {
        self.loops.get(name).map(|e| e.generation)
    }

    pub fn interval(&self, name: &str) -> Option<Duration> {
        self.loops.get(name).map(|e| e.interval)
    }

    /// Number of registered loops.
    pub fn active(&self) -> usize {
        self.loops.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.loops.keys().map(String::as_str)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop_all();
    }
}

async fn run_loop<F, Fut>(name: Arc<str>, generation: u64, interval: Duration, action: F)
where
    F: Fn(TickContext) -> Fut,
    Fut: Future<Output = Result<(), FetchError>>,
{
    let mut ticker = tokio::time::interval(interval);
    // A slow tick pushes the schedule back instead of firing a burst.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick = 0u64;
    loop {
        ticker.tick().await;
        let ctx = TickContext { name: name.clone(), generation, tick };
        match action(ctx).await {
            Ok(()) => trace!(loop_name = %name, generation, tick, "tick ok"),
            Err(e) => warn!(loop_name = %name, generation, tick, error = %e, "tick failed"),
        }
        tick += 1;
    }
}
