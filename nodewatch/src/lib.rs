//! nodewatch engine: polling, rate math, history windows and chart models
//! for a fleet-monitoring backend. The TUI in `main.rs` is a thin layer on top.

pub mod chart;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod profiles;
pub mod rate;
pub mod scheduler;
pub mod status;
pub mod theme;
pub mod types;
pub mod view;

pub use client::{Backend, HttpBackend};
pub use config::PollConfig;
pub use error::{ChartError, FetchError};
pub use view::{Applied, Event, ViewController, ViewKind, ViewParams};
