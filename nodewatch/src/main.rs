//! Entry point for the nodewatch TUI. Parses args, resolves the connection
//! profile, sets up file logging and runs the App or a one-shot command.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nodewatch::client::{Backend, HttpBackend};
use nodewatch::config::PollConfig;
use nodewatch::format::{format_last_seen, format_percent, truncate_middle};
use nodewatch::profiles::{
    load_profiles, save_profiles, ProfileEntry, ProfileRequest, ProfilesFile, ResolveProfile,
};
use nodewatch::status::{now_secs, status_with_threshold};
use nodewatch::theme::Theme;
use nodewatch::types::Submission;

use app::App;

/// Terminal dashboard for a fleet of monitored nodes.
#[derive(Parser, Debug)]
#[command(name = "nodewatch", version, about)]
struct Cli {
    /// Backend base URL (e.g. https://fleet.example:8443)
    url: Option<String>,

    /// PEM file with a CA certificate to trust for https backends
    #[arg(short = 't', long, global = true)]
    tls_ca: Option<String>,

    /// Named connection profile to load or create
    #[arg(short = 'P', long, global = true)]
    profile: Option<String>,

    /// Overwrite a changed profile without asking
    #[arg(long, global = true)]
    save: bool,

    /// Resolve and persist the profile, print the target and exit
    #[arg(long, global = true)]
    dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log file path (defaults to nodewatch.log in the temp dir)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Start with the light theme
    #[arg(long)]
    light: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the node list with derived status
    Nodes,
    /// Provision a node and print its token
    AddNode { name: String },
    /// Delete a node by token
    DeleteNode { token: String },
    /// Ask a node to reboot
    RebootNode { token: String },
}

/// File-only tracing; stdout/stderr belong to the TUI. Keep the guard alive
/// until exit so buffered lines are flushed.
fn setup_tracing(cli: &Cli) -> anyhow::Result<WorkerGuard> {
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nodewatch={level}")));

    let path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("nodewatch.log"));
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .context("log file path has no file name")?
        .to_owned();

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .try_init()
        .context("installing tracing subscriber")?;
    Ok(guard)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = setup_tracing(&cli)?;

    let profiles_file = load_profiles();
    let Some((url, tls_ca)) = resolve_target(&cli, &profiles_file)? else {
        return Ok(());
    };
    let poll = profiles_file.poll_config().with_env_overrides();
    info!(%url, tls_ca = tls_ca.as_deref().unwrap_or("-"), "target resolved");

    if cli.dry_run {
        match &tls_ca {
            Some(ca) => println!("nodewatch: target {url} (ca {ca})"),
            None => println!("nodewatch: target {url}"),
        }
        return Ok(());
    }

    let backend = HttpBackend::new(&url, tls_ca.as_deref(), poll.request_timeout())
        .with_context(|| format!("building client for {url}"))?;

    match cli.command {
        Some(cmd) => run_command(&backend, cmd, &poll).await,
        None => {
            let theme = if cli.light { Theme::Light } else { Theme::Dark };
            let mut app = App::new(Arc::new(backend), poll, theme);
            app.run().await
        }
    }
}

/// Profile resolution: direct URL, load by name, prompt to select, prompt to create.
/// `Ok(None)` means the user aborted or nothing was given.
fn resolve_target(
    cli: &Cli,
    profiles_file: &ProfilesFile,
) -> anyhow::Result<Option<(String, Option<String>)>> {
    let req = ProfileRequest {
        profile_name: cli.profile.clone(),
        url: cli.url.clone(),
        tls_ca: cli.tls_ca.clone(),
    };
    let mut profiles_mut = profiles_file.clone();
    let target = match req.resolve(profiles_file) {
        ResolveProfile::Direct(u, t) => {
            if let Some(name) = cli.profile.as_ref() {
                let entry = ProfileEntry { url: u.clone(), tls_ca: t.clone() };
                let write = match profiles_mut.profiles.get(name) {
                    // New profile: save immediately
                    None => true,
                    Some(existing) if *existing == entry => false,
                    Some(_) => {
                        cli.save || prompt_yes_no(&format!("Overwrite existing profile '{name}'? [y/N]: "))
                    }
                };
                if write {
                    profiles_mut.profiles.insert(name.clone(), entry);
                    save_profiles(&profiles_mut).context("saving profiles")?;
                }
            }
            (u, t)
        }
        ResolveProfile::Loaded(u, t) => (u, t),
        ResolveProfile::PromptSelect(names) => {
            eprintln!("Select profile:");
            for (i, n) in names.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, n);
            }
            let line = prompt_string("Enter number (or blank to abort): ")?;
            let picked = line
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| idx.checked_sub(1))
                .and_then(|idx| names.get(idx))
                .and_then(|name| profiles_mut.profiles.get(name));
            match picked {
                Some(entry) => (entry.url.clone(), entry.tls_ca.clone()),
                None => return Ok(None),
            }
        }
        ResolveProfile::PromptCreate(name) => {
            eprintln!("Profile '{name}' does not exist yet.");
            let url = prompt_string("Enter URL (http://HOST:PORT or https://...): ")?;
            if url.trim().is_empty() {
                return Ok(None);
            }
            let ca = prompt_string("Enter TLS CA path (or leave blank): ")?;
            let ca_opt = Some(ca.trim().to_string()).filter(|c| !c.is_empty());
            profiles_mut.profiles.insert(
                name,
                ProfileEntry { url: url.trim().to_string(), tls_ca: ca_opt.clone() },
            );
            save_profiles(&profiles_mut).context("saving profiles")?;
            (url.trim().to_string(), ca_opt)
        }
        ResolveProfile::None => {
            eprintln!("No URL provided and no profiles to select.");
            return Ok(None);
        }
    };
    Ok(Some(target))
}

async fn run_command(backend: &HttpBackend, cmd: Command, poll: &PollConfig) -> anyhow::Result<()> {
    match cmd {
        Command::Nodes => {
            let nodes = backend.nodes().await.context("fetching node list")?;
            let now = now_secs();
            println!("{:<11} {:<24} {:<16} {:>5} {:>5}  LAST SEEN", "STATUS", "NAME", "IP", "CPU", "RAM");
            for n in &nodes {
                let st = status_with_threshold(now, n.last_seen, n.is_restarting, poll.online_threshold_secs);
                println!(
                    "{:<11} {:<24} {:<16} {:>5} {:>5}  {}",
                    st.label(),
                    truncate_middle(&n.name, 24),
                    n.ip,
                    format_percent(n.cpu_percent),
                    format_percent(n.ram_percent),
                    format_last_seen(n.last_seen),
                );
            }
        }
        Command::AddNode { name } => {
            let v = backend.submit(Submission::AddNode { name: name.clone() }).await?;
            match v.get("token").and_then(|t| t.as_str()) {
                Some(token) => println!("added '{name}': {token}"),
                None => println!("added '{name}'"),
            }
        }
        Command::DeleteNode { token } => {
            backend.submit(Submission::DeleteNode { token: token.clone() }).await?;
            println!("deleted {token}");
        }
        Command::RebootNode { token } => {
            backend
                .submit(Submission::NodeCommand { token: token.clone(), command: "reboot".into() })
                .await?;
            println!("reboot requested for {token}");
        }
    }
    Ok(())
}

fn prompt_yes_no(prompt: &str) -> bool {
    match prompt_string(prompt) {
        Ok(line) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn prompt_string(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
