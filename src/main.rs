mod cache;
mod client;
mod config;
mod registry;
mod selection;
mod session;
mod tui;
mod ui;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use client::Client;
use config::{ConfigFile, Overrides, ResolvedConfig};
use registry::{FileDescriptor, Registry};
use selection::SelectionStore;
use session::{ChatSession, Outcome, Sender};

#[derive(Parser, Debug)]
#[command(
    name = "filechat",
    about = "Chat with a document QA server about the files you pick",
    long_about = None,
)]
struct Args {
    /// Question to ask directly (omit to enter interactive TUI mode)
    question: Option<String>,

    /// Profile to use from config file
    #[arg(short, long, env = "FILECHAT_PROFILE")]
    profile: Option<String>,

    /// Override server URL
    #[arg(long, env = "FILECHAT_ENDPOINT")]
    endpoint: Option<String>,

    /// Session cookie sent with every request
    #[arg(long, env = "FILECHAT_COOKIE", hide_env_values = true)]
    cookie: Option<String>,

    /// File id to attach to the question (repeatable)
    #[arg(short, long = "select", value_name = "ID")]
    select: Vec<String>,

    /// Read the file list from a JSON file instead of the server
    #[arg(long, value_name = "PATH")]
    registry: Option<PathBuf>,

    /// Write a default config file to ~/.config/filechat/config.toml and exit
    #[arg(long)]
    init: bool,

    /// List available profiles and exit
    #[arg(long)]
    profiles: bool,

    /// Generate shell completions and print to stdout (bash, zsh, fish, elvish)
    #[arg(long, value_name = "SHELL")]
    completions: Option<String>,

    /// Print the server's file cache status and exit
    #[arg(long)]
    cache_status: bool,

    /// Clear the server's file cache and exit
    #[arg(long)]
    clear_cache: bool,

    /// Skip the confirmation prompt for --clear-cache
    #[arg(short, long, requires = "clear_cache")]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = init_logging() {
        eprintln!("  logging disabled: {e:#}");
    }

    // ── --init ────────────────────────────────────────────────────────────────
    if args.init {
        let path = ConfigFile::write_default_if_missing()?;
        println!("Config written to: {}", path.display());
        println!("Edit it, then run: filechat");
        return Ok(());
    }

    // ── --completions ─────────────────────────────────────────────────────────
    if let Some(shell_name) = &args.completions {
        return generate_completions(shell_name);
    }

    let file = ConfigFile::load()?;

    // ── --profiles ────────────────────────────────────────────────────────────
    if args.profiles {
        print_profiles(&file);
        return Ok(());
    }

    let resolved = ResolvedConfig::resolve(
        &file,
        &Overrides {
            profile: args.profile.as_deref(),
            endpoint: args.endpoint.as_deref(),
            cookie: args.cookie.as_deref(),
            registry_file: args.registry.as_deref(),
        },
    );
    info!(profile = %resolved.profile_name, endpoint = %resolved.endpoint, "config resolved");

    let mut client = Client::new(resolved.endpoint.clone());
    if let Some(cookie) = &resolved.cookie {
        client.set_cookie(cookie.clone());
    }

    // ── Cache maintenance ─────────────────────────────────────────────────────
    if args.cache_status {
        return print_cache_status(&client).await;
    }
    if args.clear_cache {
        return clear_cache(&client, args.yes).await;
    }

    // ── Single-shot mode (non-TUI) ────────────────────────────────────────────
    if let Some(question) = args.question {
        return run_single_shot(question, &args.select, &resolved, &client).await;
    }

    // ── Interactive TUI mode ──────────────────────────────────────────────────
    tui::run(resolved, Arc::new(client)).await
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// Route tracing output to the log file; the terminal belongs to the TUI.
fn init_logging() -> Result<()> {
    let path = config::log_path();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_env("FILECHAT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(())
}

// ── Single-shot mode (plain stdout, no TUI) ───────────────────────────────────

async fn run_single_shot(
    question: String,
    select: &[String],
    resolved: &ResolvedConfig,
    client: &Client,
) -> Result<()> {
    let mut store = SelectionStore::new();
    if !select.is_empty() {
        let registry = load_registry(resolved, client).await;
        for id in select {
            match registry.find(id) {
                Some(file) => store.add(file),
                None => {
                    warn!(%id, "selected id is not in the file list");
                    store.add(&FileDescriptor::bare(id));
                }
            }
        }
    }

    println!();
    println!("  ▲ filechat  {}  ·  {}", resolved.profile_name, resolved.endpoint);
    if !store.is_empty() {
        let names: Vec<&str> = store.entries().iter().map(|e| e.name.as_str()).collect();
        println!("  files: {}", names.join(", "));
    } else {
        println!("  files: all");
    }
    println!();

    let mut session = ChatSession::new();
    session.set_input(question);
    let Some(outcome) = session.send(client, &store).await else {
        bail!("nothing to ask: the question is blank");
    };

    for msg in session.transcript() {
        let who = match msg.sender {
            Sender::User => "you",
            Sender::Bot => "bot",
        };
        if resolved.show_timestamps {
            println!("  {who} [{}]: {}", msg.timestamp, msg.text);
        } else {
            println!("  {who}: {}", msg.text);
        }
    }
    println!();

    if outcome == Outcome::Failed {
        bail!("request failed; details in {}", config::log_path().display());
    }
    Ok(())
}

/// File list for resolving `--select` ids. Failure leaves it empty so the ids
/// still go out as bare entries.
async fn load_registry(resolved: &ResolvedConfig, client: &Client) -> Registry {
    let result = match &resolved.registry_file {
        Some(path) => Registry::load_file(path),
        None => match client.directory().await {
            Ok(reply) => Registry::from_reply(reply),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to fetch the file list")),
        },
    };
    result.unwrap_or_else(|e| {
        warn!(error = %format!("{e:#}"), "file list unavailable");
        eprintln!("  ⚠ file list unavailable ({e:#}); sending ids as given");
        Registry::default()
    })
}

// ── Cache maintenance ─────────────────────────────────────────────────────────

async fn print_cache_status(client: &Client) -> Result<()> {
    let status = client
        .cache_status()
        .await
        .context("Error getting cache status")?;
    match cache::status_report(&status) {
        Ok(report) => {
            println!("{report}");
            Ok(())
        }
        Err(reason) => bail!("Error getting cache status: {reason}"),
    }
}

async fn clear_cache(client: &Client, yes: bool) -> Result<()> {
    if !yes && !confirm(cache::CLEAR_CONFIRM_PROMPT)? {
        info!("confirmation declined");
        println!("Cancelled.");
        return Ok(());
    }
    info!("clearing server file cache");
    let result = client.clear_cache().await;
    println!("{}", cache::clear_report(&result));
    if let Err(e) = result {
        warn!(error = %e, "cache clear failed");
        std::process::exit(1);
    }
    Ok(())
}

/// Ask a yes/no question on stdin; anything but y/yes is a no.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

// ── Profiles & completions ────────────────────────────────────────────────────

fn print_profiles(file: &ConfigFile) {
    println!();
    println!("  Profiles");
    for name in file.profile_names() {
        let Some(p) = file.profiles.get(name) else { continue };
        let marker = if name == file.default_profile { " ←" } else { "" };
        println!("  {name}{marker}");
        println!("    endpoint     {}", p.endpoint);
        if let Some(path) = &p.registry_file {
            println!("    file list    {}", path.display());
        }
        println!("    cookie       {}", if p.cookie.is_some() { "set" } else { "none" });
        println!("    suggestions  {}", p.suggestions.len());
        println!();
    }
}

fn generate_completions(shell_name: &str) -> Result<()> {
    use clap_complete::{Shell, generate};

    let shell: Shell = match shell_name.to_lowercase().as_str() {
        "bash"    => Shell::Bash,
        "zsh"     => Shell::Zsh,
        "fish"    => Shell::Fish,
        "elvish"  => Shell::Elvish,
        _ => {
            eprintln!("Unknown shell: {shell_name}");
            eprintln!("Supported: bash, zsh, fish, elvish");
            std::process::exit(1);
        }
    };

    let mut cmd = Args::command();
    generate(shell, &mut cmd, "filechat", &mut io::stdout());
    Ok(())
}
