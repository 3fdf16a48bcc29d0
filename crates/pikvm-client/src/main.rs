//! `pikvm` – command-line remote control for a PiKVM.
//!
//! # Usage
//!
//! ```text
//! pikvm [GLOBAL OPTIONS] <COMMAND>
//!
//! Commands:
//!   type         Type text with human-like cadence and typos
//!   print        Send text in one request at full device speed
//!   key          Press, release, or click a key
//!   move         Move the pointer to absolute coordinates
//!   click        Press, release, or click a mouse button
//!   scroll       Turn the scroll wheel
//!   screenshot   Save the current target screen
//!   replay       Replay a kvmd event script over the WebSocket API
//!   run          Run a TOML action list
//!   init-config  Write a default configuration file
//! ```
//!
//! # Configuration precedence
//!
//! Command-line flags beat environment variables (`PIKVM_HOST`,
//! `PIKVM_USER`, `PIKVM_PASSWORD`), which beat the config file, which beats
//! the built-in defaults.
//!
//! Log output is controlled by `RUST_LOG`; without it, `[logging] level`
//! from the config file applies.
//!
//! `--dry-run` only covers the HID commands (`type`, `print`, `key`, `move`,
//! `click`, `scroll`, `run`).  It is refused for the others.
//!
//! Ctrl+C stops the command between two steps and exits with an error, so
//! callers can tell an interrupted run from a finished one.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pikvm_client::application::{
    replay_script, ActionRunner, HidTransport, HumanTypist,
};
use pikvm_client::infrastructure::http::PiKvmHttpClient;
use pikvm_client::infrastructure::mock::RecordingTransport;
use pikvm_client::infrastructure::storage::config::{
    config_file_path, load_config, save_config, AppConfig,
};
use pikvm_client::infrastructure::ws::KvmdSocket;
use pikvm_core::{
    ActionList, DeviceAction, EventScript, KeyCode, MouseButton, RngSource, TypingParameters,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Remote control for a PiKVM: human-like typing, mouse, screenshots, and
/// event replay.
#[derive(Debug, Parser)]
#[command(name = "pikvm", version)]
struct Cli {
    /// Configuration file.  Must exist when given.
    #[arg(long, global = true, env = "PIKVM_CONFIG")]
    config: Option<PathBuf>,

    /// Device host name or IP address (optionally `host:port`).
    #[arg(long, global = true, env = "PIKVM_HOST")]
    host: Option<String>,

    /// kvmd user name.
    #[arg(long, global = true, env = "PIKVM_USER")]
    user: Option<String>,

    /// kvmd password.
    #[arg(long, global = true, env = "PIKVM_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Accept self-signed certificates even if the config enables verification.
    #[arg(long, global = true)]
    insecure: bool,

    /// Print the HID requests instead of sending them.  Delays still apply.
    /// Not accepted by `screenshot`, `replay`, or `init-config`.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Type text with human-like cadence and typos.
    Type(TypeArgs),

    /// Send text in one request at full device speed.
    Print {
        text: String,
    },

    /// Press, release, or click a key (web `KeyboardEvent.code` name).
    Key {
        key: KeyCode,
        #[command(flatten)]
        state: StateArgs,
        /// Let kvmd release stuck modifiers after this event.
        #[arg(long, requires = "state")]
        finish: bool,
    },

    /// Move the pointer to absolute coordinates in -32768..=32767.
    Move {
        #[arg(allow_negative_numbers = true)]
        x: i16,
        #[arg(allow_negative_numbers = true)]
        y: i16,
    },

    /// Press, release, or click a mouse button.
    Click {
        #[arg(default_value = "left")]
        button: MouseButton,
        #[command(flatten)]
        state: StateArgs,
    },

    /// Turn the scroll wheel.
    Scroll {
        #[arg(allow_negative_numbers = true)]
        delta_x: i16,
        #[arg(allow_negative_numbers = true)]
        delta_y: i16,
        #[arg(long, default_value_t = 1)]
        repeat: u32,
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
    },

    /// Save the current target screen.
    Screenshot {
        #[arg(long, short, default_value = "screenshot.jpg")]
        output: PathBuf,
    },

    /// Replay a kvmd event script (JSON) over the WebSocket API.
    Replay {
        script: PathBuf,
    },

    /// Run a TOML action list.
    Run {
        actions: PathBuf,
        /// Wait this long before the first step.  Defaults to the config.
        #[arg(long)]
        start_delay_ms: Option<u64>,
    },

    /// Write a default configuration file to `--config` or the default path.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("input").required(true).multiple(true).args(["text", "file"])))]
struct TypeArgs {
    /// Text to type.
    #[arg(long)]
    text: Option<String>,

    /// File whose contents are typed.  Wins over `--text` when it exists.
    #[arg(long)]
    file: Option<PathBuf>,

    #[arg(long)]
    wpm: Option<f64>,

    #[arg(long)]
    error_rate: Option<f64>,

    #[arg(long)]
    max_typo_length: Option<u32>,

    /// Seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Wait this long before the first keystroke.  Defaults to the config.
    #[arg(long)]
    start_delay_ms: Option<u64>,
}

/// `--press` / `--release`; neither means a full click.
#[derive(Debug, Args)]
#[group(id = "state", multiple = false)]
struct StateArgs {
    #[arg(long)]
    press: bool,
    #[arg(long)]
    release: bool,
}

impl StateArgs {
    fn state(&self) -> Option<bool> {
        match (self.press, self.release) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

impl Cli {
    /// Applies the global connection flags on top of the loaded config.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.device.host = host.clone();
        }
        if let Some(user) = &self.user {
            config.device.username = user.clone();
        }
        if let Some(password) = &self.password {
            config.device.password = password.clone();
        }
        if self.insecure {
            config.device.verify_tls = false;
        }
    }
}

impl TypeArgs {
    /// Config typing parameters with the command-line overrides applied.
    fn parameters(&self, config: &AppConfig) -> TypingParameters {
        let mut params = config.typing.parameters();
        if let Some(wpm) = self.wpm {
            params.wpm = wpm;
        }
        if let Some(error_rate) = self.error_rate {
            params.error_rate = error_rate;
        }
        if let Some(max) = self.max_typo_length {
            params.max_typo_length = max;
        }
        params
    }
}

/// Picks the text to type: an existing `--file` wins, then `--text`.
fn resolve_text(text: Option<&str>, file: Option<&Path>) -> anyhow::Result<String> {
    if let Some(path) = file {
        if path.exists() {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
        if text.is_none() {
            bail!("text file {} does not exist", path.display());
        }
        info!("{} does not exist; typing --text instead", path.display());
    }
    text.map(str::to_string)
        .context("either --text or --file is required")
}

fn load_action_list(path: &Path) -> anyhow::Result<ActionList> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read action list {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("invalid action list {}", path.display()))
}

fn load_event_script(path: &Path) -> anyhow::Result<EventScript> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read event script {}", path.display()))?;
    EventScript::from_json(&content)
        .with_context(|| format!("invalid event script {}", path.display()))
}

// ── Command execution ─────────────────────────────────────────────────────────

/// Fails for commands that never send HID requests, since `--dry-run` would
/// silently not apply to them.
fn check_dry_run(command: &Command, dry_run: bool) -> anyhow::Result<()> {
    let name = match command {
        Command::Screenshot { .. } => "screenshot",
        Command::Replay { .. } => "replay",
        Command::InitConfig { .. } => "init-config",
        _ => return Ok(()),
    };
    if dry_run {
        bail!("--dry-run is not supported by `{name}`");
    }
    Ok(())
}

/// The transport for HID commands plus, in dry-run mode, the recorder behind
/// it so the calls can be printed afterwards.
fn build_transport(
    config: &AppConfig,
    dry_run: bool,
) -> anyhow::Result<(Arc<dyn HidTransport>, Option<Arc<RecordingTransport>>)> {
    if dry_run {
        let recorder = Arc::new(RecordingTransport::new());
        return Ok((recorder.clone(), Some(recorder)));
    }
    let client = PiKvmHttpClient::new(&config.device).context("failed to build HTTP client")?;
    Ok((Arc::new(client), None))
}

async fn start_delay(millis: u64) {
    if millis > 0 {
        info!("starting in {millis} ms");
        tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
    }
}

async fn run_command(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match &cli.command {
        Command::InitConfig { force } => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => config_file_path()?,
            };
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            save_config(&AppConfig::default(), &path)?;
            println!("wrote {}", path.display());
            return Ok(());
        }
        Command::Screenshot { output } => {
            let client = PiKvmHttpClient::new(&config.device)?;
            let image = client.snapshot().await.context("screenshot failed")?;
            tokio::fs::write(output, &image)
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!("saved {} bytes to {}", image.len(), output.display());
            return Ok(());
        }
        Command::Replay { script } => {
            let script = load_event_script(script)?;
            let mut socket = KvmdSocket::connect(&config.device)
                .await
                .context("failed to open kvmd WebSocket")?;
            let report = replay_script(&mut socket, &script).await?;
            info!(
                "replayed {} events ({:?} of delays)",
                report.events_sent, report.waited
            );
            return Ok(());
        }
        _ => {}
    }

    let (transport, recorder) = build_transport(&config, cli.dry_run)?;

    match &cli.command {
        Command::Type(args) => {
            let text = resolve_text(args.text.as_deref(), args.file.as_deref())?;
            let params = args.parameters(&config);
            params.validate()?;
            let typist = HumanTypist::new(Arc::clone(&transport), params);

            start_delay(args.start_delay_ms.unwrap_or(config.typing.start_delay_ms)).await;
            let report = match args.seed.or(config.typing.seed) {
                Some(seed) => typist.type_text(&text, &mut RngSource::seeded(seed)).await?,
                None => typist.type_text(&text, &mut RngSource::from_entropy()).await?,
            };
            info!(
                "done: {} characters, {} backspaces, {:?} of delays",
                report.characters, report.backspaces, report.total_delay
            );
        }
        Command::Run {
            actions,
            start_delay_ms,
        } => {
            let list = load_action_list(actions)?;
            let params = config.typing.parameters();
            params.validate()?;
            let typist = HumanTypist::new(Arc::clone(&transport), params);
            let runner = ActionRunner::new(Arc::clone(&transport), typist, config.typing.seed);

            start_delay(start_delay_ms.unwrap_or(config.typing.start_delay_ms)).await;
            runner.run(&list).await?;
        }
        command => {
            let action = single_action(command)
                .context("command has no single-action form")?;
            let typist = HumanTypist::new(Arc::clone(&transport), config.typing.parameters());
            let runner = ActionRunner::new(Arc::clone(&transport), typist, None);
            runner.run_step(&action).await?;
        }
    }

    if let Some(recorder) = recorder {
        for call in recorder.calls() {
            println!("{call:?}");
        }
    }
    Ok(())
}

/// Maps the one-shot HID commands onto the equivalent action-list step.
fn single_action(command: &Command) -> Option<DeviceAction> {
    let action = match command {
        Command::Print { text } => DeviceAction::Print { text: text.clone() },
        Command::Key { key, state, finish } => DeviceAction::Key {
            key: *key,
            state: state.state(),
            finish: *finish,
        },
        Command::Move { x, y } => DeviceAction::MouseMove { x: *x, y: *y },
        Command::Click { button, state } => DeviceAction::Click {
            button: *button,
            state: state.state(),
        },
        Command::Scroll {
            delta_x,
            delta_y,
            repeat,
            interval_ms,
        } => DeviceAction::Scroll {
            delta_x: *delta_x,
            delta_y: *delta_y,
            repeat: *repeat,
            interval_ms: *interval_ms,
        },
        _ => return None,
    };
    Some(action)
}

/// Runs `command` unless `interrupt` fires first, which is reported as an
/// error.  Dropping the command future stops typing or replay between two
/// steps.
async fn until_interrupted(
    command: impl Future<Output = anyhow::Result<()>>,
    interrupt: impl Future<Output = std::io::Result<()>>,
) -> anyhow::Result<()> {
    tokio::select! {
        result = command => result,
        signal = interrupt => {
            signal.context("failed to listen for Ctrl+C")?;
            warn!("interrupted");
            bail!("interrupted before the command finished")
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    check_dry_run(&cli.command, cli.dry_run)?;

    // init-config must work before the file exists.
    let mut config = if matches!(cli.command, Command::InitConfig { .. }) {
        AppConfig::default()
    } else {
        load_config(cli.config.as_deref()).context("failed to load configuration")?
    };
    cli.apply_overrides(&mut config);

    // RUST_LOG wins; otherwise the config file's level applies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    until_interrupted(run_command(cli, config), tokio::signal::ctrl_c()).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
