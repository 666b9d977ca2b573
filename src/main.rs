use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use chrono::Local;

use relicwatch::{
    cli::{Cli, OutputFormat},
    config::RelicwatchConfig,
    countdown::{format_countdown, CountdownController, DisplayBuffer, RenderSink},
    events::AppEvent,
    tailer::LogTailer,
    tui::{restore_terminal, setup_terminal, TuiApp},
    users,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.build_config()?;

    if let Err(err) = cli.validate(&config) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    cli.setup_logging();

    if cli.list_users {
        return run_list_users();
    }

    let log_path = resolve_log_path(&cli)?;
    tracing::info!("Starting relicwatch on: {}", log_path.display());

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let tailer = LogTailer::spawn(
        &log_path,
        config.triggers.trigger_set(),
        config.tailer.poll_interval(),
        event_tx.clone(),
    )
    .context("failed to start tailing the log")?;

    let result = match cli.output {
        OutputFormat::Tui => run_tui_mode(&config, &log_path, event_tx, event_rx),
        OutputFormat::Text => run_text_mode(&cli, &config, &log_path, event_tx, event_rx),
        OutputFormat::Json => run_json_mode(&config, event_tx, event_rx),
    };

    tailer.shutdown();
    result
}

fn resolve_log_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.path {
        Some(path) => Ok(path.clone()),
        None => users::resolve_log_path(cli.user.as_deref()),
    }
}

fn run_list_users() -> Result<()> {
    let root = users::chatlog_root()?;
    let list = users::list_users(&root)?;

    if list.is_empty() {
        println!("No user folders found under {}", root.display());
    } else {
        for user in &list {
            println!("{}", user);
        }
    }

    Ok(())
}

fn run_tui_mode(
    config: &RelicwatchConfig,
    log_path: &std::path::Path,
    event_tx: Sender<AppEvent>,
    event_rx: Receiver<AppEvent>,
) -> Result<()> {
    let controller = CountdownController::new(
        config.countdown.duration_secs,
        config.countdown.tick_interval(),
        event_tx,
        DisplayBuffer::new(),
    );

    let mut terminal = setup_terminal()?;

    let app = TuiApp::new(controller, event_rx, log_path.display().to_string());
    let res = app.run(&mut terminal);

    if let Err(err) = restore_terminal(&mut terminal) {
        eprintln!("Failed to restore terminal: {}", err);
    }

    res.context("terminal error")
}

fn run_text_mode(
    cli: &Cli,
    config: &RelicwatchConfig,
    log_path: &std::path::Path,
    event_tx: Sender<AppEvent>,
    event_rx: Receiver<AppEvent>,
) -> Result<()> {
    println!("Watching: {}", log_path.display());
    println!("Press Ctrl+C to quit");
    println!("---");

    let sink = TextRenderer {
        no_color: cli.no_color,
    };
    let controller = CountdownController::new(
        config.countdown.duration_secs,
        config.countdown.tick_interval(),
        event_tx,
        sink,
    );

    run_console_loop(controller, event_rx)
}

fn run_json_mode(
    config: &RelicwatchConfig,
    event_tx: Sender<AppEvent>,
    event_rx: Receiver<AppEvent>,
) -> Result<()> {
    let controller = CountdownController::new(
        config.countdown.duration_secs,
        config.countdown.tick_interval(),
        event_tx,
        JsonRenderer,
    );

    run_console_loop(controller, event_rx)
}

/// Drain the app channel into the controller until Ctrl+C, quit, or stream
/// loss. This loop is the single writer of countdown state.
fn run_console_loop<R: RenderSink>(
    mut controller: CountdownController<R>,
    event_rx: Receiver<AppEvent>,
) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        match event_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(AppEvent::StreamLost(reason)) => bail!("log stream lost: {}", reason),
            Ok(event) => {
                if !controller.handle_event(event) {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

/// Prints one timestamped line per render, ANSI colored unless --no-color.
struct TextRenderer {
    no_color: bool,
}

impl RenderSink for TextRenderer {
    fn on_countdown(&mut self, minutes: u32, seconds: u32) {
        let time_str = Local::now().format("%H:%M:%S");
        let display = format_countdown(minutes * 60 + seconds);

        if self.no_color {
            println!("[{}] COOLDOWN {}", time_str, display);
        } else {
            println!("[{}] \x1b[33mCOOLDOWN\x1b[0m \x1b[1m{}\x1b[0m", time_str, display);
        }
    }

    fn on_ready(&mut self) {
        let time_str = Local::now().format("%H:%M:%S");

        if self.no_color {
            println!("[{}] READY    Relic power restored", time_str);
        } else {
            println!(
                "[{}] \x1b[32mREADY\x1b[0m    Relic power restored",
                time_str
            );
        }
    }
}

/// One JSON object per render, for scripting.
struct JsonRenderer;

impl RenderSink for JsonRenderer {
    fn on_countdown(&mut self, minutes: u32, seconds: u32) {
        println!(
            "{}",
            serde_json::json!({
                "event": "cooldown",
                "minutes": minutes,
                "seconds": seconds,
                "display": format_countdown(minutes * 60 + seconds),
            })
        );
    }

    fn on_ready(&mut self) {
        println!("{}", serde_json::json!({ "event": "ready" }));
    }
}
