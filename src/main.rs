use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use shellmux::{App, AppEvent, DirectoryClient, SettingsManager, init_panic_hook, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "shellmux", about = "A multi-tab terminal client for web shell gateways")]
struct Cli {
    /// Gateway base URL, e.g. http://127.0.0.1:8080 (overrides the config
    /// file)
    #[arg(long)]
    gateway: Option<String>,

    /// Log level written to shellmux.log (overridden by RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Alternate config file path
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> shellmux::Result<()> {
    let cli = Cli::parse();

    let mut settings_manager = match &cli.config {
        Some(path) => SettingsManager::load_from(path)?,
        None => SettingsManager::load()?,
    };
    if let Some(gateway) = cli.gateway {
        settings_manager.settings.gateway_url = gateway;
    }
    if let Some(level) = cli.log_level {
        settings_manager.settings.log_level = level;
    }
    let settings = settings_manager.settings.clone();

    init_tracing(&settings.log_level)?;
    init_panic_hook();

    let directory = DirectoryClient::new(&settings.gateway_url)?;

    let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(256);

    // Input pump: crossterm events plus a coarse tick for deferred layout
    // work and redraw of streaming output.
    let input_tx = event_tx.clone();
    tokio::spawn(async move {
        let mut events = crossterm::event::EventStream::new();
        let mut tick = tokio::time::interval(Duration::from_millis(50));
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if input_tx.send(AppEvent::Tick).await.is_err() {
                        break;
                    }
                }
                maybe_event = events.next() => match maybe_event {
                    Some(Ok(event)) => {
                        if input_tx.send(AppEvent::Input(event)).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!("Input stream error: {e}");
                        break;
                    }
                    None => break,
                },
            }
        }
    });

    let backend = CrosstermBackend::new(std::io::stdout());
    let terminal = Terminal::new(backend)?;
    let mut app = App::new(terminal, settings, directory, event_tx);
    app.init_terminal()?;

    app.spawn_load_features();
    app.spawn_load_connections();

    let result = app.run(&mut event_rx).await;
    drop(app); // restores the terminal
    result
}
