mod app;
mod command;
mod console;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use tokio::{
    io::{stdin, AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing_subscriber::{prelude::*, EnvFilter};
use tycoon_core::{
    config::{self, AppConfig},
    save::SaveManager,
    session::GameSession,
    transfer::{ListenerSettings, TransferEvent, TransferListener, TransferSender},
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    if let Err(err) = config::ensure_default_config() {
        tracing::warn!("Unable to write default config: {err:#}");
    }
    let config = AppConfig::load()?;

    let saves = SaveManager::new(&config.save_path);
    let mut input = BufReader::new(stdin()).lines();
    let session = app::open_session(saves, &mut input).await?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    start_listener(&config, session.clone(), event_tx).await;

    let sender = TransferSender::from_config(session.clone(), &config);
    let app = app::TycoonApp::new(session, sender, event_rx, input, config.wait_duration());
    app.run().await
}

async fn start_listener(
    config: &AppConfig,
    session: GameSession,
    events: mpsc::UnboundedSender<TransferEvent>,
) {
    let settings = ListenerSettings::from(config);
    match TransferListener::bind(config.listen_addr(), session, settings).await {
        Ok(listener) => {
            console::info(format!(
                "Listening for incoming transfers on port {}...",
                config.transfer_port
            ));
            tokio::spawn(async move {
                if let Err(err) = listener.run(events).await {
                    tracing::error!("Transfer listener error: {err:#}");
                }
            });
        }
        Err(err) => {
            tracing::warn!("Transfer listener unavailable: {err:#}");
            console::warning(format!("Inbound transfers disabled: {err:#}"));
        }
    }
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("tycoon.log");

    let env_filter = EnvFilter::from_default_env();

    // stdout belongs to the command prompt.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
