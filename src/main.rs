mod domain;
mod infrastructure;
mod presentation;

use domain::layout::Button;
use domain::models::AppEvent;
use domain::session::SessionController;
use domain::settings::SettingsService;
use infrastructure::cache::FileLayoutCache;
use infrastructure::link::{EmulatorConfig, PeripheralEmulator};
use infrastructure::logging;
use presentation::ConsolePresenter;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Layout served by the built-in emulated peripheral when no real
/// transport is wired up.
fn demo_buttons() -> Vec<Button> {
    let labels = ["Power", "Mode", "Brighter", "Dimmer"];
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| Button {
            id: i as u8,
            x: 10,
            y: 10 + 60 * i as u8,
            width: 235,
            height: 50,
            border: true,
            label: label.to_string(),
            image: None,
            active: false,
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut settings = SettingsService::new()?;
    let _logging_guard = logging::init_logger(&settings.get().log_settings)?;
    info!("Starting toe-remote");

    let device_key = settings
        .get()
        .last_connected_key
        .clone()
        .unwrap_or_else(|| "toe-device-demo".to_string());
    settings.add_known_device(device_key.clone())?;
    settings.set_last_connected(device_key.clone())?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();

    let (link, mut presses) = PeripheralEmulator::spawn(
        EmulatorConfig::new(device_key.clone(), demo_buttons()),
        event_tx,
    );
    let cache = Arc::new(FileLayoutCache::open()?);

    let mut session = SessionController::new(device_key, Arc::new(link), cache);
    session.attach_presenter(Box::new(ConsolePresenter::new()));

    // Single serialized context: every link callback and user input event
    // funnels through this loop, so session state is never touched
    // concurrently.
    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => session.handle_event(event),
            Some(id) = presses.recv() => info!(id, "Peripheral acknowledged press"),
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
