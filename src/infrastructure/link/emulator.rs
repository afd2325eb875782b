//! In-process peripheral emulator
//!
//! Implements [`LinkService`] against an emulated toe-device running on a
//! tokio task, mirroring the firmware's command loop: a 2-byte command
//! stream in, the framed layout response out. The response is split into
//! notification-sized fragments so the decoder sees the same chunking a
//! real link produces.

use crate::domain::layout::Button;
use crate::domain::models::{AdapterState, AppEvent, DeviceKey, LinkEvent};
use crate::domain::protocol::encode_button_record;
use crate::domain::session::LinkService;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Default fragment size for layout notifications, roughly one BLE
/// notification payload
pub const DEFAULT_CHUNK_LEN: usize = 20;

#[derive(Debug, Clone)]
pub struct EmulatorConfig {
    pub device_key: DeviceKey,
    /// Layout the emulated peripheral serves
    pub buttons: Vec<Button>,
    /// Fragment size for the layout response stream
    pub chunk_len: usize,
}

impl EmulatorConfig {
    pub fn new(device_key: DeviceKey, buttons: Vec<Button>) -> Self {
        Self {
            device_key,
            buttons,
            chunk_len: DEFAULT_CHUNK_LEN,
        }
    }
}

#[derive(Debug)]
enum EmulatorRequest {
    Connect,
    Disconnect,
    Write(Vec<u8>),
    EnableNotifications(bool),
}

/// Handle through which the session drives the emulated peripheral
pub struct PeripheralEmulator {
    requests: mpsc::UnboundedSender<EmulatorRequest>,
}

impl PeripheralEmulator {
    /// Spawn the peripheral task. Link events are delivered through
    /// `events`; button presses received by the peripheral are echoed on
    /// the returned channel (tests assert on it, `main` just logs).
    pub fn spawn(
        config: EmulatorConfig,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> (Self, mpsc::UnboundedReceiver<u8>) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (press_tx, press_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_peripheral(config, request_rx, events, press_tx));
        (Self { requests: request_tx }, press_rx)
    }

    fn send(&self, request: EmulatorRequest) {
        // The task only exits at shutdown; a closed channel is not an error
        let _ = self.requests.send(request);
    }
}

impl LinkService for PeripheralEmulator {
    fn connect(&self, _peripheral: &DeviceKey) {
        self.send(EmulatorRequest::Connect);
    }

    fn disconnect(&self, _peripheral: &DeviceKey) {
        self.send(EmulatorRequest::Disconnect);
    }

    fn write(&self, bytes: &[u8]) {
        self.send(EmulatorRequest::Write(bytes.to_vec()));
    }

    fn enable_notifications(&self, enable: bool) {
        self.send(EmulatorRequest::EnableNotifications(enable));
    }
}

async fn run_peripheral(
    config: EmulatorConfig,
    mut requests: mpsc::UnboundedReceiver<EmulatorRequest>,
    events: mpsc::UnboundedSender<AppEvent>,
    presses: mpsc::UnboundedSender<u8>,
) {
    let send_event = |event: LinkEvent| {
        let _ = events.send(AppEvent::Link(event));
    };

    // The radio is ready as soon as the peripheral exists
    send_event(LinkEvent::StateChanged(AdapterState::PoweredOn));

    let mut connected = false;
    let mut notifications = false;

    while let Some(request) = requests.recv().await {
        match request {
            EmulatorRequest::Connect => {
                connected = true;
                debug!(device = %config.device_key, "Emulated peripheral connected");
                send_event(LinkEvent::Connected);
            }
            EmulatorRequest::Disconnect => {
                connected = false;
                notifications = false;
                debug!(device = %config.device_key, "Emulated peripheral disconnected");
                send_event(LinkEvent::Disconnected);
            }
            EmulatorRequest::EnableNotifications(enable) => {
                notifications = enable;
            }
            EmulatorRequest::Write(bytes) => {
                if !connected {
                    warn!("Write while disconnected, dropping");
                    continue;
                }
                handle_commands(&config, &bytes, notifications, &send_event, &presses);
            }
        }
    }
}

/// Process a command write the way the firmware does: consume whole 2-byte
/// commands, ignore a trailing odd byte.
fn handle_commands(
    config: &EmulatorConfig,
    bytes: &[u8],
    notifications: bool,
    send_event: &impl Fn(LinkEvent),
    presses: &mpsc::UnboundedSender<u8>,
) {
    for command in bytes.chunks_exact(2) {
        match command[0] {
            0x00 => {
                if !notifications {
                    warn!("Layout requested before notifications were enabled");
                    continue;
                }
                send_layout(config, send_event);
            }
            0x01 => {
                info!(id = command[1], "Peripheral received button press");
                let _ = presses.send(command[1]);
            }
            opcode => {
                warn!(opcode, "Unknown command opcode");
            }
        }
    }
}

fn send_layout(config: &EmulatorConfig, send_event: &impl Fn(LinkEvent)) {
    let mut stream = vec![config.buttons.len() as u8];
    for button in &config.buttons {
        stream.extend_from_slice(&encode_button_record(button));
    }

    debug!(
        buttons = config.buttons.len(),
        bytes = stream.len(),
        chunk_len = config.chunk_len,
        "Streaming layout"
    );
    for chunk in stream.chunks(config.chunk_len.max(1)) {
        send_event(LinkEvent::DataReceived(Some(chunk.to_vec())));
    }
}
