use serde::{Deserialize, Serialize};

/// Stable identifier for one peripheral, used to key cached layouts
pub type DeviceKey = String;

/// Radio state reported by the link service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    PoweredOn,
    PoweredOff,
    Unknown,
}

/// Connection-lifecycle and data events emitted by a link service.
/// Delivered serially, in transport order, for one peripheral.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    StateChanged(AdapterState),
    Connected,
    Disconnected,
    /// A notification arrived; the payload may be absent
    DataReceived(Option<Vec<u8>>),
    ScanTimeout,
}

/// Everything the session's event loop can be asked to process: link
/// callbacks and user input, serialized onto one execution context.
#[derive(Debug, Clone)]
pub enum AppEvent {
    Link(LinkEvent),
    /// User pressed the on-screen button with this id
    ButtonPressed(u8),
    StartEditing,
    StopEditing { save: bool },
    Pause,
    Resume,
}

/// Connection status as tracked by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}
