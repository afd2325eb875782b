//! Link service implementations
//!
//! The session consumes the abstract [`LinkService`] port; this module
//! provides concrete transports. Currently that is the in-process
//! peripheral emulator, which speaks the real wire protocol end to end.
//! A native GATT transport plugs in behind the same trait (service and
//! characteristic UUIDs live in [`crate::domain::protocol`]).

pub mod emulator;

pub use crate::domain::session::LinkService;
pub use emulator::{EmulatorConfig, PeripheralEmulator};
