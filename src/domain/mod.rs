//! Core session and layout logic, independent of any concrete transport
//! or rendering stack.

pub mod decoder;
pub mod layout;
pub mod models;
pub mod protocol;
pub mod session;
pub mod settings;
