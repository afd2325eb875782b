//! Concrete adapters: logging setup, layout caches, and link service
//! implementations.

pub mod cache;
pub mod link;
pub mod logging;
