//! Presentation layer
//!
//! Implementations of the [`Presenter`](crate::domain::session::Presenter)
//! port. Rendering is deliberately thin; the session never depends on a
//! concrete presenter.

pub mod console;

pub use console::ConsolePresenter;
