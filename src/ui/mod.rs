//! Terminal presentation layer
//!
//! Raw mode and alternate screen handling, the key → semantic-event
//! mapping, the render pass, and the `tokio::select!` event loop that
//! drives the session.

pub mod app;
pub mod keys;
pub mod render;

pub use app::App;
