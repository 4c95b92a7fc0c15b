//! Web UI for BLIGHTCHECK
//!
//! Serves the classifier page (drag-and-drop or file picker, Analyze and New
//! Image actions, result card) and a small JSON API over the same session.

mod handlers;
mod server;
mod state;

pub use server::start_server;
