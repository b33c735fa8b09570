//! Panel relay: bridges a side panel to a chat feed and a race game feed.

pub mod badge;
pub mod config;
pub mod console;
pub mod host;
pub mod panel;
pub mod relay;
pub mod routes;
pub mod socket;
pub mod state;
