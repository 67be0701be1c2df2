// Crate root library declaration and module exports.
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod controller;
pub mod model;
pub mod network;

#[cfg(feature = "tui")]
pub mod tui;
