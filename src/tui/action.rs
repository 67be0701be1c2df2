// Defines actions and events for TUI interaction and state updates.
use crate::controller::{Command, Response};

#[derive(Debug)]
pub enum Action {
    /// Hand these controller commands to the runtime.
    Dispatch(Vec<Command>),
    Quit,
}

#[derive(Debug)]
pub enum AppEvent {
    Response(Response),
    StatusExpired(u64),
}
