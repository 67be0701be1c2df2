// File: ./src/tui/mod.rs
// Entry point and main loop for the TUI application.
pub mod action;
pub mod handlers;
pub mod network;
pub mod state;
pub mod view;

use crate::client::EntryStore;
use crate::context::SharedContext;
use crate::controller::{Command, JournalClient, Request};
use crate::tui::action::{Action, AppEvent};
use crate::tui::network::StatusTimer;
use crate::tui::state::AppState;
use crate::tui::view::draw;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, MouseEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{io, sync::Arc, time::Duration};
use tokio::sync::mpsc::{self, Sender, UnboundedSender};

/// Hands controller commands to the background tasks. Requests are never
/// dropped while the actor runs; the controller waits on every one it sent.
fn dispatch(
    commands: Vec<Command>,
    request_tx: &UnboundedSender<Request>,
    event_tx: &Sender<AppEvent>,
    timer: &mut StatusTimer,
) {
    for cmd in commands {
        match cmd {
            Command::Send(request) => {
                if let Err(e) = request_tx.send(request) {
                    log::error!("Network actor is gone, dropping {:?}", e.0);
                }
            }
            Command::ExpireStatus { generation, after } => {
                timer.schedule(generation, after, event_tx.clone());
            }
        }
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

pub async fn run<S: EntryStore>(
    ctx: SharedContext,
    store: S,
    api_url: String,
    status_ttl: Duration,
) -> Result<()> {
    // Panic Hook
    let panic_log = ctx.get_panic_log_path();
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        use std::io::Write;
        restore_terminal();
        if let Some(path) = &panic_log
            && let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
        {
            let _ = writeln!(file, "PANIC: {:?}", info);
        }
        default_hook(info);
    }));

    // --- TERMINAL SETUP ---
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // --- STATE INIT ---
    let mut app_state = AppState::new(JournalClient::with_status_ttl(status_ttl), api_url);
    let mut timer = StatusTimer::default();

    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::channel(32);

    // --- NETWORK ACTOR ---
    tokio::spawn(network::run_network_actor(
        Arc::new(store),
        request_rx,
        event_tx.clone(),
    ));

    let startup = app_state.client.start();
    dispatch(startup, &request_tx, &event_tx, &mut timer);

    // --- UI LOOP ---
    let mut ui_loop = || -> Result<()> {
        loop {
            terminal.draw(|f| draw(f, &mut app_state))?;

            // A. Background Events
            while let Ok(event) = event_rx.try_recv() {
                let cmds = handlers::handle_app_event(&mut app_state, event);
                dispatch(cmds, &request_tx, &event_tx, &mut timer);
            }

            // B. Input Events
            if crossterm::event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Mouse(mouse) => match mouse.kind {
                        MouseEventKind::ScrollDown => app_state.next(),
                        MouseEventKind::ScrollUp => app_state.previous(),
                        _ => {}
                    },
                    Event::Key(key) => {
                        // Filter out KeyRelease events to prevent double input on Windows
                        if key.kind == event::KeyEventKind::Release {
                            continue;
                        }
                        match handlers::handle_key_event(key, &mut app_state) {
                            Some(Action::Quit) => break,
                            Some(Action::Dispatch(cmds)) => {
                                dispatch(cmds, &request_tx, &event_tx, &mut timer)
                            }
                            None => {}
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    };
    let result = ui_loop();

    // --- CLEANUP ---
    app_state.client.shutdown();
    timer.cancel();
    drop(request_tx);
    event_rx.close();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    log::info!("Session closed");
    result
}
