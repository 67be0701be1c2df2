// Handles keyboard input and background events for the TUI.
use crate::controller::{AssumeYes, Command, EditorPhase, StatusKind};
use crate::model::format_date;
use crate::tui::action::{Action, AppEvent};
use crate::tui::state::{AppState, Focus, InputMode};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub const MSG_BAD_DATE: &str = "Invalid date, use YYYY-MM-DD";

pub fn handle_app_event(state: &mut AppState, event: AppEvent) -> Vec<Command> {
    match event {
        AppEvent::Response(response) => {
            let draft_before = state.client.state().draft_content.clone();
            let cmds = state.client.apply(response);
            if state.client.state().draft_content != draft_before {
                state.cursor_to_end();
            }
            state.sync_from_client();
            cmds
        }
        AppEvent::StatusExpired(generation) => {
            state.client.expire_status(generation);
            Vec::new()
        }
    }
}

/// Quit right away, or ask first when the draft has not been saved.
fn request_quit(state: &mut AppState) -> Option<Action> {
    if state.client.has_unsaved_changes() {
        state.mode = InputMode::ConfirmQuit;
        None
    } else {
        Some(Action::Quit)
    }
}

fn change_date(state: &mut AppState, days: i64) -> Option<Action> {
    let date = state.shifted_date(days)?;
    state.date_input = format_date(date);
    let cmds = state.client.select_date(date);
    state.cursor_position = 0;
    Some(Action::Dispatch(cmds))
}

pub fn handle_key_event(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    // --- DISCONNECTED VIEW ---
    if !state.client.is_connected() {
        return match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') if !state.client.is_probing() => {
                Some(Action::Dispatch(state.client.retry_connection()))
            }
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            _ => None,
        };
    }

    // --- CONFIRMATIONS ---
    match state.mode {
        InputMode::ConfirmDelete(date) => {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    state.mode = InputMode::Normal;
                    Some(Action::Dispatch(
                        state.client.delete_entry(date, &mut AssumeYes),
                    ))
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    state.mode = InputMode::Normal;
                    None
                }
                _ => None,
            };
        }
        InputMode::ConfirmQuit => {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::Quit),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    state.mode = InputMode::Normal;
                    None
                }
                _ => None,
            };
        }
        InputMode::Normal => {}
    }

    // --- GLOBAL ---
    match key.code {
        KeyCode::Char('s') if ctrl => return Some(Action::Dispatch(state.client.save_entry())),
        KeyCode::Char('n') if ctrl => {
            let cmds = state.client.start_new_entry();
            state.cursor_position = 0;
            state.focus = Focus::Editor;
            state.sync_from_client();
            return Some(Action::Dispatch(cmds));
        }
        KeyCode::Tab => {
            state.toggle_focus();
            state.sync_from_client();
            return None;
        }
        KeyCode::Esc => return request_quit(state),
        _ => {}
    }

    match state.focus {
        Focus::Date => match key.code {
            KeyCode::Char('[') | KeyCode::Up => change_date(state, -1),
            KeyCode::Char(']') | KeyCode::Down => change_date(state, 1),
            KeyCode::Char(c) => {
                state.date_enter_char(c);
                None
            }
            KeyCode::Backspace => {
                state.date_delete_char();
                None
            }
            KeyCode::Enter => {
                let cmds = match state.committed_date() {
                    Some(Some(date)) => {
                        state.cursor_position = 0;
                        state.focus = Focus::Editor;
                        state.client.select_date(date)
                    }
                    Some(None) => {
                        state.cursor_position = 0;
                        state.client.clear_selection()
                    }
                    None => state.client.show_status(MSG_BAD_DATE, StatusKind::Error),
                };
                Some(Action::Dispatch(cmds))
            }
            _ => None,
        },
        Focus::Editor => {
            // The lookup answer would overwrite anything typed now.
            if state.client.phase() == EditorPhase::Loading {
                return None;
            }
            match key.code {
                KeyCode::Char(c) => state.enter_char(c),
                KeyCode::Enter => state.enter_char('\n'),
                KeyCode::Backspace => state.delete_char(),
                KeyCode::Left => state.move_cursor_left(),
                KeyCode::Right => state.move_cursor_right(),
                KeyCode::End => state.cursor_to_end(),
                KeyCode::Home => state.cursor_position = 0,
                _ => {}
            }
            None
        }
        Focus::Entries => match key.code {
            KeyCode::Char('q') => request_quit(state),
            KeyCode::Char('j') | KeyCode::Down => {
                state.next();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                state.previous();
                None
            }
            KeyCode::Char('[') => change_date(state, -1),
            KeyCode::Char(']') => change_date(state, 1),
            KeyCode::Char('r') => Some(Action::Dispatch(state.client.load_all_entries())),
            KeyCode::Enter => {
                if let Some(entry) = state.get_selected_entry().cloned() {
                    state.client.pick_existing_entry(&entry);
                    state.focus = Focus::Editor;
                    state.cursor_to_end();
                    state.sync_from_client();
                }
                None
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(date) = state.get_selected_entry().map(|e| e.date) {
                    state.mode = InputMode::ConfirmDelete(date);
                }
                None
            }
            _ => None,
        },
    }
}
