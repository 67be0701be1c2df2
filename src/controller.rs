//! Client-side synchronization between the editor, the date selector and
//! the remote entry collection.
//!
//! `JournalClient` never performs IO itself. Every action mutates the
//! in-memory [`ClientState`] and returns the [`Command`]s the runtime must
//! carry out: requests to send to an `EntryStore`, and status expiries to
//! schedule. Results come back through [`JournalClient::apply`], which
//! discards responses that are no longer relevant (a newer lookup or list
//! load was issued, or the client was shut down).
use crate::client::StoreError;
use crate::model::{EntryPayload, JournalEntry, display_date, today};
use chrono::NaiveDate;
use std::time::Duration;
use strum::Display;

/// How long a status message stays visible.
pub const STATUS_TTL: Duration = Duration::from_secs(3);

pub const MSG_VALIDATION: &str = "Please pick a date and write something";
pub const MSG_CONNECTION: &str = "Connection error";
pub const MSG_LIST_FAILED: &str = "Could not load entries";
pub const MSG_LIST_CONNECTION: &str = "Connection error while loading entries";
pub const MSG_SAVE_FAILED: &str = "Could not save entry";
pub const MSG_DELETE_FAILED: &str = "Could not delete entry";
pub const MSG_SAVED: &str = "Entry saved";
pub const MSG_UPDATED: &str = "Entry updated";
pub const MSG_DELETED: &str = "Entry deleted";
pub const MSG_STILL_LOADING: &str = "Still loading this date, try again in a moment";

/// Identifies one dispatched request. Tokens only ever increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SaveMode {
    Create,
    Update,
}

/// A call the runtime must make against the entry store.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Health {
        token: RequestToken,
    },
    ListEntries {
        token: RequestToken,
    },
    Lookup {
        token: RequestToken,
        date: NaiveDate,
    },
    Save {
        token: RequestToken,
        mode: SaveMode,
        payload: EntryPayload,
    },
    Delete {
        token: RequestToken,
        date: NaiveDate,
    },
}

/// The outcome of a `Request`, fed back through `JournalClient::apply`.
#[derive(Debug, Clone)]
pub enum Response {
    Health {
        token: RequestToken,
        result: Result<(), StoreError>,
    },
    Entries {
        token: RequestToken,
        result: Result<Vec<JournalEntry>, StoreError>,
    },
    Lookup {
        token: RequestToken,
        date: NaiveDate,
        result: Result<JournalEntry, StoreError>,
    },
    Saved {
        token: RequestToken,
        mode: SaveMode,
        date: NaiveDate,
        result: Result<(), StoreError>,
    },
    Deleted {
        token: RequestToken,
        date: NaiveDate,
        result: Result<(), StoreError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(Request),
    /// Call `expire_status(generation)` once `after` has elapsed. A newer
    /// schedule supersedes any pending one.
    ExpireStatus { generation: u64, after: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StatusKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    pub generation: u64,
}

/// Where the editor stands for the selected date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EditorPhase {
    /// No date chosen.
    Empty,
    Loading,
    /// Date chosen, the server has no entry for it.
    Creating,
    /// Date chosen, the server entry is loaded.
    Editing,
    Saving,
}

/// Yes/no prompt used before destructive actions.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Answers every prompt with yes (`--yes`, or a dialog already accepted).
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _message: &str) -> bool {
        true
    }
}

/// Everything the UI renders. Held in memory only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    pub connected: bool,
    pub selected_date: Option<NaiveDate>,
    pub draft_content: String,
    pub is_editing: bool,
    /// In server response order.
    pub entries: Vec<JournalEntry>,
    pub status: Option<StatusMessage>,
    pub saving: bool,
}

#[derive(Debug)]
pub struct JournalClient {
    state: ClientState,
    next_token: u64,
    health_token: Option<RequestToken>,
    list_token: Option<RequestToken>,
    lookup_token: Option<RequestToken>,
    save_token: Option<RequestToken>,
    /// Content the server last confirmed for the selected date.
    baseline: String,
    /// Trimmed content of the save in flight.
    pending_save: Option<String>,
    startup_pending: bool,
    status_generation: u64,
    status_ttl: Duration,
    closed: bool,
    outbox: Vec<Command>,
}

impl Default for JournalClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JournalClient {
    pub fn new() -> Self {
        Self::with_status_ttl(STATUS_TTL)
    }

    pub fn with_status_ttl(status_ttl: Duration) -> Self {
        Self {
            state: ClientState::default(),
            next_token: 0,
            health_token: None,
            list_token: None,
            lookup_token: None,
            save_token: None,
            baseline: String::new(),
            pending_save: None,
            startup_pending: false,
            status_generation: 0,
            status_ttl,
            closed: false,
            outbox: Vec::new(),
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    /// A health check is in flight.
    pub fn is_probing(&self) -> bool {
        self.health_token.is_some()
    }

    pub fn phase(&self) -> EditorPhase {
        if self.state.saving {
            EditorPhase::Saving
        } else if self.state.selected_date.is_none() {
            EditorPhase::Empty
        } else if self.lookup_token.is_some() {
            EditorPhase::Loading
        } else if self.state.is_editing {
            EditorPhase::Editing
        } else {
            EditorPhase::Creating
        }
    }

    /// Whether the save control should be enabled.
    pub fn can_save(&self) -> bool {
        !self.state.saving
            && self.lookup_token.is_none()
            && self.state.selected_date.is_some()
            && !self.state.draft_content.trim().is_empty()
    }

    /// The draft differs from what the server holds for the selected date.
    pub fn has_unsaved_changes(&self) -> bool {
        self.state.draft_content.trim() != self.baseline.trim()
    }

    // --- ACTIONS ---

    /// Probe the server; once it answers, load the entries and select today.
    pub fn start(&mut self) -> Vec<Command> {
        self.startup_pending = true;
        self.queue_health();
        self.drain()
    }

    /// Same sequence as `start`, offered from the disconnected view.
    pub fn retry_connection(&mut self) -> Vec<Command> {
        log::info!("Retrying connection");
        self.start()
    }

    /// Health check only. The result lands in `state().connected`.
    pub fn probe_connection(&mut self) -> Vec<Command> {
        self.queue_health();
        self.drain()
    }

    pub fn load_all_entries(&mut self) -> Vec<Command> {
        self.queue_list();
        self.drain()
    }

    pub fn load_entry_for_date(&mut self, date: NaiveDate) -> Vec<Command> {
        self.queue_lookup(date);
        self.drain()
    }

    /// The date picker changed: select `date` and re-derive edit mode.
    pub fn select_date(&mut self, date: NaiveDate) -> Vec<Command> {
        self.state.selected_date = Some(date);
        // Unknown until the lookup answers.
        self.state.is_editing = false;
        self.queue_lookup(date);
        self.drain()
    }

    /// The date picker was emptied.
    pub fn clear_selection(&mut self) -> Vec<Command> {
        self.state.selected_date = None;
        self.reset_editor();
        self.drain()
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state.draft_content = text.into();
    }

    /// Create or update the entry for the selected date with the trimmed draft.
    pub fn save_entry(&mut self) -> Vec<Command> {
        if self.state.saving {
            log::debug!("Save ignored: another save is in flight");
            return self.drain();
        }
        if self.lookup_token.is_some() {
            // Create vs update is not known yet.
            self.push_status(MSG_STILL_LOADING, StatusKind::Error);
            return self.drain();
        }
        let content = self.state.draft_content.trim();
        let date = match self.state.selected_date {
            Some(d) if !content.is_empty() => d,
            _ => {
                self.push_status(MSG_VALIDATION, StatusKind::Error);
                return self.drain();
            }
        };

        let mode = if self.state.is_editing {
            SaveMode::Update
        } else {
            SaveMode::Create
        };
        let payload = EntryPayload::new(date, content);
        let token = self.next_token();
        self.state.saving = true;
        self.save_token = Some(token);
        self.pending_save = Some(payload.content.clone());
        log::info!("{} entry for {}", mode, date);
        self.outbox.push(Command::Send(Request::Save {
            token,
            mode,
            payload,
        }));
        self.drain()
    }

    /// Delete the entry for `date` once `confirm` agrees.
    pub fn delete_entry(&mut self, date: NaiveDate, confirm: &mut dyn Confirm) -> Vec<Command> {
        let prompt = format!("Delete the entry for {}?", display_date(date));
        if !confirm.confirm(&prompt) {
            log::debug!("Delete of {} declined", date);
            return self.drain();
        }
        let token = self.next_token();
        log::info!("Deleting entry for {}", date);
        self.outbox
            .push(Command::Send(Request::Delete { token, date }));
        self.drain()
    }

    /// Replace the current status message and (re)start its expiry timer.
    pub fn show_status(&mut self, text: impl Into<String>, kind: StatusKind) -> Vec<Command> {
        self.push_status(text, kind);
        self.drain()
    }

    fn push_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status_generation += 1;
        let generation = self.status_generation;
        let text = text.into();
        match kind {
            StatusKind::Error => log::warn!("{}", text),
            StatusKind::Success => log::info!("{}", text),
        }
        self.state.status = Some(StatusMessage {
            text,
            kind,
            generation,
        });
        self.outbox.push(Command::ExpireStatus {
            generation,
            after: self.status_ttl,
        });
    }

    /// Timer callback. Clears the status only if it is still the one that
    /// scheduled this expiry.
    pub fn expire_status(&mut self, generation: u64) {
        if self
            .state
            .status
            .as_ref()
            .is_some_and(|s| s.generation == generation)
        {
            self.state.status = None;
        }
    }

    /// Start a blank entry for today.
    pub fn start_new_entry(&mut self) -> Vec<Command> {
        let date = today();
        self.state.selected_date = Some(date);
        self.reset_editor();
        self.queue_lookup(date);
        self.drain()
    }

    /// Load a list item into the editor without asking the server.
    pub fn pick_existing_entry(&mut self, entry: &JournalEntry) {
        self.state.selected_date = Some(entry.date);
        self.state.draft_content = entry.content.clone();
        self.baseline = entry.content.clone();
        self.state.is_editing = true;
        self.lookup_token = None;
    }

    /// After this, every late response is dropped.
    pub fn shutdown(&mut self) {
        self.closed = true;
        self.outbox.clear();
    }

    // --- RESPONSES ---

    pub fn apply(&mut self, response: Response) -> Vec<Command> {
        if self.closed {
            log::debug!("Client closed, discarding {:?}", response);
            return Vec::new();
        }

        match response {
            Response::Health { token, result } => {
                if self.health_token != Some(token) {
                    log::debug!("Discarding stale health response");
                    return self.drain();
                }
                self.health_token = None;
                self.apply_health(result);
            }
            Response::Entries { token, result } => {
                if self.list_token != Some(token) {
                    log::debug!("Discarding stale entry list");
                    return self.drain();
                }
                self.list_token = None;
                match result {
                    Ok(entries) => {
                        log::debug!("Loaded {} entries", entries.len());
                        self.state.entries = entries;
                    }
                    Err(e) if e.is_connectivity() => {
                        self.push_status(MSG_LIST_CONNECTION, StatusKind::Error)
                    }
                    Err(e) => {
                        log::debug!("List failed: {}", e);
                        self.push_status(MSG_LIST_FAILED, StatusKind::Error)
                    }
                }
            }
            Response::Lookup {
                token,
                date,
                result,
            } => {
                if self.lookup_token != Some(token) {
                    log::debug!("Discarding stale lookup for {}", date);
                    return self.drain();
                }
                self.lookup_token = None;
                match result {
                    Ok(entry) => {
                        self.baseline = entry.content.clone();
                        self.state.draft_content = entry.content;
                        self.state.is_editing = true;
                    }
                    Err(e) => {
                        self.state.draft_content.clear();
                        self.baseline.clear();
                        self.state.is_editing = false;
                        if e.is_connectivity() {
                            self.push_status(MSG_CONNECTION, StatusKind::Error);
                        }
                    }
                }
            }
            Response::Saved {
                token,
                mode,
                date,
                result,
            } => {
                let saved_content = if self.save_token == Some(token) {
                    self.save_token = None;
                    self.state.saving = false;
                    self.pending_save.take()
                } else {
                    None
                };
                match result {
                    Ok(()) => {
                        let text = match mode {
                            SaveMode::Update => MSG_UPDATED,
                            SaveMode::Create => MSG_SAVED,
                        };
                        self.push_status(text, StatusKind::Success);
                        self.queue_list();
                        if self.state.selected_date == Some(date) {
                            self.state.is_editing = true;
                            self.lookup_token = None;
                            if let Some(content) = saved_content {
                                self.baseline = content;
                            }
                        }
                    }
                    Err(e) => self.show_failure(&e, MSG_SAVE_FAILED),
                }
            }
            Response::Deleted { date, result, .. } => match result {
                Ok(()) => {
                    self.push_status(MSG_DELETED, StatusKind::Success);
                    self.queue_list();
                    if self.state.selected_date == Some(date) {
                        self.reset_editor();
                    }
                }
                Err(e) => self.show_failure(&e, MSG_DELETE_FAILED),
            },
        }
        self.drain()
    }

    fn apply_health(&mut self, result: Result<(), StoreError>) {
        match result {
            Ok(()) => {
                self.state.connected = true;
                if self.startup_pending {
                    self.startup_pending = false;
                    self.queue_list();
                    let date = today();
                    self.state.selected_date = Some(date);
                    self.queue_lookup(date);
                }
            }
            Err(e) => {
                log::warn!("Health check failed: {}", e);
                self.state.connected = false;
                self.startup_pending = false;
            }
        }
    }

    // --- HELPERS ---

    fn show_failure(&mut self, error: &StoreError, fallback: &str) {
        let text = match error.server_message() {
            Some(msg) => msg.to_string(),
            None if error.is_connectivity() => MSG_CONNECTION.to_string(),
            None => fallback.to_string(),
        };
        self.push_status(text, StatusKind::Error);
    }

    fn reset_editor(&mut self) {
        self.state.draft_content.clear();
        self.baseline.clear();
        self.state.is_editing = false;
        self.lookup_token = None;
    }

    fn next_token(&mut self) -> RequestToken {
        self.next_token += 1;
        RequestToken(self.next_token)
    }

    fn queue_health(&mut self) {
        let token = self.next_token();
        self.health_token = Some(token);
        self.outbox.push(Command::Send(Request::Health { token }));
    }

    fn queue_list(&mut self) {
        let token = self.next_token();
        self.list_token = Some(token);
        self.outbox
            .push(Command::Send(Request::ListEntries { token }));
    }

    fn queue_lookup(&mut self, date: NaiveDate) {
        let token = self.next_token();
        self.lookup_token = Some(token);
        self.outbox
            .push(Command::Send(Request::Lookup { token, date }));
    }

    fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_date;
    use http::StatusCode;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn requests(cmds: &[Command]) -> Vec<&Request> {
        cmds.iter()
            .filter_map(|c| match c {
                Command::Send(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    fn lookup_token(cmds: &[Command]) -> RequestToken {
        requests(cmds)
            .into_iter()
            .find_map(|r| match r {
                Request::Lookup { token, .. } => Some(*token),
                _ => None,
            })
            .expect("expected a lookup request")
    }

    #[test]
    fn test_initial_phase_is_empty() {
        let client = JournalClient::new();
        assert_eq!(client.phase(), EditorPhase::Empty);
        assert!(!client.can_save());
        assert!(!client.is_connected());
    }

    #[test]
    fn test_blank_draft_is_rejected_locally() {
        let mut client = JournalClient::new();
        client.pick_existing_entry(&JournalEntry::new(1, d("2024-01-15"), "x"));
        client.set_draft("   \n\t");
        let cmds = client.save_entry();
        assert!(requests(&cmds).is_empty());
        let status = client.state().status.clone().unwrap();
        assert_eq!(status.text, MSG_VALIDATION);
        assert_eq!(status.kind, StatusKind::Error);
        assert!(matches!(cmds[0], Command::ExpireStatus { after, .. } if after == STATUS_TTL));
    }

    #[test]
    fn test_missing_date_is_rejected_locally() {
        let mut client = JournalClient::new();
        client.set_draft("Hello");
        let cmds = client.save_entry();
        assert!(requests(&cmds).is_empty());
        assert_eq!(client.state().status.as_ref().unwrap().text, MSG_VALIDATION);
    }

    #[test]
    fn test_save_mode_follows_edit_flag() {
        let mut client = JournalClient::new();
        let date = d("2024-01-15");
        let t = lookup_token(&client.select_date(date));
        client.apply(Response::Lookup {
            token: t,
            date,
            result: Err(StoreError::NotFound),
        });
        assert_eq!(client.phase(), EditorPhase::Creating);

        client.set_draft("  Hello  ");
        let cmds = client.save_entry();
        match requests(&cmds)[..] {
            [Request::Save { mode, payload, .. }] => {
                assert_eq!(*mode, SaveMode::Create);
                assert_eq!(payload.content, "Hello");
                assert_eq!(payload.date, date);
            }
            _ => panic!("expected one save request, got {:?}", cmds),
        }
        assert_eq!(client.phase(), EditorPhase::Saving);
        assert!(!client.can_save());
    }

    #[test]
    fn test_save_waits_for_pending_lookup() {
        let mut client = JournalClient::new();
        client.pick_existing_entry(&JournalEntry::new(1, d("2024-01-15"), "old"));
        assert!(client.state().is_editing);

        let date = d("2024-01-16");
        let t = lookup_token(&client.select_date(date));
        assert_eq!(client.phase(), EditorPhase::Loading);
        assert!(!client.state().is_editing);

        client.set_draft("typed early");
        assert!(!client.can_save());
        let cmds = client.save_entry();
        assert!(requests(&cmds).is_empty());
        assert!(!client.state().saving);
        assert_eq!(client.state().status.as_ref().unwrap().text, MSG_STILL_LOADING);

        client.apply(Response::Lookup {
            token: t,
            date,
            result: Err(StoreError::NotFound),
        });
        client.set_draft("typed later");
        assert!(client.can_save());
        match requests(&client.save_entry())[..] {
            [Request::Save { mode, .. }] => assert_eq!(*mode, SaveMode::Create),
            ref other => panic!("expected one save request, got {:?}", other),
        }
    }

    #[test]
    fn test_unsaved_changes_track_server_content() {
        let mut client = JournalClient::new();
        assert!(!client.has_unsaved_changes());
        client.pick_existing_entry(&JournalEntry::new(1, d("2024-01-15"), "kept"));
        assert!(!client.has_unsaved_changes());

        client.set_draft("kept and more ");
        assert!(client.has_unsaved_changes());
        let cmds = client.save_entry();
        let token = match requests(&cmds)[0] {
            Request::Save { token, .. } => *token,
            _ => unreachable!(),
        };
        client.apply(Response::Saved {
            token,
            mode: SaveMode::Update,
            date: d("2024-01-15"),
            result: Ok(()),
        });
        assert!(!client.has_unsaved_changes());

        client.set_draft("");
        assert!(client.has_unsaved_changes());
        let _ = client.start_new_entry();
        assert!(!client.has_unsaved_changes());
    }

    #[test]
    fn test_second_save_while_in_flight_is_ignored() {
        let mut client = JournalClient::new();
        client.pick_existing_entry(&JournalEntry::new(1, d("2024-01-15"), "x"));
        assert_eq!(requests(&client.save_entry()).len(), 1);
        assert!(client.save_entry().is_empty());
    }

    #[test]
    fn test_save_success_forces_edit_mode_and_refreshes() {
        let mut client = JournalClient::new();
        let date = d("2024-01-15");
        let t = lookup_token(&client.select_date(date));
        client.apply(Response::Lookup {
            token: t,
            date,
            result: Err(StoreError::NotFound),
        });
        client.set_draft("Hello");
        let cmds = client.save_entry();
        let token = match requests(&cmds)[0] {
            Request::Save { token, .. } => *token,
            _ => unreachable!(),
        };

        let after = client.apply(Response::Saved {
            token,
            mode: SaveMode::Create,
            date,
            result: Ok(()),
        });
        assert!(matches!(requests(&after)[..], [Request::ListEntries { .. }]));
        assert!(client.state().is_editing);
        assert!(!client.state().saving);
        assert_eq!(client.state().status.as_ref().unwrap().text, MSG_SAVED);
    }

    #[test]
    fn test_save_failure_prefers_server_text() {
        let mut client = JournalClient::new();
        client.pick_existing_entry(&JournalEntry::new(1, d("2024-01-15"), "x"));
        let cmds = client.save_entry();
        let token = match requests(&cmds)[0] {
            Request::Save { token, .. } => *token,
            _ => unreachable!(),
        };
        let after = client.apply(Response::Saved {
            token,
            mode: SaveMode::Update,
            date: d("2024-01-15"),
            result: Err(StoreError::Remote {
                status: StatusCode::BAD_REQUEST,
                message: Some("Content is required".to_string()),
            }),
        });
        assert!(requests(&after).is_empty());
        assert_eq!(
            client.state().status.as_ref().unwrap().text,
            "Content is required"
        );
        assert!(!client.state().saving);
        assert_eq!(client.state().draft_content, "x");
    }

    #[test]
    fn test_save_failure_generic_and_connection_texts() {
        let mut client = JournalClient::new();
        client.show_failure(
            &StoreError::Remote {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: None,
            },
            MSG_SAVE_FAILED,
        );
        assert_eq!(client.state().status.as_ref().unwrap().text, MSG_SAVE_FAILED);
        client.show_failure(&StoreError::Connectivity("refused".into()), MSG_SAVE_FAILED);
        assert_eq!(client.state().status.as_ref().unwrap().text, MSG_CONNECTION);
    }

    #[test]
    fn test_stale_lookup_is_discarded() {
        let mut client = JournalClient::new();
        let first = d("2024-01-01");
        let second = d("2024-01-02");
        let t1 = lookup_token(&client.select_date(first));
        let t2 = lookup_token(&client.select_date(second));

        // Second answers first, then the slow first lookup arrives.
        client.apply(Response::Lookup {
            token: t2,
            date: second,
            result: Ok(JournalEntry::new(2, second, "second")),
        });
        client.apply(Response::Lookup {
            token: t1,
            date: first,
            result: Ok(JournalEntry::new(1, first, "first")),
        });

        assert_eq!(client.state().selected_date, Some(second));
        assert_eq!(client.state().draft_content, "second");
        assert_eq!(client.phase(), EditorPhase::Editing);
    }

    #[test]
    fn test_lookup_not_found_is_silent() {
        let mut client = JournalClient::new();
        client.set_draft("leftover");
        let date = d("2024-05-05");
        let t = lookup_token(&client.select_date(date));
        assert_eq!(client.phase(), EditorPhase::Loading);
        let cmds = client.apply(Response::Lookup {
            token: t,
            date,
            result: Err(StoreError::Remote {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: None,
            }),
        });
        assert!(cmds.is_empty());
        assert!(client.state().status.is_none());
        assert_eq!(client.state().draft_content, "");
        assert_eq!(client.phase(), EditorPhase::Creating);
    }

    #[test]
    fn test_lookup_connection_error_clears_and_reports() {
        let mut client = JournalClient::new();
        let date = d("2024-05-05");
        let t = lookup_token(&client.select_date(date));
        client.apply(Response::Lookup {
            token: t,
            date,
            result: Err(StoreError::Connectivity("reset".into())),
        });
        assert!(!client.state().is_editing);
        assert_eq!(client.state().status.as_ref().unwrap().text, MSG_CONNECTION);
    }

    #[test]
    fn test_pick_existing_entry_is_optimistic() {
        let mut client = JournalClient::new();
        let t = lookup_token(&client.select_date(d("2024-01-01")));
        let entry = JournalEntry::new(9, d("2024-02-02"), "picked");
        client.pick_existing_entry(&entry);
        assert_eq!(client.phase(), EditorPhase::Editing);

        // The lookup issued before the pick must not overwrite it.
        client.apply(Response::Lookup {
            token: t,
            date: d("2024-01-01"),
            result: Err(StoreError::NotFound),
        });
        assert_eq!(client.state().draft_content, "picked");
        assert!(client.state().is_editing);
    }

    #[test]
    fn test_status_expiry_respects_generation() {
        let mut client = JournalClient::new();
        client.show_status("first", StatusKind::Success);
        let first_gen = client.state().status.as_ref().unwrap().generation;
        client.show_status("second", StatusKind::Error);

        client.expire_status(first_gen);
        assert_eq!(client.state().status.as_ref().unwrap().text, "second");

        let second_gen = client.state().status.as_ref().unwrap().generation;
        client.expire_status(second_gen);
        assert!(client.state().status.is_none());
    }

    #[test]
    fn test_custom_status_ttl_is_scheduled() {
        let mut client = JournalClient::with_status_ttl(Duration::from_secs(7));
        let cmds = client.show_status("hi", StatusKind::Success);
        assert_eq!(
            cmds,
            vec![Command::ExpireStatus {
                generation: 1,
                after: Duration::from_secs(7)
            }]
        );
    }

    #[test]
    fn test_declined_delete_sends_nothing() {
        let mut client = JournalClient::new();
        let mut prompts = Vec::new();
        let mut deny = |msg: &str| {
            prompts.push(msg.to_string());
            false
        };
        let cmds = client.delete_entry(d("2024-01-15"), &mut deny);
        assert!(cmds.is_empty());
        assert_eq!(prompts, vec!["Delete the entry for Mon, 15 Jan 2024?"]);
    }

    #[test]
    fn test_delete_active_date_clears_editor() {
        let mut client = JournalClient::new();
        let date = d("2024-01-15");
        client.pick_existing_entry(&JournalEntry::new(1, date, "bye"));
        let cmds = client.delete_entry(date, &mut AssumeYes);
        let token = match requests(&cmds)[..] {
            [Request::Delete { token, .. }] => *token,
            _ => panic!("expected delete"),
        };
        let after = client.apply(Response::Deleted {
            token,
            date,
            result: Ok(()),
        });
        assert!(matches!(requests(&after)[..], [Request::ListEntries { .. }]));
        assert_eq!(client.state().draft_content, "");
        assert_eq!(client.phase(), EditorPhase::Creating);
        assert_eq!(client.state().status.as_ref().unwrap().text, MSG_DELETED);
    }

    #[test]
    fn test_delete_other_date_keeps_editor() {
        let mut client = JournalClient::new();
        client.pick_existing_entry(&JournalEntry::new(1, d("2024-01-15"), "keep"));
        let other = d("2024-01-10");
        let cmds = client.delete_entry(other, &mut AssumeYes);
        let token = match requests(&cmds)[0] {
            Request::Delete { token, .. } => *token,
            _ => unreachable!(),
        };
        client.apply(Response::Deleted {
            token,
            date: other,
            result: Ok(()),
        });
        assert_eq!(client.state().draft_content, "keep");
        assert!(client.state().is_editing);
    }

    #[test]
    fn test_delete_failure_leaves_state() {
        let mut client = JournalClient::new();
        let date = d("2024-01-15");
        client.pick_existing_entry(&JournalEntry::new(1, date, "keep"));
        let cmds = client.delete_entry(date, &mut AssumeYes);
        let token = match requests(&cmds)[0] {
            Request::Delete { token, .. } => *token,
            _ => unreachable!(),
        };
        let after = client.apply(Response::Deleted {
            token,
            date,
            result: Err(StoreError::Remote {
                status: StatusCode::NOT_FOUND,
                message: None,
            }),
        });
        assert!(requests(&after).is_empty());
        assert_eq!(client.state().draft_content, "keep");
        assert_eq!(
            client.state().status.as_ref().unwrap().text,
            MSG_DELETE_FAILED
        );
    }

    #[test]
    fn test_health_failure_touches_nothing_else() {
        let mut client = JournalClient::new();
        let cmds = client.start();
        let token = match requests(&cmds)[..] {
            [Request::Health { token }] => *token,
            _ => panic!("expected health probe"),
        };
        let after = client.apply(Response::Health {
            token,
            result: Err(StoreError::Connectivity("refused".into())),
        });
        assert!(after.is_empty());
        assert_eq!(client.state(), &ClientState::default());
    }

    #[test]
    fn test_startup_success_loads_list_and_today() {
        let mut client = JournalClient::new();
        let cmds = client.start();
        let token = match requests(&cmds)[0] {
            Request::Health { token } => *token,
            _ => unreachable!(),
        };
        let after = client.apply(Response::Health {
            token,
            result: Ok(()),
        });
        let reqs = requests(&after);
        assert!(matches!(reqs[0], Request::ListEntries { .. }));
        assert!(matches!(reqs[1], Request::Lookup { date, .. } if *date == today()));
        assert!(client.is_connected());
        assert_eq!(client.state().selected_date, Some(today()));
    }

    #[test]
    fn test_plain_probe_does_not_load() {
        let mut client = JournalClient::new();
        let cmds = client.probe_connection();
        let token = match requests(&cmds)[0] {
            Request::Health { token } => *token,
            _ => unreachable!(),
        };
        let after = client.apply(Response::Health {
            token,
            result: Ok(()),
        });
        assert!(after.is_empty());
        assert!(client.is_connected());
        assert_eq!(client.state().selected_date, None);
    }

    #[test]
    fn test_stale_list_is_discarded() {
        let mut client = JournalClient::new();
        let first = match requests(&client.load_all_entries())[0] {
            Request::ListEntries { token } => *token,
            _ => unreachable!(),
        };
        let second = match requests(&client.load_all_entries())[0] {
            Request::ListEntries { token } => *token,
            _ => unreachable!(),
        };
        let date = d("2024-01-01");
        client.apply(Response::Entries {
            token: second,
            result: Ok(vec![JournalEntry::new(1, date, "new")]),
        });
        client.apply(Response::Entries {
            token: first,
            result: Ok(vec![]),
        });
        assert_eq!(client.state().entries.len(), 1);
    }

    #[test]
    fn test_list_failure_keeps_stale_entries() {
        let mut client = JournalClient::new();
        let t = match requests(&client.load_all_entries())[0] {
            Request::ListEntries { token } => *token,
            _ => unreachable!(),
        };
        client.apply(Response::Entries {
            token: t,
            result: Ok(vec![JournalEntry::new(1, d("2024-01-01"), "a")]),
        });
        let t = match requests(&client.load_all_entries())[0] {
            Request::ListEntries { token } => *token,
            _ => unreachable!(),
        };
        client.apply(Response::Entries {
            token: t,
            result: Err(StoreError::Remote {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: Some("db down".into()),
            }),
        });
        assert_eq!(client.state().entries.len(), 1);
        assert_eq!(client.state().status.as_ref().unwrap().text, MSG_LIST_FAILED);
    }

    #[test]
    fn test_start_new_entry_resets_to_create_mode() {
        let mut client = JournalClient::new();
        client.pick_existing_entry(&JournalEntry::new(1, d("2020-01-01"), "old"));
        let cmds = client.start_new_entry();
        assert_eq!(client.state().selected_date, Some(today()));
        assert_eq!(client.state().draft_content, "");
        assert!(!client.state().is_editing);
        assert!(matches!(requests(&cmds)[..], [Request::Lookup { date, .. }] if *date == today()));
    }

    #[test]
    fn test_clear_selection_empties_editor() {
        let mut client = JournalClient::new();
        client.pick_existing_entry(&JournalEntry::new(1, d("2020-01-01"), "old"));
        assert!(client.clear_selection().is_empty());
        assert_eq!(client.phase(), EditorPhase::Empty);
        assert_eq!(client.state().draft_content, "");
    }

    #[test]
    fn test_shutdown_discards_late_responses() {
        let mut client = JournalClient::new();
        let date = d("2024-01-15");
        let t = lookup_token(&client.select_date(date));
        client.shutdown();
        let cmds = client.apply(Response::Lookup {
            token: t,
            date,
            result: Ok(JournalEntry::new(1, date, "late")),
        });
        assert!(cmds.is_empty());
        assert_eq!(client.state().draft_content, "");
    }
}
