// Manages the application state for the TUI.
use crate::controller::JournalClient;
use crate::model::{JournalEntry, format_date, parse_date};
use chrono::{Days, NaiveDate};
use ratatui::widgets::ListState;
use unicode_width::UnicodeWidthChar;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Focus {
    Date,
    Editor,
    Entries,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InputMode {
    Normal,
    /// Waiting for y/n before deleting the entry for this date.
    ConfirmDelete(NaiveDate),
    /// Waiting for y/n before quitting with an unsaved draft.
    ConfirmQuit,
}

pub struct AppState {
    pub client: JournalClient,
    pub api_url: String,

    // UI State
    pub list_state: ListState,
    pub focus: Focus,
    pub mode: InputMode,

    // Date field buffer, committed with Enter
    pub date_input: String,
    /// Cursor in the draft, counted in chars.
    pub cursor_position: usize,
}

impl AppState {
    pub fn new(client: JournalClient, api_url: impl Into<String>) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            client,
            api_url: api_url.into(),
            list_state,
            focus: Focus::Editor,
            mode: InputMode::Normal,
            date_input: String::new(),
            cursor_position: 0,
        }
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.client.state().entries
    }

    pub fn get_selected_entry(&self) -> Option<&JournalEntry> {
        self.list_state
            .selected()
            .and_then(|idx| self.entries().get(idx))
    }

    /// Re-sync the widgets that mirror controller state (date field, cursor,
    /// list selection) after the controller changed underneath them.
    pub fn sync_from_client(&mut self) {
        if self.focus != Focus::Date {
            self.date_input = self
                .client
                .state()
                .selected_date
                .map(format_date)
                .unwrap_or_default();
        }
        self.cursor_position = self.clamp_cursor(self.cursor_position);

        let len = self.entries().len();
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            None => self.list_state.select(Some(0)),
            _ => {}
        }
    }

    /// Moves the cursor to the end of the draft, e.g. after a new entry loaded.
    pub fn cursor_to_end(&mut self) {
        self.cursor_position = self.client.state().draft_content.chars().count();
    }

    // --- INPUT HELPERS ---
    pub fn move_cursor_left(&mut self) {
        let cursor_moved_left = self.cursor_position.saturating_sub(1);
        self.cursor_position = self.clamp_cursor(cursor_moved_left);
    }
    pub fn move_cursor_right(&mut self) {
        let cursor_moved_right = self.cursor_position.saturating_add(1);
        self.cursor_position = self.clamp_cursor(cursor_moved_right);
    }
    pub fn enter_char(&mut self, new_char: char) {
        let mut draft = self.client.state().draft_content.clone();
        let byte_index = draft
            .char_indices()
            .map(|(i, _)| i)
            .nth(self.cursor_position)
            .unwrap_or(draft.len());

        draft.insert(byte_index, new_char);
        self.client.set_draft(draft);
        self.move_cursor_right();
    }
    pub fn delete_char(&mut self) {
        if self.cursor_position != 0 {
            let current_index = self.cursor_position;
            let draft = &self.client.state().draft_content;
            let before = draft.chars().take(current_index - 1);
            let after = draft.chars().skip(current_index);
            let updated: String = before.chain(after).collect();
            self.client.set_draft(updated);
            self.move_cursor_left();
        }
    }
    fn clamp_cursor(&self, new_cursor_pos: usize) -> usize {
        new_cursor_pos.clamp(0, self.client.state().draft_content.chars().count())
    }

    /// The draft laid out in rows at most `width` cells wide (hard breaks
    /// on newlines, soft breaks at the edge), plus the cursor's (row, column)
    /// in that layout. The cursor row can be one past the last row when the
    /// draft ends exactly at the edge.
    pub fn wrapped_draft(&self, width: u16) -> (Vec<String>, (usize, usize)) {
        let width = usize::from(width.max(1));
        let mut rows = vec![String::new()];
        let mut col = 0;
        let mut cursor = None;

        for (i, c) in self.client.state().draft_content.chars().enumerate() {
            if c == '\n' {
                if i == self.cursor_position {
                    cursor = Some((rows.len() - 1, col));
                }
                rows.push(String::new());
                col = 0;
                continue;
            }
            let w = c.width().unwrap_or(0);
            if col > 0 && col + w > width {
                rows.push(String::new());
                col = 0;
            }
            if i == self.cursor_position {
                cursor = Some((rows.len() - 1, col));
            }
            if let Some(row) = rows.last_mut() {
                row.push(c);
            }
            col += w;
        }

        let cursor = cursor.unwrap_or(if col >= width {
            (rows.len(), 0)
        } else {
            (rows.len() - 1, col)
        });
        (rows, cursor)
    }

    // --- DATE FIELD ---
    pub fn date_enter_char(&mut self, c: char) {
        if (c.is_ascii_digit() || c == '-') && self.date_input.len() < 10 {
            self.date_input.push(c);
        }
    }
    pub fn date_delete_char(&mut self) {
        self.date_input.pop();
    }

    /// What Enter in the date field means: `Some(Some(date))` to select,
    /// `Some(None)` to clear the selection, `None` when the text is invalid.
    pub fn committed_date(&self) -> Option<Option<NaiveDate>> {
        let raw = self.date_input.trim();
        if raw.is_empty() {
            Some(None)
        } else {
            parse_date(raw).map(Some)
        }
    }

    /// The selected date moved by `days` (negative goes back).
    /// Starts from today when nothing is selected.
    pub fn shifted_date(&self, days: i64) -> Option<NaiveDate> {
        let base = self
            .client
            .state()
            .selected_date
            .unwrap_or_else(crate::model::today);
        if days >= 0 {
            base.checked_add_days(Days::new(days as u64))
        } else {
            base.checked_sub_days(Days::new(days.unsigned_abs()))
        }
    }

    // --- NAVIGATION ---
    pub fn next(&mut self) {
        let len = self.entries().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }
    pub fn previous(&mut self) {
        let len = self.entries().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Date => Focus::Editor,
            Focus::Editor => Focus::Entries,
            Focus::Entries => Focus::Date,
        }
    }
}
