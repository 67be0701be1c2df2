// In-process `EntryStore` that follows the journal server's rules.
use crate::client::EntryStore;
use crate::client::error::StoreError;
use crate::model::{EntryPayload, JournalEntry};
use chrono::{Local, NaiveDate};
use http::StatusCode;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<JournalEntry>,
    next_id: u64,
}

/// Keeps entries in memory, one per date, listed newest date first.
///
/// Can be switched unreachable to exercise connectivity failures, and counts
/// every call it receives.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    unreachable: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<JournalEntry>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            inner.next_id = entries.len() as u64;
            inner.entries = entries;
            inner.entries.sort_by(|a, b| b.date.cmp(&a.date));
        }
        store
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.unreachable.store(!reachable, Ordering::SeqCst);
    }

    /// Number of calls received so far, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<JournalEntry> {
        self.lock().entries.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Poisoned only when a test panicked mid-call.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            Err(StoreError::Connectivity("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    fn rejected(status: StatusCode, message: &str) -> StoreError {
        StoreError::Remote {
            status,
            message: Some(message.to_string()),
        }
    }

    fn now() -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }
}

impl EntryStore for MemoryStore {
    async fn health(&self) -> Result<(), StoreError> {
        self.enter()
    }

    async fn list(&self) -> Result<Vec<JournalEntry>, StoreError> {
        self.enter()?;
        Ok(self.snapshot())
    }

    async fn get(&self, date: NaiveDate) -> Result<JournalEntry, StoreError> {
        self.enter()?;
        self.lock()
            .entries
            .iter()
            .find(|e| e.date == date)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, payload: &EntryPayload) -> Result<(), StoreError> {
        self.enter()?;
        if payload.content.is_empty() {
            return Err(Self::rejected(
                StatusCode::BAD_REQUEST,
                "Date and content are required",
            ));
        }
        let mut inner = self.lock();
        if inner.entries.iter().any(|e| e.date == payload.date) {
            return Err(Self::rejected(
                StatusCode::BAD_REQUEST,
                "An entry already exists for this date",
            ));
        }
        inner.next_id += 1;
        let now = Self::now();
        let mut entry = JournalEntry::new(inner.next_id, payload.date, &payload.content);
        entry.created_at = Some(now.clone());
        entry.updated_at = Some(now);
        inner.entries.push(entry);
        inner.entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(())
    }

    async fn update(&self, payload: &EntryPayload) -> Result<(), StoreError> {
        self.enter()?;
        if payload.content.is_empty() {
            return Err(Self::rejected(StatusCode::BAD_REQUEST, "Content is required"));
        }
        let mut inner = self.lock();
        match inner.entries.iter_mut().find(|e| e.date == payload.date) {
            Some(entry) => {
                entry.content = payload.content.clone();
                entry.updated_at = Some(Self::now());
                Ok(())
            }
            None => Err(Self::rejected(
                StatusCode::NOT_FOUND,
                "No entry found for this date",
            )),
        }
    }

    async fn delete(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.enter()?;
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|e| e.date != date);
        if inner.entries.len() == before {
            return Err(Self::rejected(
                StatusCode::NOT_FOUND,
                "No entry found for this date",
            ));
        }
        Ok(())
    }
}
