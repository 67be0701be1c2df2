// The remote journal API and the seam the controller talks to.
pub mod core;
pub mod error;
pub mod memory;
pub mod middleware;

use crate::model::{EntryPayload, JournalEntry};
use chrono::NaiveDate;
use std::future::Future;

pub use crate::client::core::ApiClient;
pub use crate::client::error::StoreError;
pub use crate::client::memory::MemoryStore;

/// The operations the journal client needs from its backing collection.
///
/// `get` returns `StoreError::NotFound` (or any other error) when there is no
/// entry for the date; callers decide how to fold those.
pub trait EntryStore: Send + Sync + 'static {
    fn health(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
    fn list(&self) -> impl Future<Output = Result<Vec<JournalEntry>, StoreError>> + Send;
    fn get(&self, date: NaiveDate)
    -> impl Future<Output = Result<JournalEntry, StoreError>> + Send;
    fn create(&self, payload: &EntryPayload) -> impl Future<Output = Result<(), StoreError>> + Send;
    fn update(&self, payload: &EntryPayload) -> impl Future<Output = Result<(), StoreError>> + Send;
    fn delete(&self, date: NaiveDate) -> impl Future<Output = Result<(), StoreError>> + Send;
}
