// Background tasks feeding the TUI loop: request execution and status timers.
use crate::client::EntryStore;
use crate::controller::Request;
use crate::network::execute;
use crate::tui::action::AppEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{Sender, UnboundedReceiver};
use tokio::task::AbortHandle;

/// Executes requests as they arrive, each on its own task, so a slow lookup
/// never holds up a save. Responses can therefore come back out of order.
pub async fn run_network_actor<S: EntryStore>(
    store: Arc<S>,
    mut request_rx: UnboundedReceiver<Request>,
    event_tx: Sender<AppEvent>,
) {
    while let Some(request) = request_rx.recv().await {
        log::debug!("Dispatching {:?}", request);
        let store = store.clone();
        let tx = event_tx.clone();
        tokio::spawn(async move {
            let response = execute(store.as_ref(), request).await;
            // The UI may already be gone; nothing left to update then.
            let _ = tx.send(AppEvent::Response(response)).await;
        });
    }
    log::debug!("Network actor stopped");
}

/// At most one pending status expiry. Scheduling a new one aborts the old.
#[derive(Debug, Default)]
pub struct StatusTimer {
    pending: Option<AbortHandle>,
}

impl StatusTimer {
    pub fn schedule(&mut self, generation: u64, after: Duration, event_tx: Sender<AppEvent>) {
        self.cancel();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = event_tx.send(AppEvent::StatusExpired(generation)).await;
        });
        self.pending = Some(handle.abort_handle());
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for StatusTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
