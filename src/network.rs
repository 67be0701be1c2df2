// Runs controller requests against an `EntryStore`.
use crate::client::EntryStore;
use crate::controller::{Command, JournalClient, Request, Response, SaveMode};
use std::collections::VecDeque;

/// Performs one request and packages the outcome for `JournalClient::apply`.
pub async fn execute<S: EntryStore>(store: &S, request: Request) -> Response {
    match request {
        Request::Health { token } => Response::Health {
            token,
            result: store.health().await,
        },
        Request::ListEntries { token } => Response::Entries {
            token,
            result: store.list().await,
        },
        Request::Lookup { token, date } => Response::Lookup {
            token,
            date,
            result: store.get(date).await,
        },
        Request::Save {
            token,
            mode,
            payload,
        } => {
            let result = match mode {
                SaveMode::Create => store.create(&payload).await,
                SaveMode::Update => store.update(&payload).await,
            };
            Response::Saved {
                token,
                mode,
                date: payload.date,
                result,
            }
        }
        Request::Delete { token, date } => Response::Deleted {
            token,
            date,
            result: store.delete(date).await,
        },
    }
}

/// Executes `commands` and every follow-up they trigger, one at a time, until
/// nothing is left in flight. Status expiries are not scheduled, so the last
/// status message stays readable in `client.state()`.
///
/// Returns the number of requests sent.
pub async fn run_until_idle<S: EntryStore>(
    client: &mut JournalClient,
    store: &S,
    commands: Vec<Command>,
) -> usize {
    let mut queue: VecDeque<Command> = commands.into();
    let mut sent = 0;
    while let Some(cmd) = queue.pop_front() {
        if let Command::Send(request) = cmd {
            sent += 1;
            let response = execute(store, request).await;
            queue.extend(client.apply(response));
        }
    }
    sent
}
