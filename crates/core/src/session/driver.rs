use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use super::{Session, SessionCommand, SessionError, SessionSnapshot};
use crate::watchlist::WatchedItem;

type Reply = oneshot::Sender<Result<SessionSnapshot, SessionError>>;

/// A command paired with the channel its outcome is sent back on.
#[derive(Debug)]
struct CommandEnvelope {
    command: SessionCommand,
    reply: Reply,
}

/// Handle for driving a running session.
///
/// This is cheaply cloneable and can be shared across tasks. Commands are
/// sent to the [`SessionDriver`]; state comes back through a watch channel.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<CommandEnvelope>,
    state: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Send a command and wait for the state it settled into.
    pub async fn execute(&self, command: SessionCommand) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(CommandEnvelope { command, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    pub async fn set_query(&self, query: impl Into<String>) -> Result<SessionSnapshot, SessionError> {
        self.execute(SessionCommand::SetQuery(query.into())).await
    }

    pub async fn select(&self, id: impl Into<String>) -> Result<SessionSnapshot, SessionError> {
        self.execute(SessionCommand::Select(id.into())).await
    }

    pub async fn close(&self) -> Result<SessionSnapshot, SessionError> {
        self.execute(SessionCommand::Close).await
    }

    pub async fn add(&self, item: WatchedItem) -> Result<SessionSnapshot, SessionError> {
        self.execute(SessionCommand::Add(item)).await
    }

    pub async fn remove(&self, id: impl Into<String>) -> Result<SessionSnapshot, SessionError> {
        self.execute(SessionCommand::Remove(id.into())).await
    }

    pub async fn rate_selected(&self, rating: u8) -> Result<SessionSnapshot, SessionError> {
        self.execute(SessionCommand::RateSelected(rating)).await
    }

    /// The latest published state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// A receiver notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    /// Wait until the published state satisfies `predicate`.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut rx = self.state.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(snapshot.clone())
    }
}

/// Background task owning the [`Session`].
///
/// Commands and fetch completions are handled one at a time from a single
/// loop. The driver stops once every handle has been dropped.
pub struct SessionDriver {
    session: Session,
    rx: mpsc::Receiver<CommandEnvelope>,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionDriver {
    /// Run the driver until all handles are gone.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!("Session driver started");

        loop {
            tokio::select! {
                envelope = self.rx.recv() => {
                    let Some(CommandEnvelope { command, reply }) = envelope else {
                        break;
                    };
                    let name = command.name();
                    let outcome = self.execute(command);
                    if let Err(e) = &outcome {
                        warn!(command = name, "Command rejected: {}", e);
                    }
                    self.publish();
                    let _ = reply.send(outcome.map(|()| self.state.borrow().clone()));
                }
                Some(event) = self.session.next_event() => {
                    if self.session.apply(event) {
                        self.publish();
                    }
                }
            }
        }

        info!("Session driver shutting down");
    }

    /// Commands may write the watched list to storage. On a multi-threaded
    /// runtime that write is moved off the worker so other tasks keep running.
    fn execute(&mut self, command: SessionCommand) -> Result<(), SessionError> {
        let session = &mut self.session;
        match Handle::try_current().map(|handle| handle.runtime_flavor()) {
            Ok(RuntimeFlavor::MultiThread) => {
                tokio::task::block_in_place(|| session.execute(command))
            }
            _ => session.execute(command),
        }
    }

    fn publish(&self) {
        let snapshot = self.session.snapshot();
        let changed = self.state.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        if changed {
            debug!("Session state published");
        }
    }
}

/// Create a complete session system
///
/// Returns:
/// - `SessionHandle` - for driving the session (clone this to share across tasks)
/// - `SessionDriver` - spawn this as a background task with `tokio::spawn(driver.run())`
///
/// # Arguments
/// * `session` - The session to own
/// * `buffer_size` - Size of the command buffer (senders wait when full)
pub fn create_session_system(session: Session, buffer_size: usize) -> (SessionHandle, SessionDriver) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let (state_tx, state_rx) = watch::channel(session.snapshot());
    let handle = SessionHandle {
        tx,
        state: state_rx,
    };
    let driver = SessionDriver {
        session,
        rx,
        state: state_tx,
    };
    (handle, driver)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::search::SearchStatus;
    use crate::session::SessionOptions;
    use crate::store::{MemorySlotStore, PersistentStore, SlotStore};
    use crate::testing::{fixtures, MockCatalog};

    async fn spawn_session() -> (SessionHandle, tokio::task::JoinHandle<()>, Arc<MockCatalog>) {
        let catalog = Arc::new(MockCatalog::new());
        catalog
            .add_item(fixtures::item_detail("tt1", "Batman", 126, "7.5"))
            .await;

        let session = Session::new(
            catalog.clone(),
            PersistentStore::new(Arc::new(MemorySlotStore::new())),
            SessionOptions::default(),
        );
        let (handle, driver) = create_session_system(session, 16);
        let task = tokio::spawn(driver.run());
        (handle, task, catalog)
    }

    #[tokio::test]
    async fn test_command_replies_with_snapshot() {
        let (handle, _task, _catalog) = spawn_session().await;

        let snapshot = handle.set_query("batman").await.unwrap();
        assert_eq!(snapshot.search.status, SearchStatus::Loading);

        let settled = handle
            .wait_for(|s| s.search.status == SearchStatus::Success)
            .await
            .unwrap();
        assert_eq!(settled.search.results.len(), 1);
        assert_eq!(handle.snapshot().search.results[0].id, "tt1");
    }

    #[tokio::test]
    async fn test_rejected_command_is_reported() {
        let (handle, _task, _catalog) = spawn_session().await;

        assert_eq!(
            handle.rate_selected(5).await,
            Err(SessionError::NothingSelected)
        );
        // The driver keeps serving after a rejection.
        assert!(handle.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_driver_stops_when_handles_drop() {
        let (handle, task, _catalog) = spawn_session().await;
        let other = handle.clone();
        drop(handle);
        drop(other);

        task.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_saves_on_multi_thread_runtime() {
        let slots = Arc::new(MemorySlotStore::new());
        let session = Session::new(
            Arc::new(MockCatalog::new()),
            PersistentStore::new(slots.clone()),
            SessionOptions::default(),
        );
        let (handle, driver) = create_session_system(session, 4);
        let task = tokio::spawn(driver.run());

        let snapshot = handle
            .add(fixtures::watched_item("tt1", "Batman", 8))
            .await
            .unwrap();
        assert_eq!(snapshot.watchlist.len(), 1);
        let stored = slots.read("watched").unwrap().unwrap();
        assert!(stored.contains("\"tt1\""));

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let (handle, _task, _catalog) = spawn_session().await;
        let mut rx = handle.subscribe();

        handle.select("tt1").await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().selection.selected_id.as_deref(), Some("tt1"));
    }
}
