/// Per-room broadcast hubs.
pub mod channels;
/// Room code and player id generation.
pub mod codes;
/// Room aggregate: players, questions, submissions and scoring.
pub mod room;
/// Forward-only room lifecycle.
pub mod state_machine;

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    dao::{
        models::{RoomRecord, SwapOutcome},
        question_bank::QuestionBank,
        room_store::{MemoryRoomStore, RoomStore},
    },
    error::ServiceError,
    state::room::Room,
};

pub use self::channels::{RoomChannels, RoomUpdate};

/// Cloneable handle to [`AppState`] used as the axum router state.
pub type SharedState = Arc<AppState>;

/// Optimistic write attempts before a transaction reports contention.
const MAX_SWAP_ATTEMPTS: usize = 8;

/// What a committed room transaction left in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomState {
    /// The mutation was a no-op; nothing was written or published.
    Unchanged(RoomRecord),
    /// A new version was stored and published.
    Updated(RoomRecord),
    /// The last player left and the room was removed.
    Deleted,
}

impl RoomState {
    /// The room record after the transaction, unless the room was deleted.
    pub fn record(&self) -> Option<&RoomRecord> {
        match self {
            RoomState::Unchanged(record) | RoomState::Updated(record) => Some(record),
            RoomState::Deleted => None,
        }
    }
}

/// Result of [`AppState::run_room_transaction`]: the closure output and the resulting room state.
#[derive(Debug)]
pub struct Committed<T> {
    /// Output of the mutation closure.
    pub value: T,
    /// Room as left by the transaction.
    pub state: RoomState,
}

/// Central application state shared by every client session.
pub struct AppState {
    config: AppConfig,
    store: Arc<dyn RoomStore>,
    questions: QuestionBank,
    channels: RoomChannels,
    gates: DashMap<String, Arc<Mutex<()>>>,
    transaction_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, store: Arc<dyn RoomStore>, questions: QuestionBank) -> SharedState {
        let transaction_timeout =
            (config.transaction_timeout_ms > 0).then(|| config.transaction_timeout());
        Arc::new(Self {
            channels: RoomChannels::new(config.notification_capacity),
            config,
            store,
            questions,
            gates: DashMap::new(),
            transaction_timeout,
        })
    }

    /// State backed by the in-memory store, default settings, and the built-in questions.
    pub fn in_memory() -> SharedState {
        Self::new(
            AppConfig::default(),
            Arc::new(MemoryRoomStore::new()),
            QuestionBank::default(),
        )
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Backend holding the live rooms.
    pub fn store(&self) -> &Arc<dyn RoomStore> {
        &self.store
    }

    /// Pool of questions rooms are built from.
    pub fn question_bank(&self) -> &QuestionBank {
        &self.questions
    }

    /// Per-room notification hubs.
    pub fn channels(&self) -> &RoomChannels {
        &self.channels
    }

    /// Read the latest stored version of a room.
    pub async fn load_room(&self, room_id: &str) -> Result<Option<RoomRecord>, ServiceError> {
        Ok(self.store.get(room_id).await?)
    }

    /// Insert a brand-new room, returning `None` when its code is already in use.
    pub async fn insert_room(&self, room: Room) -> Result<Option<RoomRecord>, ServiceError> {
        let record = RoomRecord { room, version: 1 };
        if !self.store.insert(record.room.clone()).await? {
            return Ok(None);
        }
        self.channels.publish(&record);
        Ok(Some(record))
    }

    /// Apply `mutate` to a room as one atomic step.
    ///
    /// Transactions on the same room are serialised by a per-room gate held across the whole
    /// read-modify-write-publish sequence, so snapshots reach subscribers in commit order. The
    /// store write is a compare-and-swap; on conflict with another writer the room is reloaded
    /// and `mutate` runs again on fresh state. When `mutate` fails nothing is written. A room
    /// left without players is deleted and its subscribers receive [`RoomUpdate::Gone`].
    pub async fn run_room_transaction<F, T>(
        &self,
        room_id: &str,
        mutate: F,
    ) -> Result<Committed<T>, ServiceError>
    where
        F: FnMut(&mut Room) -> Result<T, ServiceError>,
    {
        let gate = self.gate(room_id);
        let guard = gate.lock().await;

        let work = self.commit(room_id, mutate);
        let result = match self.transaction_timeout {
            Some(limit) => match timeout(limit, work).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(room_id, "room transaction timed out");
                    Err(ServiceError::Timeout)
                }
            },
            None => work.await,
        };

        drop(guard);
        drop(gate);
        if matches!(
            result,
            Err(ServiceError::RoomNotFound(_))
                | Ok(Committed {
                    state: RoomState::Deleted,
                    ..
                })
        ) {
            self.retire_gate(room_id);
        }

        result
    }

    async fn commit<F, T>(&self, room_id: &str, mut mutate: F) -> Result<Committed<T>, ServiceError>
    where
        F: FnMut(&mut Room) -> Result<T, ServiceError>,
    {
        for attempt in 1..=MAX_SWAP_ATTEMPTS {
            let Some(current) = self.store.get(room_id).await? else {
                return Err(ServiceError::RoomNotFound(room_id.to_string()));
            };

            let mut room = current.room.clone();
            let value = mutate(&mut room)?;
            debug_assert!(
                room.status.rank() >= current.room.status.rank(),
                "room status moved backwards"
            );

            if room == current.room {
                return Ok(Committed {
                    value,
                    state: RoomState::Unchanged(current),
                });
            }

            let next = (!room.players.is_empty()).then(|| room.clone());
            match self
                .store
                .compare_and_swap(room_id, current.version, next)
                .await?
            {
                SwapOutcome::Stored(version) => {
                    let record = RoomRecord { room, version };
                    self.channels.publish(&record);
                    return Ok(Committed {
                        value,
                        state: RoomState::Updated(record),
                    });
                }
                SwapOutcome::Deleted => {
                    info!(room_id, "room emptied; deleted");
                    self.channels.close(room_id);
                    return Ok(Committed {
                        value,
                        state: RoomState::Deleted,
                    });
                }
                SwapOutcome::Conflict => {
                    debug!(room_id, attempt, "room changed concurrently; retrying");
                }
                SwapOutcome::Missing => {
                    return Err(ServiceError::RoomNotFound(room_id.to_string()));
                }
            }
        }

        warn!(room_id, "giving up after repeated write conflicts");
        Err(ServiceError::Contention)
    }

    /// Drop the gate of a room that no longer exists, unless another transaction still holds or
    /// awaits it.
    fn retire_gate(&self, room_id: &str) {
        self.gates
            .remove_if(room_id, |_, gate| Arc::strong_count(gate) == 1);
    }

    fn gate(&self, room_id: &str) -> Arc<Mutex<()>> {
        self.gates
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        dao::{models::RoomVersion, storage::{StorageError, StorageResult}},
        services::room_service,
        state::room::Player,
    };

    async fn seeded() -> (SharedState, String) {
        let state = AppState::in_memory();
        let room = Room::new("ABCD".into(), Player::new("Host".into(), true), Vec::new());
        state.insert_room(room).await.unwrap().unwrap();
        (state, "ABCD".into())
    }

    #[tokio::test]
    async fn failed_mutation_writes_nothing() {
        let (state, id) = seeded().await;
        let result = state
            .run_room_transaction(&id, |room| {
                room.add_player("Ghost".into());
                Err::<(), _>(ServiceError::Validation("rejected".into()))
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        let record = state.load_room(&id).await.unwrap().unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.room.players.len(), 1);
    }

    #[tokio::test]
    async fn unchanged_room_keeps_version() {
        let (state, id) = seeded().await;
        let committed = state.run_room_transaction(&id, |_| Ok(())).await.unwrap();
        assert!(matches!(committed.state, RoomState::Unchanged(ref r) if r.version == 1));
    }

    #[tokio::test]
    async fn update_is_published_in_order() {
        let (state, id) = seeded().await;
        let mut rx = state.channels().subscribe(&id);

        for name in ["A", "B"] {
            state
                .run_room_transaction(&id, |room| {
                    room.add_player(name.into());
                    Ok(())
                })
                .await
                .unwrap();
        }

        for expected in [2, 3] {
            match rx.recv().await.unwrap() {
                RoomUpdate::Snapshot(record) => assert_eq!(record.version, expected),
                other => panic!("unexpected update: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn emptied_room_is_deleted_and_announced() {
        let (state, id) = seeded().await;
        let mut rx = state.channels().subscribe(&id);

        let committed = state
            .run_room_transaction(&id, |room| {
                let host = *room.players.keys().next().unwrap();
                room.remove_player(&host);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(committed.state, RoomState::Deleted);
        assert!(state.load_room(&id).await.unwrap().is_none());
        assert!(matches!(rx.recv().await.unwrap(), RoomUpdate::Gone { .. }));
    }

    struct OfflineStore;

    fn offline<T>() -> BoxFuture<'static, StorageResult<T>> {
        Box::pin(async {
            Err(StorageError::unavailable(
                "store offline".into(),
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "offline"),
            ))
        })
    }

    impl RoomStore for OfflineStore {
        fn get(&self, _: &str) -> BoxFuture<'static, StorageResult<Option<RoomRecord>>> {
            offline()
        }
        fn insert(&self, _: Room) -> BoxFuture<'static, StorageResult<bool>> {
            offline()
        }
        fn compare_and_swap(
            &self,
            _: &str,
            _: RoomVersion,
            _: Option<Room>,
        ) -> BoxFuture<'static, StorageResult<SwapOutcome>> {
            offline()
        }
        fn count(&self) -> BoxFuture<'static, StorageResult<usize>> {
            offline()
        }
        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            offline()
        }
    }

    #[tokio::test]
    async fn store_failures_surface_as_unavailable() {
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(OfflineStore),
            QuestionBank::default(),
        );
        let result = state.run_room_transaction("ABCD", |_| Ok(())).await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
        assert!(matches!(
            state.load_room("ABCD").await,
            Err(ServiceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn commands_on_unknown_rooms_leave_no_gates() {
        let state = AppState::in_memory();
        for index in 0..500 {
            let code = format!("X{index:03}");
            let result = room_service::join_room(&state, &code, "Guest").await;
            assert!(matches!(result, Err(ServiceError::RoomNotFound(_))));
        }
        let result = room_service::join_room(&state, "TOOLONGCODE", "Guest").await;
        assert!(matches!(result, Err(ServiceError::RoomNotFound(_))));

        assert_eq!(state.store().count().await.unwrap(), 0);
        assert_eq!(state.gates.len(), 0);
    }

    #[tokio::test]
    async fn deleted_room_releases_its_gate() {
        let (state, id) = seeded().await;
        state
            .run_room_transaction(&id, |room| {
                let host = *room.players.keys().next().unwrap();
                room.remove_player(&host);
                Ok(())
            })
            .await
            .unwrap();
        assert!(state.gates.is_empty());
    }

    #[tokio::test]
    async fn gate_in_use_is_not_retired() {
        let (state, id) = seeded().await;
        let held = state.gate(&id);

        state.retire_gate(&id);
        assert!(state.gates.contains_key(&id));
        assert!(Arc::ptr_eq(&held, &state.gate(&id)));

        drop(held);
        state.retire_gate(&id);
        assert!(state.gates.is_empty());
    }

    #[tokio::test]
    async fn missing_room_is_not_found() {
        let state = AppState::in_memory();
        let result = state.run_room_transaction("NOPE", |_| Ok(())).await;
        assert!(matches!(result, Err(ServiceError::RoomNotFound(_))));
    }
}
