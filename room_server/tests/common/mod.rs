#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deck_core::DeckCatalog;
use room_server::env::Settings;
use room_server::errors::RoomResult;
use room_server::store::{MemoryRoomStore, RoomEnvelope, RoomStore};
use room_server::AppState;
use parking_lot::Mutex;
use std::sync::Once;
use tokio_util::sync::CancellationToken;

static INIT: Once = Once::new();

fn setup_test_environment() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("room_server=debug")
            .with_test_writer()
            .try_init();
    });
}

pub fn default_catalog() -> DeckCatalog {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../deck.json");
    DeckCatalog::load(path).expect("default deck.json should load")
}

/// 메모리 저장소를 쓰는 AppState.
pub fn memory_state() -> AppState {
    state_with_store(Arc::new(MemoryRoomStore::new()))
}

pub fn state_with_store(store: Arc<dyn RoomStore>) -> AppState {
    setup_test_environment();
    AppState::new(
        Settings::with_saves_dir("unused"),
        default_catalog(),
        store,
        CancellationToken::new(),
    )
}

/// 쓰기만 실패하게 만들 수 있는 저장소.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryRoomStore,
    fail_puts: AtomicBool,
}

impl FlakyStore {
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RoomStore for FlakyStore {
    async fn get(&self, room_id: &str) -> RoomResult<Option<RoomEnvelope>> {
        self.inner.get(room_id).await
    }

    async fn put(&self, room_id: &str, envelope: &RoomEnvelope) -> RoomResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
        }
        self.inner.put(room_id, envelope).await
    }

    async fn exists(&self, room_id: &str) -> RoomResult<bool> {
        self.inner.exists(room_id).await
    }
}

/// 다음 `get` 하나만 값을 읽은 뒤 늦게 돌려주는 저장소.
#[derive(Default)]
pub struct SlowSnapshotStore {
    inner: MemoryRoomStore,
    delay: Mutex<Option<Duration>>,
}

impl SlowSnapshotStore {
    pub fn slow_next_get(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }
}

#[async_trait]
impl RoomStore for SlowSnapshotStore {
    async fn get(&self, room_id: &str) -> RoomResult<Option<RoomEnvelope>> {
        let snapshot = self.inner.get(room_id).await;
        let delay = self.delay.lock().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        snapshot
    }

    async fn put(&self, room_id: &str, envelope: &RoomEnvelope) -> RoomResult<()> {
        self.inner.put(room_id, envelope).await
    }

    async fn exists(&self, room_id: &str) -> RoomResult<bool> {
        self.inner.exists(room_id).await
    }
}
