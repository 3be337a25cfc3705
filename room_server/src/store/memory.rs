use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{RoomEnvelope, RoomStore};
use crate::errors::RoomResult;

/// 프로세스 메모리에만 두는 저장소. 테스트와 저장 디렉터리 없는 실행용.
#[derive(Debug, Default)]
pub struct MemoryRoomStore {
    rooms: RwLock<HashMap<String, RoomEnvelope>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rooms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.read().is_empty()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn get(&self, room_id: &str) -> RoomResult<Option<RoomEnvelope>> {
        Ok(self.rooms.read().get(room_id).cloned())
    }

    async fn put(&self, room_id: &str, envelope: &RoomEnvelope) -> RoomResult<()> {
        self.rooms
            .write()
            .insert(room_id.to_string(), envelope.clone());
        Ok(())
    }

    async fn exists(&self, room_id: &str) -> RoomResult<bool> {
        Ok(self.rooms.read().contains_key(room_id))
    }
}
