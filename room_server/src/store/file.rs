use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{RoomEnvelope, RoomStore};
use crate::errors::RoomResult;

/// 방 하나당 `{saves_dir}/{CODE}.json` 파일 하나.
///
/// 쓰기는 임시 파일에 쓴 뒤 rename 하므로 읽는 쪽이 반쯤 쓴 파일을 보지 않는다.
#[derive(Debug, Clone)]
pub struct FileRoomStore {
    dir: PathBuf,
}

impl FileRoomStore {
    pub async fn open(dir: impl Into<PathBuf>) -> RoomResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, room_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", room_id))
    }
}

#[async_trait]
impl RoomStore for FileRoomStore {
    async fn get(&self, room_id: &str) -> RoomResult<Option<RoomEnvelope>> {
        let bytes = match fs::read(self.path_for(room_id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let envelope = serde_json::from_slice(&bytes)?;
        Ok(Some(envelope))
    }

    async fn put(&self, room_id: &str, envelope: &RoomEnvelope) -> RoomResult<()> {
        let body = serde_json::to_vec_pretty(envelope)?;
        let target = self.path_for(room_id);
        let tmp = self
            .dir
            .join(format!("{}.json.{}.tmp", room_id, uuid::Uuid::new_v4().simple()));

        fs::write(&tmp, &body).await?;
        if let Err(e) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!("Room {} written to {}", room_id, target.display());
        Ok(())
    }

    async fn exists(&self, room_id: &str) -> RoomResult<bool> {
        Ok(fs::try_exists(self.path_for(room_id)).await?)
    }
}
