use async_trait::async_trait;

use crate::errors::{RoomError, RoomResult};

pub mod envelope;
pub mod file;
pub mod memory;

pub use envelope::{DrawState, RoomEnvelope, RoomState, StatePatch};
pub use file::FileRoomStore;
pub use memory::MemoryRoomStore;

pub const MAX_ROOM_ID_LEN: usize = 32;

/// 방 코드 → envelope 저장소. 마지막에 쓴 쪽이 이긴다(동시 쓰기 충돌은 허용).
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn get(&self, room_id: &str) -> RoomResult<Option<RoomEnvelope>>;
    async fn put(&self, room_id: &str, envelope: &RoomEnvelope) -> RoomResult<()>;
    async fn exists(&self, room_id: &str) -> RoomResult<bool>;
}

/// 요청에서 받은 방 코드를 정규화한다: 앞뒤 공백 제거 후 대문자.
///
/// 파일 이름으로 쓰이므로 ASCII 영숫자만 허용한다.
pub fn normalize_room_id(raw: &str) -> RoomResult<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(RoomError::invalid_input("roomId requis"));
    }
    if code.len() > MAX_ROOM_ID_LEN || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(RoomError::invalid_input(format!("roomId invalide: {}", raw)));
    }
    Ok(code)
}

/// `roomId` 가 빠질 수 있는 요청용. 비어 있으면 `None`.
pub fn normalize_optional_room_id(raw: Option<&str>) -> RoomResult<Option<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(code) => normalize_room_id(code).map(Some),
    }
}

/// 쓰기 실패를 로그와 메트릭에 남긴다. 에러 전파 여부는 호출한 쪽이 정한다.
pub(crate) fn note_store_failure(
    metrics: &crate::metrics::MetricsCtx,
    op: &str,
    room_id: &str,
    err: &RoomError,
) {
    tracing::error!("Room store {} failed for {}: {}", op, room_id, err);
    metrics.inc_store_failure(op);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_room_id(" ab12cd ").unwrap(), "AB12CD");
        assert_eq!(normalize_room_id("solo").unwrap(), "SOLO");
    }

    #[test]
    fn rejects_empty_and_path_like_codes() {
        assert!(matches!(
            normalize_room_id("  "),
            Err(RoomError::InvalidInput { .. })
        ));
        assert!(normalize_room_id("../etc").is_err());
        assert!(normalize_room_id("AB/CD").is_err());
        assert!(normalize_room_id(&"A".repeat(MAX_ROOM_ID_LEN + 1)).is_err());
    }

    #[test]
    fn optional_room_id_treats_blank_as_absent() {
        assert_eq!(normalize_optional_room_id(None).unwrap(), None);
        assert_eq!(normalize_optional_room_id(Some("")).unwrap(), None);
        assert_eq!(
            normalize_optional_room_id(Some("abc")).unwrap(),
            Some("ABC".to_string())
        );
    }
}
