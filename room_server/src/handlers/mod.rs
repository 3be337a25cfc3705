use crate::errors::{RoomError, RoomResult};
use crate::protocol::RoomEvent;
use crate::store::{note_store_failure, RoomEnvelope};
use crate::AppState;

pub mod draw;
pub mod ops;
pub mod rooms;
pub mod sync;

/// 방을 읽는다. 없으면 `NotFound`.
pub(crate) async fn fetch_room(state: &AppState, room_id: &str) -> RoomResult<RoomEnvelope> {
    match state.store.get(room_id).await {
        Ok(Some(envelope)) => Ok(envelope),
        Ok(None) => Err(RoomError::not_found(room_id)),
        Err(e) => {
            note_store_failure(&state.metrics, "get", room_id, &e);
            Err(e)
        }
    }
}

/// 저장 후 발행. 저장에 실패해도 이벤트는 나가고, 실패는 호출자에게 돌아간다.
pub(crate) async fn persist_and_publish(
    state: &AppState,
    room_id: &str,
    envelope: &RoomEnvelope,
    event: RoomEvent,
) -> RoomResult<()> {
    let written = state.store.put(room_id, envelope).await;
    if let Err(e) = &written {
        note_store_failure(&state.metrics, "put", room_id, e);
    }
    state.hub.publish(room_id, event);
    written
}
