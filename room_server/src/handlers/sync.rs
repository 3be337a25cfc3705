use actix_web::{post, web, HttpResponse};
use tracing::debug;

use super::{fetch_room, persist_and_publish};
use crate::errors::RoomResult;
use crate::protocol::{parse_body, OkResponse, RoomEvent, SyncRequest};
use crate::store::normalize_room_id;
use crate::AppState;

/// 부분 갱신. `meta` 는 얕게 병합하고 `team`/`state` 는 온 경우에만 교체한다.
#[post("/api/room/{room_id}/sync")]
pub async fn sync_room(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> RoomResult<HttpResponse> {
    let code = normalize_room_id(&path.into_inner())?;
    let request: SyncRequest = parse_body(&body)?;

    let mut envelope = fetch_room(&state, &code).await?;
    envelope.apply_sync(request.team, request.state, request.meta);
    debug!("Room {} synced", code);

    persist_and_publish(
        &state,
        &code,
        &envelope,
        RoomEvent::state_sync(envelope.clone()),
    )
    .await?;

    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}
