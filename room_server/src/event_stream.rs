use std::time::Duration;

use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::{get, web, Error, HttpResponse};
use tracing::{error, info, warn};

use crate::errors::RoomResult;
use crate::hub::Frame;
use crate::protocol::{PresenceEntry, StreamQuery, KEEPALIVE_FRAME};
use crate::store::{normalize_room_id, note_store_failure};
use crate::AppState;

impl StreamQuery {
    /// `client` 가 있어야 presence 에 올라간다. 이름이 없으면 client id 를 쓴다.
    fn into_presence(self) -> Option<PresenceEntry> {
        let client = self.client.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())?;
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| client.clone());
        Some(PresenceEntry { client, name })
    }
}

/// 방 이벤트 SSE 스트림.
///
/// 저장된 방이 있으면 첫 이벤트로 `state_sync` 스냅샷을 보내고, 이후 발행 순서대로 흘린다.
/// 스냅샷 직후에 같은 상태의 `state_sync` 가 한 번 더 올 수 있다.
/// 연결이 끊기면 스트림이 drop 되면서 구독도 빠진다.
#[get("/api/room/{room_id}/events")]
pub async fn room_events(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<StreamQuery>,
) -> RoomResult<HttpResponse> {
    let code = normalize_room_id(&path.into_inner())?;

    // 먼저 등록해야 스냅샷을 읽는 동안 발행된 이벤트도 큐에 남는다.
    let mut subscription = state
        .hub
        .subscribe(&code, query.into_inner().into_presence());

    // 스냅샷을 못 읽어도 라이브 이벤트는 받을 수 있게 구독은 유지한다.
    match state.store.get(&code).await {
        Ok(Some(envelope)) => subscription.deliver_snapshot(envelope),
        Ok(None) => warn!("Event stream opened for room {} without stored state", code),
        Err(e) => note_store_failure(&state.metrics, "get", &code, &e),
    }
    let idle = Duration::from_secs(state.settings.sse.keepalive_seconds.max(1));
    info!(
        "Event stream {} opened for room {}",
        subscription.id(),
        code
    );

    let stream = async_stream::stream! {
        loop {
            match subscription.next_frame(idle).await {
                Frame::Event(event) => match event.to_sse_frame() {
                    Ok(frame) => yield Ok::<_, Error>(web::Bytes::from(frame)),
                    Err(e) => error!("Failed to encode {} event: {}", event.kind(), e),
                },
                Frame::Keepalive => yield Ok(web::Bytes::from_static(KEEPALIVE_FRAME.as_bytes())),
                Frame::Closed => break,
            }
        }
    };

    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(stream))
}
