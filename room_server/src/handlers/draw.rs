use actix_web::{post, web, HttpResponse};
use deck_core::{DrawEngine, DrawOutcome, DrawRequest, DrawSignature};
use tracing::{debug, info, warn};

use super::{fetch_room, persist_and_publish};
use crate::env::DrawSettings;
use crate::errors::{RoomError, RoomResult};
use crate::protocol::{
    parse_body, ChooseDrawRequest, DrawRequestBody, OkResponse, PreviewDrawResponse,
    RoomDrawBody, RoomDrawResponse, RoomEvent,
};
use crate::store::{
    normalize_optional_room_id, normalize_room_id, note_store_failure, RoomEnvelope,
};
use crate::AppState;

/// 요청 값에 설정 기본값과 상한을 적용한다.
pub fn resolve_request(
    settings: &DrawSettings,
    count: Option<usize>,
    sequences: Option<usize>,
) -> DrawRequest {
    DrawRequest::new(
        count.unwrap_or(settings.default_count),
        sequences.unwrap_or(deck_core::draw::DEFAULT_SEQUENCES),
    )
    .capped(settings.max_count, settings.max_sequences)
}

fn run_draw(state: &AppState, request: DrawRequest, previous: Option<&str>) -> DrawOutcome {
    DrawEngine::new(&state.catalog, &state.preferences).draw(
        request,
        previous,
        &mut rand::thread_rng(),
    )
}

/// 방 상태는 건드리지 않는 미리보기 뽑기. `roomId` 가 오면 `lastDrawSig` 만 남긴다.
///
/// 없는 방이면 서명만 담은 봉투를 저장해 혼자 하는 판에서도 직전 뽑기를 피한다.
#[post("/api/draw")]
pub async fn preview_draw(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, RoomError> {
    let body: DrawRequestBody = parse_body(&body)?;
    let room_id = normalize_optional_room_id(body.room_id.as_deref())?;
    let request = resolve_request(&state.settings.draw, body.count, body.sequences);

    // 바깥 None: roomId 가 없거나 읽기 실패. 읽지 못한 방은 덮어쓰지 않는다.
    let stored = match &room_id {
        Some(code) => match state.store.get(code).await {
            Ok(room) => Some(room),
            Err(e) => {
                note_store_failure(&state.metrics, "get", code, &e);
                None
            }
        },
        None => None,
    };
    let previous = stored
        .as_ref()
        .and_then(Option::as_ref)
        .and_then(|r| r.last_draw_sig.clone());

    let outcome = run_draw(&state, request, previous.as_deref());
    state.metrics.record_draw("preview", &outcome);
    debug!(
        "Preview draw: {} proposal(s) in {} attempt(s)",
        outcome.proposals.len(),
        outcome.attempts
    );

    if let (Some(code), Some(room), Some(signature)) =
        (room_id, stored, outcome.lead_signature())
    {
        let mut envelope = room.unwrap_or_else(|| {
            debug!("Keeping draw signature for unsaved room {}", code);
            RoomEnvelope {
                room_id: code.clone(),
                ..Default::default()
            }
        });
        envelope.last_draw_sig = Some(signature.into_string());
        // 미리보기 응답은 저장 실패와 무관하게 돌려준다.
        if let Err(e) = state.store.put(&code, &envelope).await {
            note_store_failure(&state.metrics, "put", &code, &e);
            warn!("Ignoring lastDrawSig write failure for room {}", code);
        }
    }

    Ok(HttpResponse::Ok().json(PreviewDrawResponse::new(
        request.sequences,
        outcome.proposals,
    )))
}

#[post("/api/room/{room_id}/draw")]
pub async fn room_draw(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> RoomResult<HttpResponse> {
    let code = normalize_room_id(&path.into_inner())?;
    let body: RoomDrawBody = parse_body(&body)?;
    let request = resolve_request(&state.settings.draw, body.count, body.sequences);

    let mut envelope = fetch_room(&state, &code).await?;
    let outcome = run_draw(&state, request, envelope.last_draw_sig.as_deref());
    state.metrics.record_draw("room", &outcome);

    envelope.record_draw(
        outcome.proposals.clone(),
        outcome.lead_signature().map(DrawSignature::into_string),
    );
    info!(
        "Room {} drew {} proposal(s) (count={}, sequences={})",
        code,
        outcome.proposals.len(),
        request.count,
        request.sequences
    );

    persist_and_publish(
        &state,
        &code,
        &envelope,
        RoomEvent::DrawsUpdated {
            proposals: outcome.proposals.clone(),
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(RoomDrawResponse {
        ok: true,
        proposals: outcome.proposals,
    }))
}

#[post("/api/room/{room_id}/choose_draw")]
pub async fn choose_draw(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> RoomResult<HttpResponse> {
    let code = normalize_room_id(&path.into_inner())?;
    let body: ChooseDrawRequest = parse_body(&body)?;
    let index = body
        .index
        .ok_or_else(|| RoomError::invalid_input("index requis"))?;

    let mut envelope = fetch_room(&state, &code).await?;
    let (index, proposal) = envelope.choose_draw(index)?;
    info!("Room {} chose proposal {}", code, index);

    persist_and_publish(
        &state,
        &code,
        &envelope,
        RoomEvent::DrawChosen { index, proposal },
    )
    .await?;

    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}
