use actix_web::{get, post, web, HttpResponse};
use tracing::info;

use super::{fetch_room, persist_and_publish};
use crate::errors::{RoomError, RoomResult};
use crate::protocol::{
    parse_body, CreateRequest, JoinRequest, OkResponse, RoomEvent, RoomIdResponse, SaveRequest,
};
use crate::room_code::allocate_code;
use crate::store::{normalize_room_id, note_store_failure, RoomEnvelope};
use crate::AppState;

#[get("/deck")]
pub async fn deck(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.catalog.raw())
}

#[get("/api/deck")]
pub async fn api_deck(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.catalog.raw())
}

#[post("/create")]
pub async fn create_room(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, RoomError> {
    let request: CreateRequest = parse_body(&body)?;
    let code = allocate_code(state.store.as_ref()).await?;

    let envelope = RoomEnvelope::new(code.clone(), request.team.unwrap_or_default());
    if let Err(e) = state.store.put(&code, &envelope).await {
        note_store_failure(&state.metrics, "put", &code, &e);
        return Err(e);
    }

    state.metrics.inc_room_created();
    info!("Room {} created for team {:?}", code, envelope.team);
    Ok(HttpResponse::Ok().json(RoomIdResponse { room_id: code }))
}

#[post("/join")]
pub async fn join_room(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, RoomError> {
    let request: JoinRequest = parse_body(&body)?;
    let code = normalize_room_id(request.room_id.as_deref().unwrap_or_default())?;

    if !state.store.exists(&code).await? {
        return Err(RoomError::not_found(code));
    }
    Ok(HttpResponse::Ok().json(RoomIdResponse { room_id: code }))
}

/// 방 전체를 덮어쓴다. 없던 방이면 새로 만든다.
#[post("/save")]
pub async fn save_room(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, RoomError> {
    let request: SaveRequest = parse_body(&body)?;
    let code = normalize_room_id(request.room_id.as_deref().unwrap_or_default())?;

    let mut envelope = match state.store.get(&code).await {
        Ok(Some(existing)) => existing,
        Ok(None) => RoomEnvelope {
            room_id: code.clone(),
            ..Default::default()
        },
        Err(e) => {
            note_store_failure(&state.metrics, "get", &code, &e);
            return Err(e);
        }
    };
    envelope.room_id = code.clone();
    envelope.apply_save(
        request.team,
        request.state.unwrap_or_default(),
        request.meta.unwrap_or_default(),
    );

    persist_and_publish(
        &state,
        &code,
        &envelope,
        RoomEvent::state_sync(envelope.clone()),
    )
    .await?;
    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}

#[get("/load/{room_id}")]
pub async fn load_room(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> RoomResult<HttpResponse> {
    let code = normalize_room_id(&path.into_inner())?;
    let envelope = fetch_room(&state, &code).await?;
    Ok(HttpResponse::Ok().json(envelope))
}
