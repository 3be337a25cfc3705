use deck_core::{Alea, Card, Proposal};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{RoomError, RoomResult};
use crate::store::{RoomEnvelope, StatePatch};

// ===== SSE 이벤트 =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StateSync,
    DrawsUpdated,
    DrawChosen,
    Presence,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::StateSync => "state_sync",
            EventKind::DrawsUpdated => "draws_updated",
            EventKind::DrawChosen => "draw_chosen",
            EventKind::Presence => "presence",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub client: String,
    pub name: String,
}

/// 방 구독자에게 나가는 이벤트. 페이로드는 `data:` 줄에 JSON 으로 실린다.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    StateSync(Box<RoomEnvelope>),
    DrawsUpdated { proposals: Vec<Proposal> },
    DrawChosen { index: usize, proposal: Proposal },
    Presence { clients: Vec<PresenceEntry> },
}

#[derive(Serialize)]
struct DrawsUpdatedData<'a> {
    proposals: &'a [Proposal],
}

#[derive(Serialize)]
struct DrawChosenData<'a> {
    index: usize,
    proposal: &'a Proposal,
}

#[derive(Serialize)]
struct PresenceData<'a> {
    clients: &'a [PresenceEntry],
}

impl RoomEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RoomEvent::StateSync(_) => EventKind::StateSync,
            RoomEvent::DrawsUpdated { .. } => EventKind::DrawsUpdated,
            RoomEvent::DrawChosen { .. } => EventKind::DrawChosen,
            RoomEvent::Presence { .. } => EventKind::Presence,
        }
    }

    pub fn state_sync(envelope: RoomEnvelope) -> Self {
        RoomEvent::StateSync(Box::new(envelope))
    }

    pub fn data(&self) -> Result<Value, serde_json::Error> {
        match self {
            RoomEvent::StateSync(envelope) => serde_json::to_value(envelope.as_ref()),
            RoomEvent::DrawsUpdated { proposals } => {
                serde_json::to_value(DrawsUpdatedData { proposals })
            }
            RoomEvent::DrawChosen { index, proposal } => serde_json::to_value(DrawChosenData {
                index: *index,
                proposal,
            }),
            RoomEvent::Presence { clients } => serde_json::to_value(PresenceData { clients }),
        }
    }

    /// `event: <kind>\ndata: <json>\n\n`
    pub fn to_sse_frame(&self) -> Result<String, serde_json::Error> {
        let data = serde_json::to_string(&self.data()?)?;
        Ok(format!("event: {}\ndata: {}\n\n", self.kind(), data))
    }
}

pub const KEEPALIVE_FRAME: &str = ": keepalive\n\n";

// ===== 요청 본문 =====

/// 클라이언트는 본문 없이 POST 하기도 한다. 비어 있으면 기본값.
pub fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> RoomResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| RoomError::invalid_input(format!("JSON invalide: {}", e)))
}

#[derive(Debug, Deserialize, Default)]
pub struct CreateRequest {
    #[serde(default)]
    pub team: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    #[serde(default)]
    pub room_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub state: Option<StatePatch>,
    #[serde(default)]
    pub meta: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SyncRequest {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub state: Option<StatePatch>,
    #[serde(default)]
    pub meta: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DrawRequestBody {
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub sequences: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RoomDrawBody {
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub sequences: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ChooseDrawRequest {
    #[serde(default)]
    pub index: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StreamQuery {
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

// ===== 응답 본문 =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomIdResponse {
    pub room_id: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Serialize)]
pub struct RoomDrawResponse {
    pub ok: bool,
    pub proposals: Vec<Proposal>,
}

/// `/api/draw` 응답: 후보 하나를 요청하면 펼친 모양, 여럿이면 목록.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PreviewDrawResponse {
    Single {
        elements: Vec<Card>,
        alea: Option<Alea>,
    },
    Many {
        proposals: Vec<Proposal>,
    },
}

impl PreviewDrawResponse {
    pub fn new(sequences: usize, mut proposals: Vec<Proposal>) -> Self {
        if sequences <= 1 {
            match proposals.pop() {
                Some(Proposal { elements, alea }) => Self::Single { elements, alea },
                None => Self::Single {
                    elements: Vec::new(),
                    alea: None,
                },
            }
        } else {
            Self::Many { proposals }
        }
    }
}
