use chrono::{DateTime, Utc};
use deck_core::Proposal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{RoomError, RoomResult};

/// 방 하나의 저장 단위. Room Store 만 이 값을 소유하고,
/// 핸들러는 요청마다 읽고-병합하고-쓴다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RoomEnvelope {
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub state: RoomState,
    #[serde(default)]
    pub meta: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_draw_sig: Option<String>,
}

/// 보드 상태. `blocks`/`links` 는 클라이언트 소유라 내용을 해석하지 않는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RoomState {
    #[serde(default)]
    pub blocks: Vec<Value>,
    #[serde(default)]
    pub links: Vec<Value>,
    #[serde(default)]
    pub draws: DrawState,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 클라이언트가 보내는 상태. `draws` 가 빠져 있으면 저장된 뽑기를 유지한다.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct StatePatch {
    #[serde(default)]
    pub blocks: Vec<Value>,
    #[serde(default)]
    pub links: Vec<Value>,
    #[serde(default)]
    pub draws: Option<DrawState>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", from = "DrawStateWire")]
pub struct DrawState {
    pub proposals: Vec<Proposal>,
    pub chosen_index: Option<usize>,
}

/// 예전 방은 `draws: []` 로 만들어졌다.
#[derive(Deserialize)]
#[serde(untagged)]
enum DrawStateWire {
    Legacy(Vec<Value>),
    Current {
        #[serde(default)]
        proposals: Vec<Proposal>,
        #[serde(default, rename = "chosenIndex")]
        chosen_index: Option<usize>,
    },
    Null(()),
}

impl From<DrawStateWire> for DrawState {
    fn from(wire: DrawStateWire) -> Self {
        match wire {
            DrawStateWire::Legacy(_) | DrawStateWire::Null(()) => DrawState::default(),
            DrawStateWire::Current {
                proposals,
                chosen_index,
            } => {
                // chosenIndex 는 항상 proposals 범위 안에 있어야 한다.
                let chosen_index = chosen_index.filter(|i| *i < proposals.len());
                DrawState {
                    proposals,
                    chosen_index,
                }
            }
        }
    }
}

impl RoomEnvelope {
    pub fn new(room_id: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            team: Some(team.into()),
            created_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// `/save`: 팀/상태/메타를 통째로 교체한다. 생성 시각과 마지막 뽑기 서명은 유지.
    pub fn apply_save(
        &mut self,
        team: Option<String>,
        state: StatePatch,
        meta: Map<String, Value>,
    ) {
        self.team = team;
        self.replace_state(state);
        self.meta = meta;
        self.saved_at = Some(Utc::now());
    }

    /// `/sync`: 온 필드만 반영한다. `meta` 는 얕게 병합하고 나머지는 교체.
    pub fn apply_sync(
        &mut self,
        team: Option<String>,
        state: Option<StatePatch>,
        meta: Option<Map<String, Value>>,
    ) {
        if let Some(team) = team {
            self.team = Some(team);
        }
        if let Some(state) = state {
            self.replace_state(state);
        }
        if let Some(meta) = meta {
            self.meta.extend(meta);
        }
        self.saved_at = Some(Utc::now());
    }

    fn replace_state(&mut self, patch: StatePatch) {
        let draws = patch
            .draws
            .unwrap_or_else(|| std::mem::take(&mut self.state.draws));
        self.state = RoomState {
            blocks: patch.blocks,
            links: patch.links,
            draws,
            extra: patch.extra,
        };
    }

    /// 방 단위 뽑기 결과 저장. 선택은 초기화된다.
    pub fn record_draw(&mut self, proposals: Vec<Proposal>, lead_signature: Option<String>) {
        self.state.draws = DrawState {
            proposals,
            chosen_index: None,
        };
        if lead_signature.is_some() {
            self.last_draw_sig = lead_signature;
        }
    }

    /// 후보를 고른다. 범위를 벗어나면 아무것도 바꾸지 않고 `InvalidInput`.
    pub fn choose_draw(&mut self, index: i64) -> RoomResult<(usize, Proposal)> {
        let len = self.state.draws.proposals.len();
        let idx = usize::try_from(index)
            .ok()
            .filter(|i| *i < len)
            .ok_or_else(|| {
                RoomError::invalid_input(format!(
                    "index {} hors limites (0..{})",
                    index, len
                ))
            })?;

        let proposal = self.state.draws.proposals[idx].clone();
        self.state.draws.chosen_index = Some(idx);
        let alea = proposal
            .alea
            .as_ref()
            .map(|a| Value::String(a.label.clone()))
            .unwrap_or(Value::Null);
        self.meta.insert("alea".to_string(), alea);
        Ok((idx, proposal))
    }
}
