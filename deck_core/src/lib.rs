//! 카드 카탈로그, 카드 id, 시나리오 선호 표, 제약 조건 뽑기 엔진.
//!
//! 서버와 무관한 순수 로직만 둔다. 방 상태 저장이나 이벤트 전파는 `room_server` 쪽 책임이다.

pub mod card;
pub mod catalog;
pub mod draw;
pub mod errors;
pub mod preferences;

pub use card::{Alea, Card, Category};
pub use catalog::DeckCatalog;
pub use draw::{DrawEngine, DrawOutcome, DrawRequest, DrawSignature, Proposal};
pub use errors::{DeckError, DeckResult};
pub use preferences::PreferenceTable;
