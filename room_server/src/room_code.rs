use rand::Rng;
use tracing::warn;

use crate::errors::{RoomError, RoomResult};
use crate::store::RoomStore;

pub const ROOM_CODE_LEN: usize = 6;
pub const MAX_CODE_ATTEMPTS: usize = 16;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ROOM_CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// 아직 쓰이지 않은 방 코드를 고른다.
pub async fn allocate_code(store: &dyn RoomStore) -> RoomResult<String> {
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        // ThreadRng 는 Send 가 아니므로 await 전에 버린다.
        let code = generate_code(&mut rand::thread_rng());
        if !store.exists(&code).await? {
            return Ok(code);
        }
        warn!("Room code {} already taken (attempt {})", code, attempt);
    }
    Err(RoomError::Storage(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        "could not allocate a free room code",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryRoomStore, RoomEnvelope};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn codes_are_six_upper_alphanumerics() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), ROOM_CODE_LEN);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn allocated_code_is_free() {
        let store = MemoryRoomStore::new();
        let code = allocate_code(&store).await.unwrap();
        assert!(!store.exists(&code).await.unwrap());

        store
            .put(&code, &RoomEnvelope::new(code.clone(), "Lynx"))
            .await
            .unwrap();
        let other = allocate_code(&store).await.unwrap();
        assert_ne!(other, code);
    }
}
