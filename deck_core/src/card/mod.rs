pub mod identity;
pub mod types;

pub use identity::{alea_id, card_id, slug};
pub use types::{Alea, Card, Category};
