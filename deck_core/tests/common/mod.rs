use deck_core::{DeckCatalog, PreferenceTable};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// 저장소 루트의 기본 덱.
pub fn default_catalog() -> DeckCatalog {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../deck.json");
    DeckCatalog::load(path).expect("default deck.json should load")
}

pub fn default_setup() -> (DeckCatalog, PreferenceTable) {
    let catalog = default_catalog();
    let prefs = PreferenceTable::for_catalog(&catalog);
    (catalog, prefs)
}

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
