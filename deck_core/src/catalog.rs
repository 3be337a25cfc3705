use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::card::{Alea, Card, Category};
use crate::errors::{DeckError, DeckResult};

/// 덱 파일의 `preferences` 섹션: 시나리오 라벨 → 카테고리 키 → 카드 라벨 목록.
pub type PreferenceSource = BTreeMap<String, BTreeMap<String, Vec<String>>>;

#[derive(Debug, Deserialize)]
struct DeckDocument {
    #[serde(default)]
    categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    aleas: Vec<String>,
    #[serde(default)]
    preferences: Option<PreferenceSource>,
}

/// 읽기 전용 덱 카탈로그.
///
/// 원본 JSON은 `/deck` 응답을 위해 그대로 보관하고, 카드/시나리오는 로드 시점에
/// 한 번만 id를 계산해 둔다.
#[derive(Debug, Clone)]
pub struct DeckCatalog {
    raw: Value,
    cards: BTreeMap<Category, Vec<Card>>,
    aleas: Vec<Alea>,
    preference_source: Option<PreferenceSource>,
}

impl DeckCatalog {
    pub fn load(path: impl AsRef<Path>) -> DeckResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DeckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&text)?;
        info!(
            "Deck loaded from {}: {} cards, {} aleas",
            path.display(),
            catalog.total_cards(),
            catalog.aleas.len()
        );
        Ok(catalog)
    }

    pub fn from_json_str(text: &str) -> DeckResult<Self> {
        let raw: Value = serde_json::from_str(text)?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> DeckResult<Self> {
        let document: DeckDocument = serde_json::from_value(raw.clone())?;
        Ok(Self::build(raw, document))
    }

    /// 코드에서 직접 카탈로그를 만든다. 원본 JSON도 같은 모양으로 재구성한다.
    pub fn from_parts(categories: &[(Category, &[&str])], aleas: &[&str]) -> Self {
        let mut map = serde_json::Map::new();
        let mut document = DeckDocument {
            categories: BTreeMap::new(),
            aleas: aleas.iter().map(|a| a.to_string()).collect(),
            preferences: None,
        };
        for (category, labels) in categories {
            map.insert(category.catalog_key().to_string(), json!(labels));
            document.categories.insert(
                category.catalog_key().to_string(),
                labels.iter().map(|l| l.to_string()).collect(),
            );
        }
        let raw = json!({ "categories": map, "aleas": aleas });
        Self::build(raw, document)
    }

    fn build(raw: Value, document: DeckDocument) -> Self {
        let mut cards: BTreeMap<Category, Vec<Card>> = BTreeMap::new();
        for (key, labels) in &document.categories {
            let Some(category) = Category::from_catalog_key(key) else {
                debug!("Ignoring unknown deck category: {}", key);
                continue;
            };

            let bucket = cards.entry(category).or_default();
            let mut seen: HashSet<String> = bucket.iter().map(|c| c.id.clone()).collect();
            for label in labels {
                let card = Card::new(category, label.as_str());
                if !seen.insert(card.id.clone()) {
                    warn!(
                        "Duplicate card id {} in category {} (label {:?}), skipped",
                        card.id, category, label
                    );
                    continue;
                }
                bucket.push(card);
            }
        }

        let mut alea_ids = HashSet::new();
        let aleas = document
            .aleas
            .iter()
            .map(|label| Alea::new(label.as_str()))
            .filter(|alea| alea_ids.insert(alea.id.clone()))
            .collect();

        Self {
            raw,
            cards,
            aleas,
            preference_source: document.preferences,
        }
    }

    /// 로드한 그대로의 덱 JSON.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn cards(&self, category: Category) -> &[Card] {
        self.cards.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn aleas(&self) -> &[Alea] {
        &self.aleas
    }

    pub fn all_cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values().flatten()
    }

    pub fn total_cards(&self) -> usize {
        self.cards.values().map(Vec::len).sum()
    }

    pub fn card_ids(&self) -> HashSet<&str> {
        self.all_cards().map(|c| c.id.as_str()).collect()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.all_cards().any(|c| c.id == id)
    }

    pub fn preference_source(&self) -> Option<&PreferenceSource> {
        self.preference_source.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = r#"{
        "categories": {
            "Sources": ["Batterie", "Panneau solaire", "batterie"],
            "Traitement": ["Microcontrôleur"],
            "Puzzles": ["ignored"]
        },
        "aleas": ["Canicule", "Canicule", "Inondation"],
        "title": "kept as-is"
    }"#;

    #[test]
    fn loads_categories_and_skips_unknown_keys() {
        let catalog = DeckCatalog::from_json_str(DECK).unwrap();

        // "batterie" 는 "Batterie" 와 같은 id 이므로 한 번만 남는다.
        let sources: Vec<&str> = catalog
            .cards(Category::Sources)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(sources, vec!["src:batterie", "src:panneau-solaire"]);
        assert_eq!(catalog.cards(Category::Processing).len(), 1);
        assert!(catalog.cards(Category::Usages).is_empty());
        assert_eq!(catalog.total_cards(), 3);

        let aleas: Vec<&str> = catalog.aleas().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(aleas, vec!["alea:canicule", "alea:inondation"]);
    }

    #[test]
    fn raw_document_is_preserved() {
        let catalog = DeckCatalog::from_json_str(DECK).unwrap();
        assert_eq!(catalog.raw()["title"], "kept as-is");
        assert_eq!(catalog.raw()["categories"]["Puzzles"][0], "ignored");
    }

    #[test]
    fn malformed_deck_is_an_error() {
        let err = DeckCatalog::from_json_str(r#"{"categories": 3}"#).unwrap_err();
        assert!(matches!(err, DeckError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DeckCatalog::load("/definitely/not/here/deck.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here/deck.json"));
    }

    #[test]
    fn loads_deck_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.json");
        std::fs::write(&path, DECK).unwrap();

        let catalog = DeckCatalog::load(&path).unwrap();
        assert_eq!(catalog.total_cards(), 3);
        assert_eq!(catalog.aleas().len(), 2);
    }

    #[test]
    fn from_parts_builds_equivalent_catalog() {
        let catalog = DeckCatalog::from_parts(
            &[
                (Category::Sources, &["Pile"][..]),
                (Category::Usages, &["Alarme"][..]),
            ],
            &["Gel hivernal"],
        );
        assert!(catalog.contains_id("src:pile"));
        assert!(catalog.contains_id("use:alarme"));
        assert_eq!(catalog.raw()["categories"]["Sources"][0], "Pile");
        assert_eq!(catalog.aleas()[0].label, "Gel hivernal");
    }
}
