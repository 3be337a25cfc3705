use std::fmt;

use serde::{Deserialize, Serialize};

use super::identity::{alea_id, card_id};

/// 카드 카테고리. 덱 파일의 키는 게임 콘텐츠가 쓰는 프랑스어 이름이고,
/// 영어 이름도 별칭으로 받는다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Sources")]
    Sources,
    #[serde(rename = "Traitement", alias = "Processing")]
    Processing,
    #[serde(rename = "Communication")]
    Communication,
    #[serde(rename = "CapteursActionneurs", alias = "SensorsActuators")]
    SensorsActuators,
    #[serde(rename = "Usages")]
    Usages,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Sources,
        Category::Processing,
        Category::Communication,
        Category::SensorsActuators,
        Category::Usages,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            Category::Sources => "src",
            Category::Processing => "trt",
            Category::Communication => "com",
            Category::SensorsActuators => "cap",
            Category::Usages => "use",
        }
    }

    /// 덱 파일에서 쓰는 키.
    pub fn catalog_key(self) -> &'static str {
        match self {
            Category::Sources => "Sources",
            Category::Processing => "Traitement",
            Category::Communication => "Communication",
            Category::SensorsActuators => "CapteursActionneurs",
            Category::Usages => "Usages",
        }
    }

    /// 덱 파일 키 또는 영어 별칭으로부터 카테고리를 찾는다. 모르는 키는 `None`.
    pub fn from_catalog_key(key: &str) -> Option<Self> {
        match key {
            "Sources" => Some(Category::Sources),
            "Traitement" | "Processing" => Some(Category::Processing),
            "Communication" => Some(Category::Communication),
            "CapteursActionneurs" | "SensorsActuators" => Some(Category::SensorsActuators),
            "Usages" => Some(Category::Usages),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_key())
    }
}

/// 덱에서 파생된 불변 카드.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "CardWire", from = "CardWire")]
pub struct Card {
    pub id: String,
    pub label: String,
    pub category: Category,
}

impl Card {
    pub fn new(category: Category, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            id: card_id(category, &label),
            label,
            category,
        }
    }
}

/// 브라우저 클라이언트는 `name`/`cat` 필드를 읽으므로 직렬화 시 함께 내보낸다.
#[derive(Serialize, Deserialize)]
struct CardWire {
    id: String,
    label: String,
    category: Category,
    #[serde(default, skip_deserializing)]
    name: String,
    #[serde(default, skip_deserializing)]
    cat: Option<Category>,
}

impl From<Card> for CardWire {
    fn from(card: Card) -> Self {
        Self {
            name: card.label.clone(),
            cat: Some(card.category),
            id: card.id,
            label: card.label,
            category: card.category,
        }
    }
}

impl From<CardWire> for Card {
    fn from(wire: CardWire) -> Self {
        Self {
            id: wire.id,
            label: wire.label,
            category: wire.category,
        }
    }
}

/// 시나리오(aléa). 카드와 독립적으로 뽑힌다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Alea {
    pub id: String,
    pub label: String,
}

impl Alea {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            id: alea_id(&label),
            label,
        }
    }
}
