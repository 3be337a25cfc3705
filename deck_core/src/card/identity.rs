use super::types::Category;

/// 악센트 문자 → ASCII 치환표. 저장된 방(room) 안의 카드 id가 이 표에 의존하므로
/// 항목을 바꾸면 기존 저장본과의 비교가 깨진다.
const ACCENT_MAP: &[(char, char)] = &[
    ('é', 'e'),
    ('è', 'e'),
    ('ê', 'e'),
    ('ë', 'e'),
    ('à', 'a'),
    ('â', 'a'),
    ('ä', 'a'),
    ('ô', 'o'),
    ('ö', 'o'),
    ('ù', 'u'),
    ('û', 'u'),
    ('ü', 'u'),
    ('ï', 'i'),
    ('î', 'i'),
    ('ç', 'c'),
];

pub const ALEA_PREFIX: &str = "alea";

fn fold_accent(ch: char) -> char {
    ACCENT_MAP
        .iter()
        .find(|(from, _)| *from == ch)
        .map(|(_, to)| *to)
        .unwrap_or(ch)
}

/// 라벨을 id에 쓸 수 있는 slug로 변환한다.
///
/// 소문자화 → 악센트 제거 → `[a-z0-9- ]` 밖의 문자는 `-` → 공백은 `-` →
/// 연속된 `-`는 하나로 → 앞뒤 `-` 제거.
///
/// ```
/// use deck_core::card::identity::slug;
/// assert_eq!(slug("Capteur d'humidité"), "capteur-d-humidite");
/// assert_eq!(slug(" Wi-Fi  "), "wi-fi");
/// ```
pub fn slug(label: &str) -> String {
    let mut out = String::with_capacity(label.len());

    for ch in label.chars().flat_map(char::to_lowercase) {
        let ch = fold_accent(ch);
        let mapped = match ch {
            'a'..='z' | '0'..='9' | '-' => ch,
            _ => '-',
        };

        // 연속 하이픈은 하나로 접는다.
        if mapped == '-' && out.ends_with('-') {
            continue;
        }
        out.push(mapped);
    }

    out.trim_matches('-').to_string()
}

pub fn card_id(category: Category, label: &str) -> String {
    format!("{}:{}", category.prefix(), slug(label))
}

pub fn alea_id(label: &str) -> String {
    format!("{}:{}", ALEA_PREFIX, slug(label))
}
