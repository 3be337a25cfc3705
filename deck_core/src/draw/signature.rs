use std::fmt;

use serde::{Deserialize, Serialize};

use crate::card::{Alea, Card};

pub const SIGNATURE_DELIMITER: &str = "+";

/// 두 뽑기가 같은지 비교하기 위한 정규화 문자열.
///
/// 카드 id 집합을 정렬해 이어 붙이고, 시나리오가 있으면 그 id를 마지막에 붙인다.
/// 한 패에 같은 카드가 두 번 들어가도 서명에는 한 번만 남는다.
/// 표시용이 아니라 동등 비교 전용이다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawSignature(String);

impl DrawSignature {
    pub fn compute(elements: &[Card], alea: Option<&Alea>) -> Self {
        let mut parts: Vec<&str> = elements.iter().map(|c| c.id.as_str()).collect();
        parts.sort_unstable();
        parts.dedup();
        if let Some(alea) = alea {
            parts.push(alea.id.as_str());
        }
        Self(parts.join(SIGNATURE_DELIMITER))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DrawSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DrawSignature {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for DrawSignature {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Category;

    #[test]
    fn signature_ignores_hand_order() {
        let a = Card::new(Category::Sources, "Pile");
        let b = Card::new(Category::Usages, "Alarme");
        let alea = Alea::new("Canicule");

        let s1 = DrawSignature::compute(&[a.clone(), b.clone()], Some(&alea));
        let s2 = DrawSignature::compute(&[b, a], Some(&alea));
        assert_eq!(s1, s2);
        assert_eq!(s1.as_str(), "src:pile+use:alarme+alea:canicule");
    }

    #[test]
    fn scenario_is_part_of_signature() {
        let a = Card::new(Category::Sources, "Pile");
        let with = DrawSignature::compute(&[a.clone()], Some(&Alea::new("Canicule")));
        let without = DrawSignature::compute(&[a], None);
        assert_ne!(with, without);
        assert_eq!(without.as_str(), "src:pile");
    }

    #[test]
    fn repeated_card_counts_once() {
        let pile = Card::new(Category::Sources, "Pile");
        let alarme = Card::new(Category::Usages, "Alarme");

        let repeated = DrawSignature::compute(&[pile.clone(), alarme.clone(), pile.clone()], None);
        let distinct = DrawSignature::compute(&[alarme, pile], None);
        assert_eq!(repeated, distinct);
        assert_eq!(repeated.as_str(), "src:pile+use:alarme");
    }
}
