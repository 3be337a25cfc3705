use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::card::{Card, Category};
use crate::catalog::DeckCatalog;

/// 슬롯 번호(0부터)별 후보 카테고리.
///
/// 1: Sources, 2: Traitement, 3: Usages, 4: Communication ∪ CapteursActionneurs,
/// 5 이상: Communication ∪ CapteursActionneurs ∪ Usages.
pub fn slot_categories(slot: usize) -> &'static [Category] {
    match slot {
        0 => &[Category::Sources],
        1 => &[Category::Processing],
        2 => &[Category::Usages],
        3 => &[Category::Communication, Category::SensorsActuators],
        _ => &[
            Category::Communication,
            Category::SensorsActuators,
            Category::Usages,
        ],
    }
}

/// 한 번 뽑기 동안 재사용하는 슬롯별 후보 풀.
pub struct SlotPools<'a> {
    pools: Vec<Vec<&'a Card>>,
}

impl<'a> SlotPools<'a> {
    pub fn new(catalog: &'a DeckCatalog, count: usize) -> Self {
        let distinct = count.min(5);
        let pools = (0..distinct)
            .map(|slot| {
                slot_categories(slot)
                    .iter()
                    .flat_map(|category| catalog.cards(*category))
                    .collect()
            })
            .collect();
        Self { pools }
    }

    pub fn pool(&self, slot: usize) -> &[&'a Card] {
        let index = slot.min(self.pools.len().saturating_sub(1));
        self.pools.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// 슬롯 하나를 채운다.
///
/// (풀 ∩ 선호) − 이미 고른 카드 → 풀 − 이미 고른 카드 → 풀 전체 순으로 시도한다.
/// 마지막 단계는 카탈로그가 너무 작을 때만 중복을 허용한다. 풀이 비어 있으면 `None`.
pub fn pick_for_slot<'a, R: Rng + ?Sized>(
    pool: &[&'a Card],
    preferred: &HashSet<String>,
    chosen: &HashSet<&str>,
    rng: &mut R,
) -> Option<&'a Card> {
    if pool.is_empty() {
        return None;
    }

    let favoured: Vec<&'a Card> = pool
        .iter()
        .copied()
        .filter(|c| preferred.contains(&c.id) && !chosen.contains(c.id.as_str()))
        .collect();
    if let Some(card) = favoured.choose(rng) {
        return Some(*card);
    }

    let fresh: Vec<&'a Card> = pool
        .iter()
        .copied()
        .filter(|c| !chosen.contains(c.id.as_str()))
        .collect();
    if let Some(card) = fresh.choose(rng) {
        return Some(*card);
    }

    pool.choose(rng).copied()
}
