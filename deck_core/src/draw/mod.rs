use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::card::{Alea, Card};
use crate::catalog::DeckCatalog;
use crate::preferences::PreferenceTable;

pub mod signature;
pub mod slots;

pub use signature::DrawSignature;
use slots::{pick_for_slot, SlotPools};

pub const DEFAULT_COUNT: usize = 4;
pub const DEFAULT_SEQUENCES: usize = 1;
pub const MIN_ATTEMPTS: usize = 200;
pub const ATTEMPTS_PER_SEQUENCE: usize = 5;

/// 뽑기 후보 하나.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub elements: Vec<Card>,
    pub alea: Option<Alea>,
}

impl Proposal {
    pub fn signature(&self) -> DrawSignature {
        DrawSignature::compute(&self.elements, self.alea.as_ref())
    }
}

/// 손패 크기와 후보 수. 0은 1로 올린다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRequest {
    pub count: usize,
    pub sequences: usize,
}

impl Default for DrawRequest {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            sequences: DEFAULT_SEQUENCES,
        }
    }
}

impl DrawRequest {
    pub fn new(count: usize, sequences: usize) -> Self {
        Self {
            count: count.max(1),
            sequences: sequences.max(1),
        }
    }

    /// 설정된 상한으로 자른다.
    pub fn capped(self, max_count: usize, max_sequences: usize) -> Self {
        Self {
            count: self.count.min(max_count.max(1)),
            sequences: self.sequences.min(max_sequences.max(1)),
        }
    }

    pub fn attempt_budget(&self) -> usize {
        MIN_ATTEMPTS.max(self.sequences.saturating_mul(ATTEMPTS_PER_SEQUENCE))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOutcome {
    pub proposals: Vec<Proposal>,
    pub attempts: usize,
    /// 시도 예산을 다 써서 요청보다 적게 돌려줬는지.
    pub exhausted: bool,
}

impl DrawOutcome {
    /// 첫 후보의 서명. 방의 `lastDrawSig` 로 저장된다.
    pub fn lead_signature(&self) -> Option<DrawSignature> {
        self.proposals.first().map(Proposal::signature)
    }
}

/// 카탈로그와 선호 표를 빌려 쓰는 뽑기 엔진. 상태가 없으므로 호출마다 만들어도 된다.
pub struct DrawEngine<'a> {
    catalog: &'a DeckCatalog,
    preferences: &'a PreferenceTable,
}

impl<'a> DrawEngine<'a> {
    pub fn new(catalog: &'a DeckCatalog, preferences: &'a PreferenceTable) -> Self {
        Self {
            catalog,
            preferences,
        }
    }

    /// `request.sequences` 개의 서로 다른 후보를 만든다.
    ///
    /// 서명이 `previous` 또는 이미 채택한 후보와 같으면 버리고 다시 뽑는다.
    /// 시도 예산(`max(200, sequences * 5)`)을 넘기면 찾은 만큼만 돌려준다.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        request: DrawRequest,
        previous: Option<&str>,
        rng: &mut R,
    ) -> DrawOutcome {
        let request = DrawRequest::new(request.count, request.sequences);
        let budget = request.attempt_budget();
        let pools = SlotPools::new(self.catalog, request.count);

        let mut proposals: Vec<Proposal> = Vec::with_capacity(request.sequences);
        let mut accepted: HashSet<DrawSignature> = HashSet::new();
        let mut attempts = 0;

        while proposals.len() < request.sequences && attempts < budget {
            attempts += 1;

            let proposal = self.build_proposal(&pools, request.count, rng);
            let signature = proposal.signature();

            if previous.is_some_and(|prev| signature == *prev) {
                debug!("Draw attempt {} repeats previous draw, retrying", attempts);
                continue;
            }
            if !accepted.insert(signature) {
                continue;
            }
            proposals.push(proposal);
        }

        let exhausted = proposals.len() < request.sequences;
        if exhausted {
            warn!(
                "Draw attempts exhausted: {}/{} proposals after {} attempts",
                proposals.len(),
                request.sequences,
                attempts
            );
        }

        DrawOutcome {
            proposals,
            attempts,
            exhausted,
        }
    }

    fn build_proposal<R: Rng + ?Sized>(
        &self,
        pools: &SlotPools<'_>,
        count: usize,
        rng: &mut R,
    ) -> Proposal {
        let alea = self.catalog.aleas().choose(rng).cloned();
        let preferred = self
            .preferences
            .preferences_for(alea.as_ref().map(|a| a.label.as_str()));

        let mut elements: Vec<Card> = Vec::with_capacity(count);
        let mut chosen: HashSet<&str> = HashSet::with_capacity(count);

        for slot in 0..count {
            if let Some(card) = pick_for_slot(pools.pool(slot), preferred, &chosen, rng) {
                chosen.insert(card.id.as_str());
                elements.push(card.clone());
            }
        }

        Proposal { elements, alea }
    }
}

/// 한 번 쓰고 버리는 호출용 축약.
pub fn draw<R: Rng + ?Sized>(
    catalog: &DeckCatalog,
    preferences: &PreferenceTable,
    request: DrawRequest,
    previous: Option<&str>,
    rng: &mut R,
) -> Vec<Proposal> {
    DrawEngine::new(catalog, preferences)
        .draw(request, previous, rng)
        .proposals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Category;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tiny_catalog() -> DeckCatalog {
        DeckCatalog::from_parts(
            &[
                (Category::Sources, &["Pile"][..]),
                (Category::Processing, &["Ordinateur"][..]),
                (Category::Usages, &["Alarme"][..]),
                (Category::Communication, &["Wi-Fi"][..]),
            ],
            &["Canicule"],
        )
    }

    #[test]
    fn request_clamps_zero_and_caps() {
        assert_eq!(DrawRequest::new(0, 0), DrawRequest::new(1, 1));
        assert_eq!(
            DrawRequest::new(40, 90).capped(8, 10),
            DrawRequest::new(8, 10)
        );
        assert_eq!(DrawRequest::new(4, 1).attempt_budget(), 200);
        assert_eq!(DrawRequest::new(4, 100).attempt_budget(), 500);
    }

    #[test]
    fn single_possible_hand_exhausts_against_previous() {
        let catalog = tiny_catalog();
        let prefs = PreferenceTable::builtin(&catalog);
        let engine = DrawEngine::new(&catalog, &prefs);
        let mut rng = StdRng::seed_from_u64(3);

        let first = engine.draw(DrawRequest::new(4, 1), None, &mut rng);
        assert_eq!(first.proposals.len(), 1);
        assert!(!first.exhausted);

        let previous = first.lead_signature().unwrap();
        let second = engine.draw(DrawRequest::new(4, 1), Some(previous.as_str()), &mut rng);
        assert!(second.proposals.is_empty());
        assert!(second.exhausted);
        assert_eq!(second.attempts, MIN_ATTEMPTS);
    }

    #[test]
    fn over_sized_hand_repeats_when_catalog_is_too_small() {
        let catalog = tiny_catalog();
        let prefs = PreferenceTable::default();
        let mut rng = StdRng::seed_from_u64(11);

        let proposals = draw(&catalog, &prefs, DrawRequest::new(6, 1), None, &mut rng);
        let hand = &proposals[0].elements;
        assert_eq!(hand.len(), 6);
        // 5번째 이후 슬롯은 Communication ∪ Usages 두 장뿐이라 중복이 강제된다.
        let distinct: HashSet<&str> = hand.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(distinct.len(), 4);
    }

    #[test]
    fn empty_category_skips_its_slot() {
        let catalog = DeckCatalog::from_parts(
            &[
                (Category::Sources, &["Pile", "Batterie"][..]),
                (Category::Usages, &["Alarme"][..]),
            ],
            &[],
        );
        let prefs = PreferenceTable::default();
        let mut rng = StdRng::seed_from_u64(5);

        let proposals = draw(&catalog, &prefs, DrawRequest::new(4, 1), None, &mut rng);
        assert_eq!(proposals[0].elements.len(), 2);
        assert!(proposals[0].alea.is_none());
    }
}
