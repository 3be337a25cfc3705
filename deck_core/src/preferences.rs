use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::card::{alea_id, card_id, Category};
use crate::catalog::DeckCatalog;

type BuiltinEntry = (&'static str, &'static [(Category, &'static [&'static str])]);

/// 기본 덱(deck.json)에 맞춰 손으로 작성한 시나리오별 "도움이 되는" 카드 목록.
const BUILTIN: &[BuiltinEntry] = &[
    (
        "Panne de courant",
        &[
            (
                Category::Sources,
                &["Batterie", "Panneau solaire", "Supercondensateur", "Pile", "Dynamo"],
            ),
            (Category::Processing, &["Microcontrôleur"]),
            (Category::Communication, &["LoRa"]),
            (Category::Usages, &["Éclairage public"]),
        ],
    ),
    (
        "Canicule",
        &[
            (Category::Sources, &["Panneau solaire"]),
            (
                Category::SensorsActuators,
                &["Capteur de température", "Pompe"],
            ),
            (Category::Usages, &["Arrosage intelligent", "Serre automatisée"]),
        ],
    ),
    (
        "Inondation",
        &[
            (
                Category::SensorsActuators,
                &["Capteur d'humidité", "Pompe", "Buzzer"],
            ),
            (Category::Communication, &["LoRa", "Réseau 4G"]),
            (Category::Usages, &["Alarme", "Station météo"]),
        ],
    ),
    (
        "Perte de réseau",
        &[
            (Category::Communication, &["LoRa", "Câble Ethernet", "Zigbee"]),
            (
                Category::Processing,
                &["Microcontrôleur", "Carte Arduino", "Automate programmable"],
            ),
        ],
    ),
    (
        "Vol de matériel",
        &[
            (
                Category::SensorsActuators,
                &["Détecteur de mouvement", "Caméra", "Buzzer"],
            ),
            (Category::Communication, &["RFID", "Réseau 4G"]),
            (Category::Usages, &["Alarme"]),
        ],
    ),
    (
        "Gel hivernal",
        &[
            (Category::Sources, &["Secteur 230 V", "Batterie"]),
            (Category::SensorsActuators, &["Capteur de température"]),
            (Category::Usages, &["Serre automatisée", "Station météo"]),
        ],
    ),
    (
        "Batterie faible",
        &[
            (
                Category::Sources,
                &["Panneau solaire", "Dynamo", "Éolienne", "Supercondensateur"],
            ),
            (Category::Processing, &["Microcontrôleur"]),
            (Category::Communication, &["Bluetooth", "Zigbee", "LoRa"]),
        ],
    ),
    (
        "Surcharge de données",
        &[
            (
                Category::Processing,
                &["Serveur cloud", "Ordinateur", "Raspberry Pi"],
            ),
            (Category::Communication, &["Câble Ethernet", "Réseau 4G"]),
        ],
    ),
];

/// 시나리오 → 선호 카드 id 집합.
///
/// 키는 시나리오 라벨의 `alea:` id 이므로 대소문자/악센트 차이는 같은 시나리오로 본다.
/// 카탈로그에 없는 카드 id는 생성 시점에 걸러진다.
#[derive(Debug, Clone, Default)]
pub struct PreferenceTable {
    by_scenario: HashMap<String, HashSet<String>>,
    empty: HashSet<String>,
}

impl PreferenceTable {
    /// 덱 파일에 `preferences` 섹션이 있으면 그것을, 없으면 내장 표를 쓴다.
    pub fn for_catalog(catalog: &DeckCatalog) -> Self {
        match catalog.preference_source() {
            Some(source) => {
                let entries = source.iter().map(|(scenario, by_category)| {
                    let cards = by_category
                        .iter()
                        .filter_map(|(key, labels)| match Category::from_catalog_key(key) {
                            Some(category) => Some((category, labels)),
                            None => {
                                warn!(
                                    "Unknown category {:?} in preferences for {:?}",
                                    key, scenario
                                );
                                None
                            }
                        })
                        .flat_map(|(category, labels)| {
                            labels.iter().map(move |label| (category, label.clone()))
                        })
                        .collect::<Vec<_>>();
                    (scenario.clone(), cards)
                });
                Self::from_entries(entries, catalog)
            }
            None => Self::builtin(catalog),
        }
    }

    pub fn builtin(catalog: &DeckCatalog) -> Self {
        let entries = BUILTIN.iter().map(|(scenario, groups)| {
            let cards = groups
                .iter()
                .flat_map(|(category, labels)| {
                    labels.iter().map(move |label| (*category, label.to_string()))
                })
                .collect::<Vec<_>>();
            (scenario.to_string(), cards)
        });
        Self::from_entries(entries, catalog)
    }

    pub fn from_entries<I>(entries: I, catalog: &DeckCatalog) -> Self
    where
        I: IntoIterator<Item = (String, Vec<(Category, String)>)>,
    {
        let live = catalog.card_ids();
        let mut by_scenario: HashMap<String, HashSet<String>> = HashMap::new();

        for (scenario, cards) in entries {
            let ids = by_scenario.entry(alea_id(&scenario)).or_default();
            for (category, label) in cards {
                let id = card_id(category, &label);
                if live.contains(id.as_str()) {
                    ids.insert(id);
                } else {
                    debug!("Preference {} for {:?} not in catalog, dropped", id, scenario);
                }
            }
        }

        Self {
            by_scenario,
            empty: HashSet::new(),
        }
    }

    /// 시나리오가 없거나 모르는 시나리오면 빈 집합.
    pub fn preferences_for(&self, scenario_label: Option<&str>) -> &HashSet<String> {
        scenario_label
            .and_then(|label| self.by_scenario.get(&alea_id(label)))
            .unwrap_or(&self.empty)
    }

    pub fn scenario_count(&self) -> usize {
        self.by_scenario.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> DeckCatalog {
        DeckCatalog::from_parts(
            &[
                (Category::Sources, &["Batterie", "Pile"][..]),
                (Category::SensorsActuators, &["Pompe", "Buzzer"][..]),
                (Category::Usages, &["Alarme"][..]),
            ],
            &["Inondation", "Panne de courant"],
        )
    }

    #[test]
    fn unknown_or_missing_scenario_yields_empty_set() {
        let table = PreferenceTable::builtin(&catalog());
        assert!(table.preferences_for(None).is_empty());
        assert!(table.preferences_for(Some("Tempête solaire")).is_empty());
    }

    #[test]
    fn builtin_entries_are_filtered_against_catalog() {
        let table = PreferenceTable::builtin(&catalog());

        let flood = table.preferences_for(Some("Inondation"));
        let mut ids: Vec<&str> = flood.iter().map(String::as_str).collect();
        ids.sort();
        // "Capteur d'humidité", LoRa 등은 이 카탈로그에 없으므로 빠진다.
        assert_eq!(ids, vec!["cap:buzzer", "cap:pompe", "use:alarme"]);

        let outage = table.preferences_for(Some("Panne de courant"));
        assert!(outage.contains("src:batterie"));
        assert!(outage.contains("src:pile"));
        assert!(!outage.contains("src:panneau-solaire"));
    }

    #[test]
    fn lookup_ignores_case_and_accents() {
        let table = PreferenceTable::builtin(&catalog());
        assert_eq!(
            table.preferences_for(Some("INONDATION")),
            table.preferences_for(Some("Inondation"))
        );
    }

    #[test]
    fn deck_preferences_override_builtin() {
        let deck = DeckCatalog::from_json_str(
            r#"{
                "categories": { "Sources": ["Pile", "Batterie"], "Usages": ["Alarme"] },
                "aleas": ["Inondation"],
                "preferences": {
                    "Inondation": { "Sources": ["Pile"], "Nope": ["x"] }
                }
            }"#,
        )
        .unwrap();
        let table = PreferenceTable::for_catalog(&deck);
        let ids = table.preferences_for(Some("Inondation"));
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("src:pile"));
    }
}
