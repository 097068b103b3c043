//! Reference tables: states, electoral votes, and population composition.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::demographics::{ALL_DEMOGRAPHIC_KEYS, Class, DemographicKey, Gender, Race};

const DEFAULT_STATE_DATA: &str = include_str!("../data/states.json");
const COMPOSITION_TOLERANCE: f64 = 0.01;

/// Reference-data mismatches. These indicate broken tables, not game conditions.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DataError {
    #[error("unknown demographic key: {0}")]
    UnknownDemographic(String),
    #[error("unknown issue: {0}")]
    UnknownIssue(String),
    #[error("unknown state code: {0}")]
    UnknownState(String),
    #[error("unknown action type: {0}")]
    UnknownActionType(String),
    #[error("{state} demographic composition sums to {total:.3}%, expected 100%")]
    CompositionSum { state: String, total: f64 },
    #[error("{state} gives {key} a negative share of {share:.3}%")]
    NegativeShare {
        state: String,
        key: DemographicKey,
        share: f64,
    },
    #[error("{state} lists {key} which is not a modeled demographic")]
    UnmodeledDemographic { state: String, key: DemographicKey },
    #[error("duplicate state code: {0}")]
    DuplicateState(String),
    #[error("failed to parse reference data: {0}")]
    Parse(String),
}

/// Race shares in percent. Races outside the modeled segments are folded in by the table author.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RaceShares {
    #[serde(default)]
    pub white: f64,
    #[serde(default)]
    pub black: f64,
    #[serde(default)]
    pub hispanic: f64,
    #[serde(default)]
    pub asian: f64,
}

impl RaceShares {
    const fn share(&self, race: Race) -> f64 {
        match race {
            Race::White => self.white,
            Race::Black => self.black,
            Race::Hispanic => self.hispanic,
            Race::Asian => self.asian,
            Race::NativeAmerican | Race::Other => 0.0,
        }
    }
}

/// Class shares in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ClassShares {
    #[serde(default)]
    pub wealthy: f64,
    #[serde(default)]
    pub middle: f64,
    #[serde(default)]
    pub lower: f64,
}

impl ClassShares {
    const fn share(&self, class: Class) -> f64 {
        match class {
            Class::Wealthy => self.wealthy,
            Class::Middle => self.middle,
            Class::Lower => self.lower,
        }
    }
}

const fn default_female_share() -> f64 {
    50.0
}

/// One row of the state table as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub code: String,
    pub name: String,
    pub electoral_votes: u32,
    #[serde(default)]
    pub house_seats: u32,
    #[serde(default)]
    pub race: RaceShares,
    #[serde(default)]
    pub class: ClassShares,
    #[serde(default = "default_female_share")]
    pub female_share: f64,
    /// Explicit per-segment percentages; replaces the race/class expansion when present.
    #[serde(default)]
    pub composition: Option<BTreeMap<DemographicKey, f64>>,
}

/// A validated state with its expanded population composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateInfo {
    pub code: String,
    pub name: String,
    pub electoral_votes: u32,
    pub house_seats: u32,
    /// Percent of the state population in each modeled segment; sums to 100.
    pub composition: BTreeMap<DemographicKey, f64>,
}

impl StateInfo {
    #[must_use]
    pub fn population_share(&self, key: DemographicKey) -> f64 {
        self.composition.get(&key).copied().unwrap_or(0.0)
    }
}

/// Expand race/class/gender marginals into per-segment shares.
///
/// A race's share in a class that has no modeled segment for that race is
/// folded into its middle-class segment.
fn expand_composition(record: &StateRecord) -> BTreeMap<DemographicKey, f64> {
    let female = record.female_share / 100.0;
    let mut composition = BTreeMap::new();
    for race in Race::ALL {
        let race_share = record.race.share(race);
        if race_share.abs() < f64::EPSILON {
            continue;
        }
        for class in Class::ALL {
            let class_share = record.class.share(class);
            let target_class = if modeled(race, class) {
                class
            } else {
                Class::Middle
            };
            let cell = race_share * class_share / 100.0;
            for (gender, fraction) in [(Gender::Female, female), (Gender::Male, 1.0 - female)] {
                *composition
                    .entry(DemographicKey::new(race, target_class, gender))
                    .or_insert(0.0) += cell * fraction;
            }
        }
    }
    composition
}

fn modeled(race: Race, class: Class) -> bool {
    ALL_DEMOGRAPHIC_KEYS
        .iter()
        .any(|key| key.race == race && key.class == class)
}

impl TryFrom<StateRecord> for StateInfo {
    type Error = DataError;

    fn try_from(record: StateRecord) -> Result<Self, Self::Error> {
        let composition = match &record.composition {
            Some(explicit) => explicit.clone(),
            None => expand_composition(&record),
        };
        if let Some(key) = composition
            .keys()
            .find(|key| !ALL_DEMOGRAPHIC_KEYS.contains(key))
        {
            return Err(DataError::UnmodeledDemographic {
                state: record.code,
                key: *key,
            });
        }
        if let Some((key, share)) = composition.iter().find(|(_, share)| **share < 0.0) {
            return Err(DataError::NegativeShare {
                state: record.code,
                key: *key,
                share: *share,
            });
        }
        let total: f64 = composition.values().sum();
        if (total - 100.0).abs() > COMPOSITION_TOLERANCE {
            return Err(DataError::CompositionSum {
                state: record.code,
                total,
            });
        }
        Ok(Self {
            code: record.code,
            name: record.name,
            electoral_votes: record.electoral_votes,
            house_seats: record.house_seats,
            composition,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct StateFile {
    states: Vec<StateRecord>,
}

/// All states keyed by postal code, in table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StateTable {
    states: Vec<StateInfo>,
}

impl StateTable {
    /// Validate and index a list of state records.
    ///
    /// # Errors
    ///
    /// Returns `DataError` for duplicate codes or compositions that do not sum to 100%.
    pub fn from_records(records: Vec<StateRecord>) -> Result<Self, DataError> {
        let mut states: Vec<StateInfo> = Vec::with_capacity(records.len());
        for record in records {
            if states.iter().any(|s| s.code == record.code) {
                return Err(DataError::DuplicateState(record.code));
            }
            states.push(StateInfo::try_from(record)?);
        }
        Ok(Self { states })
    }

    /// Parse a `{ "states": [...] }` document.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Parse` for malformed JSON or any validation error.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let file: StateFile =
            serde_json::from_str(json).map_err(|err| DataError::Parse(err.to_string()))?;
        Self::from_records(file.states)
    }

    /// The embedded 50 states plus DC.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the embedded table is inconsistent.
    pub fn load_from_static() -> Result<Self, DataError> {
        Self::from_json(DEFAULT_STATE_DATA)
    }

    /// Look up a state, failing on unknown codes.
    ///
    /// # Errors
    ///
    /// Returns `DataError::UnknownState` when `code` is not in the table.
    pub fn get(&self, code: &str) -> Result<&StateInfo, DataError> {
        self.states
            .iter()
            .find(|s| s.code == code)
            .ok_or_else(|| DataError::UnknownState(code.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateInfo> {
        self.states.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[must_use]
    pub fn total_electoral_votes(&self) -> u32 {
        self.states.iter().map(|s| s.electoral_votes).sum()
    }

    #[must_use]
    pub fn total_house_seats(&self) -> u32 {
        self.states.iter().map(|s| s.house_seats).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str) -> StateRecord {
        StateRecord {
            code: code.to_string(),
            name: code.to_string(),
            electoral_votes: 10,
            house_seats: 8,
            race: RaceShares {
                white: 60.0,
                black: 20.0,
                hispanic: 15.0,
                asian: 5.0,
            },
            class: ClassShares {
                wealthy: 20.0,
                middle: 50.0,
                lower: 30.0,
            },
            female_share: 51.0,
            composition: None,
        }
    }

    #[test]
    fn expansion_sums_to_one_hundred_and_folds_classes() {
        let state = StateInfo::try_from(record("XX")).unwrap();
        let total: f64 = state.composition.values().sum();
        assert!((total - 100.0).abs() < 1e-9);
        // Black wealthy folds into black middle: 20% * (20% + 50%) = 14%.
        let black_middle = state.population_share("black_middle_female".parse().unwrap())
            + state.population_share("black_middle_male".parse().unwrap());
        assert!((black_middle - 14.0).abs() < 1e-9);
        assert!(state.composition.len() <= ALL_DEMOGRAPHIC_KEYS.len());
    }

    #[test]
    fn bad_shares_are_rejected() {
        let mut bad = record("YY");
        bad.class.lower = 10.0;
        assert!(matches!(
            StateInfo::try_from(bad),
            Err(DataError::CompositionSum { .. })
        ));

        let mut unmodeled = record("ZZ");
        unmodeled.composition = Some(BTreeMap::from([(
            "other_middle_male".parse().unwrap(),
            100.0,
        )]));
        assert!(matches!(
            StateInfo::try_from(unmodeled),
            Err(DataError::UnmodeledDemographic { .. })
        ));
    }

    #[test]
    fn negative_shares_are_rejected_even_when_the_total_balances() {
        let mut explicit = record("NN");
        explicit.composition = Some(BTreeMap::from([
            ("white_middle_male".parse().unwrap(), 110.0),
            ("white_middle_female".parse().unwrap(), -10.0),
        ]));
        assert!(matches!(
            StateInfo::try_from(explicit),
            Err(DataError::NegativeShare { ref state, share, .. }) if state == "NN" && share < 0.0
        ));

        let mut compact = record("NC");
        compact.race.white = 70.0;
        compact.race.black = -10.0;
        compact.race.hispanic = 35.0;
        assert!(matches!(
            StateInfo::try_from(compact),
            Err(DataError::NegativeShare { .. })
        ));
    }

    #[test]
    fn duplicates_and_unknown_codes_fail() {
        assert!(matches!(
            StateTable::from_records(vec![record("AA"), record("AA")]),
            Err(DataError::DuplicateState(_))
        ));
        let table = StateTable::from_records(vec![record("AA")]).unwrap();
        assert!(table.get("AA").is_ok());
        assert!(matches!(table.get("QQ"), Err(DataError::UnknownState(_))));
    }

    #[test]
    fn embedded_table_is_complete() {
        let table = StateTable::load_from_static().unwrap();
        assert_eq!(table.len(), 51);
        assert_eq!(table.total_electoral_votes(), 538);
        assert_eq!(table.total_house_seats(), 435);
        assert_eq!(table.get("CA").unwrap().electoral_votes, 54);
        assert_eq!(table.get("DC").unwrap().house_seats, 0);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            StateTable::from_json("{\"states\": 4}"),
            Err(DataError::Parse(_))
        ));
    }
}
