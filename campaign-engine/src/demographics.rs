//! Demographic voter segments: race x class x gender.
//!
//! Each segment starts from a neutral issue profile and is shaped by three
//! additive adjustment tables (race, then class, then gender). The results
//! are reference data: build once, clone and perturb per state as needed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    APPEAL_ALIGNMENT_WEIGHT, APPEAL_AWARENESS_WEIGHT, APPEAL_ENTHUSIASM_DIVISOR,
    APPEAL_SPECIAL_WEIGHT, STATE_VARIATION_SPAN, TURNOUT_MAX, TURNOUT_MIN,
};
use crate::data::DataError;
use crate::issues::{Issue, IssueProfile};
use crate::numbers::clamp_pct;
use crate::seed::seeded_jitter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Race {
    White,
    Black,
    Hispanic,
    Asian,
    NativeAmerican,
    Other,
}

impl Race {
    pub const ALL: [Self; 6] = [
        Self::White,
        Self::Black,
        Self::Hispanic,
        Self::Asian,
        Self::NativeAmerican,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
            Self::Hispanic => "hispanic",
            Self::Asian => "asian",
            Self::NativeAmerican => "native_american",
            Self::Other => "other",
        }
    }

    const fn turnout_modifier(self) -> f64 {
        match self {
            Self::White => 1.05,
            Self::Black => 0.95,
            Self::Hispanic => 0.80,
            Self::Asian => 0.85,
            Self::NativeAmerican => 0.75,
            Self::Other => 0.85,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Class {
    Wealthy,
    Middle,
    Lower,
}

impl Class {
    pub const ALL: [Self; 3] = [Self::Wealthy, Self::Middle, Self::Lower];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wealthy => "wealthy",
            Self::Middle => "middle",
            Self::Lower => "lower",
        }
    }

    const fn base_turnout(self) -> f64 {
        match self {
            Self::Wealthy => 0.75,
            Self::Middle => 0.62,
            Self::Lower => 0.45,
        }
    }

    const fn base_enthusiasm(self) -> f64 {
        match self {
            Self::Wealthy => 55.0,
            Self::Middle => 50.0,
            Self::Lower => 45.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// A `(race, class, gender)` triple, written `white_wealthy_male`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DemographicKey {
    pub race: Race,
    pub class: Class,
    pub gender: Gender,
}

impl DemographicKey {
    #[must_use]
    pub const fn new(race: Race, class: Class, gender: Gender) -> Self {
        Self {
            race,
            class,
            gender,
        }
    }
}

impl fmt::Display for DemographicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.race.as_str(),
            self.class.as_str(),
            self.gender.as_str()
        )
    }
}

impl FromStr for DemographicKey {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || DataError::UnknownDemographic(s.to_string());
        let mut parts = s.rsplitn(3, '_');
        let gender = parts.next().ok_or_else(unknown)?;
        let class = parts.next().ok_or_else(unknown)?;
        let race = parts.next().ok_or_else(unknown)?;
        let race = Race::ALL
            .into_iter()
            .find(|r| r.as_str() == race)
            .ok_or_else(unknown)?;
        let class = Class::ALL
            .into_iter()
            .find(|c| c.as_str() == class)
            .ok_or_else(unknown)?;
        let gender = Gender::ALL
            .into_iter()
            .find(|g| g.as_str() == gender)
            .ok_or_else(unknown)?;
        Ok(Self::new(race, class, gender))
    }
}

impl TryFrom<String> for DemographicKey {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DemographicKey> for String {
    fn from(value: DemographicKey) -> Self {
        value.to_string()
    }
}

const fn key(race: Race, class: Class, gender: Gender) -> DemographicKey {
    DemographicKey::new(race, class, gender)
}

/// The 18 segments the model instantiates.
pub const ALL_DEMOGRAPHIC_KEYS: [DemographicKey; 18] = [
    key(Race::White, Class::Wealthy, Gender::Male),
    key(Race::White, Class::Wealthy, Gender::Female),
    key(Race::White, Class::Middle, Gender::Male),
    key(Race::White, Class::Middle, Gender::Female),
    key(Race::White, Class::Lower, Gender::Male),
    key(Race::White, Class::Lower, Gender::Female),
    key(Race::Black, Class::Middle, Gender::Male),
    key(Race::Black, Class::Middle, Gender::Female),
    key(Race::Black, Class::Lower, Gender::Male),
    key(Race::Black, Class::Lower, Gender::Female),
    key(Race::Hispanic, Class::Middle, Gender::Male),
    key(Race::Hispanic, Class::Middle, Gender::Female),
    key(Race::Hispanic, Class::Lower, Gender::Male),
    key(Race::Hispanic, Class::Lower, Gender::Female),
    key(Race::Asian, Class::Wealthy, Gender::Male),
    key(Race::Asian, Class::Wealthy, Gender::Female),
    key(Race::Asian, Class::Middle, Gender::Male),
    key(Race::Asian, Class::Middle, Gender::Female),
];

/// Classes instantiated for a race, in the order used by composition tables.
#[must_use]
pub fn classes_for_race(race: Race) -> Vec<Class> {
    Class::ALL
        .into_iter()
        .filter(|&class| {
            ALL_DEMOGRAPHIC_KEYS
                .iter()
                .any(|k| k.race == race && k.class == class)
        })
        .collect()
}

// (issue, position delta, importance delta)
type Adjustment = (Issue, f64, f64);

const WHITE_ADJUSTMENTS: &[Adjustment] = &[
    (Issue::Guns, 1.0, 0.1),
    (Issue::Immigration, 0.8, 0.0),
    (Issue::Taxes, 0.5, 0.1),
    (Issue::Abortion, 0.5, 0.0),
];
const BLACK_ADJUSTMENTS: &[Adjustment] = &[
    (Issue::Healthcare, -2.0, 0.2),
    (Issue::CriminalJustice, -3.0, 0.4),
    (Issue::MinimumWage, -2.0, 0.2),
    (Issue::SocialSecurity, -1.0, 0.0),
    (Issue::Guns, -1.0, 0.0),
];
const HISPANIC_ADJUSTMENTS: &[Adjustment] = &[
    (Issue::Immigration, -3.0, 0.4),
    (Issue::Healthcare, -1.5, 0.0),
    (Issue::MinimumWage, -1.5, 0.0),
    (Issue::Abortion, 0.5, 0.0),
    (Issue::Education, 0.0, 0.2),
];
const ASIAN_ADJUSTMENTS: &[Adjustment] = &[
    (Issue::Education, -1.0, 0.3),
    (Issue::Trade, -0.5, 0.1),
    (Issue::Healthcare, -1.0, 0.0),
    (Issue::Immigration, -1.5, 0.0),
];
const NATIVE_AMERICAN_ADJUSTMENTS: &[Adjustment] = &[
    (Issue::Environment, -2.5, 0.3),
    (Issue::Healthcare, -1.5, 0.0),
];

const WEALTHY_ADJUSTMENTS: &[Adjustment] = &[
    (Issue::Taxes, 2.5, 0.3),
    (Issue::MinimumWage, 2.0, 0.0),
    (Issue::Trade, 1.0, 0.2),
    (Issue::Healthcare, 1.0, 0.0),
];
const MIDDLE_ADJUSTMENTS: &[Adjustment] = &[
    (Issue::Taxes, 0.5, 0.0),
    (Issue::Education, -0.5, 0.1),
    (Issue::Healthcare, -0.5, 0.1),
];
const LOWER_ADJUSTMENTS: &[Adjustment] = &[
    (Issue::MinimumWage, -2.5, 0.3),
    (Issue::Healthcare, -2.0, 0.3),
    (Issue::SocialSecurity, -1.5, 0.2),
    (Issue::Taxes, -1.0, 0.0),
];

const MALE_ADJUSTMENTS: &[Adjustment] = &[
    (Issue::Guns, 1.0, 0.1),
    (Issue::Military, 1.0, 0.1),
    (Issue::Abortion, 0.5, 0.0),
];
const FEMALE_ADJUSTMENTS: &[Adjustment] = &[
    (Issue::Abortion, -1.5, 0.3),
    (Issue::Healthcare, -0.5, 0.1),
    (Issue::Education, -0.5, 0.1),
];

const fn race_adjustments(race: Race) -> &'static [Adjustment] {
    match race {
        Race::White => WHITE_ADJUSTMENTS,
        Race::Black => BLACK_ADJUSTMENTS,
        Race::Hispanic => HISPANIC_ADJUSTMENTS,
        Race::Asian => ASIAN_ADJUSTMENTS,
        Race::NativeAmerican => NATIVE_AMERICAN_ADJUSTMENTS,
        Race::Other => &[],
    }
}

const fn class_adjustments(class: Class) -> &'static [Adjustment] {
    match class {
        Class::Wealthy => WEALTHY_ADJUSTMENTS,
        Class::Middle => MIDDLE_ADJUSTMENTS,
        Class::Lower => LOWER_ADJUSTMENTS,
    }
}

const fn gender_adjustments(gender: Gender) -> &'static [Adjustment] {
    match gender {
        Gender::Male => MALE_ADJUSTMENTS,
        Gender::Female => FEMALE_ADJUSTMENTS,
    }
}

/// One voter segment with its issue profile and participation traits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicGroup {
    pub key: DemographicKey,
    pub issues: IssueProfile,
    /// Probability of voting, in `[0.2, 0.95]`.
    pub turnout: f64,
    /// 0-100, 50 is neutral.
    pub enthusiasm: f64,
    pub social_position: f64,
    pub economic_position: f64,
}

impl DemographicGroup {
    /// Build the canonical group for `key`.
    #[must_use]
    pub fn build(key: DemographicKey) -> Self {
        let mut issues = IssueProfile::neutral();
        for table in [
            race_adjustments(key.race),
            class_adjustments(key.class),
            gender_adjustments(key.gender),
        ] {
            for &(issue, position, importance) in table {
                issues.adjust(issue, position, importance);
            }
        }
        let turnout = (key.class.base_turnout() * key.race.turnout_modifier())
            .clamp(TURNOUT_MIN, TURNOUT_MAX);
        Self::from_parts(key, issues, turnout, key.class.base_enthusiasm())
    }

    fn from_parts(key: DemographicKey, issues: IssueProfile, turnout: f64, enthusiasm: f64) -> Self {
        let social_position = issues.weighted_position(&Issue::SOCIAL);
        let economic_position = issues.weighted_position(&Issue::ECONOMIC);
        Self {
            key,
            issues,
            turnout,
            enthusiasm,
            social_position,
            economic_position,
        }
    }

    /// A copy with small seeded position shifts specific to `state_code`.
    #[must_use]
    pub fn perturbed_for_state(&self, state_code: &str) -> Self {
        let mut issues = self.issues.clone();
        for issue in Issue::ALL {
            let shift = seeded_jitter(
                &format!("{state_code}-{}-{issue}", self.key),
                STATE_VARIATION_SPAN,
            );
            issues.adjust(issue, shift, 0.0);
        }
        Self::from_parts(self.key, issues, self.turnout, self.enthusiasm)
    }
}

/// All canonical groups, in `ALL_DEMOGRAPHIC_KEYS` order.
#[must_use]
pub fn build_all_groups() -> Vec<DemographicGroup> {
    ALL_DEMOGRAPHIC_KEYS
        .iter()
        .map(|&key| DemographicGroup::build(key))
        .collect()
}

/// Overall appeal of a candidate to a segment, in `[0, 100]`.
///
/// `special_effects` is the sum of live bonuses (endorsements, scandals,
/// action effects) in points around a neutral 50.
#[must_use]
pub fn calculate_appeal(
    issue_alignment: f64,
    awareness: f64,
    special_effects: f64,
    enthusiasm: f64,
) -> f64 {
    let base = APPEAL_ALIGNMENT_WEIGHT * issue_alignment
        + APPEAL_AWARENESS_WEIGHT * awareness
        + APPEAL_SPECIAL_WEIGHT * (50.0 + special_effects);
    let enthusiasm_modifier = 1.0 + (enthusiasm - 50.0) / APPEAL_ENTHUSIASM_DIVISOR;
    clamp_pct(base * enthusiasm_modifier)
}

/// Share of the total electorate (percentage points) won in one segment.
#[must_use]
pub fn vote_share(population_pct: f64, turnout: f64, appeal: f64) -> f64 {
    population_pct * (turnout * 100.0) * appeal / 10_000.0
}
