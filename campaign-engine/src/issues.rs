//! Political issues and issue-position profiles.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::{ALIGNMENT_DISTANCE_SCALE, ISSUE_POSITION_LIMIT, NEUTRAL_IMPORTANCE};
use crate::data::DataError;

/// Positions run from -5 (progressive) to +5 (conservative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Issue {
    Healthcare,
    Immigration,
    Taxes,
    Environment,
    Guns,
    Abortion,
    Military,
    Education,
    SocialSecurity,
    CriminalJustice,
    Trade,
    MinimumWage,
}

impl Issue {
    pub const ALL: [Self; 12] = [
        Self::Healthcare,
        Self::Immigration,
        Self::Taxes,
        Self::Environment,
        Self::Guns,
        Self::Abortion,
        Self::Military,
        Self::Education,
        Self::SocialSecurity,
        Self::CriminalJustice,
        Self::Trade,
        Self::MinimumWage,
    ];

    /// Issues averaged into a group's social position.
    pub const SOCIAL: [Self; 4] = [
        Self::Abortion,
        Self::Guns,
        Self::Immigration,
        Self::CriminalJustice,
    ];

    /// Issues averaged into a group's economic position.
    pub const ECONOMIC: [Self; 5] = [
        Self::Taxes,
        Self::MinimumWage,
        Self::Healthcare,
        Self::SocialSecurity,
        Self::Trade,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthcare => "healthcare",
            Self::Immigration => "immigration",
            Self::Taxes => "taxes",
            Self::Environment => "environment",
            Self::Guns => "guns",
            Self::Abortion => "abortion",
            Self::Military => "military",
            Self::Education => "education",
            Self::SocialSecurity => "social_security",
            Self::CriminalJustice => "criminal_justice",
            Self::Trade => "trade",
            Self::MinimumWage => "minimum_wage",
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Issue {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|issue| issue.as_str() == s)
            .ok_or_else(|| DataError::UnknownIssue(s.to_string()))
    }
}

/// Where someone stands on one issue and how much they care.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IssueStance {
    pub position: f64,
    pub importance: f64,
}

impl Default for IssueStance {
    fn default() -> Self {
        Self {
            position: 0.0,
            importance: NEUTRAL_IMPORTANCE,
        }
    }
}

impl IssueStance {
    /// Clamp position to `[-5, 5]` and importance to `[0, 1]`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            position: self.position.clamp(-ISSUE_POSITION_LIMIT, ISSUE_POSITION_LIMIT),
            importance: self.importance.clamp(0.0, 1.0),
        }
    }
}

/// Positions and weights across every tracked issue. Missing issues read as neutral.
///
/// Serialized as a plain issue map; deserialized stances are clamped like
/// every other write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(
    from = "BTreeMap<Issue, IssueStance>",
    into = "BTreeMap<Issue, IssueStance>"
)]
pub struct IssueProfile {
    stances: BTreeMap<Issue, IssueStance>,
}

impl From<BTreeMap<Issue, IssueStance>> for IssueProfile {
    fn from(stances: BTreeMap<Issue, IssueStance>) -> Self {
        Self {
            stances: stances
                .into_iter()
                .map(|(issue, stance)| (issue, stance.clamped()))
                .collect(),
        }
    }
}

impl From<IssueProfile> for BTreeMap<Issue, IssueStance> {
    fn from(profile: IssueProfile) -> Self {
        profile.stances
    }
}

impl IssueProfile {
    /// Every issue at position 0 with neutral importance.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            stances: Issue::ALL
                .into_iter()
                .map(|issue| (issue, IssueStance::default()))
                .collect(),
        }
    }

    /// Build a profile from explicit `(issue, position, importance)` triples.
    #[must_use]
    pub fn from_positions(entries: &[(Issue, f64, f64)]) -> Self {
        let mut profile = Self::neutral();
        for &(issue, position, importance) in entries {
            profile.set(
                issue,
                IssueStance {
                    position,
                    importance,
                },
            );
        }
        profile
    }

    #[must_use]
    pub fn stance(&self, issue: Issue) -> IssueStance {
        self.stances.get(&issue).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn position(&self, issue: Issue) -> f64 {
        self.stance(issue).position
    }

    #[must_use]
    pub fn importance(&self, issue: Issue) -> f64 {
        self.stance(issue).importance
    }

    /// Replace a stance, clamping it into its domain.
    pub fn set(&mut self, issue: Issue, stance: IssueStance) {
        self.stances.insert(issue, stance.clamped());
    }

    /// Additively shift position and importance, clamping the result.
    pub fn adjust(&mut self, issue: Issue, position_delta: f64, importance_delta: f64) {
        let current = self.stance(issue);
        self.set(
            issue,
            IssueStance {
                position: current.position + position_delta,
                importance: current.importance + importance_delta,
            },
        );
    }

    /// Importance-weighted mean position over `issues`, 0 when nothing matters.
    #[must_use]
    pub fn weighted_position(&self, issues: &[Issue]) -> f64 {
        let (sum, weight) = issues.iter().fold((0.0, 0.0), |(sum, weight), &issue| {
            let stance = self.stance(issue);
            (
                sum + stance.position * stance.importance,
                weight + stance.importance,
            )
        });
        if weight > 0.0 { sum / weight } else { 0.0 }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Issue, IssueStance)> + '_ {
        Issue::ALL.into_iter().map(|issue| (issue, self.stance(issue)))
    }
}

/// Agreement on a single issue: 100 when identical, 0 at a distance of 10.
#[must_use]
pub fn single_issue_alignment(candidate_position: f64, voter_position: f64) -> f64 {
    (100.0 - (candidate_position - voter_position).abs() * ALIGNMENT_DISTANCE_SCALE).max(0.0)
}

/// Importance-weighted alignment between a candidate and a voter, in `[0, 100]`.
///
/// Weights come from the voter. A voter who cares about nothing scores 50.
#[must_use]
pub fn issue_alignment(candidate: &IssueProfile, voter: &IssueProfile) -> f64 {
    let (sum, weight) = Issue::ALL
        .into_iter()
        .fold((0.0, 0.0), |(sum, weight), issue| {
            let voter_stance = voter.stance(issue);
            let alignment = single_issue_alignment(candidate.position(issue), voter_stance.position);
            (
                sum + alignment * voter_stance.importance,
                weight + voter_stance.importance,
            )
        });
    if weight > 0.0 {
        (sum / weight).clamp(0.0, 100.0)
    } else {
        50.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_profile_covers_every_issue() {
        let profile = IssueProfile::neutral();
        assert_eq!(profile.iter().count(), Issue::ALL.len());
        assert!(profile.position(Issue::Trade).abs() < f64::EPSILON);
        assert!((profile.importance(Issue::Trade) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn deserialized_stances_are_clamped() {
        let profile: IssueProfile = serde_json::from_str(
            r#"{"guns": {"position": 12.0, "importance": 3.0}, "trade": {"position": -9.5, "importance": -1.0}}"#,
        )
        .unwrap();
        assert!((profile.position(Issue::Guns) - 5.0).abs() < f64::EPSILON);
        assert!((profile.importance(Issue::Guns) - 1.0).abs() < f64::EPSILON);
        assert!((profile.position(Issue::Trade) + 5.0).abs() < f64::EPSILON);
        assert!(profile.importance(Issue::Trade).abs() < f64::EPSILON);

        let json = serde_json::to_value(&profile).unwrap();
        assert!((json["guns"]["position"].as_f64().unwrap() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn adjustments_clamp() {
        let mut profile = IssueProfile::neutral();
        profile.adjust(Issue::Guns, 9.0, 2.0);
        assert!((profile.position(Issue::Guns) - 5.0).abs() < f64::EPSILON);
        assert!((profile.importance(Issue::Guns) - 1.0).abs() < f64::EPSILON);
        profile.adjust(Issue::Guns, -20.0, -5.0);
        assert!((profile.position(Issue::Guns) + 5.0).abs() < f64::EPSILON);
        assert!(profile.importance(Issue::Guns).abs() < f64::EPSILON);
    }

    #[test]
    fn single_issue_alignment_maps_distance() {
        assert!((single_issue_alignment(2.0, 2.0) - 100.0).abs() < f64::EPSILON);
        assert!((single_issue_alignment(-5.0, 5.0)).abs() < f64::EPSILON);
        assert!((single_issue_alignment(0.0, 2.5) - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn alignment_weights_by_voter_importance() {
        let voter = IssueProfile::from_positions(&[
            (Issue::Taxes, 4.0, 1.0),
            (Issue::Healthcare, -4.0, 0.0),
        ]);
        let mut zeroed = voter.clone();
        for issue in Issue::ALL {
            if issue != Issue::Taxes && issue != Issue::Healthcare {
                zeroed.set(issue, IssueStance { position: 0.0, importance: 0.0 });
            }
        }
        let candidate = IssueProfile::from_positions(&[
            (Issue::Taxes, 4.0, 1.0),
            (Issue::Healthcare, 4.0, 1.0),
        ]);
        assert!((issue_alignment(&candidate, &zeroed) - 100.0).abs() < 1e-9);

        let apathetic = IssueProfile::from_positions(
            &Issue::ALL.map(|issue| (issue, 0.0, 0.0)),
        );
        assert!((issue_alignment(&candidate, &apathetic) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn issue_keys_parse() {
        assert_eq!("social_security".parse::<Issue>().unwrap(), Issue::SocialSecurity);
        assert!("crypto".parse::<Issue>().is_err());
    }

    #[test]
    fn weighted_position_uses_importance() {
        let profile = IssueProfile::from_positions(&[
            (Issue::Abortion, 4.0, 1.0),
            (Issue::Guns, -4.0, 0.0),
            (Issue::Immigration, 0.0, 0.0),
            (Issue::CriminalJustice, 0.0, 0.0),
        ]);
        assert!((profile.weighted_position(&Issue::SOCIAL) - 4.0).abs() < 1e-9);
    }
}
