//! Demographic polling: per-segment candidate support aggregated into state
//! and national polls, crosstabs, and electoral-vote projections.
//!
//! Support for one candidate in one segment starts at the candidate's base,
//! then moves with party lean, issue alignment, live campaign effects,
//! charisma, incumbency, and a small seeded noise term.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::actions::ActionResult;
use crate::constants::{
    ALIGNMENT_SUPPORT_SCALE, CHARISMA_BONUS_DIVISOR, COMPETITIVE_MARGIN, DEMOGRAPHIC_NOISE_SPAN,
    ENDORSEMENT_SUPPORT_BONUS, INCUMBENCY_BONUS, LOG_TARGET_POLLING, MEDIA_SUPPORT_FACTOR,
    PARTY_LEAN_FACTOR, SCANDAL_SUPPORT_PENALTY, TIE_EPSILON,
};
use crate::data::{DataError, StateInfo, StateTable};
use crate::demographics::{
    Class, DemographicGroup, DemographicKey, Gender, Race, calculate_appeal, vote_share,
};
use crate::issues::{IssueProfile, issue_alignment};
use crate::numbers::{clamp_pct, usize_to_f64};
use crate::seed::seeded_jitter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Democratic,
    Republican,
    Independent,
}

/// Where a poll was taken.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "code")]
pub enum Geography {
    National,
    State(String),
    District(String),
}

impl Geography {
    #[must_use]
    pub fn state_code(&self) -> Option<&str> {
        match self {
            Self::State(code) => Some(code),
            Self::National | Self::District(_) => None,
        }
    }
}

impl fmt::Display for Geography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::National => f.write_str("national"),
            Self::State(code) => write!(f, "state:{code}"),
            Self::District(code) => write!(f, "district:{code}"),
        }
    }
}

const fn race_lean(race: Race) -> f64 {
    match race {
        Race::White => -8.0,
        Race::Black => 30.0,
        Race::Hispanic => 12.0,
        Race::Asian => 10.0,
        Race::NativeAmerican => 8.0,
        Race::Other => 4.0,
    }
}

const fn class_lean(class: Class) -> f64 {
    match class {
        Class::Wealthy => -6.0,
        Class::Middle => 0.0,
        Class::Lower => 4.0,
    }
}

const fn gender_lean(gender: Gender) -> f64 {
    match gender {
        Gender::Male => -4.0,
        Gender::Female => 4.0,
    }
}

/// Baseline Democratic lean of a segment in points; negative leans Republican.
#[must_use]
pub fn party_lean(key: DemographicKey) -> f64 {
    race_lean(key.race) + class_lean(key.class) + gender_lean(key.gender)
}

/// A candidate as the polling model sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: String,
    pub name: String,
    pub party: Party,
    pub issues: IssueProfile,
    /// Starting support in every segment, 0-100.
    pub base_support: f64,
    /// 0-100, 50 is neutral.
    pub charisma: f64,
    /// Name recognition, 0-100.
    pub awareness: f64,
    #[serde(default)]
    pub incumbent: bool,
}

/// Accumulated live effects for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CandidateEffects {
    /// Untargeted polling movement applied everywhere.
    pub general: f64,
    #[serde(default)]
    pub states: BTreeMap<String, f64>,
    #[serde(default)]
    pub demographics: BTreeMap<DemographicKey, f64>,
    pub endorsements: u32,
    pub scandals: u32,
    pub media: f64,
}

impl CandidateEffects {
    /// Sum of effects that apply to `key`, optionally within one state.
    #[must_use]
    pub fn bonus_for(&self, key: DemographicKey, state_code: Option<&str>) -> f64 {
        let state = state_code
            .and_then(|code| self.states.get(code))
            .copied()
            .unwrap_or(0.0);
        let demographic = self.demographics.get(&key).copied().unwrap_or(0.0);
        self.general
            + state
            + demographic
            + f64::from(self.endorsements) * ENDORSEMENT_SUPPORT_BONUS
            - f64::from(self.scandals) * SCANDAL_SUPPORT_PENALTY
            + self.media * MEDIA_SUPPORT_FACTOR
    }
}

/// Live effects ledger keyed by candidate id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CampaignEffects {
    by_candidate: BTreeMap<String, CandidateEffects>,
}

impl CampaignEffects {
    #[must_use]
    pub fn for_candidate(&self, candidate_id: &str) -> Option<&CandidateEffects> {
        self.by_candidate.get(candidate_id)
    }

    /// Fold an action result into the ledger.
    ///
    /// A targeted result moves only its targets; an untargeted one moves the
    /// candidate everywhere.
    #[must_use]
    pub fn absorb(&self, candidate_id: &str, result: &ActionResult) -> Self {
        let mut next = self.clone();
        let entry = next
            .by_candidate
            .entry(candidate_id.to_string())
            .or_default();
        if result.state_effects.is_empty() && result.demographic_effects.is_empty() {
            entry.general += result.polling_shift;
        }
        for (code, shift) in &result.state_effects {
            *entry.states.entry(code.clone()).or_insert(0.0) += shift;
        }
        for (key, shift) in &result.demographic_effects {
            *entry.demographics.entry(*key).or_insert(0.0) += shift;
        }
        entry.endorsements += u32::from(result.endorsement_triggered);
        entry.scandals += u32::from(result.scandal_triggered);
        entry.media += result.media_boost;
        next
    }

    /// Move a candidate everywhere, as a debate or national buy does.
    #[must_use]
    pub fn with_general_shift(&self, candidate_id: &str, shift: f64) -> Self {
        let mut next = self.clone();
        next.by_candidate
            .entry(candidate_id.to_string())
            .or_default()
            .general += shift;
        next
    }

    /// Move a candidate within one state only.
    #[must_use]
    pub fn with_state_shift(&self, candidate_id: &str, state_code: &str, shift: f64) -> Self {
        let mut next = self.clone();
        *next
            .by_candidate
            .entry(candidate_id.to_string())
            .or_default()
            .states
            .entry(state_code.to_string())
            .or_insert(0.0) += shift;
        next
    }

    fn bonus(&self, candidate_id: &str, key: DemographicKey, state_code: Option<&str>) -> f64 {
        self.for_candidate(candidate_id)
            .map_or(0.0, |effects| effects.bonus_for(key, state_code))
    }
}

/// Support for `candidate` within one segment, in `[0, 100]`.
#[must_use]
pub fn demographic_support(
    candidate: &CandidateProfile,
    group: &DemographicGroup,
    effects: &CampaignEffects,
    state_code: Option<&str>,
    seed: &str,
) -> f64 {
    let lean = party_lean(group.key) * PARTY_LEAN_FACTOR;
    let party_shift = match candidate.party {
        Party::Democratic => lean,
        Party::Republican => -lean,
        Party::Independent => 0.0,
    };
    let alignment = issue_alignment(&candidate.issues, &group.issues);
    let alignment_shift = (alignment / 100.0 - 0.5) * ALIGNMENT_SUPPORT_SCALE;
    let live = effects.bonus(&candidate.id, group.key, state_code);
    let charisma = (candidate.charisma - 50.0) / CHARISMA_BONUS_DIVISOR;
    let incumbency = if candidate.incumbent {
        INCUMBENCY_BONUS
    } else {
        0.0
    };
    let noise = seeded_jitter(
        &format!("{seed}-{}-{}", candidate.id, group.key),
        DEMOGRAPHIC_NOISE_SPAN,
    );
    clamp_pct(
        candidate.base_support + party_shift + alignment_shift + live + charisma + incumbency + noise,
    )
}

/// One segment's row in a poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicBreakdown {
    /// Share of the polled population, percent.
    pub population_share: f64,
    pub turnout: f64,
    pub support: BTreeMap<String, f64>,
    pub appeal: BTreeMap<String, f64>,
}

/// A demographic-model poll result. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicPollSnapshot {
    pub geography: Geography,
    pub taken_at: DateTime<Utc>,
    /// Candidate id to aggregated support; sums to at most 100.
    pub support: BTreeMap<String, f64>,
    pub undecided: f64,
    pub leader: Option<String>,
    /// Lead of the front-runner over the runner-up, in points.
    pub margin: f64,
    /// 1 for a dead heat, 0 once the lead reaches 20 points.
    pub competitiveness: f64,
    pub breakdown: BTreeMap<DemographicKey, DemographicBreakdown>,
}

impl DemographicPollSnapshot {
    #[must_use]
    pub fn support_for(&self, candidate_id: &str) -> f64 {
        self.support.get(candidate_id).copied().unwrap_or(0.0)
    }
}

struct Weighted<'a> {
    group: &'a DemographicGroup,
    population_share: f64,
}

fn build_snapshot(
    candidates: &[CandidateProfile],
    weighted: &[Weighted<'_>],
    effects: &CampaignEffects,
    geography: Geography,
    seed: &str,
    taken_at: DateTime<Utc>,
) -> DemographicPollSnapshot {
    let state_code = geography.state_code().map(str::to_string);
    let mut breakdown = BTreeMap::new();
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut electorate = 0.0;

    for entry in weighted {
        let group = entry.group;
        let mut support = BTreeMap::new();
        let mut appeal = BTreeMap::new();
        for candidate in candidates {
            let value =
                demographic_support(candidate, group, effects, state_code.as_deref(), seed);
            let special = effects.bonus(&candidate.id, group.key, state_code.as_deref());
            appeal.insert(
                candidate.id.clone(),
                calculate_appeal(
                    issue_alignment(&candidate.issues, &group.issues),
                    candidate.awareness,
                    special,
                    group.enthusiasm,
                ),
            );
            *totals.entry(candidate.id.clone()).or_insert(0.0) +=
                vote_share(entry.population_share, group.turnout, value);
            support.insert(candidate.id.clone(), value);
        }
        electorate += entry.population_share * group.turnout;
        breakdown.insert(
            group.key,
            DemographicBreakdown {
                population_share: entry.population_share,
                turnout: group.turnout,
                support,
                appeal,
            },
        );
    }

    // Vote shares are in percent of the whole population; rescale to percent of voters.
    let mut support: BTreeMap<String, f64> = totals
        .into_iter()
        .map(|(id, share)| {
            let pct = if electorate > 0.0 {
                share * 100.0 / electorate
            } else {
                0.0
            };
            (id, clamp_pct(pct))
        })
        .collect();
    let total: f64 = support.values().sum();
    if total > 100.0 {
        for value in support.values_mut() {
            *value *= 100.0 / total;
        }
    }
    let undecided = clamp_pct(100.0 - support.values().sum::<f64>());
    let (leader, margin) = leader_and_margin(&support);
    let competitiveness = (1.0 - margin / COMPETITIVE_MARGIN).max(0.0);

    log::debug!(
        target: LOG_TARGET_POLLING,
        "{geography} poll: leader {leader:?} by {margin:.2}"
    );

    DemographicPollSnapshot {
        geography,
        taken_at,
        support,
        undecided,
        leader,
        margin,
        competitiveness,
        breakdown,
    }
}

/// Front-runner and lead over the runner-up. A dead heat has no leader.
pub(crate) fn leader_and_margin(support: &BTreeMap<String, f64>) -> (Option<String>, f64) {
    let mut ranked: Vec<(&String, f64)> = support.iter().map(|(id, v)| (id, *v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    match ranked.as_slice() {
        [] => (None, 0.0),
        [(id, value)] => (Some((*id).clone()), *value),
        [(first, a), (_, b), ..] => {
            let margin = a - b;
            if margin.abs() <= TIE_EPSILON {
                (None, 0.0)
            } else {
                (Some((*first).clone()), margin)
            }
        }
    }
}

/// Poll one state, weighting each segment by its share of the state population.
///
/// Segment issue positions are perturbed per state before scoring.
#[must_use]
pub fn build_state_poll(
    candidates: &[CandidateProfile],
    state: &StateInfo,
    groups: &[DemographicGroup],
    effects: &CampaignEffects,
    seed: &str,
    taken_at: DateTime<Utc>,
) -> DemographicPollSnapshot {
    let perturbed: Vec<DemographicGroup> = groups
        .iter()
        .map(|group| group.perturbed_for_state(&state.code))
        .collect();
    let weighted: Vec<Weighted<'_>> = perturbed
        .iter()
        .map(|group| Weighted {
            group,
            population_share: state.population_share(group.key),
        })
        .filter(|entry| entry.population_share > 0.0)
        .collect();
    build_snapshot(
        candidates,
        &weighted,
        effects,
        Geography::State(state.code.clone()),
        &format!("{seed}-{}", state.code),
        taken_at,
    )
}

/// Poll the nation with every canonical segment weighted equally.
#[must_use]
pub fn build_national_poll(
    candidates: &[CandidateProfile],
    groups: &[DemographicGroup],
    effects: &CampaignEffects,
    seed: &str,
    taken_at: DateTime<Utc>,
) -> DemographicPollSnapshot {
    let share = if groups.is_empty() {
        0.0
    } else {
        100.0 / usize_to_f64(groups.len())
    };
    let weighted: Vec<Weighted<'_>> = groups
        .iter()
        .map(|group| Weighted {
            group,
            population_share: share,
        })
        .collect();
    build_snapshot(
        candidates,
        &weighted,
        effects,
        Geography::National,
        seed,
        taken_at,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrosstabDimension {
    Race,
    Class,
    Gender,
}

impl CrosstabDimension {
    fn label(self, key: DemographicKey) -> &'static str {
        match self {
            Self::Race => key.race.as_str(),
            Self::Class => key.class.as_str(),
            Self::Gender => key.gender.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrosstabCell {
    pub row: String,
    pub column: String,
    /// Segments averaged into this cell.
    pub groups: usize,
    /// Mean support per candidate across the cell's segments.
    pub support: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crosstab {
    pub rows: CrosstabDimension,
    pub columns: CrosstabDimension,
    pub cells: Vec<CrosstabCell>,
}

/// Group a snapshot's segments by two dimensions and average support per cell.
#[must_use]
pub fn build_crosstab(
    snapshot: &DemographicPollSnapshot,
    rows: CrosstabDimension,
    columns: CrosstabDimension,
) -> Crosstab {
    let mut sums: BTreeMap<(&'static str, &'static str), (usize, BTreeMap<String, f64>)> =
        BTreeMap::new();
    for (key, row) in &snapshot.breakdown {
        let cell = sums
            .entry((rows.label(*key), columns.label(*key)))
            .or_default();
        cell.0 += 1;
        for (candidate, support) in &row.support {
            *cell.1.entry(candidate.clone()).or_insert(0.0) += support;
        }
    }
    let cells = sums
        .into_iter()
        .map(|((row, column), (groups, totals))| CrosstabCell {
            row: row.to_string(),
            column: column.to_string(),
            groups,
            support: totals
                .into_iter()
                .map(|(candidate, total)| (candidate, total / usize_to_f64(groups)))
                .collect(),
        })
        .collect();
    Crosstab {
        rows,
        columns,
        cells,
    }
}

/// Electoral votes each candidate would win if every polled state voted today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ElectoralProjection {
    pub electoral_votes: BTreeMap<String, u32>,
    pub state_leaders: BTreeMap<String, String>,
    /// States polled as dead heats.
    pub uncalled: Vec<String>,
}

/// Assign each polled state's electoral votes to its local leader.
///
/// # Errors
///
/// Returns `DataError::UnknownState` when a snapshot names a state missing from `table`.
pub fn project_electoral_votes(
    state_snapshots: &[DemographicPollSnapshot],
    table: &StateTable,
) -> Result<ElectoralProjection, DataError> {
    let mut projection = ElectoralProjection::default();
    for snapshot in state_snapshots {
        let Some(code) = snapshot.geography.state_code() else {
            continue;
        };
        let state = table.get(code)?;
        match &snapshot.leader {
            Some(leader) => {
                *projection
                    .electoral_votes
                    .entry(leader.clone())
                    .or_insert(0) += state.electoral_votes;
                projection
                    .state_leaders
                    .insert(state.code.clone(), leader.clone());
            }
            None => projection.uncalled.push(state.code.clone()),
        }
    }
    Ok(projection)
}
