//! General poll snapshots: margin of error, sampling noise, offline
//! dampening, trend analysis, and state prioritization.
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{
    COMPETITIVE_MARGIN, DEMOGRAPHIC_JITTER_FACTOR, LOG_TARGET_POLLING, RELIABILITY_MOE_SCALE,
    TREND_THRESHOLD,
};
use crate::demographic_polling::Geography;
use crate::demographics::DemographicKey;
use crate::numbers::{clamp_pct, clamp_unit, usize_to_f64};
use crate::seed::{label_digest, seeded_rng};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollType {
    National,
    State,
    District,
    Tracking,
    Exit,
}

impl PollType {
    pub const ALL: [Self; 5] = [
        Self::National,
        Self::State,
        Self::District,
        Self::Tracking,
        Self::Exit,
    ];

    /// Reported margin of error at the canonical sample size, in points.
    #[must_use]
    pub const fn base_margin_of_error(self) -> f64 {
        match self {
            Self::National => 2.8,
            Self::State => 3.8,
            Self::District => 4.9,
            Self::Tracking => 3.5,
            Self::Exit => 3.1,
        }
    }

    #[must_use]
    pub const fn canonical_sample_size(self) -> u32 {
        match self {
            Self::National => 1275,
            Self::State => 693,
            Self::District => 416,
            Self::Tracking => 816,
            Self::Exit => 1041,
        }
    }

    /// Scaling that pins the margin of error to its base at the canonical size.
    #[must_use]
    pub fn methodology_factor(self) -> f64 {
        self.base_margin_of_error() * f64::from(self.canonical_sample_size()).sqrt() / 100.0
    }
}

/// `100 / sqrt(n) * methodology`, in points. An empty sample reports the base MOE.
#[must_use]
pub fn margin_of_error(poll_type: PollType, sample_size: u32) -> f64 {
    if sample_size == 0 {
        return poll_type.base_margin_of_error();
    }
    100.0 / f64::from(sample_size).sqrt() * poll_type.methodology_factor()
}

/// Underlying support to be sampled for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSupport {
    pub candidate_id: String,
    pub support: f64,
    #[serde(default)]
    pub demographics: BTreeMap<DemographicKey, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollRequest {
    pub poll_type: PollType,
    pub geography: Geography,
    pub sample_size: u32,
    pub taken_at: DateTime<Utc>,
    pub seed: String,
    pub candidates: Vec<CandidateSupport>,
    /// Earlier poll of the same race, used only for deltas.
    #[serde(default)]
    pub previous: Option<PollSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePollResult {
    pub candidate_id: String,
    pub support: f64,
    /// Change since the previous snapshot, when one was supplied.
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub demographics: BTreeMap<DemographicKey, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSnapshot {
    pub id: String,
    pub poll_type: PollType,
    pub geography: Geography,
    pub taken_at: DateTime<Utc>,
    pub sample_size: u32,
    pub margin_of_error: f64,
    pub results: Vec<CandidatePollResult>,
    pub undecided: f64,
    /// Mean absolute change since the previous snapshot.
    pub volatility_index: f64,
    /// 1 for a precise poll, falling toward 0 as the margin of error grows.
    pub reliability_index: f64,
}

impl PollSnapshot {
    #[must_use]
    pub fn support_for(&self, candidate_id: &str) -> Option<f64> {
        self.results
            .iter()
            .find(|r| r.candidate_id == candidate_id)
            .map(|r| r.support)
    }
}

/// Sample a poll from underlying support.
///
/// Topline noise is uniform within half the margin of error. Subgroups are
/// noisier by a fixed factor because their effective samples are smaller.
#[must_use]
pub fn build_poll_snapshot(request: &PollRequest) -> PollSnapshot {
    let moe = margin_of_error(request.poll_type, request.sample_size);
    let label = format!(
        "{}|{}|{}",
        request.seed,
        request.geography,
        request.taken_at.timestamp_millis()
    );
    let mut rng = seeded_rng(&label);

    let mut results: Vec<CandidatePollResult> = request
        .candidates
        .iter()
        .map(|candidate| {
            let support =
                clamp_pct(candidate.support + rng.gen_range(-1.0..=1.0) * moe * 0.5);
            let demographics = candidate
                .demographics
                .iter()
                .map(|(key, value)| {
                    let noise = rng.gen_range(-1.0..=1.0) * moe * DEMOGRAPHIC_JITTER_FACTOR;
                    (*key, clamp_pct(value + noise))
                })
                .collect();
            CandidatePollResult {
                candidate_id: candidate.candidate_id.clone(),
                support,
                change: None,
                demographics,
            }
        })
        .collect();

    let total: f64 = results.iter().map(|r| r.support).sum();
    if total > 100.0 {
        for result in &mut results {
            result.support *= 100.0 / total;
        }
    }

    if let Some(previous) = &request.previous {
        for result in &mut results {
            result.change = previous
                .support_for(&result.candidate_id)
                .map(|before| result.support - before);
        }
    }
    let changes: Vec<f64> = results.iter().filter_map(|r| r.change).collect();
    let volatility_index = if changes.is_empty() {
        0.0
    } else {
        changes.iter().map(|c| c.abs()).sum::<f64>() / usize_to_f64(changes.len())
    };

    let undecided = clamp_pct(100.0 - results.iter().map(|r| r.support).sum::<f64>());
    log::debug!(
        target: LOG_TARGET_POLLING,
        "{:?} poll of {} (n={}, moe {moe:.2})",
        request.poll_type,
        request.geography,
        request.sample_size
    );

    PollSnapshot {
        id: format!("poll-{:016x}", label_digest(&label)),
        poll_type: request.poll_type,
        geography: request.geography.clone(),
        taken_at: request.taken_at,
        sample_size: request.sample_size,
        margin_of_error: moe,
        results,
        undecided,
        volatility_index,
        reliability_index: clamp_unit(1.0 - moe / RELIABILITY_MOE_SCALE),
    }
}

/// Share of a raw polling delta that lands on a player offline for `hours_offline`.
#[must_use]
pub fn volatility_dampening(hours_offline: f64) -> f64 {
    match hours_offline {
        h if h < 1.0 => 1.0,
        h if h < 4.0 => 0.75,
        h if h < 12.0 => 0.5,
        _ => 0.25,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollingDelta {
    pub raw_delta: f64,
    pub dampening: f64,
    pub applied_delta: f64,
    pub new_support: f64,
}

/// Apply a raw delta once, dampened by how long the player has been away.
#[must_use]
pub fn apply_polling_delta(current_support: f64, raw_delta: f64, hours_offline: f64) -> PollingDelta {
    let dampening = volatility_dampening(hours_offline);
    let applied_delta = raw_delta * dampening;
    PollingDelta {
        raw_delta,
        dampening,
        applied_delta,
        new_support: clamp_pct(current_support + applied_delta),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub taken_at: DateTime<Utc>,
    pub support: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollTrend {
    pub geography: Geography,
    pub candidate_id: String,
    pub points: Vec<TrendPoint>,
    /// Mean change per poll.
    pub momentum: f64,
    pub direction: TrendDirection,
}

/// Per-candidate, per-geography trends over snapshots in time order.
#[must_use]
pub fn build_trends(snapshots: &[PollSnapshot]) -> Vec<PollTrend> {
    let mut ordered: Vec<&PollSnapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|snapshot| snapshot.taken_at);

    let mut series: BTreeMap<(Geography, String), Vec<TrendPoint>> = BTreeMap::new();
    for snapshot in ordered {
        for result in &snapshot.results {
            series
                .entry((snapshot.geography.clone(), result.candidate_id.clone()))
                .or_default()
                .push(TrendPoint {
                    taken_at: snapshot.taken_at,
                    support: result.support,
                });
        }
    }

    series
        .into_iter()
        .map(|((geography, candidate_id), points)| {
            let momentum = if points.len() < 2 {
                0.0
            } else {
                let total: f64 = points.windows(2).map(|w| w[1].support - w[0].support).sum();
                total / usize_to_f64(points.len() - 1)
            };
            let direction = if momentum > TREND_THRESHOLD {
                TrendDirection::Rising
            } else if momentum < -TREND_THRESHOLD {
                TrendDirection::Falling
            } else {
                TrendDirection::Stable
            };
            PollTrend {
                geography,
                candidate_id,
                points,
                momentum,
                direction,
            }
        })
        .collect()
}

/// A state race as seen by campaign planners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRace {
    pub code: String,
    pub electoral_votes: u32,
    /// Leader's margin in points.
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePriority {
    pub code: String,
    pub electoral_votes: u32,
    pub competitiveness: f64,
    /// Electoral votes times competitiveness.
    pub priority: f64,
    /// Share of total priority, sums to 1 when any state is in play.
    pub weight: f64,
}

/// Rank states by electoral votes times competitiveness, highest first.
#[must_use]
pub fn prioritize_states(races: &[StateRace]) -> Vec<StatePriority> {
    let mut priorities: Vec<StatePriority> = races
        .iter()
        .map(|race| {
            let competitiveness = (1.0 - race.margin.abs() / COMPETITIVE_MARGIN).max(0.0);
            StatePriority {
                code: race.code.clone(),
                electoral_votes: race.electoral_votes,
                competitiveness,
                priority: f64::from(race.electoral_votes) * competitiveness,
                weight: 0.0,
            }
        })
        .collect();
    let total: f64 = priorities.iter().map(|p| p.priority).sum();
    if total > 0.0 {
        for entry in &mut priorities {
            entry.weight = entry.priority / total;
        }
    }
    priorities.sort_by(|a, b| {
        b.priority
            .total_cmp(&a.priority)
            .then_with(|| a.code.cmp(&b.code))
    });
    priorities
}
