//! Final election resolution: adjusted state margins, electoral and popular
//! vote tallies, congressional delegations, ties, and recounts.
//!
//! Margins are always from candidate A's point of view: positive means A
//! leads the state, negative means B does.
use serde::{Deserialize, Serialize};

use crate::config::CampaignConfig;
use crate::constants::{
    LOG_TARGET_ELECTION, MOMENTUM_MARGIN_CAP, MOMENTUM_MARGIN_FACTOR, RECOUNT_MARGIN, TIE_MARGIN,
    WIN_PROB_MARGIN_SCALE, WIN_PROB_MAX, WIN_PROB_MIN, WIN_PROB_SPREAD,
    WIN_PROB_VOLATILITY_PENALTY,
};
use crate::data::StateInfo;
use crate::demographic_polling::DemographicPollSnapshot;
use crate::numbers::{clamp_pct, clamp_unit, split_ceil_floor};

/// Week-over-week polling change for both candidates in one state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct WeeklyMomentum {
    pub a_change: f64,
    pub b_change: f64,
}

/// Final-state numbers for one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateOutcome {
    pub code: String,
    pub electoral_votes: u32,
    #[serde(default)]
    pub house_seats: u32,
    /// Fraction of eligible voters, 0-1.
    pub turnout: f64,
    /// A minus B, in points.
    pub margin: f64,
    #[serde(default)]
    pub momentum: Option<WeeklyMomentum>,
    /// 0-1; shrinks the leader's win probability.
    #[serde(default)]
    pub volatility: f64,
}

impl StateOutcome {
    /// Derive a state outcome from a final demographic poll of that state.
    ///
    /// Turnout is the population-weighted turnout of the polled segments.
    /// When `previous` is given, the change since that poll becomes the
    /// state's weekly momentum.
    #[must_use]
    pub fn from_poll(
        state: &StateInfo,
        poll: &DemographicPollSnapshot,
        candidate_a: &str,
        candidate_b: &str,
        previous: Option<&DemographicPollSnapshot>,
    ) -> Self {
        let covered: f64 = poll.breakdown.values().map(|row| row.population_share).sum();
        let turnout = if covered > 0.0 {
            poll.breakdown
                .values()
                .map(|row| row.population_share * row.turnout)
                .sum::<f64>()
                / covered
        } else {
            0.0
        };
        let momentum = previous.map(|before| WeeklyMomentum {
            a_change: poll.support_for(candidate_a) - before.support_for(candidate_a),
            b_change: poll.support_for(candidate_b) - before.support_for(candidate_b),
        });
        Self {
            code: state.code.clone(),
            electoral_votes: state.electoral_votes,
            house_seats: state.house_seats,
            turnout: clamp_unit(turnout),
            margin: poll.support_for(candidate_a) - poll.support_for(candidate_b),
            momentum,
            volatility: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    /// Senate votes each candidate's side brings; the whole pool goes to
    /// the national popular-vote leader.
    pub senate_votes_per_player: u32,
}

impl Default for Delegation {
    fn default() -> Self {
        Self {
            senate_votes_per_player: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionInput {
    pub candidate_a: String,
    pub candidate_b: String,
    pub states: Vec<StateOutcome>,
    #[serde(default)]
    pub delegation: Delegation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateCall {
    A,
    B,
    Tie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateResolution {
    pub code: String,
    pub raw_margin: f64,
    pub adjusted_margin: f64,
    pub call: StateCall,
    pub a_win_probability: f64,
    pub b_win_probability: f64,
    pub a_electoral_votes: u32,
    pub b_electoral_votes: u32,
    pub a_house_seats: u32,
    pub b_house_seats: u32,
    pub low_turnout: bool,
    pub recount: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub candidate_id: String,
    pub electoral_votes: u32,
    /// Sum of per-state win probability times electoral votes.
    pub expected_electoral_votes: f64,
    /// Estimated national popular vote share, percent.
    pub popular_vote: f64,
    pub senate_votes: u32,
    pub house_seats: u32,
    pub states_won: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionResolution {
    /// `None` when nobody reached the electoral-vote threshold.
    pub winner: Option<String>,
    pub candidate_a: CandidateTally,
    pub candidate_b: CandidateTally,
    pub states: Vec<StateResolution>,
    pub ties: Vec<String>,
    pub recounts: Vec<String>,
    pub low_turnout: Vec<String>,
}

impl ElectionResolution {
    #[must_use]
    pub fn total_electoral_votes(&self) -> u32 {
        self.candidate_a.electoral_votes + self.candidate_b.electoral_votes
    }
}

/// Margin shift from late momentum, bounded so it never flips a decisive state.
#[must_use]
pub fn momentum_adjustment(momentum: WeeklyMomentum) -> f64 {
    ((momentum.a_change - momentum.b_change) * MOMENTUM_MARGIN_FACTOR)
        .clamp(-MOMENTUM_MARGIN_CAP, MOMENTUM_MARGIN_CAP)
}

/// Probability that the state's leader actually carries it.
#[must_use]
pub fn leader_win_probability(margin: f64, volatility: f64) -> f64 {
    let spread = (margin.abs() / WIN_PROB_MARGIN_SCALE).min(1.0) * WIN_PROB_SPREAD;
    let penalty = clamp_unit(volatility) * WIN_PROB_VOLATILITY_PENALTY;
    (WIN_PROB_MIN + spread - penalty).clamp(WIN_PROB_MIN, WIN_PROB_MAX)
}

fn resolve_state(outcome: &StateOutcome, cfg: &CampaignConfig) -> StateResolution {
    let adjusted_margin = outcome.margin + outcome.momentum.map_or(0.0, momentum_adjustment);
    let magnitude = adjusted_margin.abs();
    let call = if magnitude <= TIE_MARGIN {
        StateCall::Tie
    } else if adjusted_margin > 0.0 {
        StateCall::A
    } else {
        StateCall::B
    };

    let leader_probability = leader_win_probability(adjusted_margin, outcome.volatility);
    let (a_win_probability, b_win_probability) = match call {
        StateCall::A => (leader_probability, 1.0 - leader_probability),
        StateCall::B => (1.0 - leader_probability, leader_probability),
        StateCall::Tie => (0.5, 0.5),
    };

    let (a_electoral_votes, b_electoral_votes, a_house_seats, b_house_seats) = match call {
        StateCall::A => (outcome.electoral_votes, 0, outcome.house_seats, 0),
        StateCall::B => (0, outcome.electoral_votes, 0, outcome.house_seats),
        StateCall::Tie => {
            let (ev_a, ev_b) = split_ceil_floor(outcome.electoral_votes);
            let (house_a, house_b) = split_ceil_floor(outcome.house_seats);
            (ev_a, ev_b, house_a, house_b)
        }
    };

    StateResolution {
        code: outcome.code.clone(),
        raw_margin: outcome.margin,
        adjusted_margin,
        call,
        a_win_probability,
        b_win_probability,
        a_electoral_votes,
        b_electoral_votes,
        a_house_seats,
        b_house_seats,
        low_turnout: outcome.turnout < cfg.low_turnout_threshold,
        recount: magnitude <= RECOUNT_MARGIN,
    }
}

fn empty_tally(candidate_id: &str) -> CandidateTally {
    CandidateTally {
        candidate_id: candidate_id.to_string(),
        electoral_votes: 0,
        expected_electoral_votes: 0.0,
        popular_vote: 0.0,
        senate_votes: 0,
        house_seats: 0,
        states_won: Vec::new(),
    }
}

/// Resolve the election from final per-state outcomes.
#[must_use]
pub fn resolve_election(input: &ElectionInput, cfg: &CampaignConfig) -> ElectionResolution {
    let mut a = empty_tally(&input.candidate_a);
    let mut b = empty_tally(&input.candidate_b);
    let mut states = Vec::with_capacity(input.states.len());
    let mut ties = Vec::new();
    let mut recounts = Vec::new();
    let mut low_turnout = Vec::new();
    let mut popular_weight = 0.0;
    let mut a_popular = 0.0;
    let mut b_popular = 0.0;

    for outcome in &input.states {
        let resolved = resolve_state(outcome, cfg);

        a.electoral_votes += resolved.a_electoral_votes;
        b.electoral_votes += resolved.b_electoral_votes;
        a.house_seats += resolved.a_house_seats;
        b.house_seats += resolved.b_house_seats;
        let ev = f64::from(outcome.electoral_votes);
        a.expected_electoral_votes += resolved.a_win_probability * ev;
        b.expected_electoral_votes += resolved.b_win_probability * ev;
        match resolved.call {
            StateCall::A => a.states_won.push(resolved.code.clone()),
            StateCall::B => b.states_won.push(resolved.code.clone()),
            StateCall::Tie => ties.push(resolved.code.clone()),
        }
        if resolved.recount {
            recounts.push(resolved.code.clone());
        }
        if resolved.low_turnout {
            log::debug!(
                target: LOG_TARGET_ELECTION,
                "{} turnout {:.2} below threshold",
                outcome.code,
                outcome.turnout
            );
            low_turnout.push(resolved.code.clone());
        }

        let weight = ev * outcome.turnout.max(0.0);
        popular_weight += weight;
        a_popular += weight * clamp_pct(50.0 + resolved.adjusted_margin / 2.0);
        b_popular += weight * clamp_pct(50.0 - resolved.adjusted_margin / 2.0);

        states.push(resolved);
    }

    if popular_weight > 0.0 {
        a.popular_vote = a_popular / popular_weight;
        b.popular_vote = b_popular / popular_weight;
    } else {
        a.popular_vote = 50.0;
        b.popular_vote = 50.0;
    }

    let senate_pool = input.delegation.senate_votes_per_player * 2;
    if (a.popular_vote - b.popular_vote).abs() <= TIE_MARGIN {
        let (first, second) = split_ceil_floor(senate_pool);
        a.senate_votes = first;
        b.senate_votes = second;
    } else if a.popular_vote > b.popular_vote {
        a.senate_votes = senate_pool;
    } else {
        b.senate_votes = senate_pool;
    }

    let threshold = cfg.electoral_votes_to_win;
    let winner = if a.electoral_votes >= threshold && a.electoral_votes > b.electoral_votes {
        Some(a.candidate_id.clone())
    } else if b.electoral_votes >= threshold && b.electoral_votes > a.electoral_votes {
        Some(b.candidate_id.clone())
    } else {
        None
    };

    log::info!(
        target: LOG_TARGET_ELECTION,
        "election resolved: {} {} EV, {} {} EV, winner {}",
        a.candidate_id,
        a.electoral_votes,
        b.candidate_id,
        b.electoral_votes,
        winner.as_deref().unwrap_or("none")
    );

    ElectionResolution {
        winner,
        candidate_a: a,
        candidate_b: b,
        states,
        ties,
        recounts,
        low_turnout,
    }
}
