//! Debate performance scoring.
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEBATE_ATTACKER_BONUS_MAX, DEBATE_CHARISMA_WEIGHT, DEBATE_COMPOSURE_WEIGHT,
    DEBATE_DEFENDER_PENALTY_MAX, DEBATE_FATIGUE_WEIGHT, DEBATE_JITTER_SPAN,
    DEBATE_KNOWLEDGE_WEIGHT, DEBATE_MOMENTUM_CAP, DEBATE_MOMENTUM_FACTOR, DEBATE_PERSUASION_CAP,
    DEBATE_PREPARATION_WEIGHT, DEBATE_SCANDAL_FLOOR,
};
use crate::numbers::clamp_pct;
use crate::seed::seeded_jitter;

/// Opposition research brought into a debate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ResearchEdge {
    /// Bonus from research this candidate holds on the opponent.
    #[serde(default)]
    pub attacker_bonus: f64,
    /// Penalty from research the opponent holds on this candidate.
    #[serde(default)]
    pub defender_penalty: f64,
}

/// One candidate's inputs. Traits are on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateInput {
    pub candidate_id: String,
    /// Seed label for the performance jitter, normally the debate id.
    pub seed: String,
    pub charisma: f64,
    pub knowledge: f64,
    pub composure: f64,
    #[serde(default)]
    pub preparation: f64,
    #[serde(default)]
    pub fatigue: f64,
    /// Points lost to live scandals, zero or negative.
    #[serde(default)]
    pub scandal_penalty: f64,
    #[serde(default)]
    pub research: ResearchEdge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateOutcome {
    pub candidate_id: String,
    /// 0-100.
    pub performance: f64,
    /// Polling points, in `[-5, 5]`.
    pub persuasion: f64,
    /// In `[-2, 2]`.
    pub momentum: f64,
}

/// Score one debate performance. Deterministic for a given input.
#[must_use]
pub fn score_debate(input: &DebateInput) -> DebateOutcome {
    let base = DEBATE_CHARISMA_WEIGHT * input.charisma
        + DEBATE_KNOWLEDGE_WEIGHT * input.knowledge
        + DEBATE_COMPOSURE_WEIGHT * input.composure;
    let preparation = DEBATE_PREPARATION_WEIGHT * input.preparation.max(0.0);
    let fatigue = DEBATE_FATIGUE_WEIGHT * input.fatigue.max(0.0);
    let scandal = input.scandal_penalty.clamp(DEBATE_SCANDAL_FLOOR, 0.0);
    let jitter = seeded_jitter(
        &format!("{}-{}-debate", input.seed, input.candidate_id),
        DEBATE_JITTER_SPAN,
    );
    let attack = input
        .research
        .attacker_bonus
        .clamp(0.0, DEBATE_ATTACKER_BONUS_MAX);
    let defense = input
        .research
        .defender_penalty
        .clamp(0.0, DEBATE_DEFENDER_PENALTY_MAX);

    let performance = clamp_pct(base + preparation - fatigue + scandal + jitter + attack - defense);
    let persuasion =
        ((performance - 50.0) / 10.0).clamp(-DEBATE_PERSUASION_CAP, DEBATE_PERSUASION_CAP);
    let momentum =
        (persuasion * DEBATE_MOMENTUM_FACTOR).clamp(-DEBATE_MOMENTUM_CAP, DEBATE_MOMENTUM_CAP);

    DebateOutcome {
        candidate_id: input.candidate_id.clone(),
        performance,
        persuasion,
        momentum,
    }
}

/// Both sides of a head-to-head debate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateMatchup {
    pub first: DebateOutcome,
    pub second: DebateOutcome,
    /// `None` when the performances are equal.
    pub winner: Option<String>,
}

#[must_use]
pub fn score_matchup(first: &DebateInput, second: &DebateInput) -> DebateMatchup {
    let first = score_debate(first);
    let second = score_debate(second);
    let winner = match first.performance.total_cmp(&second.performance) {
        std::cmp::Ordering::Greater => Some(first.candidate_id.clone()),
        std::cmp::Ordering::Less => Some(second.candidate_id.clone()),
        std::cmp::Ordering::Equal => None,
    };
    DebateMatchup {
        first,
        second,
        winner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: &str, trait_level: f64) -> DebateInput {
        DebateInput {
            candidate_id: id.to_string(),
            seed: "debate-1".to_string(),
            charisma: trait_level,
            knowledge: trait_level,
            composure: trait_level,
            preparation: 0.0,
            fatigue: 0.0,
            scandal_penalty: 0.0,
            research: ResearchEdge::default(),
        }
    }

    #[test]
    fn neutral_candidate_lands_near_fifty() {
        let outcome = score_debate(&input("a", 50.0));
        assert!((outcome.performance - 50.0).abs() <= 2.5);
        assert!(outcome.persuasion.abs() <= 0.25 + 1e-9);
        assert_eq!(outcome, score_debate(&input("a", 50.0)));
    }

    #[test]
    fn outputs_stay_clamped() {
        let mut star = input("a", 100.0);
        star.preparation = 100.0;
        star.research.attacker_bonus = 500.0;
        let outcome = score_debate(&star);
        assert!((outcome.performance - 100.0).abs() < f64::EPSILON);
        assert!((outcome.persuasion - 5.0).abs() < f64::EPSILON);
        assert!((outcome.momentum - 2.0).abs() < f64::EPSILON);

        let mut wreck = input("b", 0.0);
        wreck.fatigue = 100.0;
        wreck.scandal_penalty = -80.0;
        wreck.research.defender_penalty = 99.0;
        let outcome = score_debate(&wreck);
        assert!(outcome.performance.abs() < f64::EPSILON);
        assert!((outcome.persuasion + 5.0).abs() < f64::EPSILON);
        assert!((outcome.momentum + 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn research_caps_apply() {
        let mut attacker = input("a", 40.0);
        attacker.research.attacker_bonus = 20.0;
        let capped = score_debate(&attacker);
        attacker.research.attacker_bonus = 45.0;
        assert!((score_debate(&attacker).performance - capped.performance).abs() < 1e-9);

        let mut defender = input("a", 40.0);
        defender.research.defender_penalty = 15.0;
        let floor = score_debate(&defender);
        defender.research.defender_penalty = 30.0;
        assert!((score_debate(&defender).performance - floor.performance).abs() < 1e-9);
    }

    #[test]
    fn stronger_candidate_wins_matchup() {
        let matchup = score_matchup(&input("strong", 80.0), &input("weak", 30.0));
        assert_eq!(matchup.winner.as_deref(), Some("strong"));
        assert!(matchup.first.persuasion > matchup.second.persuasion);
    }
}
