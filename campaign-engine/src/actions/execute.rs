//! Seeded resolution of a single action into an [`ActionResult`].
use std::collections::BTreeMap;

use super::{ActionResult, ActionStatus, PlayerAction, backfire_probability};
use crate::constants::{
    BACKFIRE_FUNDS_FACTOR, BACKFIRE_POLL_FACTOR, BACKFIRE_REPUTATION_FACTOR,
    DEMOGRAPHIC_EFFECT_SHARE, DEMOGRAPHIC_TARGETING_BONUS, DONOR_SPREAD_RATIO,
    ENDORSEMENT_BASELINE_CHANCE, LOG_TARGET_ACTIONS, MEDIA_BACKFIRE_FACTOR, MEDIA_BOOST_JITTER,
    SCANDAL_CHANCE_ON_BACKFIRE, STATE_EFFECT_SHARE, STATE_TARGETING_BONUS,
};
use crate::numbers::{round_f64_to_u32, unit_to_index};
use crate::seed::{seeded_gaussian, seeded_jitter, seeded_random};

const BACKFIRE_REASONS: [&str; 6] = [
    "Message was widely mocked online",
    "Opponents seized on an off-script remark",
    "Fact-checkers disputed a central claim",
    "Staff infighting leaked to the press",
    "Event drew a hostile crowd",
    "Coverage focused on the cost instead of the message",
];

/// Resolve `action` into a result. Identical actions yield identical results.
///
/// Every random draw is keyed by the action's seed plus a fixed suffix, so
/// outcomes can be replayed from the seed alone.
#[must_use]
pub fn execute_action(action: &PlayerAction) -> ActionResult {
    let seed = action.seed.as_str();
    let spec = action.action_type.spec();
    let effect = action.intensity.multipliers().effect;
    let mut calculation = Vec::new();

    let backfire_chance = backfire_probability(action.action_type, action.intensity);
    let backfire_roll = seeded_random(&format!("{seed}-backfire"));
    let did_backfire = backfire_roll < backfire_chance;
    calculation.push(format!(
        "backfire roll {backfire_roll:.4} vs chance {backfire_chance:.4}"
    ));

    let mut polling_shift = seeded_gaussian(
        &format!("{seed}-poll"),
        spec.polling.mean,
        spec.polling.std_dev,
    ) * effect;
    let mut reputation_change = seeded_gaussian(
        &format!("{seed}-rep"),
        spec.reputation.mean,
        spec.reputation.std_dev,
    ) * effect;
    let mut funds_raised = if spec.funds.mean > 0.0 {
        seeded_gaussian(&format!("{seed}-funds"), spec.funds.mean, spec.funds.std_dev).max(0.0)
            * effect
    } else {
        0.0
    };
    let new_donors = if spec.donors_mean > 0.0 {
        round_f64_to_u32(
            seeded_gaussian(
                &format!("{seed}-donors"),
                spec.donors_mean,
                spec.donors_mean * DONOR_SPREAD_RATIO,
            )
            .max(0.0)
                * effect,
        )
    } else {
        0
    };
    calculation.push(format!(
        "base draws x{effect:.2}: polling {polling_shift:+.3}, reputation {reputation_change:+.3}, funds {funds_raised:.0}"
    ));

    let targeting = &action.targeting;
    if !targeting.states.is_empty() {
        polling_shift *= STATE_TARGETING_BONUS;
        calculation.push(format!("state targeting x{STATE_TARGETING_BONUS}"));
    }
    if !targeting.demographics.is_empty() {
        polling_shift *= DEMOGRAPHIC_TARGETING_BONUS;
        calculation.push(format!(
            "demographic targeting x{DEMOGRAPHIC_TARGETING_BONUS}"
        ));
    }

    if did_backfire {
        polling_shift = -polling_shift.abs() * BACKFIRE_POLL_FACTOR;
        reputation_change = -reputation_change.abs() * BACKFIRE_REPUTATION_FACTOR;
        funds_raised *= BACKFIRE_FUNDS_FACTOR;
        calculation.push("backfire: polling negated and halved, reputation x-1.5, funds x0.3".to_string());
    }

    let state_effects: BTreeMap<String, f64> = targeting
        .states
        .iter()
        .map(|code| (code.clone(), polling_shift * STATE_EFFECT_SHARE))
        .collect();
    let demographic_effects = targeting
        .demographics
        .iter()
        .map(|&key| (key, polling_shift * DEMOGRAPHIC_EFFECT_SHARE))
        .collect();

    let endorsement_triggered = !did_backfire
        && (action.action_type.triggers_endorsement()
            || seeded_random(&format!("{seed}-endorse")) < ENDORSEMENT_BASELINE_CHANCE);
    let scandal_triggered =
        did_backfire && seeded_random(&format!("{seed}-scandal")) < SCANDAL_CHANCE_ON_BACKFIRE;

    let base_boost = action.action_type.media_boost();
    let media_boost = if base_boost > 0.0 {
        let boost = base_boost
            * effect
            * (1.0 + seeded_jitter(&format!("{seed}-media"), MEDIA_BOOST_JITTER));
        if did_backfire {
            -boost * MEDIA_BACKFIRE_FACTOR
        } else {
            boost
        }
    } else {
        0.0
    };

    let backfire_reason = did_backfire.then(|| {
        let roll = seeded_random(&format!("{seed}-reason"));
        BACKFIRE_REASONS[unit_to_index(roll, BACKFIRE_REASONS.len())].to_string()
    });

    if did_backfire {
        log::warn!(
            target: LOG_TARGET_ACTIONS,
            "{} ({}) backfired{}",
            action.action_type,
            action.id,
            if scandal_triggered { " with scandal" } else { "" }
        );
    } else {
        log::debug!(
            target: LOG_TARGET_ACTIONS,
            "{} ({}) resolved: polling {polling_shift:+.2}",
            action.action_type,
            action.id
        );
    }

    ActionResult {
        action_id: action.id.clone(),
        action_type: action.action_type,
        status: if did_backfire {
            ActionStatus::Backfired
        } else {
            ActionStatus::Completed
        },
        polling_shift,
        reputation_change,
        funds_raised,
        new_donors,
        demographic_effects,
        state_effects,
        endorsement_triggered,
        scandal_triggered,
        media_boost,
        did_backfire,
        backfire_reason,
        calculation,
        executed_at: action.completes_at,
    }
}
