//! Player actions: eligibility, creation, execution, and the per-campaign queue.
//!
//! Nothing here reads a clock or a global RNG. Eligibility failures come back
//! as data in an [`EligibilityReport`], and execution always produces an
//! [`ActionResult`]; a backfire is an outcome, not an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::clock::game_hours_to_real;
use crate::config::CampaignConfig;
use crate::constants::{BACKFIRE_WARNING_THRESHOLD, LOG_TARGET_ACTIONS, SPEND_WARNING_RATIO};
use crate::demographics::DemographicKey;
use crate::issues::Issue;
use crate::phase::CampaignPhase;
use crate::seed::{derive_action_id, derive_action_seed};

pub mod catalog;
pub mod execute;
pub mod queue;

pub use catalog::{
    ActionIntensity, ActionSpec, ActionType, EffectDistribution, IntensityMultipliers,
    action_cost, action_points, backfire_probability,
};
pub use execute::execute_action;
pub use queue::{
    ActionQueue, check_and_reset_action_points, complete_action, process_completed_actions,
    process_pending_actions, update_queue_after_action,
};

/// Inline capacity for target lists; most actions target a handful of entries.
pub type StateTargets = SmallVec<[String; 4]>;
pub type DemographicTargets = SmallVec<[DemographicKey; 4]>;
pub type IssueTargets = SmallVec<[Issue; 2]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Backfired,
}

/// Optional narrowing of an action's audience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ActionTargeting {
    #[serde(default)]
    pub states: StateTargets,
    #[serde(default)]
    pub demographics: DemographicTargets,
    #[serde(default)]
    pub issues: IssueTargets,
}

impl ActionTargeting {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.demographics.is_empty() && self.issues.is_empty()
    }
}

/// Outcome of executing one action. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub action_id: String,
    pub action_type: ActionType,
    pub status: ActionStatus,
    /// Percentage points.
    pub polling_shift: f64,
    pub reputation_change: f64,
    /// Dollars.
    pub funds_raised: f64,
    pub new_donors: u32,
    #[serde(default)]
    pub demographic_effects: BTreeMap<DemographicKey, f64>,
    #[serde(default)]
    pub state_effects: BTreeMap<String, f64>,
    pub endorsement_triggered: bool,
    pub scandal_triggered: bool,
    pub media_boost: f64,
    pub did_backfire: bool,
    #[serde(default)]
    pub backfire_reason: Option<String>,
    /// Human-readable trace of how the numbers were derived.
    #[serde(default)]
    pub calculation: Vec<String>,
    pub executed_at: DateTime<Utc>,
}

/// A queued or executing action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAction {
    pub id: String,
    pub campaign_id: String,
    pub player_id: String,
    pub action_type: ActionType,
    pub intensity: ActionIntensity,
    pub status: ActionStatus,
    #[serde(default)]
    pub targeting: ActionTargeting,
    pub initiated_at: DateTime<Utc>,
    pub scheduled_for: DateTime<Utc>,
    pub completes_at: DateTime<Utc>,
    pub final_cost: f64,
    pub action_points: u32,
    pub seed: String,
    #[serde(default)]
    pub result: Option<ActionResult>,
}

/// What a caller asks for when queuing an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub campaign_id: String,
    pub player_id: String,
    pub action_type: ActionType,
    #[serde(default)]
    pub intensity: ActionIntensity,
    #[serde(default)]
    pub targeting: ActionTargeting,
    /// Defaults to the submission time.
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("{action_type} scheduled for {scheduled_for} would complete outside the supported time range")]
    ScheduleOutOfRange {
        action_type: ActionType,
        scheduled_for: DateTime<Utc>,
    },
}

/// Result of an eligibility check. Errors block; warnings do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EligibilityReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Check whether `action_type` may be queued right now.
///
/// Checks run in a fixed order: phase gating, action points, funds, cooldown,
/// then weekly cap. Every failing check is reported, not just the first.
#[must_use]
pub fn validate_eligibility(
    action_type: ActionType,
    phase: CampaignPhase,
    queue: &ActionQueue,
    funds: f64,
    intensity: ActionIntensity,
    now: DateTime<Utc>,
) -> EligibilityReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !phase.allowed_actions().contains(&action_type.phase_key()) {
        errors.push(format!(
            "{action_type} is not available during the {phase} phase"
        ));
    }

    let points = action_points(action_type, intensity);
    if queue.action_points_remaining < points {
        errors.push(format!(
            "Insufficient action points: need {points}, have {}",
            queue.action_points_remaining
        ));
    }

    let cost = action_cost(action_type, intensity);
    if funds < cost {
        errors.push(format!(
            "Insufficient funds: need ${cost:.0}, have ${funds:.0}"
        ));
    }

    if let Some(expiry) = queue.cooldowns.get(&action_type).filter(|expiry| **expiry > now) {
        errors.push(format!(
            "{action_type} is on cooldown until {}",
            expiry.to_rfc3339()
        ));
    }

    if let Some(cap) = action_type.weekly_cap() {
        let used = queue.weekly_uses(action_type, now);
        if used >= cap {
            errors.push(format!(
                "Weekly limit reached for {action_type}: {used}/{cap}"
            ));
        }
    }

    if funds > 0.0 && cost > funds * SPEND_WARNING_RATIO {
        warnings.push(format!(
            "This action uses {:.0}% of available funds",
            cost / funds * 100.0
        ));
    }
    let backfire = backfire_probability(action_type, intensity);
    if backfire > BACKFIRE_WARNING_THRESHOLD {
        warnings.push(format!(
            "High backfire risk: {:.0}%",
            backfire * 100.0
        ));
    }

    let report = EligibilityReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    };
    if !report.valid {
        log::debug!(
            target: LOG_TARGET_ACTIONS,
            "{action_type} rejected: {}",
            report.errors.join("; ")
        );
    }
    report
}

/// Stamp cost, points, timing, and a deterministic seed onto a request.
///
/// Duration is in game hours, scaled by intensity and converted to real time
/// through the configured multiplier.
///
/// # Errors
///
/// Returns `ActionError::ScheduleOutOfRange` when the completion time cannot
/// be represented.
pub fn create_player_action(
    request: ActionRequest,
    now: DateTime<Utc>,
    cfg: &CampaignConfig,
) -> Result<PlayerAction, ActionError> {
    let spec = request.action_type.spec();
    let multipliers = request.intensity.multipliers();
    let scheduled_for = request.scheduled_for.unwrap_or(now).max(now);
    let duration = game_hours_to_real(
        spec.duration_game_hours * multipliers.time,
        cfg.time_multiplier,
    );
    let completes_at = scheduled_for.checked_add_signed(duration).ok_or(
        ActionError::ScheduleOutOfRange {
            action_type: request.action_type,
            scheduled_for,
        },
    )?;
    let key = request.action_type.as_str();
    Ok(PlayerAction {
        id: derive_action_id(&request.campaign_id, key, now),
        seed: derive_action_seed(&request.campaign_id, key, now),
        final_cost: action_cost(request.action_type, request.intensity),
        action_points: action_points(request.action_type, request.intensity),
        status: ActionStatus::Pending,
        initiated_at: now,
        scheduled_for,
        completes_at,
        result: None,
        campaign_id: request.campaign_id,
        player_id: request.player_id,
        action_type: request.action_type,
        intensity: request.intensity,
        targeting: request.targeting,
    })
}
