//! Campaign engine facade.
//!
//! Bundles validated configuration with the reference tables and chains the
//! simulation pipeline for each caller tick. The engine holds no per-campaign
//! state: every call takes the current values and returns new ones.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::{
    ActionQueue, ActionRequest, ActionResult, EligibilityReport, PlayerAction,
    check_and_reset_action_points, complete_action, create_player_action, execute_action,
    process_completed_actions, process_pending_actions, update_queue_after_action,
    validate_eligibility,
};
use crate::ads::{AdBuyResult, AdSpendLedger, MediaType, purchase_ad};
use crate::config::{CampaignConfig, ConfigError};
use crate::constants::{AD_DISTRICT_AUDIENCE, LOG_TARGET_ACTIONS, LOG_TARGET_QUEUE};
use crate::data::{DataError, StateTable};
use crate::debate::{DebateInput, DebateMatchup, score_matchup};
use crate::demographic_polling::{
    CampaignEffects, CandidateProfile, DemographicPollSnapshot, ElectoralProjection,
    build_national_poll, build_state_poll, project_electoral_votes,
};
use crate::demographics::{DemographicGroup, build_all_groups};
use crate::election::{Delegation, ElectionInput, ElectionResolution, StateOutcome, resolve_election};
use crate::phase::{
    CampaignIdentity, CampaignState, CampaignStatus, TransitionError, initialize, record_action,
    update_progress, validate_action,
};
use crate::ReferenceDataLoader;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("reference data loader failed: {0}")]
    Loader(Box<dyn std::error::Error + Send + Sync>),
}

/// Outcome of submitting an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Submission {
    Queued {
        action: PlayerAction,
        queue: ActionQueue,
        /// Non-blocking warnings from the eligibility check.
        warnings: Vec<String>,
    },
    Rejected {
        report: EligibilityReport,
    },
}

impl Submission {
    #[must_use]
    pub const fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }
}

/// Everything a tick changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickOutcome {
    pub state: CampaignState,
    pub queue: ActionQueue,
    pub effects: CampaignEffects,
    /// Actions that finished this tick, with results attached.
    pub completed: Vec<PlayerAction>,
    pub results: Vec<ActionResult>,
}

pub struct CampaignEngine {
    config: CampaignConfig,
    states: StateTable,
    groups: Vec<DemographicGroup>,
}

impl CampaignEngine {
    /// Build an engine over validated configuration and a state table.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` if the configuration violates its bounds.
    pub fn new(config: CampaignConfig, states: StateTable) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            states,
            groups: build_all_groups(),
        })
    }

    /// Build an engine from a host-provided loader.
    ///
    /// # Errors
    ///
    /// Returns an error if the loader fails or the loaded configuration is invalid.
    pub fn from_loader<L: ReferenceDataLoader>(loader: &L) -> Result<Self, EngineError> {
        let config = loader
            .load_config()
            .map_err(|err| EngineError::Loader(Box::new(err)))?;
        let states = loader
            .load_states()
            .map_err(|err| EngineError::Loader(Box::new(err)))?;
        Self::new(config, states)
    }

    #[must_use]
    pub const fn config(&self) -> &CampaignConfig {
        &self.config
    }

    #[must_use]
    pub const fn states(&self) -> &StateTable {
        &self.states
    }

    #[must_use]
    pub fn groups(&self) -> &[DemographicGroup] {
        &self.groups
    }

    /// A running campaign and its empty action queue.
    #[must_use]
    pub fn start_campaign(
        &self,
        identity: CampaignIdentity,
        now: DateTime<Utc>,
    ) -> (CampaignState, ActionQueue) {
        let queue = ActionQueue::new(&identity.campaign_id, self.config.action_points_max, now);
        (initialize(identity, now), queue)
    }

    /// Validate a request and, if eligible, charge the queue and enqueue it.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Data` when the request targets a state missing
    /// from the reference table. Ineligible requests are not errors.
    pub fn submit_action(
        &self,
        state: &CampaignState,
        queue: &ActionQueue,
        funds: f64,
        request: ActionRequest,
        now: DateTime<Utc>,
    ) -> Result<Submission, EngineError> {
        for code in &request.targeting.states {
            self.states.get(code)?;
        }

        let queue = check_and_reset_action_points(queue, now);
        let mut report = validate_eligibility(
            request.action_type,
            state.current_phase,
            &queue,
            funds,
            request.intensity,
            now,
        );
        if state.status != CampaignStatus::Running {
            let check = validate_action(state, request.action_type.phase_key());
            report.errors.insert(
                0,
                check
                    .reason
                    .unwrap_or_else(|| format!("Campaign is {:?}", state.status)),
            );
            report.valid = false;
        }
        if !report.valid {
            return Ok(Submission::Rejected { report });
        }

        let action = match create_player_action(request, now, &self.config) {
            Ok(action) => action,
            Err(err) => {
                report.valid = false;
                report.errors.push(err.to_string());
                return Ok(Submission::Rejected { report });
            }
        };
        let queue = update_queue_after_action(&queue, &action, now);
        log::debug!(
            target: LOG_TARGET_ACTIONS,
            "queued {} ({}) for {}, completes {}",
            action.action_type,
            action.id,
            action.campaign_id,
            action.completes_at.to_rfc3339()
        );
        Ok(Submission::Queued {
            action,
            queue,
            warnings: report.warnings,
        })
    }

    /// Advance one campaign to `now`.
    ///
    /// Runs the daily point reset, queue promotion, and completion; executes
    /// every due action in completion order and folds its result into the
    /// effects ledger under the campaign's candidate. Each action is recorded
    /// under the phase in effect at its `completes_at`, then phase progress is
    /// brought up to `now`.
    #[must_use]
    pub fn tick(
        &self,
        state: &CampaignState,
        queue: &ActionQueue,
        effects: &CampaignEffects,
        now: DateTime<Utc>,
    ) -> TickOutcome {
        let queue = check_and_reset_action_points(queue, now);
        let queue = process_pending_actions(&queue, now);
        let (queue, mut due) = process_completed_actions(&queue, now);
        due.sort_by(|a, b| {
            a.completes_at
                .cmp(&b.completes_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut state = state.clone();
        let mut effects = effects.clone();
        let mut completed = Vec::with_capacity(due.len());
        let mut results = Vec::with_capacity(due.len());
        for action in due {
            let result = execute_action(&action);
            effects = effects.absorb(&state.identity.candidate_id, &result);
            state = update_progress(&state, action.completes_at.min(now), &self.config);
            state = record_action(
                &state,
                action.action_type.phase_key(),
                &action.id,
                action.completes_at,
            );
            completed.push(complete_action(&action, result.clone()));
            results.push(result);
        }
        let state = update_progress(&state, now, &self.config);
        if !completed.is_empty() {
            log::debug!(
                target: LOG_TARGET_QUEUE,
                "campaign {} completed {} action(s), {} still in progress",
                state.identity.campaign_id,
                completed.len(),
                queue.in_progress.len()
            );
        }

        TickOutcome {
            state,
            queue,
            effects,
            completed,
            results,
        }
    }

    /// Demographic poll of one state.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Data` for an unknown state code.
    pub fn poll_state(
        &self,
        candidates: &[CandidateProfile],
        code: &str,
        effects: &CampaignEffects,
        seed: &str,
        now: DateTime<Utc>,
    ) -> Result<DemographicPollSnapshot, EngineError> {
        let state = self.states.get(code)?;
        Ok(build_state_poll(
            candidates,
            state,
            &self.groups,
            effects,
            seed,
            now,
        ))
    }

    /// Poll every state in the reference table.
    #[must_use]
    pub fn poll_all_states(
        &self,
        candidates: &[CandidateProfile],
        effects: &CampaignEffects,
        seed: &str,
        now: DateTime<Utc>,
    ) -> Vec<DemographicPollSnapshot> {
        self.states
            .iter()
            .map(|state| build_state_poll(candidates, state, &self.groups, effects, seed, now))
            .collect()
    }

    #[must_use]
    pub fn poll_nation(
        &self,
        candidates: &[CandidateProfile],
        effects: &CampaignEffects,
        seed: &str,
        now: DateTime<Utc>,
    ) -> DemographicPollSnapshot {
        build_national_poll(candidates, &self.groups, effects, seed, now)
    }

    /// # Errors
    ///
    /// Returns `EngineError::Data` when a snapshot names an unknown state.
    pub fn project(
        &self,
        state_polls: &[DemographicPollSnapshot],
    ) -> Result<ElectoralProjection, EngineError> {
        Ok(project_electoral_votes(state_polls, &self.states)?)
    }

    /// Buy ads in one state and credit the polling impact to `candidate_id` there.
    ///
    /// The market is sized from the state's House delegation.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Data` for an unknown state code.
    #[allow(clippy::too_many_arguments)]
    pub fn buy_ad(
        &self,
        ledger: &AdSpendLedger,
        effects: &CampaignEffects,
        candidate_id: &str,
        code: &str,
        media: MediaType,
        budget: f64,
        competitiveness: f64,
    ) -> Result<(AdBuyResult, AdSpendLedger, CampaignEffects), EngineError> {
        let state = self.states.get(code)?;
        let market_size = f64::from(state.house_seats) * AD_DISTRICT_AUDIENCE;
        let (buy, ledger) = purchase_ad(ledger, media, budget, market_size, competitiveness);
        let effects = effects.with_state_shift(candidate_id, &state.code, buy.polling_impact);
        Ok((buy, ledger, effects))
    }

    /// Score a head-to-head debate and credit each side's persuasion nationally.
    #[must_use]
    pub fn hold_debate(
        &self,
        effects: &CampaignEffects,
        first: &DebateInput,
        second: &DebateInput,
    ) -> (DebateMatchup, CampaignEffects) {
        let matchup = score_matchup(first, second);
        let effects = effects
            .with_general_shift(&matchup.first.candidate_id, matchup.first.persuasion)
            .with_general_shift(&matchup.second.candidate_id, matchup.second.persuasion);
        (matchup, effects)
    }

    /// Resolve the election from final state polls.
    ///
    /// `previous` holds earlier state polls; a matching state's change since
    /// then becomes its late momentum. Polls that are not state polls are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Data` when a poll names an unknown state.
    pub fn resolve(
        &self,
        candidate_a: &str,
        candidate_b: &str,
        final_polls: &[DemographicPollSnapshot],
        previous: &[DemographicPollSnapshot],
        delegation: Delegation,
    ) -> Result<ElectionResolution, EngineError> {
        let mut states = Vec::with_capacity(final_polls.len());
        for poll in final_polls {
            let Some(code) = poll.geography.state_code() else {
                continue;
            };
            let info = self.states.get(code)?;
            let before = previous.iter().find(|p| p.geography == poll.geography);
            states.push(StateOutcome::from_poll(
                info,
                poll,
                candidate_a,
                candidate_b,
                before,
            ));
        }
        Ok(resolve_election(
            &ElectionInput {
                candidate_a: candidate_a.to_string(),
                candidate_b: candidate_b.to_string(),
                states,
                delegation,
            },
            &self.config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticDataLoader;
    use crate::actions::{ActionIntensity, ActionStatus, ActionTargeting, ActionType};
    use crate::phase::CampaignPhase;
    use chrono::{TimeDelta, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
    }

    fn engine() -> CampaignEngine {
        CampaignEngine::from_loader(&StaticDataLoader).unwrap()
    }

    fn identity() -> CampaignIdentity {
        CampaignIdentity {
            campaign_id: "camp-e".into(),
            company_id: "co".into(),
            candidate_id: "cand".into(),
            office: "president".into(),
        }
    }

    fn request(action_type: ActionType) -> ActionRequest {
        ActionRequest {
            campaign_id: "camp-e".into(),
            player_id: "p1".into(),
            action_type,
            intensity: ActionIntensity::Standard,
            targeting: ActionTargeting::default(),
            scheduled_for: None,
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = CampaignConfig {
            time_multiplier: 0.0,
            ..CampaignConfig::default()
        };
        let states = StateTable::load_from_static().unwrap();
        assert!(matches!(
            CampaignEngine::new(config, states),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn submitted_action_completes_on_tick() {
        let engine = engine();
        let (state, queue) = engine.start_campaign(identity(), now());
        let submission = engine
            .submit_action(&state, &queue, 1e6, request(ActionType::AnnounceCandidacy), now())
            .unwrap();
        let Submission::Queued { action, queue, .. } = submission else {
            panic!("announcement should be eligible");
        };
        assert!(queue.action_points_remaining < engine.config().action_points_max);

        let early = engine.tick(&state, &queue, &CampaignEffects::default(), now());
        assert!(early.completed.is_empty());
        assert_eq!(early.queue.in_progress.len(), 1);

        let later = engine.tick(&early.state, &early.queue, &early.effects, action.completes_at);
        assert_eq!(later.completed.len(), 1);
        assert!(matches!(
            later.completed[0].status,
            ActionStatus::Completed | ActionStatus::Backfired
        ));
        assert_eq!(later.state.actions_performed.len(), 1);
        assert!(later.queue.is_idle());
        assert!(later.effects.for_candidate("cand").is_some());
    }

    #[test]
    fn rejected_actions_report_reasons() {
        let engine = engine();
        let (state, queue) = engine.start_campaign(identity(), now());
        let submission = engine
            .submit_action(&state, &queue, 1e9, request(ActionType::GetOutTheVote), now())
            .unwrap();
        assert!(!submission.is_queued());
        assert_eq!(state.current_phase, CampaignPhase::Announcement);

        let abandoned = crate::phase::abandon(&state, now()).unwrap();
        let Submission::Rejected { report } = engine
            .submit_action(&abandoned, &queue, 1e9, request(ActionType::AnnounceCandidacy), now())
            .unwrap()
        else {
            panic!("abandoned campaigns take no actions");
        };
        assert!(report.errors[0].contains("not running"));
    }

    #[test]
    fn unknown_target_state_is_a_data_error() {
        let engine = engine();
        let (state, queue) = engine.start_campaign(identity(), now());
        let mut req = request(ActionType::AnnounceCandidacy);
        req.targeting.states.push("ZZ".into());
        assert!(matches!(
            engine.submit_action(&state, &queue, 1e6, req, now()),
            Err(EngineError::Data(DataError::UnknownState(_)))
        ));
        assert!(engine.poll_state(&[], "ZZ", &CampaignEffects::default(), "s", now()).is_err());
    }

    #[test]
    fn late_tick_completes_the_campaign() {
        let engine = engine();
        let (state, queue) = engine.start_campaign(identity(), now());
        let end = now() + TimeDelta::hours(24 * 30);
        let outcome = engine.tick(&state, &queue, &CampaignEffects::default(), end);
        assert_eq!(outcome.state.status, CampaignStatus::Completed);
        assert_eq!(outcome.state.current_phase, CampaignPhase::Resolution);
        assert_eq!(
            outcome.queue.action_points_remaining,
            engine.config().action_points_max
        );
    }

    #[test]
    fn ad_buys_move_only_their_state() {
        let engine = engine();
        let (buy, ledger, effects) = engine
            .buy_ad(
                &AdSpendLedger::default(),
                &CampaignEffects::default(),
                "cand",
                "OH",
                MediaType::Digital,
                250_000.0,
                0.5,
            )
            .unwrap();
        assert!(buy.polling_impact > 0.0);
        assert!((ledger.total() - 250_000.0).abs() < f64::EPSILON);
        let cand = effects.for_candidate("cand").unwrap();
        assert!((cand.states["OH"] - buy.polling_impact).abs() < f64::EPSILON);
        assert!(cand.general.abs() < f64::EPSILON);
    }
}
