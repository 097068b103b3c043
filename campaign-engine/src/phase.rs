//! Campaign lifecycle: a linear four-phase state machine.
//!
//! `Announcement -> Fundraising -> Active -> Resolution`, terminal after
//! Resolution. Every transition takes the current state by reference and the
//! caller's `now`, and returns a new state value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::clock::{self, real_hours_between};
use crate::config::CampaignConfig;
use crate::constants::LOG_TARGET_PHASE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignPhase {
    Announcement,
    Fundraising,
    Active,
    Resolution,
}

impl CampaignPhase {
    pub const ALL: [Self; 4] = [
        Self::Announcement,
        Self::Fundraising,
        Self::Active,
        Self::Resolution,
    ];

    /// The phase that follows this one, `None` once resolution is reached.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Announcement => Some(Self::Fundraising),
            Self::Fundraising => Some(Self::Active),
            Self::Active => Some(Self::Resolution),
            Self::Resolution => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Announcement => "announcement",
            Self::Fundraising => "fundraising",
            Self::Active => "active",
            Self::Resolution => "resolution",
        }
    }

    /// Action keys legal during this phase.
    #[must_use]
    pub fn allowed_actions(self) -> &'static [PhaseActionKey] {
        use PhaseActionKey as K;
        match self {
            Self::Announcement => &[K::Announce, K::Fundraise, K::HireStaff, K::PolicySpeech],
            Self::Fundraising => &[
                K::Fundraise,
                K::HireStaff,
                K::PolicySpeech,
                K::Media,
                K::OppositionResearch,
                K::Endorsement,
            ],
            Self::Active => &[
                K::Fundraise,
                K::HireStaff,
                K::PolicySpeech,
                K::Media,
                K::Rally,
                K::GroundGame,
                K::OppositionResearch,
                K::Endorsement,
                K::Debate,
                K::GetOutTheVote,
            ],
            Self::Resolution => &[K::GetOutTheVote, K::Media, K::Rally],
        }
    }
}

impl fmt::Display for CampaignPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse action categories used for phase gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseActionKey {
    Announce,
    Fundraise,
    HireStaff,
    PolicySpeech,
    Media,
    Rally,
    GroundGame,
    OppositionResearch,
    Endorsement,
    Debate,
    GetOutTheVote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Pending,
    Running,
    Paused,
    Completed,
    Abandoned,
}

impl CampaignStatus {
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

/// Who is running for what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignIdentity {
    pub campaign_id: String,
    pub company_id: String,
    pub candidate_id: String,
    pub office: String,
}

/// One entry in the campaign's action history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformedAction {
    pub action_key: PhaseActionKey,
    pub action_id: String,
    pub phase: CampaignPhase,
    pub performed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignState {
    pub identity: CampaignIdentity,
    pub current_phase: CampaignPhase,
    pub status: CampaignStatus,
    pub campaign_started_at: DateTime<Utc>,
    pub phase_started_at: DateTime<Utc>,
    #[serde(default)]
    pub paused_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub phase_progress: f64,
    #[serde(default)]
    pub elapsed_real_hours: f64,
    #[serde(default)]
    pub actions_performed: Vec<PerformedAction>,
}

/// Result of asking whether an action key is legal right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseActionCheck {
    pub allowed: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub allowed_actions: Vec<PhaseActionKey>,
}

/// Lifecycle operations attempted from the wrong status.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {operation} a campaign that is {status:?}")]
    InvalidStatus {
        operation: &'static str,
        status: CampaignStatus,
    },
}

/// Create a running campaign in the announcement phase.
#[must_use]
pub fn initialize(identity: CampaignIdentity, now: DateTime<Utc>) -> CampaignState {
    log::info!(
        target: LOG_TARGET_PHASE,
        "campaign {} initialized for {}",
        identity.campaign_id,
        identity.office
    );
    CampaignState {
        identity,
        current_phase: CampaignPhase::Announcement,
        status: CampaignStatus::Running,
        campaign_started_at: now,
        phase_started_at: now,
        paused_at: None,
        completed_at: None,
        phase_progress: 0.0,
        elapsed_real_hours: 0.0,
        actions_performed: Vec::new(),
    }
}

/// Create a campaign that has not started yet.
#[must_use]
pub fn draft(identity: CampaignIdentity, now: DateTime<Utc>) -> CampaignState {
    CampaignState {
        status: CampaignStatus::Pending,
        ..initialize(identity, now)
    }
}

/// Move a drafted campaign into the running announcement phase.
///
/// # Errors
///
/// Returns `TransitionError` unless the campaign is `Pending`.
pub fn start(state: &CampaignState, now: DateTime<Utc>) -> Result<CampaignState, TransitionError> {
    if state.status != CampaignStatus::Pending {
        return Err(TransitionError::InvalidStatus {
            operation: "start",
            status: state.status,
        });
    }
    Ok(initialize(state.identity.clone(), now))
}

/// Recompute progress and advance phases whose time has run out.
///
/// A tick that arrives late carries the overshoot into the following phases,
/// so a single call may cross several boundaries. Reaching the end of
/// resolution completes the campaign.
#[must_use]
pub fn update_progress(
    state: &CampaignState,
    now: DateTime<Utc>,
    cfg: &CampaignConfig,
) -> CampaignState {
    if state.status != CampaignStatus::Running {
        return state.clone();
    }
    let mut next = state.clone();
    next.elapsed_real_hours = real_hours_between(next.campaign_started_at, now);

    loop {
        let duration = cfg.phase_hours.for_phase(next.current_phase);
        let elapsed = real_hours_between(next.phase_started_at, now);
        let progress = if duration > 0.0 {
            (elapsed / duration).min(1.0)
        } else {
            1.0
        };
        next.phase_progress = progress.max(0.0);
        if progress < 1.0 {
            break;
        }

        let boundary = next.phase_started_at + clock::hours(duration);
        match next.current_phase.next() {
            Some(phase) => {
                log::info!(
                    target: LOG_TARGET_PHASE,
                    "campaign {} advanced {} -> {}",
                    next.identity.campaign_id,
                    next.current_phase,
                    phase
                );
                next.current_phase = phase;
                next.phase_started_at = boundary;
                next.phase_progress = 0.0;
            }
            None => {
                log::info!(
                    target: LOG_TARGET_PHASE,
                    "campaign {} completed",
                    next.identity.campaign_id
                );
                next.phase_progress = 1.0;
                next.status = CampaignStatus::Completed;
                next.completed_at = Some(boundary.min(now));
                break;
            }
        }
    }
    next
}

/// Check whether `key` is legal in the campaign's current phase.
#[must_use]
pub fn validate_action(state: &CampaignState, key: PhaseActionKey) -> PhaseActionCheck {
    let allowed_actions = state.current_phase.allowed_actions().to_vec();
    if state.status != CampaignStatus::Running {
        return PhaseActionCheck {
            allowed: false,
            reason: Some(format!("Campaign is {:?}, not running", state.status)),
            allowed_actions: Vec::new(),
        };
    }
    if allowed_actions.contains(&key) {
        PhaseActionCheck {
            allowed: true,
            reason: None,
            allowed_actions,
        }
    } else {
        PhaseActionCheck {
            allowed: false,
            reason: Some(format!(
                "{key:?} is not available during the {} phase",
                state.current_phase
            )),
            allowed_actions,
        }
    }
}

/// Freeze progress. Timestamps are preserved; resume shifts them forward.
///
/// # Errors
///
/// Returns `TransitionError` unless the campaign is running.
pub fn pause(state: &CampaignState, now: DateTime<Utc>) -> Result<CampaignState, TransitionError> {
    if state.status != CampaignStatus::Running {
        return Err(TransitionError::InvalidStatus {
            operation: "pause",
            status: state.status,
        });
    }
    Ok(CampaignState {
        status: CampaignStatus::Paused,
        paused_at: Some(now),
        ..state.clone()
    })
}

/// Resume a paused campaign, shifting start times by the pause length.
///
/// # Errors
///
/// Returns `TransitionError` unless the campaign is paused.
pub fn resume(state: &CampaignState, now: DateTime<Utc>) -> Result<CampaignState, TransitionError> {
    let Some(paused_at) = state.paused_at.filter(|_| state.status == CampaignStatus::Paused) else {
        return Err(TransitionError::InvalidStatus {
            operation: "resume",
            status: state.status,
        });
    };
    let paused_for = (now - paused_at).max(chrono::TimeDelta::zero());
    Ok(CampaignState {
        status: CampaignStatus::Running,
        paused_at: None,
        campaign_started_at: state.campaign_started_at + paused_for,
        phase_started_at: state.phase_started_at + paused_for,
        ..state.clone()
    })
}

/// Abandon the campaign. Terminal.
///
/// # Errors
///
/// Returns `TransitionError` when the campaign is already completed or abandoned.
pub fn abandon(state: &CampaignState, now: DateTime<Utc>) -> Result<CampaignState, TransitionError> {
    if state.status.is_finished() {
        return Err(TransitionError::InvalidStatus {
            operation: "abandon",
            status: state.status,
        });
    }
    log::info!(
        target: LOG_TARGET_PHASE,
        "campaign {} abandoned during {}",
        state.identity.campaign_id,
        state.current_phase
    );
    Ok(CampaignState {
        status: CampaignStatus::Abandoned,
        paused_at: None,
        completed_at: Some(now),
        ..state.clone()
    })
}

/// Start over with the same identity. Only finished campaigns may restart.
///
/// # Errors
///
/// Returns `TransitionError` unless the campaign is completed or abandoned.
pub fn restart(state: &CampaignState, now: DateTime<Utc>) -> Result<CampaignState, TransitionError> {
    if !state.status.is_finished() {
        return Err(TransitionError::InvalidStatus {
            operation: "restart",
            status: state.status,
        });
    }
    Ok(initialize(state.identity.clone(), now))
}

/// Append an entry to the action history.
#[must_use]
pub fn record_action(
    state: &CampaignState,
    action_key: PhaseActionKey,
    action_id: &str,
    now: DateTime<Utc>,
) -> CampaignState {
    let mut next = state.clone();
    next.actions_performed.push(PerformedAction {
        action_key,
        action_id: action_id.to_string(),
        phase: state.current_phase,
        performed_at: now,
    });
    next
}
