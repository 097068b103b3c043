//! Campaign Simulation Engine
//!
//! Platform-agnostic core logic for multi-phase political campaigns: the phase
//! machine, the action queue and resolver, demographic polling, ad and debate
//! calculators, and final election resolution.
//! This crate never reads the clock or touches storage; callers pass `now` and
//! persisted values in and get new values back.

pub mod actions;
pub mod ads;
pub mod clock;
pub mod config;
mod constants;
pub mod data;
pub mod debate;
pub mod demographic_polling;
pub mod demographics;
pub mod election;
pub mod engine;
pub mod issues;
pub mod numbers;
pub mod phase;
pub mod polling;
pub mod seed;

// Re-export commonly used types
pub use actions::{
    ActionError, ActionIntensity, ActionQueue, ActionRequest, ActionResult, ActionStatus,
    ActionTargeting, ActionType, EligibilityReport, PlayerAction, create_player_action,
    execute_action, validate_eligibility,
};
pub use ads::{AdBuyResult, AdSpendLedger, BudgetAllocation, MediaType, optimize_budget, purchase_ad};
pub use config::{CampaignConfig, ConfigError, PhaseDurations};
pub use data::{DataError, StateInfo, StateTable};
pub use debate::{DebateInput, DebateMatchup, DebateOutcome, ResearchEdge, score_debate};
pub use demographic_polling::{
    CampaignEffects, CandidateProfile, DemographicPollSnapshot, ElectoralProjection, Geography,
    Party,
};
pub use demographics::{ALL_DEMOGRAPHIC_KEYS, Class, DemographicGroup, DemographicKey, Gender, Race};
pub use election::{
    Delegation, ElectionInput, ElectionResolution, StateOutcome, WeeklyMomentum, resolve_election,
};
pub use engine::{CampaignEngine, EngineError, Submission, TickOutcome};
pub use issues::{Issue, IssueProfile};
pub use phase::{
    CampaignIdentity, CampaignPhase, CampaignState, CampaignStatus, PhaseActionKey,
    TransitionError,
};
pub use polling::{PollRequest, PollSnapshot, PollTrend, PollType, TrendDirection};

/// Trait for abstracting reference data loading
/// Hosts with their own tables should provide this
pub trait ReferenceDataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the campaign configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config(&self) -> Result<CampaignConfig, Self::Error>;

    /// Load the per-state electoral and demographic table
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be loaded or fails validation.
    fn load_states(&self) -> Result<StateTable, Self::Error>;
}

/// Loader backed by the tables embedded in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDataLoader;

impl ReferenceDataLoader for StaticDataLoader {
    type Error = DataError;

    fn load_config(&self) -> Result<CampaignConfig, Self::Error> {
        Ok(CampaignConfig::load_from_static())
    }

    fn load_states(&self) -> Result<StateTable, Self::Error> {
        StateTable::load_from_static()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Unavailable;

    impl fmt::Display for Unavailable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("reference store offline")
        }
    }

    impl std::error::Error for Unavailable {}

    #[derive(Clone, Copy, Default)]
    struct OfflineLoader;

    impl ReferenceDataLoader for OfflineLoader {
        type Error = Unavailable;

        fn load_config(&self) -> Result<CampaignConfig, Self::Error> {
            Ok(CampaignConfig::default())
        }

        fn load_states(&self) -> Result<StateTable, Self::Error> {
            Err(Unavailable)
        }
    }

    #[derive(Clone, Copy, Default)]
    struct TinyLoader;

    impl ReferenceDataLoader for TinyLoader {
        type Error = DataError;

        fn load_config(&self) -> Result<CampaignConfig, Self::Error> {
            CampaignConfig::from_json(r#"{"electoral_votes_to_win": 4}"#)
                .map_err(|err| DataError::Parse(err.to_string()))
        }

        fn load_states(&self) -> Result<StateTable, Self::Error> {
            StateTable::from_json(
                r#"{"states":[{"code":"AA","name":"Alpha","electoral_votes":3,"house_seats":1,
                     "race":{"white":100.0},"class":{"middle":100.0},"female_share":50.0},
                    {"code":"BB","name":"Beta","electoral_votes":4,"house_seats":2,
                     "race":{"black":50.0,"hispanic":50.0},"class":{"lower":100.0},"female_share":50.0}]}"#,
            )
        }
    }

    #[test]
    fn static_loader_builds_an_engine() {
        let engine = CampaignEngine::from_loader(&StaticDataLoader).unwrap();
        assert_eq!(engine.states().len(), 51);
        assert_eq!(engine.config(), &CampaignConfig::default());
        assert_eq!(engine.groups().len(), ALL_DEMOGRAPHIC_KEYS.len());
    }

    #[test]
    fn loader_failures_are_wrapped() {
        let err = CampaignEngine::from_loader(&OfflineLoader)
            .err()
            .expect("offline loader must fail");
        assert!(matches!(err, EngineError::Loader(_)));
        assert!(err.to_string().contains("reference store offline"));
    }

    #[test]
    fn custom_tables_drive_the_engine() {
        let engine = CampaignEngine::from_loader(&TinyLoader).unwrap();
        assert_eq!(engine.states().total_electoral_votes(), 7);
        assert_eq!(engine.config().electoral_votes_to_win, 4);
    }
}
