//! Action catalog: costs, durations, effect distributions, and the sparse
//! per-type tables for backfire, cooldowns, weekly caps, and media boosts.
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::data::DataError;
use crate::phase::PhaseActionKey;

/// Every action a campaign can queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    AnnounceCandidacy,
    TvAdNational,
    TvAdLocal,
    RadioAd,
    DigitalAd,
    SocialMediaCampaign,
    PrintAd,
    PressConference,
    MediaInterview,
    PolicySpeech,
    TownHall,
    Rally,
    DoorToDoor,
    PhoneBanking,
    VoterRegistration,
    GetOutTheVote,
    FundraisingDinner,
    OnlineFundraiser,
    DonorMeeting,
    SeekEndorsement,
    OppositionResearch,
    DebatePrep,
    HireStaff,
}

/// Normal distribution parameters for one effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectDistribution {
    pub mean: f64,
    pub std_dev: f64,
}

const fn dist(mean: f64, std_dev: f64) -> EffectDistribution {
    EffectDistribution { mean, std_dev }
}

const NONE: EffectDistribution = dist(0.0, 0.0);

/// Base economics of an action type at standard intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionSpec {
    /// Dollars.
    pub base_cost: f64,
    pub action_points: u32,
    /// In-game hours until the action completes.
    pub duration_game_hours: f64,
    pub polling: EffectDistribution,
    pub reputation: EffectDistribution,
    pub funds: EffectDistribution,
    /// Mean new donors; spread is a fixed fraction of the mean.
    pub donors_mean: f64,
}

const fn spec(
    base_cost: f64,
    action_points: u32,
    duration_game_hours: f64,
    polling: EffectDistribution,
    reputation: EffectDistribution,
    funds: EffectDistribution,
    donors_mean: f64,
) -> ActionSpec {
    ActionSpec {
        base_cost,
        action_points,
        duration_game_hours,
        polling,
        reputation,
        funds,
        donors_mean,
    }
}

impl ActionType {
    pub const ALL: [Self; 23] = [
        Self::AnnounceCandidacy,
        Self::TvAdNational,
        Self::TvAdLocal,
        Self::RadioAd,
        Self::DigitalAd,
        Self::SocialMediaCampaign,
        Self::PrintAd,
        Self::PressConference,
        Self::MediaInterview,
        Self::PolicySpeech,
        Self::TownHall,
        Self::Rally,
        Self::DoorToDoor,
        Self::PhoneBanking,
        Self::VoterRegistration,
        Self::GetOutTheVote,
        Self::FundraisingDinner,
        Self::OnlineFundraiser,
        Self::DonorMeeting,
        Self::SeekEndorsement,
        Self::OppositionResearch,
        Self::DebatePrep,
        Self::HireStaff,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnnounceCandidacy => "announce_candidacy",
            Self::TvAdNational => "tv_ad_national",
            Self::TvAdLocal => "tv_ad_local",
            Self::RadioAd => "radio_ad",
            Self::DigitalAd => "digital_ad",
            Self::SocialMediaCampaign => "social_media_campaign",
            Self::PrintAd => "print_ad",
            Self::PressConference => "press_conference",
            Self::MediaInterview => "media_interview",
            Self::PolicySpeech => "policy_speech",
            Self::TownHall => "town_hall",
            Self::Rally => "rally",
            Self::DoorToDoor => "door_to_door",
            Self::PhoneBanking => "phone_banking",
            Self::VoterRegistration => "voter_registration",
            Self::GetOutTheVote => "get_out_the_vote",
            Self::FundraisingDinner => "fundraising_dinner",
            Self::OnlineFundraiser => "online_fundraiser",
            Self::DonorMeeting => "donor_meeting",
            Self::SeekEndorsement => "seek_endorsement",
            Self::OppositionResearch => "opposition_research",
            Self::DebatePrep => "debate_prep",
            Self::HireStaff => "hire_staff",
        }
    }

    /// Phase-gating category for this action.
    #[must_use]
    pub const fn phase_key(self) -> PhaseActionKey {
        match self {
            Self::AnnounceCandidacy => PhaseActionKey::Announce,
            Self::FundraisingDinner | Self::OnlineFundraiser | Self::DonorMeeting => {
                PhaseActionKey::Fundraise
            }
            Self::HireStaff => PhaseActionKey::HireStaff,
            Self::PolicySpeech | Self::TownHall => PhaseActionKey::PolicySpeech,
            Self::TvAdNational
            | Self::TvAdLocal
            | Self::RadioAd
            | Self::DigitalAd
            | Self::SocialMediaCampaign
            | Self::PrintAd
            | Self::PressConference
            | Self::MediaInterview => PhaseActionKey::Media,
            Self::Rally => PhaseActionKey::Rally,
            Self::DoorToDoor | Self::PhoneBanking | Self::VoterRegistration => {
                PhaseActionKey::GroundGame
            }
            Self::OppositionResearch => PhaseActionKey::OppositionResearch,
            Self::SeekEndorsement => PhaseActionKey::Endorsement,
            Self::DebatePrep => PhaseActionKey::Debate,
            Self::GetOutTheVote => PhaseActionKey::GetOutTheVote,
        }
    }

    /// Base cost, points, duration, and effect distributions.
    #[must_use]
    pub const fn spec(self) -> ActionSpec {
        match self {
            Self::AnnounceCandidacy => spec(
                10_000.0,
                2,
                6.0,
                dist(3.0, 1.0),
                dist(3.0, 1.0),
                dist(25_000.0, 10_000.0),
                100.0,
            ),
            Self::TvAdNational => spec(250_000.0, 3, 72.0, dist(2.5, 1.0), dist(0.5, 0.5), NONE, 0.0),
            Self::TvAdLocal => spec(60_000.0, 2, 48.0, dist(1.5, 0.6), dist(0.3, 0.3), NONE, 0.0),
            Self::RadioAd => spec(20_000.0, 1, 24.0, dist(0.8, 0.4), dist(0.2, 0.2), NONE, 0.0),
            Self::DigitalAd => spec(25_000.0, 1, 24.0, dist(1.0, 0.5), dist(0.2, 0.3), NONE, 0.0),
            Self::SocialMediaCampaign => {
                spec(10_000.0, 1, 12.0, dist(1.2, 0.9), dist(0.4, 0.6), NONE, 0.0)
            }
            Self::PrintAd => spec(8_000.0, 1, 24.0, dist(0.4, 0.2), dist(0.2, 0.1), NONE, 0.0),
            Self::PressConference => spec(5_000.0, 2, 4.0, dist(1.0, 0.8), dist(1.0, 1.0), NONE, 0.0),
            Self::MediaInterview => spec(0.0, 1, 3.0, dist(0.8, 0.7), dist(1.2, 1.0), NONE, 0.0),
            Self::PolicySpeech => spec(15_000.0, 2, 6.0, dist(1.2, 0.6), dist(1.5, 0.8), NONE, 0.0),
            Self::TownHall => spec(8_000.0, 2, 6.0, dist(1.0, 0.5), dist(2.0, 0.8), NONE, 0.0),
            Self::Rally => spec(
                40_000.0,
                3,
                8.0,
                dist(1.8, 0.8),
                dist(1.0, 0.6),
                dist(20_000.0, 8_000.0),
                50.0,
            ),
            Self::DoorToDoor => spec(5_000.0, 2, 24.0, dist(0.6, 0.2), dist(0.5, 0.2), NONE, 0.0),
            Self::PhoneBanking => spec(
                3_000.0,
                1,
                12.0,
                dist(0.4, 0.2),
                dist(0.2, 0.1),
                dist(5_000.0, 2_000.0),
                20.0,
            ),
            Self::VoterRegistration => {
                spec(10_000.0, 2, 48.0, dist(0.7, 0.3), dist(0.8, 0.3), NONE, 0.0)
            }
            Self::GetOutTheVote => spec(50_000.0, 3, 24.0, dist(2.0, 0.7), dist(0.5, 0.3), NONE, 0.0),
            Self::FundraisingDinner => spec(
                20_000.0,
                2,
                6.0,
                dist(0.2, 0.2),
                dist(0.5, 0.4),
                dist(150_000.0, 50_000.0),
                40.0,
            ),
            Self::OnlineFundraiser => spec(
                2_000.0,
                1,
                24.0,
                dist(0.1, 0.1),
                dist(0.1, 0.1),
                dist(40_000.0, 20_000.0),
                300.0,
            ),
            Self::DonorMeeting => spec(
                1_000.0,
                1,
                3.0,
                dist(0.0, 0.1),
                dist(0.2, 0.2),
                dist(75_000.0, 30_000.0),
                5.0,
            ),
            Self::SeekEndorsement => spec(5_000.0, 2, 24.0, dist(1.0, 0.5), dist(2.0, 0.8), NONE, 0.0),
            Self::OppositionResearch => {
                spec(30_000.0, 2, 48.0, dist(0.5, 0.8), dist(-0.5, 0.5), NONE, 0.0)
            }
            Self::DebatePrep => spec(10_000.0, 2, 12.0, dist(0.5, 0.3), dist(0.8, 0.3), NONE, 0.0),
            Self::HireStaff => spec(25_000.0, 1, 24.0, dist(0.2, 0.1), dist(0.5, 0.2), NONE, 0.0),
        }
    }

    /// Base backfire probability; types without an entry never backfire.
    #[must_use]
    pub fn backfire_chance(self) -> f64 {
        backfire_chances().get(&self).copied().unwrap_or(0.0)
    }

    /// Real hours before the type may be queued again, if gated.
    #[must_use]
    pub fn cooldown_hours(self) -> Option<f64> {
        action_cooldowns().get(&self).copied()
    }

    /// Maximum uses per UTC week, if capped.
    #[must_use]
    pub fn weekly_cap(self) -> Option<u32> {
        weekly_caps().get(&self).copied()
    }

    /// Base media boost for media-facing actions, 0 otherwise.
    #[must_use]
    pub fn media_boost(self) -> f64 {
        media_boosts().get(&self).copied().unwrap_or(0.0)
    }

    /// Whether a clean execution always yields an endorsement.
    #[must_use]
    pub fn triggers_endorsement(self) -> bool {
        endorsement_triggers().contains(&self)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| DataError::UnknownActionType(s.to_string()))
    }
}

fn backfire_chances() -> &'static HashMap<ActionType, f64> {
    static TABLE: OnceLock<HashMap<ActionType, f64>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            (ActionType::TvAdNational, 0.05),
            (ActionType::TvAdLocal, 0.04),
            (ActionType::SocialMediaCampaign, 0.08),
            (ActionType::PressConference, 0.10),
            (ActionType::MediaInterview, 0.12),
            (ActionType::PolicySpeech, 0.05),
            (ActionType::TownHall, 0.07),
            (ActionType::Rally, 0.06),
            (ActionType::FundraisingDinner, 0.03),
            (ActionType::DonorMeeting, 0.04),
            (ActionType::OppositionResearch, 0.15),
        ])
    })
}

fn action_cooldowns() -> &'static HashMap<ActionType, f64> {
    static TABLE: OnceLock<HashMap<ActionType, f64>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            (ActionType::AnnounceCandidacy, 168.0),
            (ActionType::TvAdNational, 24.0),
            (ActionType::PressConference, 12.0),
            (ActionType::Rally, 8.0),
            (ActionType::FundraisingDinner, 24.0),
            (ActionType::SeekEndorsement, 24.0),
            (ActionType::OppositionResearch, 48.0),
            (ActionType::DebatePrep, 12.0),
        ])
    })
}

fn weekly_caps() -> &'static HashMap<ActionType, u32> {
    static TABLE: OnceLock<HashMap<ActionType, u32>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            (ActionType::AnnounceCandidacy, 1),
            (ActionType::TvAdNational, 3),
            (ActionType::Rally, 5),
            (ActionType::FundraisingDinner, 2),
            (ActionType::SeekEndorsement, 3),
            (ActionType::OppositionResearch, 2),
        ])
    })
}

fn media_boosts() -> &'static HashMap<ActionType, f64> {
    static TABLE: OnceLock<HashMap<ActionType, f64>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            (ActionType::TvAdNational, 5.0),
            (ActionType::TvAdLocal, 3.0),
            (ActionType::RadioAd, 2.0),
            (ActionType::DigitalAd, 2.0),
            (ActionType::SocialMediaCampaign, 3.0),
            (ActionType::PrintAd, 1.0),
            (ActionType::PressConference, 4.0),
            (ActionType::MediaInterview, 3.0),
        ])
    })
}

fn endorsement_triggers() -> &'static HashSet<ActionType> {
    static TABLE: OnceLock<HashSet<ActionType>> = OnceLock::new();
    TABLE.get_or_init(|| HashSet::from([ActionType::SeekEndorsement]))
}

/// How hard the campaign leans into an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionIntensity {
    Minimal,
    #[default]
    Standard,
    Aggressive,
    Maximum,
}

/// Scaling applied to an action's base economics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityMultipliers {
    pub cost: f64,
    pub effect: f64,
    pub backfire: f64,
    pub time: f64,
    pub extra_action_points: u32,
}

impl ActionIntensity {
    pub const ALL: [Self; 4] = [Self::Minimal, Self::Standard, Self::Aggressive, Self::Maximum];

    #[must_use]
    pub const fn multipliers(self) -> IntensityMultipliers {
        match self {
            Self::Minimal => IntensityMultipliers {
                cost: 0.5,
                effect: 0.6,
                backfire: 0.75,
                time: 0.75,
                extra_action_points: 0,
            },
            Self::Standard => IntensityMultipliers {
                cost: 1.0,
                effect: 1.0,
                backfire: 1.0,
                time: 1.0,
                extra_action_points: 0,
            },
            Self::Aggressive => IntensityMultipliers {
                cost: 1.75,
                effect: 1.5,
                backfire: 1.25,
                time: 1.25,
                extra_action_points: 1,
            },
            Self::Maximum => IntensityMultipliers {
                cost: 2.5,
                effect: 2.0,
                backfire: 1.5,
                time: 1.5,
                extra_action_points: 2,
            },
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Standard => "standard",
            Self::Aggressive => "aggressive",
            Self::Maximum => "maximum",
        }
    }
}

/// Dollar cost of `action` at `intensity`.
#[must_use]
pub fn action_cost(action: ActionType, intensity: ActionIntensity) -> f64 {
    action.spec().base_cost * intensity.multipliers().cost
}

/// Action points consumed by `action` at `intensity`.
#[must_use]
pub const fn action_points(action: ActionType, intensity: ActionIntensity) -> u32 {
    action.spec().action_points + intensity.multipliers().extra_action_points
}

/// Backfire probability after intensity scaling, in `[0, 1]`.
#[must_use]
pub fn backfire_probability(action: ActionType, intensity: ActionIntensity) -> f64 {
    (action.backfire_chance() * intensity.multipliers().backfire).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::CampaignPhase;

    #[test]
    fn keys_roundtrip_and_unknown_fails() {
        for action in ActionType::ALL {
            assert_eq!(action.as_str().parse::<ActionType>().unwrap(), action);
        }
        assert!(matches!(
            "skywriting".parse::<ActionType>(),
            Err(DataError::UnknownActionType(_))
        ));
    }

    #[test]
    fn intensity_table_is_monotone() {
        let tiers = ActionIntensity::ALL.map(ActionIntensity::multipliers);
        for pair in tiers.windows(2) {
            assert!(pair[0].cost < pair[1].cost);
            assert!(pair[0].effect < pair[1].effect);
            assert!(pair[0].backfire < pair[1].backfire);
            assert!(pair[0].time < pair[1].time);
            assert!(pair[0].extra_action_points <= pair[1].extra_action_points);
        }
        for action in ActionType::ALL {
            let costs = ActionIntensity::ALL.map(|i| action_cost(action, i));
            assert!(costs.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn sparse_tables_default_to_none() {
        assert!(ActionType::DoorToDoor.backfire_chance().abs() < f64::EPSILON);
        assert_eq!(ActionType::DoorToDoor.cooldown_hours(), None);
        assert_eq!(ActionType::DoorToDoor.weekly_cap(), None);
        assert!(ActionType::DoorToDoor.media_boost().abs() < f64::EPSILON);
        assert!((ActionType::OppositionResearch.backfire_chance() - 0.15).abs() < f64::EPSILON);
        assert!(ActionType::SeekEndorsement.triggers_endorsement());
        assert!(!ActionType::Rally.triggers_endorsement());
    }

    #[test]
    fn every_type_is_legal_in_some_phase() {
        for action in ActionType::ALL {
            assert!(
                CampaignPhase::ALL
                    .iter()
                    .any(|phase| phase.allowed_actions().contains(&action.phase_key())),
                "{action} is never legal"
            );
        }
        assert!(
            !CampaignPhase::Active
                .allowed_actions()
                .contains(&ActionType::AnnounceCandidacy.phase_key())
        );
    }

    #[test]
    fn backfire_probability_clamps() {
        let p = backfire_probability(ActionType::OppositionResearch, ActionIntensity::Maximum);
        assert!((p - 0.225).abs() < 1e-12);
        assert_eq!(action_points(ActionType::TvAdNational, ActionIntensity::Maximum), 5);
    }
}
