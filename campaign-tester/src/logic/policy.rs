use std::fmt;

use campaign_engine::actions::{ActionIntensity, ActionQueue, ActionTargeting, ActionType};
use campaign_engine::ads::{AdSpendLedger, MediaType};
use campaign_engine::phase::CampaignPhase;
use campaign_engine::polling::StatePriority;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// What a policy sees when it plans the next move.
#[derive(Debug, Clone, Copy)]
pub struct PolicyView<'a> {
    pub phase: CampaignPhase,
    pub funds: f64,
    pub queue: &'a ActionQueue,
    pub ads: &'a AdSpendLedger,
    /// Battleground ranking from the latest state polls, highest first.
    pub priorities: &'a [StatePriority],
}

/// One action the policy would like to queue.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDecision {
    pub action_type: ActionType,
    pub intensity: ActionIntensity,
    pub targeting: ActionTargeting,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(action_type: ActionType, intensity: ActionIntensity) -> Self {
        Self {
            action_type,
            intensity,
            targeting: ActionTargeting::default(),
        }
    }

    #[must_use]
    pub fn in_state(mut self, code: Option<&str>) -> Self {
        if let Some(code) = code {
            self.targeting.states.push(code.to_string());
        }
        self
    }
}

/// An ad buy the policy wants this cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdPlan {
    pub media: MediaType,
    pub budget: f64,
}

/// Policy interface for automated campaign play.
pub trait CampaignPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Candidate actions in order of preference. The runner queues the first
    /// one the engine accepts.
    fn plan_actions(&mut self, view: &PolicyView<'_>) -> Vec<PolicyDecision>;

    /// Ad buy for the current ad cycle, if any.
    fn plan_ad_buy(&mut self, view: &PolicyView<'_>) -> Option<AdPlan>;
}

/// Built-in campaign strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStrategy {
    Balanced,
    Aggressive,
    Frugal,
}

impl CampaignStrategy {
    pub const ALL: [Self; 3] = [Self::Balanced, Self::Aggressive, Self::Frugal];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::Aggressive => "Aggressive",
            Self::Frugal => "Frugal",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn CampaignPolicy + Send> {
        match self {
            Self::Balanced => Box::new(BalancedPolicy::new(seed)),
            Self::Aggressive => Box::new(AggressivePolicy),
            Self::Frugal => Box::new(FrugalPolicy),
        }
    }
}

impl fmt::Display for CampaignStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rotates through every phase-appropriate action at standard intensity.
struct BalancedPolicy {
    rng: ChaCha20Rng,
    cursor: usize,
}

impl BalancedPolicy {
    fn new(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let cursor = rng.gen_range(0..8);
        Self { rng, cursor }
    }
}

/// Spends heavily on media and rallies in the closest states.
struct AggressivePolicy;

/// Raises money first and only pays for cheap contact.
struct FrugalPolicy;

fn top_state<'a>(view: &PolicyView<'a>) -> Option<&'a str> {
    view.priorities.first().map(|p| p.code.as_str())
}

fn balanced_menu(phase: CampaignPhase) -> &'static [ActionType] {
    match phase {
        CampaignPhase::Announcement => &[
            ActionType::AnnounceCandidacy,
            ActionType::HireStaff,
            ActionType::OnlineFundraiser,
            ActionType::PolicySpeech,
        ],
        CampaignPhase::Fundraising => &[
            ActionType::FundraisingDinner,
            ActionType::DonorMeeting,
            ActionType::SeekEndorsement,
            ActionType::DigitalAd,
            ActionType::OppositionResearch,
            ActionType::PressConference,
        ],
        CampaignPhase::Active => &[
            ActionType::Rally,
            ActionType::DoorToDoor,
            ActionType::TvAdLocal,
            ActionType::TownHall,
            ActionType::OnlineFundraiser,
            ActionType::PhoneBanking,
            ActionType::DebatePrep,
            ActionType::SocialMediaCampaign,
        ],
        CampaignPhase::Resolution => &[
            ActionType::GetOutTheVote,
            ActionType::Rally,
            ActionType::RadioAd,
        ],
    }
}

impl CampaignPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn plan_actions(&mut self, view: &PolicyView<'_>) -> Vec<PolicyDecision> {
        let menu = balanced_menu(view.phase);
        let start = self.cursor % menu.len();
        self.cursor = self.cursor.wrapping_add(1);
        let target = top_state(view);
        let running = |action: ActionType| {
            view.queue
                .pending
                .iter()
                .chain(&view.queue.in_progress)
                .any(|queued| queued.action_type == action)
        };
        menu.iter()
            .cycle()
            .skip(start)
            .take(menu.len())
            .filter(|&&action| !running(action))
            .map(|&action| {
                let decision = PolicyDecision::new(action, ActionIntensity::Standard);
                match action {
                    ActionType::Rally | ActionType::DoorToDoor | ActionType::TvAdLocal => {
                        decision.in_state(target)
                    }
                    _ => decision,
                }
            })
            .collect()
    }

    fn plan_ad_buy(&mut self, view: &PolicyView<'_>) -> Option<AdPlan> {
        if view.funds < 50_000.0 {
            return None;
        }
        let media = MediaType::ALL[self.rng.gen_range(0..MediaType::ALL.len())];
        Some(AdPlan {
            media,
            budget: view.funds * 0.08,
        })
    }
}

impl CampaignPolicy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "Aggressive"
    }

    fn plan_actions(&mut self, view: &PolicyView<'_>) -> Vec<PolicyDecision> {
        let target = top_state(view);
        let intensity = if view.funds > 1_000_000.0 && view.queue.action_points_remaining >= 6 {
            ActionIntensity::Maximum
        } else {
            ActionIntensity::Aggressive
        };
        let mut plan = match view.phase {
            CampaignPhase::Announcement => vec![
                PolicyDecision::new(ActionType::AnnounceCandidacy, intensity),
                PolicyDecision::new(ActionType::PolicySpeech, intensity),
                PolicyDecision::new(ActionType::HireStaff, ActionIntensity::Standard),
            ],
            CampaignPhase::Fundraising => vec![
                PolicyDecision::new(ActionType::TvAdNational, intensity),
                PolicyDecision::new(ActionType::OppositionResearch, intensity),
                PolicyDecision::new(ActionType::PressConference, intensity),
                PolicyDecision::new(ActionType::SeekEndorsement, intensity),
            ],
            CampaignPhase::Active => vec![
                PolicyDecision::new(ActionType::Rally, intensity).in_state(target),
                PolicyDecision::new(ActionType::TvAdLocal, intensity).in_state(target),
                PolicyDecision::new(ActionType::TvAdNational, intensity),
                PolicyDecision::new(ActionType::MediaInterview, intensity),
                PolicyDecision::new(ActionType::DebatePrep, intensity),
            ],
            CampaignPhase::Resolution => vec![
                PolicyDecision::new(ActionType::GetOutTheVote, intensity).in_state(target),
                PolicyDecision::new(ActionType::Rally, intensity).in_state(target),
                PolicyDecision::new(ActionType::TvAdNational, intensity),
            ],
        };
        // Broke campaigns still need a way back to solvency.
        plan.push(PolicyDecision::new(
            ActionType::FundraisingDinner,
            ActionIntensity::Standard,
        ));
        plan
    }

    fn plan_ad_buy(&mut self, view: &PolicyView<'_>) -> Option<AdPlan> {
        (view.funds > 10_000.0).then(|| AdPlan {
            media: MediaType::Television,
            budget: view.funds * 0.25,
        })
    }
}

impl CampaignPolicy for FrugalPolicy {
    fn name(&self) -> &'static str {
        "Frugal"
    }

    fn plan_actions(&mut self, view: &PolicyView<'_>) -> Vec<PolicyDecision> {
        let target = top_state(view);
        let cheap = ActionIntensity::Minimal;
        match view.phase {
            CampaignPhase::Announcement => vec![
                PolicyDecision::new(ActionType::AnnounceCandidacy, cheap),
                PolicyDecision::new(ActionType::OnlineFundraiser, cheap),
            ],
            CampaignPhase::Fundraising => vec![
                PolicyDecision::new(ActionType::OnlineFundraiser, cheap),
                PolicyDecision::new(ActionType::DonorMeeting, cheap),
                PolicyDecision::new(ActionType::FundraisingDinner, cheap),
                PolicyDecision::new(ActionType::SocialMediaCampaign, cheap),
            ],
            CampaignPhase::Active => vec![
                PolicyDecision::new(ActionType::DoorToDoor, cheap).in_state(target),
                PolicyDecision::new(ActionType::PhoneBanking, cheap).in_state(target),
                PolicyDecision::new(ActionType::VoterRegistration, cheap).in_state(target),
                PolicyDecision::new(ActionType::OnlineFundraiser, cheap),
            ],
            CampaignPhase::Resolution => vec![
                PolicyDecision::new(ActionType::GetOutTheVote, cheap).in_state(target),
            ],
        }
    }

    fn plan_ad_buy(&mut self, view: &PolicyView<'_>) -> Option<AdPlan> {
        if view.funds < 200_000.0 {
            return None;
        }
        // Stay on the cheapest medium until it saturates.
        let media = if view.ads.prior_spend(MediaType::Digital)
            < MediaType::Digital.saturation_threshold()
        {
            MediaType::Digital
        } else {
            MediaType::SocialMedia
        };
        Some(AdPlan {
            media,
            budget: view.funds * 0.05,
        })
    }
}
