//! Tuning values for action effects, polling noise, ad pricing, debates and
//! election thresholds.
//!
//! Per-campaign knobs (phase lengths, time multiplier, action points) live in
//! `CampaignConfig` and the embedded `campaign.json`; everything here is fixed
//! model math shared by every campaign.

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_TARGET_PHASE: &str = "campaign::phase";
pub(crate) const LOG_TARGET_ACTIONS: &str = "campaign::actions";
pub(crate) const LOG_TARGET_QUEUE: &str = "campaign::queue";
pub(crate) const LOG_TARGET_POLLING: &str = "campaign::polling";
pub(crate) const LOG_TARGET_ELECTION: &str = "campaign::election";

// Action economy -----------------------------------------------------------
pub(crate) const SPEND_WARNING_RATIO: f64 = 0.5;
pub(crate) const BACKFIRE_WARNING_THRESHOLD: f64 = 0.10;
pub(crate) const BACKFIRE_POLL_FACTOR: f64 = 0.5;
pub(crate) const BACKFIRE_REPUTATION_FACTOR: f64 = 1.5;
pub(crate) const BACKFIRE_FUNDS_FACTOR: f64 = 0.3;
pub(crate) const STATE_TARGETING_BONUS: f64 = 1.2;
pub(crate) const DEMOGRAPHIC_TARGETING_BONUS: f64 = 1.15;
pub(crate) const STATE_EFFECT_SHARE: f64 = 1.3;
pub(crate) const DEMOGRAPHIC_EFFECT_SHARE: f64 = 1.5;
pub(crate) const ENDORSEMENT_BASELINE_CHANCE: f64 = 0.05;
pub(crate) const SCANDAL_CHANCE_ON_BACKFIRE: f64 = 0.30;
pub(crate) const MEDIA_BACKFIRE_FACTOR: f64 = 2.0;
pub(crate) const MEDIA_BOOST_JITTER: f64 = 0.4;
pub(crate) const DONOR_SPREAD_RATIO: f64 = 0.25;

// Ad spend -----------------------------------------------------------------
pub(crate) const AD_EFFECTIVENESS_FLOOR_RATIO: f64 = 0.10;
pub(crate) const AD_MAX_POLLING_IMPACT: f64 = 10.0;
pub(crate) const AD_REFERENCE_MARKET: f64 = 1_000_000.0;
pub(crate) const AD_MARKET_LOG_WEIGHT: f64 = 0.15;
pub(crate) const AD_MARKET_MULTIPLIER_FLOOR: f64 = 0.5;
pub(crate) const AD_COMPETITIVENESS_WEIGHT: f64 = 0.5;
pub(crate) const AD_DIMINISHING_EXPONENT: f64 = 0.6;
pub(crate) const AD_DISTRICT_AUDIENCE: f64 = 761_000.0;

// Debate -------------------------------------------------------------------
pub(crate) const DEBATE_CHARISMA_WEIGHT: f64 = 0.35;
pub(crate) const DEBATE_KNOWLEDGE_WEIGHT: f64 = 0.35;
pub(crate) const DEBATE_COMPOSURE_WEIGHT: f64 = 0.30;
pub(crate) const DEBATE_PREPARATION_WEIGHT: f64 = 0.2;
pub(crate) const DEBATE_FATIGUE_WEIGHT: f64 = 0.15;
pub(crate) const DEBATE_SCANDAL_FLOOR: f64 = -20.0;
pub(crate) const DEBATE_JITTER_SPAN: f64 = 5.0;
pub(crate) const DEBATE_ATTACKER_BONUS_MAX: f64 = 20.0;
pub(crate) const DEBATE_DEFENDER_PENALTY_MAX: f64 = 15.0;
pub(crate) const DEBATE_PERSUASION_CAP: f64 = 5.0;
pub(crate) const DEBATE_MOMENTUM_FACTOR: f64 = 0.4;
pub(crate) const DEBATE_MOMENTUM_CAP: f64 = 2.0;

// Demographics -------------------------------------------------------------
pub(crate) const ISSUE_POSITION_LIMIT: f64 = 5.0;
pub(crate) const NEUTRAL_IMPORTANCE: f64 = 0.5;
pub(crate) const ALIGNMENT_DISTANCE_SCALE: f64 = 10.0;
pub(crate) const TURNOUT_MIN: f64 = 0.2;
pub(crate) const TURNOUT_MAX: f64 = 0.95;
pub(crate) const APPEAL_ALIGNMENT_WEIGHT: f64 = 0.60;
pub(crate) const APPEAL_AWARENESS_WEIGHT: f64 = 0.25;
pub(crate) const APPEAL_SPECIAL_WEIGHT: f64 = 0.15;
pub(crate) const APPEAL_ENTHUSIASM_DIVISOR: f64 = 200.0;
pub(crate) const STATE_VARIATION_SPAN: f64 = 1.0;

// Demographic polling ------------------------------------------------------
pub(crate) const PARTY_LEAN_FACTOR: f64 = 0.5;
pub(crate) const ALIGNMENT_SUPPORT_SCALE: f64 = 30.0;
pub(crate) const DEMOGRAPHIC_NOISE_SPAN: f64 = 4.0;
pub(crate) const COMPETITIVE_MARGIN: f64 = 20.0;
pub(crate) const CHARISMA_BONUS_DIVISOR: f64 = 25.0;
pub(crate) const INCUMBENCY_BONUS: f64 = 1.5;
pub(crate) const ENDORSEMENT_SUPPORT_BONUS: f64 = 0.75;
pub(crate) const SCANDAL_SUPPORT_PENALTY: f64 = 2.0;
pub(crate) const MEDIA_SUPPORT_FACTOR: f64 = 0.1;
pub(crate) const TIE_EPSILON: f64 = 1e-9;

// Polling engine -----------------------------------------------------------
pub(crate) const TREND_THRESHOLD: f64 = 0.5;
pub(crate) const DEMOGRAPHIC_JITTER_FACTOR: f64 = 1.5;
pub(crate) const RELIABILITY_MOE_SCALE: f64 = 10.0;

// Election resolution ------------------------------------------------------
pub(crate) const MOMENTUM_MARGIN_FACTOR: f64 = 0.5;
pub(crate) const MOMENTUM_MARGIN_CAP: f64 = 1.5;
pub(crate) const RECOUNT_MARGIN: f64 = 0.5;
pub(crate) const TIE_MARGIN: f64 = 0.01;
pub(crate) const WIN_PROB_MARGIN_SCALE: f64 = 10.0;
pub(crate) const WIN_PROB_SPREAD: f64 = 0.4;
pub(crate) const WIN_PROB_VOLATILITY_PENALTY: f64 = 0.3;
pub(crate) const WIN_PROB_MIN: f64 = 0.5;
pub(crate) const WIN_PROB_MAX: f64 = 0.99;
