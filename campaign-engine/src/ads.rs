//! Advertising buys: pricing, diminishing returns, and budget allocation.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{
    AD_COMPETITIVENESS_WEIGHT, AD_DIMINISHING_EXPONENT, AD_EFFECTIVENESS_FLOOR_RATIO,
    AD_MARKET_LOG_WEIGHT, AD_MARKET_MULTIPLIER_FLOOR, AD_MAX_POLLING_IMPACT, AD_REFERENCE_MARKET,
};
use crate::numbers::clamp_unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Television,
    Radio,
    Digital,
    Print,
    SocialMedia,
    Outdoor,
}

impl MediaType {
    pub const ALL: [Self; 6] = [
        Self::Television,
        Self::Radio,
        Self::Digital,
        Self::Print,
        Self::SocialMedia,
        Self::Outdoor,
    ];

    /// Dollars per thousand impressions in a reference market.
    #[must_use]
    pub const fn base_cpm(self) -> f64 {
        match self {
            Self::Television => 25.0,
            Self::Radio => 12.0,
            Self::Digital => 8.0,
            Self::Print => 15.0,
            Self::SocialMedia => 6.0,
            Self::Outdoor => 5.0,
        }
    }

    /// Effectiveness of the first dollar spent.
    #[must_use]
    pub const fn base_effectiveness(self) -> f64 {
        match self {
            Self::Television => 0.75,
            Self::Radio => 0.5,
            Self::Digital => 0.55,
            Self::Print => 0.35,
            Self::SocialMedia => 0.6,
            Self::Outdoor => 0.3,
        }
    }

    /// Cumulative spend at which effectiveness has decayed noticeably.
    #[must_use]
    pub const fn saturation_threshold(self) -> f64 {
        match self {
            Self::Television => 500_000.0,
            Self::Radio => 100_000.0,
            Self::Digital => 150_000.0,
            Self::Print => 50_000.0,
            Self::SocialMedia => 80_000.0,
            Self::Outdoor => 40_000.0,
        }
    }
}

/// Price per thousand impressions, adjusted for market size and race competitiveness.
///
/// Larger markets cost more on a log scale; `competitiveness` (0-1) raises
/// prices linearly as rival campaigns bid for the same inventory.
#[must_use]
pub fn calculate_cpm(media: MediaType, market_size: f64, competitiveness: f64) -> f64 {
    let market_multiplier = if market_size > 0.0 {
        (1.0 + AD_MARKET_LOG_WEIGHT * (market_size / AD_REFERENCE_MARKET).ln())
            .max(AD_MARKET_MULTIPLIER_FLOOR)
    } else {
        AD_MARKET_MULTIPLIER_FLOOR
    };
    let competition_multiplier = 1.0 + AD_COMPETITIVENESS_WEIGHT * clamp_unit(competitiveness);
    media.base_cpm() * market_multiplier * competition_multiplier
}

#[must_use]
pub fn calculate_impressions(budget: f64, cpm: f64) -> f64 {
    if cpm <= 0.0 || budget <= 0.0 {
        return 0.0;
    }
    budget / cpm * 1000.0
}

/// Effectiveness after `prior_spend` dollars already went into `media`.
///
/// Decays as `base / (1 + prior/saturation)^0.6` and never drops below 10% of base.
#[must_use]
pub fn calculate_effectiveness(media: MediaType, prior_spend: f64) -> f64 {
    let base = media.base_effectiveness();
    let saturation = 1.0 + prior_spend.max(0.0) / media.saturation_threshold();
    (base / saturation.powf(AD_DIMINISHING_EXPONENT)).max(base * AD_EFFECTIVENESS_FLOOR_RATIO)
}

/// Polling points gained from one buy, capped at 10.
#[must_use]
pub fn calculate_polling_impact(impressions: f64, market_size: f64, effectiveness: f64) -> f64 {
    if market_size <= 0.0 {
        return 0.0;
    }
    let penetration = impressions / market_size;
    (penetration * effectiveness * 100.0).clamp(0.0, AD_MAX_POLLING_IMPACT)
}

/// Cumulative ad spend per media type for one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct AdSpendLedger {
    spend: BTreeMap<MediaType, f64>,
}

impl AdSpendLedger {
    #[must_use]
    pub fn prior_spend(&self, media: MediaType) -> f64 {
        self.spend.get(&media).copied().unwrap_or(0.0)
    }

    /// A new ledger with `amount` added to `media`.
    #[must_use]
    pub fn record(&self, media: MediaType, amount: f64) -> Self {
        let mut next = self.clone();
        *next.spend.entry(media).or_insert(0.0) += amount.max(0.0);
        next
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.spend.values().sum()
    }
}

/// Priced and scored outcome of one ad purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdBuyResult {
    pub media: MediaType,
    pub budget: f64,
    pub cpm: f64,
    pub impressions: f64,
    pub effectiveness: f64,
    pub polling_impact: f64,
}

/// Price a buy against the ledger's prior spend and return the updated ledger.
#[must_use]
pub fn purchase_ad(
    ledger: &AdSpendLedger,
    media: MediaType,
    budget: f64,
    market_size: f64,
    competitiveness: f64,
) -> (AdBuyResult, AdSpendLedger) {
    let cpm = calculate_cpm(media, market_size, competitiveness);
    let impressions = calculate_impressions(budget, cpm);
    let effectiveness = calculate_effectiveness(media, ledger.prior_spend(media));
    let polling_impact = calculate_polling_impact(impressions, market_size, effectiveness);
    (
        AdBuyResult {
            media,
            budget: budget.max(0.0),
            cpm,
            impressions,
            effectiveness,
            polling_impact,
        },
        ledger.record(media, budget),
    )
}

/// One line of an optimized budget split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub media: MediaType,
    pub amount: f64,
    /// Effectiveness times impressions per dollar.
    pub score: f64,
}

/// Split `total_budget` across media types in proportion to their current value.
///
/// Each medium is scored as effectiveness (given prior spend) times
/// impressions per dollar; allocations are returned best score first.
#[must_use]
pub fn optimize_budget(
    total_budget: f64,
    ledger: &AdSpendLedger,
    market_size: f64,
    competitiveness: f64,
) -> Vec<BudgetAllocation> {
    let mut scored: Vec<(MediaType, f64)> = MediaType::ALL
        .into_iter()
        .map(|media| {
            let cpm = calculate_cpm(media, market_size, competitiveness);
            let per_dollar = calculate_impressions(1.0, cpm);
            let score = calculate_effectiveness(media, ledger.prior_spend(media)) * per_dollar;
            (media, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    let total_score: f64 = scored.iter().map(|(_, score)| score).sum();
    let budget = total_budget.max(0.0);
    scored
        .into_iter()
        .map(|(media, score)| BudgetAllocation {
            media,
            amount: if total_score > 0.0 {
                budget * score / total_score
            } else {
                0.0
            },
            score,
        })
        .collect()
}
