//! Operational configuration for campaign pacing and cycle cadence.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::phase::CampaignPhase;

const DEFAULT_CAMPAIGN_DATA: &str = include_str!("../data/campaign.json");

/// Errors raised when campaign configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than {min:.2} (got {value:.2})")]
    NotPositive {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("action_points_max must be at least 1")]
    NoActionPoints,
    #[error("electoral_votes_to_win must be at least 1")]
    NoElectoralThreshold,
    #[error("failed to parse campaign config: {0}")]
    Parse(String),
}

/// Real-hour duration of each campaign phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDurations {
    #[serde(default = "PhaseDurations::default_announcement")]
    pub announcement: f64,
    #[serde(default = "PhaseDurations::default_fundraising")]
    pub fundraising: f64,
    #[serde(default = "PhaseDurations::default_active")]
    pub active: f64,
    #[serde(default = "PhaseDurations::default_resolution")]
    pub resolution: f64,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            announcement: Self::default_announcement(),
            fundraising: Self::default_fundraising(),
            active: Self::default_active(),
            resolution: Self::default_resolution(),
        }
    }
}

impl PhaseDurations {
    const fn default_announcement() -> f64 {
        24.0
    }

    const fn default_fundraising() -> f64 {
        48.0
    }

    const fn default_active() -> f64 {
        96.0
    }

    const fn default_resolution() -> f64 {
        24.0
    }

    /// Real hours allotted to `phase`.
    #[must_use]
    pub const fn for_phase(&self, phase: CampaignPhase) -> f64 {
        match phase {
            CampaignPhase::Announcement => self.announcement,
            CampaignPhase::Fundraising => self.fundraising,
            CampaignPhase::Active => self.active,
            CampaignPhase::Resolution => self.resolution,
        }
    }

    /// Total real hours from announcement to resolution.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.announcement + self.fundraising + self.active + self.resolution
    }
}

/// Campaign-wide pacing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// In-game hours that elapse per real hour.
    #[serde(default = "CampaignConfig::default_time_multiplier")]
    pub time_multiplier: f64,
    #[serde(default)]
    pub phase_hours: PhaseDurations,
    #[serde(default = "CampaignConfig::default_action_points_max")]
    pub action_points_max: u32,
    #[serde(default = "CampaignConfig::default_poll_cycle_hours")]
    pub poll_cycle_hours: f64,
    #[serde(default = "CampaignConfig::default_ad_cycle_hours")]
    pub ad_cycle_hours: f64,
    #[serde(default = "CampaignConfig::default_low_turnout_threshold")]
    pub low_turnout_threshold: f64,
    #[serde(default = "CampaignConfig::default_electoral_votes_to_win")]
    pub electoral_votes_to_win: u32,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            time_multiplier: Self::default_time_multiplier(),
            phase_hours: PhaseDurations::default(),
            action_points_max: Self::default_action_points_max(),
            poll_cycle_hours: Self::default_poll_cycle_hours(),
            ad_cycle_hours: Self::default_ad_cycle_hours(),
            low_turnout_threshold: Self::default_low_turnout_threshold(),
            electoral_votes_to_win: Self::default_electoral_votes_to_win(),
        }
    }
}

impl CampaignConfig {
    const fn default_time_multiplier() -> f64 {
        24.0
    }

    const fn default_action_points_max() -> u32 {
        10
    }

    const fn default_poll_cycle_hours() -> f64 {
        4.0
    }

    const fn default_ad_cycle_hours() -> f64 {
        2.0
    }

    const fn default_low_turnout_threshold() -> f64 {
        0.35
    }

    const fn default_electoral_votes_to_win() -> u32 {
        270
    }

    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON or any validation error.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Embedded configuration, falling back to defaults if it fails to load.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_CAMPAIGN_DATA).unwrap_or_default()
    }

    /// Validate the configuration against its documented bounds.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("time_multiplier", self.time_multiplier)?;
        positive("phase_hours.announcement", self.phase_hours.announcement)?;
        positive("phase_hours.fundraising", self.phase_hours.fundraising)?;
        positive("phase_hours.active", self.phase_hours.active)?;
        positive("phase_hours.resolution", self.phase_hours.resolution)?;
        positive("poll_cycle_hours", self.poll_cycle_hours)?;
        positive("ad_cycle_hours", self.ad_cycle_hours)?;
        if self.action_points_max == 0 {
            return Err(ConfigError::NoActionPoints);
        }
        if !(0.0..=1.0).contains(&self.low_turnout_threshold) {
            return Err(ConfigError::RangeViolation {
                field: "low_turnout_threshold",
                min: 0.0,
                max: 1.0,
                value: self.low_turnout_threshold,
            });
        }
        if self.electoral_votes_to_win == 0 {
            return Err(ConfigError::NoElectoralThreshold);
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive {
            field,
            min: 0.0,
            value,
        })
    }
}
