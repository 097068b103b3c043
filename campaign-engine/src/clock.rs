//! Time scaling between the real clock and the accelerated campaign clock.
//!
//! The engine never reads a live clock. Every function here takes the
//! caller's `now` and answers in terms of it, which keeps replays exact.

use chrono::{DateTime, Datelike, NaiveTime, TimeDelta, TimeZone, Utc};

use crate::config::CampaignConfig;
use crate::numbers::{i64_to_f64, round_f64_to_i64};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Convert a span of real milliseconds into in-game milliseconds.
#[must_use]
pub fn real_ms_to_game_ms(real_ms: i64, multiplier: f64) -> i64 {
    round_f64_to_i64(i64_to_f64(real_ms) * multiplier)
}

/// In-game time elapsed between two real instants.
#[must_use]
pub fn game_duration_between(start: DateTime<Utc>, now: DateTime<Utc>, multiplier: f64) -> TimeDelta {
    let real_ms = (now - start).num_milliseconds().max(0);
    TimeDelta::milliseconds(real_ms_to_game_ms(real_ms, multiplier))
}

/// Real hours elapsed between two instants; negative spans collapse to zero.
#[must_use]
pub fn real_hours_between(start: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let ms = (now - start).num_milliseconds().max(0);
    i64_to_f64(ms) / MS_PER_HOUR
}

/// Real-clock span needed to cover `game_hours` of in-game time.
#[must_use]
pub fn game_hours_to_real(game_hours: f64, multiplier: f64) -> TimeDelta {
    if multiplier <= 0.0 {
        return TimeDelta::zero();
    }
    let real_ms = (game_hours / multiplier) * MS_PER_HOUR;
    TimeDelta::milliseconds(round_f64_to_i64(real_ms.max(0.0)))
}

/// Convert a fractional real-hour count into a `TimeDelta`.
#[must_use]
pub fn hours(real_hours: f64) -> TimeDelta {
    TimeDelta::milliseconds(round_f64_to_i64(real_hours * MS_PER_HOUR))
}

/// The first UTC midnight strictly after `now`.
#[must_use]
pub fn next_utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let tomorrow = today.succ_opt().unwrap_or(today);
    Utc.from_utc_datetime(&tomorrow.and_time(NaiveTime::MIN))
}

/// Sunday 00:00 UTC of the week containing `now`.
#[must_use]
pub fn utc_week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let offset = i64::from(today.weekday().num_days_from_sunday());
    let sunday = today - TimeDelta::days(offset);
    Utc.from_utc_datetime(&sunday.and_time(NaiveTime::MIN))
}

/// Whether both instants fall into the same Sunday-anchored UTC week.
#[must_use]
pub fn is_same_utc_week(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    utc_week_start(a) == utc_week_start(b)
}

fn is_cycle_due(last: Option<DateTime<Utc>>, now: DateTime<Utc>, cycle_hours: f64) -> bool {
    match last {
        None => true,
        Some(last) => real_hours_between(last, now) >= cycle_hours,
    }
}

/// Whether a new polling cycle should run. A missing `last` is always due.
#[must_use]
pub fn is_poll_cycle_due(
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cfg: &CampaignConfig,
) -> bool {
    is_cycle_due(last, now, cfg.poll_cycle_hours)
}

/// Whether a new advertising cycle should run. A missing `last` is always due.
#[must_use]
pub fn is_ad_cycle_due(
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cfg: &CampaignConfig,
) -> bool {
    is_cycle_due(last, now, cfg.ad_cycle_hours)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn game_clock_runs_at_multiplier() {
        assert_eq!(real_ms_to_game_ms(1_000, 24.0), 24_000);
        let start = at(2024, 3, 1, 0, 0);
        let now = at(2024, 3, 1, 1, 0);
        assert_eq!(game_duration_between(start, now, 24.0), TimeDelta::hours(24));
        assert_eq!(game_duration_between(now, start, 24.0), TimeDelta::zero());
    }

    #[test]
    fn game_hours_convert_back_to_real() {
        assert_eq!(game_hours_to_real(24.0, 24.0), TimeDelta::hours(1));
        assert_eq!(game_hours_to_real(12.0, 24.0), TimeDelta::minutes(30));
        assert_eq!(game_hours_to_real(5.0, 0.0), TimeDelta::zero());
    }

    #[test]
    fn midnight_anchor_is_strictly_after_now() {
        assert_eq!(next_utc_midnight(at(2024, 3, 1, 13, 45)), at(2024, 3, 2, 0, 0));
        assert_eq!(next_utc_midnight(at(2024, 3, 1, 0, 0)), at(2024, 3, 2, 0, 0));
        assert_eq!(next_utc_midnight(at(2024, 12, 31, 23, 59)), at(2025, 1, 1, 0, 0));
    }

    #[test]
    fn week_anchor_is_sunday_midnight() {
        // 2024-03-06 is a Wednesday; the week opened on Sunday 2024-03-03.
        assert_eq!(utc_week_start(at(2024, 3, 6, 18, 0)), at(2024, 3, 3, 0, 0));
        assert_eq!(utc_week_start(at(2024, 3, 3, 0, 0)), at(2024, 3, 3, 0, 0));
        assert_eq!(utc_week_start(at(2024, 3, 2, 23, 59)), at(2024, 2, 25, 0, 0));
        assert!(is_same_utc_week(at(2024, 3, 3, 1, 0), at(2024, 3, 9, 23, 0)));
        assert!(!is_same_utc_week(at(2024, 3, 9, 23, 0), at(2024, 3, 10, 0, 0)));
    }

    #[test]
    fn cycles_are_due_after_configured_hours() {
        let cfg = CampaignConfig::default();
        let last = at(2024, 3, 1, 0, 0);
        assert!(is_poll_cycle_due(None, last, &cfg));
        assert!(!is_poll_cycle_due(Some(last), at(2024, 3, 1, 3, 59), &cfg));
        assert!(is_poll_cycle_due(Some(last), at(2024, 3, 1, 4, 0), &cfg));
        assert!(is_ad_cycle_due(Some(last), at(2024, 3, 1, 2, 0), &cfg));
    }
}
