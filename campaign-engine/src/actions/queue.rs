//! Per-campaign resource ledger: action points, cooldowns, weekly usage, and
//! the pending/in-progress lists. Every operation returns a new queue.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ActionResult, ActionStatus, ActionType, PlayerAction};
use crate::clock::{self, is_same_utc_week, next_utc_midnight, utc_week_start};
use crate::constants::LOG_TARGET_QUEUE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionQueue {
    pub campaign_id: String,
    pub action_points_remaining: u32,
    pub action_points_max: u32,
    /// Points refill once `now` reaches this instant (always a UTC midnight).
    pub action_points_reset_at: DateTime<Utc>,
    #[serde(default)]
    pub pending: Vec<PlayerAction>,
    #[serde(default)]
    pub in_progress: Vec<PlayerAction>,
    /// Action type to cooldown expiry.
    #[serde(default)]
    pub cooldowns: BTreeMap<ActionType, DateTime<Utc>>,
    #[serde(default)]
    pub weekly_usage: BTreeMap<ActionType, u32>,
    /// Sunday 00:00 UTC of the week `weekly_usage` counts.
    pub week_started_at: DateTime<Utc>,
}

impl ActionQueue {
    /// A fresh queue with full points and the next reset at UTC midnight.
    #[must_use]
    pub fn new(campaign_id: &str, action_points_max: u32, now: DateTime<Utc>) -> Self {
        Self {
            campaign_id: campaign_id.to_string(),
            action_points_remaining: action_points_max,
            action_points_max,
            action_points_reset_at: next_utc_midnight(now),
            pending: Vec::new(),
            in_progress: Vec::new(),
            cooldowns: BTreeMap::new(),
            weekly_usage: BTreeMap::new(),
            week_started_at: utc_week_start(now),
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.in_progress.is_empty()
    }

    /// Uses of `action_type` counted in the week containing `now`.
    #[must_use]
    pub fn weekly_uses(&self, action_type: ActionType, now: DateTime<Utc>) -> u32 {
        if is_same_utc_week(self.week_started_at, now) {
            self.weekly_usage.get(&action_type).copied().unwrap_or(0)
        } else {
            0
        }
    }
}

/// Charge the queue for `action` and enqueue it as pending.
///
/// Points saturate at zero. A cooldown is installed for gated types, and the
/// weekly usage map is cleared first if `now` falls in a new UTC week.
#[must_use]
pub fn update_queue_after_action(
    queue: &ActionQueue,
    action: &PlayerAction,
    now: DateTime<Utc>,
) -> ActionQueue {
    let mut next = queue.clone();
    next.action_points_remaining = next
        .action_points_remaining
        .saturating_sub(action.action_points);

    if let Some(hours) = action.action_type.cooldown_hours() {
        next.cooldowns
            .insert(action.action_type, now + clock::hours(hours));
    }

    if !is_same_utc_week(next.week_started_at, now) {
        next.weekly_usage.clear();
        next.week_started_at = utc_week_start(now);
    }
    *next.weekly_usage.entry(action.action_type).or_insert(0) += 1;

    let mut queued = action.clone();
    queued.status = ActionStatus::Pending;
    next.pending.push(queued);

    log::debug!(
        target: LOG_TARGET_QUEUE,
        "queued {} for {}: {} points left",
        action.action_type,
        queue.campaign_id,
        next.action_points_remaining
    );
    next
}

/// Refill points once the reset time has passed; otherwise return the queue unchanged.
#[must_use]
pub fn check_and_reset_action_points(queue: &ActionQueue, now: DateTime<Utc>) -> ActionQueue {
    if now < queue.action_points_reset_at {
        return queue.clone();
    }
    log::debug!(
        target: LOG_TARGET_QUEUE,
        "action points reset for {}",
        queue.campaign_id
    );
    ActionQueue {
        action_points_remaining: queue.action_points_max,
        action_points_reset_at: next_utc_midnight(now),
        ..queue.clone()
    }
}

/// Move pending actions whose scheduled time has arrived into progress.
#[must_use]
pub fn process_pending_actions(queue: &ActionQueue, now: DateTime<Utc>) -> ActionQueue {
    let mut next = queue.clone();
    let (due, waiting): (Vec<_>, Vec<_>) = next
        .pending
        .into_iter()
        .partition(|action| action.scheduled_for <= now);
    next.pending = waiting;
    next.in_progress.extend(due.into_iter().map(|mut action| {
        action.status = ActionStatus::InProgress;
        action
    }));
    next
}

/// Remove and return in-progress actions whose completion time has arrived.
#[must_use]
pub fn process_completed_actions(
    queue: &ActionQueue,
    now: DateTime<Utc>,
) -> (ActionQueue, Vec<PlayerAction>) {
    let mut next = queue.clone();
    let (done, running): (Vec<_>, Vec<_>) = next
        .in_progress
        .into_iter()
        .partition(|action| action.completes_at <= now);
    next.in_progress = running;
    (next, done)
}

/// Attach a result and its final status to an action.
#[must_use]
pub fn complete_action(action: &PlayerAction, result: ActionResult) -> PlayerAction {
    PlayerAction {
        status: result.status,
        result: Some(result),
        ..action.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{
        ActionIntensity, ActionRequest, ActionTargeting, create_player_action, execute_action,
    };
    use crate::config::CampaignConfig;
    use chrono::{TimeDelta, TimeZone};

    fn wednesday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 15, 30, 0).unwrap()
    }

    fn queued(action_type: ActionType, now: DateTime<Utc>) -> PlayerAction {
        create_player_action(
            ActionRequest {
                campaign_id: "camp".to_string(),
                player_id: "p".to_string(),
                action_type,
                intensity: ActionIntensity::Standard,
                targeting: ActionTargeting::default(),
                scheduled_for: None,
            },
            now,
            &CampaignConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn new_queue_anchors_to_utc_boundaries() {
        let queue = ActionQueue::new("camp", 10, wednesday());
        assert_eq!(
            queue.action_points_reset_at,
            Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 0).unwrap()
        );
        assert_eq!(
            queue.week_started_at,
            Utc.with_ymd_and_hms(2024, 3, 3, 0, 0, 0).unwrap()
        );
        assert!(queue.is_idle());
    }

    #[test]
    fn charging_deducts_points_and_installs_cooldown() {
        let now = wednesday();
        let queue = ActionQueue::new("camp", 10, now);
        let action = queued(ActionType::TvAdNational, now);
        let next = update_queue_after_action(&queue, &action, now);
        assert_eq!(next.action_points_remaining, 7);
        assert_eq!(next.cooldowns[&ActionType::TvAdNational], now + TimeDelta::hours(24));
        assert_eq!(next.weekly_uses(ActionType::TvAdNational, now), 1);
        assert_eq!(next.pending.len(), 1);
        // The input queue is untouched.
        assert_eq!(queue.action_points_remaining, 10);
    }

    #[test]
    fn points_never_go_negative() {
        let now = wednesday();
        let mut queue = ActionQueue::new("camp", 2, now);
        for _ in 0..5 {
            queue = update_queue_after_action(&queue, &queued(ActionType::Rally, now), now);
        }
        assert_eq!(queue.action_points_remaining, 0);
    }

    #[test]
    fn weekly_usage_rolls_over_on_sunday() {
        let now = wednesday();
        let queue = ActionQueue::new("camp", 50, now);
        let queue = update_queue_after_action(&queue, &queued(ActionType::Rally, now), now);
        let sunday = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 1).unwrap();
        let next = update_queue_after_action(&queue, &queued(ActionType::DoorToDoor, sunday), sunday);
        assert_eq!(next.weekly_usage.get(&ActionType::Rally), None);
        assert_eq!(next.weekly_uses(ActionType::DoorToDoor, sunday), 1);
        assert_eq!(
            next.week_started_at,
            Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn reset_only_at_or_after_reset_time() {
        let now = wednesday();
        let mut queue = ActionQueue::new("camp", 10, now);
        queue.action_points_remaining = 1;
        let before = queue.action_points_reset_at - TimeDelta::seconds(1);
        assert_eq!(check_and_reset_action_points(&queue, before), queue);

        let at = queue.action_points_reset_at;
        let reset = check_and_reset_action_points(&queue, at);
        assert_eq!(reset.action_points_remaining, 10);
        assert_eq!(reset.action_points_reset_at, at + TimeDelta::days(1));
    }

    #[test]
    fn lists_partition_by_schedule_and_completion() {
        let now = wednesday();
        let queue = ActionQueue::new("camp", 10, now);
        let action = queued(ActionType::DoorToDoor, now);
        let mut later = queued(ActionType::PhoneBanking, now);
        later.scheduled_for = now + TimeDelta::hours(5);
        let queue = update_queue_after_action(&queue, &action, now);
        let queue = update_queue_after_action(&queue, &later, now);

        let queue = process_pending_actions(&queue, now);
        assert_eq!(queue.pending.len(), 1);
        assert_eq!(queue.in_progress.len(), 1);
        assert_eq!(queue.in_progress[0].status, ActionStatus::InProgress);

        let (same, done) = process_completed_actions(&queue, now);
        assert!(done.is_empty());
        assert_eq!(same, queue);

        let (queue, done) = process_completed_actions(&queue, action.completes_at);
        assert_eq!(done.len(), 1);
        assert!(queue.in_progress.is_empty());

        let finished = complete_action(&done[0], execute_action(&done[0]));
        assert!(matches!(
            finished.status,
            ActionStatus::Completed | ActionStatus::Backfired
        ));
        assert!(finished.result.is_some());
    }
}
