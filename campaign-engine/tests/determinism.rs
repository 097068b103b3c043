use campaign_engine::actions::{
    ActionIntensity, ActionQueue, ActionStatus, ActionTargeting, ActionType, PlayerAction,
    action_cost, action_points, check_and_reset_action_points, execute_action,
    update_queue_after_action,
};
use campaign_engine::demographics::{build_all_groups, calculate_appeal};
use campaign_engine::election::{ElectionInput, StateOutcome, WeeklyMomentum, resolve_election};
use campaign_engine::issues::{Issue, IssueProfile, issue_alignment};
use campaign_engine::seed::{seeded_gaussian, seeded_random};
use campaign_engine::{ALL_DEMOGRAPHIC_KEYS, CampaignConfig, Delegation};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const FUZZ_ROUNDS: usize = 400;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 10, 6, 30, 0).unwrap()
}

fn random_action(rng: &mut ChaCha20Rng, round: usize) -> PlayerAction {
    let action_type = ActionType::ALL[rng.gen_range(0..ActionType::ALL.len())];
    let intensity = ActionIntensity::ALL[rng.gen_range(0..ActionIntensity::ALL.len())];
    let mut targeting = ActionTargeting::default();
    if rng.gen_bool(0.3) {
        targeting.states.push("MI".into());
    }
    if rng.gen_bool(0.3) {
        targeting
            .demographics
            .push(ALL_DEMOGRAPHIC_KEYS[rng.gen_range(0..ALL_DEMOGRAPHIC_KEYS.len())]);
    }
    let at = base_time() + TimeDelta::minutes(rng.gen_range(0..20_000));
    PlayerAction {
        id: format!("act-{round}"),
        campaign_id: "fuzz".into(),
        player_id: "p".into(),
        action_type,
        intensity,
        status: ActionStatus::InProgress,
        targeting,
        initiated_at: at,
        scheduled_for: at,
        completes_at: at,
        final_cost: action_cost(action_type, intensity),
        action_points: action_points(action_type, intensity),
        seed: format!("fuzz-{}", rng.r#gen::<u64>()),
        result: None,
    }
}

#[test]
fn identical_actions_resolve_identically() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x00C0_FFEE);
    for round in 0..FUZZ_ROUNDS {
        let action = random_action(&mut rng, round);
        let first = execute_action(&action);
        let second = execute_action(&action.clone());
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );

        assert!(first.polling_shift.is_finite());
        assert!(first.funds_raised >= 0.0);
        if first.did_backfire {
            assert_eq!(first.status, ActionStatus::Backfired);
            assert!(first.polling_shift <= 0.0);
            assert!(first.reputation_change <= 0.0);
            assert!(first.media_boost <= 0.0);
            assert!(!first.endorsement_triggered);
            assert!(first.backfire_reason.is_some());
        } else {
            assert_eq!(first.status, ActionStatus::Completed);
            assert!(!first.scandal_triggered);
            assert!(first.media_boost >= 0.0);
        }
        assert_eq!(first.state_effects.len(), action.targeting.states.len());
    }
}

#[test]
fn national_tv_ad_replays_from_seed() {
    let at = base_time();
    let action = PlayerAction {
        id: "act-tv".into(),
        campaign_id: "camp".into(),
        player_id: "p".into(),
        action_type: ActionType::TvAdNational,
        intensity: ActionIntensity::Standard,
        status: ActionStatus::InProgress,
        targeting: ActionTargeting::default(),
        initiated_at: at,
        scheduled_for: at,
        completes_at: at,
        final_cost: 250_000.0,
        action_points: 3,
        seed: "s1".into(),
        result: None,
    };
    let a = execute_action(&action);
    let b = execute_action(&action);
    assert!((a.polling_shift - b.polling_shift).abs() < f64::EPSILON);
    assert!((a.reputation_change - b.reputation_change).abs() < f64::EPSILON);
    assert_eq!(a.did_backfire, b.did_backfire);
}

#[test]
fn intensity_scales_monotonically() {
    for action_type in ActionType::ALL {
        let costs: Vec<f64> = ActionIntensity::ALL
            .iter()
            .map(|&i| action_cost(action_type, i))
            .collect();
        assert!(costs.windows(2).all(|w| w[0] <= w[1]), "{action_type}");
        let points: Vec<u32> = ActionIntensity::ALL
            .iter()
            .map(|&i| action_points(action_type, i))
            .collect();
        assert!(points.windows(2).all(|w| w[0] <= w[1]), "{action_type}");
    }
    let effects: Vec<f64> = ActionIntensity::ALL
        .iter()
        .map(|i| i.multipliers().effect)
        .collect();
    assert!(effects.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn seeded_draws_stay_in_range() {
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    for _ in 0..FUZZ_ROUNDS {
        let label = format!("label-{}", rng.r#gen::<u32>());
        let value = seeded_random(&label);
        assert!((0.0..1.0).contains(&value), "{label} -> {value}");
        assert!(seeded_gaussian(&label, 0.0, 1.0).is_finite());
    }
}

#[test]
fn scores_never_escape_their_clamps() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xA11CE);
    let groups = build_all_groups();
    for _ in 0..FUZZ_ROUNDS {
        let positions = Issue::ALL.map(|issue| {
            (
                issue,
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-3.0..3.0),
            )
        });
        let candidate = IssueProfile::from_positions(&positions);
        for group in &groups {
            let alignment = issue_alignment(&candidate, &group.issues);
            assert!((0.0..=100.0).contains(&alignment));
            assert!((0.2..=0.95).contains(&group.turnout));
            let appeal = calculate_appeal(
                alignment,
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-500.0..500.0),
            );
            assert!((0.0..=100.0).contains(&appeal));
        }
    }
}

#[test]
fn action_points_never_underflow() {
    let mut rng = ChaCha20Rng::seed_from_u64(99);
    let mut queue = ActionQueue::new("fuzz", 10, base_time());
    let mut now = base_time();
    for round in 0..FUZZ_ROUNDS {
        now += TimeDelta::minutes(rng.gen_range(1..180));
        let before = queue.action_points_reset_at;
        let reset = check_and_reset_action_points(&queue, now);
        if now < before {
            assert_eq!(reset.action_points_remaining, queue.action_points_remaining);
        } else {
            assert_eq!(reset.action_points_remaining, reset.action_points_max);
            assert!(reset.action_points_reset_at > now);
        }
        let action = random_action(&mut rng, round);
        queue = update_queue_after_action(&reset, &action, now);
        assert!(queue.action_points_remaining <= queue.action_points_max);
        assert!(
            queue.action_points_remaining
                == reset
                    .action_points_remaining
                    .saturating_sub(action.action_points)
        );
    }
}

#[test]
fn fuzzed_elections_agree_with_their_tallies() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x000E_1EC7);
    let cfg = CampaignConfig::default();
    for _ in 0..100 {
        let count = rng.gen_range(1..60);
        let states: Vec<StateOutcome> = (0..count)
            .map(|n| StateOutcome {
                code: format!("S{n}"),
                electoral_votes: rng.gen_range(3..40),
                house_seats: rng.gen_range(0..30),
                turnout: rng.gen_range(0.0..1.0),
                margin: if rng.gen_bool(0.1) {
                    rng.gen_range(-0.01..0.01)
                } else {
                    rng.gen_range(-20.0..20.0)
                },
                momentum: rng.gen_bool(0.5).then(|| WeeklyMomentum {
                    a_change: rng.gen_range(-5.0..5.0),
                    b_change: rng.gen_range(-5.0..5.0),
                }),
                volatility: rng.gen_range(0.0..1.0),
            })
            .collect();
        let total_ev: u32 = states.iter().map(|s| s.electoral_votes).sum();
        let result = resolve_election(
            &ElectionInput {
                candidate_a: "a".into(),
                candidate_b: "b".into(),
                states,
                delegation: Delegation::default(),
            },
            &cfg,
        );
        assert_eq!(result.total_electoral_votes(), total_ev);
        for state in &result.states {
            assert!((0.0..=1.0).contains(&state.a_win_probability));
            assert!((state.a_win_probability + state.b_win_probability - 1.0).abs() < 1e-9);
            if state.adjusted_margin.abs() <= 0.01 {
                assert!(result.ties.contains(&state.code));
                assert!(state.a_electoral_votes.abs_diff(state.b_electoral_votes) <= 1);
            }
            if state.adjusted_margin.abs() <= 0.5 {
                assert!(result.recounts.contains(&state.code));
            }
        }
        match result.winner.as_deref() {
            Some("a") => assert!(result.candidate_a.electoral_votes >= 270),
            Some("b") => assert!(result.candidate_b.electoral_votes >= 270),
            Some(other) => panic!("unknown winner {other}"),
            None => assert!(
                result.candidate_a.electoral_votes < 270 && result.candidate_b.electoral_votes < 270
                    || result.candidate_a.electoral_votes == result.candidate_b.electoral_votes
            ),
        }
    }
}
