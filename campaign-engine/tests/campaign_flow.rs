use campaign_engine::actions::{ActionIntensity, ActionTargeting, ActionType};
use campaign_engine::demographic_polling::{CrosstabDimension, build_crosstab};
use campaign_engine::phase::{pause, resume};
use campaign_engine::{
    ActionRequest, CampaignEffects, CampaignEngine, CampaignIdentity, CampaignPhase,
    CampaignStatus, CandidateProfile, Delegation, Issue, IssueProfile, Party, StaticDataLoader,
    Submission,
};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

const CANDIDATE: &str = "cand";
const RIVAL: &str = "rival";

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 0, 0, 0).unwrap()
}

fn engine() -> CampaignEngine {
    CampaignEngine::from_loader(&StaticDataLoader).unwrap()
}

fn identity() -> CampaignIdentity {
    CampaignIdentity {
        campaign_id: "camp-flow".into(),
        company_id: "co-flow".into(),
        candidate_id: CANDIDATE.into(),
        office: "president".into(),
    }
}

fn profile(id: &str, party: Party, lean: f64) -> CandidateProfile {
    CandidateProfile {
        id: id.to_string(),
        name: id.to_uppercase(),
        party,
        issues: IssueProfile::from_positions(&Issue::ALL.map(|issue| (issue, lean, 0.6))),
        base_support: 42.0,
        charisma: 55.0,
        awareness: 60.0,
        incumbent: false,
    }
}

fn rotation(phase: CampaignPhase) -> &'static [ActionType] {
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
        ],
        CampaignPhase::Active => &[
            ActionType::Rally,
            ActionType::DoorToDoor,
            ActionType::TvAdLocal,
            ActionType::TownHall,
            ActionType::OnlineFundraiser,
        ],
        CampaignPhase::Resolution => &[ActionType::GetOutTheVote, ActionType::Rally],
    }
}

fn request(action_type: ActionType, hour: i64) -> ActionRequest {
    let mut targeting = ActionTargeting::default();
    if hour % 3 == 0 {
        targeting.states.push("PA".into());
    }
    ActionRequest {
        campaign_id: "camp-flow".into(),
        player_id: "player-1".into(),
        action_type,
        intensity: ActionIntensity::Standard,
        targeting,
        scheduled_for: None,
    }
}

#[test]
fn full_campaign_runs_to_resolution() {
    let engine = engine();
    let (mut state, mut queue) = engine.start_campaign(identity(), start());
    let mut effects = CampaignEffects::default();
    let mut funds = 250_000.0;
    let mut completed = 0usize;
    let mut submitted = 0usize;
    let mut last_phase = state.current_phase;
    let total_hours = engine.config().phase_hours.total();

    let mut hour = 0;
    while f64::from(hour) <= total_hours + 2.0 {
        let now = start() + TimeDelta::hours(i64::from(hour));
        let outcome = engine.tick(&state, &queue, &effects, now);
        assert!(outcome.state.current_phase >= last_phase, "phase regressed");
        last_phase = outcome.state.current_phase;
        funds += outcome.results.iter().map(|r| r.funds_raised).sum::<f64>();
        completed += outcome.completed.len();
        state = outcome.state;
        queue = outcome.queue;
        effects = outcome.effects;
        assert!(queue.action_points_remaining <= queue.action_points_max);

        if state.status == CampaignStatus::Running {
            for &action_type in rotation(state.current_phase) {
                let submission = engine
                    .submit_action(&state, &queue, funds, request(action_type, i64::from(hour)), now)
                    .unwrap();
                if let Submission::Queued {
                    action, queue: next, ..
                } = submission
                {
                    funds -= action.final_cost;
                    queue = next;
                    submitted += 1;
                    break;
                }
            }
        }
        hour += 1;
    }

    assert_eq!(state.status, CampaignStatus::Completed);
    assert_eq!(state.current_phase, CampaignPhase::Resolution);
    assert!(submitted > 10, "only {submitted} actions were queued");
    assert!(completed > 0);
    assert_eq!(state.actions_performed.len(), completed);
    assert!(funds >= 0.0);
    assert!(effects.for_candidate(CANDIDATE).is_some());

    let candidates = [
        profile(CANDIDATE, Party::Democratic, -1.5),
        profile(RIVAL, Party::Republican, 1.5),
    ];
    let end = start() + TimeDelta::hours(200);
    let earlier = engine.poll_all_states(&candidates, &effects, "week-before", end - TimeDelta::days(7));
    let finals = engine.poll_all_states(&candidates, &effects, "final", end);
    assert_eq!(finals.len(), 51);

    let projection = engine.project(&finals).unwrap();
    let called: u32 = projection.electoral_votes.values().sum();
    let uncalled: u32 = projection
        .uncalled
        .iter()
        .map(|code| engine.states().get(code).unwrap().electoral_votes)
        .sum();
    assert_eq!(called + uncalled, 538);

    let resolution = engine
        .resolve(CANDIDATE, RIVAL, &finals, &earlier, Delegation::default())
        .unwrap();
    assert_eq!(resolution.total_electoral_votes(), 538);
    assert_eq!(
        resolution.candidate_a.house_seats + resolution.candidate_b.house_seats,
        435
    );
    assert_eq!(
        resolution.candidate_a.senate_votes + resolution.candidate_b.senate_votes,
        2
    );
    match resolution.winner.as_deref() {
        Some(CANDIDATE) => assert!(resolution.candidate_a.electoral_votes >= 270),
        Some(RIVAL) => assert!(resolution.candidate_b.electoral_votes >= 270),
        Some(other) => panic!("unexpected winner {other}"),
        None => {
            assert!(resolution.candidate_a.electoral_votes < 270);
            assert!(resolution.candidate_b.electoral_votes < 270);
        }
    }
    for code in &resolution.ties {
        assert!(resolution.recounts.contains(code));
    }

    let national = engine.poll_nation(&candidates, &effects, "final", end);
    let crosstab = build_crosstab(&national, CrosstabDimension::Race, CrosstabDimension::Gender);
    assert_eq!(crosstab.cells.len(), 8);
}

#[test]
fn paused_campaign_holds_its_phase() {
    let engine = engine();
    let (state, queue) = engine.start_campaign(identity(), start());
    let effects = CampaignEffects::default();

    let paused = pause(&state, start() + TimeDelta::hours(12)).unwrap();
    let frozen = engine.tick(&paused, &queue, &effects, start() + TimeDelta::hours(100));
    assert_eq!(frozen.state.current_phase, CampaignPhase::Announcement);
    assert_eq!(frozen.state.status, CampaignStatus::Paused);

    // 88 paused hours are added back, so 12 hours of progress remain.
    let resumed = resume(&frozen.state, start() + TimeDelta::hours(100)).unwrap();
    let later = engine.tick(&resumed, &frozen.queue, &effects, start() + TimeDelta::hours(106));
    assert_eq!(later.state.current_phase, CampaignPhase::Announcement);
    assert!((later.state.phase_progress - 0.75).abs() < 1e-6);
    let crossed = engine.tick(&resumed, &frozen.queue, &effects, start() + TimeDelta::hours(113));
    assert_eq!(crossed.state.current_phase, CampaignPhase::Fundraising);
}

#[test]
fn submissions_respect_cooldowns_across_ticks() {
    let engine = engine();
    let (state, queue) = engine.start_campaign(identity(), start());
    let first = engine
        .submit_action(&state, &queue, 1e7, request(ActionType::AnnounceCandidacy, 1), start())
        .unwrap();
    let Submission::Queued { queue, .. } = first else {
        panic!("first announcement must queue");
    };
    let again = engine
        .submit_action(
            &state,
            &queue,
            1e7,
            request(ActionType::AnnounceCandidacy, 1),
            start() + TimeDelta::hours(1),
        )
        .unwrap();
    let Submission::Rejected { report } = again else {
        panic!("announcement is on cooldown");
    };
    assert!(report.errors.iter().any(|e| e.contains("cooldown")));
}

#[test]
fn submission_after_midnight_sees_refilled_points() {
    let engine = engine();
    let (state, mut queue) = engine.start_campaign(identity(), start() + TimeDelta::hours(1));
    queue.action_points_remaining = 0;
    let midnight = Utc.with_ymd_and_hms(2024, 9, 3, 0, 0, 0).unwrap();
    assert_eq!(queue.action_points_reset_at, midnight);

    let before = engine
        .submit_action(
            &state,
            &queue,
            1e7,
            request(ActionType::PolicySpeech, 1),
            midnight - TimeDelta::minutes(30),
        )
        .unwrap();
    let Submission::Rejected { report } = before else {
        panic!("no points left before midnight");
    };
    assert!(report.errors.iter().any(|e| e.contains("action points")));

    let after = engine
        .submit_action(
            &state,
            &queue,
            1e7,
            request(ActionType::PolicySpeech, 1),
            midnight + TimeDelta::minutes(30),
        )
        .unwrap();
    let Submission::Queued { action, queue, .. } = after else {
        panic!("points refill at UTC midnight");
    };
    assert_eq!(
        queue.action_points_remaining,
        queue.action_points_max - action.action_points
    );
    assert_eq!(queue.action_points_reset_at, midnight + TimeDelta::days(1));
}

#[test]
fn late_tick_records_actions_under_their_completion_phase() {
    let engine = engine();
    let (state, queue) = engine.start_campaign(identity(), start());
    let effects = CampaignEffects::default();

    // Announcement runs 24 real hours; a 6 game-hour speech takes 15 minutes.
    let submitted_at = start() + TimeDelta::minutes(23 * 60 + 30);
    let Submission::Queued { action, queue, .. } = engine
        .submit_action(&state, &queue, 1e7, request(ActionType::PolicySpeech, 1), submitted_at)
        .unwrap()
    else {
        panic!("speech must queue");
    };
    assert!(action.completes_at < start() + TimeDelta::hours(24));

    let outcome = engine.tick(&state, &queue, &effects, start() + TimeDelta::hours(30));
    assert_eq!(outcome.state.current_phase, CampaignPhase::Fundraising);
    assert_eq!(outcome.completed.len(), 1);
    let performed = &outcome.state.actions_performed[0];
    assert_eq!(performed.action_id, action.id);
    assert_eq!(performed.phase, CampaignPhase::Announcement);
    assert_eq!(performed.performed_at, action.completes_at);
}
