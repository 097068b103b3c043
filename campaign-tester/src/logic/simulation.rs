use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};

use campaign_engine::actions::{ActionRequest, ActionStatus, ActionType};
use campaign_engine::ads::AdSpendLedger;
use campaign_engine::clock::{hours, is_ad_cycle_due, is_poll_cycle_due};
use campaign_engine::debate::{DebateInput, ResearchEdge};
use campaign_engine::polling::{
    CandidateSupport, PollRequest, PollSnapshot, PollTrend, PollType, StatePriority, StateRace,
    apply_polling_delta, build_poll_snapshot, build_trends, prioritize_states,
};
use campaign_engine::{
    CampaignEffects, CampaignEngine, CampaignIdentity, CampaignPhase, CampaignStatus,
    CandidateProfile, Delegation, DemographicPollSnapshot, ElectionResolution, Geography, Issue,
    IssueProfile, Party, StaticDataLoader, Submission,
};

use super::policy::{CampaignPolicy, CampaignStrategy, PolicyDecision, PolicyView};

pub const CANDIDATE_ID: &str = "sim-candidate";
pub const RIVAL_ID: &str = "sim-rival";
pub const DEFAULT_STARTING_FUNDS: f64 = 250_000.0;
pub const DEFAULT_TICK_MINUTES: i64 = 60;

/// Monday 2024-09-02 00:00 UTC.
const CAMPAIGN_EPOCH_SECS: i64 = 1_725_235_200;
const LOG_TARGET: &str = "campaign_tester::simulation";

pub type SimulationExpectation = fn(&SimulationSummary) -> Result<()>;

/// How one simulated campaign is driven and judged.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: CampaignStrategy,
    pub tick_minutes: i64,
    pub starting_funds: f64,
    /// Run every iteration twice and require identical digests.
    pub replay_check: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(strategy: CampaignStrategy) -> Self {
        Self {
            strategy,
            tick_minutes: DEFAULT_TICK_MINUTES,
            starting_funds: DEFAULT_STARTING_FUNDS,
            replay_check: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_tick_minutes(mut self, minutes: i64) -> Self {
        self.tick_minutes = minutes;
        self
    }

    #[must_use]
    pub const fn with_starting_funds(mut self, funds: f64) -> Self {
        self.starting_funds = funds;
        self
    }

    #[must_use]
    pub const fn with_replay_check(mut self) -> Self {
        self.replay_check = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: SimulationExpectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

/// Invariant counters gathered tick by tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvariantLog {
    pub phase_regressions: u32,
    pub points_over_max: u32,
    pub negative_funds: u32,
    pub min_points_remaining: u32,
}

/// Everything one simulated campaign produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: CampaignStrategy,
    pub started_at: DateTime<Utc>,
    pub ticks: u32,
    pub final_status: CampaignStatus,
    pub final_phase: CampaignPhase,
    /// Phases in the order they were first seen.
    pub phase_history: Vec<CampaignPhase>,
    pub actions_submitted: u32,
    pub actions_rejected: u32,
    pub actions_completed: u32,
    pub backfires: u32,
    pub scandals: u32,
    pub funds_raised: f64,
    pub funds_spent: f64,
    pub final_funds: f64,
    pub ad_spend: f64,
    pub debate_winner: Option<String>,
    /// Candidate support as a player checking in at random intervals sees it.
    pub tracked_support: f64,
    pub national_polls: Vec<PollSnapshot>,
    pub trends: Vec<PollTrend>,
    pub projected_electoral_votes: u32,
    pub resolution: ElectionResolution,
    pub invariants: InvariantLog,
    /// SHA-256 over the deterministic parts of the run.
    pub digest: String,
}

impl SimulationSummary {
    #[must_use]
    pub fn candidate_won(&self) -> bool {
        self.resolution.winner.as_deref() == Some(CANDIDATE_ID)
    }
}

#[derive(Serialize)]
struct DigestInput<'a> {
    completed: &'a [String],
    national_polls: &'a [PollSnapshot],
    resolution: &'a ElectionResolution,
    final_funds: f64,
    ad_spend: f64,
}

pub struct CampaignSimulator {
    engine: CampaignEngine,
    verbose: bool,
}

impl CampaignSimulator {
    /// # Errors
    ///
    /// Returns an error if the embedded reference tables fail to load.
    pub fn new(verbose: bool) -> Result<Self> {
        let engine =
            CampaignEngine::from_loader(&StaticDataLoader).context("loading reference tables")?;
        Ok(Self { engine, verbose })
    }

    #[must_use]
    pub const fn engine(&self) -> &CampaignEngine {
        &self.engine
    }

    /// Drive one campaign from announcement to a resolved election.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine rejects a request as malformed
    /// (unknown states) or the final resolution cannot be built.
    pub fn run(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let mut run = CampaignRun::new(&self.engine, plan, seed)?;
        run.play()?;
        let summary = run.finish()?;
        if self.verbose {
            log::info!(
                target: LOG_TARGET,
                "seed {} ({}) finished {:?}: {} actions, winner {:?}",
                seed,
                plan.strategy,
                summary.final_status,
                summary.actions_completed,
                summary.resolution.winner
            );
        }
        Ok(summary)
    }
}

fn campaign_epoch() -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(CAMPAIGN_EPOCH_SECS, 0)
        .single()
        .context("campaign epoch out of range")
}

fn candidate_profile(id: &str, party: Party, lean: f64, charisma: f64) -> CandidateProfile {
    CandidateProfile {
        id: id.to_string(),
        name: id.to_uppercase(),
        party,
        issues: IssueProfile::from_positions(&Issue::ALL.map(|issue| (issue, lean, 0.6))),
        base_support: 42.0,
        charisma,
        awareness: 55.0,
        incumbent: false,
    }
}

/// Mutable state of one campaign while it plays out.
struct CampaignRun<'a> {
    engine: &'a CampaignEngine,
    plan: &'a SimulationPlan,
    seed: u64,
    rng: ChaCha20Rng,
    policy: Box<dyn CampaignPolicy + Send>,
    candidates: [CandidateProfile; 2],
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
    state: campaign_engine::CampaignState,
    queue: campaign_engine::ActionQueue,
    effects: CampaignEffects,
    ads: AdSpendLedger,
    funds: f64,
    funds_raised: f64,
    funds_spent: f64,
    ticks: u32,
    phase_history: Vec<CampaignPhase>,
    submitted: u32,
    rejected: u32,
    completed: Vec<String>,
    backfires: u32,
    scandals: u32,
    debate_prep: u32,
    research: u32,
    debate_winner: Option<String>,
    last_poll: Option<DateTime<Utc>>,
    last_ad: Option<DateTime<Utc>>,
    national_polls: Vec<PollSnapshot>,
    state_polls: Vec<DemographicPollSnapshot>,
    active_baseline: Vec<DemographicPollSnapshot>,
    priorities: Vec<StatePriority>,
    tracked_support: f64,
    invariants: InvariantLog,
}

impl<'a> CampaignRun<'a> {
    fn new(engine: &'a CampaignEngine, plan: &'a SimulationPlan, seed: u64) -> Result<Self> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let offset = i64::try_from(seed % 168).unwrap_or(0);
        let started_at = campaign_epoch()? + TimeDelta::hours(offset);
        let identity = CampaignIdentity {
            campaign_id: format!("sim-{seed:016x}"),
            company_id: "qa".to_string(),
            candidate_id: CANDIDATE_ID.to_string(),
            office: "president".to_string(),
        };
        let (state, queue) = engine.start_campaign(identity, started_at);
        let candidates = [
            candidate_profile(
                CANDIDATE_ID,
                Party::Democratic,
                rng.gen_range(-2.5..-0.5),
                rng.gen_range(40.0..70.0),
            ),
            candidate_profile(
                RIVAL_ID,
                Party::Republican,
                rng.gen_range(0.5..2.5),
                rng.gen_range(40.0..70.0),
            ),
        ];
        let phase = state.current_phase;
        Ok(Self {
            engine,
            plan,
            seed,
            policy: plan.strategy.create_policy(seed),
            rng,
            candidates,
            started_at,
            now: started_at,
            state,
            queue,
            effects: CampaignEffects::default(),
            ads: AdSpendLedger::default(),
            funds: plan.starting_funds,
            funds_raised: 0.0,
            funds_spent: 0.0,
            ticks: 0,
            phase_history: vec![phase],
            submitted: 0,
            rejected: 0,
            completed: Vec::new(),
            backfires: 0,
            scandals: 0,
            debate_prep: 0,
            research: 0,
            debate_winner: None,
            last_poll: None,
            last_ad: None,
            national_polls: Vec::new(),
            state_polls: Vec::new(),
            active_baseline: Vec::new(),
            priorities: Vec::new(),
            tracked_support: 0.0,
            invariants: InvariantLog {
                min_points_remaining: engine.config().action_points_max,
                ..InvariantLog::default()
            },
        })
    }

    fn play(&mut self) -> Result<()> {
        let cfg = self.engine.config();
        let horizon = self.started_at + hours(cfg.phase_hours.total() + 1.0);
        let step = TimeDelta::minutes(self.plan.tick_minutes.max(1));

        while self.now <= horizon {
            self.advance();
            if self.state.status.is_finished() {
                break;
            }
            if is_poll_cycle_due(self.last_poll, self.now, cfg) {
                self.run_poll_cycle();
            }
            if self.state.current_phase >= CampaignPhase::Active
                && is_ad_cycle_due(self.last_ad, self.now, cfg)
            {
                self.run_ad_cycle()?;
            }
            if self.state.status == CampaignStatus::Running {
                self.submit_next_action()?;
            }
            self.now += step;
        }
        Ok(())
    }

    fn advance(&mut self) {
        let outcome = self
            .engine
            .tick(&self.state, &self.queue, &self.effects, self.now);
        self.ticks += 1;

        if outcome.state.current_phase < self.state.current_phase {
            self.invariants.phase_regressions += 1;
        }
        let entered = outcome.state.current_phase;
        if !self.phase_history.contains(&entered) {
            self.phase_history.push(entered);
            log::debug!(target: LOG_TARGET, "seed {} entered {entered}", self.seed);
        }

        for (action, result) in outcome.completed.iter().zip(&outcome.results) {
            self.completed.push(action.id.clone());
            self.funds += result.funds_raised;
            self.funds_raised += result.funds_raised;
            if result.status == ActionStatus::Backfired {
                self.backfires += 1;
            }
            if result.scandal_triggered {
                self.scandals += 1;
            }
            match action.action_type {
                ActionType::DebatePrep => self.debate_prep += 1,
                ActionType::OppositionResearch => self.research += 1,
                _ => {}
            }
            let hours_offline = self.rng.gen_range(0.0..24.0);
            self.tracked_support =
                apply_polling_delta(self.tracked_support, result.polling_shift, hours_offline)
                    .new_support;
        }

        self.state = outcome.state;
        self.queue = outcome.queue;
        self.effects = outcome.effects;
        self.check_invariants();

        if self.state.current_phase == CampaignPhase::Active && self.debate_winner.is_none() {
            self.hold_debate();
        }
    }

    fn check_invariants(&mut self) {
        if self.queue.action_points_remaining > self.queue.action_points_max {
            self.invariants.points_over_max += 1;
        }
        if self.funds < -1e-6 {
            self.invariants.negative_funds += 1;
        }
        self.invariants.min_points_remaining = self
            .invariants
            .min_points_remaining
            .min(self.queue.action_points_remaining);
    }

    fn run_poll_cycle(&mut self) {
        let label = format!("{}-poll-{}", self.seed, self.national_polls.len());
        let national = self
            .engine
            .poll_nation(&self.candidates, &self.effects, &label, self.now);
        let supports = self
            .candidates
            .iter()
            .map(|candidate| CandidateSupport {
                candidate_id: candidate.id.clone(),
                support: national.support_for(&candidate.id),
                demographics: national
                    .breakdown
                    .iter()
                    .filter_map(|(key, row)| row.support.get(&candidate.id).map(|s| (*key, *s)))
                    .collect(),
            })
            .collect();
        let snapshot = build_poll_snapshot(&PollRequest {
            poll_type: PollType::Tracking,
            geography: Geography::National,
            sample_size: PollType::Tracking.canonical_sample_size(),
            taken_at: self.now,
            seed: label,
            candidates: supports,
            previous: self.national_polls.last().cloned(),
        });
        if self.national_polls.is_empty() {
            self.tracked_support = snapshot.support_for(CANDIDATE_ID).unwrap_or(0.0);
        }
        self.national_polls.push(snapshot);

        if self.state.current_phase >= CampaignPhase::Fundraising {
            self.refresh_battlegrounds();
        }
        self.last_poll = Some(self.now);
    }

    fn refresh_battlegrounds(&mut self) {
        let label = format!("{}-states-{}", self.seed, self.national_polls.len());
        self.state_polls =
            self.engine
                .poll_all_states(&self.candidates, &self.effects, &label, self.now);
        let races: Vec<StateRace> = self
            .state_polls
            .iter()
            .filter_map(|poll| {
                let code = poll.geography.state_code()?;
                let info = self.engine.states().get(code).ok()?;
                Some(StateRace {
                    code: code.to_string(),
                    electoral_votes: info.electoral_votes,
                    margin: poll.margin,
                })
            })
            .collect();
        self.priorities = prioritize_states(&races);
        if self.active_baseline.is_empty() && self.state.current_phase >= CampaignPhase::Active {
            self.active_baseline = self.state_polls.clone();
        }
    }

    fn run_ad_cycle(&mut self) -> Result<()> {
        self.last_ad = Some(self.now);
        let Some(target) = self.priorities.first().cloned() else {
            return Ok(());
        };
        let view = PolicyView {
            phase: self.state.current_phase,
            funds: self.funds,
            queue: &self.queue,
            ads: &self.ads,
            priorities: &self.priorities,
        };
        let Some(ad) = self.policy.plan_ad_buy(&view) else {
            return Ok(());
        };
        let budget = ad.budget.clamp(0.0, self.funds.max(0.0));
        if budget <= 0.0 {
            return Ok(());
        }
        let (buy, ads, effects) = self.engine.buy_ad(
            &self.ads,
            &self.effects,
            CANDIDATE_ID,
            &target.code,
            ad.media,
            budget,
            target.competitiveness,
        )?;
        log::debug!(
            target: LOG_TARGET,
            "seed {} bought {:?} in {} for {:.0}: {:+.3} pts",
            self.seed,
            buy.media,
            target.code,
            buy.budget,
            buy.polling_impact
        );
        self.funds -= buy.budget;
        self.funds_spent += buy.budget;
        self.ads = ads;
        self.effects = effects;
        Ok(())
    }

    fn submit_next_action(&mut self) -> Result<()> {
        let view = PolicyView {
            phase: self.state.current_phase,
            funds: self.funds,
            queue: &self.queue,
            ads: &self.ads,
            priorities: &self.priorities,
        };
        let decisions = self.policy.plan_actions(&view);
        for PolicyDecision {
            action_type,
            intensity,
            targeting,
        } in decisions
        {
            let request = ActionRequest {
                campaign_id: self.state.identity.campaign_id.clone(),
                player_id: "sim-player".to_string(),
                action_type,
                intensity,
                targeting,
                scheduled_for: None,
            };
            match self
                .engine
                .submit_action(&self.state, &self.queue, self.funds, request, self.now)?
            {
                Submission::Queued { action, queue, .. } => {
                    self.funds -= action.final_cost;
                    self.funds_spent += action.final_cost;
                    self.queue = queue;
                    self.submitted += 1;
                    return Ok(());
                }
                Submission::Rejected { .. } => self.rejected += 1,
            }
        }
        Ok(())
    }

    fn hold_debate(&mut self) {
        let [candidate, rival] = &self.candidates;
        let debate_id = format!("{}-debate", self.seed);
        let scandal_penalty = -5.0 * f64::from(self.scandals.min(3));
        let ours = DebateInput {
            candidate_id: candidate.id.clone(),
            seed: debate_id.clone(),
            charisma: candidate.charisma,
            knowledge: 60.0,
            composure: self.rng.gen_range(40.0..80.0),
            preparation: (f64::from(self.debate_prep) * 15.0).min(100.0),
            fatigue: 10.0,
            scandal_penalty,
            research: ResearchEdge {
                attacker_bonus: f64::from(self.research.min(3)) * 2.0,
                defender_penalty: 0.0,
            },
        };
        let theirs = DebateInput {
            candidate_id: rival.id.clone(),
            seed: debate_id,
            charisma: rival.charisma,
            knowledge: 60.0,
            composure: self.rng.gen_range(40.0..80.0),
            preparation: 30.0,
            fatigue: 10.0,
            scandal_penalty: 0.0,
            research: ResearchEdge::default(),
        };
        let (matchup, effects) = self.engine.hold_debate(&self.effects, &ours, &theirs);
        self.effects = effects;
        self.debate_winner = Some(matchup.winner.unwrap_or_else(|| "draw".to_string()));
    }

    fn finish(self) -> Result<SimulationSummary> {
        let label = format!("{}-final", self.seed);
        let finals = self
            .engine
            .poll_all_states(&self.candidates, &self.effects, &label, self.now);
        let projection = self.engine.project(&finals)?;
        let resolution = self.engine.resolve(
            CANDIDATE_ID,
            RIVAL_ID,
            &finals,
            &self.active_baseline,
            Delegation::default(),
        )?;
        let final_funds = self.funds;
        let ad_spend = self.ads.total();
        let digest = digest_hex(&DigestInput {
            completed: &self.completed,
            national_polls: &self.national_polls,
            resolution: &resolution,
            final_funds,
            ad_spend,
        })?;

        Ok(SimulationSummary {
            seed: self.seed,
            strategy: self.plan.strategy,
            started_at: self.started_at,
            ticks: self.ticks,
            final_status: self.state.status,
            final_phase: self.state.current_phase,
            phase_history: self.phase_history,
            actions_submitted: self.submitted,
            actions_rejected: self.rejected,
            actions_completed: u32::try_from(self.completed.len()).unwrap_or(u32::MAX),
            backfires: self.backfires,
            scandals: self.scandals,
            funds_raised: self.funds_raised,
            funds_spent: self.funds_spent,
            final_funds,
            ad_spend,
            debate_winner: self.debate_winner,
            tracked_support: self.tracked_support,
            trends: build_trends(&self.national_polls),
            national_polls: self.national_polls,
            projected_electoral_votes: projection
                .electoral_votes
                .get(CANDIDATE_ID)
                .copied()
                .unwrap_or(0),
            resolution,
            invariants: self.invariants,
            digest,
        })
    }
}

fn digest_hex(input: &DigestInput<'_>) -> Result<String> {
    let bytes = serde_json::to_vec(input).context("serializing run digest")?;
    let hash = Sha256::digest(&bytes);
    Ok(hash.iter().map(|b| format!("{b:02x}")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulator() -> CampaignSimulator {
        CampaignSimulator::new(false).unwrap()
    }

    #[test]
    fn balanced_campaign_reaches_an_election() {
        let sim = simulator();
        let summary = sim
            .run(&SimulationPlan::new(CampaignStrategy::Balanced), 1337)
            .unwrap();
        assert_eq!(summary.final_status, CampaignStatus::Completed);
        assert_eq!(summary.phase_history, CampaignPhase::ALL.to_vec());
        assert_eq!(summary.resolution.total_electoral_votes(), 538);
        assert!(summary.actions_completed > 0);
        assert!(summary.debate_winner.is_some());
        assert!(!summary.national_polls.is_empty());
        assert_eq!(summary.invariants.phase_regressions, 0);
        assert_eq!(summary.invariants.points_over_max, 0);
        assert_eq!(summary.invariants.negative_funds, 0);
        assert_eq!(summary.digest.len(), 64);
    }

    #[test]
    fn identical_seeds_replay_identically() {
        let sim = simulator();
        let plan = SimulationPlan::new(CampaignStrategy::Frugal).with_tick_minutes(120);
        let first = sim.run(&plan, 99).unwrap();
        let second = sim.run(&plan, 99).unwrap();
        assert_eq!(first.digest, second.digest);
        assert_eq!(first.resolution, second.resolution);

        let other = sim.run(&plan, 100).unwrap();
        assert_ne!(first.digest, other.digest);
    }

    #[test]
    fn builder_collects_expectations() {
        fn always(_: &SimulationSummary) -> Result<()> {
            Ok(())
        }
        let plan = SimulationPlan::new(CampaignStrategy::Aggressive)
            .with_starting_funds(1e6)
            .with_replay_check()
            .with_expectation(always);
        assert!(plan.replay_check);
        assert_eq!(plan.expectations.len(), 1);
        assert!((plan.starting_funds - 1e6).abs() < f64::EPSILON);
    }
}
