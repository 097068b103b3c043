use anyhow::{Result, bail, ensure};

use campaign_engine::{CampaignPhase, CampaignStatus};

use super::policy::CampaignStrategy;
use super::simulation::{CANDIDATE_ID, RIVAL_ID, SimulationPlan, SimulationSummary};

const TOTAL_ELECTORAL_VOTES: u32 = 538;
const TOTAL_HOUSE_SEATS: u32 = 435;

/// A named simulation with its pass criteria.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

const CATALOG: [(&str, &str); 4] = [
    ("smoke", "Balanced campaign completes and elects within the 538 electoral votes"),
    ("determinism", "Frugal campaign replayed from the same seed yields identical results"),
    ("full-campaign", "Balanced campaign visits every phase, debates, and resolves Congress"),
    ("stress", "Aggressive campaign on 15-minute ticks keeps every invariant"),
];

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG.to_vec()
}

#[must_use]
pub fn scenario_names() -> Vec<String> {
    CATALOG.iter().map(|(name, _)| (*name).to_string()).collect()
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let plan = match name {
        "smoke" => SimulationPlan::new(CampaignStrategy::Balanced)
            .with_expectation(expect_completed)
            .with_expectation(expect_electoral_total)
            .with_expectation(expect_actions_taken),
        "determinism" => SimulationPlan::new(CampaignStrategy::Frugal)
            .with_tick_minutes(120)
            .with_replay_check()
            .with_expectation(expect_electoral_total),
        "full-campaign" => SimulationPlan::new(CampaignStrategy::Balanced)
            .with_expectation(expect_completed)
            .with_expectation(expect_every_phase)
            .with_expectation(expect_electoral_total)
            .with_expectation(expect_congress)
            .with_expectation(expect_consistent_winner)
            .with_expectation(expect_debate_and_polls),
        "stress" => SimulationPlan::new(CampaignStrategy::Aggressive)
            .with_tick_minutes(15)
            .with_starting_funds(5_000_000.0)
            .with_expectation(expect_invariants)
            .with_expectation(expect_completed)
            .with_expectation(expect_electoral_total),
        _ => return None,
    };
    Some(TestScenario::simulation(name, plan))
}

fn expect_completed(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.final_status == CampaignStatus::Completed,
        "campaign ended {:?} in {} after {} ticks",
        summary.final_status,
        summary.final_phase,
        summary.ticks
    );
    Ok(())
}

fn expect_electoral_total(summary: &SimulationSummary) -> Result<()> {
    let total = summary.resolution.total_electoral_votes();
    ensure!(
        total == TOTAL_ELECTORAL_VOTES,
        "electoral votes sum to {total}, expected {TOTAL_ELECTORAL_VOTES}"
    );
    Ok(())
}

fn expect_actions_taken(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.actions_completed > 0,
        "no actions completed ({} submitted, {} rejected)",
        summary.actions_submitted,
        summary.actions_rejected
    );
    Ok(())
}

fn expect_every_phase(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.phase_history == CampaignPhase::ALL,
        "phases visited out of order: {:?}",
        summary.phase_history
    );
    Ok(())
}

fn expect_congress(summary: &SimulationSummary) -> Result<()> {
    let res = &summary.resolution;
    let seats = res.candidate_a.house_seats + res.candidate_b.house_seats;
    ensure!(
        seats == TOTAL_HOUSE_SEATS,
        "house seats sum to {seats}, expected {TOTAL_HOUSE_SEATS}"
    );
    let senate = res.candidate_a.senate_votes + res.candidate_b.senate_votes;
    ensure!(senate == 2, "senate votes sum to {senate}, expected 2");
    Ok(())
}

fn expect_consistent_winner(summary: &SimulationSummary) -> Result<()> {
    let res = &summary.resolution;
    let (ours, theirs) = (res.candidate_a.electoral_votes, res.candidate_b.electoral_votes);
    match res.winner.as_deref() {
        Some(CANDIDATE_ID) => ensure!(ours >= 270 && ours > theirs, "winner holds only {ours} votes"),
        Some(RIVAL_ID) => ensure!(theirs >= 270 && theirs > ours, "winner holds only {theirs} votes"),
        Some(other) => bail!("unexpected winner {other}"),
        None => ensure!(
            ours < 270 && theirs < 270 || ours == theirs,
            "no winner declared at {ours}-{theirs}"
        ),
    }
    Ok(())
}

fn expect_debate_and_polls(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.debate_winner.is_some(), "no debate was held");
    ensure!(
        summary.national_polls.len() >= 2,
        "only {} national polls taken",
        summary.national_polls.len()
    );
    ensure!(!summary.trends.is_empty(), "no poll trends built");
    ensure!(
        (0.0..=100.0).contains(&summary.tracked_support),
        "tracked support {} escaped 0-100",
        summary.tracked_support
    );
    Ok(())
}

fn expect_invariants(summary: &SimulationSummary) -> Result<()> {
    let inv = &summary.invariants;
    ensure!(inv.phase_regressions == 0, "{} phase regressions", inv.phase_regressions);
    ensure!(
        inv.points_over_max == 0,
        "action points exceeded the daily max {} times",
        inv.points_over_max
    );
    ensure!(inv.negative_funds == 0, "funds went negative {} times", inv.negative_funds);
    ensure!(
        summary.final_funds >= 0.0,
        "campaign finished {:.2} in debt",
        -summary.final_funds
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for name in scenario_names() {
            let scenario = get_scenario(&name).unwrap();
            assert_eq!(scenario.name, name);
            assert!(!scenario.plan.expectations.is_empty());
        }
        assert!(get_scenario("nope").is_none());
        assert!(get_scenario("determinism").unwrap().plan.replay_check);
    }
}
