//! Request flood from a bot pool mixed with an authenticated trickle.

use qc_18_consensus_security::InboundRequest;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use super::{thresholds, ScenarioConfig, SimulationContext};
use crate::error::SimulationError;
use crate::outcome::{ratio, TestCategory, TestOutcome};

const FLOOD_REQUEST_BYTES: u64 = 10_240;
const LEGIT_REQUEST_BYTES: u64 = 512;

pub fn simulate_dos(
    ctx: &SimulationContext<'_>,
    scenario: &ScenarioConfig,
) -> Result<TestOutcome, SimulationError> {
    if scenario.dos_bot_pool == 0 || scenario.dos_duration_ms == 0 {
        return Err(SimulationError::Setup("empty DoS scenario".into()));
    }
    let mut rng = rand::thread_rng();
    let start = ctx.now();
    let duration = scenario.dos_duration_ms;

    let bots: Vec<String> = (0..scenario.dos_bot_pool)
        .map(|i| format!("203.0.113.{}", 100 + i % 150))
        .collect();
    let flood_total = (scenario.dos_flood_rps * duration / 1_000) as usize;

    let mut batch = Vec::with_capacity(flood_total + scenario.dos_legit_requests);
    for _ in 0..flood_total {
        let source = bots.choose(&mut rng).cloned().unwrap_or_default();
        let request = InboundRequest::new(
            source,
            FLOOD_REQUEST_BYTES,
            start + rng.gen_range(0..duration),
        );
        batch.push(if rng.gen_bool(0.2) { request.failed() } else { request });
    }
    let legit_step = duration / scenario.dos_legit_requests.max(1) as u64;
    for i in 0..scenario.dos_legit_requests {
        batch.push(
            InboundRequest::new(
                format!("198.51.100.{}", i + 1),
                LEGIT_REQUEST_BYTES,
                start + i as u64 * legit_step,
            )
            .authenticated(),
        );
    }
    batch.shuffle(&mut rng);

    ctx.clock.set(start + duration);
    let report = ctx.manager.filter_requests(batch);

    let legit_allowed = report.allowed.iter().filter(|r| r.authenticated).count();
    let flood_allowed = report.allowed.len() - legit_allowed;
    let flood_block_rate = 1.0 - ratio(flood_allowed, flood_total);
    let legit_preserve_rate = ratio(legit_allowed, scenario.dos_legit_requests);
    let passed = flood_block_rate >= thresholds::DOS_FLOOD_BLOCK_RATE
        && legit_preserve_rate >= thresholds::DOS_LEGIT_PRESERVE_RATE;
    info!(
        flood_allowed,
        flood_total,
        legit_allowed,
        blacklisted = report.newly_blacklisted.len(),
        "DoS simulation finished"
    );

    Ok(TestOutcome::new("dos_flood", TestCategory::Dos, passed)
        .with_metric("flood_block_rate", flood_block_rate)
        .with_metric("legit_preserve_rate", legit_preserve_rate)
        .with_metric("sources_blacklisted", report.newly_blacklisted.len() as f64)
        .with_details(format!(
            "{}/{} flood requests blocked, {}/{} legitimate preserved",
            flood_total - flood_allowed,
            flood_total,
            legit_allowed,
            scenario.dos_legit_requests
        )))
}
