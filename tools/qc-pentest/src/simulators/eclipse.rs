//! Eclipse attempt: many attacker connections from one country and ASN
//! against a handful of diverse legitimate peers.

use std::collections::HashSet;

use qc_18_consensus_security::ConnectionRecord;
use tracing::info;

use super::{ScenarioConfig, SimulationContext};
use crate::error::SimulationError;
use crate::outcome::{ratio, TestCategory, TestOutcome};

/// Node whose peer set is under attack.
const ECLIPSE_TARGET: &str = "pentest-target";

const COUNTRIES: [&str; 12] = [
    "US", "DE", "JP", "BR", "IN", "FR", "CA", "AU", "SG", "ZA", "SE", "KR",
];

pub fn simulate_eclipse(
    ctx: &SimulationContext<'_>,
    scenario: &ScenarioConfig,
) -> Result<TestOutcome, SimulationError> {
    let legit: Vec<ConnectionRecord> = (0..scenario.eclipse_legit_connections)
        .map(|i| {
            ConnectionRecord::new(
                format!("198.51.100.{}", i + 1),
                COUNTRIES[i % COUNTRIES.len()],
                format!("AS{}", 64_500 + i),
                format!("pentest-peer-{}", i),
            )
        })
        .collect();
    let attacker: Vec<ConnectionRecord> = (0..scenario.eclipse_attacker_ips)
        .flat_map(|ip| {
            (0..scenario.eclipse_connections_per_attacker).map(move |c| {
                ConnectionRecord::new(
                    format!("203.0.113.{}", ip + 1),
                    "XX",
                    "AS666",
                    format!("pentest-attacker-{}-{}", ip, c),
                )
            })
        })
        .collect();

    let legit_ids: HashSet<&str> = legit.iter().map(|c| c.node_id.as_str()).collect();
    let connections: Vec<ConnectionRecord> =
        legit.iter().chain(attacker.iter()).cloned().collect();

    let report = ctx.manager.validate_connections(ECLIPSE_TARGET, &connections);

    let legit_kept = report
        .accepted
        .iter()
        .filter(|c| legit_ids.contains(c.node_id.as_str()))
        .count();
    let attacker_blocked = report
        .blocked
        .iter()
        .filter(|c| !legit_ids.contains(c.node_id.as_str()))
        .count();

    let attacker_block_rate = ratio(attacker_blocked, attacker.len());
    let legit_keep_rate = ratio(legit_kept, legit.len());
    let passed = attacker_block_rate >= scenario.eclipse_min_attacker_block_rate
        && legit_keep_rate >= scenario.eclipse_min_legit_keep_rate;
    info!(
        attacker_blocked,
        legit_kept,
        diversity_enforced = report.diversity_enforced,
        "Eclipse simulation finished"
    );

    Ok(TestOutcome::new("eclipse_connection_flood", TestCategory::Eclipse, passed)
        .with_metric("attacker_block_rate", attacker_block_rate)
        .with_metric("legit_keep_rate", legit_keep_rate)
        .with_metric("country_entropy", report.country_entropy)
        .with_metric("asn_entropy", report.asn_entropy)
        .with_details(format!(
            "{}/{} attacker connections blocked, {}/{} legitimate kept",
            attacker_blocked,
            attacker.len(),
            legit_kept,
            legit.len()
        )))
}
