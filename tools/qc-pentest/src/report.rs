//! # Security Report
//!
//! Summary score, vulnerabilities mapped from failed tests, prioritized
//! recommendations and an overall risk level.
//!
//! | Failed category | Vulnerability | Severity |
//! |-----------------|---------------|----------|
//! | byzantine | QC-VULN-001 Equivocation undetected | HIGH |
//! | sybil | QC-VULN-002 Weak admission control | HIGH |
//! | eclipse | QC-VULN-003 Peer set capture | MEDIUM |
//! | dos | QC-VULN-004 Flood passes mitigation | MEDIUM |
//! | crypto | QC-VULN-005 Cryptographic forgery | HIGH |

use std::collections::BTreeSet;
use std::fmt;

use qc_18_consensus_security::Severity;
use serde::{Deserialize, Serialize};

use crate::outcome::{ratio, TestCategory, TestOutcome};

/// Overall risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// Catalog entry for a class of weakness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    pub title: String,
    pub category: TestCategory,
    pub severity: Severity,
    pub description: String,
    /// Tests whose failure exposed it
    pub failed_tests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Severity,
    pub vulnerability: Option<String>,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Percentage of passed tests
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityReport {
    pub generated_at: u64,
    pub summary: ReportSummary,
    pub results: Vec<TestOutcome>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub recommendations: Vec<Recommendation>,
    pub risk_level: RiskLevel,
}

struct CatalogEntry {
    id: &'static str,
    title: &'static str,
    severity: Severity,
    description: &'static str,
    action: &'static str,
}

fn catalog(category: TestCategory) -> CatalogEntry {
    match category {
        TestCategory::Byzantine => CatalogEntry {
            id: "QC-VULN-001",
            title: "Equivocation undetected",
            severity: Severity::High,
            description: "Participants voting for conflicting proposals in one round are not flagged",
            action: "Widen byzantine.contradiction_window_ms and verify message attribution",
        },
        TestCategory::Sybil => CatalogEntry {
            id: "QC-VULN-002",
            title: "Weak admission control",
            severity: Severity::High,
            description: "Identities without sufficient proof of work, stake or credentials are admitted",
            action: "Raise sybil.min_factors or sybil.pow_difficulty and tighten per-IP join limits",
        },
        TestCategory::Eclipse => CatalogEntry {
            id: "QC-VULN-003",
            title: "Peer set capture",
            severity: Severity::Medium,
            description: "Connections concentrated in one country or ASN are not trimmed",
            action: "Lower eclipse.max_group_share or eclipse.max_connections_per_source",
        },
        TestCategory::Dos => CatalogEntry {
            id: "QC-VULN-004",
            title: "Flood passes mitigation",
            severity: Severity::Medium,
            description: "Flood traffic reaches consensus or legitimate traffic is starved",
            action: "Tune dos.flag_threshold and score weights against observed traffic",
        },
        TestCategory::Crypto => CatalogEntry {
            id: "QC-VULN-005",
            title: "Cryptographic forgery",
            severity: Severity::High,
            description: "A signature, proof or commitment was accepted outside its statement",
            action: "Audit partial-signature verification, proof freshness and transcript binding",
        },
    }
}

impl SecurityReport {
    /// Build a report from outcomes.
    pub fn from_outcomes(results: Vec<TestOutcome>, generated_at: u64) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let summary = ReportSummary {
            total,
            passed,
            failed: total - passed,
            score: (ratio(passed, total) * 1_000.0).round() / 10.0,
        };

        let failed_categories: BTreeSet<TestCategory> = results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.category)
            .collect();

        let mut vulnerabilities: Vec<Vulnerability> = failed_categories
            .iter()
            .map(|&category| {
                let entry = catalog(category);
                Vulnerability {
                    id: entry.id.to_string(),
                    title: entry.title.to_string(),
                    category,
                    severity: entry.severity,
                    description: entry.description.to_string(),
                    failed_tests: results
                        .iter()
                        .filter(|r| !r.passed && r.category == category)
                        .map(|r| r.name.clone())
                        .collect(),
                }
            })
            .collect();
        vulnerabilities.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.id.cmp(&b.id)));

        let mut recommendations: Vec<Recommendation> = vulnerabilities
            .iter()
            .map(|v| Recommendation {
                priority: v.severity,
                vulnerability: Some(v.id.clone()),
                action: catalog(v.category).action.to_string(),
            })
            .collect();
        recommendations.push(Recommendation {
            priority: Severity::Low,
            vulnerability: None,
            action: "Re-run the penetration suite after every configuration change".to_string(),
        });

        let risk_level = if failed_categories.iter().any(TestCategory::is_critical) {
            RiskLevel::High
        } else if !failed_categories.is_empty() {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        Self {
            generated_at,
            summary,
            results,
            vulnerabilities,
            recommendations,
            risk_level,
        }
    }
}
