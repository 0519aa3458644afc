//! Security configuration.
//!
//! Every tunable lives here. All sections default independently, so a TOML
//! file only needs the values it changes:
//!
//! ```toml
//! [threshold]
//! parties = 7
//! threshold = 5
//!
//! [dos]
//! flag_threshold = 0.6
//! ```

use std::path::Path;

use qc_zkp::FreshnessConfig;
use serde::{Deserialize, Serialize};

use crate::detection::{ByzantineConfig, DosConfig, EclipseConfig, SybilConfig};
use crate::domain::{ConfigError, NodeId};
use crate::reputation::ReputationConfig;

/// Main security configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Threshold key ceremony
    pub threshold: ThresholdConfig,
    /// Authentication proof freshness
    pub zkp: FreshnessConfig,
    pub reputation: ReputationConfig,
    pub byzantine: ByzantineConfig,
    pub sybil: SybilConfig,
    pub eclipse: EclipseConfig,
    pub dos: DosConfig,
    pub alerts: AlertConfig,
    pub forensics: ForensicsConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdConfig::default(),
            zkp: FreshnessConfig::default(),
            reputation: ReputationConfig::default(),
            byzantine: ByzantineConfig::default(),
            sybil: SybilConfig::default(),
            eclipse: EclipseConfig::default(),
            dos: DosConfig::default(),
            alerts: AlertConfig::default(),
            forensics: ForensicsConfig::default(),
        }
    }
}

/// Threshold ceremony configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Number of key holders (n)
    pub parties: usize,
    /// Signatures required (t)
    pub threshold: usize,
    /// Node ids of the key holders, in party-index order. Empty means
    /// `node-1 ..= node-n`.
    pub roster: Vec<NodeId>,
    /// Ceremony attempts before giving up
    pub dkg_max_attempts: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            parties: 5,
            threshold: 3,
            roster: Vec::new(),
            dkg_max_attempts: 3,
        }
    }
}

impl ThresholdConfig {
    /// Roster with defaults filled in.
    pub fn resolved_roster(&self) -> Vec<NodeId> {
        if self.roster.is_empty() {
            (1..=self.parties).map(|i| format!("node-{}", i)).collect()
        } else {
            self.roster.clone()
        }
    }
}

/// Alert system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Alerts retained in history
    pub history_size: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { history_size: 1_000 }
    }
}

/// Forensic log configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForensicsConfig {
    /// Entries retained before the oldest are evicted
    pub max_entries: usize,
}

impl Default for ForensicsConfig {
    fn default() -> Self {
        Self { max_entries: 10_000 }
    }
}

impl SecurityConfig {
    /// Parse TOML and validate.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Small, fast preset: 2-of-3 signing and 8-bit proof of work.
    pub fn for_testing() -> Self {
        Self {
            threshold: ThresholdConfig {
                parties: 3,
                threshold: 2,
                ..ThresholdConfig::default()
            },
            sybil: SybilConfig {
                pow_difficulty: 8,
                ..SybilConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.threshold;
        if t.threshold == 0 || t.threshold > t.parties {
            return Err(invalid(
                "threshold.threshold",
                format!("must be in 1..={}, got {}", t.parties, t.threshold),
            ));
        }
        if !t.roster.is_empty() && t.roster.len() != t.parties {
            return Err(invalid(
                "threshold.roster",
                format!("has {} entries for {} parties", t.roster.len(), t.parties),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = t.roster.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(invalid("threshold.roster", format!("duplicate node {}", dup)));
        }
        if t.dkg_max_attempts == 0 {
            return Err(invalid("threshold.dkg_max_attempts", "cannot be 0".into()));
        }

        if self.zkp.window_ms == 0 {
            return Err(invalid("zkp.window_ms", "cannot be 0".into()));
        }

        let r = &self.reputation;
        check_unit("reputation.initial_score", r.initial_score)?;
        check_unit("reputation.decay_factor", r.decay_factor)?;
        check_unit("reputation.blacklist_threshold", r.blacklist_threshold)?;
        if r.decay_period_ms == 0 {
            return Err(invalid("reputation.decay_period_ms", "cannot be 0".into()));
        }

        check_unit("byzantine.similarity_threshold", self.byzantine.similarity_threshold)?;
        if self.byzantine.shingle_size == 0 {
            return Err(invalid("byzantine.shingle_size", "cannot be 0".into()));
        }

        let s = &self.sybil;
        if s.min_factors == 0 || s.min_factors > 4 {
            return Err(invalid(
                "sybil.min_factors",
                format!("must be in 1..=4, got {}", s.min_factors),
            ));
        }
        if s.pow_difficulty > 256 {
            return Err(invalid("sybil.pow_difficulty", "exceeds 256 bits".into()));
        }
        check_unit("sybil.min_reputation", s.min_reputation)?;

        check_unit("eclipse.max_group_share", self.eclipse.max_group_share)?;
        if self.eclipse.max_connections_per_source == 0 {
            return Err(invalid(
                "eclipse.max_connections_per_source",
                "cannot be 0".into(),
            ));
        }

        let d = &self.dos;
        if (d.weights.total() - 1.0).abs() > 1e-6 {
            return Err(invalid(
                "dos.weights",
                format!("must sum to 1, got {:.3}", d.weights.total()),
            ));
        }
        check_unit("dos.baseline_alpha", d.baseline_alpha)?;
        check_unit("dos.flag_threshold", d.flag_threshold)?;
        check_unit("dos.blacklist_threshold", d.blacklist_threshold)?;
        if d.blacklist_threshold < d.flag_threshold {
            return Err(invalid(
                "dos.blacklist_threshold",
                "must not be below flag_threshold".into(),
            ));
        }
        if d.max_requests_per_source == 0 {
            return Err(invalid("dos.max_requests_per_source", "cannot be 0".into()));
        }
        if d.source_idle_ttl_ms == 0 {
            return Err(invalid("dos.source_idle_ttl_ms", "cannot be 0".into()));
        }

        if self.alerts.history_size == 0 {
            return Err(invalid("alerts.history_size", "cannot be 0".into()));
        }
        if self.forensics.max_entries == 0 {
            return Err(invalid("forensics.max_entries", "cannot be 0".into()));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("must be in [0, 1], got {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(SecurityConfig::default().validate().is_ok());
        assert!(SecurityConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SecurityConfig::from_toml_str(
            r#"
            [threshold]
            parties = 7
            threshold = 5

            [dos]
            flag_threshold = 0.6
            "#,
        )
        .unwrap();
        assert_eq!(config.threshold.parties, 7);
        assert_eq!(config.threshold.dkg_max_attempts, 3);
        assert_eq!(config.dos.flag_threshold, 0.6);
        assert_eq!(config.dos.blacklist_threshold, 0.8);
        assert_eq!(config.sybil.pow_difficulty, 16);
    }

    #[test]
    fn test_threshold_above_parties_rejected() {
        let mut config = SecurityConfig::default();
        config.threshold.threshold = 6;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "threshold.threshold",
                ..
            })
        ));
    }

    #[test]
    fn test_roster_size_and_duplicates() {
        let mut config = SecurityConfig::for_testing();
        config.threshold.roster = vec!["a".into(), "b".into()];
        assert!(config.validate().is_err());
        config.threshold.roster = vec!["a".into(), "b".into(), "a".into()];
        assert!(config.validate().is_err());
        config.threshold.roster = vec!["a".into(), "b".into(), "c".into()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_roster() {
        let config = ThresholdConfig::default();
        assert_eq!(
            config.resolved_roster(),
            vec!["node-1", "node-2", "node-3", "node-4", "node-5"]
        );
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = SecurityConfig::default();
        config.dos.weights.frequency = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            SecurityConfig::from_toml_str("threshold = ["),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            SecurityConfig::from_file("/nonexistent/qc-security.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
