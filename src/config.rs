//! Decision policy: rule weights, rule thresholds and verdict cut points.
//!
//! Every tunable of the decision engine is defined here and nowhere else.
//! Resolution order for the policy file:
//! 1. `--policy` command-line argument
//! 2. `STARTUP_DECISION_POLICY` environment variable (read by clap)
//! 3. Built-in defaults below

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::decision::MAX_POINTS;
use crate::{Error, Result};

pub const POLICY_ENV_VAR: &str = "STARTUP_DECISION_POLICY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    /// Reason reported when no rule contributes a positive signal.
    pub no_signal_reason: String,
    pub verdict: VerdictCutPoints,
    pub weights: RuleWeights,
    pub thresholds: RuleThresholds,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            no_signal_reason: "No strong positive indicators found.".to_string(),
            verdict: VerdictCutPoints::default(),
            weights: RuleWeights::default(),
            thresholds: RuleThresholds::default(),
        }
    }
}

/// Cut points on the reported 0..=100 score.
///
/// `score >= invest_at` is INVEST, `defer_at <= score < invest_at` is DEFER,
/// anything lower is PASS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictCutPoints {
    pub invest_at: u8,
    pub defer_at: u8,
}

impl Default for VerdictCutPoints {
    fn default() -> Self {
        Self {
            invest_at: 70,
            defer_at: 40,
        }
    }
}

/// Signed points each rule contributes when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleWeights {
    pub retention: i32,
    pub team_size: i32,
    pub market_size: i32,
    pub growth: i32,
    pub few_risks: i32,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            retention: 2,
            team_size: 1,
            market_size: 2,
            growth: 2,
            few_risks: 1,
        }
    }
}

/// Strict comparison bounds: each rule fires when the value is above
/// (or, for risks, below) its bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    pub retention_pct_above: f64,
    pub team_size_above: u64,
    pub tam_usd_above: f64,
    /// Ratio, 0.5 = 50%.
    pub revenue_growth_above: f64,
    pub risks_below: usize,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            retention_pct_above: 90.0,
            team_size_above: 5,
            tam_usd_above: 1_000_000_000.0,
            revenue_growth_above: 0.5,
            risks_below: 2,
        }
    }
}

impl DecisionPolicy {
    /// Parse and validate a policy from TOML text. Missing keys keep defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let policy: Self = toml::from_str(content)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let policy = Self::from_toml(&content)?;
        info!("Loaded decision policy from {}", path.display());
        Ok(policy)
    }

    /// Policy file when one was given, otherwise the built-in defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let VerdictCutPoints {
            invest_at,
            defer_at,
        } = self.verdict;

        if invest_at > 100 {
            return Err(Error::InvalidPolicy(format!(
                "invest_at must be at most 100, got {invest_at}"
            )));
        }
        if defer_at >= invest_at {
            return Err(Error::InvalidPolicy(format!(
                "defer_at ({defer_at}) must be below invest_at ({invest_at})"
            )));
        }

        let weights = [
            ("retention", self.weights.retention),
            ("team_size", self.weights.team_size),
            ("market_size", self.weights.market_size),
            ("growth", self.weights.growth),
            ("few_risks", self.weights.few_risks),
        ];
        if let Some((name, weight)) = weights
            .iter()
            .find(|(_, weight)| !(-MAX_POINTS..=MAX_POINTS).contains(weight))
        {
            return Err(Error::InvalidPolicy(format!(
                "weight {name} must lie within -{MAX_POINTS}..={MAX_POINTS}, got {weight}"
            )));
        }

        let bounds = [
            ("retention_pct_above", self.thresholds.retention_pct_above),
            ("tam_usd_above", self.thresholds.tam_usd_above),
            ("revenue_growth_above", self.thresholds.revenue_growth_above),
        ];
        if let Some((name, _)) = bounds.iter().find(|(_, value)| !value.is_finite()) {
            return Err(Error::InvalidPolicy(format!("{name} must be a finite number")));
        }

        if self.no_signal_reason.trim().is_empty() {
            return Err(Error::InvalidPolicy(
                "no_signal_reason must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let policy = DecisionPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.verdict.invest_at, 70);
        assert_eq!(policy.verdict.defer_at, 40);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let policy = DecisionPolicy::from_toml(
            r#"
            [verdict]
            invest_at = 80

            [weights]
            growth = 3
            "#,
        )
        .unwrap();

        assert_eq!(policy.verdict.invest_at, 80);
        assert_eq!(policy.verdict.defer_at, 40);
        assert_eq!(policy.weights.growth, 3);
        assert_eq!(policy.weights.retention, 2);
        assert_eq!(policy.thresholds, RuleThresholds::default());
    }

    #[test]
    fn overlapping_cut_points_are_rejected() {
        let err = DecisionPolicy::from_toml("[verdict]\ninvest_at = 40\ndefer_at = 40\n")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPolicy(_)));

        let err = DecisionPolicy::from_toml("[verdict]\ninvest_at = 120\n").unwrap_err();
        assert!(matches!(err, Error::InvalidPolicy(_)));
    }

    #[test]
    fn out_of_range_weights_are_rejected() {
        let err = DecisionPolicy::from_toml(
            "[weights]\nretention = 2147483647\nfew_risks = 2147483647\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPolicy(_)));

        let err = DecisionPolicy::from_toml("[weights]\ngrowth = -11\n").unwrap_err();
        assert!(matches!(err, Error::InvalidPolicy(_)));

        let policy = DecisionPolicy::from_toml("[weights]\ngrowth = -10\nteam_size = 10\n").unwrap();
        assert_eq!(policy.weights.growth, -10);
    }

    #[test]
    fn blank_fallback_reason_is_rejected() {
        let err = DecisionPolicy::from_toml("no_signal_reason = \"  \"\n").unwrap_err();
        assert!(matches!(err, Error::InvalidPolicy(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = DecisionPolicy::from_toml("[verdict\ninvest_at = ").unwrap_err();
        assert!(matches!(err, Error::PolicyParse(_)));
    }

    #[test]
    fn resolve_reads_file_or_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[thresholds]\nteam_size_above = 10").unwrap();

        let loaded = DecisionPolicy::resolve(Some(file.path())).unwrap();
        assert_eq!(loaded.thresholds.team_size_above, 10);

        let fallback = DecisionPolicy::resolve(None).unwrap();
        assert_eq!(fallback, DecisionPolicy::default());
    }

    #[test]
    fn rendered_policy_parses_back() {
        let policy = DecisionPolicy::default();
        let rendered = policy.to_toml().unwrap();
        assert_eq!(DecisionPolicy::from_toml(&rendered).unwrap(), policy);
    }
}
