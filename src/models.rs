use std::fmt;

use serde::{Deserialize, Serialize};

pub const UNNAMED_COMPANY: &str = "Unnamed Company";
pub const NOT_SPECIFIED: &str = "Not specified";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartupProfile {
    pub name: String,
    pub website: String,
    pub sector: String,
    pub subsector: String,
    pub stage: Option<String>,
    pub hq_country: String,
    pub founded_year: Option<i32>,
}

impl Default for StartupProfile {
    fn default() -> Self {
        Self {
            name: UNNAMED_COMPANY.to_string(),
            website: String::new(),
            sector: NOT_SPECIFIED.to_string(),
            subsector: NOT_SPECIFIED.to_string(),
            stage: None,
            hq_country: NOT_SPECIFIED.to_string(),
            founded_year: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamProfile {
    pub founders: Vec<String>,
    pub team_size: u64,
    pub average_experience_years: Option<f64>,
    pub key_hires: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TractionMetrics {
    pub mrr_usd: Option<f64>,
    pub arr_usd: Option<f64>,
    pub growth_mom_pct: Option<f64>,
    pub customers: u64,
    pub churn_pct: Option<f64>,
    pub retention_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnitEconomics {
    pub cac_usd: Option<f64>,
    pub ltv_usd: Option<f64>,
    pub gross_margin_pct: Option<f64>,
    pub burn_rate_usd_per_month: Option<f64>,
    pub runway_months: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketSizing {
    pub tam_usd: Option<f64>,
    pub sam_usd: Option<f64>,
    pub som_usd: Option<f64>,
    pub competitors_count: Option<u64>,
    pub growth_rate_pct: Option<f64>,
    pub market_position: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FundingRound {
    pub seeking_usd: Option<f64>,
    pub pre_money_valuation_usd: Option<f64>,
    pub existing_investors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallRisk {
    Low,
    Medium,
    High,
}

impl OverallRisk {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl fmt::Display for OverallRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub top_3_risks: Vec<String>,
    pub overall_risk: Option<OverallRisk>,
}

/// Fully-defaulted, closed-schema facts about one startup.
///
/// Only the normalizer builds these from untrusted input, and deserializing
/// one routes through it too; every leaf is populated, so consumers never
/// need to null-check a nested object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct CanonicalRecord {
    pub summary: String,
    pub startup: StartupProfile,
    pub team: TeamProfile,
    pub traction: TractionMetrics,
    pub unit_economics: UnitEconomics,
    pub market: MarketSizing,
    pub round: FundingRound,
    pub risks: RiskAssessment,
}

/// Auxiliary figures computed alongside the extraction.
///
/// `revenue_growth` is a ratio: 0.5 means 50%.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialInsights {
    pub revenue: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub burn_rate: Option<f64>,
    pub runway_months: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Invest,
    Pass,
    Defer,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Invest => "INVEST",
            Self::Pass => "PASS",
            Self::Defer => "DEFER",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    /// 0..=100
    pub score: u8,
    pub verdict: Verdict,
    /// Never empty, in rule-evaluation order.
    pub reasons: Vec<String>,
}

/// A canonical record and the decision derived from it, created together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub company_name: String,
    pub record: CanonicalRecord,
    pub insights: FinancialInsights,
    pub decision: Decision,
}
