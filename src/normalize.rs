//! Field normalizer: untrusted extraction JSON in, canonical record out.
//!
//! Every field is defaulted independently. Missing keys, nulls and values of
//! the wrong shape all fall back to the documented default for that field, at
//! any nesting depth. Keys outside the schema are ignored.

use chrono::{Datelike, Utc};
use serde_json::{Map, Value};
use tracing::trace;

use crate::models::{
    CanonicalRecord, FinancialInsights, FundingRound, MarketSizing, OverallRisk, RiskAssessment,
    StartupProfile, TeamProfile, TractionMetrics, UnitEconomics, NOT_SPECIFIED, UNNAMED_COMPANY,
};

type Section<'a> = Option<&'a Map<String, Value>>;

const MAX_RISKS: usize = 3;

/// Normalize an extraction document using the current UTC year.
pub fn normalize(raw: &Value) -> CanonicalRecord {
    normalize_as_of(raw, None, Utc::now().year())
}

/// Normalize an extraction document for a company named by the caller.
///
/// The caller's name only fills `startup.name` when the extraction has none.
pub fn normalize_for_company(raw: &Value, company_name: &str) -> CanonicalRecord {
    normalize_as_of(raw, Some(company_name), Utc::now().year())
}

/// Normalize against an explicit current year, which bounds `founded_year`.
pub fn normalize_as_of(raw: &Value, company_name: Option<&str>, current_year: i32) -> CanonicalRecord {
    if !raw.is_object() && !raw.is_null() {
        trace!("top-level extraction is not an object, using all defaults");
    }

    CanonicalRecord {
        summary: text(raw.as_object(), "summary").unwrap_or_default(),
        startup: startup(section(raw, "startup"), company_name, current_year),
        team: team(section(raw, "team")),
        traction: traction(section(raw, "traction")),
        unit_economics: unit_economics(section(raw, "unit_economics")),
        market: market(section(raw, "market")),
        round: funding_round(round_section(raw)),
        risks: risks(section(raw, "risks")),
    }
}

impl From<Value> for CanonicalRecord {
    fn from(raw: Value) -> Self {
        normalize(&raw)
    }
}

/// Normalize the auxiliary insight object.
///
/// Accepts either the financial figures directly or an envelope carrying
/// them under `financial`.
pub fn normalize_insights(raw: &Value) -> FinancialInsights {
    let financial = section(raw, "financial").or_else(|| raw.as_object());
    FinancialInsights {
        revenue: number(financial, "revenue"),
        revenue_growth: number(financial, "revenue_growth"),
        burn_rate: number(financial, "burn_rate"),
        runway_months: number(financial, "runway_months"),
    }
}

fn startup(s: Section<'_>, company_name: Option<&str>, current_year: i32) -> StartupProfile {
    let caller_name = company_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    StartupProfile {
        name: text(s, "name")
            .or(caller_name)
            .unwrap_or_else(|| UNNAMED_COMPANY.to_string()),
        website: text(s, "website").unwrap_or_default(),
        sector: text(s, "sector").unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        subsector: text(s, "subsector").unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        stage: text(s, "stage"),
        hq_country: text(s, "hq_country").unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        founded_year: founded_year(s, current_year),
    }
}

fn team(s: Section<'_>) -> TeamProfile {
    TeamProfile {
        founders: strings(s, "founders"),
        team_size: count(s, "team_size").unwrap_or(0),
        average_experience_years: number(s, "average_experience_years").filter(|v| *v >= 0.0),
        key_hires: strings(s, "key_hires"),
    }
}

fn traction(s: Section<'_>) -> TractionMetrics {
    TractionMetrics {
        mrr_usd: number(s, "mrr_usd"),
        arr_usd: number(s, "arr_usd"),
        growth_mom_pct: number(s, "growth_mom_pct"),
        customers: count(s, "customers").unwrap_or(0),
        churn_pct: percent(s, "churn_pct"),
        retention_pct: percent(s, "retention_pct").unwrap_or(0.0),
    }
}

fn unit_economics(s: Section<'_>) -> UnitEconomics {
    UnitEconomics {
        cac_usd: number(s, "cac_usd"),
        ltv_usd: number(s, "ltv_usd"),
        gross_margin_pct: percent(s, "gross_margin_pct"),
        burn_rate_usd_per_month: number(s, "burn_rate_usd_per_month"),
        runway_months: number(s, "runway_months"),
    }
}

fn market(s: Section<'_>) -> MarketSizing {
    MarketSizing {
        tam_usd: number(s, "tam_usd"),
        sam_usd: number(s, "sam_usd"),
        som_usd: number(s, "som_usd"),
        competitors_count: count(s, "competitors_count"),
        growth_rate_pct: number(s, "growth_rate_pct"),
        market_position: text(s, "market_position"),
    }
}

fn funding_round(s: Section<'_>) -> FundingRound {
    FundingRound {
        seeking_usd: number(s, "seeking_usd"),
        pre_money_valuation_usd: number(s, "pre_money_valuation_usd"),
        existing_investors: strings(s, "existing_investors"),
    }
}

fn risks(s: Section<'_>) -> RiskAssessment {
    let mut top_3_risks = strings(s, "top_3_risks");
    if top_3_risks.len() > MAX_RISKS {
        trace!(count = top_3_risks.len(), "keeping only the first three risks");
        top_3_risks.truncate(MAX_RISKS);
    }

    let overall_risk = match field(s, "overall_risk") {
        Some(Value::String(value)) => OverallRisk::parse(value),
        other => {
            note_mismatch("overall_risk", other);
            None
        }
    };

    RiskAssessment {
        top_3_risks,
        overall_risk,
    }
}

fn founded_year(s: Section<'_>, current_year: i32) -> Option<i32> {
    let year = count(s, "founded_year")?;
    match i32::try_from(year) {
        Ok(year) if year <= current_year => Some(year),
        Ok(year) => {
            trace!(year, current_year, "founded_year lies in the future, dropping it");
            None
        }
        Err(_) => {
            trace!(year, "founded_year out of range, dropping it");
            None
        }
    }
}

/// `round` wins when it is an object; otherwise `funding_round` is consulted
/// before anything is reported as mismatched.
fn round_section(raw: &Value) -> Section<'_> {
    match raw.get("round").and_then(Value::as_object) {
        Some(round) => Some(round),
        None => raw
            .get("funding_round")
            .and_then(Value::as_object)
            .or_else(|| section(raw, "round")),
    }
}

fn section<'a>(raw: &'a Value, key: &str) -> Section<'a> {
    let value = raw.get(key);
    if value.is_some_and(|v| !v.is_object()) {
        note_mismatch(key, value);
    }
    value.and_then(Value::as_object)
}

fn field<'a>(s: Section<'a>, key: &str) -> Option<&'a Value> {
    s.and_then(|map| map.get(key))
}

fn text(s: Section<'_>, key: &str) -> Option<String> {
    match field(s, key) {
        Some(Value::String(value)) => {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        other => {
            note_mismatch(key, other);
            None
        }
    }
}

fn number(s: Section<'_>, key: &str) -> Option<f64> {
    match field(s, key) {
        Some(Value::Number(value)) => value.as_f64().filter(|v| v.is_finite()),
        other => {
            note_mismatch(key, other);
            None
        }
    }
}

/// Non-negative whole quantity; fractions are truncated, negatives rejected.
fn count(s: Section<'_>, key: &str) -> Option<u64> {
    if let Some(value) = field(s, key).and_then(Value::as_u64) {
        return Some(value);
    }
    number(s, key)
        .filter(|v| *v >= 0.0)
        .map(|v| v.trunc() as u64)
}

fn percent(s: Section<'_>, key: &str) -> Option<f64> {
    number(s, key).map(|v| v.clamp(0.0, 100.0))
}

fn strings(s: Section<'_>, key: &str) -> Vec<String> {
    match field(s, key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        other => {
            note_mismatch(key, other);
            Vec::new()
        }
    }
}

fn note_mismatch(key: &str, value: Option<&Value>) {
    if let Some(value) = value.filter(|v| !v.is_null()) {
        trace!(field = key, found = %value, "unexpected shape, using default");
    }
}
