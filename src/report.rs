use std::collections::HashMap;
use std::fmt::Write;
use std::path::Path;

use serde::Serialize;

use crate::models::{Analysis, Verdict, NOT_SPECIFIED};
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct VerdictSummary {
    pub verdict: Verdict,
    pub count: usize,
    pub avg_score: f64,
}

pub fn summarize_by_verdict(analyses: &[Analysis]) -> Vec<VerdictSummary> {
    let mut map: HashMap<Verdict, (usize, u32)> = HashMap::new();

    for analysis in analyses {
        let entry = map.entry(analysis.decision.verdict).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += u32::from(analysis.decision.score);
    }

    let mut summaries: Vec<VerdictSummary> = map
        .into_iter()
        .map(|(verdict, (count, total_score))| VerdictSummary {
            verdict,
            count,
            avg_score: if count == 0 {
                0.0
            } else {
                total_score as f64 / count as f64
            },
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.verdict.to_string().cmp(&b.verdict.to_string()))
    });
    summaries
}

/// Highest score first; ties keep input order.
pub fn rank(analyses: &[Analysis]) -> Vec<&Analysis> {
    let mut ranked: Vec<&Analysis> = analyses.iter().collect();
    ranked.sort_by(|a, b| b.decision.score.cmp(&a.decision.score));
    ranked
}

pub fn build_report(analysis: &Analysis) -> String {
    let record = &analysis.record;
    let startup = &record.startup;
    let mut output = String::new();

    let _ = writeln!(output, "# Investment Analysis: {}", startup.name);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Company");
    let _ = writeln!(output, "- Website: {}", or_not_specified(&startup.website));
    let _ = writeln!(output, "- Sector: {} / {}", startup.sector, startup.subsector);
    let _ = writeln!(output, "- Stage: {}", text_or_default(startup.stage.as_deref()));
    let _ = writeln!(output, "- HQ country: {}", startup.hq_country);
    let _ = writeln!(
        output,
        "- Founded: {}",
        startup
            .founded_year
            .map(|year| year.to_string())
            .unwrap_or_else(|| NOT_SPECIFIED.to_string())
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    if record.summary.is_empty() {
        let _ = writeln!(output, "No summary available for this analysis.");
    } else {
        let _ = writeln!(output, "{}", record.summary);
    }

    let traction = &record.traction;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Traction");
    let _ = writeln!(output, "- MRR: {}", format_usd(traction.mrr_usd));
    let _ = writeln!(output, "- ARR: {}", format_usd(traction.arr_usd));
    let _ = writeln!(output, "- Growth (MoM): {}", format_pct(traction.growth_mom_pct));
    let _ = writeln!(output, "- Customers: {}", traction.customers);
    let _ = writeln!(output, "- Churn: {}", format_pct(traction.churn_pct));
    let _ = writeln!(output, "- Retention: {}%", traction.retention_pct);

    let economics = &record.unit_economics;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Unit Economics");
    let _ = writeln!(output, "- CAC: {}", format_usd(economics.cac_usd));
    let _ = writeln!(output, "- LTV: {}", format_usd(economics.ltv_usd));
    let _ = writeln!(output, "- Gross margin: {}", format_pct(economics.gross_margin_pct));
    let _ = writeln!(
        output,
        "- Burn rate: {}/month",
        format_usd(economics.burn_rate_usd_per_month)
    );
    let _ = writeln!(
        output,
        "- Runway: {}",
        economics
            .runway_months
            .map(|months| format!("{months} months"))
            .unwrap_or_else(|| NOT_SPECIFIED.to_string())
    );

    let market = &record.market;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Market");
    let _ = writeln!(output, "- TAM: {}", format_usd(market.tam_usd));
    let _ = writeln!(output, "- SAM: {}", format_usd(market.sam_usd));
    let _ = writeln!(output, "- SOM: {}", format_usd(market.som_usd));
    let _ = writeln!(
        output,
        "- Competitors: {}",
        market
            .competitors_count
            .map(|count| count.to_string())
            .unwrap_or_else(|| NOT_SPECIFIED.to_string())
    );
    let _ = writeln!(output, "- Market growth: {}", format_pct(market.growth_rate_pct));
    let _ = writeln!(
        output,
        "- Position: {}",
        text_or_default(market.market_position.as_deref())
    );

    let team = &record.team;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Team");
    let _ = writeln!(output, "- Team size: {}", team.team_size);
    if team.founders.is_empty() {
        let _ = writeln!(output, "- Founders: No founder information available");
    } else {
        let _ = writeln!(output, "- Founders: {}", team.founders.join(", "));
    }
    if let Some(years) = team.average_experience_years {
        let _ = writeln!(output, "- Average experience: {years} years");
    }
    if !team.key_hires.is_empty() {
        let _ = writeln!(output, "- Key hires: {}", team.key_hires.join(", "));
    }

    let round = &record.round;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Funding Round");
    let _ = writeln!(output, "- Seeking: {}", format_usd(round.seeking_usd));
    let _ = writeln!(
        output,
        "- Pre-money valuation: {}",
        format_usd(round.pre_money_valuation_usd)
    );
    if round.existing_investors.is_empty() {
        let _ = writeln!(output, "- Existing investors: None disclosed");
    } else {
        let _ = writeln!(
            output,
            "- Existing investors: {}",
            round.existing_investors.join(", ")
        );
    }

    let risks = &record.risks;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risks");
    if let Some(level) = risks.overall_risk {
        let _ = writeln!(output, "Overall risk: {level}");
    }
    if risks.top_3_risks.is_empty() {
        let _ = writeln!(output, "No specific risks identified in the document.");
    } else {
        for (index, risk) in risks.top_3_risks.iter().enumerate() {
            let _ = writeln!(output, "{}. {}", index + 1, risk);
        }
    }

    let decision = &analysis.decision;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Decision");
    let _ = writeln!(
        output,
        "**{}** with score {}/100",
        decision.verdict, decision.score
    );
    for reason in decision.reasons.iter() {
        let _ = writeln!(output, "- {reason}");
    }

    output
}

pub fn build_ranking(analyses: &[Analysis], limit: usize) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Startup Ranking");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Verdict Mix");

    let summaries = summarize_by_verdict(analyses);
    if summaries.is_empty() {
        let _ = writeln!(output, "No analyses to rank.");
        return output;
    }
    for summary in summaries.iter() {
        let _ = writeln!(
            output,
            "- {}: {} startups (avg score {:.1})",
            summary.verdict, summary.count, summary.avg_score
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Startups");
    for (position, analysis) in rank(analyses).iter().take(limit).enumerate() {
        let _ = writeln!(
            output,
            "{}. {} ({}) score {} - {}",
            position + 1,
            analysis.record.startup.name,
            analysis.decision.verdict,
            analysis.decision.score,
            analysis.decision.reasons.join(" ")
        );
    }

    output
}

#[derive(Debug, Serialize)]
struct RankingRow<'a> {
    company: &'a str,
    sector: &'a str,
    score: u8,
    verdict: String,
    reasons: String,
}

pub fn write_ranking_csv(path: &Path, analyses: &[Analysis]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut written = 0usize;

    for analysis in rank(analyses) {
        writer.serialize(RankingRow {
            company: &analysis.record.startup.name,
            sector: &analysis.record.startup.sector,
            score: analysis.decision.score,
            verdict: analysis.decision.verdict.to_string(),
            reasons: analysis.decision.reasons.join("; "),
        })?;
        written += 1;
    }

    writer.flush()?;
    Ok(written)
}

/// Compact USD: $2.4B, $1.2M, $45K.
pub fn format_usd(value: Option<f64>) -> String {
    let Some(value) = value else {
        return NOT_SPECIFIED.to_string();
    };

    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();
    let (scaled, suffix) = if magnitude >= 1e9 {
        (magnitude / 1e9, "B")
    } else if magnitude >= 1e6 {
        (magnitude / 1e6, "M")
    } else if magnitude >= 1e3 {
        (magnitude / 1e3, "K")
    } else {
        (magnitude, "")
    };

    let digits = format!("{scaled:.1}");
    let digits = digits.strip_suffix(".0").unwrap_or(&digits);
    format!("{sign}${digits}{suffix}")
}

fn format_pct(value: Option<f64>) -> String {
    value
        .map(|pct| format!("{pct}%"))
        .unwrap_or_else(|| NOT_SPECIFIED.to_string())
}

fn text_or_default(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_SPECIFIED)
}

fn or_not_specified(value: &str) -> &str {
    if value.is_empty() {
        NOT_SPECIFIED
    } else {
        value
    }
}
