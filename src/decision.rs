use tracing::debug;

use crate::config::DecisionPolicy;
use crate::models::{CanonicalRecord, Decision, FinancialInsights, Verdict};

/// Ceiling of the internal points scale; reported scores are points * 10.
pub const MAX_POINTS: i32 = 10;
const SCORE_PER_POINT: i32 = 10;

/// Decide with the built-in policy.
pub fn decide(record: &CanonicalRecord, insights: Option<&FinancialInsights>) -> Decision {
    DecisionPolicy::default().decide(record, insights)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub fired: bool,
    pub weight: i32,
    pub reason: String,
}

impl RuleOutcome {
    fn new(fired: bool, weight: i32, reason: impl Into<String>) -> Self {
        Self {
            fired,
            weight,
            reason: reason.into(),
        }
    }

    fn contribution(&self) -> i32 {
        if self.fired {
            self.weight
        } else {
            0
        }
    }
}

impl DecisionPolicy {
    /// Evaluate every rule in order; no rule short-circuits another.
    pub fn evaluate(
        &self,
        record: &CanonicalRecord,
        insights: Option<&FinancialInsights>,
    ) -> Vec<RuleOutcome> {
        let w = &self.weights;
        let t = &self.thresholds;
        let retention = record.traction.retention_pct;
        let growth = insights.and_then(|i| i.revenue_growth);

        vec![
            RuleOutcome::new(
                retention > t.retention_pct_above,
                w.retention,
                format!("Good retention {retention}%."),
            ),
            RuleOutcome::new(
                record.team.team_size > t.team_size_above,
                w.team_size,
                "Adequate team size.",
            ),
            RuleOutcome::new(
                record.market.tam_usd.is_some_and(|tam| tam > t.tam_usd_above),
                w.market_size,
                "Large addressable market.",
            ),
            RuleOutcome::new(
                growth.is_some_and(|g| g > t.revenue_growth_above),
                w.growth,
                "Strong growth.",
            ),
            RuleOutcome::new(
                record.risks.top_3_risks.len() < t.risks_below,
                w.few_risks,
                "Few disclosed risks.",
            ),
        ]
    }

    pub fn decide(
        &self,
        record: &CanonicalRecord,
        insights: Option<&FinancialInsights>,
    ) -> Decision {
        let outcomes = self.evaluate(record, insights);

        let points = outcomes
            .iter()
            .map(RuleOutcome::contribution)
            .fold(0i32, |acc, points| acc.saturating_add(points));
        let mut reasons: Vec<String> = outcomes
            .into_iter()
            .filter(|outcome| outcome.contribution() > 0)
            .map(|outcome| outcome.reason)
            .collect();

        if reasons.is_empty() {
            reasons.push(self.no_signal_reason.clone());
        }

        let score = score_from_points(points);
        let verdict = self.verdict_for(score);
        debug!(points, score, %verdict, "decision derived");

        Decision {
            score,
            verdict,
            reasons,
        }
    }

    pub fn verdict_for(&self, score: u8) -> Verdict {
        if score >= self.verdict.invest_at {
            Verdict::Invest
        } else if score >= self.verdict.defer_at {
            Verdict::Defer
        } else {
            Verdict::Pass
        }
    }
}

pub fn score_from_points(points: i32) -> u8 {
    let raw = points.clamp(0, MAX_POINTS);
    (raw * SCORE_PER_POINT).clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_as_of;
    use serde_json::{json, Value};

    fn record(raw: Value) -> CanonicalRecord {
        normalize_as_of(&raw, None, 2026)
    }

    fn growth(value: f64) -> FinancialInsights {
        FinancialInsights {
            revenue_growth: Some(value),
            ..FinancialInsights::default()
        }
    }

    #[test]
    fn strong_retention_and_team_without_market_data_pass() {
        let record = record(json!({
            "traction": {"retention_pct": 99},
            "team": {"team_size": 250},
            "risks": {"top_3_risks": ["a", "b", "c"]}
        }));

        let decision = decide(&record, None);
        assert_eq!(decision.score, 30);
        assert_eq!(decision.verdict, Verdict::Pass);
        assert_eq!(
            decision.reasons,
            vec!["Good retention 99%.", "Adequate team size."]
        );
    }

    #[test]
    fn empty_input_only_credits_few_risks() {
        let decision = decide(&record(json!({})), None);
        assert_eq!(decision.score, 10);
        assert_eq!(decision.verdict, Verdict::Pass);
        assert_eq!(decision.reasons, vec!["Few disclosed risks."]);
    }

    #[test]
    fn every_signal_present_invests() {
        let record = record(json!({
            "traction": {"retention_pct": 99},
            "team": {"team_size": 10},
            "market": {"tam_usd": 2_400_000_000u64},
            "risks": {"top_3_risks": ["Competition"]}
        }));

        let decision = decide(&record, Some(&growth(1.27)));
        assert_eq!(decision.score, 80);
        assert_eq!(decision.verdict, Verdict::Invest);
        assert_eq!(
            decision.reasons,
            vec![
                "Good retention 99%.",
                "Adequate team size.",
                "Large addressable market.",
                "Strong growth.",
                "Few disclosed risks.",
            ]
        );
    }

    #[test]
    fn no_signal_uses_fallback_reason() {
        let record = record(json!({"risks": {"top_3_risks": ["a", "b"]}}));
        let decision = decide(&record, None);
        assert_eq!(decision.score, 0);
        assert_eq!(decision.verdict, Verdict::Pass);
        assert_eq!(decision.reasons, vec!["No strong positive indicators found."]);
    }

    #[test]
    fn thresholds_are_strict() {
        let record = record(json!({
            "traction": {"retention_pct": 90},
            "team": {"team_size": 5},
            "market": {"tam_usd": 1_000_000_000u64},
            "risks": {"top_3_risks": ["a", "b"]}
        }));
        let decision = decide(&record, Some(&growth(0.5)));
        assert_eq!(decision.score, 0);
    }

    #[test]
    fn fractional_retention_is_reported_verbatim() {
        let record = record(json!({"traction": {"retention_pct": 92.5}}));
        let decision = decide(&record, None);
        assert_eq!(decision.reasons[0], "Good retention 92.5%.");
    }

    #[test]
    fn verdict_buckets_partition_the_score_range() {
        let policy = DecisionPolicy::default();
        for score in 0..=100u8 {
            let expected = if score >= 70 {
                Verdict::Invest
            } else if score >= 40 {
                Verdict::Defer
            } else {
                Verdict::Pass
            };
            assert_eq!(policy.verdict_for(score), expected, "score {score}");
        }
        assert_eq!(policy.verdict_for(39), Verdict::Pass);
        assert_eq!(policy.verdict_for(40), Verdict::Defer);
        assert_eq!(policy.verdict_for(69), Verdict::Defer);
        assert_eq!(policy.verdict_for(70), Verdict::Invest);
    }

    #[test]
    fn score_is_clamped() {
        assert_eq!(score_from_points(-4), 0);
        assert_eq!(score_from_points(7), 70);
        assert_eq!(score_from_points(15), 100);
    }

    #[test]
    fn crossing_each_threshold_never_lowers_the_score() {
        let base = json!({
            "traction": {"retention_pct": 80},
            "team": {"team_size": 3},
            "market": {"tam_usd": 5e8},
            "risks": {"top_3_risks": ["a", "b", "c"]}
        });
        let before = decide(&record(base.clone()), None).score;

        let tweaks = [
            ("/traction/retention_pct", json!(95)),
            ("/team/team_size", json!(6)),
            ("/market/tam_usd", json!(3e9)),
            ("/risks/top_3_risks", json!(["a"])),
        ];
        for (pointer, value) in tweaks {
            let mut raw = base.clone();
            *raw.pointer_mut(pointer).unwrap() = value;
            let after = decide(&record(raw), None).score;
            assert!(after >= before, "{pointer}: {after} < {before}");
        }
    }

    #[test]
    fn reasons_are_never_empty() {
        let inputs = [
            json!(null),
            json!({"risks": {"top_3_risks": ["a", "b", "c"]}}),
            json!({"traction": {"retention_pct": 100}}),
        ];
        for raw in inputs {
            assert!(!decide(&record(raw), None).reasons.is_empty());
        }
    }

    #[test]
    fn negative_weights_subtract_without_reasons() {
        let mut policy = DecisionPolicy::default();
        policy.weights.few_risks = -1;
        policy.weights.team_size = 5;

        let record = record(json!({"team": {"team_size": 9}}));
        let decision = policy.decide(&record, None);
        assert_eq!(decision.score, 40);
        assert_eq!(decision.verdict, Verdict::Defer);
        assert_eq!(decision.reasons, vec!["Adequate team size."]);
    }

    #[test]
    fn extreme_weights_saturate_instead_of_overflowing() {
        let mut policy = DecisionPolicy::default();
        policy.weights.retention = i32::MAX;
        policy.weights.few_risks = i32::MAX;

        let record = record(json!({"traction": {"retention_pct": 99}}));
        let decision = policy.decide(&record, None);
        assert_eq!(decision.score, 100);
        assert_eq!(decision.verdict, Verdict::Invest);

        policy.weights.retention = i32::MIN;
        policy.weights.few_risks = i32::MIN;
        let decision = policy.decide(&record, None);
        assert_eq!(decision.score, 0);
        assert_eq!(decision.reasons, vec!["No strong positive indicators found."]);
    }

    #[test]
    fn custom_cut_points_move_the_verdict() {
        let mut policy = DecisionPolicy::default();
        policy.verdict.defer_at = 10;
        let decision = policy.decide(&record(json!({})), None);
        assert_eq!(decision.verdict, Verdict::Defer);
    }

    #[test]
    fn deciding_twice_is_identical() {
        let record = record(json!({"traction": {"retention_pct": 99}}));
        assert_eq!(decide(&record, None), decide(&record, None));
    }
}
