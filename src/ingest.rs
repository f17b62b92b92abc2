//! Ingestion boundary: one extraction reply becomes one [`Analysis`].
//!
//! Normalization and decision happen here exactly once. Upstream failures are
//! surfaced as [`Error::AnalysisFailed`] and never normalized into a record.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DecisionPolicy;
use crate::models::{Analysis, FinancialInsights};
use crate::normalize::normalize_for_company;
use crate::{Error, Result};

/// What the extraction source handed back.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionReply {
    Success { body: Value },
    /// Non-2xx or unreachable source; `message` is opaque and not parsed.
    Failure { status: Option<u16>, message: String },
}

impl ExtractionReply {
    /// Treat raw response text as a reply. Text that is not JSON is a failure.
    pub fn from_body_text(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::Success { body: Value::Null };
        }
        match serde_json::from_str(text) {
            Ok(body) => Self::Success { body },
            Err(err) => Self::Failure {
                status: None,
                message: format!("extraction body is not JSON: {err}"),
            },
        }
    }
}

pub fn analyze(
    company_name: &str,
    body: &Value,
    insights: Option<&FinancialInsights>,
    policy: &DecisionPolicy,
) -> Analysis {
    let record = normalize_for_company(body, company_name);
    let decision = policy.decide(&record, insights);
    debug!(
        company = %record.startup.name,
        score = decision.score,
        verdict = %decision.verdict,
        "analysis complete"
    );

    Analysis {
        company_name: company_name.trim().to_string(),
        record,
        insights: insights.cloned().unwrap_or_default(),
        decision,
    }
}

pub fn ingest(
    reply: ExtractionReply,
    company_name: &str,
    insights: Option<&FinancialInsights>,
    policy: &DecisionPolicy,
) -> Result<Analysis> {
    match reply {
        ExtractionReply::Success { body } => Ok(analyze(company_name, &body, insights, policy)),
        ExtractionReply::Failure { status, message } => {
            warn!(?status, "extraction source failed for {}", company_name);
            let message = match status {
                Some(code) => format!("{message} (status {code})"),
                None => message,
            };
            Err(Error::AnalysisFailed(message))
        }
    }
}
