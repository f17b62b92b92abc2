//! Normalizes extracted startup facts into a canonical record and derives a
//! deterministic investment decision from it.

pub mod config;
pub mod decision;
pub mod error;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod report;

pub use config::DecisionPolicy;
pub use decision::decide;
pub use error::{Error, Result};
pub use ingest::{analyze, ingest, ExtractionReply};
pub use models::{Analysis, CanonicalRecord, Decision, FinancialInsights, Verdict};
pub use normalize::{normalize, normalize_insights};
