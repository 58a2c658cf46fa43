//! Analyzer output envelope. Read-only once produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::funnel::FunnelBreakdown;
use crate::profit::ProfitMetrics;
use crate::structure::StructureAssessment;

/// One analyzer's output for one entity over one date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub payload: AnalysisPayload,
    /// Row count behind the result; feeds confidence scoring downstream.
    pub data_points_analyzed: u64,
    pub computed_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(payload: AnalysisPayload, data_points_analyzed: u64) -> Self {
        Self {
            payload,
            data_points_analyzed,
            computed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "analyzer")]
pub enum AnalysisPayload {
    Profit(ProfitMetrics),
    Funnel(FunnelBreakdown),
    Structure(StructureAssessment),
}
