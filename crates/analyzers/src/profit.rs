//! Profit analyzer — margin-adjusted ROAS from order conversions joined to
//! product cost data.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use adlens_core::config::DetectionPolicy;
use adlens_core::error::EngineResult;
use adlens_core::ports::MetricsStore;
use adlens_core::types::{safe_div, DateRange, Entity};

use crate::result::{AnalysisPayload, AnalysisResult};

/// True-profit view of an entity's ad spend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitMetrics {
    /// `conversion revenue / spend`.
    pub revenue_roas: f64,
    /// `(revenue - cogs) / spend`.
    pub profit_roas: f64,
    pub average_margin_pct: f64,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub total_cogs: f64,
    pub conversions_analyzed: u64,
    pub findings: Vec<ProfitFinding>,
}

/// A flagged profit pattern with its projected monthly impact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitFinding {
    pub kind: ProfitFindingKind,
    /// Estimated profit delta per month if acted on, at current volume.
    pub monthly_impact: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitFindingKind {
    /// Strong revenue ROAS but the margin structure eats the profit.
    HighRevenueLowMargin,
    /// Small but highly profitable niche worth scaling.
    LowRevenueHighMargin,
}

/// Joins the enriched conversion feed to cost data and flags profit patterns.
#[derive(Clone)]
pub struct ProfitAnalyzer {
    store: Arc<dyn MetricsStore>,
    policy: DetectionPolicy,
}

impl ProfitAnalyzer {
    pub fn new(store: Arc<dyn MetricsStore>, policy: DetectionPolicy) -> Self {
        Self { store, policy }
    }

    /// Returns `Ok(None)` when the range has no conversions; the caller
    /// simply omits this analyzer's suggestions.
    pub async fn analyze(
        &self,
        entity: &Entity,
        range: &DateRange,
    ) -> EngineResult<Option<AnalysisResult>> {
        let conversions = self
            .store
            .fetch_enriched_conversions(&entity.platform_entity_id, range)
            .await?;

        if conversions.is_empty() {
            debug!(entity_id = %entity.id, "No enriched conversions in range");
            return Ok(None);
        }

        let total_revenue: f64 = conversions.iter().map(|c| c.revenue).sum();
        let total_cogs: f64 = conversions.iter().map(|c| c.cogs).sum();
        let total_profit = total_revenue - total_cogs;
        let spend = entity.metrics.spend;

        let revenue_roas = safe_div(total_revenue, spend);
        let profit_roas = safe_div(total_profit, spend);
        let average_margin_pct = safe_div(total_profit, total_revenue) * 100.0;

        let mut findings = Vec::new();

        if revenue_roas > self.policy.profit_high_revenue_roas
            && profit_roas < self.policy.profit_low_profit_roas
        {
            // Margin leak: every additional ad dollar compounds the gap
            // between revenue ROAS and profit ROAS.
            findings.push(ProfitFinding {
                kind: ProfitFindingKind::HighRevenueLowMargin,
                monthly_impact: ((revenue_roas - profit_roas) * spend).max(0.0),
            });
        }

        if total_revenue < self.policy.niche_max_revenue
            && average_margin_pct > self.policy.niche_min_margin_pct
            && profit_roas > self.policy.niche_min_profit_roas
        {
            findings.push(ProfitFinding {
                kind: ProfitFindingKind::LowRevenueHighMargin,
                monthly_impact: total_profit,
            });
        }

        let metrics = ProfitMetrics {
            revenue_roas,
            profit_roas,
            average_margin_pct,
            total_revenue,
            total_profit,
            total_cogs,
            conversions_analyzed: conversions.len() as u64,
            findings,
        };

        Ok(Some(AnalysisResult::new(
            AnalysisPayload::Profit(metrics),
            conversions.len() as u64,
        )))
    }
}
