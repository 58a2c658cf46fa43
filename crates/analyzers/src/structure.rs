//! Structure analyzer — budget-allocation strategy and learning-phase
//! heuristics.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use adlens_core::config::DetectionPolicy;
use adlens_core::error::EngineResult;
use adlens_core::ports::MetricsStore;
use adlens_core::types::{safe_div, DateRange, Entity};

use crate::result::{AnalysisPayload, AnalysisResult};

/// Recommended budget allocation strategy for the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStrategy {
    /// One pooled budget, algorithmically allocated across children.
    Pooled,
    /// Fixed budgets per child unit.
    PerUnit,
}

/// Structural assessment of one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureAssessment {
    pub recommended_strategy: BudgetStrategy,
    /// Too few conversions for the platform's delivery optimization to have
    /// stabilized.
    pub in_learning_phase: bool,
    /// Launched recently enough that metrics are still settling.
    pub ramping_up: bool,
    pub conversions: u64,
    pub days_since_launch: i64,
    pub spend: f64,
    pub roas: f64,
    /// Both the spend floor and the ROAS floor for this entity type passed.
    pub scaling_eligible: bool,
}

/// Evaluates budget structure and ramp-up status from the daily metric
/// history, falling back to the entity's rolled-up snapshot.
#[derive(Clone)]
pub struct StructureAnalyzer {
    store: Arc<dyn MetricsStore>,
    policy: DetectionPolicy,
}

impl StructureAnalyzer {
    pub fn new(store: Arc<dyn MetricsStore>, policy: DetectionPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn analyze(
        &self,
        entity: &Entity,
        range: &DateRange,
    ) -> EngineResult<Option<AnalysisResult>> {
        let rows = self
            .store
            .fetch_entity_metrics(entity.id, entity.entity_type, range)
            .await?;

        let (spend, revenue, conversions, data_points) = if rows.is_empty() {
            let m = &entity.metrics;
            (m.spend, m.revenue, m.conversions, 0)
        } else {
            (
                rows.iter().map(|r| r.spend).sum(),
                rows.iter().map(|r| r.revenue).sum(),
                rows.iter().map(|r| r.conversions).sum(),
                rows.len() as u64,
            )
        };

        if spend == 0.0 && conversions == 0 {
            debug!(entity_id = %entity.id, "No delivery in range");
            return Ok(None);
        }

        let roas = safe_div(revenue, spend);
        let days_since_launch = entity.days_since_launch();
        let in_learning_phase = conversions < self.policy.learning_phase_conversions;
        let ramping_up = days_since_launch <= self.policy.ramp_up_days;

        // Pooled budgeting needs enough conversion signal to allocate well;
        // entities still learning do better with fixed per-unit budgets.
        let recommended_strategy = if in_learning_phase {
            BudgetStrategy::PerUnit
        } else {
            BudgetStrategy::Pooled
        };

        let (min_spend, min_roas) = if entity.entity_type.is_campaign() {
            (
                self.policy.structure_campaign_min_spend,
                self.policy.structure_campaign_min_roas,
            )
        } else {
            (
                self.policy.structure_subentity_min_spend,
                self.policy.structure_subentity_min_roas,
            )
        };
        let scaling_eligible = spend >= min_spend && roas >= min_roas;

        let assessment = StructureAssessment {
            recommended_strategy,
            in_learning_phase,
            ramping_up,
            conversions,
            days_since_launch,
            spend,
            roas,
            scaling_eligible,
        };

        Ok(Some(AnalysisResult::new(
            AnalysisPayload::Structure(assessment),
            data_points,
        )))
    }
}
