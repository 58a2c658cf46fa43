//! Suggestions — ranked, explainable recommendations with typed reasoning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rules::{ConditionLogic, RuleAction, RuleCondition};
use crate::types::{AdPlatform, EntityType, FunnelStage, SegmentDimension};

// ─── Classification ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    ScaleHighPerformer,
    ReviewUnderperformer,
    RefineAudience,
    ReallocatePlacement,
    GeoExpansion,
    DaypartingOpportunity,
    LearningPhaseOptimization,
    OptimizeProductMix,
    ScaleProfitableNiche,
    FixFunnelStage,
    RefreshCreative,
    BudgetRestructure,
    ChangeOptimizationGoal,
    GetExpertHelp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Lifecycle of a suggestion. Suggestions are never deleted; a status
/// transition is the only permitted mutation after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Pending,
    Applied,
    Monitoring,
    Dismissed,
    Expired,
}

impl SuggestionStatus {
    /// Pending can move anywhere; monitoring can still resolve; everything
    /// else is terminal.
    pub fn can_transition(&self, to: SuggestionStatus) -> bool {
        use SuggestionStatus::*;
        match self {
            Pending => matches!(to, Applied | Monitoring | Dismissed | Expired),
            Monitoring => matches!(to, Applied | Dismissed | Expired),
            Applied | Dismissed | Expired => false,
        }
    }
}

// ─── Typed reasoning ────────────────────────────────────────────────────────

/// Structured explanation behind a suggestion. The `detail` payload is a
/// closed union per suggestion family so no untyped data crosses the API
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reasoning {
    pub risk_level: RiskLevel,
    /// Plain-language description of how the pattern was detected.
    pub methodology: String,
    /// The heuristic gates that fired, in order.
    pub triggers: Vec<String>,
    pub detail: ReasoningDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ReasoningDetail {
    SegmentOutlier {
        dimension: SegmentDimension,
        segment: String,
        segment_roas: f64,
        entity_avg_roas: f64,
        roas_multiplier: f64,
        segment_spend: f64,
        segment_revenue: f64,
        contribution_pct: f64,
        /// Cross-dimensional context, e.g. the best placement and geography.
        supporting: Vec<String>,
    },
    Underperformer {
        dimension: SegmentDimension,
        segment: String,
        segment_roas: f64,
        segment_spend: f64,
        entity_avg_roas: f64,
    },
    ProfitGap {
        revenue_roas: f64,
        profit_roas: f64,
        average_margin_pct: f64,
        conversions_analyzed: u64,
    },
    ProfitableNiche {
        revenue: f64,
        average_margin_pct: f64,
        profit_roas: f64,
    },
    FunnelDropOff {
        stage: FunnelStage,
        drop_off_pct: f64,
        entered: u64,
        completed: u64,
        impressions: u64,
    },
    Structure {
        pooled_budget: bool,
        in_learning_phase: bool,
        conversions: u64,
        days_since_launch: i64,
        roas: f64,
    },
}

// ─── Projections & rule templates ───────────────────────────────────────────

/// Point-in-time financial projection. Percentages are computed against the
/// denominators current at generation time and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatedImpact {
    pub revenue_delta: f64,
    pub profit_delta: f64,
    pub timeframe: String,
    pub confidence_low_pct: f64,
    pub confidence_high_pct: f64,
}

/// Draft guard-rail rule attached to a suggestion, materialized by the rule
/// compiler only on acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTemplate {
    pub name: String,
    pub condition_logic: ConditionLogic,
    pub conditions: Vec<RuleCondition>,
    pub actions: Vec<RuleAction>,
}

// ─── Suggestion ─────────────────────────────────────────────────────────────

/// The unit of engine output: one ranked, explainable recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub entity_name: String,
    pub entity_type: EntityType,
    pub platform: AdPlatform,
    pub suggestion_type: SuggestionType,
    /// 0–100; primary ranking key.
    pub priority_score: u8,
    /// 0–100; tie-break and presentation signal.
    pub confidence_score: u8,
    pub title: String,
    pub message: String,
    pub reasoning: Reasoning,
    pub recommended_rule: Option<RuleTemplate>,
    pub estimated_impact: Option<EstimatedImpact>,
    pub status: SuggestionStatus,
    /// Set once a rule has been compiled from this suggestion.
    pub automation_rule_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use SuggestionStatus::*;
        assert!(Pending.can_transition(Applied));
        assert!(Pending.can_transition(Monitoring));
        assert!(Pending.can_transition(Dismissed));
        assert!(Pending.can_transition(Expired));
        assert!(Monitoring.can_transition(Applied));
        assert!(!Applied.can_transition(Pending));
        assert!(!Dismissed.can_transition(Applied));
        assert!(!Expired.can_transition(Monitoring));
    }

    #[test]
    fn test_reasoning_detail_serializes_tagged() {
        let detail = ReasoningDetail::FunnelDropOff {
            stage: FunnelStage::AddToCart,
            drop_off_pct: 93.3,
            entered: 150,
            completed: 10,
            impressions: 5000,
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["kind"], "funnel_drop_off");
        assert_eq!(json["stage"], "add_to_cart");
    }
}
