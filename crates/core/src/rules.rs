//! Automation rules and the append-only action ledger records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AdPlatform, EntityType};

// ─── Conditions & actions ───────────────────────────────────────────────────

/// Metric a rule condition evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMetric {
    Roas,
    Cpa,
    Ctr,
    Spend,
    Revenue,
    Conversions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
}

impl ComparisonOp {
    pub fn compare(&self, left: f64, right: f64) -> bool {
        match self {
            ComparisonOp::Lt => left < right,
            ComparisonOp::Lte => left <= right,
            ComparisonOp::Gt => left > right,
            ComparisonOp::Gte => left >= right,
            ComparisonOp::Eq => (left - right).abs() < f64::EPSILON,
        }
    }
}

/// How a rule's conditions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionLogic {
    And,
    Or,
}

/// One metric comparison evaluated over a trailing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub metric: RuleMetric,
    pub op: ComparisonOp,
    pub threshold: f64,
    pub window_hours: u32,
}

/// Direct actions the dispatcher can execute against a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    IncreaseBudget,
    DecreaseBudget,
    Pause,
    Duplicate,
    AdjustTargeting,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActionType::IncreaseBudget => "increase_budget",
            ActionType::DecreaseBudget => "decrease_budget",
            ActionType::Pause => "pause",
            ActionType::Duplicate => "duplicate",
            ActionType::AdjustTargeting => "adjust_targeting",
        };
        f.write_str(name)
    }
}

/// An action plus its platform-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAction {
    pub action: ActionType,
    pub params: serde_json::Value,
}

// ─── Automation rules ───────────────────────────────────────────────────────

/// A persisted condition→action policy compiled from an accepted suggestion.
/// Runs independently of the suggestion once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: Uuid,
    pub name: String,
    pub entity_id: Uuid,
    pub condition_logic: ConditionLogic,
    pub conditions: Vec<RuleCondition>,
    pub actions: Vec<RuleAction>,
    pub check_frequency_hours: u32,
    pub max_daily_actions: u32,
    /// Actions taken on `counter_date`; resets when the date rolls over.
    pub actions_today: u32,
    pub counter_date: NaiveDate,
    pub require_approval: bool,
    pub dry_run: bool,
    pub enabled: bool,
    /// Weak back-reference to the originating suggestion, not ownership.
    pub source_suggestion_id: Option<Uuid>,
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Bumped on every write; drives optimistic check-and-set updates.
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

// ─── Action outcomes & ledger ───────────────────────────────────────────────

/// Result of one platform action call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
    /// Ids of newly created entities, for duplicate actions.
    pub new_ids: Vec<String>,
}

impl ActionOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            new_ids: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            new_ids: Vec::new(),
        }
    }

    pub fn not_supported(what: impl std::fmt::Display) -> Self {
        Self::failed(format!("{} is not supported on this platform", what))
    }
}

/// Append-only record of one action attempt. Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub platform_entity_id: String,
    pub platform: AdPlatform,
    pub entity_type: EntityType,
    pub action: ActionType,
    pub params: serde_json::Value,
    pub success: bool,
    pub message: String,
    pub suggestion_id: Option<Uuid>,
    pub executed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_ops() {
        assert!(ComparisonOp::Lt.compare(1.0, 2.0));
        assert!(!ComparisonOp::Lt.compare(2.0, 2.0));
        assert!(ComparisonOp::Lte.compare(2.0, 2.0));
        assert!(ComparisonOp::Gte.compare(3.0, 2.0));
        assert!(ComparisonOp::Eq.compare(2.0, 2.0));
    }

    #[test]
    fn test_action_outcome_helpers() {
        assert!(ActionOutcome::ok("done").success);
        assert!(!ActionOutcome::failed("nope").success);
        let o = ActionOutcome::not_supported(ActionType::Duplicate);
        assert!(!o.success);
        assert!(o.message.contains("duplicate"));
    }
}
