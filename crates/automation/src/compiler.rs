//! Rule compiler — materializes an accepted suggestion's rule template into
//! a persistent automation rule.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use adlens_core::config::AutomationDefaults;
use adlens_core::error::{EngineError, EngineResult};
use adlens_core::rules::AutomationRule;
use adlens_core::suggestion::{RiskLevel, Suggestion};

/// Compile a suggestion's recommended rule into an [`AutomationRule`].
///
/// The rule is an independent record after compilation: it keeps a weak
/// back-reference to the suggestion but outlives any later status change.
/// High-risk suggestions compile with `require_approval` set so the rule
/// queues its first action instead of firing it.
pub fn compile_rule(
    suggestion: &Suggestion,
    defaults: &AutomationDefaults,
) -> EngineResult<AutomationRule> {
    let template = suggestion.recommended_rule.as_ref().ok_or_else(|| {
        EngineError::Validation(format!(
            "suggestion {} has no rule template to compile",
            suggestion.id
        ))
    })?;

    if template.conditions.is_empty() {
        return Err(EngineError::Validation(
            "rule template has no conditions".to_string(),
        ));
    }
    if template.actions.is_empty() {
        return Err(EngineError::Validation(
            "rule template has no actions".to_string(),
        ));
    }

    let now = Utc::now();
    let rule = AutomationRule {
        id: Uuid::new_v4(),
        name: template.name.clone(),
        entity_id: suggestion.entity_id,
        condition_logic: template.condition_logic,
        conditions: template.conditions.clone(),
        actions: template.actions.clone(),
        check_frequency_hours: defaults.check_frequency_hours,
        max_daily_actions: defaults.max_daily_actions,
        actions_today: 0,
        counter_date: now.date_naive(),
        require_approval: suggestion.reasoning.risk_level == RiskLevel::High,
        dry_run: false,
        enabled: true,
        source_suggestion_id: Some(suggestion.id),
        last_checked_at: None,
        version: 1,
        created_at: now,
    };

    info!(
        rule_id = %rule.id,
        suggestion_id = %suggestion.id,
        entity_id = %rule.entity_id,
        conditions = rule.conditions.len(),
        require_approval = rule.require_approval,
        "Compiled automation rule"
    );

    Ok(rule)
}
