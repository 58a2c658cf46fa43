//! In-memory automation rule store with optimistic check-and-set updates.
//!
//! Every mutation takes the caller's expected `version`; a mismatch returns
//! `EngineError::Conflict` and the caller re-reads and retries. The version
//! is bumped on every successful write.

use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use adlens_core::error::{EngineError, EngineResult};
use adlens_core::rules::AutomationRule;

#[derive(Default)]
pub struct RuleStore {
    rules: DashMap<Uuid, AutomationRule>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, rule: AutomationRule) -> EngineResult<()> {
        if self.rules.contains_key(&rule.id) {
            return Err(EngineError::Conflict(format!(
                "rule {} already exists",
                rule.id
            )));
        }
        self.rules.insert(rule.id, rule);
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> EngineResult<AutomationRule> {
        self.rules
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| EngineError::NotFound(format!("rule {}", id)))
    }

    pub fn list_for_entity(&self, entity_id: Uuid) -> Vec<AutomationRule> {
        let mut rules: Vec<AutomationRule> = self
            .rules
            .iter()
            .filter(|r| r.entity_id == entity_id)
            .map(|r| r.clone())
            .collect();
        rules.sort_by_key(|r| r.created_at);
        rules
    }

    pub fn set_enabled(&self, id: Uuid, expected_version: u64, enabled: bool) -> EngineResult<u64> {
        self.update(id, expected_version, |rule| {
            rule.enabled = enabled;
            Ok(())
        })
    }

    /// Record a rule evaluation pass. Bumps the version and timestamps the
    /// check whether or not any condition fired.
    pub fn record_check(&self, id: Uuid, expected_version: u64) -> EngineResult<u64> {
        self.update(id, expected_version, |rule| {
            rule.last_checked_at = Some(Utc::now());
            Ok(())
        })
    }

    /// Record an executed action against the daily budget. The counter
    /// resets when the date rolls over; once `max_daily_actions` is reached
    /// further attempts fail validation until the next day.
    pub fn record_action(&self, id: Uuid, expected_version: u64, today: NaiveDate) -> EngineResult<u64> {
        self.update(id, expected_version, |rule| {
            if rule.counter_date != today {
                rule.counter_date = today;
                rule.actions_today = 0;
            }
            if rule.actions_today >= rule.max_daily_actions {
                warn!(rule_id = %rule.id, "Daily action budget exhausted");
                return Err(EngineError::Validation(format!(
                    "rule {} reached its daily action limit of {}",
                    rule.id, rule.max_daily_actions
                )));
            }
            rule.actions_today += 1;
            Ok(())
        })
    }

    fn update<F>(&self, id: Uuid, expected_version: u64, apply: F) -> EngineResult<u64>
    where
        F: FnOnce(&mut AutomationRule) -> EngineResult<()>,
    {
        let mut entry = self
            .rules
            .get_mut(&id)
            .ok_or_else(|| EngineError::NotFound(format!("rule {}", id)))?;

        if entry.version != expected_version {
            debug!(
                rule_id = %id,
                expected = expected_version,
                actual = entry.version,
                "Stale rule version"
            );
            return Err(EngineError::Conflict(format!(
                "rule {} version {} does not match expected {}",
                id, entry.version, expected_version
            )));
        }

        apply(&mut entry)?;
        entry.version += 1;
        Ok(entry.version)
    }
}
