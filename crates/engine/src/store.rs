//! Suggestion store — suggestions are never deleted; status transitions are
//! the only mutation permitted after insert.

use chrono::{Duration, Utc};
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use adlens_core::error::{EngineError, EngineResult};
use adlens_core::suggestion::{Suggestion, SuggestionStatus};

#[derive(Default)]
pub struct SuggestionStore {
    suggestions: DashMap<Uuid, Suggestion>,
}

impl SuggestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_all(&self, suggestions: Vec<Suggestion>) {
        for suggestion in suggestions {
            self.suggestions.insert(suggestion.id, suggestion);
        }
    }

    pub fn get(&self, id: Uuid) -> EngineResult<Suggestion> {
        self.suggestions
            .get(&id)
            .map(|s| s.clone())
            .ok_or_else(|| EngineError::NotFound(format!("suggestion {}", id)))
    }

    /// All suggestions for one entity, highest priority first.
    pub fn list_for_entity(&self, entity_id: Uuid) -> Vec<Suggestion> {
        let mut out: Vec<Suggestion> = self
            .suggestions
            .iter()
            .filter(|s| s.entity_id == entity_id)
            .map(|s| s.clone())
            .collect();
        out.sort_by(|a, b| {
            b.priority_score
                .cmp(&a.priority_score)
                .then(b.confidence_score.cmp(&a.confidence_score))
        });
        out
    }

    pub fn list_pending(&self) -> Vec<Suggestion> {
        self.suggestions
            .iter()
            .filter(|s| s.status == SuggestionStatus::Pending)
            .map(|s| s.clone())
            .collect()
    }

    /// Move a suggestion to a new lifecycle status. Rejected with
    /// `InvalidTransition` when the current status is terminal or the move
    /// is not in the transition table.
    pub fn transition(&self, id: Uuid, to: SuggestionStatus) -> EngineResult<Suggestion> {
        let mut entry = self
            .suggestions
            .get_mut(&id)
            .ok_or_else(|| EngineError::NotFound(format!("suggestion {}", id)))?;

        if !entry.status.can_transition(to) {
            return Err(EngineError::InvalidTransition(format!(
                "suggestion {} cannot move {:?} -> {:?}",
                id, entry.status, to
            )));
        }

        entry.status = to;
        entry.updated_at = Utc::now();
        debug!(suggestion_id = %id, status = ?to, "Suggestion transitioned");
        Ok(entry.clone())
    }

    /// Record the rule compiled from this suggestion.
    pub fn set_rule(&self, id: Uuid, rule_id: Uuid) -> EngineResult<()> {
        let mut entry = self
            .suggestions
            .get_mut(&id)
            .ok_or_else(|| EngineError::NotFound(format!("suggestion {}", id)))?;
        entry.automation_rule_id = Some(rule_id);
        entry.updated_at = Utc::now();
        Ok(())
    }

    /// Expire pending suggestions older than the TTL. The underlying data
    /// window has moved on; stale projections must not look actionable.
    pub fn expire_stale(&self, ttl_days: u32) -> usize {
        let cutoff = Utc::now() - Duration::days(i64::from(ttl_days));
        let mut expired = 0;

        for mut entry in self.suggestions.iter_mut() {
            if entry.status == SuggestionStatus::Pending && entry.created_at < cutoff {
                entry.status = SuggestionStatus::Expired;
                entry.updated_at = Utc::now();
                expired += 1;
            }
        }

        if expired > 0 {
            info!(expired, ttl_days, "Expired stale suggestions");
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use adlens_core::suggestion::{Reasoning, ReasoningDetail, RiskLevel, SuggestionType};
    use adlens_core::types::{AdPlatform, EntityType};

    fn suggestion(priority: u8, age_days: i64) -> Suggestion {
        let created = Utc::now() - Duration::days(age_days);
        Suggestion {
            id: Uuid::new_v4(),
            entity_id: Uuid::new_v4(),
            entity_name: "Evergreen".into(),
            entity_type: EntityType::Campaign,
            platform: AdPlatform::Meta,
            suggestion_type: SuggestionType::ScaleHighPerformer,
            priority_score: priority,
            confidence_score: 60,
            title: "t".into(),
            message: "m".into(),
            reasoning: Reasoning {
                risk_level: RiskLevel::Low,
                methodology: String::new(),
                triggers: Vec::new(),
                detail: ReasoningDetail::Structure {
                    pooled_budget: false,
                    in_learning_phase: false,
                    conversions: 0,
                    days_since_launch: 0,
                    roas: 0.0,
                },
            },
            recommended_rule: None,
            estimated_impact: None,
            status: SuggestionStatus::Pending,
            automation_rule_id: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_transition_validates_lifecycle() {
        let store = SuggestionStore::new();
        let s = suggestion(80, 0);
        let id = s.id;
        store.insert_all(vec![s]);

        store.transition(id, SuggestionStatus::Monitoring).unwrap();
        store.transition(id, SuggestionStatus::Applied).unwrap();

        // applied is terminal
        let err = store
            .transition(id, SuggestionStatus::Dismissed)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
    }

    #[test]
    fn test_expire_stale_only_touches_old_pending() {
        let store = SuggestionStore::new();
        let fresh = suggestion(80, 1);
        let stale = suggestion(70, 20);
        let stale_id = stale.id;
        let fresh_id = fresh.id;

        let mut applied = suggestion(60, 30);
        applied.status = SuggestionStatus::Applied;
        let applied_id = applied.id;

        store.insert_all(vec![fresh, stale, applied]);
        let expired = store.expire_stale(14);

        assert_eq!(expired, 1);
        assert_eq!(
            store.get(stale_id).unwrap().status,
            SuggestionStatus::Expired
        );
        assert_eq!(
            store.get(fresh_id).unwrap().status,
            SuggestionStatus::Pending
        );
        assert_eq!(
            store.get(applied_id).unwrap().status,
            SuggestionStatus::Applied
        );
    }

    #[test]
    fn test_list_for_entity_ordered_by_priority() {
        let store = SuggestionStore::new();
        let mut a = suggestion(60, 0);
        let mut b = suggestion(90, 0);
        let entity = Uuid::new_v4();
        a.entity_id = entity;
        b.entity_id = entity;
        store.insert_all(vec![a, b]);

        let out = store.list_for_entity(entity);
        assert_eq!(out[0].priority_score, 90);
        assert_eq!(out[1].priority_score, 60);
    }

    #[test]
    fn test_missing_suggestion_is_not_found() {
        let store = SuggestionStore::new();
        assert!(matches!(
            store.get(Uuid::new_v4()).unwrap_err(),
            EngineError::NotFound(_)
        ));
    }
}
