//! Append-only action ledger. Every dispatch attempt lands here exactly
//! once, success or not; entries are never mutated or deleted.

use dashmap::DashMap;
use uuid::Uuid;

use adlens_core::rules::ActionLogEntry;

#[derive(Default)]
pub struct ActionLog {
    entries: DashMap<Uuid, ActionLogEntry>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, entry: ActionLogEntry) {
        self.entries.insert(entry.id, entry);
    }

    pub fn get(&self, id: Uuid) -> Option<ActionLogEntry> {
        self.entries.get(&id).map(|e| e.clone())
    }

    /// All attempts against one entity, oldest first.
    pub fn for_entity(&self, entity_id: Uuid) -> Vec<ActionLogEntry> {
        let mut entries: Vec<ActionLogEntry> = self
            .entries
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .map(|e| e.clone())
            .collect();
        entries.sort_by_key(|e| e.executed_at);
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    use adlens_core::rules::ActionType;
    use adlens_core::types::{AdPlatform, EntityType};

    fn entry(entity_id: Uuid, age_minutes: i64) -> ActionLogEntry {
        ActionLogEntry {
            id: Uuid::new_v4(),
            entity_id,
            platform_entity_id: "c-1".into(),
            platform: AdPlatform::Meta,
            entity_type: EntityType::Campaign,
            action: ActionType::Pause,
            params: json!({}),
            success: true,
            message: "ok".into(),
            suggestion_id: None,
            executed_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn test_for_entity_ordered_oldest_first() {
        let log = ActionLog::new();
        let entity = Uuid::new_v4();
        log.append(entry(entity, 1));
        log.append(entry(entity, 10));
        log.append(entry(Uuid::new_v4(), 5));

        let entries = log.for_entity(entity);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].executed_at <= entries[1].executed_at);
    }
}
