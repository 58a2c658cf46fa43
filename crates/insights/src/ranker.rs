//! Suggestion ranking — priority ordering, per-entity dedup, platform policy
//! filtering, and the output cap.

use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use adlens_core::config::RankingPolicy;
use adlens_core::suggestion::{Suggestion, SuggestionType};

/// Orders suggestions by priority (confidence breaks ties), keeps the
/// highest-priority suggestion per `(entity, type)` pair, drops
/// goal-change suggestions on platforms whose policy disallows them, and
/// truncates to the configured maximum.
pub fn rank_and_dedup(mut suggestions: Vec<Suggestion>, policy: &RankingPolicy) -> Vec<Suggestion> {
    suggestions.sort_by(|a, b| {
        b.priority_score
            .cmp(&a.priority_score)
            .then(b.confidence_score.cmp(&a.confidence_score))
    });

    let mut seen: HashSet<(Uuid, SuggestionType)> = HashSet::new();
    let mut out = Vec::with_capacity(suggestions.len().min(policy.max_suggestions));

    for suggestion in suggestions {
        if suggestion.suggestion_type == SuggestionType::ChangeOptimizationGoal
            && !policy.goal_change_allowed.contains(&suggestion.platform)
        {
            debug!(
                platform = %suggestion.platform,
                entity_id = %suggestion.entity_id,
                "Goal-change suggestion dropped by platform policy"
            );
            continue;
        }
        // Sorted order means the first occurrence per key is the winner.
        if !seen.insert((suggestion.entity_id, suggestion.suggestion_type)) {
            continue;
        }
        out.push(suggestion);
        if out.len() == policy.max_suggestions {
            break;
        }
    }

    out
}
