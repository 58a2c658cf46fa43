//! Opportunity detector — pure functions that flag segment outliers against
//! the entity's own average ROAS.

use serde::{Deserialize, Serialize};

use adlens_core::config::DetectionPolicy;
use adlens_core::types::{safe_div, SegmentBreakdown, SegmentDimension, SegmentPerformance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    TopPerformer,
    Underperformer,
}

/// A detected segment pattern worth a suggestion. Always embedded in a
/// suggestion downstream, never stored on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub kind: OpportunityKind,
    pub dimension: SegmentDimension,
    pub segment: SegmentPerformance,
    /// Segment ROAS over the entity average.
    pub roas_multiplier: f64,
}

/// Top-segment detection. Both gates must pass: the absolute ROAS floor and
/// the relative multiple over the entity average.
pub fn detect_top_performer(
    segments: &[SegmentPerformance],
    entity_avg_roas: f64,
    policy: &DetectionPolicy,
) -> Option<Opportunity> {
    let top = segments.first()?;
    let multiplier = safe_div(top.roas, entity_avg_roas);

    if top.roas < policy.top_min_roas || multiplier < policy.top_min_multiplier {
        return None;
    }

    Some(Opportunity {
        kind: OpportunityKind::TopPerformer,
        dimension: top.dimension,
        segment: top.clone(),
        roas_multiplier: multiplier,
    })
}

/// Worst-segment detection. Requires real spend so low-spend noise never
/// triggers a pause recommendation.
pub fn detect_underperformer(
    segments: &[SegmentPerformance],
    entity_avg_roas: f64,
    policy: &DetectionPolicy,
) -> Option<Opportunity> {
    let worst = segments.last()?;

    if worst.roas > policy.under_max_roas || worst.spend < policy.under_min_spend {
        return None;
    }

    Some(Opportunity {
        kind: OpportunityKind::Underperformer,
        dimension: worst.dimension,
        segment: worst.clone(),
        roas_multiplier: safe_div(worst.roas, entity_avg_roas),
    })
}

/// Run both detectors over every dimension of a breakdown.
pub fn detect_all(
    breakdown: &SegmentBreakdown,
    entity_avg_roas: f64,
    policy: &DetectionPolicy,
) -> Vec<Opportunity> {
    let mut opportunities = Vec::new();
    for dimension in SegmentDimension::ALL {
        let segments = breakdown.get(dimension);
        if let Some(opp) = detect_top_performer(segments, entity_avg_roas, policy) {
            opportunities.push(opp);
        }
        if let Some(opp) = detect_underperformer(segments, entity_avg_roas, policy) {
            opportunities.push(opp);
        }
    }
    opportunities
}
