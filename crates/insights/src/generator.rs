//! Insight generator — turns detected opportunities and analyzer results
//! into explainable suggestion records with financial projections.
//!
//! Every percentage here is computed against the denominators current at
//! generation time; a suggestion is a point-in-time snapshot and is never
//! recomputed retroactively.

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use adlens_core::config::{DetectionPolicy, ProjectionPolicy};
use adlens_core::rules::{
    ActionType, ComparisonOp, ConditionLogic, RuleAction, RuleCondition, RuleMetric,
};
use adlens_core::suggestion::{
    EstimatedImpact, Reasoning, ReasoningDetail, RiskLevel, RuleTemplate, Suggestion,
    SuggestionStatus, SuggestionType,
};
use adlens_core::types::{Entity, EntityType, SegmentBreakdown, SegmentDimension};

use adlens_analyzers::funnel::{stage_recommendation, FunnelBreakdown};
use adlens_analyzers::profit::{ProfitFindingKind, ProfitMetrics};
use adlens_analyzers::structure::{BudgetStrategy, StructureAssessment};

use crate::detector::{Opportunity, OpportunityKind};

/// Confidence band from the number of data points behind a result.
pub fn confidence_from_data_points(n: u64) -> u8 {
    match n {
        0 => 40,
        1..=9 => 45,
        10..=49 => 60,
        50..=249 => 75,
        250..=999 => 85,
        _ => 95,
    }
}

fn entity_noun(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Campaign => "campaign",
        EntityType::AdSet => "ad set",
        EntityType::Ad => "ad",
    }
}

fn clamp_score(score: f64) -> u8 {
    score.round().clamp(0.0, 100.0) as u8
}

pub struct InsightGenerator {
    detection: DetectionPolicy,
    projection: ProjectionPolicy,
}

impl InsightGenerator {
    pub fn new(detection: DetectionPolicy, projection: ProjectionPolicy) -> Self {
        Self {
            detection,
            projection,
        }
    }

    // ─── Segment opportunities ──────────────────────────────────────────────

    pub fn from_opportunity(
        &self,
        entity: &Entity,
        opportunity: &Opportunity,
        breakdown: &SegmentBreakdown,
    ) -> Suggestion {
        match opportunity.kind {
            OpportunityKind::TopPerformer => self.top_performer(entity, opportunity, breakdown),
            OpportunityKind::Underperformer => self.underperformer(entity, opportunity),
        }
    }

    fn top_performer(
        &self,
        entity: &Entity,
        opp: &Opportunity,
        breakdown: &SegmentBreakdown,
    ) -> Suggestion {
        let seg = &opp.segment;
        let suggestion_type = match opp.dimension {
            SegmentDimension::Demographic => SuggestionType::ScaleHighPerformer,
            SegmentDimension::Placement => SuggestionType::ReallocatePlacement,
            SegmentDimension::Geographic => SuggestionType::GeoExpansion,
            SegmentDimension::Temporal => SuggestionType::DaypartingOpportunity,
        };

        let priority = clamp_score(70.0 + 10.0 * opp.roas_multiplier);
        let confidence = confidence_from_data_points(seg.clicks + seg.conversions);
        let supporting = cross_dimensional_context(breakdown, opp.dimension);

        let noun = entity_noun(entity.entity_type);
        let title = format!("Scale into top {} segment: {}", opp.dimension, seg.segment);
        let found = format!(
            "The {} segment \"{}\" is returning {:.1}x ROAS, {:.1}x this {}'s average, \
             on ${:.0} of spend.",
            opp.dimension, seg.segment, seg.roas, opp.roas_multiplier, noun, seg.spend
        );
        let why = if supporting.is_empty() {
            format!(
                "This segment already drives {:.1}% of revenue in its dimension. Concentrating \
                 budget where returns are proven compounds instead of averaging down.",
                seg.contribution_pct
            )
        } else {
            format!(
                "This segment already drives {:.1}% of revenue in its dimension, and the \
                 pattern holds across dimensions ({}). Concentrating budget where returns \
                 are proven compounds instead of averaging down.",
                seg.contribution_pct,
                supporting.join("; ")
            )
        };
        let act = match entity.entity_type {
            EntityType::Campaign => format!(
                "Shift budget toward this segment, or break it out into a dedicated ad set \
                 with +{:.0}% of its current budget. The attached guard rail reverses the \
                 change if ROAS regresses.",
                self.projection.scale_budget_pct
            ),
            _ => format!(
                "Duplicate this {} narrowed to the segment and fund it at +{:.0}% of current \
                 spend. The attached guard rail reverses the change if ROAS regresses.",
                noun, self.projection.scale_budget_pct
            ),
        };

        let impact = self.scale_impact(seg.spend, seg.roas, confidence);
        let rule = self.guardrail_rule(entity, seg.roas);

        self.build(
            entity,
            suggestion_type,
            priority,
            confidence,
            title,
            three_paragraphs(&found, &why, &act),
            Reasoning {
                risk_level: RiskLevel::Medium,
                methodology: format!(
                    "Segments ranked by ROAS within each dimension; flagged because ROAS \
                     {:.1} cleared the {:.1} floor and the {:.1}x average multiple cleared \
                     the {:.1}x floor.",
                    seg.roas,
                    self.detection.top_min_roas,
                    opp.roas_multiplier,
                    self.detection.top_min_multiplier
                ),
                triggers: vec![
                    format!("segment roas {:.2} >= {:.2}", seg.roas, self.detection.top_min_roas),
                    format!(
                        "roas multiple {:.2} >= {:.2}",
                        opp.roas_multiplier, self.detection.top_min_multiplier
                    ),
                ],
                detail: ReasoningDetail::SegmentOutlier {
                    dimension: opp.dimension,
                    segment: seg.segment.clone(),
                    segment_roas: seg.roas,
                    entity_avg_roas: entity.metrics.roas(),
                    roas_multiplier: opp.roas_multiplier,
                    segment_spend: seg.spend,
                    segment_revenue: seg.revenue,
                    contribution_pct: seg.contribution_pct,
                    supporting,
                },
            },
            Some(rule),
            Some(impact),
        )
    }

    fn underperformer(&self, entity: &Entity, opp: &Opportunity) -> Suggestion {
        let seg = &opp.segment;
        let priority = clamp_score(
            65.0 + (self.detection.under_max_roas - seg.roas) * 10.0 + (seg.spend / 100.0).min(10.0),
        );
        let confidence = confidence_from_data_points(seg.clicks + seg.conversions);
        let noun = entity_noun(entity.entity_type);

        let found = format!(
            "The {} segment \"{}\" has spent ${:.0} at only {:.2} ROAS, well below this \
             {}'s average.",
            opp.dimension, seg.segment, seg.spend, seg.roas, noun
        );
        let why = format!(
            "Spend in this segment is diluting overall returns; every dollar here returns \
             ${:.2} against break-even at $1.00. The spend level rules out small-sample noise.",
            seg.roas
        );
        let act = match entity.entity_type {
            EntityType::Campaign => {
                "Exclude this segment from targeting, or pause the ad sets serving it and \
                 reallocate their budget to proven segments."
                    .to_string()
            }
            _ => format!(
                "Narrow this {}'s targeting to exclude the segment, or pause it if the \
                 segment is its main audience.",
                noun
            ),
        };

        let rule = RuleTemplate {
            name: format!("Pause watch: {}", entity.name),
            condition_logic: ConditionLogic::And,
            conditions: vec![RuleCondition {
                metric: RuleMetric::Roas,
                op: ComparisonOp::Lt,
                threshold: self.detection.under_max_roas,
                window_hours: 72,
            }],
            actions: vec![RuleAction {
                action: ActionType::Pause,
                params: json!({}),
            }],
        };

        // a weak demographic is fixable by narrowing the audience; other
        // dimensions need a broader review of placement, geo, or schedule
        let (suggestion_type, title) = if opp.dimension == SegmentDimension::Demographic {
            (
                SuggestionType::RefineAudience,
                format!("Refine audience: exclude {}", seg.segment),
            )
        } else {
            (
                SuggestionType::ReviewUnderperformer,
                format!("Review underperforming {}: {}", opp.dimension, seg.segment),
            )
        };

        self.build(
            entity,
            suggestion_type,
            priority,
            confidence,
            title,
            three_paragraphs(&found, &why, &act),
            Reasoning {
                risk_level: RiskLevel::High,
                methodology: format!(
                    "Worst segment per dimension checked against the {:.1} ROAS ceiling with \
                     a ${:.0} spend floor to ignore low-spend noise.",
                    self.detection.under_max_roas, self.detection.under_min_spend
                ),
                triggers: vec![
                    format!("segment roas {:.2} <= {:.2}", seg.roas, self.detection.under_max_roas),
                    format!(
                        "segment spend {:.0} >= {:.0}",
                        seg.spend, self.detection.under_min_spend
                    ),
                ],
                detail: ReasoningDetail::Underperformer {
                    dimension: opp.dimension,
                    segment: seg.segment.clone(),
                    segment_roas: seg.roas,
                    segment_spend: seg.spend,
                    entity_avg_roas: entity.metrics.roas(),
                },
            },
            Some(rule),
            None,
        )
    }

    // ─── Analyzer results ───────────────────────────────────────────────────

    pub fn from_profit(
        &self,
        entity: &Entity,
        metrics: &ProfitMetrics,
        data_points: u64,
    ) -> Vec<Suggestion> {
        let confidence = confidence_from_data_points(data_points);
        let mut out = Vec::new();

        for finding in &metrics.findings {
            let suggestion = match finding.kind {
                ProfitFindingKind::HighRevenueLowMargin => {
                    let priority = clamp_score(
                        60.0 + (metrics.revenue_roas - metrics.profit_roas) * 10.0,
                    )
                    .min(95);
                    let found = format!(
                        "Revenue ROAS is {:.1} but profit ROAS is only {:.1}: the margin \
                         structure is absorbing the returns.",
                        metrics.revenue_roas, metrics.profit_roas
                    );
                    let why = format!(
                        "At an average margin of {:.0}%, scaling spend amplifies revenue \
                         without adding profit. Roughly ${:.0}/month of apparent return \
                         never reaches the bottom line.",
                        metrics.average_margin_pct, finding.monthly_impact
                    );
                    let act = "Shift the product mix toward higher-margin items, renegotiate \
                               COGS, or raise prices before scaling this budget further.";
                    self.build(
                        entity,
                        SuggestionType::OptimizeProductMix,
                        priority,
                        confidence,
                        "Strong revenue, weak profit: optimize the product mix".to_string(),
                        three_paragraphs(&found, &why, act),
                        Reasoning {
                            risk_level: RiskLevel::Medium,
                            methodology: format!(
                                "Order conversions joined to product costs; flagged because \
                                 revenue ROAS {:.1} > {:.1} while profit ROAS {:.1} < {:.1}.",
                                metrics.revenue_roas,
                                self.detection.profit_high_revenue_roas,
                                metrics.profit_roas,
                                self.detection.profit_low_profit_roas
                            ),
                            triggers: vec![
                                format!(
                                    "revenue roas {:.2} > {:.2}",
                                    metrics.revenue_roas, self.detection.profit_high_revenue_roas
                                ),
                                format!(
                                    "profit roas {:.2} < {:.2}",
                                    metrics.profit_roas, self.detection.profit_low_profit_roas
                                ),
                            ],
                            detail: ReasoningDetail::ProfitGap {
                                revenue_roas: metrics.revenue_roas,
                                profit_roas: metrics.profit_roas,
                                average_margin_pct: metrics.average_margin_pct,
                                conversions_analyzed: metrics.conversions_analyzed,
                            },
                        },
                        None,
                        Some(EstimatedImpact {
                            revenue_delta: 0.0,
                            profit_delta: finding.monthly_impact,
                            timeframe: self.projection.impact_timeframe.clone(),
                            confidence_low_pct: confidence.saturating_sub(20) as f64,
                            confidence_high_pct: (confidence.saturating_add(10)).min(100) as f64,
                        }),
                    )
                }
                ProfitFindingKind::LowRevenueHighMargin => {
                    let priority =
                        clamp_score(50.0 + metrics.average_margin_pct / 2.0).min(90);
                    let found = format!(
                        "A small pocket of revenue (${:.0}) is running at {:.0}% margin and \
                         {:.1} profit ROAS.",
                        metrics.total_revenue, metrics.average_margin_pct, metrics.profit_roas
                    );
                    let why = "High-margin niches usually have headroom before returns decay; \
                               the constraint is exposure, not efficiency.";
                    let act = format!(
                        "Increase budget behind these products by +{:.0}% and watch margin \
                         hold as volume grows.",
                        self.projection.scale_budget_pct
                    );
                    self.build(
                        entity,
                        SuggestionType::ScaleProfitableNiche,
                        priority,
                        confidence,
                        "Profitable niche with room to scale".to_string(),
                        three_paragraphs(&found, why, &act),
                        Reasoning {
                            risk_level: RiskLevel::Medium,
                            methodology: format!(
                                "Flagged because revenue ${:.0} < ${:.0}, margin {:.0}% > \
                                 {:.0}%, and profit ROAS {:.1} > {:.1}.",
                                metrics.total_revenue,
                                self.detection.niche_max_revenue,
                                metrics.average_margin_pct,
                                self.detection.niche_min_margin_pct,
                                metrics.profit_roas,
                                self.detection.niche_min_profit_roas
                            ),
                            triggers: vec![
                                format!(
                                    "revenue {:.0} < {:.0}",
                                    metrics.total_revenue, self.detection.niche_max_revenue
                                ),
                                format!(
                                    "margin {:.0}% > {:.0}%",
                                    metrics.average_margin_pct,
                                    self.detection.niche_min_margin_pct
                                ),
                            ],
                            detail: ReasoningDetail::ProfitableNiche {
                                revenue: metrics.total_revenue,
                                average_margin_pct: metrics.average_margin_pct,
                                profit_roas: metrics.profit_roas,
                            },
                        },
                        None,
                        Some(EstimatedImpact {
                            revenue_delta: metrics.total_revenue
                                * self.projection.scale_budget_pct
                                / 100.0,
                            profit_delta: metrics.total_profit * self.projection.scale_budget_pct
                                / 100.0,
                            timeframe: self.projection.impact_timeframe.clone(),
                            confidence_low_pct: confidence.saturating_sub(20) as f64,
                            confidence_high_pct: (confidence.saturating_add(10)).min(100) as f64,
                        }),
                    )
                }
            };
            out.push(suggestion);
        }

        out
    }

    pub fn from_funnel(
        &self,
        entity: &Entity,
        funnel: &FunnelBreakdown,
        data_points: u64,
    ) -> Option<Suggestion> {
        if !funnel.meets_volume_floor {
            return None;
        }
        let stage = funnel.biggest_drop_off?;
        let stage_result = funnel.stages.iter().find(|s| s.stage == stage)?;
        let (suggestion_type, focus) = stage_recommendation(stage);

        let priority = clamp_score(40.0 + funnel.biggest_drop_off_pct / 2.0);
        let confidence = confidence_from_data_points(data_points.max(funnel.impressions / 100));

        let found = format!(
            "The funnel loses {:.1}% of visitors at the {} stage ({} entered, {} continued).",
            funnel.biggest_drop_off_pct, stage, stage_result.entered, stage_result.completed
        );
        let why = format!(
            "This is the single largest leak in the funnel; overall conversion is {:.2}% of \
             impressions, so fixing the worst stage moves the whole {}.",
            funnel.overall_conversion_pct,
            entity_noun(entity.entity_type)
        );
        let act = format!(
            "Focus on the {}: the spend and targeting are already delivering traffic to \
             this point.",
            focus
        );

        Some(self.build(
            entity,
            suggestion_type,
            priority,
            confidence,
            format!("Fix the {} drop-off", stage),
            three_paragraphs(&found, &why, &act),
            Reasoning {
                risk_level: RiskLevel::Low,
                methodology: format!(
                    "Six-stage funnel reconstructed over the range; the stage with the \
                     highest post-click drop-off is selected. Volume floor: {} impressions.",
                    self.detection.funnel_min_impressions
                ),
                triggers: vec![format!(
                    "{} drop-off {:.1}% is the funnel maximum",
                    stage, funnel.biggest_drop_off_pct
                )],
                detail: ReasoningDetail::FunnelDropOff {
                    stage,
                    drop_off_pct: funnel.biggest_drop_off_pct,
                    entered: stage_result.entered,
                    completed: stage_result.completed,
                    impressions: funnel.impressions,
                },
            },
            None,
            None,
        ))
    }

    pub fn from_structure(
        &self,
        entity: &Entity,
        assessment: &StructureAssessment,
        data_points: u64,
    ) -> Vec<Suggestion> {
        let mut out = Vec::new();
        let confidence = confidence_from_data_points(if data_points > 0 {
            data_points
        } else {
            assessment.conversions
        });
        let noun = entity_noun(entity.entity_type);

        if assessment.scaling_eligible {
            let min_roas = if entity.entity_type.is_campaign() {
                self.detection.structure_campaign_min_roas
            } else {
                self.detection.structure_subentity_min_roas
            };
            // Multiple of the type-specific ROAS floor, the baseline an
            // average entity of this type is expected to hold.
            let multiplier = assessment.roas / min_roas;
            let priority = clamp_score(70.0 + 10.0 * multiplier);

            let found = format!(
                "This {} is returning {:.1} ROAS on ${:.0} of spend, {:.1}x the {:.1} \
                 baseline for its type.",
                noun, assessment.roas, assessment.spend, multiplier, min_roas
            );
            let why = format!(
                "Both scaling gates pass: spend is past the exploration floor and returns \
                 are consistently above baseline across {} conversions.",
                assessment.conversions
            );
            let act = format!(
                "Increase the budget by +{:.0}%. Returns typically hold for moderate \
                 increases when ROAS is this far above baseline; the attached guard rail \
                 steps the budget back if ROAS regresses.",
                self.projection.scale_budget_pct
            );

            let impact = self.scale_impact(assessment.spend, assessment.roas, confidence);
            let rule = self.guardrail_rule(entity, assessment.roas);

            out.push(self.build(
                entity,
                SuggestionType::ScaleHighPerformer,
                priority,
                confidence,
                format!("Scale {}", entity.name),
                three_paragraphs(&found, &why, &act),
                Reasoning {
                    risk_level: RiskLevel::Medium,
                    methodology: format!(
                        "Type-specific scaling gates: spend floor ${:.0} and ROAS floor {:.1}.",
                        if entity.entity_type.is_campaign() {
                            self.detection.structure_campaign_min_spend
                        } else {
                            self.detection.structure_subentity_min_spend
                        },
                        min_roas
                    ),
                    triggers: vec![
                        format!("spend {:.0} over floor", assessment.spend),
                        format!("roas {:.2} >= {:.2}", assessment.roas, min_roas),
                    ],
                    detail: ReasoningDetail::Structure {
                        pooled_budget: assessment.recommended_strategy == BudgetStrategy::Pooled,
                        in_learning_phase: assessment.in_learning_phase,
                        conversions: assessment.conversions,
                        days_since_launch: assessment.days_since_launch,
                        roas: assessment.roas,
                    },
                },
                Some(rule),
                Some(impact),
            ));
        }

        if assessment.in_learning_phase && assessment.ramping_up {
            let found = format!(
                "This {} launched {} days ago and has {} conversions; the platform's \
                 delivery optimization is still calibrating.",
                noun, assessment.days_since_launch, assessment.conversions
            );
            let why = "Edits during the learning phase reset optimization and prolong the \
                       unstable period. Early metrics routinely look worse than the \
                       steady state.";
            let act = "Hold budgets and targeting steady until the learning phase completes, \
                       then re-evaluate against the usual floors.";

            out.push(self.build(
                entity,
                SuggestionType::LearningPhaseOptimization,
                45,
                confidence,
                format!("Let {} finish learning", entity.name),
                three_paragraphs(&found, why, act),
                Reasoning {
                    risk_level: RiskLevel::Low,
                    methodology: format!(
                        "Learning phase inferred from conversions < {} and launch within \
                         {} days.",
                        self.detection.learning_phase_conversions, self.detection.ramp_up_days
                    ),
                    triggers: vec![format!(
                        "{} conversions, {} days since launch",
                        assessment.conversions, assessment.days_since_launch
                    )],
                    detail: ReasoningDetail::Structure {
                        pooled_budget: assessment.recommended_strategy == BudgetStrategy::Pooled,
                        in_learning_phase: true,
                        conversions: assessment.conversions,
                        days_since_launch: assessment.days_since_launch,
                        roas: assessment.roas,
                    },
                },
                None,
                None,
            ));
        } else if entity.entity_type.is_campaign()
            && assessment.recommended_strategy == BudgetStrategy::Pooled
        {
            let found = format!(
                "This campaign has {} conversions, enough signal for pooled budget \
                 allocation to outperform fixed per-ad-set budgets.",
                assessment.conversions
            );
            let why = "Pooled budgets let the platform shift spend hour-by-hour toward \
                       whichever ad set is converting, which fixed budgets cannot do.";
            let act = "Consolidate the ad set budgets into a single campaign-level budget \
                       and let allocation float.";

            out.push(self.build(
                entity,
                SuggestionType::BudgetRestructure,
                55,
                confidence,
                "Switch to pooled campaign budgeting".to_string(),
                three_paragraphs(&found, why, act),
                Reasoning {
                    risk_level: RiskLevel::Medium,
                    methodology: format!(
                        "Pooled budgeting recommended once conversions exceed {}.",
                        self.detection.learning_phase_conversions
                    ),
                    triggers: vec![format!("{} conversions", assessment.conversions)],
                    detail: ReasoningDetail::Structure {
                        pooled_budget: true,
                        in_learning_phase: false,
                        conversions: assessment.conversions,
                        days_since_launch: assessment.days_since_launch,
                        roas: assessment.roas,
                    },
                },
                None,
                None,
            ));
        }

        out
    }

    /// Emitted when a run surfaces enough simultaneous issues that piecemeal
    /// fixes are unlikely to be the best use of the merchant's time.
    pub fn expert_help(&self, entity: &Entity, issue_count: usize) -> Suggestion {
        let found = format!(
            "This analysis raised {} separate findings on one {}.",
            issue_count,
            entity_noun(entity.entity_type)
        );
        let why = "When several independent signals fire at once, the root cause is usually \
                   structural rather than any single setting.";
        let act = "Consider a structured account review before applying the individual \
                   recommendations above.";

        self.build(
            entity,
            SuggestionType::GetExpertHelp,
            35,
            50,
            "Multiple issues found: consider an account review".to_string(),
            three_paragraphs(&found, why, act),
            Reasoning {
                risk_level: RiskLevel::Low,
                methodology: "Emitted when one run produces several high-priority findings."
                    .to_string(),
                triggers: vec![format!("{} findings in one run", issue_count)],
                detail: ReasoningDetail::Structure {
                    pooled_budget: false,
                    in_learning_phase: false,
                    conversions: entity.metrics.conversions,
                    days_since_launch: entity.days_since_launch(),
                    roas: entity.metrics.roas(),
                },
            },
            None,
            None,
        )
    }

    // ─── Internals ──────────────────────────────────────────────────────────

    fn scale_impact(&self, spend: f64, roas: f64, confidence: u8) -> EstimatedImpact {
        let extra_spend = spend * self.projection.scale_budget_pct / 100.0;
        let revenue_delta = extra_spend * roas;
        EstimatedImpact {
            revenue_delta,
            profit_delta: revenue_delta - extra_spend,
            timeframe: self.projection.impact_timeframe.clone(),
            confidence_low_pct: confidence.saturating_sub(20) as f64,
            confidence_high_pct: (confidence.saturating_add(10)).min(100) as f64,
        }
    }

    /// Guard-rail template: an early-warning condition at 10% ROAS
    /// regression, then the configured hard-stop regression.
    fn guardrail_rule(&self, entity: &Entity, current_roas: f64) -> RuleTemplate {
        RuleTemplate {
            name: format!("Guard rail: {}", entity.name),
            condition_logic: ConditionLogic::Or,
            conditions: vec![
                RuleCondition {
                    metric: RuleMetric::Roas,
                    op: ComparisonOp::Lt,
                    threshold: current_roas * 0.9,
                    window_hours: 24,
                },
                RuleCondition {
                    metric: RuleMetric::Roas,
                    op: ComparisonOp::Lt,
                    threshold: current_roas * (1.0 - self.projection.guardrail_roas_drop_pct / 100.0),
                    window_hours: 72,
                },
            ],
            actions: vec![RuleAction {
                action: ActionType::DecreaseBudget,
                params: json!({ "restore_previous_budget": true }),
            }],
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        entity: &Entity,
        suggestion_type: SuggestionType,
        priority_score: u8,
        confidence_score: u8,
        title: String,
        message: String,
        reasoning: Reasoning,
        recommended_rule: Option<RuleTemplate>,
        estimated_impact: Option<EstimatedImpact>,
    ) -> Suggestion {
        let now = Utc::now();
        Suggestion {
            id: Uuid::new_v4(),
            entity_id: entity.id,
            entity_name: entity.name.clone(),
            entity_type: entity.entity_type,
            platform: entity.platform,
            suggestion_type,
            priority_score,
            confidence_score,
            title,
            message,
            reasoning,
            recommended_rule,
            estimated_impact,
            status: SuggestionStatus::Pending,
            automation_rule_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

fn three_paragraphs(found: &str, why: &str, act: &str) -> String {
    format!("{}\n\n{}\n\n{}", found, why, act)
}

/// Best segment of each other dimension, quoted as supporting context.
fn cross_dimensional_context(
    breakdown: &SegmentBreakdown,
    exclude: SegmentDimension,
) -> Vec<String> {
    SegmentDimension::ALL
        .iter()
        .filter(|d| **d != exclude)
        .filter_map(|d| {
            breakdown
                .get(*d)
                .first()
                .map(|s| format!("best {}: {} at {:.1} ROAS", d, s.segment, s.roas))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use adlens_core::types::{AdPlatform, EntityMetrics, FunnelStage, SegmentPerformance};

    use adlens_analyzers::funnel::FunnelStageResult;
    use adlens_analyzers::profit::ProfitFinding;

    fn entity(spend: f64, revenue: f64, conversions: u64) -> Entity {
        Entity {
            id: Uuid::new_v4(),
            platform_entity_id: "c-1".into(),
            platform: AdPlatform::Meta,
            entity_type: EntityType::Campaign,
            name: "Evergreen".into(),
            launched_at: Utc::now() - Duration::days(30),
            metrics: EntityMetrics {
                spend,
                revenue,
                conversions,
                impressions: 50_000,
                clicks: 900,
            },
        }
    }

    fn generator() -> InsightGenerator {
        InsightGenerator::new(DetectionPolicy::default(), ProjectionPolicy::default())
    }

    fn top_segment(roas: f64, avg: f64) -> Opportunity {
        Opportunity {
            kind: OpportunityKind::TopPerformer,
            dimension: SegmentDimension::Demographic,
            segment: SegmentPerformance {
                dimension: SegmentDimension::Demographic,
                segment: "25-34 female".into(),
                impressions: 8000,
                clicks: 240,
                spend: 200.0,
                conversions: 12,
                revenue: roas * 200.0,
                profit: roas * 80.0,
                roas,
                cpa: 16.7,
                ctr: 3.0,
                contribution_pct: 45.0,
                improvement_pct: 120.0,
            },
            roas_multiplier: roas / avg,
        }
    }

    #[test]
    fn test_demographic_top_priority_in_band() {
        // multiplier 3.0 -> priority 100; the contract band is [80, 100]
        let e = entity(500.0, 1000.0, 20);
        let s = generator().from_opportunity(&e, &top_segment(6.0, 2.0), &SegmentBreakdown::default());
        assert_eq!(s.suggestion_type, SuggestionType::ScaleHighPerformer);
        assert!(s.priority_score >= 80 && s.priority_score <= 100);
        assert_eq!(s.status, SuggestionStatus::Pending);
    }

    fn weak_segment(dimension: SegmentDimension, label: &str) -> Opportunity {
        Opportunity {
            kind: OpportunityKind::Underperformer,
            dimension,
            segment: SegmentPerformance {
                dimension,
                segment: label.into(),
                impressions: 6000,
                clicks: 90,
                spend: 150.0,
                conversions: 2,
                revenue: 180.0,
                profit: 40.0,
                roas: 1.2,
                cpa: 75.0,
                ctr: 1.5,
                contribution_pct: 9.0,
                improvement_pct: -70.0,
            },
            roas_multiplier: 0.3,
        }
    }

    #[test]
    fn test_weak_demographic_becomes_refine_audience() {
        let e = entity(500.0, 2000.0, 60);
        let s = generator().from_opportunity(
            &e,
            &weak_segment(SegmentDimension::Demographic, "55+ male"),
            &SegmentBreakdown::default(),
        );
        assert_eq!(s.suggestion_type, SuggestionType::RefineAudience);
        assert!(s.title.starts_with("Refine audience"));
        assert_eq!(s.reasoning.risk_level, RiskLevel::High);
        assert!(s.recommended_rule.is_some());
    }

    #[test]
    fn test_weak_placement_stays_a_review() {
        let e = entity(500.0, 2000.0, 60);
        let s = generator().from_opportunity(
            &e,
            &weak_segment(SegmentDimension::Placement, "mobile/stories"),
            &SegmentBreakdown::default(),
        );
        assert_eq!(s.suggestion_type, SuggestionType::ReviewUnderperformer);
    }

    #[test]
    fn test_narrative_has_three_paragraphs() {
        let e = entity(500.0, 1000.0, 20);
        let s = generator().from_opportunity(&e, &top_segment(6.0, 2.0), &SegmentBreakdown::default());
        assert_eq!(s.message.split("\n\n").count(), 3);
    }

    #[test]
    fn test_guardrail_first_condition_is_ninety_pct_of_current() {
        let e = entity(500.0, 2000.0, 10);
        let assessment = StructureAssessment {
            recommended_strategy: BudgetStrategy::PerUnit,
            in_learning_phase: false,
            ramping_up: false,
            conversions: 10,
            days_since_launch: 30,
            spend: 500.0,
            roas: 4.0,
            scaling_eligible: true,
        };
        let out = generator().from_structure(&e, &assessment, 10);
        let scale = out
            .iter()
            .find(|s| s.suggestion_type == SuggestionType::ScaleHighPerformer)
            .unwrap();

        let rule = scale.recommended_rule.as_ref().unwrap();
        let first = &rule.conditions[0];
        assert_eq!(first.metric, RuleMetric::Roas);
        assert_eq!(first.op, ComparisonOp::Lt);
        assert!((first.threshold - 4.0 * 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_structure_scale_priority_and_timeframe() {
        // roas 4.0 against the 1.8 campaign baseline -> 70 + 22.2 -> 92
        let e = entity(500.0, 2000.0, 10);
        let assessment = StructureAssessment {
            recommended_strategy: BudgetStrategy::PerUnit,
            in_learning_phase: true,
            ramping_up: false,
            conversions: 10,
            days_since_launch: 30,
            spend: 500.0,
            roas: 4.0,
            scaling_eligible: true,
        };
        let out = generator().from_structure(&e, &assessment, 10);
        let scale = &out[0];
        assert_eq!(scale.priority_score, 92);
        assert_eq!(
            scale.estimated_impact.as_ref().unwrap().timeframe,
            "7-14 days"
        );
    }

    #[test]
    fn test_learning_phase_suggestion() {
        let e = entity(80.0, 150.0, 5);
        let assessment = StructureAssessment {
            recommended_strategy: BudgetStrategy::PerUnit,
            in_learning_phase: true,
            ramping_up: true,
            conversions: 5,
            days_since_launch: 3,
            spend: 80.0,
            roas: 1.9,
            scaling_eligible: false,
        };
        let out = generator().from_structure(&e, &assessment, 3);
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].suggestion_type,
            SuggestionType::LearningPhaseOptimization
        );
        assert_eq!(out[0].reasoning.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_profit_findings_map_to_distinct_types() {
        let e = entity(1000.0, 3000.0, 40);
        let metrics = ProfitMetrics {
            revenue_roas: 3.0,
            profit_roas: 0.4,
            average_margin_pct: 13.0,
            total_revenue: 3000.0,
            total_profit: 400.0,
            total_cogs: 2600.0,
            conversions_analyzed: 40,
            findings: vec![ProfitFinding {
                kind: ProfitFindingKind::HighRevenueLowMargin,
                monthly_impact: 2600.0,
            }],
        };
        let out = generator().from_profit(&e, &metrics, 40);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].suggestion_type, SuggestionType::OptimizeProductMix);
    }

    #[test]
    fn test_funnel_below_volume_floor_generates_nothing() {
        let e = entity(500.0, 1000.0, 20);
        let funnel = FunnelBreakdown {
            impressions: 1500,
            stages: Vec::new(),
            biggest_drop_off: Some(FunnelStage::AddToCart),
            biggest_drop_off_pct: 93.3,
            overall_conversion_pct: 0.02,
            meets_volume_floor: false,
        };
        assert!(generator().from_funnel(&e, &funnel, 30).is_none());
    }

    #[test]
    fn test_funnel_add_to_cart_maps_to_fix_funnel_stage() {
        let e = entity(500.0, 1000.0, 20);
        let funnel = FunnelBreakdown {
            impressions: 5000,
            stages: vec![FunnelStageResult {
                stage: FunnelStage::AddToCart,
                entered: 150,
                completed: 10,
                conversion_rate_pct: 6.67,
                drop_off_pct: 93.33,
            }],
            biggest_drop_off: Some(FunnelStage::AddToCart),
            biggest_drop_off_pct: 93.33,
            overall_conversion_pct: 0.02,
            meets_volume_floor: true,
        };
        let s = generator().from_funnel(&e, &funnel, 30).unwrap();
        assert_eq!(s.suggestion_type, SuggestionType::FixFunnelStage);
        assert!(s.message.contains("product page and offer"));
    }

    #[test]
    fn test_confidence_bands_monotonic() {
        let points = [0u64, 5, 25, 100, 500, 5000];
        let mut last = 0u8;
        for p in points {
            let c = confidence_from_data_points(p);
            assert!(c >= last);
            last = c;
        }
    }
}
