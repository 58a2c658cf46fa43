//! Analysis orchestrator. One `analyze_entity` call fans the segment
//! aggregation and the three domain analyzers out concurrently, folds the
//! results into suggestions, and persists the ranked set.
//!
//! Data-availability failures never fail the run: an analyzer that errors or
//! has nothing to say is skipped and the siblings' results still land.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use adlens_core::config::AppConfig;
use adlens_core::error::EngineResult;
use adlens_core::ports::{MetricsStore, PlatformClient};
use adlens_core::rules::{ActionOutcome, AutomationRule};
use adlens_core::suggestion::{Suggestion, SuggestionStatus};
use adlens_core::types::{DateRange, Entity};

use adlens_actions::{ActionDispatcher, ActionLog, ActionRequest};
use adlens_analyzers::funnel::FunnelAnalyzer;
use adlens_analyzers::profit::ProfitAnalyzer;
use adlens_analyzers::result::{AnalysisPayload, AnalysisResult};
use adlens_analyzers::structure::StructureAnalyzer;
use adlens_automation::{compile_rule, RuleStore};
use adlens_insights::{detect_all, rank_and_dedup, InsightGenerator};
use adlens_segments::aggregator::SegmentAggregator;

use crate::store::SuggestionStore;

/// Findings at or above this count in one run also emit a get-expert-help
/// suggestion.
const EXPERT_HELP_FINDINGS: usize = 4;

pub struct Engine {
    config: AppConfig,
    aggregator: SegmentAggregator,
    profit: ProfitAnalyzer,
    funnel: FunnelAnalyzer,
    structure: StructureAnalyzer,
    generator: InsightGenerator,
    suggestions: Arc<SuggestionStore>,
    rules: Arc<RuleStore>,
    ledger: Arc<ActionLog>,
    dispatcher: ActionDispatcher,
}

impl Engine {
    pub fn new(
        store: Arc<dyn MetricsStore>,
        clients: Vec<Arc<dyn PlatformClient>>,
        config: AppConfig,
    ) -> Self {
        let ledger = Arc::new(ActionLog::new());
        Self {
            aggregator: SegmentAggregator::new(Arc::clone(&store)),
            profit: ProfitAnalyzer::new(Arc::clone(&store), config.detection.clone()),
            funnel: FunnelAnalyzer::new(Arc::clone(&store), config.detection.clone()),
            structure: StructureAnalyzer::new(Arc::clone(&store), config.detection.clone()),
            generator: InsightGenerator::new(config.detection.clone(), config.projection.clone()),
            suggestions: Arc::new(SuggestionStore::new()),
            rules: Arc::new(RuleStore::new()),
            dispatcher: ActionDispatcher::new(clients, Arc::clone(&ledger), config.dispatch.clone()),
            ledger,
            config,
        }
    }

    /// Run the full analysis pipeline for one entity and persist the ranked
    /// suggestion set. Returns the suggestions in rank order.
    pub async fn analyze_entity(&self, entity: &Entity) -> EngineResult<Vec<Suggestion>> {
        let range = DateRange::last_days(self.config.analysis.default_range_days);
        metrics::counter!("engine.analyses").increment(1);

        let (breakdown, profit_res, funnel_res, structure_res) = tokio::join!(
            self.aggregator.aggregate_all(entity, &range),
            self.profit.analyze(entity, &range),
            self.funnel.analyze(entity, &range),
            self.structure.analyze(entity, &range),
        );

        let profit = skip_on_error(profit_res, "profit", entity.id);
        let funnel = skip_on_error(funnel_res, "funnel", entity.id);
        let structure = skip_on_error(structure_res, "structure", entity.id);

        let mut drafts = Vec::new();

        for opportunity in detect_all(&breakdown, entity.metrics.roas(), &self.config.detection) {
            drafts.push(
                self.generator
                    .from_opportunity(entity, &opportunity, &breakdown),
            );
        }

        if let Some(result) = profit {
            if let AnalysisPayload::Profit(metrics) = &result.payload {
                drafts.extend(self.generator.from_profit(
                    entity,
                    metrics,
                    result.data_points_analyzed,
                ));
            }
        }

        if let Some(result) = funnel {
            if let AnalysisPayload::Funnel(breakdown) = &result.payload {
                if let Some(suggestion) =
                    self.generator
                        .from_funnel(entity, breakdown, result.data_points_analyzed)
                {
                    drafts.push(suggestion);
                }
            }
        }

        if let Some(result) = structure {
            if let AnalysisPayload::Structure(assessment) = &result.payload {
                drafts.extend(self.generator.from_structure(
                    entity,
                    assessment,
                    result.data_points_analyzed,
                ));
            }
        }

        if drafts.len() >= EXPERT_HELP_FINDINGS {
            drafts.push(self.generator.expert_help(entity, drafts.len()));
        }

        let ranked = rank_and_dedup(drafts, &self.config.ranking);
        metrics::counter!("engine.suggestions_generated").increment(ranked.len() as u64);
        info!(
            entity_id = %entity.id,
            suggestions = ranked.len(),
            "Analysis complete"
        );

        self.suggestions.insert_all(ranked.clone());
        Ok(ranked)
    }

    /// Accept a suggestion: compile its rule template into a persistent
    /// automation rule and move the suggestion to monitoring.
    pub async fn accept_suggestion(&self, id: Uuid) -> EngineResult<AutomationRule> {
        let suggestion = self.suggestions.get(id)?;
        let rule = compile_rule(&suggestion, &self.config.automation)?;

        self.rules.insert(rule.clone())?;
        self.suggestions.set_rule(id, rule.id)?;
        self.suggestions
            .transition(id, SuggestionStatus::Monitoring)?;

        metrics::counter!("engine.suggestions_accepted").increment(1);
        Ok(rule)
    }

    /// Execute a platform action. When the request carries a suggestion id
    /// the suggestion's lifecycle applies: an already-applied suggestion is a
    /// no-op, not an error, and a successful dispatch moves it to applied.
    /// Requests without a suggestion id dispatch straight through.
    pub async fn execute_action(&self, request: &ActionRequest) -> EngineResult<ActionOutcome> {
        if let Some(id) = request.suggestion_id {
            let suggestion = self.suggestions.get(id)?;
            if suggestion.status == SuggestionStatus::Applied {
                return Ok(ActionOutcome::ok(format!(
                    "suggestion {} already applied",
                    id
                )));
            }
        }

        let outcome = self.dispatcher.dispatch(request).await?;
        if outcome.success {
            if let Some(id) = request.suggestion_id {
                self.suggestions.transition(id, SuggestionStatus::Applied)?;
            }
        }
        Ok(outcome)
    }

    pub fn dismiss_suggestion(&self, id: Uuid) -> EngineResult<Suggestion> {
        self.suggestions.transition(id, SuggestionStatus::Dismissed)
    }

    /// Expire pending suggestions past the configured TTL.
    pub fn expire_stale(&self) -> usize {
        self.suggestions
            .expire_stale(self.config.analysis.suggestion_ttl_days)
    }

    pub fn suggestions(&self) -> &Arc<SuggestionStore> {
        &self.suggestions
    }

    pub fn rules(&self) -> &Arc<RuleStore> {
        &self.rules
    }

    pub fn ledger(&self) -> &Arc<ActionLog> {
        &self.ledger
    }
}

fn skip_on_error(
    result: EngineResult<Option<AnalysisResult>>,
    analyzer: &str,
    entity_id: Uuid,
) -> Option<AnalysisResult> {
    match result {
        Ok(output) => output,
        Err(err) => {
            warn!(
                entity_id = %entity_id,
                analyzer,
                error = %err,
                "Analyzer failed, skipping its findings"
            );
            metrics::counter!("engine.analyzer_errors").increment(1);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, Utc};
    use serde_json::json;

    use adlens_core::error::EngineError;
    use adlens_core::rules::ActionType;
    use adlens_core::suggestion::SuggestionType;
    use adlens_core::types::{
        AdPlatform, ConversionRow, DailyMetricRow, EntityMetrics, EntityType, FunnelEventRow,
        SegmentDimension, SegmentKey, SegmentRow,
    };

    use adlens_actions::platforms::MetaClient;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    /// A store with one strong demographic segment, entity history good
    /// enough to scale, and conversions with healthy margins.
    struct ScenarioStore {
        fail_conversions: bool,
    }

    #[async_trait]
    impl MetricsStore for ScenarioStore {
        async fn fetch_segments(
            &self,
            _entity_id: Uuid,
            _platform_entity_id: &str,
            dimension: SegmentDimension,
            _range: &DateRange,
        ) -> EngineResult<Vec<SegmentRow>> {
            if dimension != SegmentDimension::Demographic {
                return Ok(Vec::new());
            }
            Ok(vec![
                SegmentRow {
                    date: day(20),
                    key: SegmentKey::Demographic {
                        age: "25-34".into(),
                        gender: "female".into(),
                    },
                    impressions: 9000,
                    clicks: 300,
                    spend: 200.0,
                    conversions: 14,
                    revenue: 1300.0,
                    profit: 500.0,
                },
                SegmentRow {
                    date: day(20),
                    key: SegmentKey::Demographic {
                        age: "55+".into(),
                        gender: "male".into(),
                    },
                    impressions: 6000,
                    clicks: 90,
                    spend: 150.0,
                    conversions: 2,
                    revenue: 180.0,
                    profit: 40.0,
                },
            ])
        }

        async fn fetch_entity_metrics(
            &self,
            _entity_id: Uuid,
            _entity_type: EntityType,
            _range: &DateRange,
        ) -> EngineResult<Vec<DailyMetricRow>> {
            Ok(vec![DailyMetricRow {
                date: day(20),
                impressions: 50_000,
                clicks: 1000,
                spend: 500.0,
                conversions: 60,
                revenue: 2000.0,
                page_views: 800,
                add_to_carts: 120,
                checkouts: 80,
                purchases: 60,
            }])
        }

        async fn fetch_enriched_conversions(
            &self,
            _platform_entity_id: &str,
            _range: &DateRange,
        ) -> EngineResult<Vec<ConversionRow>> {
            if self.fail_conversions {
                return Err(EngineError::Store("warehouse timeout".to_string()));
            }
            Ok(vec![ConversionRow {
                order_id: "o-1".into(),
                date: day(21),
                product_title: "Widget".into(),
                quantity: 2,
                revenue: 2000.0,
                cogs: 700.0,
            }])
        }

        async fn fetch_funnel_events(
            &self,
            _platform_entity_id: &str,
            _range: &DateRange,
        ) -> EngineResult<Vec<FunnelEventRow>> {
            Ok(Vec::new())
        }
    }

    fn entity() -> Entity {
        Entity {
            id: Uuid::new_v4(),
            platform_entity_id: "c-1".into(),
            platform: AdPlatform::Meta,
            entity_type: EntityType::Campaign,
            name: "Evergreen".into(),
            launched_at: Utc::now() - Duration::days(40),
            metrics: EntityMetrics {
                spend: 500.0,
                revenue: 2000.0,
                conversions: 60,
                impressions: 50_000,
                clicks: 1000,
            },
        }
    }

    fn engine(fail_conversions: bool) -> Engine {
        Engine::new(
            Arc::new(ScenarioStore { fail_conversions }),
            vec![Arc::new(MetaClient)],
            AppConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_analysis_produces_ranked_pending_suggestions() {
        let engine = engine(false);
        let e = entity();
        let out = engine.analyze_entity(&e).await.unwrap();

        assert!(!out.is_empty());
        assert!(out
            .windows(2)
            .all(|w| w[0].priority_score >= w[1].priority_score));
        assert!(out.iter().all(|s| s.status == SuggestionStatus::Pending));
        // both the demographic outlier and the structure path produce a
        // scale suggestion; dedup must leave exactly one
        assert_eq!(
            out.iter()
                .filter(|s| s.suggestion_type == SuggestionType::ScaleHighPerformer)
                .count(),
            1
        );
        assert!(out
            .iter()
            .any(|s| s.suggestion_type == SuggestionType::ScaleHighPerformer));
        assert_eq!(engine.suggestions().len(), out.len());
    }

    #[tokio::test]
    async fn test_analyzer_failure_does_not_sink_the_run() {
        let engine = engine(true);
        let out = engine.analyze_entity(&entity()).await.unwrap();
        // profit findings are gone but the rest still land
        assert!(!out.is_empty());
        assert!(out
            .iter()
            .all(|s| s.suggestion_type != SuggestionType::OptimizeProductMix));
    }

    #[tokio::test]
    async fn test_accept_compiles_rule_and_moves_to_monitoring() {
        let engine = engine(false);
        let out = engine.analyze_entity(&entity()).await.unwrap();
        let with_rule = out
            .iter()
            .find(|s| s.recommended_rule.is_some())
            .expect("a scale suggestion with a guard rail");

        let rule = engine.accept_suggestion(with_rule.id).await.unwrap();
        assert_eq!(rule.source_suggestion_id, Some(with_rule.id));

        let updated = engine.suggestions().get(with_rule.id).unwrap();
        assert_eq!(updated.status, SuggestionStatus::Monitoring);
        assert_eq!(updated.automation_rule_id, Some(rule.id));
        assert_eq!(engine.rules().get(rule.id).unwrap().id, rule.id);
    }

    #[tokio::test]
    async fn test_execute_is_idempotent_for_applied_suggestions() {
        let engine = engine(false);
        let e = entity();
        let out = engine.analyze_entity(&e).await.unwrap();
        let id = out[0].id;

        let request = ActionRequest {
            entity_id: e.id,
            platform_entity_id: e.platform_entity_id.clone(),
            platform: e.platform,
            entity_type: e.entity_type,
            action: ActionType::IncreaseBudget,
            params: json!({ "new_budget": 1250.0 }),
            suggestion_id: Some(id),
        };

        let first = engine.execute_action(&request).await.unwrap();
        assert!(first.success);
        assert_eq!(engine.ledger().len(), 1);

        // second submission: no new platform call, no new ledger entry
        let second = engine.execute_action(&request).await.unwrap();
        assert!(second.success);
        assert!(second.message.contains("already applied"));
        assert_eq!(engine.ledger().len(), 1);

        let applied = engine.suggestions().get(id).unwrap();
        assert_eq!(applied.status, SuggestionStatus::Applied);
    }

    #[tokio::test]
    async fn test_direct_action_without_suggestion_dispatches_and_logs() {
        let engine = engine(false);
        let e = entity();

        let request = ActionRequest {
            entity_id: e.id,
            platform_entity_id: e.platform_entity_id.clone(),
            platform: e.platform,
            entity_type: e.entity_type,
            action: ActionType::Pause,
            params: json!({}),
            suggestion_id: None,
        };

        let outcome = engine.execute_action(&request).await.unwrap();
        assert!(outcome.success);
        assert_eq!(engine.ledger().len(), 1);
        assert_eq!(engine.ledger().for_entity(e.id)[0].suggestion_id, None);
    }

    #[tokio::test]
    async fn test_dismiss_and_terminal_state() {
        let engine = engine(false);
        let out = engine.analyze_entity(&entity()).await.unwrap();
        let id = out[0].id;

        let dismissed = engine.dismiss_suggestion(id).unwrap();
        assert_eq!(dismissed.status, SuggestionStatus::Dismissed);
        assert!(engine.dismiss_suggestion(id).is_err());
    }
}
