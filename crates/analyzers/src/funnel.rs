//! Funnel analyzer — six-stage conversion funnel reconstruction and
//! drop-off detection.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use adlens_core::config::DetectionPolicy;
use adlens_core::error::EngineResult;
use adlens_core::ports::MetricsStore;
use adlens_core::suggestion::SuggestionType;
use adlens_core::types::{safe_div, DateRange, Entity, FunnelStage};

use crate::result::{AnalysisPayload, AnalysisResult};

/// One stage transition, named by the stage being entered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelStageResult {
    pub stage: FunnelStage,
    /// Count at the previous stage.
    pub entered: u64,
    /// Count that reached this stage.
    pub completed: u64,
    pub conversion_rate_pct: f64,
    pub drop_off_pct: f64,
}

/// Reconstructed funnel for one entity over one range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelBreakdown {
    pub impressions: u64,
    pub stages: Vec<FunnelStageResult>,
    pub biggest_drop_off: Option<FunnelStage>,
    pub biggest_drop_off_pct: f64,
    /// `purchases / impressions * 100`.
    pub overall_conversion_pct: f64,
    /// False below the impression floor; no suggestion is emitted then.
    pub meets_volume_floor: bool,
}

/// Maps a drop-off stage to the suggestion family and the surface to fix.
pub fn stage_recommendation(stage: FunnelStage) -> (SuggestionType, &'static str) {
    match stage {
        FunnelStage::Impression => (SuggestionType::RefreshCreative, "ad delivery"),
        FunnelStage::Click => (SuggestionType::RefreshCreative, "ad creative"),
        FunnelStage::PageView => (SuggestionType::FixFunnelStage, "landing page experience"),
        FunnelStage::AddToCart => (SuggestionType::FixFunnelStage, "product page and offer"),
        FunnelStage::Checkout => (SuggestionType::FixFunnelStage, "checkout flow"),
        FunnelStage::Purchase => (SuggestionType::FixFunnelStage, "payment step"),
    }
}

/// Reconstructs the funnel from daily snapshots, falling back to raw event
/// counts when no snapshot exists for the range.
#[derive(Clone)]
pub struct FunnelAnalyzer {
    store: Arc<dyn MetricsStore>,
    policy: DetectionPolicy,
}

impl FunnelAnalyzer {
    pub fn new(store: Arc<dyn MetricsStore>, policy: DetectionPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn analyze(
        &self,
        entity: &Entity,
        range: &DateRange,
    ) -> EngineResult<Option<AnalysisResult>> {
        let snapshot = self
            .store
            .fetch_entity_metrics(entity.id, entity.entity_type, range)
            .await?;

        let (counts, data_points) = if !snapshot.is_empty() {
            let mut counts = [0u64; 6];
            for row in &snapshot {
                counts[0] += row.impressions;
                counts[1] += row.clicks;
                counts[2] += row.page_views;
                counts[3] += row.add_to_carts;
                counts[4] += row.checkouts;
                counts[5] += row.purchases;
            }
            (counts, snapshot.len() as u64)
        } else {
            let events = self
                .store
                .fetch_funnel_events(&entity.platform_entity_id, range)
                .await?;
            if events.is_empty() {
                debug!(entity_id = %entity.id, "No funnel data in range");
                return Ok(None);
            }
            let mut counts = [0u64; 6];
            for event in &events {
                let idx = FunnelStage::ALL
                    .iter()
                    .position(|s| *s == event.stage)
                    .unwrap_or(0);
                counts[idx] += event.count;
            }
            (counts, events.len() as u64)
        };

        let breakdown = build_breakdown(&counts, self.policy.funnel_min_impressions);
        Ok(Some(AnalysisResult::new(
            AnalysisPayload::Funnel(breakdown),
            data_points,
        )))
    }
}

fn build_breakdown(counts: &[u64; 6], min_impressions: u64) -> FunnelBreakdown {
    let mut stages = Vec::with_capacity(5);
    for i in 1..FunnelStage::ALL.len() {
        let entered = counts[i - 1];
        let completed = counts[i];
        let conversion_rate_pct = safe_div(completed as f64, entered as f64) * 100.0;
        let drop_off_pct = if entered > 0 {
            100.0 - conversion_rate_pct
        } else {
            0.0
        };
        stages.push(FunnelStageResult {
            stage: FunnelStage::ALL[i],
            entered,
            completed,
            conversion_rate_pct,
            drop_off_pct,
        });
    }

    // The impression→click transition is ad-level CTR and dominates every
    // on-site transition; drop-off selection covers post-click stages only.
    let biggest = stages
        .iter()
        .filter(|s| s.stage != FunnelStage::Click && s.entered > 0)
        .max_by(|a, b| {
            a.drop_off_pct
                .partial_cmp(&b.drop_off_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    let (biggest_drop_off, biggest_drop_off_pct) = match biggest {
        Some(s) if s.drop_off_pct > 0.0 => (Some(s.stage), s.drop_off_pct),
        _ => (None, 0.0),
    };

    FunnelBreakdown {
        impressions: counts[0],
        overall_conversion_pct: safe_div(counts[5] as f64, counts[0] as f64) * 100.0,
        stages,
        biggest_drop_off,
        biggest_drop_off_pct,
        meets_volume_floor: counts[0] >= min_impressions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use adlens_core::types::{
        AdPlatform, ConversionRow, DailyMetricRow, EntityMetrics, EntityType, FunnelEventRow,
        SegmentDimension, SegmentRow,
    };

    struct FakeStore {
        snapshot: Vec<DailyMetricRow>,
        events: Vec<FunnelEventRow>,
    }

    #[async_trait]
    impl MetricsStore for FakeStore {
        async fn fetch_segments(
            &self,
            _entity_id: Uuid,
            _platform_entity_id: &str,
            _dimension: SegmentDimension,
            _range: &DateRange,
        ) -> EngineResult<Vec<SegmentRow>> {
            Ok(Vec::new())
        }

        async fn fetch_entity_metrics(
            &self,
            _entity_id: Uuid,
            _entity_type: EntityType,
            _range: &DateRange,
        ) -> EngineResult<Vec<DailyMetricRow>> {
            Ok(self.snapshot.clone())
        }

        async fn fetch_enriched_conversions(
            &self,
            _platform_entity_id: &str,
            _range: &DateRange,
        ) -> EngineResult<Vec<ConversionRow>> {
            Ok(Vec::new())
        }

        async fn fetch_funnel_events(
            &self,
            _platform_entity_id: &str,
            _range: &DateRange,
        ) -> EngineResult<Vec<FunnelEventRow>> {
            Ok(self.events.clone())
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()
    }

    fn snapshot_row(
        impressions: u64,
        clicks: u64,
        page_views: u64,
        add_to_carts: u64,
        checkouts: u64,
        purchases: u64,
    ) -> DailyMetricRow {
        DailyMetricRow {
            date: day(),
            impressions,
            clicks,
            spend: 100.0,
            conversions: purchases,
            revenue: 400.0,
            page_views,
            add_to_carts,
            checkouts,
            purchases,
        }
    }

    fn entity() -> Entity {
        Entity {
            id: Uuid::new_v4(),
            platform_entity_id: "c-42".into(),
            platform: AdPlatform::Meta,
            entity_type: EntityType::Campaign,
            name: "Retargeting".into(),
            launched_at: Utc::now(),
            metrics: EntityMetrics::default(),
        }
    }

    fn analyzer(store: FakeStore) -> FunnelAnalyzer {
        FunnelAnalyzer::new(Arc::new(store), DetectionPolicy::default())
    }

    #[tokio::test]
    async fn test_biggest_drop_off_is_add_to_cart() {
        let a = analyzer(FakeStore {
            snapshot: vec![snapshot_row(5000, 200, 150, 10, 8, 1)],
            events: vec![],
        });
        let out = a
            .analyze(&entity(), &DateRange::last_days(30))
            .await
            .unwrap()
            .unwrap();

        let AnalysisPayload::Funnel(f) = &out.payload else {
            panic!("expected funnel payload");
        };
        assert_eq!(f.biggest_drop_off, Some(FunnelStage::AddToCart));
        // (150 - 10) / 150 = 93.33%
        assert!((f.biggest_drop_off_pct - 93.333333).abs() < 1e-3);
        assert!(f.meets_volume_floor);
    }

    #[tokio::test]
    async fn test_stage_mapping_table() {
        let (t, focus) = stage_recommendation(FunnelStage::Click);
        assert_eq!(t, SuggestionType::RefreshCreative);
        assert_eq!(focus, "ad creative");

        let (t, focus) = stage_recommendation(FunnelStage::AddToCart);
        assert_eq!(t, SuggestionType::FixFunnelStage);
        assert_eq!(focus, "product page and offer");

        let (t, _) = stage_recommendation(FunnelStage::Checkout);
        assert_eq!(t, SuggestionType::FixFunnelStage);
    }

    #[tokio::test]
    async fn test_below_impression_floor_fails_volume_gate() {
        let a = analyzer(FakeStore {
            snapshot: vec![snapshot_row(1500, 80, 60, 5, 4, 1)],
            events: vec![],
        });
        let out = a
            .analyze(&entity(), &DateRange::last_days(30))
            .await
            .unwrap()
            .unwrap();

        let AnalysisPayload::Funnel(f) = &out.payload else {
            panic!("expected funnel payload");
        };
        assert!(!f.meets_volume_floor);
    }

    #[tokio::test]
    async fn test_fallback_to_raw_events() {
        let events = vec![
            FunnelEventRow {
                date: day(),
                stage: FunnelStage::Impression,
                count: 4000,
            },
            FunnelEventRow {
                date: day(),
                stage: FunnelStage::Click,
                count: 300,
            },
            FunnelEventRow {
                date: day(),
                stage: FunnelStage::PageView,
                count: 250,
            },
            FunnelEventRow {
                date: day(),
                stage: FunnelStage::AddToCart,
                count: 100,
            },
            FunnelEventRow {
                date: day(),
                stage: FunnelStage::Checkout,
                count: 10,
            },
            FunnelEventRow {
                date: day(),
                stage: FunnelStage::Purchase,
                count: 8,
            },
        ];
        let a = analyzer(FakeStore {
            snapshot: vec![],
            events,
        });
        let out = a
            .analyze(&entity(), &DateRange::last_days(30))
            .await
            .unwrap()
            .unwrap();

        let AnalysisPayload::Funnel(f) = &out.payload else {
            panic!("expected funnel payload");
        };
        // add_to_cart -> checkout loses 90%
        assert_eq!(f.biggest_drop_off, Some(FunnelStage::Checkout));
        assert!((f.biggest_drop_off_pct - 90.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_no_data_yields_none() {
        let a = analyzer(FakeStore {
            snapshot: vec![],
            events: vec![],
        });
        let out = a.analyze(&entity(), &DateRange::last_days(30)).await.unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_empty_stages_never_divide_by_zero() {
        let a = analyzer(FakeStore {
            snapshot: vec![snapshot_row(3000, 0, 0, 0, 0, 0)],
            events: vec![],
        });
        let out = a
            .analyze(&entity(), &DateRange::last_days(30))
            .await
            .unwrap()
            .unwrap();

        let AnalysisPayload::Funnel(f) = &out.payload else {
            panic!("expected funnel payload");
        };
        for stage in &f.stages {
            assert!(stage.conversion_rate_pct.is_finite());
            assert!(stage.drop_off_pct.is_finite());
        }
        assert_eq!(f.overall_conversion_pct, 0.0);
    }
}
