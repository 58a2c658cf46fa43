//! Fan-out/fan-in aggregation over the metrics store — the four dimension
//! queries are independent network reads and run concurrently.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use adlens_core::ports::MetricsStore;
use adlens_core::types::{
    DateRange, Entity, SegmentBreakdown, SegmentDimension, SegmentPerformance, SegmentRow,
};

use crate::fold::aggregate_dimension;

/// Fetches and folds raw segment rows for one entity across all dimensions.
#[derive(Clone)]
pub struct SegmentAggregator {
    store: Arc<dyn MetricsStore>,
}

impl SegmentAggregator {
    pub fn new(store: Arc<dyn MetricsStore>) -> Self {
        Self { store }
    }

    /// Issue the four dimension fetches concurrently and join the results.
    /// A failed dimension is logged and comes back empty; it never aborts
    /// the siblings.
    pub async fn aggregate_all(&self, entity: &Entity, range: &DateRange) -> SegmentBreakdown {
        let avg_roas = entity.metrics.roas();

        let (demographic, placement, geographic, temporal) = tokio::join!(
            self.fetch_dimension(entity, SegmentDimension::Demographic, range, avg_roas),
            self.fetch_dimension(entity, SegmentDimension::Placement, range, avg_roas),
            self.fetch_dimension(entity, SegmentDimension::Geographic, range, avg_roas),
            self.fetch_dimension(entity, SegmentDimension::Temporal, range, avg_roas),
        );

        let breakdown = SegmentBreakdown {
            demographic,
            placement,
            geographic,
            temporal,
        };

        debug!(
            entity_id = %entity.id,
            segments = breakdown.total_segments(),
            "Segment aggregation complete"
        );

        breakdown
    }

    async fn fetch_dimension(
        &self,
        entity: &Entity,
        dimension: SegmentDimension,
        range: &DateRange,
        avg_roas: f64,
    ) -> Vec<SegmentPerformance> {
        let rows: Vec<SegmentRow> = match self
            .store
            .fetch_segments(entity.id, &entity.platform_entity_id, dimension, range)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(
                    entity_id = %entity.id,
                    dimension = %dimension,
                    error = %e,
                    "Segment fetch failed, dimension skipped"
                );
                return Vec::new();
            }
        };

        aggregate_dimension(&rows, dimension, avg_roas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};

    use adlens_core::error::{EngineError, EngineResult};
    use adlens_core::types::{
        AdPlatform, ConversionRow, DailyMetricRow, EntityMetrics, EntityType, FunnelEventRow,
        SegmentKey,
    };

    struct FakeStore {
        fail_dimension: Option<SegmentDimension>,
    }

    #[async_trait]
    impl MetricsStore for FakeStore {
        async fn fetch_segments(
            &self,
            _entity_id: Uuid,
            _platform_entity_id: &str,
            dimension: SegmentDimension,
            _range: &DateRange,
        ) -> EngineResult<Vec<SegmentRow>> {
            if self.fail_dimension == Some(dimension) {
                return Err(EngineError::Store("connection reset".into()));
            }
            let key = match dimension {
                SegmentDimension::Demographic => SegmentKey::Demographic {
                    age: "25-34".into(),
                    gender: "female".into(),
                },
                SegmentDimension::Placement => SegmentKey::Placement {
                    device: "mobile".into(),
                    position: "feed".into(),
                },
                SegmentDimension::Geographic => SegmentKey::Geographic {
                    country: "Germany".into(),
                },
                SegmentDimension::Temporal => SegmentKey::Temporal {
                    weekday: "Tue".into(),
                    hour: 14,
                },
            };
            Ok(vec![SegmentRow {
                date: NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
                key,
                impressions: 1000,
                clicks: 40,
                spend: 100.0,
                conversions: 4,
                revenue: 400.0,
                profit: 160.0,
            }])
        }

        async fn fetch_entity_metrics(
            &self,
            _entity_id: Uuid,
            _entity_type: EntityType,
            _range: &DateRange,
        ) -> EngineResult<Vec<DailyMetricRow>> {
            Ok(Vec::new())
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
            Ok(Vec::new())
        }
    }

    fn entity() -> Entity {
        Entity {
            id: Uuid::new_v4(),
            platform_entity_id: "c-100".into(),
            platform: AdPlatform::Meta,
            entity_type: EntityType::Campaign,
            name: "Summer Sale".into(),
            launched_at: Utc::now(),
            metrics: EntityMetrics {
                spend: 500.0,
                revenue: 1000.0,
                conversions: 10,
                impressions: 20_000,
                clicks: 400,
            },
        }
    }

    #[tokio::test]
    async fn test_aggregates_all_four_dimensions() {
        let agg = SegmentAggregator::new(Arc::new(FakeStore {
            fail_dimension: None,
        }));
        let breakdown = agg
            .aggregate_all(&entity(), &DateRange::last_days(30))
            .await;
        assert_eq!(breakdown.demographic.len(), 1);
        assert_eq!(breakdown.placement.len(), 1);
        assert_eq!(breakdown.geographic.len(), 1);
        assert_eq!(breakdown.temporal.len(), 1);
        assert_eq!(breakdown.placement[0].segment, "mobile/feed");
    }

    #[tokio::test]
    async fn test_failed_dimension_is_empty_not_fatal() {
        let agg = SegmentAggregator::new(Arc::new(FakeStore {
            fail_dimension: Some(SegmentDimension::Geographic),
        }));
        let breakdown = agg
            .aggregate_all(&entity(), &DateRange::last_days(30))
            .await;
        assert!(breakdown.geographic.is_empty());
        assert_eq!(breakdown.demographic.len(), 1);
        assert_eq!(breakdown.temporal.len(), 1);
    }
}
