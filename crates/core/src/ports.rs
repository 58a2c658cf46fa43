//! External collaborator ports. The orchestrator takes these as trait
//! objects so every data source and platform API can be faked in tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::rules::ActionOutcome;
use crate::types::{
    AdPlatform, ConversionRow, DailyMetricRow, DateRange, EntityStatus, EntityType,
    FunnelEventRow, SegmentDimension, SegmentRow,
};

/// Read-only access to the durable per-day performance tables. Populated by
/// the external ingestion pipeline; this engine never writes to it.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Raw per-day segment rows for one entity and dimension.
    async fn fetch_segments(
        &self,
        entity_id: Uuid,
        platform_entity_id: &str,
        dimension: SegmentDimension,
        range: &DateRange,
    ) -> EngineResult<Vec<SegmentRow>>;

    /// Daily entity-level metric snapshots, including funnel stage counts
    /// where available.
    async fn fetch_entity_metrics(
        &self,
        entity_id: Uuid,
        entity_type: EntityType,
        range: &DateRange,
    ) -> EngineResult<Vec<DailyMetricRow>>;

    /// Order conversions joined to ad attribution and product cost data.
    async fn fetch_enriched_conversions(
        &self,
        platform_entity_id: &str,
        range: &DateRange,
    ) -> EngineResult<Vec<ConversionRow>>;

    /// Raw funnel event counts; fallback when no daily snapshot exists.
    async fn fetch_funnel_events(
        &self,
        platform_entity_id: &str,
        range: &DateRange,
    ) -> EngineResult<Vec<FunnelEventRow>>;
}

/// Uniform surface over one ad platform's management API. One implementation
/// per platform; the dispatcher routes by `platform()`.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    fn platform(&self) -> AdPlatform;

    async fn update_budget(
        &self,
        entity_type: EntityType,
        platform_entity_id: &str,
        new_budget: f64,
    ) -> EngineResult<ActionOutcome>;

    async fn set_status(
        &self,
        entity_type: EntityType,
        platform_entity_id: &str,
        status: EntityStatus,
    ) -> EngineResult<ActionOutcome>;

    async fn duplicate(
        &self,
        entity_type: EntityType,
        platform_entity_id: &str,
        params: &serde_json::Value,
    ) -> EngineResult<ActionOutcome>;

    /// Not every platform exposes targeting mutation; default to an explicit
    /// not-supported outcome rather than a silent no-op.
    async fn adjust_targeting(
        &self,
        _entity_type: EntityType,
        _platform_entity_id: &str,
        _params: &serde_json::Value,
    ) -> EngineResult<ActionOutcome> {
        Ok(ActionOutcome::not_supported("adjust_targeting"))
    }
}
