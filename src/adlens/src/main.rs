//! adlens — ad performance intelligence engine.
//!
//! CLI entry point: loads a performance snapshot, runs the full analysis
//! pipeline, and prints the ranked suggestions as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use adlens_actions::platforms::{GoogleClient, MetaClient, TiktokClient};
use adlens_core::config::AppConfig;
use adlens_core::error::EngineResult;
use adlens_core::ports::{MetricsStore, PlatformClient};
use adlens_core::types::{
    ConversionRow, DailyMetricRow, DateRange, Entity, EntityType, FunnelEventRow,
    SegmentDimension, SegmentRow,
};
use adlens_engine::Engine;

#[derive(Parser, Debug)]
#[command(name = "adlens")]
#[command(about = "Ad performance intelligence engine")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "ADLENS__NODE_ID")]
    node_id: Option<String>,

    /// Path to a performance snapshot JSON file
    #[arg(long)]
    snapshot: PathBuf,

    /// Trailing analysis window in days (overrides config)
    #[arg(long)]
    range_days: Option<u32>,

    /// Pretty-print the suggestion output
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

/// One entity's exported performance data. Produced by the ingestion
/// pipeline; this binary only reads it.
#[derive(Debug, Deserialize)]
struct Snapshot {
    entity: Entity,
    #[serde(default)]
    segments: Vec<SegmentRow>,
    #[serde(default)]
    daily_metrics: Vec<DailyMetricRow>,
    #[serde(default)]
    conversions: Vec<ConversionRow>,
    #[serde(default)]
    funnel_events: Vec<FunnelEventRow>,
}

/// Metrics store over a loaded snapshot file.
struct SnapshotStore {
    snapshot: Snapshot,
}

#[async_trait]
impl MetricsStore for SnapshotStore {
    async fn fetch_segments(
        &self,
        _entity_id: Uuid,
        _platform_entity_id: &str,
        dimension: SegmentDimension,
        range: &DateRange,
    ) -> EngineResult<Vec<SegmentRow>> {
        Ok(self
            .snapshot
            .segments
            .iter()
            .filter(|r| r.key.dimension() == dimension && range.contains(r.date))
            .cloned()
            .collect())
    }

    async fn fetch_entity_metrics(
        &self,
        _entity_id: Uuid,
        _entity_type: EntityType,
        range: &DateRange,
    ) -> EngineResult<Vec<DailyMetricRow>> {
        Ok(self
            .snapshot
            .daily_metrics
            .iter()
            .filter(|r| range.contains(r.date))
            .cloned()
            .collect())
    }

    async fn fetch_enriched_conversions(
        &self,
        _platform_entity_id: &str,
        range: &DateRange,
    ) -> EngineResult<Vec<ConversionRow>> {
        Ok(self
            .snapshot
            .conversions
            .iter()
            .filter(|r| range.contains(r.date))
            .cloned()
            .collect())
    }

    async fn fetch_funnel_events(
        &self,
        _platform_entity_id: &str,
        range: &DateRange,
    ) -> EngineResult<Vec<FunnelEventRow>> {
        Ok(self
            .snapshot
            .funnel_events
            .iter()
            .filter(|r| range.contains(r.date))
            .cloned()
            .collect())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adlens=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("adlens starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(days) = cli.range_days {
        config.analysis.default_range_days = days;
    }

    info!(
        node_id = %config.node_id,
        range_days = config.analysis.default_range_days,
        snapshot = %cli.snapshot.display(),
        "Configuration loaded"
    );

    let raw = std::fs::read_to_string(&cli.snapshot)?;
    let snapshot: Snapshot = serde_json::from_str(&raw)?;
    let entity = snapshot.entity.clone();

    let store: Arc<dyn MetricsStore> = Arc::new(SnapshotStore { snapshot });
    let clients: Vec<Arc<dyn PlatformClient>> = vec![
        Arc::new(MetaClient),
        Arc::new(GoogleClient),
        Arc::new(TiktokClient),
    ];

    let engine = Engine::new(store, clients, config);

    let suggestions = engine.analyze_entity(&entity).await?;
    info!(
        entity_id = %entity.id,
        suggestions = suggestions.len(),
        "Analysis complete"
    );

    let output = if cli.pretty {
        serde_json::to_string_pretty(&suggestions)?
    } else {
        serde_json::to_string(&suggestions)?
    };
    println!("{}", output);

    Ok(())
}
