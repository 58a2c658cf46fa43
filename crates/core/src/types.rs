//! Shared domain types — entities, metrics rows, and segment summaries.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Platforms & entities ───────────────────────────────────────────────────

/// Ad platform an entity lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdPlatform {
    Meta,
    Google,
    Tiktok,
}

impl std::fmt::Display for AdPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AdPlatform::Meta => "meta",
            AdPlatform::Google => "google",
            AdPlatform::Tiktok => "tiktok",
        };
        f.write_str(name)
    }
}

/// Level of the advertising hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Campaign,
    AdSet,
    Ad,
}

impl EntityType {
    /// Campaigns carry different heuristic floors than their children.
    pub fn is_campaign(&self) -> bool {
        matches!(self, EntityType::Campaign)
    }
}

/// Desired delivery status for a platform entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Active,
    Paused,
}

/// Rolled-up performance snapshot for one entity. Refreshed by the external
/// ingestion pipeline; immutable for the duration of an analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityMetrics {
    pub spend: f64,
    pub revenue: f64,
    pub conversions: u64,
    pub impressions: u64,
    pub clicks: u64,
}

impl EntityMetrics {
    /// `revenue / spend`, 0.0 when spend is zero.
    pub fn roas(&self) -> f64 {
        safe_div(self.revenue, self.spend)
    }

    /// `spend / conversions`, 0.0 when there are no conversions.
    pub fn cpa(&self) -> f64 {
        safe_div(self.spend, self.conversions as f64)
    }

    /// `clicks / impressions * 100`, 0.0 when there are no impressions.
    pub fn ctr(&self) -> f64 {
        safe_div(self.clicks as f64, self.impressions as f64) * 100.0
    }
}

/// A campaign, ad set, or ad under analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    pub platform_entity_id: String,
    pub platform: AdPlatform,
    pub entity_type: EntityType,
    pub name: String,
    pub launched_at: DateTime<Utc>,
    pub metrics: EntityMetrics,
}

impl Entity {
    pub fn days_since_launch(&self) -> i64 {
        (Utc::now() - self.launched_at).num_days().max(0)
    }
}

// ─── Date ranges ────────────────────────────────────────────────────────────

/// Inclusive date range used to bound all metrics-store reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The trailing `days`-day window ending today (UTC).
    pub fn last_days(days: u32) -> Self {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(days.max(1) as i64 - 1);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

// ─── Segment rows & summaries ───────────────────────────────────────────────

/// Analysis dimension a segment row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentDimension {
    Demographic,
    Placement,
    Geographic,
    Temporal,
}

impl SegmentDimension {
    pub const ALL: [SegmentDimension; 4] = [
        SegmentDimension::Demographic,
        SegmentDimension::Placement,
        SegmentDimension::Geographic,
        SegmentDimension::Temporal,
    ];
}

impl std::fmt::Display for SegmentDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SegmentDimension::Demographic => "demographic",
            SegmentDimension::Placement => "placement",
            SegmentDimension::Geographic => "geographic",
            SegmentDimension::Temporal => "temporal",
        };
        f.write_str(name)
    }
}

/// Dimension-specific composite grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "dimension")]
pub enum SegmentKey {
    Demographic { age: String, gender: String },
    Placement { device: String, position: String },
    Geographic { country: String },
    Temporal { weekday: String, hour: u8 },
}

impl SegmentKey {
    pub fn dimension(&self) -> SegmentDimension {
        match self {
            SegmentKey::Demographic { .. } => SegmentDimension::Demographic,
            SegmentKey::Placement { .. } => SegmentDimension::Placement,
            SegmentKey::Geographic { .. } => SegmentDimension::Geographic,
            SegmentKey::Temporal { .. } => SegmentDimension::Temporal,
        }
    }

    /// Human-readable label, also the deterministic tie-break key when
    /// segments share a ROAS.
    pub fn label(&self) -> String {
        match self {
            SegmentKey::Demographic { age, gender } => format!("{} {}", age, gender),
            SegmentKey::Placement { device, position } => format!("{}/{}", device, position),
            SegmentKey::Geographic { country } => country.clone(),
            SegmentKey::Temporal { weekday, hour } => {
                // widen before adding: hour arrives as u8 and is not
                // guaranteed to be < 24 at the edge of the ingest path
                let start = u16::from(*hour) % 24;
                format!("{} {:02}:00-{:02}:00", weekday, start, (start + 1) % 24)
            }
        }
    }
}

/// One raw per-day, per-segment performance row from the metrics store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRow {
    pub date: NaiveDate,
    pub key: SegmentKey,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub conversions: u64,
    pub revenue: f64,
    pub profit: f64,
}

/// Aggregated, ranked summary for one segment bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentPerformance {
    pub dimension: SegmentDimension,
    pub segment: String,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub conversions: u64,
    pub revenue: f64,
    pub profit: f64,
    /// `revenue / spend`, 0.0 when spend is zero.
    pub roas: f64,
    /// `spend / conversions`, 0.0 when there are no conversions.
    pub cpa: f64,
    /// `clicks / impressions * 100`, 0.0 when there are no impressions.
    pub ctr: f64,
    /// Share of the dimension's total revenue, percent.
    pub contribution_pct: f64,
    /// ROAS lift versus the entity average, percent.
    pub improvement_pct: f64,
}

/// Fan-in result of the four concurrent dimension aggregations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentBreakdown {
    pub demographic: Vec<SegmentPerformance>,
    pub placement: Vec<SegmentPerformance>,
    pub geographic: Vec<SegmentPerformance>,
    pub temporal: Vec<SegmentPerformance>,
}

impl SegmentBreakdown {
    pub fn get(&self, dimension: SegmentDimension) -> &[SegmentPerformance] {
        match dimension {
            SegmentDimension::Demographic => &self.demographic,
            SegmentDimension::Placement => &self.placement,
            SegmentDimension::Geographic => &self.geographic,
            SegmentDimension::Temporal => &self.temporal,
        }
    }

    pub fn total_segments(&self) -> usize {
        self.demographic.len() + self.placement.len() + self.geographic.len() + self.temporal.len()
    }
}

// ─── Entity-level daily rows ────────────────────────────────────────────────

/// One daily metrics snapshot for an entity, including funnel stage counts
/// when the ingestion pipeline has them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyMetricRow {
    pub date: NaiveDate,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub conversions: u64,
    pub revenue: f64,
    pub page_views: u64,
    pub add_to_carts: u64,
    pub checkouts: u64,
    pub purchases: u64,
}

/// A raw funnel event count, used to reconstruct stage totals when no daily
/// snapshot exists for the range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelEventRow {
    pub date: NaiveDate,
    pub stage: FunnelStage,
    pub count: u64,
}

/// The six funnel stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    Impression,
    Click,
    PageView,
    AddToCart,
    Checkout,
    Purchase,
}

impl FunnelStage {
    pub const ALL: [FunnelStage; 6] = [
        FunnelStage::Impression,
        FunnelStage::Click,
        FunnelStage::PageView,
        FunnelStage::AddToCart,
        FunnelStage::Checkout,
        FunnelStage::Purchase,
    ];
}

impl std::fmt::Display for FunnelStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FunnelStage::Impression => "impression",
            FunnelStage::Click => "click",
            FunnelStage::PageView => "page_view",
            FunnelStage::AddToCart => "add_to_cart",
            FunnelStage::Checkout => "checkout",
            FunnelStage::Purchase => "purchase",
        };
        f.write_str(name)
    }
}

/// An order conversion joined to ad attribution and product cost data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRow {
    pub order_id: String,
    pub date: NaiveDate,
    pub product_title: String,
    pub quantity: u32,
    pub revenue: f64,
    pub cogs: f64,
}

impl ConversionRow {
    pub fn profit(&self) -> f64 {
        self.revenue - self.cogs
    }

    /// Margin as a percent of revenue, 0.0 for zero-revenue rows.
    pub fn margin_pct(&self) -> f64 {
        safe_div(self.profit(), self.revenue) * 100.0
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Division that returns 0.0 instead of NaN/Inf on a zero or non-finite
/// denominator.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Weekday name for a date, matching the temporal segment key format.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        chrono::Weekday::Mon => "Mon",
        chrono::Weekday::Tue => "Tue",
        chrono::Weekday::Wed => "Wed",
        chrono::Weekday::Thu => "Thu",
        chrono::Weekday::Fri => "Fri",
        chrono::Weekday::Sat => "Sat",
        chrono::Weekday::Sun => "Sun",
    }
}
