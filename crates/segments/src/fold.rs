//! Pure aggregation fold — no I/O, fully deterministic.

use std::collections::HashMap;

use adlens_core::types::{safe_div, SegmentDimension, SegmentKey, SegmentPerformance, SegmentRow};

/// Accumulator for one segment bucket.
#[derive(Default)]
struct Bucket {
    impressions: u64,
    clicks: u64,
    spend: f64,
    conversions: u64,
    revenue: f64,
    profit: f64,
}

/// Group raw rows by their composite key, sum counters, derive ratios, and
/// rank descending by ROAS.
///
/// Zero-revenue buckets are dropped rather than kept at zero, so the
/// `contribution_pct` values of the survivors sum to at most 100. Ordering is
/// deterministic: ties on ROAS break by the ascending segment label.
pub fn aggregate_dimension(
    rows: &[SegmentRow],
    dimension: SegmentDimension,
    entity_avg_roas: f64,
) -> Vec<SegmentPerformance> {
    let mut buckets: HashMap<SegmentKey, Bucket> = HashMap::new();

    for row in rows {
        if row.key.dimension() != dimension {
            continue;
        }
        let bucket = buckets.entry(row.key.clone()).or_default();
        bucket.impressions += row.impressions;
        bucket.clicks += row.clicks;
        bucket.spend += row.spend;
        bucket.conversions += row.conversions;
        bucket.revenue += row.revenue;
        bucket.profit += row.profit;
    }

    let total_revenue: f64 = buckets.values().map(|b| b.revenue).sum();

    let mut segments: Vec<SegmentPerformance> = buckets
        .into_iter()
        .filter(|(_, b)| b.revenue > 0.0)
        .map(|(key, b)| {
            let roas = safe_div(b.revenue, b.spend);
            SegmentPerformance {
                dimension,
                segment: key.label(),
                impressions: b.impressions,
                clicks: b.clicks,
                spend: b.spend,
                conversions: b.conversions,
                revenue: b.revenue,
                profit: b.profit,
                roas,
                cpa: safe_div(b.spend, b.conversions as f64),
                ctr: safe_div(b.clicks as f64, b.impressions as f64) * 100.0,
                contribution_pct: safe_div(b.revenue, total_revenue) * 100.0,
                improvement_pct: safe_div(roas - entity_avg_roas, entity_avg_roas) * 100.0,
            }
        })
        .collect();

    segments.sort_by(|a, b| {
        b.roas
            .partial_cmp(&a.roas)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.segment.cmp(&b.segment))
    });

    segments
}
