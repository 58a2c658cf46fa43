//! Segment aggregation — folds raw per-day segment rows into ranked
//! per-segment summaries across four independent dimensions.

pub mod aggregator;
pub mod fold;

pub use aggregator::SegmentAggregator;
pub use fold::aggregate_dimension;
