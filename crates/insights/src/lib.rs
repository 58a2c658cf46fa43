//! Opportunity detection, insight generation, and suggestion ranking.

pub mod detector;
pub mod generator;
pub mod ranker;

pub use detector::{detect_all, Opportunity, OpportunityKind};
pub use generator::InsightGenerator;
pub use ranker::rank_and_dedup;
