//! Domain analyzers — three independent, side-effect-free engines that read
//! the metrics store and the enriched conversion feed concurrently.

pub mod funnel;
pub mod profit;
pub mod result;
pub mod structure;

pub use funnel::FunnelAnalyzer;
pub use profit::ProfitAnalyzer;
pub use result::{AnalysisPayload, AnalysisResult};
pub use structure::StructureAnalyzer;
