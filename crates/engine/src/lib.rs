//! The orchestrator: fans out analysis, assembles the ranked suggestion
//! set, and owns the suggestion lifecycle.

pub mod orchestrator;
pub mod store;

pub use orchestrator::Engine;
pub use store::SuggestionStore;
