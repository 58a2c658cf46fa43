//! Rule compilation and the in-memory automation rule store.

pub mod compiler;
pub mod store;

pub use compiler::compile_rule;
pub use store::RuleStore;
