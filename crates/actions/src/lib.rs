//! Action dispatch: platform clients, the routing dispatcher, and the
//! append-only action ledger.

pub mod dispatcher;
pub mod ledger;
pub mod platforms;

pub use dispatcher::{ActionDispatcher, ActionRequest};
pub use ledger::ActionLog;
