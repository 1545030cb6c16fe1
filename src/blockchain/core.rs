// core.rs splits the chain into block construction, chain management,
// validation and the transfer ledger.
pub mod block;
pub mod chain;
pub mod ledger;
pub mod validation;

pub use block::*;
pub use chain::*;
pub use ledger::*;
pub use validation::*;
