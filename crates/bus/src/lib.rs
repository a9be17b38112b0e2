pub mod bus;
pub mod error;
pub mod memory;
pub mod rule;
pub mod types;

pub use bus::Bus;
pub use error::BusError;
pub use memory::{InMemoryBus, InMemoryRuleController};
pub use rule::RuleController;
pub use types::{BusEventEntry, RuleActionResult, RuleStatus};
