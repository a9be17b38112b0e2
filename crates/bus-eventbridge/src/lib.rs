mod bus;
mod config;
mod error;
mod rule;

pub use bus::EventBridgeBus;
pub use config::EventBridgeConfig;
pub use rule::EventBridgeRuleController;
