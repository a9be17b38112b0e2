pub mod collector;
pub mod envelope;
pub mod error;
pub mod result;

pub use collector::Collector;
pub use envelope::BusEnvelope;
pub use error::CollectorError;
pub use result::{CollectResponse, IgnoreReason};
