//! Report producer: renders a run's final HTML report and archives it.

pub mod error;
pub mod producer;
pub mod result;
pub mod template;

pub use error::ReportError;
pub use producer::ReportProducer;
pub use result::ReportLocation;
