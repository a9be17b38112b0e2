pub mod error;
pub mod status;
pub mod verifier;
pub mod verify;

pub use error::VerifierError;
pub use status::{RunStatusView, StatusResult};
pub use verifier::Verifier;
pub use verify::VerifyResult;
