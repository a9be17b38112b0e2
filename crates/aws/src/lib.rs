pub mod auth;
pub mod config;
pub mod error;

pub use auth::build_sdk_config;
pub use config::AwsBaseConfig;
pub use error::{classify_sdk_error, SdkErrorClass};
