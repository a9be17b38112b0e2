use evharness_core::RunStatus;
use serde::{Deserialize, Serialize};

/// Result of a `verify` pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResult {
    pub run_status: RunStatus,
    pub matched_count: usize,
    pub missing_count: usize,
    pub unexpected_count: usize,
    pub total_expected: usize,
}
