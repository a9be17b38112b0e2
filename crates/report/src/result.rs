use serde::{Deserialize, Serialize};

/// Where a rendered report was uploaded to in the Archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportLocation {
    pub archive_key: String,
}
