//! Trait abstraction for the report API to enable mocking in tests

use crate::state::{ReportData, SavePayload};
use anyhow::Result;
use async_trait::async_trait;

/// Report API operations the wizard relies on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportApi: Send + Sync {
    /// Fetch the configured report; `None` if it does not exist yet
    async fn fetch_report(&self) -> Result<Option<ReportData>>;

    /// Persist in-progress section data
    async fn save_progress(&self, payload: SavePayload) -> Result<()>;

    /// Persist the final data of every section and mark the report submitted
    async fn submit_report(&self, payload: SavePayload) -> Result<()>;
}
