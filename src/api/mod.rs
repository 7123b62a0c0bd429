//! Report API access

mod client;
mod traits;

pub use client::{ApiError, ReportClient};
#[cfg(test)]
pub use traits::MockReportApi;
pub use traits::ReportApi;
