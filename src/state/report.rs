//! Report document exchanged with the report API

use super::forms::FieldMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of a save-progress request: persisted field name to section data
pub type SavePayload = FieldMap;

/// A BRSR report as stored by the API.
///
/// Section data lives in `fields`, keyed by persisted names such as
/// `sc_p4_essential_indicators`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_year: Option<String>,
    #[serde(default)]
    pub is_submitted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub fields: FieldMap,
}

impl ReportData {
    /// Title line for the header, e.g. "Acme Ltd (FY 2024-25)"
    pub fn display_title(&self) -> String {
        let company = self.company_name.as_deref().unwrap_or("Untitled report");
        match &self.financial_year {
            Some(fy) => format!("{company} (FY {fy})"),
            None => company.to_string(),
        }
    }
}
