use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{FormFields, ReliefLogistics, RiskReport};

pub const ANALYZE_RISK_PATH: &str = "/api/analyze-risk";
pub const SEND_ALERT_PATH: &str = "/api/send-alert";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRiskRequest {
    pub city: String,
    pub profession: String,
    pub concern: String,
}

impl AnalyzeRiskRequest {
    /// Trims and lower-cases every field; the backend receives no other
    /// normalization.
    pub fn normalized(fields: &FormFields) -> Self {
        Self {
            city: normalize(&fields.city),
            profession: normalize(&fields.profession),
            concern: normalize(&fields.concern),
        }
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendAlertRequest {
    pub dispatch_text: String,
    pub logistics: Value,
    pub recipient_email: String,
}

impl SendAlertRequest {
    pub fn for_report(report: &RiskReport, recipient_email: impl Into<String>) -> Self {
        Self {
            dispatch_text: report.official_dispatch.clone().unwrap_or_default(),
            logistics: logistics_value(report.relief_logistics.as_ref()),
            recipient_email: recipient_email.into(),
        }
    }
}

/// Absent logistics are sent as `{}` rather than `null`.
fn logistics_value(logistics: Option<&ReliefLogistics>) -> Value {
    logistics
        .and_then(|tally| serde_json::to_value(tally).ok())
        .filter(Value::is_object)
        .unwrap_or_else(|| Value::Object(Map::new()))
}
