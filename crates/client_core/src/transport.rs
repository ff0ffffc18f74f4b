use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{FormFields, RiskReport},
    protocol::{AnalyzeRiskRequest, SendAlertRequest, ANALYZE_RISK_PATH, SEND_ALERT_PATH},
};
use tracing::{debug, info};
use url::Url;

use crate::error::{AnalysisError, DispatchError};

#[async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn analyze(&self, request: &AnalyzeRiskRequest) -> Result<RiskReport, AnalysisError>;
}

#[async_trait]
pub trait AlertApi: Send + Sync {
    async fn send_alert(&self, request: &SendAlertRequest) -> Result<(), DispatchError>;
}

/// HTTP client for both backend endpoints. One POST per call, no retries,
/// transport default timeouts.
#[derive(Debug, Clone)]
pub struct HttpRiskService {
    http: Client,
    base_url: Url,
}

impl HttpRiskService {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn analyze_fields(
        &self,
        city: &str,
        profession: &str,
        concern: &str,
    ) -> Result<RiskReport, AnalysisError> {
        let request = AnalyzeRiskRequest::normalized(&FormFields::new(city, profession, concern));
        self.analyze(&request).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl AnalysisApi for HttpRiskService {
    async fn analyze(&self, request: &AnalyzeRiskRequest) -> Result<RiskReport, AnalysisError> {
        let url = self.endpoint(ANALYZE_RISK_PATH);
        debug!(%url, city = %request.city, "posting risk analysis request");
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| AnalysisError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Status(status));
        }

        let body = response
            .text()
            .await
            .map_err(|err| AnalysisError::Network(err.to_string()))?;
        let report: RiskReport =
            serde_json::from_str(&body).map_err(|err| AnalysisError::Protocol(err.to_string()))?;
        info!(
            city = %request.city,
            severity = %report.overall_severity,
            "analysis response received"
        );
        Ok(report)
    }
}

#[async_trait]
impl AlertApi for HttpRiskService {
    async fn send_alert(&self, request: &SendAlertRequest) -> Result<(), DispatchError> {
        let url = self.endpoint(SEND_ALERT_PATH);
        debug!(%url, recipient = %request.recipient_email, "posting official dispatch");
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| DispatchError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DispatchError::Status(status))
        }
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
