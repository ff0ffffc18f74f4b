use std::time::Duration;

use anyhow::{ensure, Context};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ProgressCheckpoint {
    /// Delay measured from the start of the submission.
    pub after_ms: u64,
    pub progress: u8,
}

impl ProgressCheckpoint {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.after_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub initial_progress: u8,
    pub checkpoints: Vec<ProgressCheckpoint>,
    pub near_complete_progress: u8,
    pub settle_delay_ms: u64,
    pub caption_interval_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            initial_progress: 20,
            checkpoints: vec![
                ProgressCheckpoint {
                    after_ms: 800,
                    progress: 50,
                },
                ProgressCheckpoint {
                    after_ms: 2500,
                    progress: 75,
                },
            ],
            near_complete_progress: 90,
            settle_delay_ms: 500,
            caption_interval_ms: 1000,
        }
    }
}

impl TimingSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn caption_interval(&self) -> Duration {
        Duration::from_millis(self.caption_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub recipient_email: String,
    pub timing: TimingSettings,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".into(),
            recipient_email: "relief-desk@example.org".into(),
            timing: TimingSettings::default(),
        }
    }
}

impl ClientSettings {
    pub fn api_base(&self) -> anyhow::Result<Url> {
        let url = Url::parse(self.api_base_url.trim())
            .with_context(|| format!("invalid api base url '{}'", self.api_base_url))?;
        ensure!(
            matches!(url.scheme(), "http" | "https"),
            "api base url must be http or https, got '{}'",
            url.scheme()
        );
        Ok(url)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.api_base()?;
        ensure!(
            self.recipient_email.contains('@'),
            "recipient email '{}' is not an address",
            self.recipient_email
        );
        ensure!(
            self.timing.checkpoints.iter().all(|c| c.progress <= 100)
                && self.timing.initial_progress <= 100
                && self.timing.near_complete_progress <= 100,
            "progress values must be within 0..=100"
        );
        Ok(())
    }
}
