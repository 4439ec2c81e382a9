pub mod brain_dump;
pub mod breakdown;
pub mod client;
pub mod insights;

pub use brain_dump::{add_suggestions, TaskSuggestion};
pub use breakdown::{determine_priority, fallback_breakdown};
pub use client::{ChatMessage, CompletionClient, DEFAULT_ENDPOINT};
pub use insights::default_insights;

use crate::config::Settings;
use anyhow::Result;
use std::time::Duration;

/// Timeouts and retry limits for gateway calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOptions {
    pub breakdown_timeout: Duration,
    pub insights_timeout: Duration,
    pub brain_dump_timeout: Duration,
    pub max_retries: u32,
    /// First retry delay; doubles on each further retry
    pub retry_initial_interval: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            breakdown_timeout: Duration::from_secs(15),
            insights_timeout: Duration::from_secs(10),
            brain_dump_timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_initial_interval: Duration::from_secs(1),
        }
    }
}

/// Breakdown, insights and brain dumps over the completion endpoint.
/// Breakdown and insights fall back to local answers on any error.
pub struct AiGateway {
    client: CompletionClient,
    options: GatewayOptions,
}

impl AiGateway {
    pub fn new(client: CompletionClient, options: GatewayOptions) -> Self {
        Self { client, options }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = CompletionClient::new(settings.ai_endpoint.clone())?;
        let options = GatewayOptions {
            breakdown_timeout: settings.breakdown_timeout,
            insights_timeout: settings.insights_timeout,
            brain_dump_timeout: settings.brain_dump_timeout,
            max_retries: settings.max_retries,
            ..GatewayOptions::default()
        };
        tracing::debug!(endpoint = %settings.ai_endpoint, "AI gateway configured");
        Ok(Self::new(client, options))
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }
}
