//! Startup availability probe.
//!
//! A non-blocking, informational health check run once at startup. Results
//! are logged and returned; they never gate processing.

use crate::config::MenderConfig;
use crate::provider::build_http_client;
use std::time::Duration;
use tracing::{info, warn};

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Reachability of the provider backends at startup.
#[derive(Debug, Clone, Copy)]
pub struct ProbeReport {
    pub ollama: bool,
    pub context7: bool,
}

impl ProbeReport {
    pub fn all_reachable(&self) -> bool {
        self.ollama && self.context7
    }
}

/// Probe the Ollama and Context7 endpoints. Failures are logged, not raised.
pub async fn probe_providers(config: &MenderConfig) -> ProbeReport {
    let client = match build_http_client(PROBE_TIMEOUT) {
        Ok(client) => client,
        Err(err) => {
            warn!(error = %err, "availability probe skipped");
            return ProbeReport {
                ollama: false,
                context7: false,
            };
        }
    };

    let ollama_url = format!("{}/api/tags", config.ollama_base_url);
    let context7_url = format!("{}/health", config.context7_base_url);

    let (ollama, context7) = tokio::join!(
        async {
            client
                .get(&ollama_url)
                .send()
                .await
                .map(|r| r.status().is_success())
                .unwrap_or(false)
        },
        async {
            client
                .get(&context7_url)
                .send()
                .await
                .map(|r| r.status().is_success())
                .unwrap_or(false)
        },
    );

    let report = ProbeReport { ollama, context7 };
    if report.all_reachable() {
        info!("all provider backends reachable");
    } else {
        warn!(
            ollama = report.ollama,
            context7 = report.context7,
            "some provider backends unreachable; processing continues degraded"
        );
    }
    report
}
