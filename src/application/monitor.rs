//! HTTP health probes for the storefront's own surfaces.
//!
//! A probe succeeds when the target answers at all, whatever the status code;
//! transport failures and timeouts are recorded with their error text.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use metrics::{counter, histogram};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use url::Url;

use crate::application::repos::{NewServiceCheck, ServiceChecksRepo};

const METRIC_PROBE_TOTAL: &str = "storefront_health_probe_total";
const METRIC_PROBE_MS: &str = "storefront_health_probe_ms";

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("failed to build probe client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub name: String,
    pub url: Url,
}

impl ProbeTarget {
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
        }
    }
}

pub struct HealthMonitor {
    client: reqwest::Client,
    repo: Arc<dyn ServiceChecksRepo>,
    targets: Vec<ProbeTarget>,
}

impl HealthMonitor {
    pub fn new(
        repo: Arc<dyn ServiceChecksRepo>,
        targets: Vec<ProbeTarget>,
        timeout: Duration,
    ) -> Result<Self, MonitorError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            repo,
            targets,
        })
    }

    pub fn targets(&self) -> &[ProbeTarget] {
        &self.targets
    }

    /// Probe one target and persist the outcome. Persistence failures are
    /// logged; the outcome is returned either way.
    pub async fn check(&self, target: &ProbeTarget) -> NewServiceCheck {
        let started = Instant::now();
        let response = self.client.get(target.url.clone()).send().await;
        let elapsed = started.elapsed();
        let response_time_ms = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);

        let check = match response {
            Ok(response) => NewServiceCheck {
                service_name: target.name.clone(),
                success: true,
                http_status_code: Some(i32::from(response.status().as_u16())),
                response_time_ms: Some(response_time_ms),
                checked_at: OffsetDateTime::now_utc(),
                error: None,
            },
            Err(err) => NewServiceCheck {
                service_name: target.name.clone(),
                success: false,
                http_status_code: err.status().map(|s| i32::from(s.as_u16())),
                response_time_ms: Some(response_time_ms),
                checked_at: OffsetDateTime::now_utc(),
                error: Some(err.to_string()),
            },
        };

        let outcome = if check.success { "success" } else { "failure" };
        counter!(METRIC_PROBE_TOTAL, "service" => target.name.clone(), "outcome" => outcome)
            .increment(1);
        histogram!(METRIC_PROBE_MS, "service" => target.name.clone())
            .record(elapsed.as_secs_f64() * 1000.0);

        if let Err(err) = self.repo.record_check(check.clone()).await {
            warn!(
                target: "storefront::monitor",
                service = %target.name,
                error = %err,
                "failed to record service check"
            );
        }
        check
    }

    /// Probe every configured target concurrently.
    pub async fn run_all(&self) -> Vec<NewServiceCheck> {
        let checks = join_all(self.targets.iter().map(|target| self.check(target))).await;
        let failed = checks.iter().filter(|c| !c.success).count();
        info!(
            target: "storefront::monitor",
            probed = checks.len(),
            failed,
            "health probe round finished"
        );
        checks
    }
}
