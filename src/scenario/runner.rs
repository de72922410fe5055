use super::checks::CheckRecorder;
use super::config::{PageStep, ScenarioConfig};
use crate::handshake::{HandshakeMachine, HandshakeReport, run_handshake};
use crate::infrastructure::{Pacer, PageFetcher};
use crate::page;
use crate::socket::{ConnectRequest, SocketConnector};
use crate::types::{LoadError, Result};
use std::sync::Arc;

/// One virtual user's journey.
///
/// Every page load gets a fresh socket and its own handshake. Checks go to the
/// recorder as they are made; any failure aborts the iteration with an error.
pub struct ScenarioRunner<P, C> {
    config: Arc<ScenarioConfig>,
    fetcher: P,
    connector: C,
    recorder: Arc<dyn CheckRecorder>,
    pacer: Pacer,
}

impl<P: PageFetcher, C: SocketConnector> ScenarioRunner<P, C> {
    pub fn new(
        config: Arc<ScenarioConfig>,
        fetcher: P,
        connector: C,
        recorder: Arc<dyn CheckRecorder>,
    ) -> Self {
        let pacer = Pacer::new(config.pace);
        Self {
            config,
            fetcher,
            connector,
            recorder,
            pacer,
        }
    }

    /// Visits every configured page in order, pausing after each.
    pub async fn run_iteration(&self) -> Result<Vec<HandshakeReport>> {
        let mut reports = Vec::with_capacity(self.config.pages.len());
        for step in &self.config.pages {
            reports.push(self.visit(step).await?);
            self.pacer.pause().await;
        }
        Ok(reports)
    }

    /// Loads one page and upgrades it to a joined live socket.
    pub async fn visit(&self, step: &PageStep) -> Result<HandshakeReport> {
        let url = self.config.page_url(step)?;
        let response = self.fetcher.get(&url).await?;

        if self.config.debug {
            tracing::info!("GET {} -> {}\n{}", url, response.status, response.body);
        }

        let status_ok = response.status == step.expected_status;
        let marker_ok = response.body.contains(&step.marker);
        self.record(&step.status_check, status_ok);
        self.record(&step.marker_check, marker_ok);

        if !status_ok {
            return Err(LoadError::PageCheck {
                url: url.to_string(),
                reason: format!(
                    "expected status {}, got {}",
                    step.expected_status, response.status
                ),
            });
        }
        if !marker_ok {
            return Err(LoadError::PageCheck {
                url: url.to_string(),
                reason: format!("body does not contain '{}'", step.marker),
            });
        }

        let extracted = page::extract(&response.body);
        for (name, passed) in extracted.checks() {
            self.record(name, passed);
        }
        let credentials = extracted.into_credentials()?;

        let request = ConnectRequest::for_page(
            &response.url,
            &credentials.csrf_token,
            self.config.cookie_header(),
        )?;
        let machine =
            HandshakeMachine::new(credentials, response.url.as_str()).with_debug(self.config.debug);

        let report = run_handshake(
            &self.connector,
            &request,
            machine,
            self.config.handshake_timeout,
        )
        .await;

        for check in &report.checks {
            self.record(&check.name, check.passed);
        }
        tracing::debug!("{} handshake on {}: {}", url, report.topic, report.outcome);

        report.into_result()
    }

    fn record(&self, name: &str, passed: bool) {
        if !passed {
            tracing::debug!("Check failed: {}", name);
        }
        self.recorder.record(name, passed);
    }
}
