use crate::infrastructure::{PageFetcher, TaskManager};
use crate::scenario::config::env_or;
use crate::scenario::{CheckRecorder, CheckTally, ScenarioRunner, TallySnapshot};
use crate::socket::SocketConnector;
use crate::types::{LoadError, Result};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions {
    pub virtual_users: usize,
    /// Iterations per virtual user
    pub iterations: usize,
}

impl DriverOptions {
    /// Reads `LOAD_VUS` and `LOAD_ITERATIONS`, both defaulting to 1.
    pub fn from_env() -> Result<Self> {
        let options = Self {
            virtual_users: env_or("LOAD_VUS", 1)?,
            iterations: env_or("LOAD_ITERATIONS", 1)?,
        };
        if options.virtual_users == 0 {
            return Err(LoadError::Config("LOAD_VUS must be at least 1".to_string()));
        }
        Ok(options)
    }
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            virtual_users: 1,
            iterations: 1,
        }
    }
}

/// Runs many independent virtual users and tallies their checks.
///
/// Virtual users share nothing but the tally: each gets its own runner, and with it
/// its own HTTP client and sockets.
pub struct Driver {
    options: DriverOptions,
    tally: Arc<CheckTally>,
}

impl Driver {
    pub fn new(options: DriverOptions) -> Self {
        Self {
            options,
            tally: Arc::new(CheckTally::new()),
        }
    }

    /// Builds one runner per virtual user with `build`, runs them all to completion,
    /// and returns the aggregated results.
    pub async fn run<P, C, F>(&self, mut build: F) -> Result<TallySnapshot>
    where
        P: PageFetcher + 'static,
        C: SocketConnector + 'static,
        F: FnMut(usize, Arc<dyn CheckRecorder>) -> Result<ScenarioRunner<P, C>>,
    {
        let mut tasks = TaskManager::new();

        for vu in 0..self.options.virtual_users {
            let recorder: Arc<dyn CheckRecorder> = self.tally.clone();
            let runner = match build(vu, recorder) {
                Ok(runner) => runner,
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            };

            let tally = Arc::clone(&self.tally);
            let iterations = self.options.iterations;
            tasks.spawn(async move {
                for iteration in 0..iterations {
                    match runner.run_iteration().await {
                        Ok(reports) => {
                            tracing::debug!(
                                "VU {} iteration {} verified {} handshakes",
                                vu,
                                iteration,
                                reports.len()
                            );
                            tally.iteration_completed();
                        }
                        Err(e) => {
                            tracing::warn!("VU {} iteration {} aborted: {}", vu, iteration, e);
                            tally.iteration_aborted(e.to_string());
                        }
                    }
                }
            });
        }

        tracing::info!(
            "Started {} virtual users x {} iterations",
            tasks.len(),
            self.options.iterations
        );
        tasks.join_all().await;

        Ok(self.tally.snapshot())
    }
}
