// Scenario module - one virtual user's journey through LiveView pages
pub mod checks;
pub mod config;
pub mod runner;

pub use checks::{Check, CheckCounts, CheckRecorder, CheckTally, RecordedChecks, TallySnapshot};
pub use config::{PageStep, ScenarioConfig, ScenarioConfigBuilder};
pub use runner::ScenarioRunner;
