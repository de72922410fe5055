use liveview_load::{
    CheckRecorder, Driver, DriverOptions, HttpPageFetcher, ScenarioConfig, ScenarioRunner,
    TungsteniteConnector,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(ScenarioConfig::from_env()?);
    let options = DriverOptions::from_env()?;

    println!(
        "📡 {} virtual users x {} iterations against {}",
        options.virtual_users, options.iterations, config.target
    );
    for step in &config.pages {
        println!("   GET {}  (expects {} and '{}')", step.path, step.expected_status, step.marker);
    }
    println!();

    let summary = Driver::new(options)
        .run(|_, recorder: Arc<dyn CheckRecorder>| {
            let fetcher = HttpPageFetcher::new(config.cookie_header())?;
            Ok(ScenarioRunner::new(
                Arc::clone(&config),
                fetcher,
                TungsteniteConnector,
                recorder,
            ))
        })
        .await?;

    for (name, counts) in &summary.checks {
        let total = counts.passes + counts.fails;
        let mark = if counts.fails == 0 { "✓" } else { "✗" };
        println!(
            "  {} {:<28} {:>6}/{:<6} passed",
            mark, name, counts.passes, total
        );
    }
    println!();
    println!(
        "iterations: {} completed, {} aborted",
        summary.iterations_completed, summary.iterations_aborted
    );
    for (reason, count) in summary.aborts.iter().take(10) {
        println!("  ✗ {} (x{})", reason, count);
    }
    let unlisted = summary.unlisted_aborts();
    if unlisted > 0 {
        println!("  … {} more aborts with other reasons", unlisted);
    }

    if !summary.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}
