use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_appender::rolling;

use hrm_analytics::analytics::build_attendance_report;
use hrm_analytics::config::Config;
use hrm_analytics::db::init_db;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, &config.log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!("Attendance report starting...");

    if let Err(e) = run(&config).await {
        error!(error = %format!("{:#}", e), "Attendance report failed");
        return Err(e);
    }

    Ok(())
}

async fn run(config: &Config) -> Result<()> {
    let pool = init_db(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let report = build_attendance_report(&pool, config.report_scope())
        .await
        .context("Failed to build attendance report")?;

    let rendered =
        serde_json::to_string_pretty(&report).context("Failed to render attendance report")?;
    println!("{}", rendered);

    info!(
        anomalies = report.anomalies.len(),
        employees = report.employees.len(),
        "Attendance report written"
    );
    Ok(())
}
