use anyhow::Context;
use dbcheck_db::MySqlConnector;
use dbcheck_kernel::settings::Settings;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load dbcheck settings")?;
    dbcheck_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        host = %settings.database.host,
        "dbcheck-app starting"
    );

    let params = settings.database.connection_params();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    dbcheck_app::check_and_provision(&MySqlConnector::new(), &params, &mut out).await?;

    tracing::info!("dbcheck-app finished");
    Ok(())
}
