use anyhow::Context;
use clap::{Parser, Subcommand};
use dbcheck_app::Mode;
use dbcheck_db::MySqlConnector;
use dbcheck_kernel::settings::Settings;

/// Check database connectivity and provision the test database.
#[derive(Debug, Parser)]
#[command(name = "dbcheck", version, about)]
struct Cli {
    /// Settings environment (local, staging, production); overrides DBCHECK_ENV.
    #[arg(long, global = true)]
    env: Option<String>,

    /// Database server host.
    #[arg(long, global = true)]
    host: Option<String>,

    /// Database server port.
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Primary database name; the test database is derived from it.
    #[arg(long, global = true)]
    database: Option<String>,

    /// User to authenticate as. The password only comes from settings.
    #[arg(long, global = true)]
    user: Option<String>,

    /// Seconds to wait for the connection to be established.
    #[arg(long, global = true)]
    connect_timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Probe the server and ensure the test database exists (default).
    Run,
    /// Probe the server only.
    Ping,
    /// Print the effective settings as JSON with the password redacted.
    Config,
}

impl Cli {
    fn apply_overrides(&self, settings: &mut Settings) {
        let database = &mut settings.database;
        if let Some(host) = &self.host {
            database.host = host.clone();
        }
        if let Some(port) = self.port {
            database.port = port;
        }
        if let Some(name) = &self.database {
            database.name = name.clone();
        }
        if let Some(user) = &self.user {
            database.username = user.clone();
        }
        if let Some(secs) = self.connect_timeout {
            database.connect_timeout_secs = secs;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_for(cli.env.as_deref())
        .with_context(|| "failed to load dbcheck settings")?;
    cli.apply_overrides(&mut settings);
    dbcheck_telemetry::init(&settings.telemetry)?;

    let command = cli.command.unwrap_or(Command::Run);
    tracing::debug!(env = ?settings.environment, ?command, "dbcheck starting");

    let params = settings.database.connection_params();
    let mode = match command {
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&serde_json::json!({
                "settings": settings,
                "test_database": params.test_database(),
            }))?;
            println!("{rendered}");
            return Ok(());
        }
        Command::Run => Mode::Provision,
        Command::Ping => Mode::Probe,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    dbcheck_app::checker::run(&MySqlConnector::new(), &params, mode, &mut out).await?;
    Ok(())
}
