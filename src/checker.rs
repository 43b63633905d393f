//! Connect, probe, provision, disconnect.

use std::io::Write;

use anyhow::Context;
use dbcheck_kernel::{ConnectionParams, Connector, Session};

/// How far a run goes after connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `SELECT 1` only.
    Probe,
    /// Probe, then ensure the test database exists.
    Provision,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub address: String,
    /// Test database that is known to exist, if provisioning ran.
    pub provisioned: Option<String>,
}

/// Connect and run the probe.
pub async fn probe(
    connector: &dyn Connector,
    params: &ConnectionParams,
    out: &mut dyn Write,
) -> anyhow::Result<Report> {
    run(connector, params, Mode::Probe, out).await
}

/// Connect, run the probe, and create the test database if it is missing.
pub async fn check_and_provision(
    connector: &dyn Connector,
    params: &ConnectionParams,
    out: &mut dyn Write,
) -> anyhow::Result<Report> {
    run(connector, params, Mode::Provision, out).await
}

/// Run `mode` over one connection. Once connected, the session is closed on every
/// path; a statement failure takes precedence over a failure to close.
pub async fn run(
    connector: &dyn Connector,
    params: &ConnectionParams,
    mode: Mode,
    out: &mut dyn Write,
) -> anyhow::Result<Report> {
    let address = params.address();
    tracing::info!(
        driver = connector.name(),
        %address,
        database = %params.database,
        ?mode,
        "connecting"
    );

    let mut session = connector
        .connect(params)
        .await
        .with_context(|| format!("failed to connect to {address}"))?;

    let outcome = run_steps(session.as_mut(), params, mode, out).await;
    let closed = session.close().await;

    match (outcome, closed) {
        (Ok(report), Ok(())) => {
            tracing::debug!(%address, "connection closed");
            Ok(report)
        }
        (Ok(_), Err(close_err)) => Err(close_err.context("failed to release connection")),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            tracing::warn!(error = %close_err, "failed to release connection after error");
            Err(err)
        }
    }
}

async fn run_steps(
    session: &mut dyn Session,
    params: &ConnectionParams,
    mode: Mode,
    out: &mut dyn Write,
) -> anyhow::Result<Report> {
    let address = params.address();

    session.ping().await.context("connectivity probe failed")?;
    writeln!(out, "Connected.")?;
    tracing::info!(%address, "probe succeeded");

    if mode == Mode::Probe {
        return Ok(Report {
            address,
            provisioned: None,
        });
    }

    let name = params.test_database();
    session
        .create_database(&name)
        .await
        .with_context(|| format!("failed to provision database {name}"))?;
    writeln!(out, "Database ready: {name}")?;
    tracing::info!(%address, database = %name, "test database ready");

    Ok(Report {
        address,
        provisioned: Some(name),
    })
}
