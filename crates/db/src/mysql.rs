use async_trait::async_trait;
use dbcheck_kernel::{ConnectionParams, Connector, Session};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor};

use crate::error::DbError;

const PROBE_STATEMENT: &str = "SELECT 1";

/// Quote `name` as a MySQL identifier, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Idempotent creation statement for `name`.
pub fn create_database_statement(name: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", quote_identifier(name))
}

fn autocommit_statement(enabled: bool) -> &'static str {
    if enabled {
        "SET autocommit = 1"
    } else {
        "SET autocommit = 0"
    }
}

/// Driver options for the primary database described by `params`.
pub fn connect_options(params: &ConnectionParams) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(&params.host)
        .port(params.port)
        .username(&params.username)
        .database(&params.database);

    match &params.password {
        Some(password) => options.password(password),
        None => options,
    }
}

/// Opens single, unpooled MySQL connections.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlConnector;

impl MySqlConnector {
    pub fn new() -> Self {
        Self
    }

    async fn open(&self, params: &ConnectionParams) -> Result<MySqlSession, DbError> {
        let address = params.address();
        let options = connect_options(params);

        tracing::debug!(
            target: "dbcheck-db",
            %address,
            database = %params.database,
            user = %params.username,
            "opening connection"
        );

        let connecting = MySqlConnection::connect_with(&options);
        // A zero timeout disables the bound instead of failing every attempt.
        let attempt = if params.connect_timeout.is_zero() {
            Ok(connecting.await)
        } else {
            tokio::time::timeout(params.connect_timeout, connecting).await
        };

        let conn = match attempt {
            Ok(Ok(conn)) => conn,
            Ok(Err(source)) => return Err(DbError::Connect { address, source }),
            Err(_) => {
                return Err(DbError::ConnectTimeout {
                    address,
                    timeout: params.connect_timeout,
                })
            }
        };

        let mut session = MySqlSession { conn };
        if let Err(err) = session.execute(autocommit_statement(params.autocommit)).await {
            // The session never reaches the caller, so release it here.
            if let Err(close_err) = session.conn.close().await {
                tracing::warn!(target: "dbcheck-db", error = %close_err, "failed to close connection");
            }
            return Err(err);
        }

        Ok(session)
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    fn name(&self) -> &'static str {
        "mysql"
    }

    async fn connect(&self, params: &ConnectionParams) -> anyhow::Result<Box<dyn Session>> {
        let session = self.open(params).await?;
        Ok(Box::new(session))
    }
}

/// An open MySQL connection.
pub struct MySqlSession {
    conn: MySqlConnection,
}

impl MySqlSession {
    async fn execute(&mut self, statement: &str) -> Result<(), DbError> {
        tracing::debug!(target: "dbcheck-db", statement, "executing");
        Executor::execute(&mut self.conn, sqlx::raw_sql(statement))
            .await
            .map_err(|source| DbError::Statement {
                statement: statement.to_string(),
                source,
            })?;
        Ok(())
    }
}

#[async_trait]
impl Session for MySqlSession {
    async fn ping(&mut self) -> anyhow::Result<()> {
        let value: i64 = sqlx::query_scalar(PROBE_STATEMENT)
            .fetch_one(&mut self.conn)
            .await
            .map_err(|source| DbError::Statement {
                statement: PROBE_STATEMENT.to_string(),
                source,
            })?;

        if value != 1 {
            return Err(DbError::UnexpectedProbe(value).into());
        }
        Ok(())
    }

    async fn create_database(&mut self, name: &str) -> anyhow::Result<()> {
        let statement = create_database_statement(name);
        self.execute(&statement).await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        self.conn.close().await.map_err(DbError::Close)?;
        Ok(())
    }
}
