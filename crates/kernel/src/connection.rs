use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

/// Suffix appended to the primary database name to form the test database name.
pub const DEFAULT_TEST_SUFFIX: &str = "_test";

/// Everything needed to open one connection to the database server.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    /// Primary database selected on connect.
    pub database: String,
    pub test_suffix: String,
    pub username: String,
    pub password: Option<String>,
    pub autocommit: bool,
    /// Upper bound on connection establishment; `Duration::ZERO` means unbounded.
    pub connect_timeout: Duration,
}

impl ConnectionParams {
    /// Name of the database provisioned next to the primary one.
    ///
    /// Always `database` followed by `test_suffix`, e.g. `d045f262` -> `d045f262_test`.
    pub fn test_database(&self) -> String {
        format!("{}{}", self.database, self.test_suffix)
    }

    /// `host:port` as used in log lines and error messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("test_suffix", &self.test_suffix)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("autocommit", &self.autocommit)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Opens sessions against a database server.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Driver name used in logs.
    fn name(&self) -> &'static str;

    /// Establish a connection; authentication and network failures surface here.
    async fn connect(&self, params: &ConnectionParams) -> anyhow::Result<Box<dyn Session>>;
}

/// One open connection, exclusively owned by its caller until [`Session::close`].
#[async_trait]
pub trait Session: Send {
    /// Run the connectivity probe (`SELECT 1`).
    async fn ping(&mut self) -> anyhow::Result<()>;

    /// Create `name` unless it already exists. Must succeed when it does.
    async fn create_database(&mut self, name: &str) -> anyhow::Result<()>;

    /// Release the connection.
    async fn close(self: Box<Self>) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(database: &str) -> ConnectionParams {
        ConnectionParams {
            host: "db.internal".to_string(),
            port: 3306,
            database: database.to_string(),
            test_suffix: DEFAULT_TEST_SUFFIX.to_string(),
            username: "app".to_string(),
            password: Some("hunter2".to_string()),
            autocommit: true,
            connect_timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_database_appends_suffix() {
        assert_eq!(params("d045f262").test_database(), "d045f262_test");
    }

    #[test]
    fn test_database_uses_configured_suffix() {
        let mut params = params("orders");
        params.test_suffix = "_ci".to_string();
        assert_eq!(params.test_database(), "orders_ci");
    }

    #[test]
    fn address_joins_host_and_port() {
        assert_eq!(params("orders").address(), "db.internal:3306");
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", params("orders"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }
}
