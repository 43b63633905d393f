//! MySQL adapter for the dbcheck session traits.
//!
//! One [`MySqlConnector`] opens one unpooled connection per run; the returned
//! session is closed explicitly by the caller.

pub mod error;
pub mod mysql;

pub use error::DbError;
pub use mysql::{connect_options, create_database_statement, quote_identifier, MySqlConnector};
