pub mod connection;
pub mod settings;

pub use connection::{ConnectionParams, Connector, Session};
