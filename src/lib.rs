//! dbcheck application library
//!
//! Verifies that a database server is reachable and that the test database next to
//! the primary one exists.

pub mod checker;

pub use checker::{check_and_provision, probe, Mode, Report};
