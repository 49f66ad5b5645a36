//! Database resets for the two stores the e2e services own.
//!
//! Layout:
//! - `mysql.rs`: drop and recreate the index backend database
//! - `sqlite.rs`: wipe and recreate the tracker database file

pub mod mysql;
pub mod sqlite;
