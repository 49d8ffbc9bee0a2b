//! Query execution for pgdash.
//!
//! Everything that touches the database from the UI or the headless runner
//! goes through [`QueryExecutor`].

pub mod executor;

pub use executor::QueryExecutor;
