//! pgdash - a PostgreSQL dashboard and query explorer for the terminal.
//!
//! The library holds everything but the process entry point so the
//! integration tests can drive the query boundary directly.

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod export;
pub mod logging;
pub mod query;
pub mod safety;
pub mod tui;
