//! TUI widgets for pgdash.

pub mod header;
pub mod input;
pub mod metrics;
pub mod sidebar;
pub mod table;
pub mod toast;
