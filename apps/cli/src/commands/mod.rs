//! Subcommand implementations, one module per screen.

pub mod logs;
pub mod products;
pub mod scan;
