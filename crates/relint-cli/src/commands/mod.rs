//! Command implementations, one module per subcommand.

pub mod clean;
pub mod lint;
