//! Subcommand implementations for docforge.
//!
//! Each module corresponds to a subcommand (`docforge <command>`).

pub mod init;
pub mod serve;
pub mod variants;
