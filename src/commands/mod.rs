//! Command handlers module.
//!
//! This module organizes the CLI command implementations into separate files:
//! - `io.rs`: import and export
//! - `show.rs`: file display and migration planning
//! - `config.rs`: configuration display

mod config;
mod io;
mod show;

pub use config::cmd_config;
pub use io::{cmd_export, cmd_import};
pub use show::{cmd_plan, cmd_show};
