//! Entry points behind the `install` and `run` subcommands.

mod install;
mod report;
mod run;

pub use install::{InstallOptions, install};
pub use run::{RunOptions, run};
