mod check;
mod dump;
mod report;

pub use check::*;
use clap::Subcommand;
pub use dump::*;
pub use report::*;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum SetupCmd {
    /// Validate a setup document and exit
    Check {
        /// Path to the setup document
        path: PathBuf,

        /// Print findings without colors
        #[arg(short, long, default_value = "false")]
        plain: bool,
    },

    /// Print the normalized setup
    Dump {
        /// Path to the setup document
        path: PathBuf,

        /// Output as JSON
        #[arg(long, conflicts_with = "yaml")]
        json: bool,

        /// Output as YAML
        #[arg(long)]
        yaml: bool,
    },
}

pub fn run(cmd: SetupCmd) -> anyhow::Result<()> {
    match cmd {
        SetupCmd::Check { path, plain } => check(path, plain),
        SetupCmd::Dump { path, json, yaml } => dump(path, json, yaml),
    }
}
