//! Command line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use netjournal::phases::RunMode;

/// Plans, runs and finalizes interface journals.
#[derive(Parser)]
#[command(name = "netjournal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Plan interface changes and write the journals.
    Plan(PlanArgs),
    /// Run a journal by its token.
    Run(RunArgs),
    /// Find existing interfaces by hardware ID.
    Find(FindArgs),
}

/// Arguments for the plan command.
#[derive(Args)]
pub struct PlanArgs {
    /// Session file holding properties, components and the interface table.
    #[arg(short, long)]
    pub session: PathBuf,

    /// Directory to create journal files in.
    #[arg(short, long, env = "NETJOURNAL_DIR")]
    pub journal_dir: Option<PathBuf>,
}

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Journal token printed by `plan`.
    pub token: PathBuf,

    /// Which pass to run.
    #[arg(short, long, value_enum, default_value_t = Mode::Deferred)]
    pub mode: Mode,

    /// `ip` binary used to manage interfaces.
    #[arg(long, default_value = "ip")]
    pub ip: PathBuf,
}

/// Arguments for the find command.
#[derive(Args)]
pub struct FindArgs {
    /// Session file to store the result in.
    #[arg(short, long)]
    pub session: PathBuf,

    /// Hardware ID to match.
    #[arg(long, default_value = netjournal::config::DEFAULT_HARDWARE_ID)]
    pub hardware_id: String,

    /// sysfs network class directory.
    #[arg(long, default_value = "/sys/class/net")]
    pub sysfs: PathBuf,
}

/// Pass selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Primary pass.
    Deferred,
    /// Transaction committed.
    Commit,
    /// Transaction rolled back.
    Rollback,
}

impl From<Mode> for RunMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Deferred => RunMode::Deferred,
            Mode::Commit => RunMode::Commit,
            Mode::Rollback => RunMode::Rollback,
        }
    }
}
