use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::application::data::LogLevel;
use crate::config::DEFAULT_SETTINGS_FILE;

/// Snapshot a directory tree and find out what grew since the last snapshot.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Cli {
    #[clap(long, short, default_value = "warn", value_enum, global = true)]
    pub log_level: LogLevel,

    /// Settings file, ignored when missing
    #[clap(long, short, default_value = DEFAULT_SETTINGS_FILE, global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Take a snapshot of a directory and save it
    Save {
        /// Where to write the snapshot
        output: PathBuf,
        /// The directory to snapshot
        #[clap(long, short, default_value = ".")]
        root: PathBuf,
    },
    /// Compare a saved snapshot against the current state of its directory
    Compare {
        /// The saved snapshot to compare against
        snapshot: PathBuf,
        /// The directory to snapshot, defaults to the one recorded in the saved snapshot
        #[clap(long, short)]
        root: Option<PathBuf>,
        #[command(flatten)]
        report: ReportArgs,
        /// Overwrite the saved snapshot with the current state afterwards
        #[clap(long)]
        update: bool,
    },
    /// Compare two saved snapshots
    Diff {
        old: PathBuf,
        new: PathBuf,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Show what a saved snapshot contains
    Info { snapshot: PathBuf },
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportArgs {
    /// Minimum growth to report, in MiB
    #[clap(long, short)]
    pub threshold_mib: Option<u64>,
    /// Show paths relative to the snapshot root
    #[clap(long)]
    pub relative: bool,
}

impl Command {
    pub fn report_args(&self) -> Option<&ReportArgs> {
        match self {
            Command::Compare { report, .. } | Command::Diff { report, .. } => Some(report),
            Command::Save { .. } | Command::Info { .. } => None,
        }
    }
}
