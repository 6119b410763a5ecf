use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// The command line interface for serial monitor.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Which serial port to use
    #[arg(long, env = "SERIAL_PORT")]
    pub port: Option<String>,

    /// BAUD rate for the serial port
    #[arg(long, env = "SERIAL_BAUD")]
    pub baud: Option<u32>,

    /// Where to store log files.
    /// Defaults to `logs` next to the executable, given without a value no files are written.
    #[arg(long, num_args = 0..=1, value_name = "DIR")]
    pub log_dir: Option<Option<PathBuf>>,

    /// Where to send log lines over TCP, `host:port`
    #[arg(long, num_args = 0..=1, value_name = "HOST:PORT")]
    pub log_addr: Option<Option<String>>,

    /// Only show INFO and above on stdout
    #[arg(short, long)]
    pub quiet: bool,

    /// How long to wait for a newline before logging a partial line
    #[arg(long, value_name = "MILLISECONDS")]
    pub read_timeout_ms: Option<u64>,

    /// Path to a configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Commands available in the command line interface.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Examples for user convenience.
    #[clap(subcommand)]
    Examples(Examples),
}

/// Helpful examples for users.
#[derive(Subcommand, Clone, Debug)]
pub enum Examples {
    /// Show an example of a configuration file's contents.
    Config,
}
