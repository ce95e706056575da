use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "avm")]
#[command(about = "AVM2 bytecode runtime", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Link a program and run one of its method bodies
    Run {
        /// Path to the program (.abc, or .swf with --swf)
        path: PathBuf,
        /// Method body to run
        #[arg(long, default_value_t = 0)]
        method: u32,
        /// Read the program out of an uncompressed SWF container
        #[arg(long)]
        swf: bool,
        /// TOML file with VM limits
        #[arg(long)]
        config: Option<PathBuf>,
        /// Overrides `max_call_depth` from the config file
        #[arg(long)]
        max_call_depth: Option<usize>,
    },
    /// Print a summary of a decoded program
    Inspect {
        path: PathBuf,
        /// Dump the whole decoded program as JSON
        #[arg(long)]
        json: bool,
        #[arg(long)]
        swf: bool,
    },
    /// Print the instructions of every method body
    Disassemble {
        path: PathBuf,
        #[arg(long)]
        swf: bool,
    },
}
