use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::args::{Cli, Commands};
use cli::commands::{disassemble, inspect, run};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Run {
            path,
            method,
            swf,
            config,
            max_call_depth,
        } => run::run_file(
            &path,
            &run::RunOptions {
                method,
                swf,
                config,
                max_call_depth,
            },
        )?,
        Commands::Inspect { path, json, swf } => inspect::inspect_file(&path, json, swf)?,
        Commands::Disassemble { path, swf } => disassemble::disassemble_file(&path, swf)?,
    };
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
