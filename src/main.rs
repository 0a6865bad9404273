//! Load balancer routing console.
//!
//! # Architecture Overview
//!
//! ```text
//!   script / stdin ──▶ console::Command ──▶ Router ──┬─▶ priority index (least-loaded)
//!                                                    ├─▶ rotation       (round-robin)
//!                                                    ├─▶ affinity tree  (session)
//!                                                    └─▶ topology       (latency)
//!                          ◀── result text / event log ──┘
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use load_router::config::{load_config, RouterConfig};
use load_router::console::{self, Command};
use load_router::observability::logging;
use load_router::Router;

#[derive(Parser)]
#[command(name = "load-router")]
#[command(about = "Route simulated requests across a backend pool", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the router RNG seed.
    #[arg(short, long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute commands from a script file
    Run {
        /// One command per line; `#` starts a comment
        script: PathBuf,
    },
    /// Read commands interactively from stdin
    Repl,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    if cli.seed.is_some() {
        config.routing.seed = cli.seed;
    }

    logging::init(&config.observability.log_level);
    tracing::info!("load-router v{} starting", env!("CARGO_PKG_VERSION"));

    let mut router = Router::from_config(&config)?;

    match cli.command {
        Commands::Run { script } => {
            let content = fs::read_to_string(&script)?;
            for (number, line) in content.lines().enumerate() {
                let line = console::strip_comment(line).trim();
                if line.is_empty() {
                    continue;
                }
                match step(&mut router, &config, line) {
                    Some(output) => println!("{}", output),
                    None => break,
                }
                tracing::trace!(line = number + 1, "Script line executed");
            }
        }
        Commands::Repl => {
            let stdin = io::stdin();
            print_prompt()?;
            for line in stdin.lock().lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    match step(&mut router, &config, &line) {
                        Some(output) => println!("{}", output),
                        None => break,
                    }
                }
                print_prompt()?;
            }
        }
    }

    tracing::info!(servers = router.len(), events = router.events().len(), "Session finished");
    Ok(())
}

/// Run one console line. `None` means the operator asked to exit.
fn step(router: &mut Router, config: &RouterConfig, line: &str) -> Option<String> {
    let command = match line.parse::<Command>() {
        Ok(Command::Exit) => return None,
        Ok(command) => command,
        Err(e) => return Some(format!("Invalid command: {}", e)),
    };

    Some(match console::execute(router, command, &config.pool) {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            format!("Error: {}", e)
        }
    })
}

fn print_prompt() -> io::Result<()> {
    print!("> ");
    io::stdout().flush()
}
