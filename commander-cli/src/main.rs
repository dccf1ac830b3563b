//! # Commander CLI
//!
//! Asks once for a task, then plans, vets and runs shell commands until the
//! task is done. Commands flagged unsafe wait for a y/n answer.
//!
//! Usage:
//!   commander
//!   commander --config ~/commander.yml
//!   commander -config ~/commander.yml
//!   COMMANDER_CONFIG=/etc/commander.yml commander
//!
//! Diagnostics go to the session log (`commander.log` unless `--log-file`).

mod output;

use clap::Parser;
use commander_agent::{
    Agent, AgentConfig, Config, Environment, ShellExecutor, TerminalApprover, Termination,
};
use commander_error::{Error, Result};
use commander_model::Team;
use output::ConsoleReporter;
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "commander")]
#[command(author, version, about = "Commander - ask in plain language, approve, and watch the shell do it")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "COMMANDER_CONFIG", default_value = "config.yml")]
    config: PathBuf,

    /// Where diagnostic logging is written
    #[arg(long, env = "COMMANDER_LOG", default_value = "commander.log")]
    log_file: PathBuf,
}

/// Accept the single-dash `-config` spelling; clap would read it as `-c onfig`
fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| {
            if arg == "-config" {
                "--config".to_string()
            } else if let Some(path) = arg.strip_prefix("-config=") {
                format!("--config={}", path)
            } else {
                arg
            }
        })
        .collect()
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            Error::from(e)
                .with_operation("cli::init_logging")
                .with_context("path", path.display().to_string())
        })?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// One line from stdin; `None` on EOF
fn read_task() -> Result<Option<String>> {
    print!("> ");
    io::stdout()
        .flush()
        .map_err(|e| Error::from(e).with_operation("cli::read_task"))?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| Error::from(e).with_operation("cli::read_task"))?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_from(normalize_args(std::env::args()));

    if let Err(e) = init_logging(&cli.log_file) {
        output::fatal(&e.to_string());
        std::process::exit(1);
    }

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            output::fatal(&e.to_string());
            std::process::exit(1);
        }
    };

    let env = match Environment::current() {
        Ok(env) => env,
        Err(e) => {
            output::fatal(&e.to_string());
            std::process::exit(1);
        }
    };

    let team = match Team::from_config(&config.models) {
        Ok(team) => team,
        Err(e) => {
            error!(error = %e, "failed to build model clients");
            output::fatal(&e.to_string());
            std::process::exit(1);
        }
    };

    println!("What should I do?");
    let task = match read_task() {
        Ok(Some(task)) if !task.is_empty() => task,
        Ok(_) => return,
        Err(e) => {
            output::fatal(&e.to_string());
            std::process::exit(1);
        }
    };

    info!(os = %env.os, cwd = %env.cwd.display(), "starting session");
    let executor = ShellExecutor::in_dir(env.cwd.clone());
    let mut agent = Agent::with_config(
        team,
        executor,
        TerminalApprover::stdio(),
        ConsoleReporter,
        env,
        AgentConfig {
            max_rounds: config.max_rounds,
        },
    );

    match agent.run(&task).await {
        Ok(result) => {
            if result.termination == Termination::RoundLimitReached {
                info!(rounds = result.rounds, "answered after reaching the round limit");
            }
            output::answer(&result.answer, result.rounds);
        }
        // Already reported by the agent
        Err(_) => std::process::exit(1),
    }
}
