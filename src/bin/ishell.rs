// src/bin/ishell.rs

//! `ishell`: runs commands in order on one persistent shell session.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::*;
use interactive_shell::{
    Outcome, Session,
    cli::Cli,
    core::config_loader,
    models::{SessionConfig, ShellConfig},
    system::shells_config,
};
use std::io;

/// The main entry point of the `ishell` application.
/// It sets up logging, parses arguments, runs the commands and performs
/// centralized error handling.
fn main() {
    env_logger::init();

    match run_cli(Cli::parse()) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("\n{}: {:#}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Merges command-line overrides into the loaded configuration.
fn build_config(cli: &Cli) -> Result<SessionConfig> {
    let mut config = config_loader::load(cli.config.as_deref())?;

    if cli.verbose {
        config.verbose = true;
    }
    if let Some(secs) = cli.progress {
        config.verbose = true;
        config.progress_interval_secs = secs;
    }
    if cli.log_progress {
        config.log_progress = true;
    }
    if let Some(ms) = cli.poll_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(secs) = cli.timeout {
        config.timeout_secs = secs;
    }
    if let Some(line) = &cli.shell {
        let shell = shells_config::parse_shell_command_line(line)
            .ok_or_else(|| anyhow!("Invalid shell command line: '{}'", line))?;
        // Only the program and its arguments come from the flag.
        config.shell = ShellConfig {
            working_dir: config.shell.working_dir.take(),
            env: std::mem::take(&mut config.shell.env),
            ..shell
        };
    }
    Ok(config)
}

/// Runs every command on one session. Returns `false` if any command failed.
fn run_cli(cli: Cli) -> Result<bool> {
    log::debug!("CLI args parsed: {:?}", cli);
    let config = build_config(&cli)?;
    log::debug!("Effective config: {:?}", config);

    // Commands given as arguments win; otherwise stream them from stdin as they come.
    let commands: Box<dyn Iterator<Item = io::Result<String>>> = if cli.commands.is_empty() {
        Box::new(io::stdin().lines())
    } else {
        Box::new(cli.commands.clone().into_iter().map(Ok))
    };

    println!("{}", "Starting shell session".dimmed());
    let mut session = Session::from_config(&config)?;
    let mut failures = 0usize;

    for command in commands {
        let command = command.context("Failed to read commands from stdin")?;
        let command = command.trim();
        if command.is_empty() {
            continue;
        }

        println!("{} {}", "Executing:".blue(), command.green());
        match session.execute_command(command, config.timeout_secs)? {
            Outcome::Success => log::debug!("'{}' succeeded.", command),
            outcome => {
                failures += 1;
                eprintln!("{} {}", "Failed:".red().bold(), outcome.to_string().red());
                if !cli.keep_going {
                    break;
                }
            }
        }
    }

    session.release()?;

    if failures > 0 {
        eprintln!(
            "{}",
            format!("{} command(s) did not succeed.", failures).yellow()
        );
    }
    Ok(failures == 0)
}
