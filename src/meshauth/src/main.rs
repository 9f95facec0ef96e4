#![allow(special_module_name)]
use crate::config::meshauth_version_str;
use crate::lib::environment::Environment;
use crate::lib::error::MeshAuthResult;
use crate::lib::logger::{create_root_logger, LoggingMode};
use anyhow::{Context, Error};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

mod commands;
mod config;
mod lib;

/// Logs mesh peers in by who they are on the network.
#[derive(Parser)]
#[command(name = "meshauth", version = meshauth_version_str(), arg_required_else_help = true)]
pub struct CliOpts {
    /// Displays detailed information about operations. -vv will generate a very large number of messages.
    #[arg(long, short, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppresses informational messages. -qq limits to errors only; -qqqq disables them all.
    #[arg(long, short, action = ArgAction::Count, global = true)]
    quiet: u8,

    /// The logging mode to use. You can log to stderr, a file, or both.
    #[arg(long = "log", default_value = "stderr", value_parser = ["stderr", "tee", "file"], global = true)]
    logmode: String,

    /// The file to log to, if logging to a file (see --log).
    #[arg(long, global = true)]
    logfile: Option<PathBuf>,

    /// Backend configuration file (JSON). Defaults apply when omitted.
    #[arg(long, env = "MESHAUTH_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::MeshAuthCommand,
}

/// Setup a logger with the proper configuration, based on arguments.
fn setup_logging(opts: &CliOpts) -> MeshAuthResult<slog::Logger> {
    let verbose_level = opts.verbose as i64 - opts.quiet as i64;
    let logfile = || {
        opts.logfile
            .clone()
            .unwrap_or_else(|| PathBuf::from("meshauth.log"))
    };

    let mode = match opts.logmode.as_str() {
        "tee" => LoggingMode::Tee(logfile()),
        "file" => LoggingMode::File(logfile()),
        _ => LoggingMode::Stderr,
    };

    create_root_logger(verbose_level, mode).context("Failed to open log file.")
}

fn print_error(err: &Error) {
    for (level, cause) in err.chain().enumerate() {
        let prefix = if level == 0 { "Error" } else { "Caused by" };
        eprintln!("{prefix}: {cause}");
    }
}

fn inner_main() -> MeshAuthResult {
    let cli_opts = CliOpts::parse();

    if matches!(cli_opts.command, commands::MeshAuthCommand::Schema(_)) {
        return commands::exec_without_env(cli_opts.command);
    }

    let log = setup_logging(&cli_opts)?;
    let env = Environment::new(cli_opts.config.as_deref(), log)?;

    slog::trace!(
        env.get_logger(),
        "Trace mode enabled. Lots of logs coming up."
    );
    commands::exec(&env, cli_opts.command)
}

fn main() {
    if let Err(err) = inner_main() {
        print_error(&err);
        std::process::exit(255);
    }
}
