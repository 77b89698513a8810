mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::io::IsTerminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kumly_core::{CallContext, CoreError, Session, SessionConfig};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a server connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "kumly", &mut std::io::stdout());
            Ok(())
        }

        // All other commands require a live session
        cmd => {
            let session_config = config::build_session_config(&cli.global)?;
            let session = open_session(session_config).await?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &session, &cli.global).await;
            session.close();
            result
        }
    }
}

/// Connect and log in, prompting once for a TOTP code when the account
/// has two-factor authentication enabled.
async fn open_session(session_config: SessionConfig) -> Result<Session, CliError> {
    let ctx = CallContext::with_timeout(session_config.connect_timeout);
    match Session::connect(session_config.clone(), &ctx).await {
        Err(CoreError::TwoFactorRequired) if std::io::stdin().is_terminal() => {
            let code: String = dialoguer::Input::new()
                .with_prompt("Two-factor code")
                .interact_text()
                .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
            let ctx = CallContext::with_timeout(session_config.connect_timeout);
            Ok(Session::connect(config::with_totp(session_config, code), &ctx).await?)
        }
        other => Ok(other?),
    }
}
