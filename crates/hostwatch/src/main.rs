mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hostwatch_core::{StateController, StatusFilter};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

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
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "hostwatch", &mut std::io::stdout());
            Ok(())
        }

        Command::Config(ref args) => {
            let settings = config::load_settings()?;
            commands::config_cmd::handle(args, &settings, &cli.global)
        }

        cmd => {
            let settings = config::load_settings()?;
            let filter = match &cmd {
                Command::Watch(args) => StatusFilter::from(args.status),
                _ => StatusFilter::ALL,
            };
            let mut session = config::resolve_session(&settings, &cli.global, filter)?;
            // One-shot commands don't follow the status stream.
            if !matches!(cmd, Command::Watch(_)) {
                session.controller.websocket_enabled = false;
                session.controller.refresh_interval = std::time::Duration::ZERO;
            }
            let controller = StateController::new(session.controller.clone())?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &controller, &session, &cli.global).await
        }
    }
}
