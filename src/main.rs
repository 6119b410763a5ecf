use std::process::ExitCode;

use clap::Parser;
use serial_monitor::{
    cli::{self, Commands, Examples},
    config::{Config, Settings},
    dispatcher, logging,
};
use tokio_util::sync::CancellationToken;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    if let Some(command) = &cli.command {
        return handle_command(command);
    }

    let config = cli.config.as_ref().map(Config::new_from_path).transpose();

    let quiet = cli.quiet || matches!(&config, Ok(Some(Config { quiet: Some(true), .. })));
    logging::init(quiet).await;

    let result = match config {
        Ok(config) => monitor(&cli, &config.unwrap_or_default()).await,
        Err(e) => Err(e),
    };

    logging::shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn handle_command(command: &Commands) -> ExitCode {
    match command {
        Commands::Examples(Examples::Config) => match Config::example().serialize_pretty() {
            Ok(example) => {
                println!("{example}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Could not serialize the example: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn monitor(cli: &cli::Cli, config: &Config) -> Result<(), serial_monitor::error::Error> {
    info!(?cli, ?config, "Starting");

    let settings = Settings::resolve(cli, config)?;

    if let Some(dir) = &settings.sinks.log_dir {
        info!(?dir, "Log files will be stored here");
    }
    if let Some(addr) = &settings.sinks.log_addr {
        info!(%addr, "Log records will be sent via TCP");
    }

    let dispatcher = dispatcher::start(&settings)?;

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    dispatcher.run(shutdown).await
}

async fn cancel_on_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    let hangup = async {
        match signal(SignalKind::hangup()) {
            Ok(mut hangup) => {
                hangup.recv().await;
            }
            Err(e) => {
                warn!(?e, "Not listening for hangups");
                futures::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let hangup = futures::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C, quitting")
        }
        _ = hangup => {
            info!("Told to hang up, quitting")
        }
    }

    shutdown.cancel();
}
