use clap::Parser;
use dualsig::cli::commands::{
    check::CheckCommand, hash::HashCommand, keys::KeysCommand, verify::VerifyCommand,
    CommandHandler,
};
use dualsig::cli::{Cli, Commands, LogLevel};
use tracing_subscriber::EnvFilter;

fn initialize_tracing(log_level: LogLevel, json: bool) {
    // RUST_LOG, when set, overrides --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr) // stdout carries the report
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    initialize_tracing(cli.log_level, cli.log_json);

    let command: Box<dyn CommandHandler + Send + Sync> = match cli.command {
        Commands::Verify {
            file,
            dns_hash,
            filename,
            manifest,
            signature,
            format,
        } => Box::new(VerifyCommand {
            config: cli.config,
            file,
            dns_hash,
            filename,
            manifest,
            signature,
            format,
        }),
        Commands::Check {
            filename,
            dns_hash,
            manifest,
            signature,
            format,
        } => Box::new(CheckCommand {
            config: cli.config,
            filename,
            dns_hash,
            manifest,
            signature,
            format,
        }),
        Commands::Hash { file } => Box::new(HashCommand { file }),
        Commands::Keys { format } => Box::new(KeysCommand {
            config: cli.config,
            format,
        }),
    };

    tracing::debug!("Running {} command", command.name());
    if let Err(e) = command.execute().await {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
