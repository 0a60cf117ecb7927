//! `minic-analyze`: CLI entry point for the MiniC static analyzer.

use clap::Parser;
use minic_analyzer::cli::{cmds, Cli, Commands};
use minic_analyzer::output;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let exit_code = match &cli.command {
        Commands::Analyze(args) => match cmds::analyze(args) {
            Ok(code) => code,
            Err(err) => {
                output::error(&format!("{err:#}"));
                output::EXIT_INVOCATION_ERROR
            }
        },
    };

    std::process::exit(exit_code);
}
