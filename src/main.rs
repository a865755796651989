//! Lawrence CLI entry point.

use clap::Parser;
use lawrence::cli::{self, Cli, Commands, EXIT_ERROR};

fn main() {
    let cli = Cli::parse();

    let config = match cli::setup(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_ERROR);
        }
    };

    let result = match &cli.command {
        Commands::Inject(args) => cli::run_inject(args, &config),
        Commands::Analyze(args) => cli::run_analyze(args),
        Commands::Entrypoints(args) => cli::run_entrypoints(args, &config),
        Commands::Languages => cli::run_languages(),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
