//! tola-freeze - freeze static references into content-addressed files.

use anyhow::Result;
use clap::{ColorChoice, Parser};

use tola_freeze::cli::{Cli, Commands, build, inspect};
use tola_freeze::config::FreezeConfig;
use tola_freeze::logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    if let Err(err) = run(&cli).await {
        logger::log_error(&err);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = FreezeConfig::load(&cli.config)?;

    match &cli.command {
        Commands::Build { nodes, no_wait } => build::build_nodes(&config, nodes, !no_wait).await,
        Commands::Freeze { file } => {
            let frozen = build::freeze_file(&config, file).await?;
            println!("{}", frozen.display());
            Ok(())
        }
        Commands::Tokens { file } => {
            print!("{}", inspect::tokens(&config, file)?);
            Ok(())
        }
        Commands::Checksum { file, hash, digest } => {
            let checksum = inspect::checksum(&config, file, *hash, *digest)?;
            println!("{checksum}  {}", file.display());
            Ok(())
        }
    }
}
