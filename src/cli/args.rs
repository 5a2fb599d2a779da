//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::digest::{DigestEncoding, HashAlgorithm};

/// Freeze static references into content-addressed files
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (searched upward from the current directory)
    #[arg(short = 'C', long, default_value = "freeze.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build nodes: rewrite each node's source into its target
    #[command(visible_alias = "b")]
    Build {
        /// Node directories, relative to the project root (e.g. pages/index)
        #[arg(required = true, value_hint = clap::ValueHint::DirPath)]
        nodes: Vec<PathBuf>,

        /// Skip waiting for `wait_for_targets` / `wait_for_node_targets`
        #[arg(long)]
        no_wait: bool,
    },

    /// Build a file, freeze the result and print the frozen path
    #[command(visible_alias = "f")]
    Freeze {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Print the folded token tree of a file
    #[command(visible_alias = "t")]
    Tokens {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Print the checksum a file would be frozen under
    #[command(visible_alias = "c")]
    Checksum {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Override the configured hash (sha1, sha256, blake3)
        #[arg(long)]
        hash: Option<HashAlgorithm>,

        /// Override the configured digest encoding (hex, alphanum)
        #[arg(long)]
        digest: Option<DigestEncoding>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from(["tola-freeze", "-V", "build", "pages/index", "pages/about"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("freeze.toml"));
        match cli.command {
            Commands::Build { nodes, no_wait } => {
                assert_eq!(nodes, [PathBuf::from("pages/index"), PathBuf::from("pages/about")]);
                assert!(!no_wait);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_checksum_overrides() {
        let cli = Cli::parse_from([
            "tola-freeze",
            "-C",
            "site.toml",
            "checksum",
            "a.css",
            "--hash",
            "blake3",
            "--digest",
            "alphanum",
        ]);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        match cli.command {
            Commands::Checksum { hash, digest, .. } => {
                assert_eq!(hash, Some(HashAlgorithm::Blake3));
                assert_eq!(digest, Some(DigestEncoding::Alphanum));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_build_requires_node() {
        assert!(Cli::try_parse_from(["tola-freeze", "build"]).is_err());
        assert!(Cli::try_parse_from(["tola-freeze", "checksum", "a.css", "--hash", "md5"]).is_err());
    }
}
