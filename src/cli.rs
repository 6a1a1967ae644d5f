use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dwpackage")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Package Dropwizard services as Debian packages", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Render, validate and package the service
    Package {
        /// Build configuration (default: $DWPACKAGE_CONFIG or ./dwpackage.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip configuration validation
        #[arg(long, env = "DWPACKAGE_NO_VALIDATE")]
        no_validate: bool,

        /// Write the package here instead of the configured output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a template with the build parameters to stdout
    Render {
        /// Template file
        template: PathBuf,

        /// Build configuration (default: $DWPACKAGE_CONFIG or ./dwpackage.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the parameter tree as JSON instead
        #[arg(long)]
        show_parameters: bool,
    },

    /// Render and validate the service configuration without packaging
    Validate {
        /// Build configuration (default: $DWPACKAGE_CONFIG or ./dwpackage.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Check the signatures of a package
    Verify {
        /// Package file
        deb: PathBuf,

        /// Base64 Ed25519 public key file
        #[arg(long)]
        public_key: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_package() {
        let cli = Cli::parse_from([
            "dwpackage",
            "-vv",
            "package",
            "--config",
            "svc.toml",
            "--no-validate",
            "-o",
            "out/svc.deb",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Package {
                config,
                no_validate,
                output,
            } => {
                assert_eq!(config, Some(PathBuf::from("svc.toml")));
                assert!(no_validate);
                assert_eq!(output, Some(PathBuf::from("out/svc.deb")));
            }
            _ => panic!("expected package"),
        }
    }

    #[test]
    fn test_parse_verify_requires_key() {
        assert!(Cli::try_parse_from(["dwpackage", "verify", "svc.deb"]).is_err());
        let cli = Cli::try_parse_from(["dwpackage", "verify", "svc.deb", "--public-key", "k.pub"])
            .unwrap();
        assert!(matches!(cli.command, Command::Verify { .. }));
    }
}
