//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for survey-synth.

use clap::{Parser, Subcommand};

/// survey-synth - persona-driven synthetic survey responses
///
/// Builds student, faculty and practitioner personas from fixed attribute
/// pools, samples their Likert ratings and tool usage, and writes each
/// respondent to a data service as one bundle.
#[derive(Parser, Debug)]
#[command(name = "survey-synth")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a full population and submit it to the configured sink
    Generate {
        /// Path to configuration file
        #[arg(short, long, env = "SURVEY_SYNTH_CONFIG")]
        config: Option<String>,

        /// Override the configured seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Keep everything in memory and print the construct summary
        #[arg(long)]
        dry_run: bool,
    },

    /// Print construct means and ANOVA over the data already in the sink
    Summary {
        /// Path to configuration file
        #[arg(short, long, env = "SURVEY_SYNTH_CONFIG")]
        config: Option<String>,
    },

    /// Show table row counts and delete all generated rows
    Clear {
        /// Path to configuration file
        #[arg(short, long, env = "SURVEY_SYNTH_CONFIG")]
        config: Option<String>,

        /// Delete without asking; otherwise only the counts are shown
        #[arg(short, long)]
        yes: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the effective configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

impl Commands {
    /// Config file named on the command line, if the command takes one.
    pub fn config_path(&self) -> Option<&str> {
        match self {
            Commands::Generate { config, .. }
            | Commands::Summary { config }
            | Commands::Clear { config, .. } => config.as_deref(),
            Commands::Config { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::parse_from(["survey-synth", "generate"]);
        match cli.command {
            Commands::Generate { seed, dry_run, .. } => {
                assert!(seed.is_none());
                assert!(!dry_run);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_with_options() {
        let cli = Cli::parse_from([
            "survey-synth",
            "generate",
            "--seed",
            "7",
            "--dry-run",
            "--config",
            "/tmp/synth.toml",
        ]);
        assert_eq!(cli.command.config_path(), Some("/tmp/synth.toml"));
        match cli.command {
            Commands::Generate { seed, dry_run, .. } => {
                assert_eq!(seed, Some(7));
                assert!(dry_run);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_rejects_negative_seed() {
        assert!(Cli::try_parse_from(["survey-synth", "generate", "--seed", "-1"]).is_err());
    }

    #[test]
    fn test_clear_requires_explicit_yes() {
        let cli = Cli::parse_from(["survey-synth", "clear"]);
        match cli.command {
            Commands::Clear { yes, .. } => assert!(!yes),
            _ => panic!("Expected Clear command"),
        }

        let cli = Cli::parse_from(["survey-synth", "clear", "-y"]);
        match cli.command {
            Commands::Clear { yes, .. } => assert!(yes),
            _ => panic!("Expected Clear command"),
        }
    }

    #[test]
    fn test_verbose_flags() {
        let cli = Cli::parse_from(["survey-synth", "-vv", "summary"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_quiet_flag_after_subcommand() {
        let cli = Cli::parse_from(["survey-synth", "generate", "--quiet"]);
        assert!(cli.quiet);
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["survey-synth", "config", "init", "--force"]);
        assert!(cli.command.config_path().is_none());
        match cli.command {
            Commands::Config {
                subcommand: ConfigSubcommand::Init { path, force },
            } => {
                assert!(path.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
