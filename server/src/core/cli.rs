use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    API_KEY_MAX_EXPIRY_DAYS, ENV_CONFIG, ENV_DEBUG, ENV_HOST, ENV_PORT,
    ENV_SERVER_SIDE_AGGREGATION,
};

#[derive(Parser)]
#[command(name = "pulseboard")]
#[command(version, about = "Multi-tenant analytics dashboard server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Disable API key authentication (all requests use the default organization)
    #[arg(long, global = true)]
    pub no_auth: bool,

    /// Enable debug mode (verbose pipeline logging)
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Push chart aggregation down into the database when supported
    #[arg(long, global = true, env = ENV_SERVER_SIDE_AGGREGATION)]
    pub server_side_aggregation: Option<bool>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// System maintenance commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
    /// Organization management
    Orgs {
        #[command(subcommand)]
        command: OrgCommands,
    },
    /// API key management
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum SystemCommands {
    /// Delete local data directory (database and secrets). Requires confirmation.
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum OrgCommands {
    /// Create an organization
    Create {
        /// Display name
        #[arg(long)]
        name: String,
        /// URL-safe slug (lowercase letters, digits, dashes)
        #[arg(long)]
        slug: String,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum KeyCommands {
    /// Issue an API key for an organization. The key is printed once.
    Create {
        /// Organization ID
        #[arg(long)]
        org: String,
        /// Key name
        #[arg(long)]
        name: String,
        /// Expire the key after this many days (never, when omitted)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(API_KEY_MAX_EXPIRY_DAYS)))]
        expires_in_days: Option<u32>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub no_auth: bool,
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub server_side_aggregation: Option<bool>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        no_auth: cli.no_auth,
        debug: cli.debug,
        config: cli.config,
        server_side_aggregation: cli.server_side_aggregation,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_to_no_command() {
        let cli = Cli::try_parse_from(["pulseboard"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.no_auth);
    }

    #[test]
    fn test_parse_keys_create() {
        let cli =
            Cli::try_parse_from(["pulseboard", "keys", "create", "--org", "acme", "--name", "ci"])
                .unwrap();
        match cli.command {
            Some(Commands::Keys {
                command:
                    KeyCommands::Create {
                        org,
                        name,
                        expires_in_days,
                    },
            }) => {
                assert_eq!(org, "acme");
                assert_eq!(name, "ci");
                assert_eq!(expires_in_days, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_key_expiry_range() {
        let cli = Cli::try_parse_from([
            "pulseboard",
            "keys",
            "create",
            "--org",
            "acme",
            "--name",
            "ci",
            "--expires-in-days",
            "30",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Keys {
                command: KeyCommands::Create {
                    expires_in_days: Some(30),
                    ..
                }
            })
        ));

        assert!(
            Cli::try_parse_from([
                "pulseboard",
                "keys",
                "create",
                "--org",
                "acme",
                "--name",
                "ci",
                "--expires-in-days",
                "0",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pulseboard", "start", "--port", "9000", "--no-auth"])
            .unwrap();
        assert!(matches!(cli.command, Some(Commands::Start)));
        assert_eq!(cli.port, Some(9000));
        assert!(cli.no_auth);
    }
}
