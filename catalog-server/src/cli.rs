//! Command-line arguments
//!
//! Every flag is optional; unset flags fall through to the environment,
//! the TOML file and finally compiled defaults.

use catalog_common::config::CliOverrides;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "catalog-server")]
#[command(about = "Collectible catalog JSON service")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(short, long)]
    pub bind: Option<String>,

    /// SQLite database file (created if missing)
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// TOML seed file with categories, items and polls
    #[arg(short, long)]
    pub seed: Option<PathBuf>,
}

impl Args {
    pub fn into_overrides(self) -> CliOverrides {
        CliOverrides {
            port: self.port,
            bind: self.bind,
            database: self.database,
            config: self.config,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let args = Args::try_parse_from(["catalog-server"]).unwrap();
        let overrides = args.into_overrides();
        assert!(overrides.port.is_none());
        assert!(overrides.database.is_none());
    }

    #[test]
    fn test_all_arguments() {
        let args = Args::try_parse_from([
            "catalog-server",
            "--port",
            "8000",
            "--bind",
            "0.0.0.0",
            "--database",
            "/tmp/catalog.db",
            "--config",
            "/etc/catalog.toml",
            "--seed",
            "seed.toml",
        ])
        .unwrap();

        let overrides = args.into_overrides();
        assert_eq!(overrides.port, Some(8000));
        assert_eq!(overrides.bind.as_deref(), Some("0.0.0.0"));
        assert_eq!(overrides.database, Some(PathBuf::from("/tmp/catalog.db")));
        assert_eq!(overrides.config, Some(PathBuf::from("/etc/catalog.toml")));
        assert_eq!(overrides.seed, Some(PathBuf::from("seed.toml")));
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Args::try_parse_from(["catalog-server", "--port", "99999"]).is_err());
    }
}
