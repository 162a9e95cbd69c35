use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

pub mod commands;

use commands::{hash_password, init_database, serve};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "findash")]
#[command(about = "Financial dashboard API with CLI tools and web server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Database URL
        ///
        /// For SQLite databases, use:
        ///   - sqlite://financial.db (relative path, created if absent)
        ///   - sqlite:///absolute/path/to/financial.db
        #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite://financial.db")]
        database_url: String,

        /// Bind address for the web server
        ///
        /// Format: IP:PORT (e.g., 0.0.0.0:3000, 127.0.0.1:8080)
        #[arg(short, long, env = "BIND_ADDRESS", default_value = "0.0.0.0:3000")]
        bind_address: String,

        /// YAML credential file, re-read on every login attempt
        #[arg(short, long, env = "USERS_FILE", default_value = "users.yaml")]
        users_file: PathBuf,

        /// Idle session lifetime in seconds
        #[arg(long, env = "SESSION_TTL_SECS", default_value_t = 86400)]
        session_ttl_secs: u64,
    },
    /// Initialize the database and backfill missing seed tables
    ///
    /// Safe to re-run: tables that already exist are never altered.
    InitDb {
        /// Database URL
        #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite://financial.db")]
        database_url: String,
    },
    /// Hash a password into a PHC string for the credential file
    HashPassword {
        /// Password to hash
        password: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve {
                database_url,
                bind_address,
                users_file,
                session_ttl_secs,
            } => {
                let config = AppConfig {
                    database_url,
                    users_file,
                    session_ttl: Duration::from_secs(session_ttl_secs),
                };
                serve(&config, &bind_address).await?;
            }
            Commands::InitDb { database_url } => {
                init_database(&database_url).await?;
            }
            Commands::HashPassword { password } => {
                hash_password(&password)?;
            }
        }
        Ok(())
    }
}
