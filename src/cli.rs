//! Command-line interface definition for FinTrip
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for signing in and out, chatting with the travel
//! assistant and checking the weather at a destination.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FinTrip - travel planning from the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "fintrip")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the backend base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Override the directory holding client storage
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for FinTrip
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in to FinTrip
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "FINTRIP_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Chat with the travel assistant
    Chat {
        /// Send a single message instead of starting an interactive session
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Show the forecast for a place
    Weather {
        /// Place name, e.g. "Hanoi"
        place: String,

        /// Day to forecast (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        date: Option<chrono::NaiveDate>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The invocation as the user would re-type it, used as the "location"
    /// to come back to after a forced re-login.
    pub fn location(&self) -> String {
        match &self.command {
            Commands::Login { email, .. } => format!("fintrip login --email {}", email),
            Commands::Logout => "fintrip logout".to_string(),
            Commands::Whoami => "fintrip whoami".to_string(),
            Commands::Chat { message: None } => "fintrip chat".to_string(),
            Commands::Chat { message: Some(m) } => format!("fintrip chat --message {:?}", m),
            Commands::Weather { place, date: None } => format!("fintrip weather {:?}", place),
            Commands::Weather {
                place,
                date: Some(d),
            } => format!("fintrip weather {:?} --date {}", place, d),
        }
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            api_url: None,
            storage_dir: None,
            command: Commands::Whoami,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Whoami));
    }

    #[test]
    fn test_parse_login() {
        let cli = Cli::try_parse_from([
            "fintrip",
            "login",
            "--email",
            "a@b.com",
            "--password",
            "x",
        ])
        .unwrap();
        match cli.command {
            Commands::Login { email, password } => {
                assert_eq!(email, "a@b.com");
                assert_eq!(password, "x");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_weather_with_date_and_global_flags() {
        let cli = Cli::try_parse_from([
            "fintrip",
            "weather",
            "Hanoi",
            "--date",
            "2024-05-01",
            "--api-url",
            "http://localhost:9999/api",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9999/api"));
        match &cli.command {
            Commands::Weather { place, date } => {
                assert_eq!(place, "Hanoi");
                assert_eq!(date.unwrap().to_string(), "2024-05-01");
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.location(), "fintrip weather \"Hanoi\" --date 2024-05-01");
    }

    #[test]
    fn test_parse_invalid_date_fails() {
        let result = Cli::try_parse_from(["fintrip", "weather", "Hanoi", "--date", "tomorrow"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_location_for_chat() {
        let cli = Cli {
            command: Commands::Chat { message: None },
            ..Cli::default()
        };
        assert_eq!(cli.location(), "fintrip chat");
    }
}
