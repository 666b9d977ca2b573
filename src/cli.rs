use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::RelicwatchConfig;

#[derive(Parser)]
#[command(name = "relicwatch")]
#[command(version = "0.1.0")]
#[command(about = "Undying Retribution cooldown watcher for the RelicRSPS chat log")]
#[command(
    long_about = "Relicwatch tails the game chat log and shows a 3-minute countdown whenever \
the Undying Retribution Relic fires, resetting early when the relic announces it is ready again. \
The log path is discovered from the Chat Logger plugin's folders or given explicitly."
)]
pub struct Cli {
    /// Log file to tail directly, bypassing user folder discovery
    #[arg(value_name = "PATH", help = "Path to the chat log to tail")]
    pub path: Option<PathBuf>,

    /// User folder to watch under ~/.relicrsps/chatlogs
    #[arg(short, long, help = "User folder name (as shown by --list-users)")]
    pub user: Option<String>,

    /// List discovered user folders and exit
    #[arg(long, help = "List user folders under the chat log directory")]
    pub list_users: bool,

    /// Output format
    #[arg(short, long, default_value = "tui", help = "Output format")]
    pub output: OutputFormat,

    /// Countdown duration in seconds
    #[arg(long, help = "Override the countdown duration in seconds")]
    pub duration_secs: Option<u32>,

    /// Poll interval in milliseconds when no new line is available
    #[arg(long, help = "Override the tail poll interval in ms")]
    pub poll_interval_ms: Option<u64>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE", help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Disable colors in output
    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Terminal user interface (default)
    Tui,
    /// Timestamped lines on stdout
    Text,
    /// JSON lines for scripting
    Json,
}

impl Cli {
    /// Assemble the effective config: file/env layer first, CLI flags last.
    pub fn build_config(&self) -> anyhow::Result<RelicwatchConfig> {
        let mut config = match &self.config {
            Some(path) => RelicwatchConfig::load(path)?,
            None => RelicwatchConfig::from_env(),
        };

        if let Some(secs) = self.duration_secs {
            config.countdown.duration_secs = secs;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.tailer.poll_interval_ms = ms;
        }

        Ok(config)
    }

    pub fn setup_logging(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }

    pub fn validate(&self, config: &RelicwatchConfig) -> Result<(), String> {
        if self.path.is_some() && self.user.is_some() {
            return Err("give either a log PATH or --user, not both".to_string());
        }

        if let Some(path) = &self.path {
            if !path.exists() {
                return Err(format!("Path does not exist: {}", path.display()));
            }
            if !path.is_file() {
                return Err(format!("Path is not a file: {}", path.display()));
            }
        }

        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_and_user_together() {
        let cli = Cli::parse_from(["relicwatch", "some.log", "--user", "alice"]);
        let config = RelicwatchConfig::default();
        assert!(cli.validate(&config).is_err());
    }

    #[test]
    fn flags_override_config_layer() {
        let cli = Cli::parse_from([
            "relicwatch",
            "--duration-secs",
            "60",
            "--poll-interval-ms",
            "50",
        ]);
        let config = cli.build_config().unwrap();
        assert_eq!(config.countdown.duration_secs, 60);
        assert_eq!(config.tailer.poll_interval_ms, 50);
    }
}
