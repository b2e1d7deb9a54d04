//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use iptmon_core::config::Config;
use iptmon_core::sample_log::LogFormat;
use iptmon_core::schedule::TickPolicy;
use iptmon_core::telemetry;

mod commands;

#[derive(Parser)]
#[command(name = "iptmon")]
#[command(version)]
#[command(about = "Monitor iptables rule counters by index")]
#[command(subcommand_negates_reqs = true)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    watch: WatchArgs,
}

/// Options for the live monitor (the default command).
#[derive(clap::Args, Debug, Clone, Default)]
pub struct WatchArgs {
    /// Name of the iptables chain (default: INPUT)
    #[arg(short, long)]
    pub chain: Option<String>,

    /// Rule number (index) in the chain to monitor
    #[arg(
        short,
        long,
        required_unless_present = "list",
        allow_negative_numbers = true
    )]
    pub number: Option<i64>,

    /// Refresh interval in seconds (default: 1.0)
    #[arg(short, long, value_name = "SECS", allow_negative_numbers = true)]
    pub refresh: Option<f64>,

    /// Append one row per sample to this file
    #[arg(short, long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Sample log format
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub log_format: Option<LogFormatArg>,

    /// Overwrite an existing log file without asking
    #[arg(short, long)]
    pub force: bool,

    /// Table to list rules from (passed as `-t`)
    #[arg(short, long)]
    pub table: Option<String>,

    /// Program used to list rules
    #[arg(long, value_name = "PROGRAM", env = "IPTMON_IPTABLES")]
    pub iptables: Option<String>,

    /// Sleep until the next refresh boundary instead of a full period after each sample
    #[arg(long)]
    pub fixed_rate: bool,

    /// Print the numbered counter rules of the chain and exit
    #[arg(long)]
    pub list: bool,
}

impl WatchArgs {
    /// Layers command-line overrides on top of the loaded config.
    pub fn apply_to(&self, mut config: Config) -> Config {
        if let Some(chain) = &self.chain {
            config.chain.clone_from(chain);
        }
        if let Some(refresh) = self.refresh {
            config.refresh_secs = refresh;
        }
        if let Some(table) = &self.table {
            config.table = Some(table.clone());
        }
        if let Some(program) = &self.iptables {
            config.iptables.clone_from(program);
        }
        if self.fixed_rate {
            config.schedule = TickPolicy::FixedRate;
        }
        if let Some(format) = self.log_format {
            config.log_format = format.into();
        }
        config
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum LogFormatArg {
    Csv,
    Jsonl,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Csv => LogFormat::Csv,
            LogFormatArg::Jsonl => LogFormat::Jsonl,
        }
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let _telemetry = telemetry::init();

    match cli.command {
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Init => commands::config::init(),
        },
        None => {
            let config = Config::load().context("load config")?;
            let config = cli.watch.apply_to(config);
            if cli.watch.list {
                commands::list::run(&config)
            } else {
                commands::watch::run(&cli.watch, &config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = Cli::try_parse_from([
            "iptmon",
            "-c",
            "FORWARD",
            "-n",
            "2",
            "-r",
            "0.5",
            "--iptables",
            "ip6tables",
            "--fixed-rate",
            "--log-format",
            "jsonl",
        ])
        .unwrap();

        let config = cli.watch.apply_to(Config::default());

        assert_eq!(cli.watch.number, Some(2));
        assert_eq!(config.chain, "FORWARD");
        assert!((config.refresh_secs - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.iptables, "ip6tables");
        assert_eq!(config.schedule, TickPolicy::FixedRate);
        assert_eq!(config.log_format, LogFormat::Jsonl);
    }

    #[test]
    fn test_number_is_required_without_list() {
        assert!(Cli::try_parse_from(["iptmon"]).is_err());
        assert!(Cli::try_parse_from(["iptmon", "--list"]).is_ok());
        assert!(Cli::try_parse_from(["iptmon", "config", "path"]).is_ok());
    }

    #[test]
    fn test_negative_values_reach_validation() {
        let cli = Cli::try_parse_from(["iptmon", "-n", "-1", "-r", "-2"]).unwrap();
        assert_eq!(cli.watch.number, Some(-1));
        assert_eq!(cli.watch.refresh, Some(-2.0));
    }
}
