//! Command-line interface definition using clap.
//!
//! Every flag except `--config` overrides the matching config file key. The
//! result of parsing is turned into [`Overrides`] and layered on top of the
//! YAML file by [`ConfigFile::resolve`](crate::config::ConfigFile::resolve).

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::{DEFAULT_CONFIG_PATH, Overrides};

/// Harvest the message history of Telegram channels within a date range
/// and save one JSON file per channel.
#[derive(Parser, Debug, Clone)]
#[command(name = "tgharvest")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    tgharvest
    tgharvest --config ./my_config.yaml
    tgharvest --channels @channel1 @channel2 --start-date 2024-01-01 --end-date 2024-01-31
    tgharvest --output-dir ./data --export-dir ./exports

Credentials are read from API_ID, API_HASH and PHONE.")]
pub struct Args {
    /// Path to the YAML config file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Channels to harvest (replaces the config list)
    #[arg(long, value_name = "CHANNEL", num_args = 1.., allow_negative_numbers = true)]
    pub channels: Option<Vec<String>>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub start_date: Option<String>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub end_date: Option<String>,

    /// Directory for the output files
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory holding the channel exports
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Exit with status 2 if any channel failed
    #[arg(long)]
    pub strict: bool,

    /// More log output (repeat for trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Config overrides carried by these arguments.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            channels: self.channels.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            output_dir: self.output_dir.clone(),
            export_dir: self.export_dir.clone(),
        }
    }

    /// Default log directive when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
