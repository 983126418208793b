//! Settings for the host loop and frontend, read from an optional TOML file
//! and overridden from the command line
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::{Chip8Error, Result};
use crate::logger::LogLevel;

pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u32 = 500;
pub const DEFAULT_TIMER_HZ: u32 = 60;
pub const DEFAULT_SCALE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// how many instructions `step` runs per second
    pub instructions_per_second: u32,
    /// how many times per second the delay and sound timers count down
    pub timer_hz: u32,
    /// size of one CHIP-8 pixel in window pixels
    pub scale: usize,
    pub log_level: LogLevel,
    /// 0RGB colour of lit pixels
    pub foreground: u32,
    /// 0RGB colour of unlit pixels
    pub background: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instructions_per_second: DEFAULT_INSTRUCTIONS_PER_SECOND,
            timer_hz: DEFAULT_TIMER_HZ,
            scale: DEFAULT_SCALE,
            log_level: LogLevel::Info,
            foreground: 0xFFFFFF,
            background: 0x000000,
        }
    }
}

impl Config {
    /// Parse a config from TOML. Missing keys take their default value
    pub fn from_toml(path: &Path, contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).map_err(|source| Chip8Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()
    }

    /// Read the config file at `path`, or fall back to the defaults when no
    /// path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents =
                    fs::read_to_string(path).map_err(|source| Chip8Error::ConfigUnreadable {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Config::from_toml(path, &contents)
            }
            None => Ok(Config::default()),
        }
    }

    /// Apply any settings given on the command line on top of this config
    pub fn merge_args(mut self, args: &Args) -> Result<Self> {
        if let Some(scale) = args.scale {
            self.scale = scale;
        }
        if let Some(ips) = args.ips {
            self.instructions_per_second = ips;
        }
        if let Some(level) = args.log_level {
            self.log_level = level;
        }
        self.validate()
    }

    /// Reject settings the host loop cannot run with
    pub(crate) fn validate(self) -> Result<Self> {
        if self.instructions_per_second == 0 {
            return Err(Chip8Error::Setting(
                "instructions_per_second must be above 0".to_string(),
            ));
        }
        if self.timer_hz == 0 {
            return Err(Chip8Error::Setting("timer_hz must be above 0".to_string()));
        }
        if self.scale == 0 {
            return Err(Chip8Error::Setting("scale must be above 0".to_string()));
        }
        Ok(self)
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_secs(1) / self.instructions_per_second
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.timer_hz
    }
}

/// Run a CHIP-8 ROM in a window
#[derive(Debug, Parser)]
#[command(name = "chipotle8", version, about)]
pub struct Args {
    /// Path to the ROM file to run
    pub rom: PathBuf,

    /// TOML file with emulator settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Size of one CHIP-8 pixel in window pixels
    #[arg(short, long)]
    pub scale: Option<usize>,

    /// Instructions executed per second
    #[arg(short, long)]
    pub ips: Option<u32>,

    /// Log verbosity
    #[arg(short, long, value_enum)]
    pub log_level: Option<LogLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_rates() {
        let config = Config::default();
        assert_eq!(config.instructions_per_second, 500);
        assert_eq!(config.timer_hz, 60);
        assert_eq!(config.step_interval(), Duration::from_millis(2));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            Path::new("chipotle8.toml"),
            "instructions_per_second = 700\nlog_level = \"debug\"\n",
        )
        .unwrap();

        assert_eq!(config.instructions_per_second, 700);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.timer_hz, DEFAULT_TIMER_HZ);
        assert_eq!(config.scale, DEFAULT_SCALE);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml(Path::new("chipotle8.toml"), "volume = 11\n").unwrap_err();
        assert!(matches!(err, Chip8Error::Config { .. }));
    }

    #[test]
    fn zero_rates_are_rejected() {
        let err = Config::from_toml(Path::new("chipotle8.toml"), "timer_hz = 0\n").unwrap_err();
        assert!(matches!(err, Chip8Error::Setting(_)));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, Chip8Error::ConfigUnreadable { .. }));
    }

    #[test]
    fn args_override_config() {
        let args = Args::try_parse_from(&["chipotle8", "--ips", "1000", "-s", "4", "pong.ch8"])
            .unwrap();
        assert_eq!(args.rom, PathBuf::from("pong.ch8"));

        let config = Config::default().merge_args(&args).unwrap();
        assert_eq!(config.instructions_per_second, 1000);
        assert_eq!(config.scale, 4);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn args_parse_log_level() {
        let args = Args::try_parse_from(&["chipotle8", "--log-level", "trace", "pong.ch8"]).unwrap();
        assert_eq!(args.log_level, Some(LogLevel::Trace));
    }

    #[test]
    fn args_require_a_rom() {
        assert!(Args::try_parse_from(&["chipotle8"]).is_err());
        assert!(Args::try_parse_from(&["chipotle8", "a.ch8", "b.ch8"]).is_err());
    }
}
