use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::deutils::{default_false, deserialize_address_text, deserialize_bool_from_anything};
use crate::display::drivers::ht16k33::DEFAULT_ADDRESS;
use crate::pacer::DEFAULT_FRAME_DELAY_MS;

pub const DEFAULT_I2C_BUS: &str = "/dev/i2c-1";

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid address {0:?}: expected 0x-prefixed hex or decimal in 0..=0xFFFF")]
    InvalidAddress(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Parse a bus address written as `0x70`, `0X70` or `112`.
pub fn parse_address(text: &str) -> Result<u16, ConfigError> {
    let trimmed = text.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => trimmed.parse::<u16>(),
    };
    parsed.map_err(|_| ConfigError::InvalidAddress(text.to_string()))
}

/// Attributes of one seg_14_x_4 resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Configuration {
    /// Display address, hex or decimal text; 0x70 when absent
    #[serde(default, deserialize_with = "deserialize_address_text", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Skip the intro banner on construction
    #[serde(default = "default_false", deserialize_with = "deserialize_bool_from_anything")]
    pub skip_intro: bool,
}

impl Configuration {
    /// Validate and return the numeric address.
    pub fn validate(&self) -> Result<u16, ConfigError> {
        match self.address.as_deref() {
            None => Ok(DEFAULT_ADDRESS),
            Some(text) => parse_address(text),
        }
    }
}

/// How the host names a resource and the model that builds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    /// `namespace:family:name` model triple
    pub model: String,
    #[serde(default)]
    pub attributes: Configuration,
}

/// Top-level app configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct Config {
    /// General options
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub i2c_bus: Option<String>,       // e.g., "/dev/i2c-1"
    pub frame_delay_ms: Option<u64>,
    pub brightness: Option<u8>,        // 0-15
    /// use the in-memory display instead of the bus
    pub emulated: Option<bool>,
    pub resources: Option<Vec<ResourceConfig>>,
}

impl Config {
    pub fn i2c_bus(&self) -> &str {
        self.i2c_bus.as_deref().unwrap_or(DEFAULT_I2C_BUS)
    }

    pub fn frame_delay_ms(&self) -> u64 {
        self.frame_delay_ms.unwrap_or(DEFAULT_FRAME_DELAY_MS)
    }

    pub fn emulated(&self) -> bool {
        self.emulated.unwrap_or(false)
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "ht16k33-display", about = "HT16K33 14-segment x 4 display model", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Shorthand for --log-level debug
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub i2c_bus: Option<String>,
    #[arg(long)]
    pub frame_delay_ms: Option<u64>,
    #[arg(long)]
    pub brightness: Option<u8>,
    /// Log display output instead of driving the bus
    #[arg(long, action = ArgAction::SetTrue)]
    pub emulated: bool,
    /// Display address for the default resource when the file lists none
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long, action = ArgAction::SetTrue)]
    pub skip_intro: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<(Config, Cli), ConfigError> {
    let cli = Cli::parse();
    let cfg = load_with(&cli)?;
    Ok((cfg, cli))
}

/// Build the effective config for an already parsed command line.
pub fn load_with(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Pretty YAML of effective config (nice for debugging)
pub fn dump(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/ht16k33-display/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/ht16k33-display/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/ht16k33-display.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["ht16k33-display.yaml", "config.yaml", "config/ht16k33-display.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    if src.i2c_bus.is_some()        { dst.i2c_bus = src.i2c_bus; }
    if src.frame_delay_ms.is_some() { dst.frame_delay_ms = src.frame_delay_ms; }
    if src.brightness.is_some()     { dst.brightness = src.brightness; }
    if src.emulated.is_some()       { dst.emulated = src.emulated; }
    if src.resources.is_some()      { dst.resources = src.resources; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()       { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                     { cfg.log_level = Some("debug".to_string()); }
    if cli.i2c_bus.is_some()         { cfg.i2c_bus = cli.i2c_bus.clone(); }
    if cli.frame_delay_ms.is_some()  { cfg.frame_delay_ms = cli.frame_delay_ms; }
    if cli.brightness.is_some()      { cfg.brightness = cli.brightness; }
    if cli.emulated                  { cfg.emulated = Some(true); }

    // a bare command line still gets one display
    if cfg.resources.as_ref().is_none_or(|r| r.is_empty()) {
        cfg.resources = Some(vec![ResourceConfig {
            name: "display".to_string(),
            model: crate::registry::SEG_14_X_4.to_string(),
            attributes: Configuration {
                address: cli.address.clone(),
                skip_intro: cli.skip_intro,
            },
        }]);
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(ms) = cfg.frame_delay_ms {
        if ms == 0 || ms > 5000 {
            return Err(ConfigError::Validation("frame_delay_ms must be 1..=5000".into()));
        }
    }
    if let Some(b) = cfg.brightness {
        if b > 15 {
            return Err(ConfigError::Validation("brightness must be 0..=15".into()));
        }
    }
    if let Some(resources) = cfg.resources.as_ref() {
        let mut seen = std::collections::HashSet::new();
        for r in resources {
            if r.name.trim().is_empty() {
                return Err(ConfigError::Validation("resource name must not be empty".into()));
            }
            if !seen.insert(r.name.as_str()) {
                return Err(ConfigError::Validation(format!("duplicate resource name: {}", r.name)));
            }
            r.attributes.validate()?;
        }
    }
    Ok(())
}
