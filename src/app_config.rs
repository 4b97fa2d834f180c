//! Configuration file loading for CLI defaults.
//!
//! The file is a flat list of `key = value` lines with `#` comments. Strings
//! are double-quoted, integers are bare.
//!
//! ```toml
//! output_dir = "/data/products"
//! download_timeout_secs = 20
//! max_retries = 5
//! rembg = "/opt/rembg/bin/rembg"  # explicit tool path
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Directory name under the config home.
const APP_DIR: &str = "product-images";

/// File-backed defaults; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Default output directory.
    pub output_dir: Option<PathBuf>,
    /// Per-image request timeout in seconds.
    pub download_timeout_secs: Option<u64>,
    /// Product detail request timeout in seconds.
    pub metadata_timeout_secs: Option<u64>,
    /// Retries per image request.
    pub max_retries: Option<u32>,
    /// Minimum accepted image width.
    pub min_width: Option<u32>,
    /// Minimum accepted image height.
    pub min_height: Option<u32>,
    /// Path or name of the `rembg` executable.
    pub rembg: Option<PathBuf>,
    /// File that receives a copy of the log.
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    /// Validates values against the ranges the CLI accepts.
    pub fn validate(&self) -> Result<()> {
        validate_range("download_timeout_secs", self.download_timeout_secs, 1..=3600)?;
        validate_range("metadata_timeout_secs", self.metadata_timeout_secs, 1..=3600)?;
        validate_range("max_retries", self.max_retries.map(u64::from), 0..=10)?;
        validate_range("min_width", self.min_width.map(u64::from), 1..=20_000)?;
        validate_range("min_height", self.min_height.map(u64::from), 1..=20_000)?;
        Ok(())
    }
}

fn validate_range(
    field: &str,
    value: Option<u64>,
    range: std::ops::RangeInclusive<u64>,
) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !range.contains(&value) {
        bail!(
            "Invalid config value for `{field}`: {value}. Expected range: {}..={}",
            range.start(),
            range.end()
        );
    }
    Ok(())
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/product-images/config.toml`
/// 2. `$HOME/.config/product-images/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config from the default path, if one exists.
pub fn load_default_file_config() -> Result<Option<FileConfig>> {
    match resolve_default_config_path() {
        Some(path) if path.exists() => load_file_config(&path).map(Some),
        _ => Ok(None),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "output_dir" => {
                cfg.output_dir = Some(parse_string_literal(value).with_context(context)?.into());
            }
            "download_timeout_secs" => {
                cfg.download_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "metadata_timeout_secs" => {
                cfg.metadata_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "max_retries" => {
                cfg.max_retries = Some(parse_integer_u32(value).with_context(context)?);
            }
            "min_width" => {
                cfg.min_width = Some(parse_integer_u32(value).with_context(context)?);
            }
            "min_height" => {
                cfg.min_height = Some(parse_integer_u32(value).with_context(context)?);
            }
            "rembg" => {
                cfg.rembg = Some(parse_string_literal(value).with_context(context)?.into());
            }
            "log_file" => {
                cfg.log_file = Some(parse_string_literal(value).with_context(context)?.into());
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    let inner = &raw_value[1..raw_value.len() - 1];
    if inner.trim().is_empty() {
        bail!("Expected non-empty string");
    }
    Ok(inner.to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_integer_u32(raw_value: &str) -> Result<u32> {
    let value = parse_integer_u64(raw_value)?;
    u32::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u32"))
}
