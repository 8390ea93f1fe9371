//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/tsr/config.toml.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use timesheet_rules::{Fingerprint, Rule};
use tracing::debug;

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Number of events `preview` lists when neither the flag nor the config says.
pub const DEFAULT_PREVIEW_LIMIT: usize = 50;

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# tsr - timesheet classification rules

# Config schema version (do not modify)
version = 1

# Output preferences
[output]
# color = true              # Enable colors (respects NO_COLOR env)

# Rule previews
[preview]
# limit = 50

# Explicit rules, tried by priority (high first), then display_order.
# target_type is "project" (with project_id) or "did_not_attend".
#
# [[rules]]
# id = "acme-sync"
# name = "Acme weekly sync"
# query = 'title:"weekly sync" (domain:acme.com OR domain:acme.io)'
# target_type = "project"
# project_id = "acme"
# priority = 10
#
# [[rules]]
# id = "declined"
# query = "response:declined"
# target_type = "did_not_attend"

# Project fingerprints, tried after every explicit rule.
#
# [[fingerprints]]
# project_id = "globex"
# project_name = "Globex"
# domains = ["globex.com"]
# emails = []
# keywords = ["Globex"]
"#;

/// Configuration file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Preview settings.
    #[serde(default)]
    pub preview: PreviewConfig,

    /// Explicit classification rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,

    /// Project fingerprints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fingerprints: Vec<Fingerprint>,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            output: OutputConfig::default(),
            preview: PreviewConfig::default(),
            rules: Vec::new(),
            fingerprints: Vec::new(),
        }
    }
}

impl Config {
    /// The preview limit from the config, or the default.
    pub fn preview_limit(&self) -> usize {
        self.preview.limit.unwrap_or(DEFAULT_PREVIEW_LIMIT)
    }
}

/// Output configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable colors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

/// Preview configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Maximum events listed by `preview`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Gets the config directory path.
/// Uses XDG-style paths: ~/.config/tsr/ on all platforms.
fn get_config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        if !xdg_config.is_empty() {
            return Ok(PathBuf::from(xdg_config).join("tsr"));
        }
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("tsr"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Gets the config file path.
///
/// An explicit path (from `--config` or `TSR_CONFIG`) wins over the
/// default location.
pub fn get_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.toml"))
}

/// Loads the configuration from disk.
///
/// A missing file yields the default configuration.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = get_config_path(explicit)?;

    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    debug!(
        path = %path.display(),
        rules = config.rules.len(),
        fingerprints = config.fingerprints.len(),
        "loaded config"
    );
    migrate_config(config)
}

/// Migrates config to current version if needed.
/// Returns the config as-is if already at current version.
fn migrate_config(mut config: Config) -> Result<Config> {
    // version 1 is the initial schema
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Saves the configuration to disk.
fn save_config(path: &Path, config: &Config) -> Result<()> {
    ensure_parent_dir(path)?;

    let content = toml::to_string_pretty(config)
        .map_err(|e| CommandError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(path, content)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }
    Ok(())
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext, explicit: Option<&Path>) -> Result<()> {
    let config = load_config(explicit)?;
    let path = get_config_path(explicit)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        if path.exists() {
            println!("[output]");
            if let Some(color) = config.output.color {
                println!("  color: {}", color);
            }

            println!("\n[preview]");
            println!("  limit: {}", config.preview_limit());

            println!("\nrules: {}", config.rules.len());
            for rule in &config.rules {
                let state = if rule.enabled { "" } else { " (disabled)" };
                println!(
                    "  {} [{}] {} -> {}{}",
                    rule.id, rule.priority, rule.query, rule.target, state
                );
            }

            println!("\nfingerprints: {}", config.fingerprints.len());
            for fingerprint in &config.fingerprints {
                let name = fingerprint
                    .project_name
                    .as_deref()
                    .unwrap_or(&fingerprint.project_id);
                println!(
                    "  {}: {} domains, {} emails, {} keywords",
                    name,
                    fingerprint.domains.len(),
                    fingerprint.emails.len(),
                    fingerprint.keywords.len()
                );
            }
        } else {
            println!("(No config file exists. Run 'tsr config init' to create one.)");
        }
    }

    Ok(())
}

/// Executes the config init command.
pub fn execute_init(ctx: &CommandContext, explicit: Option<&Path>, force: bool) -> Result<()> {
    let path = get_config_path(explicit)?;

    if path.exists() && !force {
        return Err(CommandError::Config(format!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    ensure_parent_dir(&path)?;
    fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| CommandError::Config(format!("Failed to create config file: {}", e)))?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Created default config at: {}", path.display());
    }

    Ok(())
}

/// Options for the config set command.
pub struct ConfigSetOptions {
    /// Configuration key.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Executes the config set command.
pub fn execute_set(
    ctx: &CommandContext,
    explicit: Option<&Path>,
    opts: &ConfigSetOptions,
) -> Result<()> {
    let mut config = load_config(explicit)?;
    let path = get_config_path(explicit)?;

    apply_setting(&mut config, &opts.key, &opts.value)?;
    save_config(&path, &config)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "key": opts.key,
            "value": opts.value,
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Set {} = {}", opts.key, opts.value);
    }

    Ok(())
}

/// Updates a single `section.field` setting.
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key.split_once('.') {
        Some(("output", "color")) => {
            config.output.color = Some(parse_bool(value)?);
        }
        Some(("preview", "limit")) => {
            let limit = value.parse::<usize>().map_err(|_| {
                CommandError::Config(format!(
                    "Invalid preview.limit value '{}'. Use a non-negative integer",
                    value
                ))
            })?;
            config.preview.limit = Some(limit);
        }
        _ => {
            return Err(CommandError::Config(format!(
                "Unknown config key '{}'. Valid keys: output.color, preview.limit",
                key
            )));
        }
    }
    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext, explicit: Option<&Path>) -> Result<()> {
    let path = get_config_path(explicit)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Parses a boolean value from string.
fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(CommandError::Config(format!(
            "Invalid boolean value '{}'. Use true/false, yes/no, 1/0, or on/off",
            s
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;
    use timesheet_rules::RuleTarget;

    #[test]
    fn test_parse_bool_values() {
        for yes in ["true", "True", "yes", "1", "on"] {
            assert!(parse_bool(yes).unwrap());
        }
        for no in ["false", "FALSE", "no", "0", "off"] {
            assert!(!parse_bool(no).unwrap());
        }
        assert!(parse_bool("maybe").is_err());
        assert!(parse_bool("").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.output.color.is_none());
        assert_eq!(config.preview_limit(), DEFAULT_PREVIEW_LIMIT);
        assert!(config.rules.is_empty());
        assert!(config.fingerprints.is_empty());
    }

    #[test]
    fn test_default_config_file_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
version = 1

[output]
color = false

[preview]
limit = 10

[[rules]]
id = "declined"
query = "response:declined"
target_type = "did_not_attend"
priority = 100

[[rules]]
id = "acme"
query = "domain:acme.com"
target_type = "project"
project_id = "acme"

[[fingerprints]]
project_id = "globex"
domains = ["globex.com"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output.color, Some(false));
        assert_eq!(config.preview_limit(), 10);
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].target, RuleTarget::DidNotAttend);
        assert_eq!(config.rules[1].target, RuleTarget::project("acme"));
        assert_eq!(config.fingerprints[0].domains, vec!["globex.com"]);
    }

    #[test]
    fn test_config_deserialization_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.preview.limit.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.output.color = Some(true);
        config.preview.limit = Some(20);

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("version = 1"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("color = true"));
        assert!(toml_str.contains("limit = 20"));
        assert!(!toml_str.contains("[[rules]]"));
    }

    #[test]
    fn test_migrate_config_sets_current_version() {
        let config = Config {
            version: 0,
            ..Config::default()
        };
        assert_eq!(migrate_config(config).unwrap().version, CONFIG_VERSION);
    }

    #[test]
    fn test_apply_setting() {
        let mut config = Config::default();
        apply_setting(&mut config, "output.color", "off").unwrap();
        apply_setting(&mut config, "preview.limit", "7").unwrap();
        assert_eq!(config.output.color, Some(false));
        assert_eq!(config.preview_limit(), 7);

        assert!(apply_setting(&mut config, "preview.limit", "-1").is_err());
        assert!(apply_setting(&mut config, "token", "x").is_err());
        assert!(apply_setting(&mut config, "output.theme", "dark").is_err());
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = get_config_path(Some(Path::new("/tmp/custom.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
    }

    #[test]
    #[serial]
    fn test_xdg_config_home() {
        let temp_dir = TempDir::new().unwrap();
        let original = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", temp_dir.path());

        let path = get_config_path(None);

        match original {
            Some(val) => env::set_var("XDG_CONFIG_HOME", val),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }

        assert_eq!(path.unwrap(), temp_dir.path().join("tsr").join("config.toml"));
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.toml");
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
    }

    #[test]
    fn test_load_invalid_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "version = [").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(CommandError::Config(_))
        ));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.preview.limit = Some(3);
        config.rules.push(Rule::new("r1", "title:sync", RuleTarget::project("p1")));
        save_config(&path, &config).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.preview_limit(), 3);
        assert_eq!(loaded.rules, config.rules);
    }
}
