use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Subcommand};
use docket_core::config::{DocketConfig, config_path, load_config_file};
use std::path::{Path, PathBuf};
use toml::Value;

use crate::app::App;
use crate::output::OutputMode;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Show the effective configuration (file, env and flags merged)
    Show(ShowArgs),
    /// Print the config file location
    Path,
    /// Set a key in the config file
    Set(SetArgs),
    /// Remove a key from the config file
    Unset(UnsetArgs),
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Show the raw file instead of the effective values
    #[arg(long)]
    raw: bool,

    /// Print webhook URLs unmasked
    #[arg(long)]
    reveal: bool,
}

#[derive(Args, Debug)]
struct SetArgs {
    /// Dot path key (e.g. scheduler.stale_days, notify.on_change)
    key: String,

    /// New value
    value: String,
}

#[derive(Args, Debug)]
struct UnsetArgs {
    /// Dot path key
    key: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Text,
    Bool,
    Int,
}

const KNOWN_KEYS: &[(&str, &str, Kind)] = &[
    ("repo", "path", Kind::Text),
    ("repo", "git_user_name", Kind::Text),
    ("repo", "git_user_email", Kind::Text),
    ("search", "enabled", Kind::Bool),
    ("search", "db_path", Kind::Text),
    ("scheduler", "enabled", Kind::Bool),
    ("scheduler", "check_interval_hours", Kind::Int),
    ("scheduler", "overdue_check_hour", Kind::Int),
    ("scheduler", "summary_hour", Kind::Int),
    ("scheduler", "stale_days", Kind::Int),
    ("notify", "slack_webhook_url", Kind::Text),
    ("notify", "discord_webhook_url", Kind::Text),
    ("notify", "on_change", Kind::Bool),
];

pub fn run_config(args: &ConfigArgs, explicit: Option<&Path>, app: &App) -> Result<()> {
    match &args.command {
        ConfigCommand::Show(show) => run_show(show, explicit, app),
        ConfigCommand::Path => {
            let path = file_path(explicit)?;
            print_value(&Value::String(path.display().to_string()), app.output);
            Ok(())
        }
        ConfigCommand::Set(set) => {
            let path = file_path(explicit)?;
            let mut value = load_toml_table(&path)?;
            apply_set(&mut value, &set.key, &set.value)?;
            write_toml_table(&path, &value)?;
            render_mutation(app.output, "set", &set.key, &path)
        }
        ConfigCommand::Unset(unset) => {
            let path = file_path(explicit)?;
            let mut value = load_toml_table(&path)?;
            apply_unset(&mut value, &unset.key)?;
            write_toml_table(&path, &value)?;
            render_mutation(app.output, "unset", &unset.key, &path)
        }
    }
}

fn file_path(explicit: Option<&Path>) -> Result<PathBuf> {
    config_path(explicit, |key| std::env::var(key).ok())
        .ok_or_else(|| anyhow!("Unable to resolve the config file location"))
}

fn run_show(args: &ShowArgs, explicit: Option<&Path>, app: &App) -> Result<()> {
    let mut value = if args.raw {
        let path = file_path(explicit)?;
        // Parse through the typed config first so errors name the bad field.
        load_config_file(&path)?;
        load_toml_table(&path)?
    } else {
        Value::try_from(&app.config).context("Failed to serialize effective config")?
    };
    if !args.reveal {
        mask_secrets(&mut value);
    }
    print_value(&value, app.output);
    Ok(())
}

fn mask_secrets(root: &mut Value) {
    let Some(notify) = root.get_mut("notify").and_then(Value::as_table_mut) else {
        return;
    };
    for key in ["slack_webhook_url", "discord_webhook_url"] {
        if let Some(Value::String(url)) = notify.get_mut(key)
            && !url.is_empty()
        {
            *url = "********".to_string();
        }
    }
}

fn known_key(key: &str) -> Result<(&str, &str, Kind)> {
    let (section, leaf) = key
        .split_once('.')
        .ok_or_else(|| anyhow!("Key must use section.key format"))?;
    KNOWN_KEYS
        .iter()
        .find(|(s, l, _)| *s == section && *l == leaf)
        .map(|&(_, _, kind)| (section, leaf, kind))
        .ok_or_else(|| anyhow!("Unsupported key `{key}`"))
}

fn parse_value(key: &str, kind: Kind, raw: &str) -> Result<Value> {
    match kind {
        Kind::Text => Ok(Value::String(raw.to_string())),
        Kind::Bool => {
            let value: bool = raw
                .parse()
                .with_context(|| format!("{key} expects true or false"))?;
            Ok(Value::Boolean(value))
        }
        Kind::Int => {
            let value: i64 = raw
                .parse()
                .with_context(|| format!("{key} expects a whole number"))?;
            if value < 0 {
                bail!("{key} must not be negative");
            }
            Ok(Value::Integer(value))
        }
    }
}

fn apply_set(root: &mut Value, key: &str, raw: &str) -> Result<()> {
    let (section, leaf, kind) = known_key(key)?;
    let parsed = parse_value(key, kind, raw)?;
    let table = root
        .as_table_mut()
        .ok_or_else(|| anyhow!("Config root must be a TOML table"))?;

    let section_table = table
        .entry(section.to_string())
        .or_insert_with(|| Value::Table(toml::map::Map::new()))
        .as_table_mut()
        .ok_or_else(|| anyhow!("Section {section} must be a TOML table"))?;

    section_table.insert(leaf.to_string(), parsed);

    // The whole file must still deserialize.
    root.clone()
        .try_into::<DocketConfig>()
        .with_context(|| format!("Invalid value for {key}"))?;
    Ok(())
}

fn apply_unset(root: &mut Value, key: &str) -> Result<()> {
    let (section, leaf, _) = known_key(key)?;
    let table = root
        .as_table_mut()
        .ok_or_else(|| anyhow!("Config root must be a TOML table"))?;

    let emptied = match table.get_mut(section).and_then(Value::as_table_mut) {
        Some(section_table) => {
            section_table.remove(leaf);
            section_table.is_empty()
        }
        None => false,
    };
    if emptied {
        table.remove(section);
    }
    Ok(())
}

fn load_toml_table(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(Value::Table(toml::map::Map::new()));
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let value: Value =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

    if !value.is_table() {
        bail!("{} must contain a top-level TOML table", path.display());
    }

    Ok(value)
}

fn write_toml_table(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let serialized = toml::to_string_pretty(value)?;
    std::fs::write(path, serialized).with_context(|| format!("Failed to write {}", path.display()))
}

fn print_value(value: &Value, output: OutputMode) {
    match output {
        OutputMode::Json => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(_) => println!("{{}}"),
        },
        OutputMode::Text | OutputMode::Pretty => match value {
            Value::String(s) => println!("{s}"),
            other => println!("{}", toml::to_string_pretty(other).unwrap_or_default()),
        },
    }
}

fn render_mutation(output: OutputMode, action: &str, key: &str, path: &Path) -> Result<()> {
    match output {
        OutputMode::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "ok": true,
                    "action": action,
                    "key": key,
                    "path": path.display().to_string(),
                }))?
            );
        }
        OutputMode::Text => {
            println!("ok=true action={action} key={key}");
        }
        OutputMode::Pretty => {
            println!("✓ {action} {key} in {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> Value {
        Value::Table(toml::map::Map::new())
    }

    #[test]
    fn set_creates_section_and_types_value() {
        let mut root = empty();
        apply_set(&mut root, "scheduler.stale_days", "14").unwrap();
        apply_set(&mut root, "notify.on_change", "true").unwrap();
        assert_eq!(root["scheduler"]["stale_days"], Value::Integer(14));
        assert_eq!(root["notify"]["on_change"], Value::Boolean(true));
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut root = empty();
        assert!(apply_set(&mut root, "scheduler.cron", "x").is_err());
        assert!(apply_set(&mut root, "stale_days", "3").is_err());
        assert!(apply_set(&mut root, "search.enabled", "maybe").is_err());
        assert!(apply_set(&mut root, "scheduler.summary_hour", "-1").is_err());
    }

    #[test]
    fn unset_drops_empty_sections() {
        let mut root = empty();
        apply_set(&mut root, "repo.git_user_name", "Ana").unwrap();
        apply_unset(&mut root, "repo.git_user_name").unwrap();
        assert!(root.get("repo").is_none());
    }

    #[test]
    fn secrets_are_masked() {
        let mut root = Value::try_from(&DocketConfig::default()).unwrap();
        apply_set(&mut root, "notify.slack_webhook_url", "https://hooks.example/x").unwrap();
        mask_secrets(&mut root);
        assert_eq!(root["notify"]["slack_webhook_url"].as_str(), Some("********"));
    }

    #[test]
    fn files_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut root = load_toml_table(&path).unwrap();
        apply_set(&mut root, "search.enabled", "false").unwrap();
        write_toml_table(&path, &root).unwrap();
        let config = load_config_file(&path).unwrap();
        assert!(!config.search.enabled);
    }
}
