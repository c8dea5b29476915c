use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::store::GitIdentity;

pub const CONFIG_ENV: &str = "DOCKET_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocketConfig {
    #[serde(default)]
    pub repo: RepoConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    #[serde(default = "default_repo_path")]
    pub path: PathBuf,
    #[serde(default = "default_git_user_name")]
    pub git_user_name: String,
    #[serde(default = "default_git_user_email")]
    pub git_user_email: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            path: default_repo_path(),
            git_user_name: default_git_user_name(),
            git_user_email: default_git_user_email(),
        }
    }
}

impl RepoConfig {
    #[must_use]
    pub fn identity(&self) -> GitIdentity {
        GitIdentity {
            name: self.git_user_name.clone(),
            email: self.git_user_email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Index database path; relative paths resolve against the repository
    /// root. Defaults to `.git/docket-search.db`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            db_path: None,
        }
    }
}

impl SearchConfig {
    /// Resolved index path for a repository rooted at `repo`.
    #[must_use]
    pub fn resolve_db_path(&self, repo: &Path) -> PathBuf {
        match &self.db_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => repo.join(path),
            None => repo.join(".git").join("docket-search.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_check_interval_hours")]
    pub check_interval_hours: u32,
    #[serde(default = "default_overdue_check_hour")]
    pub overdue_check_hour: u32,
    #[serde(default = "default_summary_hour")]
    pub summary_hour: u32,
    #[serde(default = "default_stale_days")]
    pub stale_days: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            check_interval_hours: default_check_interval_hours(),
            overdue_check_hour: default_overdue_check_hour(),
            summary_hour: default_summary_hour(),
            stale_days: default_stale_days(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub slack_webhook_url: Option<String>,
    #[serde(default)]
    pub discord_webhook_url: Option<String>,
    /// Also notify on assignment and status changes made through `dk`.
    #[serde(default)]
    pub on_change: bool,
}

const fn default_true() -> bool {
    true
}

fn default_repo_path() -> PathBuf {
    PathBuf::from("./docket_repo")
}

fn default_git_user_name() -> String {
    "Docket Bot".to_string()
}

fn default_git_user_email() -> String {
    "bot@docket.local".to_string()
}

const fn default_check_interval_hours() -> u32 {
    24
}

const fn default_overdue_check_hour() -> u32 {
    9
}

const fn default_summary_hour() -> u32 {
    9
}

const fn default_stale_days() -> i64 {
    7
}

/// Config file location: explicit path, else `DOCKET_CONFIG`, else
/// `<config_dir>/docket/config.toml`.
#[must_use]
pub fn config_path(
    explicit: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("docket").join("config.toml"))
}

/// Read a config file; a missing file yields defaults.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_config_file(path: &Path) -> Result<DocketConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(DocketConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<DocketConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the config file and apply environment overrides from the process
/// environment.
///
/// # Errors
///
/// Fails when an existing config file cannot be read or parsed.
pub fn load_config(explicit: Option<&Path>) -> Result<DocketConfig> {
    let lookup = |key: &str| std::env::var(key).ok();
    let mut config = match config_path(explicit, lookup) {
        Some(path) => load_config_file(&path)?,
        None => DocketConfig::default(),
    };
    apply_env_overrides(&mut config, lookup);
    Ok(config)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Overlay `DOCKET_*` environment values onto `config`.
///
/// `env` is the lookup; unparsable numeric or boolean values are ignored
/// with a warning.
pub fn apply_env_overrides(config: &mut DocketConfig, env: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(path) = get("DOCKET_REPO_PATH") {
        config.repo.path = PathBuf::from(path);
    }
    if let Some(name) = get("DOCKET_GIT_USER_NAME") {
        config.repo.git_user_name = name;
    }
    if let Some(email) = get("DOCKET_GIT_USER_EMAIL") {
        config.repo.git_user_email = email;
    }
    if let Some(raw) = get("DOCKET_STALE_DAYS") {
        match raw.trim().parse::<i64>() {
            Ok(days) if days >= 0 => config.scheduler.stale_days = days,
            _ => warn!(value = %raw, "ignoring invalid DOCKET_STALE_DAYS"),
        }
    }
    if let Some(raw) = get("DOCKET_SCHEDULER_ENABLED") {
        match parse_bool(&raw) {
            Some(enabled) => config.scheduler.enabled = enabled,
            None => warn!(value = %raw, "ignoring invalid DOCKET_SCHEDULER_ENABLED"),
        }
    }
    if let Some(url) = get("DOCKET_SLACK_WEBHOOK_URL") {
        config.notify.slack_webhook_url = Some(url);
    }
    if let Some(url) = get("DOCKET_DISCORD_WEBHOOK_URL") {
        config.notify.discord_webhook_url = Some(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = DocketConfig::default();
        assert_eq!(config.scheduler.check_interval_hours, 24);
        assert_eq!(config.scheduler.overdue_check_hour, 9);
        assert_eq!(config.scheduler.summary_hour, 9);
        assert_eq!(config.scheduler.stale_days, 7);
        assert!(config.scheduler.enabled);
        assert!(config.search.enabled);
        assert!(config.notify.slack_webhook_url.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: DocketConfig = toml::from_str(
            r#"
[repo]
path = "/srv/notes"

[scheduler]
stale_days = 14
"#,
        )
        .unwrap();
        assert_eq!(config.repo.path, PathBuf::from("/srv/notes"));
        assert_eq!(config.repo.git_user_name, "Docket Bot");
        assert_eq!(config.scheduler.stale_days, 14);
        assert_eq!(config.scheduler.check_interval_hours, 24);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, DocketConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scheduler\nstale_days = ").unwrap();
        let err = load_config_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = DocketConfig::default();
        apply_env_overrides(
            &mut config,
            lookup(&[
                ("DOCKET_REPO_PATH", "/tmp/repo"),
                ("DOCKET_STALE_DAYS", "3"),
                ("DOCKET_SCHEDULER_ENABLED", "off"),
                ("DOCKET_SLACK_WEBHOOK_URL", "https://hooks.example/slack"),
            ]),
        );
        assert_eq!(config.repo.path, PathBuf::from("/tmp/repo"));
        assert_eq!(config.scheduler.stale_days, 3);
        assert!(!config.scheduler.enabled);
        assert_eq!(
            config.notify.slack_webhook_url.as_deref(),
            Some("https://hooks.example/slack")
        );
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut config = DocketConfig::default();
        apply_env_overrides(
            &mut config,
            lookup(&[("DOCKET_STALE_DAYS", "soon"), ("DOCKET_REPO_PATH", "  ")]),
        );
        assert_eq!(config, DocketConfig::default());
    }

    #[test]
    fn explicit_path_beats_env() {
        let path = config_path(
            Some(Path::new("/etc/docket.toml")),
            lookup(&[(CONFIG_ENV, "/home/x/docket.toml")]),
        );
        assert_eq!(path, Some(PathBuf::from("/etc/docket.toml")));
        let path = config_path(None, lookup(&[(CONFIG_ENV, "/home/x/docket.toml")]));
        assert_eq!(path, Some(PathBuf::from("/home/x/docket.toml")));
    }

    #[test]
    fn search_db_path_resolves_against_repo() {
        let repo = Path::new("/srv/notes");
        let mut search = SearchConfig::default();
        assert_eq!(
            search.resolve_db_path(repo),
            PathBuf::from("/srv/notes/.git/docket-search.db")
        );
        search.db_path = Some(PathBuf::from("index.db"));
        assert_eq!(search.resolve_db_path(repo), PathBuf::from("/srv/notes/index.db"));
    }
}
