use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

// ── Profile ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Base URL of the chat server (the part before `/api/...`)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Optional `Cookie` header forwarded verbatim (e.g. "session=abc123").
    /// The server authenticates by browser session; copy it from a logged-in tab.
    pub cookie: Option<String>,
    /// Optional JSON listing to use instead of `GET /api/directory`.
    /// Relative paths resolve against the working directory.
    pub registry_file: Option<PathBuf>,
    /// Show `hh:mm AM/PM` next to each message. Default: true.
    #[serde(default = "default_show_timestamps")]
    pub show_timestamps: bool,
    /// Canned questions offered in the Ctrl+P palette.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

fn default_endpoint() -> String {
    "http://localhost:5000".to_string()
}

fn default_show_timestamps() -> bool {
    true
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            cookie: None,
            registry_file: None,
            show_timestamps: default_show_timestamps(),
            suggestions: Vec::new(),
        }
    }
}

// ── Config file ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Which profile to use when none is specified
    #[serde(default = "default_profile_name")]
    pub default_profile: String,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

fn default_profile_name() -> String {
    "default".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            default_profile: default_profile_name(),
            profiles: HashMap::new(),
        }
    }
}

impl ConfigFile {
    /// Load from disk, or return a default config if the file doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))
    }

    /// Write a starter config file to disk (only if it doesn't exist).
    pub fn write_default_if_missing() -> Result<PathBuf> {
        let path = config_path();
        write_default_to(&path)?;
        Ok(path)
    }

    /// Resolve the active profile given an optional override name.
    pub fn resolve_profile(&self, name: Option<&str>) -> Option<&Profile> {
        let key = name.unwrap_or(&self.default_profile);
        self.profiles.get(key)
    }

    /// Profile names, sorted, for `--profiles`.
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn write_default_to(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("Failed to write config file at {}", path.display()))?;
    Ok(())
}

// ── Resolved runtime config (after merging file + CLI overrides) ──────────────

/// CLI/env values that take precedence over the profile.
#[derive(Debug, Clone, Default)]
pub struct Overrides<'a> {
    pub profile: Option<&'a str>,
    pub endpoint: Option<&'a str>,
    pub cookie: Option<&'a str>,
    pub registry_file: Option<&'a Path>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub cookie: Option<String>,
    pub registry_file: Option<PathBuf>,
    pub show_timestamps: bool,
    pub suggestions: Vec<String>,
    /// Profile name that was resolved (for display)
    pub profile_name: String,
}

impl ResolvedConfig {
    /// Merge config file profile with CLI overrides.
    /// Priority: CLI args > env vars (handled by clap) > config file profile > built-in defaults
    pub fn resolve(file: &ConfigFile, overrides: &Overrides<'_>) -> Self {
        let profile_name = overrides
            .profile
            .unwrap_or(&file.default_profile)
            .to_string();

        let base = file
            .resolve_profile(overrides.profile)
            .cloned()
            .unwrap_or_default();

        Self {
            endpoint: overrides
                .endpoint
                .map(str::to_string)
                .unwrap_or(base.endpoint),
            cookie: overrides
                .cookie
                .map(str::to_string)
                .or(base.cookie)
                .filter(|c| !c.is_empty()),
            registry_file: overrides
                .registry_file
                .map(Path::to_path_buf)
                .or(base.registry_file),
            show_timestamps: base.show_timestamps,
            suggestions: base.suggestions,
            profile_name,
        }
    }
}

// ── Paths ─────────────────────────────────────────────────────────────────────

pub fn config_path() -> PathBuf {
    dirs_config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("filechat")
        .join("config.toml")
}

/// Where the tracing subscriber writes.
pub fn log_path() -> PathBuf {
    dirs_data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("filechat")
        .join("filechat.log")
}

fn dirs_config_dir() -> Option<PathBuf> {
    // XDG_CONFIG_HOME or ~/.config
    xdg_or_home("XDG_CONFIG_HOME", ".config")
}

fn dirs_data_dir() -> Option<PathBuf> {
    // XDG_DATA_HOME or ~/.local/share
    xdg_or_home("XDG_DATA_HOME", ".local/share")
}

fn xdg_or_home(var: &str, fallback: &str) -> Option<PathBuf> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(fallback))
        })
}

// ── Default config template written on first run ──────────────────────────────

const DEFAULT_CONFIG_TOML: &str = r#"# filechat configuration
# Run `filechat --init` to regenerate this file.

default_profile = "local"

# ── Local development server ─────────────────────────────────────────────────
[profiles.local]
endpoint        = "http://localhost:5000"
show_timestamps = true
suggestions = [
    "Summarize the selected documents",
    "What are the key dates mentioned?",
    "List any action items",
]

# ── Deployed server behind a login ───────────────────────────────────────────
# The server keeps the login in a browser session. Copy the `session` cookie
# from a logged-in browser tab.
# [profiles.work]
# endpoint = "https://files.example.com"
# cookie   = "session=..."

# ── Offline file list ────────────────────────────────────────────────────────
# Load the file pane from a saved `/api/directory` reply instead of asking
# the server on startup.
# [profiles.offline]
# endpoint      = "http://localhost:5000"
# registry_file = "files.json"
"#;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigFile {
        toml::from_str(
            r#"
            default_profile = "local"
            [profiles.local]
            endpoint = "http://localhost:5000"
            suggestions = ["a", "b"]

            [profiles.work]
            endpoint = "https://files.example.com"
            cookie = "session=abc"
            registry_file = "files.json"
            show_timestamps = false
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_default_template_parses() {
        let file: ConfigFile = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(file.default_profile, "local");
        let local = file.resolve_profile(None).unwrap();
        assert_eq!(local.endpoint, "http://localhost:5000");
        assert_eq!(local.suggestions.len(), 3);
    }

    #[test]
    fn test_resolve_uses_default_profile() {
        let cfg = ResolvedConfig::resolve(&sample(), &Overrides::default());
        assert_eq!(cfg.profile_name, "local");
        assert_eq!(cfg.endpoint, "http://localhost:5000");
        assert!(cfg.show_timestamps);
        assert_eq!(cfg.suggestions, vec!["a", "b"]);
        assert!(cfg.cookie.is_none());
    }

    #[test]
    fn test_cli_overrides_profile() {
        let overrides = Overrides {
            profile: Some("work"),
            endpoint: Some("http://127.0.0.1:9000"),
            registry_file: Some(Path::new("other.json")),
            ..Default::default()
        };
        let cfg = ResolvedConfig::resolve(&sample(), &overrides);
        assert_eq!(cfg.endpoint, "http://127.0.0.1:9000");
        assert_eq!(cfg.cookie.as_deref(), Some("session=abc"));
        assert_eq!(cfg.registry_file, Some(PathBuf::from("other.json")));
        assert!(!cfg.show_timestamps);
    }

    #[test]
    fn test_unknown_profile_falls_back_to_defaults() {
        let overrides = Overrides { profile: Some("nope"), ..Default::default() };
        let cfg = ResolvedConfig::resolve(&sample(), &overrides);
        assert_eq!(cfg.profile_name, "nope");
        assert_eq!(cfg.endpoint, "http://localhost:5000");
        assert!(cfg.suggestions.is_empty());
    }

    #[test]
    fn test_empty_cookie_is_dropped() {
        let overrides = Overrides { cookie: Some(""), ..Default::default() };
        let cfg = ResolvedConfig::resolve(&sample(), &overrides);
        assert!(cfg.cookie.is_none());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(file.profiles.is_empty());
        assert_eq!(file.default_profile, "default");
    }

    #[test]
    fn test_write_default_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        write_default_to(&path).unwrap();
        let file = ConfigFile::load_from(&path).unwrap();
        assert_eq!(file.profile_names(), vec!["local"]);

        // Existing files are left alone
        fs::write(&path, "default_profile = \"mine\"\n").unwrap();
        write_default_to(&path).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap().default_profile, "mine");
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "profiles = 3").unwrap();
        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
