//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.screen-router/router.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.
//! The same file carries the screen registry as `[[screens]]` tables.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::registry::{Registry, ScreenConfig};
use crate::transition::{TransitionConfig, TransitionKind};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RouterFileConfig {
    #[serde(default)]
    pub router: RouterSection,
    #[serde(default)]
    pub screens: Vec<ScreenConfig>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RouterSection {
    pub home: Option<String>,
    pub transition: Option<TransitionConfig>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_HOME_SCREEN: &str = "Home";
pub const CONFIG_DIR: &str = ".screen-router";
pub const CONFIG_FILE: &str = "router.toml";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub home: String,
    pub transition: TransitionConfig,
    pub screens: Vec<ScreenConfig>,
}

impl ResolvedConfig {
    /// Loads the screen entries into a validated registry.
    pub fn registry(&self) -> Registry {
        Registry::load(self.screens.clone())
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.screen-router/router.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load config from `~/.screen-router/router.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `RouterFileConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<RouterFileConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(RouterFileConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(RouterFileConfig::default());
    }

    load_config_from(&path)
}

/// Load config from an explicit path. A missing file is an error here.
pub fn load_config_from(path: &Path) -> Result<RouterFileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: RouterFileConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!(
        "Loaded config from {} ({} screen(s))",
        path.display(),
        config.screens.len()
    );
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Screen Router Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [router]
# home = "Home"                     # Or set SCREEN_ROUTER_HOME env var

# [router.transition]               # Default for screens without their own
# kind = "fade"                     # "fade", "slide", "scale", "combo", "instant", "custom"
# enter_ms = 300
# exit_ms = 200
# enter_ease = "out-quad"           # "linear", "in-quad", "out-quad", "in-out-quad",
# exit_ease = "in-quad"             # "out-cubic", "in-back", "out-back"
# slide_from = [1.0, 0.0]           # Viewport fractions; [1, 0] enters from the right
# scale_from = 0.8

# [[screens]]
# id = "Home"
# factory = "home"
# cache_after_first_use = true

# [[screens]]
# id = "Settings"
# factory = "settings"
# transition = { kind = "slide", slide_from = [0.0, 1.0] }

# [[screens]]
# id = "AudioTab"
# factory = "tab"
# parent_id = "Settings"
# parent_slot = "content"
# persistent = true

# [[screens]]
# id = "Toast"
# factory = "toast"
# overlay = true
# destroy_on_deactivate = true
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_home` is from the CLI flag (None = not specified).
pub fn resolve(config: &RouterFileConfig, cli_home: Option<&str>) -> ResolvedConfig {
    resolve_with(config, cli_home, |key| std::env::var(key).ok())
}

/// [`resolve`] with an explicit environment lookup.
pub fn resolve_with(
    config: &RouterFileConfig,
    cli_home: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Home: CLI → env → config → first root screen → default
    let home = cli_home
        .map(|s| s.to_string())
        .or_else(|| env("SCREEN_ROUTER_HOME"))
        .or_else(|| config.router.home.clone())
        .or_else(|| {
            config
                .screens
                .iter()
                .find(|s| s.parent_id.is_none() && !s.id.is_empty())
                .map(|s| s.id.clone())
        })
        .unwrap_or_else(|| DEFAULT_HOME_SCREEN.to_string());

    // Transition: config section, with the kind overridable from env
    let mut transition = config.router.transition.clone().unwrap_or_default();
    if let Some(kind) = env("SCREEN_ROUTER_TRANSITION") {
        match parse_kind(&kind) {
            Some(kind) => transition.kind = kind,
            None => warn!("Ignoring unknown SCREEN_ROUTER_TRANSITION '{}'", kind),
        }
    }

    ResolvedConfig {
        home,
        transition,
        screens: config.screens.clone(),
    }
}

fn parse_kind(raw: &str) -> Option<TransitionKind> {
    #[derive(Deserialize)]
    struct Wrapper {
        kind: TransitionKind,
    }
    let raw = raw.trim().to_lowercase();
    toml::from_str::<Wrapper>(&format!("kind = \"{raw}\""))
        .ok()
        .map(|w| w.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::Ease;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config_parses() {
        let config = RouterFileConfig::default();
        assert!(config.screens.is_empty());
        assert!(config.router.home.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with(&RouterFileConfig::default(), None, no_env);
        assert_eq!(resolved.home, DEFAULT_HOME_SCREEN);
        assert_eq!(resolved.transition, TransitionConfig::default());
        assert!(resolved.registry().is_empty());
    }

    #[test]
    fn test_resolve_home_falls_back_to_first_root() {
        let config = RouterFileConfig {
            screens: vec![
                ScreenConfig::new("Tab", "tab").with_parent("Main"),
                ScreenConfig::new("Main", "main"),
            ],
            ..Default::default()
        };
        assert_eq!(resolve_with(&config, None, no_env).home, "Main");
    }

    #[test]
    fn test_resolve_override_order() {
        let config = RouterFileConfig {
            router: RouterSection {
                home: Some("FromFile".to_string()),
                transition: None,
            },
            ..Default::default()
        };
        let env = |key: &str| (key == "SCREEN_ROUTER_HOME").then(|| "FromEnv".to_string());

        assert_eq!(resolve_with(&config, None, no_env).home, "FromFile");
        assert_eq!(resolve_with(&config, None, env).home, "FromEnv");
        assert_eq!(resolve_with(&config, Some("FromCli"), env).home, "FromCli");
    }

    #[test]
    fn test_env_transition_kind_overrides_file() {
        let config = RouterFileConfig {
            router: RouterSection {
                home: None,
                transition: Some(TransitionConfig::fade().with_durations(100, 50)),
            },
            ..Default::default()
        };
        let env = |key: &str| (key == "SCREEN_ROUTER_TRANSITION").then(|| "Slide".to_string());
        let resolved = resolve_with(&config, None, env);
        assert_eq!(resolved.transition.kind, TransitionKind::Slide);
        assert_eq!(resolved.transition.enter_ms, 100);

        let bogus = |key: &str| (key == "SCREEN_ROUTER_TRANSITION").then(|| "warp".to_string());
        assert_eq!(
            resolve_with(&config, None, bogus).transition.kind,
            TransitionKind::Fade
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[router]
home = "Lobby"

[router.transition]
kind = "scale"
enter_ease = "out-back"

[[screens]]
id = "Lobby"
factory = "lobby"
cache_after_first_use = true

[[screens]]
id = "Audio"
factory = "tab"
parent_id = "Settings"
parent_slot = "content"
persistent = true

[[screens]]
id = "Settings"
factory = "settings"
parent_id = ""
transition = { kind = "slide", slide_from = [0.0, 1.0] }
"#;
        let config: RouterFileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.router.home.as_deref(), Some("Lobby"));
        let transition = config.router.transition.as_ref().unwrap();
        assert_eq!(transition.kind, TransitionKind::Scale);
        assert_eq!(transition.enter_ease, Ease::OutBack);
        assert_eq!(config.screens.len(), 3);
        assert_eq!(config.screens[1].parent_id.as_deref(), Some("Settings"));
        assert_eq!(config.screens[1].parent_slot.as_deref(), Some("content"));
        assert_eq!(config.screens[2].parent_id, None);
        assert_eq!(
            config.screens[2].transition.as_ref().map(|t| t.slide_from),
            Some([0.0, 1.0])
        );

        let registry = resolve_with(&config, None, no_env).registry();
        assert_eq!(
            registry.hierarchy_path("Audio").unwrap(),
            vec!["Settings".to_string(), "Audio".to_string()]
        );
    }

    #[test]
    fn test_sparse_toml_parses() {
        // Only override one thing, everything else stays default
        let toml_str = r#"
[router]
home = "Start"
"#;
        let config: RouterFileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.router.home.as_deref(), Some("Start"));
        assert!(config.router.transition.is_none());
        assert!(config.screens.is_empty());
    }

    #[test]
    fn test_load_config_from_missing_path_is_io_error() {
        let err = load_config_from(Path::new("/definitely/not/here/router.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
