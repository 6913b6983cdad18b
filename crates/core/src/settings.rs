use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

/// User preferences read from `settings.toml`.
///
/// `keys` maps an action name (`"move_down"`, `"toggle"`, ...) to the key
/// strings bound to it; actions left out keep their default bindings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct Settings {
    #[serde(default)]
    pub theme: ThemeName,
    #[serde(default)]
    pub keys: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Settings {
    pub fn load_from_dir(dir: &Path) -> Result<Self, SettingsError> {
        let path = dir.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(&raw).map_err(|source| SettingsError::Parse { path, source })
    }
}

/// `$DBNAV_CONFIG_DIR`, else the platform config dir joined with `dbnav`.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    if let Some(custom) = env::var_os("DBNAV_CONFIG_DIR") {
        return Some(PathBuf::from(custom));
    }

    let base_dir = if cfg!(target_os = "windows") {
        env::var_os("APPDATA").map(PathBuf::from)?
    } else if let Some(xdg_config_home) = env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config_home)
    } else {
        PathBuf::from(env::var_os("HOME")?).join(".config")
    };

    Some(base_dir.join("dbnav"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{Settings, SettingsError, ThemeName};

    #[test]
    fn missing_or_empty_file_yields_defaults() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let settings = Settings::load_from_dir(temp_dir.path()).expect("defaults should load");
        assert_eq!(settings, Settings::default());

        fs::write(temp_dir.path().join("settings.toml"), "  \n").expect("write settings");
        let settings = Settings::load_from_dir(temp_dir.path()).expect("defaults should load");
        assert_eq!(settings.theme, ThemeName::Dark);
    }

    #[test]
    fn parses_theme_and_key_overrides() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        fs::write(
            temp_dir.path().join("settings.toml"),
            r#"
theme = "light"

[keys]
move_down = ["j", "ctrl+n"]
search = ["ctrl+f"]
"#,
        )
        .expect("write settings");

        let settings = Settings::load_from_dir(temp_dir.path()).expect("settings should parse");
        assert_eq!(settings.theme, ThemeName::Light);
        assert_eq!(
            settings.keys.get("move_down"),
            Some(&vec!["j".to_string(), "ctrl+n".to_string()])
        );
        assert_eq!(settings.keys.len(), 2);
    }

    #[test]
    fn unknown_theme_is_a_parse_error() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        fs::write(temp_dir.path().join("settings.toml"), "theme = \"neon\"")
            .expect("write settings");

        let err = Settings::load_from_dir(temp_dir.path()).expect_err("parse should fail");
        assert!(matches!(err, SettingsError::Parse { .. }));
    }
}
