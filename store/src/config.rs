//! Project configuration loaded from `project.toml`.

use std::path::Path;

use relic_core::Game;
use serde::Deserialize;

use crate::error::{StoreError, StoreResult};

/// Name of the configuration file at a project root.
pub const PROJECT_FILE: &str = "project.toml";

/// Top-level project configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectInfo,
    #[serde(default)]
    pub store: StoreConfig,
}

/// General project information.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    /// Four-character game id, e.g. `"MPRM"`.
    #[serde(default)]
    pub game: Game,
}

/// File layout of the resource store, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database: String,
    pub cache_file: String,
    pub raw_dir: String,
    pub cooked_dir: String,
    /// Directory searched for cooked files of unregistered ids.
    pub transient_load_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: "ResourceDB.rdb".into(),
            cache_file: "ResourceCacheData.rcd".into(),
            raw_dir: "Raw".into(),
            cooked_dir: "Cooked".into(),
            transient_load_dir: String::new(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project: ProjectInfo {
                name: "Untitled".into(),
                game: Game::Unknown,
            },
            store: StoreConfig::default(),
        }
    }
}

/// Load a project config from a TOML file.
pub fn load_project(path: &Path) -> StoreResult<ProjectConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| StoreError::Config {
        path: path.to_owned(),
        message: e.to_string(),
    })?;
    parse_project(&content).map_err(|message| StoreError::Config {
        path: path.to_owned(),
        message,
    })
}

fn parse_project(content: &str) -> Result<ProjectConfig, String> {
    toml::from_str(content).map_err(|e| e.to_string())
}

/// Load project config, falling back to defaults if the file is missing or
/// malformed.
pub fn load_or_default(path: &Path) -> ProjectConfig {
    match load_project(path) {
        Ok(config) => {
            log::info!(
                "Loaded project: {} ({})",
                config.project.name,
                config.project.game.display_name()
            );
            config
        }
        Err(e) => {
            log::warn!("No project file ({e}), using defaults");
            ProjectConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config() {
        let config = parse_project(
            r#"
            [project]
            name = "Prime"
            game = "MPRM"

            [store]
            database = "db/Resources.rdb"
            cache_file = "db/Cache.rcd"
            raw_dir = "Source"
            cooked_dir = "Build"
            transient_load_dir = "/tmp/paks"
            "#,
        )
        .unwrap();
        assert_eq!(config.project.game, Game::Prime);
        assert_eq!(config.store.raw_dir, "Source");
        assert_eq!(config.store.transient_load_dir, "/tmp/paks");
    }

    #[test]
    fn store_section_defaults() {
        let config = parse_project(
            r#"
            [project]
            name = "Echoes"
            game = "MP2E"

            [store]
            cooked_dir = "Paks"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.cooked_dir, "Paks");
        assert_eq!(config.store.database, "ResourceDB.rdb");
        assert_eq!(config.store.raw_dir, "Raw");
    }

    #[test]
    fn missing_store_section() {
        let config = parse_project("[project]\nname = \"Bare\"\n").unwrap();
        assert_eq!(config.project.game, Game::Unknown);
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn unknown_game_id_is_rejected() {
        assert!(parse_project("[project]\nname = \"X\"\ngame = \"ZZZZ\"\n").is_err());
    }

    #[test]
    fn missing_file_falls_back() {
        let config = load_or_default(Path::new("/nonexistent/project.toml"));
        assert_eq!(config.project.name, "Untitled");
    }
}
