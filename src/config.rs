use std::convert::TryFrom;
use std::path::{ Path, PathBuf };
use std::time::{ Duration, SystemTime };

use async_std::fs;
use async_std::task;
use thiserror::Error;
use yaml_rust::{ YamlLoader, Yaml, ScanError };

use crate::shared::Shared;

pub type ConfigHandle = Shared<Config>;

pub const MAX_ADDITIONAL_PLAYERS: usize = 60;
pub const MIN_TOP_VEHICLES: usize = 1;
pub const MAX_TOP_VEHICLES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct RelativeConfig {
    pub additional_players_front: usize,
    pub additional_players_behind: usize,
    pub show_vehicle_in_garage_for_race: bool,
}

impl Default for RelativeConfig {
    fn default() -> Self {
        RelativeConfig {
            additional_players_front: 0,
            additional_players_behind: 0,
            show_vehicle_in_garage_for_race: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandingsConfig {
    pub min_top_vehicles: usize,
    pub max_vehicles_combined_mode: usize,
    pub enable_multi_class_split_mode: bool,
    pub max_vehicles_per_split_player: usize,
    pub max_vehicles_per_split_others: usize,
}

impl Default for StandingsConfig {
    fn default() -> Self {
        StandingsConfig {
            min_top_vehicles: 3,
            max_vehicles_combined_mode: 20,
            enable_multi_class_split_mode: true,
            max_vehicles_per_split_player: 7,
            max_vehicles_per_split_others: 3,
        }
    }
}

impl StandingsConfig {
    fn clamped(self) -> StandingsConfig {
        let top = self.min_top_vehicles.max(MIN_TOP_VEHICLES).min(MAX_TOP_VEHICLES);
        StandingsConfig {
            min_top_vehicles: top,
            max_vehicles_combined_mode: self.max_vehicles_combined_mode.max(top + 2),
            enable_multi_class_split_mode: self.enable_multi_class_split_mode,
            max_vehicles_per_split_player: self.max_vehicles_per_split_player.max(top + 2),
            max_vehicles_per_split_others: self.max_vehicles_per_split_others.max(top),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleConfig {
    pub update_interval: Duration,
    pub idle_update_interval: Duration,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        ModuleConfig {
            update_interval: Duration::from_millis(20),
            idle_update_interval: Duration::from_millis(400),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub relative: RelativeConfig,
    pub standings: StandingsConfig,
    pub module_relative: ModuleConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config yaml")]
    Parse(#[from] ScanError),

    #[error("config value `{section}.{key}` has the wrong type")]
    InvalidValue { section: &'static str, key: &'static str },
}

struct Section<'a> {
    name: &'static str,
    yaml: &'a Yaml,
}

impl<'a> Section<'a> {
    fn of(doc: &'a Yaml, name: &'static str) -> Section<'a> {
        Section { name, yaml: &doc[name] }
    }

    fn count(&self, key: &'static str, default: usize) -> Result<usize, ConfigError> {
        match &self.yaml[key] {
            Yaml::Integer(value) => Ok((*value).max(0) as usize),
            Yaml::BadValue | Yaml::Null => Ok(default),
            _ => Err(ConfigError::InvalidValue { section: self.name, key }),
        }
    }

    fn flag(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match &self.yaml[key] {
            Yaml::Boolean(value) => Ok(*value),
            Yaml::BadValue | Yaml::Null => Ok(default),
            _ => Err(ConfigError::InvalidValue { section: self.name, key }),
        }
    }

    fn millis(&self, key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        let millis = self.count(key, default.as_millis() as usize)?;
        Ok(Duration::from_millis(millis.max(1) as u64))
    }
}

impl Config {
    pub fn from_yaml(doc: &Yaml) -> Result<Config, ConfigError> {
        let defaults = Config::default();

        let relative = Section::of(doc, "relative");
        let relative = RelativeConfig {
            additional_players_front: relative.count("additional_players_front",
                defaults.relative.additional_players_front)?.min(MAX_ADDITIONAL_PLAYERS),
            additional_players_behind: relative.count("additional_players_behind",
                defaults.relative.additional_players_behind)?.min(MAX_ADDITIONAL_PLAYERS),
            show_vehicle_in_garage_for_race: relative.flag("show_vehicle_in_garage_for_race",
                defaults.relative.show_vehicle_in_garage_for_race)?,
        };

        let standings = Section::of(doc, "standings");
        let standings = StandingsConfig {
            min_top_vehicles: standings.count("min_top_vehicles", defaults.standings.min_top_vehicles)?,
            max_vehicles_combined_mode: standings.count("max_vehicles_combined_mode",
                defaults.standings.max_vehicles_combined_mode)?,
            enable_multi_class_split_mode: standings.flag("enable_multi_class_split_mode",
                defaults.standings.enable_multi_class_split_mode)?,
            max_vehicles_per_split_player: standings.count("max_vehicles_per_split_player",
                defaults.standings.max_vehicles_per_split_player)?,
            max_vehicles_per_split_others: standings.count("max_vehicles_per_split_others",
                defaults.standings.max_vehicles_per_split_others)?,
        }.clamped();

        let module = Section::of(doc, "module_relative");
        let module_relative = ModuleConfig {
            update_interval: module.millis("update_interval", defaults.module_relative.update_interval)?,
            idle_update_interval: module.millis("idle_update_interval",
                defaults.module_relative.idle_update_interval)?,
        };

        Ok(Config { relative, standings, module_relative })
    }

    pub async fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path).await?;
        Config::try_from(&content)
    }
}

impl TryFrom<&String> for Config {
    type Error = ConfigError;

    fn try_from(str: &String) -> Result<Self, Self::Error> {
        let docs = YamlLoader::load_from_str(str)?;
        match docs.first() {
            Some(doc) => Config::from_yaml(doc),
            None => Ok(Config::default()),
        }
    }
}

async fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).await.ok()?.modified().ok()
}

/// Reloads the config file into `handle` whenever its modification time changes.
///
/// A file that fails to load keeps the previous config in place.
pub async fn watch(path: PathBuf, handle: ConfigHandle, poll_interval: Duration) {
    let mut last_modified = modified(&path).await;
    loop {
        task::sleep(poll_interval).await;

        let current = modified(&path).await;
        if current.is_none() || current == last_modified {
            continue;
        }
        last_modified = current;

        match Config::load(&path).await {
            Ok(config) => {
                info!["Reloaded config from {}", path.display()];
                debug!["New config: {:?}", config];
                handle.replace(config);
            },
            Err(err) => error!["Failed to reload config {}: {}", path.display(), err],
        }
    }
}
