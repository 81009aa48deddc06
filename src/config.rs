use crate::scoring::Rules;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub rules: Rules,
    /// Root of the high-score service, e.g. `http://127.0.0.1:5000`
    pub server_url: Option<String>,
}

impl Config {
    /// Replace rules that would break the game with the defaults
    pub fn validated(mut self) -> Self {
        if let Err(e) = self.rules.validate() {
            log::warn!("{e}, using the default rules");
            self.rules = Rules::default();
        }
        self
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
    fn exists(&self) -> bool;

    /// Load the config, writing the defaults out on first run
    fn load_or_init(&self) -> Config {
        if self.exists() {
            return self.load();
        }

        let cfg = Config::default();
        if let Err(e) = self.save(&cfg) {
            log::warn!("could not write default config: {e}");
        }
        cfg
    }
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "spectype") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("spectype_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes)
                .map(Config::validated)
                .unwrap_or_else(|e| {
                    log::warn!("ignoring malformed config {}: {e}", self.path.display());
                    Config::default()
                }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}
