//! Runtime configuration.
//!
//! Settings are layered: built-in defaults first, then `config.json5` and
//! `config.toml` from the config directory. `STUDIO_DATA` and `STUDIO_CONFIG`
//! relocate the data/config directories; command-line flags beat everything
//! (see [`crate::app::App::new`]).

use std::{env, fs, path::PathBuf};

use directories::ProjectDirs;
use lazy_static::lazy_static;
use serde::Deserialize;
use tracing::warn;

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase();
    pub static ref LOG_ENV: String = format!("{}_LOG_LEVEL", *PROJECT_NAME);
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
    /// Ticks per second; ticks drain the watch-event buffer.
    pub tick_rate: f64,
    /// Rendered frames per second.
    pub frame_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: data_dir(),
            config_dir: config_dir(),
            tick_rate: 4.0,
            frame_rate: 30.0,
        }
    }
}

impl Config {
    /// Layer the config files over the defaults. Missing files are fine; a
    /// malformed one is an error.
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = Config::default();
        let mut builder = config::Config::builder()
            .set_default("data_dir", defaults.data_dir.to_string_lossy().as_ref())?
            .set_default("config_dir", defaults.config_dir.to_string_lossy().as_ref())?
            .set_default("tick_rate", defaults.tick_rate)?
            .set_default("frame_rate", defaults.frame_rate)?;

        let mut found = false;
        for (name, format) in [
            ("config.json5", config::FileFormat::Json5),
            ("config.toml", config::FileFormat::Toml),
        ] {
            let path = defaults.config_dir.join(name);
            found |= path.exists();
            builder = builder.add_source(config::File::from(path).format(format).required(false));
        }
        if !found {
            warn!(
                directory = %defaults.config_dir.display(),
                "no configuration file found, using defaults"
            );
        }

        builder.build()?.try_deserialize()
    }
}

fn env_override(suffix: &str) -> Option<PathBuf> {
    env::var(format!("{}_{}", *PROJECT_NAME, suffix))
        .ok()
        .map(PathBuf::from)
}

pub fn data_dir() -> PathBuf {
    env_override("DATA")
        .or_else(|| project_directory().map(|dirs| dirs.data_local_dir().to_path_buf()))
        .unwrap_or_else(|| PathBuf::from(".").join(".data"))
}

pub fn config_dir() -> PathBuf {
    env_override("CONFIG")
        .or_else(|| project_directory().map(|dirs| dirs.config_local_dir().to_path_buf()))
        .unwrap_or_else(|| PathBuf::from(".").join(".config"))
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "formwork", env!("CARGO_PKG_NAME"))
}

pub fn ensure_dirs_exist() -> std::io::Result<()> {
    fs::create_dir_all(data_dir())?;
    fs::create_dir_all(config_dir())
}
