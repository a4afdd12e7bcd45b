use std::path::PathBuf;

use anyhow::Result;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root under which `local://<site>/...` locations resolve.
    pub base_directory: PathBuf,
    pub database_path: PathBuf,
    /// fsync destination files after writing (safer but slower).
    pub sync_files: bool,
    /// Terminal jobs older than this are eligible for `prune`. Unset
    /// means descriptors accumulate until pruned by hand.
    pub retention_days: Option<u32>,
    pub verbose: bool,
    pub json_logs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_directory: PathBuf::from("/var/lib/xferd/sites"),
            database_path: PathBuf::from("xferd.db"),
            sync_files: true,
            retention_days: None,
            verbose: false,
            json_logs: false,
        }
    }
}

impl AppConfig {
    /// Layered configuration: defaults, then `xferd.toml`, then `XFERD_*`
    /// environment variables, then CLI overrides.
    pub fn new<A: Serialize>(args: Option<&A>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("xferd.toml"))
            .merge(Env::prefixed("XFERD_"));

        if let Some(args) = args {
            figment = figment.merge(Serialized::defaults(args));
        }

        Ok(figment.extract()?)
    }
}
