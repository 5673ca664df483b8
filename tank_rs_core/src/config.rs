use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::TankError;

/// Remote tank holding the latest artifacts.
pub const DEFAULT_TANK_URL: &str = "gs://shark_tank/latest";
/// Copy tool, looked up on `PATH` unless configured otherwise.
pub const DEFAULT_GSUTIL: &str = "gsutil";
/// Address requested to decide whether we are online.
pub const DEFAULT_PROBE_URL: &str = "http://1.1.1.1";

/// Cache root used when no alternate location is configured, relative to the home directory.
const DEFAULT_CACHE_DIR: &str = ".local/shark_tank";

/// Resolved tank configuration.
#[derive(Clone, Debug)]
pub struct TankConfig {
    cache_root: PathBuf,
    update_tank: bool,
    tank_url: String,
    gsutil: PathBuf,
    probe_url: String,
}

impl TankConfig {
    /// Resolve the cache root.
    ///
    /// - If `local_tank_cache` is given, it is used and created if missing.
    /// - Otherwise `~/.local/shark_tank/` is used. It is created lazily on the first fetch.
    pub fn new(local_tank_cache: Option<PathBuf>) -> Result<Self> {
        let cache_root = match local_tank_cache {
            Some(custom) => {
                if !custom.exists() {
                    fs::create_dir_all(&custom).with_context(|| {
                        format!("could not create tank cache at {}", custom.display())
                    })?;
                }
                info!("Using {} as local shark_tank cache directory.", custom.display());
                custom
            }
            None => {
                let root = dirs::home_dir()
                    .ok_or(TankError::HomeDirectoryMissing)?
                    .join(DEFAULT_CACHE_DIR);
                info!(
                    "shark_tank local cache is located at {}. You may change this with `--local-tank-cache`.",
                    root.display()
                );
                root
            }
        };
        Ok(Self::with_cache_root(cache_root))
    }

    /// Use `cache_root` as is, without touching the filesystem.
    pub fn with_cache_root<P: Into<PathBuf>>(cache_root: P) -> Self {
        Self {
            cache_root: cache_root.into(),
            update_tank: false,
            tank_url: DEFAULT_TANK_URL.to_string(),
            gsutil: PathBuf::from(DEFAULT_GSUTIL),
            probe_url: DEFAULT_PROBE_URL.to_string(),
        }
    }

    /// Resolve a configuration from settings, applying defaults for anything unset.
    pub fn from_settings(settings: TankSettings) -> Result<Self> {
        let TankSettings {
            local_tank_cache,
            update_tank,
            tank_url,
            gsutil_path,
            probe_url,
        } = settings;
        let mut config =
            Self::new(local_tank_cache)?.with_update_tank(update_tank.unwrap_or(false));
        if let Some(url) = tank_url {
            config = config.with_tank_url(url);
        }
        if let Some(gsutil) = gsutil_path {
            config = config.with_gsutil(gsutil);
        }
        if let Some(url) = probe_url {
            config = config.with_probe_url(url);
        }
        Ok(config)
    }

    /// When set, a hash mismatch triggers a full refetch instead of a warning.
    pub fn with_update_tank(mut self, update_tank: bool) -> Self {
        self.update_tank = update_tank;
        self
    }

    pub fn with_tank_url<S: ToString>(mut self, tank_url: S) -> Self {
        self.tank_url = tank_url.to_string().trim_end_matches('/').to_string();
        self
    }

    pub fn with_gsutil<P: Into<PathBuf>>(mut self, gsutil: P) -> Self {
        self.gsutil = gsutil.into();
        self
    }

    pub fn with_probe_url<S: ToString>(mut self, probe_url: S) -> Self {
        self.probe_url = probe_url.to_string();
        self
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn update_tank(&self) -> bool {
        self.update_tank
    }

    pub fn tank_url(&self) -> &str {
        &self.tank_url
    }

    pub fn gsutil(&self) -> &Path {
        &self.gsutil
    }

    pub fn probe_url(&self) -> &str {
        &self.probe_url
    }

    /// Remote location of a tank directory.
    pub fn remote_dir(&self, dir_name: &str) -> String {
        format!("{}/{dir_name}", self.tank_url)
    }
}

/// Unresolved settings, e.g. from a JSON file. Every field is optional.
///
/// ```json
/// {
///     "local_tank_cache": "/data/shark_tank",
///     "update_tank": true,
///     "tank_url": "gs://shark_tank/nightly"
/// }
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TankSettings {
    pub local_tank_cache: Option<PathBuf>,
    pub update_tank: Option<bool>,
    pub tank_url: Option<String>,
    pub gsutil_path: Option<PathBuf>,
    pub probe_url: Option<String>,
}

impl TankSettings {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("could not read settings file {}", path.display()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Fields set in `overrides` take precedence.
    pub fn merge(self, overrides: TankSettings) -> Self {
        Self {
            local_tank_cache: overrides.local_tank_cache.or(self.local_tank_cache),
            update_tank: overrides.update_tank.or(self.update_tank),
            tank_url: overrides.tank_url.or(self.tank_url),
            gsutil_path: overrides.gsutil_path.or(self.gsutil_path),
            probe_url: overrides.probe_url.or(self.probe_url),
        }
    }
}
