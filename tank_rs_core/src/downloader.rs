use std::{fmt::Display, fs};

use anyhow::{Context, Result};
use tank_rs_common::NpyArray;
use tracing::{info, warn};

use crate::{
    entry::HASH_FILE, CachedModelEntry, Connectivity, Fetcher, Frontend, GsutilFetcher,
    HttpProbe, TankArtifact, TankConfig, TankError,
};

/// Identifies a model in the tank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelRequest {
    /// Model name, e.g. `microsoft/resnet-50` or `albert_lite_base`.
    pub model_name: String,
    pub frontend: Frontend,
    /// Select the graph compiled with dynamic shapes.
    pub dynamic: bool,
    /// Optional tuned graph variant. Falls back to the default graph when absent.
    pub tuned: Option<String>,
}

impl ModelRequest {
    pub fn new<S: ToString>(model_name: S, frontend: Frontend) -> Self {
        Self {
            model_name: model_name.to_string(),
            frontend,
            dynamic: false,
            tuned: None,
        }
    }

    pub fn with_dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }

    pub fn with_tuned<S: ToString>(mut self, tuned: S) -> Self {
        self.tuned = Some(tuned.to_string());
        self
    }
}

impl Display for ModelRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}", self.model_name, self.frontend)?;
        if self.dynamic {
            write!(f, ", dynamic")?;
        }
        if let Some(tuned) = &self.tuned {
            write!(f, ", tuned: {tuned}")?;
        }
        write!(f, ")")
    }
}

/// What [`TankDownloader::ensure_cached`] did to make the entry available.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    /// The entry was absent and has been fetched.
    Fetched,
    /// The local hash matches the remote hash.
    UpToDate,
    /// The hashes differed and the entry has been fetched again.
    Refetched,
    /// The hashes differed and the local copy is kept.
    Stale,
    /// No connectivity, the local copy is used without checking.
    Offline,
}

impl Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetched => write!(f, "fetched"),
            Self::UpToDate => write!(f, "up to date"),
            Self::Refetched => write!(f, "refetched"),
            Self::Stale => write!(f, "stale"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Keeps model artifacts in the local tank cache in sync with the remote tank.
pub struct TankDownloader<F: Fetcher = GsutilFetcher, C: Connectivity = HttpProbe> {
    config: TankConfig,
    fetcher: F,
    connectivity: C,
}

impl TankDownloader {
    /// Downloader using `gsutil` and an HTTP connectivity probe, as configured.
    pub fn new(config: TankConfig) -> Self {
        let fetcher = GsutilFetcher::new(config.gsutil());
        let connectivity = HttpProbe::new(config.probe_url());
        Self {
            config,
            fetcher,
            connectivity,
        }
    }
}

impl<F: Fetcher, C: Connectivity> TankDownloader<F, C> {
    pub fn with_components(config: TankConfig, fetcher: F, connectivity: C) -> Self {
        Self {
            config,
            fetcher,
            connectivity,
        }
    }

    pub fn config(&self) -> &TankConfig {
        &self.config
    }

    pub fn entry(&self, request: &ModelRequest) -> CachedModelEntry {
        CachedModelEntry::new(
            self.config.cache_root(),
            &request.model_name,
            request.frontend,
            request.dynamic,
        )
    }

    /// Copy the whole entry directory from the remote tank, overwriting local files.
    pub fn fetch(&self, entry: &CachedModelEntry) -> Result<()> {
        let cache_root = self.config.cache_root();
        fs::create_dir_all(cache_root)
            .with_context(|| format!("could not create {}", cache_root.display()))?;

        let remote = self.config.remote_dir(&entry.dir_name());
        info!("fetching {remote} into {}", cache_root.display());
        self.fetcher
            .copy_dir(&remote, cache_root)
            .map_err(|e| TankError::ModelNotInTank {
                model: entry.dir_name(),
                url: remote.clone(),
                reason: format!("{e:#}"),
            })?;
        Ok(())
    }

    /// Compare the hash of a present entry with the remote one.
    ///
    /// Offline, nothing is checked. On a mismatch the entry is fetched again if
    /// `update_tank` is set, otherwise the stale copy is kept.
    pub fn check_staleness(&self, entry: &CachedModelEntry) -> Result<CacheStatus> {
        if !self.connectivity.is_online() {
            info!("No internet connection. Using the model already present in the tank.");
            return Ok(CacheStatus::Offline);
        }

        let local_hash = NpyArray::load(entry.hash_path())?.to_text()?;

        let remote = format!("{}/{HASH_FILE}", self.config.remote_dir(&entry.dir_name()));
        let upstream_path = entry.upstream_hash_path();
        self.fetcher
            .copy_file(&remote, &upstream_path)
            .map_err(|e| TankError::HashNotInTank {
                model: entry.dir_name(),
                url: remote.clone(),
                reason: format!("{e:#}"),
            })?;
        let upstream_hash = NpyArray::load(&upstream_path)?.to_text()?;

        if local_hash == upstream_hash {
            return Ok(CacheStatus::UpToDate);
        }
        if self.config.update_tank() {
            info!(
                "hash of {} does not match upstream, updating",
                entry.dir_name()
            );
            self.fetch(entry)?;
            Ok(CacheStatus::Refetched)
        } else {
            warn!(
                "Hash of {} does not match upstream in {}. If you are using locally generated artifacts, this is working as intended.",
                entry.dir_name(),
                self.config.tank_url()
            );
            Ok(CacheStatus::Stale)
        }
    }

    /// Make sure the entry for `request` is present, fetching or refreshing it as needed.
    pub fn ensure_cached(&self, request: &ModelRequest) -> Result<(CachedModelEntry, CacheStatus)> {
        let entry = self.entry(request);
        let status = if entry.is_present() {
            self.check_staleness(&entry)?
        } else {
            self.fetch(&entry)?;
            CacheStatus::Fetched
        };
        Ok((entry, status))
    }

    /// Ensure the entry is cached, then load it.
    pub fn download(&self, request: &ModelRequest) -> Result<TankArtifact> {
        info!("loading {request} from the tank");
        let (entry, status) = self.ensure_cached(request)?;
        info!("{} is {status}", entry.dir_name());
        TankArtifact::load(&entry, request.tuned.as_deref())
    }
}
