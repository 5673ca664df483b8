//! Core crate of tank_rs: a local cache of precompiled model artifacts mirrored from a
//! remote tank.
//!
//! ```rust,no_run
//! use tank_rs_core::{Frontend, ModelRequest, TankConfig, TankDownloader};
//!
//! let config = TankConfig::new(None)?.with_update_tank(true);
//! let downloader = TankDownloader::new(config);
//!
//! let artifact = downloader.download(&ModelRequest::new("microsoft/resnet-50", Frontend::Torch))?;
//! println!("entry function: {}", artifact.function_name);
//! for (name, input) in &artifact.inputs {
//!     println!("{name}: {} {:?}", input.dtype(), input.shape());
//! }
//!
//! # Ok::<(), anyhow::Error>(())
//! ```

mod artifact;
mod config;
mod connectivity;
mod downloader;
mod entry;
mod error;
mod fetch;
mod frontend;

pub use artifact::TankArtifact;
pub use config::{TankConfig, TankSettings, DEFAULT_GSUTIL, DEFAULT_PROBE_URL, DEFAULT_TANK_URL};
pub use connectivity::{Connectivity, HttpProbe, Offline};
pub use downloader::{CacheStatus, ModelRequest, TankDownloader};
pub use entry::CachedModelEntry;
pub use error::TankError;
pub use fetch::{Fetcher, GsutilFetcher};
pub use frontend::Frontend;
pub use tank_rs_common::{DType, NpyArray, NpyError, NpzArchive, NpzWriter};
