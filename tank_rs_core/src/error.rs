use thiserror::Error;

/// Fatal tank failures. Everything else (missing files after a fetch, malformed archives)
/// surfaces as the underlying I/O or [`tank_rs_common::NpyError`].
#[derive(Error, Debug)]
pub enum TankError {
    #[error("model `{model}` not present in the tank at {url}: {reason}")]
    ModelNotInTank {
        model: String,
        url: String,
        reason: String,
    },
    #[error("hash of model `{model}` not present in the tank at {url}: {reason}")]
    HashNotInTank {
        model: String,
        url: String,
        reason: String,
    },
    #[error("No home directory.")]
    HomeDirectoryMissing,
}
