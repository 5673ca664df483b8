use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::Frontend;

pub(crate) const FUNCTION_NAME_FILE: &str = "function_name.npy";
pub(crate) const INPUTS_FILE: &str = "inputs.npz";
pub(crate) const GOLDEN_OUT_FILE: &str = "golden_out.npz";
pub(crate) const HASH_FILE: &str = "hash.npy";
pub(crate) const UPSTREAM_HASH_FILE: &str = "upstream_hash.npy";

/// One model directory in the local tank cache.
///
/// ```text
/// <cache_root>/<model>_<frontend>/
///     <model>[_dynamic]_<frontend>.mlir
///     function_name.npy
///     inputs.npz
///     golden_out.npz
///     hash.npy
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedModelEntry {
    model_name: String,
    frontend: Frontend,
    dynamic: bool,
    dir: PathBuf,
}

impl CachedModelEntry {
    /// Entry for a model name such as `microsoft/resnet-50`.
    pub fn new(cache_root: &Path, model_name: &str, frontend: Frontend, dynamic: bool) -> Self {
        let model_name = frontend.mangle_model_name(model_name);
        let dir = cache_root.join(format!("{model_name}{}", frontend.dir_suffix()));
        Self {
            model_name,
            frontend,
            dynamic,
            dir,
        }
    }

    /// Entry for an existing tank directory name such as `resnet50_torch`.
    pub fn from_dir_name(
        cache_root: &Path,
        dir_name: &str,
        frontend: Frontend,
        dynamic: bool,
    ) -> Self {
        Self {
            model_name: frontend.strip_dir_suffix(dir_name).to_string(),
            frontend,
            dynamic,
            dir: cache_root.join(dir_name),
        }
    }

    /// Model name as used in file names, i.e. after `/` replacement.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn frontend(&self) -> Frontend {
        self.frontend
    }

    pub fn dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Name of the directory, which is also its name in the remote tank.
    pub fn dir_name(&self) -> String {
        self.dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn graph_path(&self) -> PathBuf {
        self.dir.join(self.frontend.graph_file_name(&self.model_name, self.dynamic, None))
    }

    /// Path of a tuned graph variant. It is optional and not part of the presence check.
    pub fn tuned_graph_path(&self, tuned: &str) -> PathBuf {
        self.dir.join(self.frontend.graph_file_name(&self.model_name, self.dynamic, Some(tuned)))
    }

    pub fn function_name_path(&self) -> PathBuf {
        self.dir.join(FUNCTION_NAME_FILE)
    }

    pub fn inputs_path(&self) -> PathBuf {
        self.dir.join(INPUTS_FILE)
    }

    pub fn golden_out_path(&self) -> PathBuf {
        self.dir.join(GOLDEN_OUT_FILE)
    }

    pub fn hash_path(&self) -> PathBuf {
        self.dir.join(HASH_FILE)
    }

    /// Where the staleness check stores the remote hash marker.
    pub fn upstream_hash_path(&self) -> PathBuf {
        self.dir.join(UPSTREAM_HASH_FILE)
    }

    /// The five files which must all exist for the entry to count as present.
    pub fn expected_files(&self) -> [PathBuf; 5] {
        [
            self.graph_path(),
            self.function_name_path(),
            self.inputs_path(),
            self.golden_out_path(),
            self.hash_path(),
        ]
    }

    /// Whether every expected file exists. A partial directory is reported as absent.
    pub fn is_present(&self) -> bool {
        if !self.dir.is_dir() {
            return false;
        }
        match self.expected_files().iter().find(|path| !path.is_file()) {
            Some(missing) => {
                debug!("{} is incomplete, missing {}", self.dir.display(), missing.display());
                false
            }
            None => {
                info!(
                    "The model is present in {}. If you want a fresh download, consider deleting the directory.",
                    self.dir.display()
                );
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths() {
        let entry = CachedModelEntry::new(
            Path::new("/cache"),
            "microsoft/resnet-50",
            Frontend::Torch,
            false,
        );
        assert_eq!(entry.dir(), Path::new("/cache/microsoft_resnet-50_torch"));
        assert_eq!(entry.dir_name(), "microsoft_resnet-50_torch");
        assert_eq!(
            entry.graph_path(),
            Path::new("/cache/microsoft_resnet-50_torch/microsoft_resnet-50_torch.mlir")
        );
        assert_eq!(
            entry.hash_path(),
            Path::new("/cache/microsoft_resnet-50_torch/hash.npy")
        );
    }

    #[test]
    fn from_dir_name_strips_suffix() {
        let entry = CachedModelEntry::from_dir_name(
            Path::new("/cache"),
            "mobilenet_tflite",
            Frontend::Tflite,
            true,
        );
        assert_eq!(entry.model_name(), "mobilenet");
        assert_eq!(
            entry.graph_path(),
            Path::new("/cache/mobilenet_tflite/mobilenet_dynamic_tflite.mlir")
        );
        assert_eq!(
            entry,
            CachedModelEntry::new(Path::new("/cache"), "mobilenet", Frontend::Tflite, true)
        );
    }

    #[test]
    fn missing_dir_is_absent() {
        let entry = CachedModelEntry::new(
            Path::new("/nonexistent/tank"),
            "bert",
            Frontend::Tf,
            false,
        );
        assert!(!entry.is_present());
    }
}
