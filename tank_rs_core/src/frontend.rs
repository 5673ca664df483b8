use std::fmt::Display;

use serde::Deserialize;

/// Framework a model graph was imported from. This decides the naming convention of its
/// tank directory and graph file.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Frontend {
    #[serde(rename = "torch", alias = "pytorch")]
    #[value(name = "torch", alias = "pytorch")]
    Torch,
    #[serde(rename = "tf", alias = "tensorflow")]
    #[value(name = "tf", alias = "tensorflow")]
    Tf,
    #[serde(rename = "tflite")]
    #[value(name = "tflite")]
    Tflite,
}

impl Display for Frontend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Torch => write!(f, "torch"),
            Self::Tf => write!(f, "tf"),
            Self::Tflite => write!(f, "tflite"),
        }
    }
}

impl Frontend {
    /// Suffix of the tank directory for this frontend, e.g. `_torch`.
    pub fn dir_suffix(&self) -> String {
        format!("_{self}")
    }

    /// Hugging Face style ids (`org/model`) are flattened for torch and tf. tflite names are
    /// used verbatim.
    pub fn mangle_model_name(&self, model_name: &str) -> String {
        match self {
            Self::Torch | Self::Tf => model_name.replace('/', "_"),
            Self::Tflite => model_name.to_string(),
        }
    }

    /// Tank directory name: `<model>_<frontend>`.
    pub fn dir_name(&self, model_name: &str) -> String {
        format!("{}{}", self.mangle_model_name(model_name), self.dir_suffix())
    }

    /// Recover the model name from a tank directory name by removing the frontend suffix.
    /// Names without the suffix are returned unchanged.
    pub fn strip_dir_suffix<'a>(&self, dir_name: &'a str) -> &'a str {
        dir_name
            .strip_suffix(self.dir_suffix().as_str())
            .unwrap_or(dir_name)
    }

    /// Graph file name: `<model>[_dynamic]_<frontend>[_<tuned>].mlir`.
    pub fn graph_file_name(&self, model_name: &str, dynamic: bool, tuned: Option<&str>) -> String {
        let dyn_str = if dynamic { "_dynamic" } else { "" };
        match tuned {
            Some(tuned) => format!("{model_name}{dyn_str}_{self}_{tuned}.mlir"),
            None => format!("{model_name}{dyn_str}_{self}.mlir"),
        }
    }
}
