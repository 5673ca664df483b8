use std::fs;

use anyhow::{Context, Result};
use tank_rs_common::{NpyArray, NpzArchive};
use tracing::{debug, info};

use crate::CachedModelEntry;

/// A model graph with its companion fixtures, as loaded from the tank cache.
#[derive(Clone, Debug)]
pub struct TankArtifact {
    /// Serialized graph, read verbatim.
    pub mlir: Vec<u8>,
    /// Name of the entry function of the graph.
    pub function_name: String,
    /// Inputs in archive order, with their archive keys.
    pub inputs: Vec<(String, NpyArray)>,
    /// Expected outputs for `inputs`, in archive order.
    pub golden_out: Vec<(String, NpyArray)>,
}

impl TankArtifact {
    /// Read an artifact from a present entry. If `tuned` names a graph variant which does
    /// not exist, the untuned graph is used.
    pub fn load(entry: &CachedModelEntry, tuned: Option<&str>) -> Result<Self> {
        let graph_path = match tuned.map(|tuned| entry.tuned_graph_path(tuned)) {
            Some(path) if path.is_file() => path,
            Some(path) => {
                info!(
                    "tuned graph {} not found, using the default graph",
                    path.display()
                );
                entry.graph_path()
            }
            None => entry.graph_path(),
        };
        debug!("reading graph {}", graph_path.display());
        let mlir = fs::read(&graph_path)
            .with_context(|| format!("could not read {}", graph_path.display()))?;

        let function_name = NpyArray::load(entry.function_name_path())?.to_text()?;
        let inputs = NpzArchive::open(entry.inputs_path())?.read_all()?;
        let golden_out = NpzArchive::open(entry.golden_out_path())?.read_all()?;

        Ok(Self {
            mlir,
            function_name,
            inputs,
            golden_out,
        })
    }

    /// Input arrays without their keys.
    pub fn input_arrays(&self) -> Vec<&NpyArray> {
        self.inputs.iter().map(|(_, arr)| arr).collect()
    }

    /// Golden output arrays without their keys.
    pub fn golden_out_arrays(&self) -> Vec<&NpyArray> {
        self.golden_out.iter().map(|(_, arr)| arr).collect()
    }

    /// Split into `(graph, function name, inputs, golden outputs)`.
    pub fn into_parts(self) -> (Vec<u8>, String, Vec<NpyArray>, Vec<NpyArray>) {
        (
            self.mlir,
            self.function_name,
            self.inputs.into_iter().map(|(_, arr)| arr).collect(),
            self.golden_out.into_iter().map(|(_, arr)| arr).collect(),
        )
    }
}
