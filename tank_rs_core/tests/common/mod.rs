#![allow(dead_code)]

use std::{
    cell::Cell,
    fs,
    path::{Path, PathBuf},
};

use tank_rs_core::{Connectivity, Fetcher, Frontend, NpyArray, NpzWriter};

pub const TANK_URL: &str = "gs://test_tank/latest";

pub fn copy_dir_all(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

/// Contents of one artifact directory.
pub struct Fixture<'a> {
    pub model_name: &'a str,
    pub frontend: Frontend,
    pub dynamic: bool,
    pub hash: &'a str,
    pub graph: &'a [u8],
}

impl Fixture<'_> {
    pub fn dir_name(&self) -> String {
        self.frontend.dir_name(self.model_name)
    }

    /// Write the five artifact files under `root/<model>_<frontend>/`.
    pub fn write(&self, root: &Path) -> PathBuf {
        let dir = root.join(self.dir_name());
        fs::create_dir_all(&dir).unwrap();
        let name = self.frontend.mangle_model_name(self.model_name);

        fs::write(
            dir.join(self.frontend.graph_file_name(&name, self.dynamic, None)),
            self.graph,
        )
        .unwrap();
        NpyArray::from_text("forward")
            .save(dir.join("function_name.npy"))
            .unwrap();
        NpyArray::from_text(self.hash)
            .save(dir.join("hash.npy"))
            .unwrap();

        let mut inputs = NpzWriter::create(dir.join("inputs.npz")).unwrap();
        inputs
            .add(
                "input_ids",
                &NpyArray::from_vec(vec![1, 3], vec![101i64, 7592, 102]).unwrap(),
            )
            .unwrap();
        inputs
            .add(
                "attention_mask",
                &NpyArray::from_vec(vec![1, 3], vec![1i64, 1, 1]).unwrap(),
            )
            .unwrap();
        inputs
            .add(
                "token_type_ids",
                &NpyArray::from_vec(vec![1, 3], vec![0i64, 0, 0]).unwrap(),
            )
            .unwrap();
        inputs.finish().unwrap();

        let mut golden = NpzWriter::create(dir.join("golden_out.npz")).unwrap();
        golden
            .add(
                "logits",
                &NpyArray::from_vec(vec![1, 2], vec![0.25f32, -1.5]).unwrap(),
            )
            .unwrap();
        golden.finish().unwrap();

        dir
    }
}

/// Serves copies from a local directory standing in for the remote tank, counting calls.
pub struct FakeFetcher {
    remote_root: PathBuf,
    pub dir_copies: Cell<usize>,
    pub file_copies: Cell<usize>,
}

impl FakeFetcher {
    pub fn new(remote_root: &Path) -> Self {
        Self {
            remote_root: remote_root.to_path_buf(),
            dir_copies: Cell::new(0),
            file_copies: Cell::new(0),
        }
    }

    fn resolve(&self, remote: &str) -> anyhow::Result<PathBuf> {
        let relative = remote
            .strip_prefix(TANK_URL)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| anyhow::anyhow!("unexpected remote {remote}"))?;
        Ok(self.remote_root.join(relative))
    }
}

impl Fetcher for FakeFetcher {
    fn copy_dir(&self, remote_dir: &str, dest_root: &Path) -> anyhow::Result<()> {
        self.dir_copies.set(self.dir_copies.get() + 1);
        let src = self.resolve(remote_dir)?;
        if !src.is_dir() {
            anyhow::bail!("No URLs matched: {remote_dir}");
        }
        let name = src.file_name().unwrap();
        copy_dir_all(&src, &dest_root.join(name))?;
        Ok(())
    }

    fn copy_file(&self, remote_file: &str, dest: &Path) -> anyhow::Result<()> {
        self.file_copies.set(self.file_copies.get() + 1);
        let src = self.resolve(remote_file)?;
        if !src.is_file() {
            anyhow::bail!("No URLs matched: {remote_file}");
        }
        fs::copy(src, dest)?;
        Ok(())
    }
}

pub struct FixedConnectivity(pub bool);

impl Connectivity for FixedConnectivity {
    fn is_online(&self) -> bool {
        self.0
    }
}
