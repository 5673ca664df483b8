use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result};
use tracing::debug;

/// Copies artifacts out of the remote tank.
pub trait Fetcher {
    /// Recursively copy the remote directory `remote_dir` into `dest_root`, producing
    /// `dest_root/<basename of remote_dir>`.
    fn copy_dir(&self, remote_dir: &str, dest_root: &Path) -> Result<()>;

    /// Copy the single remote file `remote_file` to `dest`.
    fn copy_file(&self, remote_file: &str, dest: &Path) -> Result<()>;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn copy_dir(&self, remote_dir: &str, dest_root: &Path) -> Result<()> {
        (**self).copy_dir(remote_dir, dest_root)
    }

    fn copy_file(&self, remote_file: &str, dest: &Path) -> Result<()> {
        (**self).copy_file(remote_file, dest)
    }
}

/// Fetcher which runs `gsutil cp`. Output of the tool goes straight to our stdout/stderr.
#[derive(Clone, Debug)]
pub struct GsutilFetcher {
    gsutil: PathBuf,
}

impl GsutilFetcher {
    pub fn new<P: Into<PathBuf>>(gsutil: P) -> Self {
        Self {
            gsutil: gsutil.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.gsutil);
        cmd.args(["-o", "GSUtil:parallel_process_count=1", "-m", "cp"]);
        cmd
    }

    fn run(&self, mut cmd: Command) -> Result<()> {
        debug!(command = ?cmd, "running gsutil");
        let status = cmd
            .status()
            .with_context(|| format!("failed to run `{}`", self.gsutil.display()))?;
        if !status.success() {
            anyhow::bail!("`{}` exited with {status}", self.gsutil.display());
        }
        Ok(())
    }
}

impl Fetcher for GsutilFetcher {
    fn copy_dir(&self, remote_dir: &str, dest_root: &Path) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg("-r").arg(remote_dir).arg(dest_root);
        self.run(cmd)
    }

    fn copy_file(&self, remote_file: &str, dest: &Path) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg(remote_file).arg(dest);
        self.run(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line() {
        let fetcher = GsutilFetcher::new("/opt/gsutil/gsutil");
        let mut cmd = fetcher.command();
        cmd.arg("-r")
            .arg("gs://shark_tank/latest/bert_tf")
            .arg("/cache");
        assert_eq!(cmd.get_program(), "/opt/gsutil/gsutil");
        let args = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            args,
            vec![
                "-o",
                "GSUtil:parallel_process_count=1",
                "-m",
                "cp",
                "-r",
                "gs://shark_tank/latest/bert_tf",
                "/cache"
            ]
        );
    }

    #[test]
    fn missing_tool_is_an_error() {
        let fetcher = GsutilFetcher::new("/nonexistent/gsutil");
        let err = fetcher
            .copy_dir("gs://shark_tank/latest/bert_tf", Path::new("/tmp"))
            .unwrap_err();
        assert!(err.to_string().contains("failed to run"));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_an_error() {
        let fetcher = GsutilFetcher::new("false");
        let err = fetcher
            .copy_file("gs://shark_tank/latest/bert_tf/hash.npy", Path::new("/tmp/x.npy"))
            .unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }
}
