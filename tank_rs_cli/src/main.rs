use std::{path::PathBuf, time::Instant};

use clap::{Parser, Subcommand};
use tank_rs_core::{
    Connectivity, Frontend, GsutilFetcher, HttpProbe, ModelRequest, NpyArray, Offline,
    TankConfig, TankDownloader, TankSettings,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Args)]
struct ModelArgs {
    /// Model name, e.g. `microsoft/resnet-50`
    #[arg(short, long)]
    model: String,

    /// Frontend the model was imported from
    #[arg(short, long, default_value = "torch")]
    frontend: Frontend,

    /// Use the graph compiled with dynamic shapes
    #[arg(long)]
    dynamic: bool,

    /// Tuned graph variant. The default graph is used if the variant does not exist.
    #[arg(long)]
    tuned: Option<String>,
}

impl From<ModelArgs> for ModelRequest {
    fn from(args: ModelArgs) -> Self {
        let request = ModelRequest::new(args.model, args.frontend).with_dynamic(args.dynamic);
        match args.tuned {
            Some(tuned) => request.with_tuned(tuned),
            None => request,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Make sure a model is in the local tank, then load it and summarize its fixtures.
    Fetch {
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Report whether a model is present in the local tank. Does not touch the network.
    Status {
        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Parser)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    /// JSON settings file. Flags given on the command line take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Alternate local tank cache directory. Defaults to ~/.local/shark_tank/.
    #[arg(long)]
    local_tank_cache: Option<PathBuf>,

    /// Refetch models whose hash does not match the remote tank.
    #[arg(long)]
    update_tank: bool,

    /// Remote tank location.
    #[arg(long)]
    tank_url: Option<String>,

    /// Path to the gsutil executable.
    #[arg(long)]
    gsutil: Option<PathBuf>,

    /// Never contact the remote tank for hash checks.
    #[arg(long)]
    offline: bool,
}

fn describe(name: &str, array: &NpyArray) -> String {
    format!("{name}: {} {:?}", array.dtype(), array.shape())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let file_settings = match &args.config {
        Some(path) => TankSettings::from_json_file(path)?,
        None => TankSettings::default(),
    };
    let settings = file_settings.merge(TankSettings {
        local_tank_cache: args.local_tank_cache,
        update_tank: args.update_tank.then_some(true),
        tank_url: args.tank_url,
        gsutil_path: args.gsutil,
        probe_url: None,
    });
    let config = TankConfig::from_settings(settings)?;

    let probe = HttpProbe::new(config.probe_url());
    let connectivity: &dyn Connectivity = if args.offline { &Offline } else { &probe };
    let downloader = TankDownloader::with_components(
        config.clone(),
        GsutilFetcher::new(config.gsutil()),
        connectivity,
    );

    cliclack::intro("tank_rs")?;
    match args.command {
        Command::Fetch { model } => {
            let request = ModelRequest::from(model);
            let start = Instant::now();
            let artifact = downloader.download(&request)?;
            let end = Instant::now();

            cliclack::log::success(format!(
                "Loaded {request} in {:.2}s",
                end.duration_since(start).as_secs_f32()
            ))?;
            cliclack::note(
                "Graph",
                format!(
                    "{} bytes, entry function `{}`",
                    artifact.mlir.len(),
                    artifact.function_name
                ),
            )?;
            cliclack::note(
                "Inputs",
                artifact
                    .inputs
                    .iter()
                    .map(|(name, arr)| describe(name, arr))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )?;
            cliclack::note(
                "Golden outputs",
                artifact
                    .golden_out
                    .iter()
                    .map(|(name, arr)| describe(name, arr))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )?;
        }
        Command::Status { model } => {
            let request = ModelRequest::from(model);
            let entry = downloader.entry(&request);
            let missing = entry
                .expected_files()
                .into_iter()
                .filter(|path| !path.is_file())
                .collect::<Vec<_>>();
            if missing.is_empty() {
                cliclack::log::success(format!(
                    "{request} is present in {}",
                    entry.dir().display()
                ))?;
            } else {
                cliclack::log::warning(format!(
                    "{request} is not present in {}",
                    entry.dir().display()
                ))?;
                cliclack::note(
                    "Missing files",
                    missing
                        .iter()
                        .map(|path| path.display().to_string())
                        .collect::<Vec<_>>()
                        .join("\n"),
                )?;
            }
        }
    }
    cliclack::outro(format!("tank at {}", config.cache_root().display()))?;

    Ok(())
}
