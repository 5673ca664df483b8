use std::{path::PathBuf, time::Instant};

use tank_rs_core::{Frontend, ModelRequest, TankConfig, TankDownloader};

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    /// Frontend to fetch the model for
    #[arg(long, default_value = "torch")]
    frontend: Frontend,

    /// Alternate local tank cache directory
    #[arg(long)]
    local_tank_cache: Option<PathBuf>,

    /// Refetch the model if it is stale
    #[arg(long)]
    update_tank: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let model_name = match args.frontend {
        Frontend::Torch | Frontend::Tf => "microsoft/resnet-50",
        Frontend::Tflite => "resnet_50",
    };

    let config = TankConfig::new(args.local_tank_cache)?.with_update_tank(args.update_tank);
    let downloader = TankDownloader::new(config);

    let start = Instant::now();
    let (mlir, function_name, inputs, golden_out) = downloader
        .download(&ModelRequest::new(model_name, args.frontend))?
        .into_parts();
    let end = Instant::now();
    println!("Took: {:.2}s", end.duration_since(start).as_secs_f32());

    println!("{} byte graph, entry function `{function_name}`", mlir.len());
    for (i, input) in inputs.iter().enumerate() {
        println!("input {i}: {} {:?}", input.dtype(), input.shape());
    }
    for (i, out) in golden_out.iter().enumerate() {
        println!("golden output {i}: {} {:?}", out.dtype(), out.shape());
    }

    Ok(())
}
