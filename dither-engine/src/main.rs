use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use dither_engine::{Algorithm, DitherError};
use dither_engine::config::{self, ConfigManager};
use dither_engine::dither::DitherRequest;
use dither_engine::pipeline::{self, ProcessParams};
use dither_engine::sources::FrameSource;

/// Batch dithering of rendered frames
#[derive(Parser, Debug)]
#[command(name = "dither-engine")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run configured jobs
    Run {
        /// Only run this job
        #[arg(long)]
        job: Option<String>,
    },
    /// Dither inputs with every algorithm, fixed and randomized weights
    Sweep {
        /// Input image path or glob
        input: String,

        /// Output directory
        #[arg(long, default_value = "dither_tests")]
        out: PathBuf,

        /// Quantization factor (matrix order for ordered)
        #[arg(long, default_value_t = 4)]
        factor: i64,

        /// Seed for randomized weights
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Set the algorithm of a job and save the config
    SetAlgorithm { job: String, algorithm: String },
    /// Set the factor of a job and save the config
    SetFactor { job: String, factor: i64 },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Load config first so we can honor logging.filter directive.
    let manager = if cli.config.exists() {
        Some(ConfigManager::load(Some(cli.config.clone()))?)
    } else {
        None
    };
    let cfg_snapshot = match &manager {
        Some(m) => m.to_struct()?,
        None => config::Config::default(),
    };
    let filter_directive = cfg_snapshot
        .logging
        .as_ref()
        .and_then(|l| l.filter.clone())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info,dither_engine=debug".to_string());
    fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .init();

    match cli.command {
        Commands::Run { job } => {
            if manager.is_none() {
                bail!("config file {} not found", cli.config.display());
            }
            let ids: Vec<String> = match job {
                Some(id) => vec![id],
                None => cfg_snapshot.jobs.keys().cloned().collect(),
            };
            if ids.is_empty() {
                tracing::warn!(config = %cli.config.display(), "no jobs configured");
            }
            for id in ids {
                run_job(&cfg_snapshot, &id)?;
            }
        }
        Commands::Sweep {
            input,
            out,
            factor,
            seed,
        } => sweep(&input, &out, factor, seed)?,
        Commands::SetAlgorithm { job, algorithm } => {
            let Some(mut manager) = manager else {
                bail!("config file {} not found", cli.config.display());
            };
            let algorithm: Algorithm = algorithm.parse()?;
            manager.set_job_algorithm(&job, algorithm)?;
            manager.to_struct()?.resolve_job(&job)?;
            manager.save()?;
            tracing::info!(job = %job, algorithm = %algorithm, path = %manager.path().display(), "updated job algorithm");
        }
        Commands::SetFactor { job, factor } => {
            let Some(mut manager) = manager else {
                bail!("config file {} not found", cli.config.display());
            };
            let factor = u32::try_from(factor).map_err(|_| DitherError::InvalidFactor(factor))?;
            manager.set_job_factor(&job, factor)?;
            manager.to_struct()?.resolve_job(&job)?;
            manager.save()?;
            tracing::info!(job = %job, factor, path = %manager.path().display(), "updated job factor");
        }
    }
    Ok(())
}

fn run_job(cfg: &config::Config, id: &str) -> Result<()> {
    let job = cfg.resolve_job(id)?;
    tracing::debug!(job = %id, input = %job.input, request = ?job.request, upscale = job.upscale, "starting job");
    let source = FrameSource::new(&job.input)?;
    let params = ProcessParams {
        request: &job.request,
        output_dir: &job.output_dir,
        upscale: job.upscale,
    };
    let failed = process_all(&source, &params);
    tracing::info!(job = %id, total = source.entries.len(), failed, "job done");
    if failed > 0 {
        bail!("job '{}': {} of {} files failed", id, failed, source.entries.len());
    }
    Ok(())
}

fn process_all(source: &FrameSource, params: &ProcessParams) -> usize {
    let total = source.entries.len();
    let mut failed = 0;
    for (n, path) in source.entries.iter().enumerate() {
        tracing::debug!(frame = n + 1, total, path = %path.display(), "processing frame");
        if let Err(e) = pipeline::process_file(path, params) {
            tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "frame failed");
            failed += 1;
        }
    }
    failed
}

/// Ordered once, then each diffusion kernel with fixed and randomized weights.
fn sweep(input: &str, out: &Path, factor: i64, seed: Option<u64>) -> Result<()> {
    let source = FrameSource::new(input)?;
    if source.is_empty() {
        bail!("no inputs matched {}", input);
    }
    let mut requests = Vec::new();
    match DitherRequest::new(Algorithm::Ordered.name(), factor, false) {
        Ok(req) => requests.push(req),
        Err(e) => tracing::warn!(error = %e, "skipping ordered"),
    }
    for algo in Algorithm::ALL.into_iter().filter(|a| a.kernel().is_some()) {
        for randomize in [false, true] {
            requests.push(DitherRequest::new(algo.name(), factor, randomize)?.with_seed(seed));
        }
    }
    let mut failed = 0;
    for req in &requests {
        tracing::info!(algorithm = %req.algorithm, randomize = req.randomize_weights, "starting");
        let params = ProcessParams {
            request: req,
            output_dir: out,
            upscale: 2,
        };
        failed += process_all(&source, &params);
    }
    tracing::info!(runs = requests.len(), failed, "sweep done");
    if failed > 0 {
        bail!("{} dithering runs failed", failed);
    }
    Ok(())
}
