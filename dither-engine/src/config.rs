use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use toml_edit::{DocumentMut, Item, value};

use crate::dither::DitherRequest;
use crate::kernel::Algorithm;

/// Default on-disk config filename
pub const DEFAULT_CONFIG_PATH: &str = "dither.toml";

/// Strongly typed representation of the configuration.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    pub logging: Option<Logging>,
    pub defaults: Option<JobSettings>,
    #[serde(default)]
    pub jobs: BTreeMap<String, Job>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Logging {
    pub filter: Option<String>,
}

/// Dither parameters under `[defaults]`; fields set on a job take precedence.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct JobSettings {
    pub algorithm: Option<String>,
    pub factor: Option<i64>,
    pub randomize_weights: Option<bool>,
    pub seed: Option<u64>,
    /// Integer nearest-neighbour upscale applied before writing output.
    pub upscale: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Job {
    /// Glob selecting input images, expanded in sorted order.
    pub input: String,
    pub output_dir: PathBuf,
    pub algorithm: Option<String>,
    pub factor: Option<i64>,
    pub randomize_weights: Option<bool>,
    pub seed: Option<u64>,
    pub upscale: Option<u32>,
}

/// Fully resolved job parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedJob {
    pub input: String,
    pub output_dir: PathBuf,
    pub request: DitherRequest,
    pub upscale: u32,
}

impl Config {
    /// Merge a job over `[defaults]` and validate the resulting request.
    pub fn resolve_job(&self, id: &str) -> Result<ResolvedJob> {
        let job = self
            .jobs
            .get(id)
            .ok_or_else(|| anyhow::anyhow!("job '{}' not found", id))?;
        let defaults = self.defaults.clone().unwrap_or_default();
        let algorithm = job
            .algorithm
            .clone()
            .or(defaults.algorithm)
            .unwrap_or_else(|| Algorithm::FloydSteinberg.name().to_string());
        let factor = job.factor.or(defaults.factor).unwrap_or(4);
        let randomize = job
            .randomize_weights
            .or(defaults.randomize_weights)
            .unwrap_or(false);
        let upscale = job.upscale.or(defaults.upscale).unwrap_or(1);
        if upscale == 0 {
            bail!("job '{}': upscale must be at least 1", id);
        }
        let request = DitherRequest::new(&algorithm, factor, randomize)
            .with_context(|| format!("job '{id}'"))?
            .with_seed(job.seed.or(defaults.seed));
        Ok(ResolvedJob {
            input: job.input.clone(),
            output_dir: job.output_dir.clone(),
            request,
            upscale,
        })
    }
}

/// Config document kept in its editable form so saves preserve formatting.
#[derive(Debug)]
pub struct ConfigManager {
    path: PathBuf,
    doc: DocumentMut,
}

impl ConfigManager {
    /// Load the config file at `path` (or [`DEFAULT_CONFIG_PATH`]).
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        if !path.exists() {
            bail!("config file {} not found", path.display());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(path, &text)
    }

    pub fn parse(path: PathBuf, text: &str) -> Result<Self> {
        let doc = text
            .parse::<DocumentMut>()
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Convert current document to strongly typed struct.
    pub fn to_struct(&self) -> Result<Config> {
        let typed: Config = toml_edit::de::from_document(self.doc.clone())?;
        Ok(typed)
    }

    fn job_table(&mut self, job_id: &str) -> Result<&mut toml_edit::Table> {
        let jobs = self.doc["jobs"]
            .as_table_mut()
            .ok_or_else(|| anyhow::anyhow!("jobs table missing"))?;
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| anyhow::anyhow!("job '{}' not found", job_id))?;
        match job {
            Item::Table(tbl) => Ok(tbl),
            _ => bail!("job '{}' is not a table", job_id),
        }
    }

    /// Set the algorithm for a job, storing its canonical name.
    pub fn set_job_algorithm(&mut self, job_id: &str, algorithm: Algorithm) -> Result<()> {
        let tbl = self.job_table(job_id)?;
        tbl["algorithm"] = value(algorithm.name());
        Ok(())
    }

    pub fn set_job_factor(&mut self, job_id: &str, factor: u32) -> Result<()> {
        let tbl = self.job_table(job_id)?;
        tbl["factor"] = value(factor as i64);
        Ok(())
    }

    /// Atomic write of current document to disk (best-effort durability via rename).
    pub fn save(&self) -> Result<()> {
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, self.doc.to_string())
            .with_context(|| format!("writing tmp config {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("renaming tmp config to {}", self.path.display()))?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> String {
        self.doc.to_string()
    }
}
