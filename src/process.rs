//! Parallel image optimization.
//!
//! Takes the scanner's catalog, plans one job per gallery candidate plus the
//! hero and agent files, and runs them on a bounded rayon pool. Each job
//! writes a main JPEG and a thumbnail into the staging directory.
//!
//! ## Output Structure
//!
//! ```text
//! <output>/
//! ├── hero.jpg
//! ├── agent/<stem>.jpg
//! ├── photos/01.jpg
//! ├── photos/exterior/a.jpg
//! └── thumbs/
//!     ├── hero.jpg
//!     ├── agent/<stem>.jpg
//!     ├── photos/01.jpg
//!     └── photos/exterior/a.jpg
//! ```
//!
//! A thumbnail mirrors its main file's path under `thumbs/`. Main paths are
//! unique, so a gallery photo named `hero.png` can never overwrite the hero
//! thumbnail.
//!
//! Results are keyed by source path, never by completion order. A job that
//! fails becomes an [`AssetError`] warning; the build decides later whether
//! enough survived.
//!
//! With caching enabled, a source whose bytes and settings match an entry
//! in the previous output's cache manifest is copied from there instead of
//! being re-encoded.

use crate::cache::{CacheEntry, CacheManifest, CacheStats, hash_file, hash_optimize_params};
use crate::imaging::{ImageBackend, OptimizeConfig, OptimizedOutput, optimize_image};
use crate::naming::jpeg_output_name;
use crate::scan::PhotoCatalog;
use crate::types::AssetError;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// What an optimized file is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    Gallery,
    Hero,
    Agent,
}

/// One source file to optimize. Output paths are relative to the output
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizeJob {
    pub kind: JobKind,
    /// Relative to the listing root.
    pub source_path: String,
    pub main_output: String,
    pub thumb_output: String,
}

/// A successfully optimized source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimizedImage {
    pub source_path: String,
    pub main_output_path: String,
    pub thumb_output_path: String,
    pub width: u32,
    pub height: u32,
    pub thumb_width: u32,
    pub thumb_height: u32,
    pub format: String,
}

impl OptimizedImage {
    fn new(job: &OptimizeJob, output: OptimizedOutput) -> Self {
        Self {
            source_path: job.source_path.clone(),
            main_output_path: job.main_output.clone(),
            thumb_output_path: job.thumb_output.clone(),
            width: output.width,
            height: output.height,
            thumb_width: output.thumb_width,
            thumb_height: output.thumb_height,
            format: "JPEG".to_string(),
        }
    }
}

/// Whether a job's files were encoded or copied from the previous build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    Encoded,
    Reused,
}

/// Progress events, sent as jobs finish (in completion order).
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    Started {
        total: usize,
        threads: usize,
    },
    Optimized {
        kind: JobKind,
        source_path: String,
        main_output: String,
        width: u32,
        height: u32,
        status: OutputStatus,
    },
    Failed {
        source_path: String,
        reason: String,
    },
}

/// Inputs for one processing run.
#[derive(Debug, Clone)]
pub struct ProcessOptions<'a> {
    pub listing_root: &'a Path,
    /// Where outputs are written.
    pub staging_dir: &'a Path,
    /// The currently published output, consulted for cached files.
    pub previous_output: Option<&'a Path>,
    pub config: OptimizeConfig,
    pub threads: usize,
    pub use_cache: bool,
}

#[derive(Debug)]
pub struct ProcessResult {
    pub images: BTreeMap<String, OptimizedImage>,
    pub warnings: Vec<AssetError>,
    pub cache_stats: CacheStats,
}

impl OptimizeJob {
    fn new(kind: JobKind, source_path: &str, main_output: String) -> Self {
        Self {
            kind,
            source_path: source_path.to_string(),
            thumb_output: format!("thumbs/{main_output}"),
            main_output,
        }
    }
}

/// Plan jobs for every gallery candidate, the hero, and the agent photo.
pub fn plan_jobs(catalog: &PhotoCatalog) -> Vec<OptimizeJob> {
    let mut jobs: Vec<OptimizeJob> = catalog
        .photos()
        .map(|photo| {
            let name = jpeg_output_name(&photo.relative_name());
            OptimizeJob::new(JobKind::Gallery, &photo.source_path, format!("photos/{name}"))
        })
        .collect();

    if let Some(hero) = &catalog.hero {
        jobs.push(OptimizeJob::new(JobKind::Hero, hero, "hero.jpg".to_string()));
    }
    if let Some(agent) = &catalog.agent
        && catalog.hero.as_ref() != Some(agent)
    {
        let stem = Path::new(agent)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "agent".to_string());
        jobs.push(OptimizeJob::new(JobKind::Agent, agent, format!("agent/{stem}.jpg")));
    }
    jobs
}

enum JobOutcome {
    Done {
        image: OptimizedImage,
        cache_entry: Option<CacheEntry>,
        status: OutputStatus,
    },
    Failed(AssetError),
}

/// Run all jobs on a pool of `options.threads` workers.
pub fn process_jobs(
    backend: &impl ImageBackend,
    jobs: &[OptimizeJob],
    options: &ProcessOptions<'_>,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    std::fs::create_dir_all(options.staging_dir)?;

    let previous = match (options.use_cache, options.previous_output) {
        (true, Some(dir)) => CacheManifest::load(dir),
        _ => CacheManifest::empty(),
    };
    let params_hash = hash_optimize_params(&options.config);
    let threads = options.threads.max(1);

    if let Some(tx) = &events {
        tx.send(ProcessEvent::Started {
            total: jobs.len(),
            threads,
        })
        .ok();
    }
    info!(jobs = jobs.len(), threads, "optimizing images");

    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    let outcomes: Vec<JobOutcome> = pool.install(|| {
        jobs.par_iter()
            .map_with(events, |tx, job| {
                let outcome = run_job(backend, job, options, &previous, &params_hash);
                if let Some(tx) = tx {
                    tx.send(event_for(job, &outcome)).ok();
                }
                outcome
            })
            .collect()
    });

    let mut images = BTreeMap::new();
    let mut warnings = Vec::new();
    let mut cache_stats = CacheStats::default();
    let mut cache = CacheManifest::empty();
    for outcome in outcomes {
        match outcome {
            JobOutcome::Done {
                image,
                cache_entry,
                status,
            } => {
                match status {
                    OutputStatus::Encoded => cache_stats.encode(),
                    OutputStatus::Reused => cache_stats.reuse(),
                }
                if let Some(entry) = cache_entry {
                    cache.insert(image.main_output_path.clone(), entry);
                }
                images.insert(image.source_path.clone(), image);
            }
            JobOutcome::Failed(error) => warnings.push(error),
        }
    }
    if options.use_cache {
        cache.save(options.staging_dir)?;
    }

    Ok(ProcessResult {
        images,
        warnings,
        cache_stats,
    })
}

fn event_for(job: &OptimizeJob, outcome: &JobOutcome) -> ProcessEvent {
    match outcome {
        JobOutcome::Done { image, status, .. } => ProcessEvent::Optimized {
            kind: job.kind,
            source_path: job.source_path.clone(),
            main_output: job.main_output.clone(),
            width: image.width,
            height: image.height,
            status: *status,
        },
        JobOutcome::Failed(error) => ProcessEvent::Failed {
            source_path: job.source_path.clone(),
            reason: error.reason.clone(),
        },
    }
}

fn run_job(
    backend: &impl ImageBackend,
    job: &OptimizeJob,
    options: &ProcessOptions<'_>,
    previous: &CacheManifest,
    params_hash: &str,
) -> JobOutcome {
    let source = options.listing_root.join(&job.source_path);
    let main_out = options.staging_dir.join(&job.main_output);
    let thumb_out = options.staging_dir.join(&job.thumb_output);

    let source_hash = if options.use_cache {
        match hash_file(&source) {
            Ok(h) => Some(h),
            Err(e) => return fail(job, e.to_string()),
        }
    } else {
        None
    };

    if let (Some(hash), Some(prev_dir)) = (&source_hash, options.previous_output)
        && let Some(hit) = previous.find_cached(hash, params_hash, prev_dir)
    {
        match copy_cached(prev_dir, &hit.main_path, &hit.entry.thumb_path, &main_out, &thumb_out) {
            Ok(()) => {
                debug!(source = %job.source_path, from = %hit.main_path, "reused cached output");
                let entry = CacheEntry {
                    thumb_path: job.thumb_output.clone(),
                    ..hit.entry.clone()
                };
                return JobOutcome::Done {
                    image: OptimizedImage::new(job, hit.entry.output()),
                    cache_entry: Some(entry),
                    status: OutputStatus::Reused,
                };
            }
            Err(e) => {
                debug!(source = %job.source_path, error = %e, "cache copy failed, re-encoding");
            }
        }
    }

    match optimize_image(backend, &source, &main_out, &thumb_out, &options.config) {
        Ok(output) => {
            debug!(
                source = %job.source_path,
                width = output.width,
                height = output.height,
                "encoded"
            );
            let cache_entry = source_hash.map(|source_hash| CacheEntry {
                source_hash,
                params_hash: params_hash.to_string(),
                thumb_path: job.thumb_output.clone(),
                width: output.width,
                height: output.height,
                thumb_width: output.thumb_width,
                thumb_height: output.thumb_height,
            });
            JobOutcome::Done {
                image: OptimizedImage::new(job, output),
                cache_entry,
                status: OutputStatus::Encoded,
            }
        }
        Err(e) => {
            // Partial outputs must not be published.
            let _ = std::fs::remove_file(&main_out);
            let _ = std::fs::remove_file(&thumb_out);
            fail(job, e.to_string())
        }
    }
}

fn fail(job: &OptimizeJob, reason: String) -> JobOutcome {
    warn!(source = %job.source_path, %reason, "image skipped");
    JobOutcome::Failed(AssetError::new(&job.source_path, reason))
}

fn copy_cached(
    prev_dir: &Path,
    main_rel: &str,
    thumb_rel: &str,
    main_out: &Path,
    thumb_out: &Path,
) -> std::io::Result<()> {
    for (from, to) in [(main_rel, main_out), (thumb_rel, thumb_out)] {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(prev_dir.join(from), to)?;
    }
    Ok(())
}
