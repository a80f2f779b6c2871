use crate::libs::decomposition::JobResult;
use crate::libs::error::DivError;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Runs independent jobs on a fixed number of workers.
///
/// Job files go to a scratch directory under the output directory, which is
/// removed on drop unless it was asked to be kept.
pub struct JobPool {
    pool: rayon::ThreadPool,
    workers: usize,
    workdir: PathBuf,
    _guard: Option<tempfile::TempDir>,
}

impl JobPool {
    pub fn new(workers: usize, outdir: &Path, keep_temp: bool) -> anyhow::Result<Self> {
        if workers == 0 {
            return Err(DivError::Configuration("Worker count must be at least 1".to_string()).into());
        }
        std::fs::create_dir_all(outdir)?;
        let dir = tempfile::Builder::new()
            .prefix("divmsa_")
            .tempdir_in(outdir)?;

        let (workdir, guard) = if keep_temp {
            #[allow(deprecated)]
            let path = dir.into_path();
            log::info!("Temporary files are kept in {}", path.display());
            (path, None)
        } else {
            (dir.path().to_path_buf(), Some(dir))
        };

        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;

        Ok(Self {
            pool,
            workers,
            workdir,
            _guard: guard,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// A file name inside the scratch directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.workdir.join(name)
    }

    /// Runs `job` over `inputs` in parallel. Results come back in input order.
    pub fn run<J, T, F>(&self, inputs: &[J], job: F) -> Vec<JobResult<T>>
    where
        J: Sync,
        T: Send,
        F: Fn(&J) -> JobResult<T> + Sync + Send,
    {
        self.pool
            .install(|| inputs.par_iter().map(|input| job(input)).collect())
    }
}
