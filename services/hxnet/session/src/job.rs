//! Background automation jobs.
//!
//! A job is handed the shared [`Client`] and runs on its own task, issuing
//! requests concurrently with the foreground. Running jobs live in a
//! [`JobRegistry`] owned by whoever starts them.

use crate::client::Client;
use crate::error::ClientError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Job lifecycle errors
#[derive(Error, Debug)]
pub enum JobError {
    /// A job with this name is already running
    #[error("job {0} is already running")]
    Duplicate(String),

    /// No job with this name is registered
    #[error("job {0} not found")]
    NotFound(String),

    /// A request issued by the job failed
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// The job reported a failure of its own
    #[error("job failed: {0}")]
    Failed(String),
}

/// What a job gets to work with
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Name the job was started under
    pub name: String,
    /// Shared client
    pub client: Arc<Client>,
}

/// Plugin interface for automation jobs
#[async_trait]
pub trait Job: Send + 'static {
    /// Prepare the job from its arguments
    async fn init(&mut self, ctx: &JobContext, args: &[String]) -> Result<(), JobError>;

    /// Do the work; may loop until the job is stopped
    async fn run(&mut self, ctx: &JobContext) -> Result<(), JobError>;

    /// Release anything the job holds
    async fn shutdown(&mut self, ctx: &JobContext) -> Result<(), JobError>;
}

type SharedJob = Arc<Mutex<Box<dyn Job>>>;

struct RunningJob {
    ctx: JobContext,
    job: SharedJob,
    handle: JoinHandle<Result<(), JobError>>,
}

/// Explicitly owned set of running jobs
pub struct JobRegistry {
    client: Arc<Client>,
    jobs: HashMap<String, RunningJob>,
}

impl JobRegistry {
    /// Create an empty registry whose jobs share `client`
    pub fn new(client: Arc<Client>) -> Self {
        Self {
            client,
            jobs: HashMap::new(),
        }
    }

    /// Initialise `job` and start running it on its own task
    pub async fn start(
        &mut self,
        name: &str,
        mut job: Box<dyn Job>,
        args: &[String],
    ) -> Result<(), JobError> {
        if self.jobs.contains_key(name) {
            return Err(JobError::Duplicate(name.to_string()));
        }

        let ctx = JobContext {
            name: name.to_string(),
            client: self.client.clone(),
        };
        job.init(&ctx, args).await?;

        let job: SharedJob = Arc::new(Mutex::new(job));
        let handle = {
            let job = job.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let result = job.lock().await.run(&ctx).await;
                if let Err(e) = &result {
                    warn!("Job {} failed: {}", ctx.name, e);
                }
                result
            })
        };

        info!("Started job {}", name);
        self.jobs
            .insert(name.to_string(), RunningJob { ctx, job, handle });
        Ok(())
    }

    /// Stop a job: cancel its task, then let it shut down
    pub async fn stop(&mut self, name: &str) -> Result<(), JobError> {
        let running = self
            .jobs
            .remove(name)
            .ok_or_else(|| JobError::NotFound(name.to_string()))?;

        running.handle.abort();
        let _ = running.handle.await;

        info!("Stopping job {}", name);
        // the guard must be released before `running` is dropped
        let result = running.job.lock().await.shutdown(&running.ctx).await;
        result
    }

    /// Stop every job, returning the names that failed to shut down cleanly
    pub async fn stop_all(&mut self) -> Vec<String> {
        let names: Vec<String> = self.jobs.keys().cloned().collect();
        let mut failed = Vec::new();
        for name in names {
            if let Err(e) = self.stop(&name).await {
                warn!("Job {} did not shut down cleanly: {}", name, e);
                failed.push(name);
            }
        }
        failed
    }

    /// Names of jobs whose task is still running
    pub fn running(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .jobs
            .iter()
            .filter(|(_, j)| !j.handle.is_finished())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Whether a job is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }
}
